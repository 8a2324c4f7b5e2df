//! Bounded-attempt execution of a step with recovery between attempts.

use std::future::Future;
use std::time::Duration;

use tracing::{debug, error, warn};

use crate::driver::UiDriver;
use crate::error::{Error, Result};
use crate::step::StepOutcome;

/// Action taken between a retryable failure and the next attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Recovery {
	/// Reload the surface the step works on.
	#[default]
	Reload,
	/// Retry straight away; the step resets its own state.
	None,
	Pause(Duration),
}

/// How a policy run ended.
#[derive(Debug, Clone, PartialEq)]
pub enum PolicyOutcome<T> {
	Success(T),
	/// The step reported a fatal skip; no further attempts were made.
	Skipped(String),
	/// Every attempt failed; carries the last failure reason.
	Exhausted(String),
}

/// Policy result plus the number of attempts it consumed.
#[derive(Debug, Clone, PartialEq)]
pub struct Attempted<T> {
	pub outcome: PolicyOutcome<T>,
	pub attempts: u32,
}

impl<T> Attempted<T> {
	/// Exhaustion is treated exactly like a fatal skip by callers.
	pub fn failure_reason(&self) -> Option<&str> {
		match &self.outcome {
			PolicyOutcome::Success(_) => None,
			PolicyOutcome::Skipped(reason) | PolicyOutcome::Exhausted(reason) => Some(reason),
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
	max_attempts: u32,
	recovery: Recovery,
	attempt_timeout: Option<Duration>,
}

impl RetryPolicy {
	/// Creates a policy with reload recovery. At least one attempt is always made.
	pub fn new(max_attempts: u32) -> Self {
		Self {
			max_attempts: max_attempts.max(1),
			recovery: Recovery::Reload,
			attempt_timeout: None,
		}
	}

	pub fn with_recovery(mut self, recovery: Recovery) -> Self {
		self.recovery = recovery;
		self
	}

	/// Bounds each attempt as a whole; an expired attempt counts as retryable.
	pub fn with_attempt_timeout(mut self, timeout: Option<Duration>) -> Self {
		self.attempt_timeout = timeout;
		self
	}

	pub fn max_attempts(&self) -> u32 {
		self.max_attempts
	}

	/// Runs `step` until it succeeds, skips, or the attempt budget is spent.
	///
	/// The step receives the 1-based attempt number. Driver errors returned from
	/// the step are retryable. `surface` is the target of [`Recovery::Reload`].
	pub async fn run<T, F, Fut>(&self, label: &str, surface: Option<&dyn UiDriver>, mut step: F) -> Attempted<T>
	where
		F: FnMut(u32) -> Fut,
		Fut: Future<Output = Result<StepOutcome<T>>>,
	{
		let mut last_reason = String::from("no attempt made");

		for attempt in 1..=self.max_attempts {
			let result = match self.attempt_timeout {
				Some(limit) => match tokio::time::timeout(limit, step(attempt)).await {
					Ok(result) => result,
					Err(_) => Err(Error::Timeout {
						ms: limit.as_millis() as u64,
						condition: format!("{label} attempt {attempt}"),
					}),
				},
				None => step(attempt).await,
			};

			let reason = match result {
				Ok(StepOutcome::Success(value)) => {
					debug!(target: "swapper.retry", step = label, attempt, "step succeeded");
					return Attempted {
						outcome: PolicyOutcome::Success(value),
						attempts: attempt,
					};
				}
				Ok(StepOutcome::FatalSkip(reason)) => {
					warn!(target: "swapper.retry", step = label, attempt, %reason, "step skipped");
					return Attempted {
						outcome: PolicyOutcome::Skipped(reason),
						attempts: attempt,
					};
				}
				Ok(StepOutcome::Retryable(reason)) => reason,
				Err(err) => err.to_string(),
			};

			warn!(
				target: "swapper.retry",
				step = label,
				attempt,
				max_attempts = self.max_attempts,
				%reason,
				"attempt failed"
			);
			last_reason = reason;

			if attempt < self.max_attempts {
				self.recover(label, surface).await;
			}
		}

		error!(
			target: "swapper.retry",
			step = label,
			attempts = self.max_attempts,
			reason = %last_reason,
			"giving up after exhausting attempts"
		);
		Attempted {
			outcome: PolicyOutcome::Exhausted(last_reason),
			attempts: self.max_attempts,
		}
	}

	async fn recover(&self, label: &str, surface: Option<&dyn UiDriver>) {
		match self.recovery {
			Recovery::None => {}
			Recovery::Pause(delay) => tokio::time::sleep(delay).await,
			Recovery::Reload => {
				let Some(surface) = surface else {
					return;
				};
				if let Err(err) = surface.reload().await {
					warn!(target: "swapper.retry", step = label, error = %err, "recovery reload failed");
				}
			}
		}
	}
}
