//! Tri-state result of a single UI-driven step attempt.

/// Outcome of one step attempt.
///
/// `Retryable` consumes an attempt and lets the enclosing [`RetryPolicy`]
/// recover and try again. `FatalSkip` stops the policy immediately and aborts
/// the wallet's session.
///
/// [`RetryPolicy`]: crate::retry::RetryPolicy
#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome<T> {
	Success(T),
	Retryable(String),
	FatalSkip(String),
}

impl<T> StepOutcome<T> {
	pub fn retry(reason: impl Into<String>) -> Self {
		StepOutcome::Retryable(reason.into())
	}

	pub fn skip(reason: impl Into<String>) -> Self {
		StepOutcome::FatalSkip(reason.into())
	}
}
