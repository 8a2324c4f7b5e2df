//! One wallet, one isolated browser, one pass through the sell lifecycle.

mod state;
pub mod steps;

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};

pub use state::SessionState;
use steps::StepContext;

use crate::config::{FailedSwapPolicy, Settings};
use crate::driver::{BrowserSession, LaunchSpec, SessionLauncher};
use crate::error::Result;
use crate::profile::{ProfileLock, profile_exists};
use crate::report::SessionReport;
use crate::retry::Attempted;
use crate::sale::{SaleReport, SaleResult};
use crate::wallet::Wallet;

/// How the step sequence ended, before the terminal state is recorded.
enum Flow {
	Done,
	Aborted(String),
}

/// State machine driving a single wallet from profile check to its last sale.
pub struct WalletSession {
	wallet: Wallet,
	settings: Arc<Settings>,
	state: SessionState,
	trail: Vec<SessionState>,
	sales: Vec<SaleReport>,
}

impl WalletSession {
	pub fn new(wallet: Wallet, settings: Arc<Settings>) -> Self {
		Self {
			wallet,
			settings,
			state: SessionState::Idle,
			trail: vec![SessionState::Idle],
			sales: Vec::new(),
		}
	}

	/// Runs the session to a terminal state. Never fails: every problem ends
	/// up as `Aborted` with a reason in the report.
	pub async fn run(mut self, launcher: &dyn SessionLauncher) -> SessionReport {
		let started = Instant::now();
		let profile_dir = self.wallet.profile_dir(&self.settings.profiles_dir);

		let abort_reason = match ProfileLock::acquire(&profile_dir) {
			Ok(lock) => {
				let flow = self.drive(launcher, &profile_dir).await;
				drop(lock);
				match flow {
					Flow::Done => None,
					Flow::Aborted(reason) => Some(reason),
				}
			}
			Err(err) => {
				self.enter(SessionState::Aborted);
				Some(err.to_string())
			}
		};

		match &abort_reason {
			None => info!(target: "swapper.session", elapsed_ms = started.elapsed().as_millis() as u64, "session done"),
			Some(reason) => warn!(target: "swapper.session", %reason, "session aborted"),
		}

		SessionReport {
			address: self.wallet.address,
			terminal: self.state,
			states: self.trail,
			abort_reason,
			sales: self.sales,
			elapsed_ms: started.elapsed().as_millis() as u64,
		}
	}

	async fn drive(&mut self, launcher: &dyn SessionLauncher, profile_dir: &Path) -> Flow {
		self.enter(SessionState::ProfileCheck);
		let fresh = !profile_exists(profile_dir);
		debug!(target: "swapper.session", profile = %profile_dir.display(), fresh, "profile checked");

		let spec = match self.launch_spec(profile_dir) {
			Ok(spec) => spec,
			Err(err) => return self.finish(Flow::Aborted(err.to_string())),
		};
		let mut browser = match launcher.launch(&spec).await {
			Ok(browser) => browser,
			Err(err) => return self.finish(Flow::Aborted(format!("cannot launch isolated session: {err}"))),
		};

		let flow = self.steps(browser.as_ref(), fresh).await;
		let flow = self.finish(flow);
		if let Err(err) = browser.close().await {
			warn!(target: "swapper.session", error = %err, "failed to close browser");
		}
		flow
	}

	async fn steps(&mut self, browser: &dyn BrowserSession, fresh: bool) -> Flow {
		let settings = Arc::clone(&self.settings);
		let wallet = self.wallet.clone();
		let ctx = StepContext::new(&wallet, &settings);

		if fresh {
			self.enter(SessionState::Restoring);
			if let Some(reason) = failure(steps::restore(&ctx, browser).await) {
				return Flow::Aborted(format!("wallet restore failed: {reason}"));
			}
			self.enter(SessionState::Connecting);
			if let Some(reason) = failure(steps::connect(&ctx, browser).await) {
				return Flow::Aborted(format!("wallet connection failed: {reason}"));
			}
		} else {
			self.enter(SessionState::Unlocking);
			if let Some(reason) = failure(steps::unlock(&ctx, browser).await) {
				return Flow::Aborted(format!("failed to unlock wallet: {reason}"));
			}
		}

		self.enter(SessionState::Configuring);
		if settings.fast_mode {
			self.configure(&ctx, browser).await;
		}

		let plan = settings.sale_plan();

		self.enter(SessionState::SellingTokenA);
		let first = steps::sell(&ctx, browser, &plan.token_a).await;
		let first_result = first.result.clone();
		self.sales.push(first);

		match first_result {
			SaleResult::Confirmed => {}
			SaleResult::Failed if settings.failed_swap_policy == FailedSwapPolicy::Continue => {
				info!(target: "swapper.session", token = %plan.token_a.token, "swap failed, continuing with next sale");
			}
			SaleResult::Failed => {
				info!(target: "swapper.session", token = %plan.token_b.token, "skipping sale after failed swap");
				self.sales.push(SaleReport::not_attempted(&plan.token_b.token));
				return Flow::Done;
			}
			SaleResult::Skipped(reason) | SaleResult::Exhausted(reason) => {
				self.sales.push(SaleReport::not_attempted(&plan.token_b.token));
				return Flow::Aborted(format!("{} sale: {reason}", plan.token_a.token));
			}
			SaleResult::NotAttempted => {
				self.sales.push(SaleReport::not_attempted(&plan.token_b.token));
				return Flow::Aborted(format!("{} sale was not attempted", plan.token_a.token));
			}
		}

		self.enter(SessionState::SellingTokenB);
		let second = steps::sell(&ctx, browser, &plan.token_b).await;
		if !second.result.is_confirmed() {
			warn!(target: "swapper.session", token = %second.token, result = ?second.result, "second sale did not confirm");
		}
		self.sales.push(second);
		Flow::Done
	}

	async fn configure(&self, ctx: &StepContext<'_>, browser: &dyn BrowserSession) {
		let result = async {
			let trade = browser.surface(&ctx.trade_site()).await?;
			steps::apply_fast_mode(ctx, trade.as_ref()).await
		}
		.await;
		if let Err(err) = result {
			warn!(target: "swapper.session", error = %err, "fast mode not applied");
		}
	}

	fn launch_spec(&self, profile_dir: &Path) -> Result<LaunchSpec> {
		Ok(LaunchSpec {
			profile_dir: profile_dir.to_path_buf(),
			proxy: self.settings.proxy_config()?,
			headless: self.settings.headless,
			locale: self.settings.locale.clone(),
			slow_mo: self.settings.slow_mo(),
			extra_args: self.settings.extra_args.clone(),
		})
	}

	fn finish(&mut self, flow: Flow) -> Flow {
		match flow {
			Flow::Done => self.enter(SessionState::Done),
			Flow::Aborted(_) => self.enter(SessionState::Aborted),
		}
		flow
	}

	fn enter(&mut self, next: SessionState) {
		debug_assert!(self.state.can_transition_to(next), "illegal transition {} -> {next}", self.state);
		debug!(target: "swapper.session", from = %self.state, to = %next, "state change");
		self.state = next;
		self.trail.push(next);
	}
}

fn failure(attempted: Attempted<()>) -> Option<String> {
	attempted.failure_reason().map(str::to_string)
}
