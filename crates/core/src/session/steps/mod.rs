//! UI steps run by a wallet session.
//!
//! Each step is a single attempt returning a [`StepOutcome`]; the public
//! functions wrap it in the matching [`RetryPolicy`].
//!
//! [`StepOutcome`]: crate::step::StepOutcome

mod approve;
mod configure;
mod connect;
mod restore;
mod sell;
mod unlock;

use std::sync::Arc;
use std::time::{Duration, Instant};

use secrecy::ExposeSecret;

pub use approve::approve_transaction;
pub use configure::apply_fast_mode;
pub use connect::connect;
pub use restore::restore;
pub use sell::sell;
pub use unlock::unlock;

use crate::config::Settings;
use crate::driver::{BrowserSession, Locator, SurfaceTarget, UiDriver};
use crate::error::{Error, Result};
use crate::retry::{Recovery, RetryPolicy};
use crate::wallet::Wallet;

const SURFACE_POLL: Duration = Duration::from_millis(250);

/// Read-only inputs shared by every step of one session.
#[derive(Clone, Copy)]
pub struct StepContext<'a> {
	pub wallet: &'a Wallet,
	pub settings: &'a Settings,
}

impl<'a> StepContext<'a> {
	pub fn new(wallet: &'a Wallet, settings: &'a Settings) -> Self {
		Self { wallet, settings }
	}

	fn policy(&self, budget: u32, recovery: Recovery) -> RetryPolicy {
		RetryPolicy::new(budget)
			.with_recovery(recovery)
			.with_attempt_timeout(self.settings.timeouts.attempt())
	}

	fn password(&self) -> &str {
		self.settings.extension_password.expose_secret()
	}

	pub(crate) fn wallet_popup(&self) -> SurfaceTarget {
		SurfaceTarget::new(&self.settings.selectors.wallet.title, self.settings.extension.popup_url())
	}

	pub(crate) fn wallet_onboarding(&self) -> SurfaceTarget {
		SurfaceTarget::new(&self.settings.selectors.wallet.title, self.settings.extension.onboarding_url())
	}

	pub(crate) fn trade_site(&self) -> SurfaceTarget {
		SurfaceTarget::new(&self.settings.selectors.trade.title, &self.settings.trade_site_url)
	}
}

/// Clicks `locator` if it shows up within `timeout`. Returns whether it did.
async fn click_if_visible(surface: &dyn UiDriver, locator: &Locator, timeout: Duration) -> Result<bool> {
	if !surface.is_visible(locator, timeout).await? {
		return Ok(false);
	}
	surface.click(locator).await?;
	Ok(true)
}

/// Types the extension password and submits the unlock prompt if it is showing.
async fn unlock_if_prompted(ctx: &StepContext<'_>, wallet_ui: &dyn UiDriver) -> Result<bool> {
	let sel = &ctx.settings.selectors.wallet;
	let probe = ctx.settings.timeouts.probe();
	if !wallet_ui.is_visible(&sel.unlock_button, probe).await? {
		return Ok(false);
	}
	if wallet_ui.is_visible(&sel.password_input, Duration::ZERO).await? {
		wallet_ui.fill(&sel.password_input, ctx.password()).await?;
	}
	wallet_ui.click(&sel.unlock_button).await?;
	Ok(true)
}

/// Waits for a surface opened by the page itself, such as an approval popup.
///
/// Surfaces in `known` were open before the triggering action and are only
/// taken once `timeout` passes without a new match. Lookups never open pages.
async fn wait_for_surface(
	browser: &dyn BrowserSession,
	title_contains: &str,
	known: &[String],
	timeout: Duration,
) -> Result<Arc<dyn UiDriver>> {
	let fresh = SurfaceTarget::opened_since(title_contains, known.to_vec());
	let deadline = Instant::now() + timeout;
	loop {
		match browser.surface(&fresh).await {
			Ok(surface) => return Ok(surface),
			Err(_) if Instant::now() < deadline => tokio::time::sleep(SURFACE_POLL).await,
			Err(_) => break,
		}
	}

	let any = SurfaceTarget::opened_since(title_contains, Vec::new());
	browser.surface(&any).await.map_err(|err| Error::Timeout {
		ms: timeout.as_millis() as u64,
		condition: format!("surface titled '{title_contains}' ({err})"),
	})
}
