use tracing::{info, warn};

use super::{StepContext, click_if_visible, unlock_if_prompted};
use crate::driver::{BrowserSession, UiDriver};
use crate::error::Result;
use crate::retry::{Attempted, PolicyOutcome, Recovery};
use crate::step::StepOutcome;

/// Connects the trading site to the wallet extension.
pub async fn connect(ctx: &StepContext<'_>, browser: &dyn BrowserSession) -> Attempted<()> {
	let trade = match browser.surface(&ctx.trade_site()).await {
		Ok(trade) => trade,
		Err(err) => {
			return Attempted {
				outcome: PolicyOutcome::Skipped(format!("cannot open trading site: {err}")),
				attempts: 0,
			};
		}
	};

	let policy = ctx.policy(ctx.settings.max_retries.connect, Recovery::Reload);
	let trade = trade.as_ref();
	policy
		.run("connect", Some(trade), |_| connect_once(ctx, browser, trade))
		.await
}

async fn connect_once(
	ctx: &StepContext<'_>,
	browser: &dyn BrowserSession,
	trade: &dyn UiDriver,
) -> Result<StepOutcome<()>> {
	let sel = &ctx.settings.selectors;
	let timeouts = &ctx.settings.timeouts;

	if !trade.is_visible(&sel.trade.connect_wallet_button, timeouts.expect()).await? {
		return Ok(StepOutcome::skip("Connect Wallet button not visible"));
	}
	trade.click(&sel.trade.connect_wallet_button).await?;
	if !click_if_visible(trade, &sel.trade.wallet_option, timeouts.expect()).await? {
		warn!(target: "swapper.session", locator = %sel.trade.wallet_option, "wallet option not offered");
	}

	let wallet_ui = browser.surface(&ctx.wallet_onboarding()).await?;
	unlock_if_prompted(ctx, wallet_ui.as_ref()).await?;
	if !click_if_visible(wallet_ui.as_ref(), &sel.wallet.approve_button, timeouts.expect()).await? {
		warn!(target: "swapper.session", "no connection approval prompt");
	}

	info!(target: "swapper.session", "wallet connected to trading site");
	Ok(StepOutcome::Success(()))
}
