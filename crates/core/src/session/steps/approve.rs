use tracing::{info, warn};

use super::{StepContext, unlock_if_prompted, wait_for_surface};
use crate::driver::BrowserSession;
use crate::error::Result;

/// Drives the wallet's confirmation prompt after an order is submitted.
///
/// `known` lists the surfaces open before the order was submitted. Best-effort:
/// a missing prompt is logged and the caller goes on to wait for the site's
/// status indicator, which decides the outcome.
pub async fn approve_transaction(ctx: &StepContext<'_>, browser: &dyn BrowserSession, known: &[String]) {
	if let Err(err) = approve_once(ctx, browser, known).await {
		warn!(target: "swapper.session", error = %err, "transaction approval failed");
	}
}

async fn approve_once(ctx: &StepContext<'_>, browser: &dyn BrowserSession, known: &[String]) -> Result<()> {
	let sel = &ctx.settings.selectors.wallet;
	let expect = ctx.settings.timeouts.expect();

	let prompt = wait_for_surface(browser, &sel.title, known, expect).await?;
	prompt.bring_to_front().await?;
	if unlock_if_prompted(ctx, prompt.as_ref()).await? {
		info!(target: "swapper.session", "wallet unlocked for approval");
	}
	prompt.wait_visible(&sel.approve_button, expect).await?;
	prompt.click(&sel.approve_button).await?;

	info!(target: "swapper.session", "transaction approved");
	Ok(())
}
