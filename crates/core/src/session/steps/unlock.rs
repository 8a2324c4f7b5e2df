use tracing::info;

use super::{StepContext, unlock_if_prompted};
use crate::driver::BrowserSession;
use crate::error::Result;
use crate::retry::{Attempted, Recovery};
use crate::step::StepOutcome;

/// Unlocks the extension of an existing profile.
///
/// Succeeds without typing anything when no unlock prompt is showing.
pub async fn unlock(ctx: &StepContext<'_>, browser: &dyn BrowserSession) -> Attempted<()> {
	let policy = ctx.policy(ctx.settings.max_retries.unlock, Recovery::None);
	policy.run("unlock", None, |_| unlock_once(ctx, browser)).await
}

async fn unlock_once(ctx: &StepContext<'_>, browser: &dyn BrowserSession) -> Result<StepOutcome<()>> {
	let popup = ctx.wallet_popup();
	let page = browser.surface(&popup).await?;
	if let Some(url) = &popup.url {
		page.navigate(url).await?;
	}

	if unlock_if_prompted(ctx, page.as_ref()).await? {
		info!(target: "swapper.session", "wallet unlocked");
	} else {
		info!(target: "swapper.session", "wallet already unlocked");
	}
	Ok(StepOutcome::Success(()))
}
