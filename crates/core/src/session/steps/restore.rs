use secrecy::ExposeSecret;
use tracing::info;

use super::StepContext;
use crate::driver::BrowserSession;
use crate::error::Result;
use crate::retry::{Attempted, Recovery};
use crate::step::StepOutcome;

/// Imports the wallet's private key into a fresh extension profile.
pub async fn restore(ctx: &StepContext<'_>, browser: &dyn BrowserSession) -> Attempted<()> {
	// Every attempt reopens the onboarding page, so no reload in between.
	let policy = ctx.policy(ctx.settings.max_retries.restore, Recovery::None);
	policy.run("restore", None, |_| restore_once(ctx, browser)).await
}

async fn restore_once(ctx: &StepContext<'_>, browser: &dyn BrowserSession) -> Result<StepOutcome<()>> {
	let sel = &ctx.settings.selectors.wallet;
	let expect = ctx.settings.timeouts.expect();

	let onboarding = ctx.wallet_onboarding();
	let page = browser.surface(&onboarding).await?;
	if let Some(url) = &onboarding.url {
		page.navigate(url).await?;
	}

	page.wait_visible(&sel.import_wallet, expect).await?;
	page.click(&sel.import_wallet).await?;
	page.wait_visible(&sel.network_option, expect).await?;
	page.click(&sel.network_option).await?;
	page.wait_visible(&sel.import_private_key, expect).await?;
	page.click(&sel.import_private_key).await?;

	page.wait_visible(&sel.private_key_input, expect).await?;
	page.fill(&sel.private_key_input, ctx.wallet.private_key.expose_secret()).await?;
	page.click(&sel.import_confirm).await?;

	page.wait_visible(&sel.password_input, expect).await?;
	page.fill(&sel.password_input, ctx.password()).await?;
	page.fill(&sel.password_confirm_input, ctx.password()).await?;
	page.check(&sel.terms_checkbox).await?;
	page.click(&sel.next_button).await?;

	info!(target: "swapper.session", "wallet restored from private key");
	Ok(StepOutcome::Success(()))
}
