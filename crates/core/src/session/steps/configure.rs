use tracing::debug;

use super::{StepContext, click_if_visible};
use crate::driver::UiDriver;
use crate::error::{Error, Result};

/// Switches the trading site's transaction speed to fast.
///
/// Callers treat a failure as non-fatal and only log it.
pub async fn apply_fast_mode(ctx: &StepContext<'_>, trade: &dyn UiDriver) -> Result<()> {
	let sel = &ctx.settings.selectors.trade;
	let expect = ctx.settings.timeouts.expect();

	if !click_if_visible(trade, &sel.settings_icon, expect).await? {
		return Err(Error::ElementNotFound {
			locator: sel.settings_icon.to_string(),
		});
	}
	if !click_if_visible(trade, &sel.fast_option, expect).await? {
		return Err(Error::ElementNotFound {
			locator: sel.fast_option.to_string(),
		});
	}
	trade.click(&sel.settings_close).await?;

	debug!(target: "swapper.session", "fast mode applied");
	Ok(())
}
