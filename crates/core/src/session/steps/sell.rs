use tracing::{error, info, warn};

use super::{StepContext, apply_fast_mode, approve_transaction};
use crate::balance::{parse_balance, submit_amount};
use crate::driver::{BrowserSession, UiDriver};
use crate::error::Result;
use crate::retry::{PolicyOutcome, Recovery};
use crate::sale::{SaleReport, SaleRequest, SaleResult, SwapStatus};
use crate::step::StepOutcome;

/// A submitted order and what the site reported for it.
#[derive(Debug, Clone, Copy)]
struct Submitted {
	amount: f64,
	status: SwapStatus,
}

/// Sells one token on the trading site.
///
/// A definitive "failed to send" status is a completed sale with
/// [`SaleResult::Failed`] and is not retried.
pub async fn sell(ctx: &StepContext<'_>, browser: &dyn BrowserSession, request: &SaleRequest) -> SaleReport {
	let trade = match browser.surface(&ctx.trade_site()).await {
		Ok(trade) => trade,
		Err(err) => {
			return SaleReport {
				token: request.token.clone(),
				attempts: 0,
				amount: None,
				result: SaleResult::Skipped(format!("trading site unavailable: {err}")),
			};
		}
	};

	let trade = trade.as_ref();
	let label = format!("sell {}", request.token);
	let attempted = ctx
		.policy(ctx.settings.max_retries.sell, Recovery::Reload)
		.run(&label, Some(trade), |_| sell_once(ctx, browser, trade, request))
		.await;

	let (amount, result) = match attempted.outcome {
		PolicyOutcome::Success(Submitted { amount, status }) => {
			let result = match status {
				SwapStatus::Confirmed => SaleResult::Confirmed,
				SwapStatus::Failed => SaleResult::Failed,
			};
			(Some(amount), result)
		}
		PolicyOutcome::Skipped(reason) => (None, SaleResult::Skipped(reason)),
		PolicyOutcome::Exhausted(reason) => (None, SaleResult::Exhausted(reason)),
	};

	SaleReport {
		token: request.token.clone(),
		attempts: attempted.attempts,
		amount,
		result,
	}
}

async fn sell_once(
	ctx: &StepContext<'_>,
	browser: &dyn BrowserSession,
	trade: &dyn UiDriver,
	request: &SaleRequest,
) -> Result<StepOutcome<Submitted>> {
	let sel = &ctx.settings.selectors.trade;
	let timeouts = &ctx.settings.timeouts;
	let token = request.token.as_str();

	trade.bring_to_front().await?;
	if request.fast {
		if let Err(err) = apply_fast_mode(ctx, trade).await {
			warn!(target: "swapper.session", token, error = %err, "could not apply fast mode");
		}
	}

	if !trade.is_visible(&sel.balance_label, timeouts.expect()).await? {
		return Ok(StepOutcome::skip(format!("cannot determine {token} balance")));
	}
	let text = trade.read_text(&sel.balance_label).await?;
	let Some(balance) = parse_balance(&text) else {
		return Ok(StepOutcome::retry(format!("unrecognized balance text '{}'", text.trim())));
	};
	if balance == 0.0 {
		info!(target: "swapper.session", token, "balance is zero");
		return Ok(StepOutcome::skip(format!("nothing to sell: {token} balance is zero")));
	}

	let amount = submit_amount(request.amount, balance);
	info!(target: "swapper.session", token, balance, amount, "placing sell order");
	trade.type_text(&sel.amount_input, &amount.to_string()).await?;

	let submit_label = trade.read_text(&sel.submit_button).await?;
	if sel.is_blocking_label(&submit_label) {
		return Ok(StepOutcome::retry(format!("order blocked: {}", submit_label.trim())));
	}
	let known = browser.surface_ids().await?;
	trade.click(&sel.submit_button).await?;

	approve_transaction(ctx, browser, &known).await;

	trade.wait_visible(&sel.status_banner, timeouts.confirmation()).await?;
	let status_text = trade.read_text(&sel.status_banner).await?;
	let status = if status_text.contains(&sel.failure_marker) {
		error!(target: "swapper.session", token, status = %status_text.trim(), "swap failed");
		SwapStatus::Failed
	} else {
		info!(target: "swapper.session", token, amount, "swap confirmed");
		SwapStatus::Confirmed
	};

	Ok(StepOutcome::Success(Submitted { amount, status }))
}
