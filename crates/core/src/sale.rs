//! Sell requests and their per-sale results.

use serde::Serialize;

/// One sell order to place on the trading site.
#[derive(Debug, Clone, PartialEq)]
pub struct SaleRequest {
	pub token: String,
	/// Amount to sell; `None` sells the full available balance.
	pub amount: Option<f64>,
	pub fast: bool,
}

impl SaleRequest {
	pub fn new(token: impl Into<String>, amount: Option<f64>, fast: bool) -> Self {
		Self {
			token: token.into(),
			amount,
			fast,
		}
	}
}

/// The two sales of a session, in dependency order.
///
/// `token_b` is only attempted once `token_a` has been sold.
#[derive(Debug, Clone, PartialEq)]
pub struct SalePlan {
	pub token_a: SaleRequest,
	pub token_b: SaleRequest,
}

/// What the status indicator reported after submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SwapStatus {
	Confirmed,
	/// The site reported a definitive transaction failure.
	Failed,
}

/// Final state of a sale attempt sequence.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "camelCase")]
pub enum SaleResult {
	Confirmed,
	Failed,
	/// Fatal skip (zero balance, missing balance indicator).
	Skipped(String),
	/// Every attempt failed.
	Exhausted(String),
	/// Never attempted because an earlier sale did not succeed.
	NotAttempted,
}

impl SaleResult {
	pub fn is_confirmed(&self) -> bool {
		matches!(self, SaleResult::Confirmed)
	}
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleReport {
	pub token: String,
	pub attempts: u32,
	/// Amount typed into the order form on the last submitting attempt.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub amount: Option<f64>,
	pub result: SaleResult,
}

impl SaleReport {
	pub fn not_attempted(token: impl Into<String>) -> Self {
		Self {
			token: token.into(),
			attempts: 0,
			amount: None,
			result: SaleResult::NotAttempted,
		}
	}
}
