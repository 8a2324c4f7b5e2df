//! Serializable summaries of sessions and whole runs.

use std::time::Duration;

use serde::Serialize;

use crate::sale::{SaleReport, SaleResult};
use crate::session::SessionState;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionReport {
	pub address: String,
	/// Every state entered, in order, ending in `Done` or `Aborted`.
	pub states: Vec<SessionState>,
	pub terminal: SessionState,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub abort_reason: Option<String>,
	pub sales: Vec<SaleReport>,
	pub elapsed_ms: u64,
}

impl SessionReport {
	/// Report for a session that ended before its state machine could run.
	pub fn aborted(address: impl Into<String>, reason: impl Into<String>) -> Self {
		Self {
			address: address.into(),
			states: vec![SessionState::Idle, SessionState::Aborted],
			terminal: SessionState::Aborted,
			abort_reason: Some(reason.into()),
			sales: Vec::new(),
			elapsed_ms: 0,
		}
	}

	pub fn is_done(&self) -> bool {
		self.terminal == SessionState::Done
	}

	pub fn sale(&self, token: &str) -> Option<&SaleReport> {
		self.sales.iter().find(|sale| sale.token == token)
	}
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
	pub sessions: Vec<SessionReport>,
	pub totals: RunTotals,
	pub elapsed_ms: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunTotals {
	pub wallets: usize,
	pub done: usize,
	pub aborted: usize,
	pub sales_confirmed: usize,
	pub sales_failed: usize,
}

impl RunReport {
	pub fn new(sessions: Vec<SessionReport>, elapsed: Duration) -> Self {
		let mut totals = RunTotals {
			wallets: sessions.len(),
			..RunTotals::default()
		};
		for session in &sessions {
			if session.is_done() {
				totals.done += 1;
			} else {
				totals.aborted += 1;
			}
			for sale in &session.sales {
				match sale.result {
					SaleResult::Confirmed => totals.sales_confirmed += 1,
					SaleResult::Failed => totals.sales_failed += 1,
					_ => {}
				}
			}
		}

		Self {
			sessions,
			totals,
			elapsed_ms: elapsed.as_millis() as u64,
		}
	}

	pub fn all_done(&self) -> bool {
		self.totals.done == self.totals.wallets
	}

	pub fn session(&self, address: &str) -> Option<&SessionReport> {
		self.sessions.iter().find(|session| session.address == address)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn sale(token: &str, result: SaleResult) -> SaleReport {
		SaleReport {
			token: token.into(),
			attempts: 1,
			amount: Some(1.0),
			result,
		}
	}

	#[test]
	fn totals_count_terminal_states_and_sales() {
		let done = SessionReport {
			address: "a".into(),
			states: vec![SessionState::Idle, SessionState::Done],
			terminal: SessionState::Done,
			abort_reason: None,
			sales: vec![sale("SOL", SaleResult::Confirmed), sale("USDC", SaleResult::Failed)],
			elapsed_ms: 10,
		};
		let report = RunReport::new(vec![done, SessionReport::aborted("b", "launch failed")], Duration::from_millis(25));

		assert_eq!(
			report.totals,
			RunTotals {
				wallets: 2,
				done: 1,
				aborted: 1,
				sales_confirmed: 1,
				sales_failed: 1,
			}
		);
		assert!(!report.all_done());
		assert_eq!(report.session("b").and_then(|s| s.abort_reason.as_deref()), Some("launch failed"));
	}

	#[test]
	fn serializes_camel_case_with_tagged_sale_results() {
		let report = SessionReport {
			sales: vec![sale("SOL", SaleResult::Skipped("nothing to sell".into()))],
			..SessionReport::aborted("addr", "SOL sale skipped")
		};
		let json = serde_json::to_value(&report).unwrap();
		assert_eq!(json["terminal"], "aborted");
		assert_eq!(json["abortReason"], "SOL sale skipped");
		assert_eq!(json["sales"][0]["result"]["status"], "skipped");
		assert_eq!(json["sales"][0]["result"]["reason"], "nothing to sell");
		assert_eq!(json["elapsedMs"], 0);
	}
}
