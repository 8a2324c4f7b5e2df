use std::fmt;

use serde::Serialize;

/// Position of a wallet session in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SessionState {
	Idle,
	ProfileCheck,
	Restoring,
	Unlocking,
	Connecting,
	Configuring,
	SellingTokenA,
	SellingTokenB,
	Done,
	Aborted,
}

impl SessionState {
	pub fn is_terminal(self) -> bool {
		matches!(self, SessionState::Done | SessionState::Aborted)
	}

	/// Whether the lifecycle permits moving from `self` to `next`.
	pub fn can_transition_to(self, next: SessionState) -> bool {
		use SessionState::*;

		if self.is_terminal() {
			return false;
		}
		if next == Aborted {
			return true;
		}
		matches!(
			(self, next),
			(Idle, ProfileCheck)
				| (ProfileCheck, Restoring)
				| (ProfileCheck, Unlocking)
				| (Restoring, Connecting)
				| (Connecting, Configuring)
				| (Unlocking, Configuring)
				| (Configuring, SellingTokenA)
				| (SellingTokenA, SellingTokenB)
				// failed swap under the stop policy
				| (SellingTokenA, Done)
				| (SellingTokenB, Done)
		)
	}
}

impl fmt::Display for SessionState {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let name = match self {
			SessionState::Idle => "idle",
			SessionState::ProfileCheck => "profile-check",
			SessionState::Restoring => "restoring",
			SessionState::Unlocking => "unlocking",
			SessionState::Connecting => "connecting",
			SessionState::Configuring => "configuring",
			SessionState::SellingTokenA => "selling-token-a",
			SessionState::SellingTokenB => "selling-token-b",
			SessionState::Done => "done",
			SessionState::Aborted => "aborted",
		};
		f.write_str(name)
	}
}
