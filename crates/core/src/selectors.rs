//! Locators for the wallet extension and the trading site.
//!
//! These are the contract with two external UIs that we do not control. They
//! ship with working defaults and every entry can be overridden from the config
//! file when markup changes.

use serde::{Deserialize, Serialize};

use crate::driver::Locator;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SelectorCatalog {
	pub wallet: WalletSelectors,
	pub trade: TradeSelectors,
}

/// Wallet extension pages (onboarding, popup, approval prompt).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WalletSelectors {
	/// Title fragment identifying extension pages.
	pub title: String,
	pub unlock_button: Locator,
	pub password_input: Locator,
	pub password_confirm_input: Locator,
	pub import_wallet: Locator,
	pub network_option: Locator,
	pub import_private_key: Locator,
	pub private_key_input: Locator,
	pub import_confirm: Locator,
	pub terms_checkbox: Locator,
	pub next_button: Locator,
	pub approve_button: Locator,
}

impl Default for WalletSelectors {
	fn default() -> Self {
		Self {
			title: "Backpack".into(),
			unlock_button: Locator::exact_text("Unlock"),
			password_input: Locator::css(r#"input[type="password"]"#),
			password_confirm_input: Locator::css(r#"input[type="password"]"#).nth(1),
			import_wallet: Locator::text("Import Wallet"),
			network_option: Locator::exact_text("Solana"),
			import_private_key: Locator::text("Import private key"),
			private_key_input: Locator::css("textarea"),
			import_confirm: Locator::exact_text("Import"),
			terms_checkbox: Locator::css(r#"input[type="checkbox"]"#),
			next_button: Locator::exact_text("Next"),
			approve_button: Locator::exact_text("Approve"),
		}
	}
}

/// Trading site order form and wallet-connect flow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TradeSelectors {
	/// Title fragment identifying the trading site tab.
	pub title: String,
	pub connect_wallet_button: Locator,
	pub wallet_option: Locator,
	pub settings_icon: Locator,
	pub fast_option: Locator,
	pub settings_close: Locator,
	pub balance_label: Locator,
	pub amount_input: Locator,
	pub submit_button: Locator,
	pub status_banner: Locator,
	/// Submit labels meaning the order cannot be placed right now.
	pub blocking_labels: Vec<String>,
	/// Status text reported for a definitively failed transaction.
	pub failure_marker: String,
}

impl Default for TradeSelectors {
	fn default() -> Self {
		Self {
			title: "Phoenix".into(),
			connect_wallet_button: Locator::role("button", "Connect Wallet"),
			wallet_option: Locator::exact_text("Backpack"),
			settings_icon: Locator::css("svg.settings-icon"),
			fast_option: Locator::exact_text("Fast"),
			settings_close: Locator::css(r#"ion-icon[icon="close"]"#).nth(1),
			balance_label: Locator::text("Max:"),
			amount_input: Locator::css(r#"input[value=""]"#).nth(2),
			submit_button: Locator::css("button.sc-eqUAAy.sc-fqkvVR.sc-iGgWBj.clpFdu.ecLVOp.dWZrWT"),
			status_banner: Locator::xpath(r#"//*[@id="root"]/div[4]/div[2]/div[1]/div/div"#),
			blocking_labels: [
				"Enter an amount",
				"Insufficient SOL balance",
				"Insufficient USDC balance",
				"Insufficient liquidity",
				"Insufficient size",
				"Country not supported",
			]
			.into_iter()
			.map(String::from)
			.collect(),
			failure_marker: "Failed to send transaction".into(),
		}
	}
}

impl TradeSelectors {
	/// Matches a submit label against the known blocking states.
	pub fn is_blocking_label(&self, label: &str) -> bool {
		let label = label.trim();
		self.blocking_labels.iter().any(|blocked| blocked.eq_ignore_ascii_case(label))
	}
}
