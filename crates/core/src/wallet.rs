use std::collections::HashSet;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use crate::error::{Error, Result};

/// A wallet to process. Immutable once loaded.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Wallet {
	pub address: String,
	pub private_key: SecretString,
}

impl Wallet {
	pub fn new(address: impl Into<String>, private_key: impl Into<String>) -> Self {
		Self {
			address: address.into(),
			private_key: SecretString::from(private_key.into()),
		}
	}

	/// Browser profile directory owned by this wallet's session.
	pub fn profile_dir(&self, root: &Path) -> PathBuf {
		root.join(&self.address)
	}

	fn validate(&self) -> Result<()> {
		let addr = self.address.trim();
		if addr.is_empty() {
			return Err(Error::Config("wallet address is empty".into()));
		}
		// The address doubles as a directory name.
		if addr != self.address || addr.contains(['/', '\\']) || addr.starts_with('.') {
			return Err(Error::Config(format!("wallet address '{}' is not a valid profile name", self.address)));
		}
		if self.private_key.expose_secret().trim().is_empty() {
			return Err(Error::Config(format!("wallet {} has an empty private key", self.address)));
		}
		Ok(())
	}
}

/// Loads the ordered wallet list from a JSON array of `{address, privateKey}`.
pub fn load_wallets(path: &Path) -> Result<Vec<Wallet>> {
	let raw = std::fs::read_to_string(path)?;
	let wallets: Vec<Wallet> = serde_json::from_str(&raw).map_err(|e| Error::Config(format!("{}: {e}", path.display())))?;
	for wallet in &wallets {
		wallet.validate()?;
	}
	Ok(wallets)
}

/// Returns the addresses that appear more than once, in first-seen order.
pub fn duplicate_addresses(wallets: &[Wallet]) -> Vec<String> {
	let mut seen = HashSet::new();
	let mut dupes = Vec::new();
	for wallet in wallets {
		if !seen.insert(wallet.address.as_str()) && !dupes.contains(&wallet.address) {
			dupes.push(wallet.address.clone());
		}
	}
	dupes
}
