use std::path::{Path, PathBuf};

use serde::Serialize;
use swapper::profile::{lock_path, profile_exists};

use crate::error::Result;
use crate::output::OutputFormat;
use crate::settings;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ProfileStatus {
	address: String,
	profile_dir: PathBuf,
	/// A session will unlock rather than restore.
	exists: bool,
	locked: bool,
}

pub fn execute(config: Option<&Path>, wallets: &Path, profiles_dir: Option<&Path>, format: OutputFormat) -> Result<()> {
	let settings = settings::load(config)?;
	let root = profiles_dir.unwrap_or(settings.profiles_dir.as_path());
	let wallets = super::read_wallets(wallets)?;

	let statuses: Vec<ProfileStatus> = wallets
		.iter()
		.map(|wallet| {
			let dir = wallet.profile_dir(root);
			ProfileStatus {
				address: wallet.address.clone(),
				exists: profile_exists(&dir),
				locked: lock_path(&dir).exists(),
				profile_dir: dir,
			}
		})
		.collect();

	super::emit("profiles", statuses, |statuses| render(statuses), format);
	Ok(())
}

fn render(statuses: &[ProfileStatus]) -> String {
	if statuses.is_empty() {
		return "no wallets".to_string();
	}
	statuses
		.iter()
		.map(|status| {
			let state = if status.exists { "unlock" } else { "restore" };
			let lock = if status.locked { " [locked]" } else { "" };
			format!("{} {state}{lock} {}", status.address, status.profile_dir.display())
		})
		.collect::<Vec<_>>()
		.join("\n")
}
