//! Runs every wallet's session concurrently and collects their reports.

use std::collections::HashSet;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use futures::FutureExt;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{Instrument, error, info, info_span, warn};

use crate::config::Settings;
use crate::driver::SessionLauncher;
use crate::report::{RunReport, SessionReport};
use crate::session::WalletSession;
use crate::wallet::{Wallet, duplicate_addresses};

pub struct Orchestrator {
	settings: Arc<Settings>,
	launcher: Arc<dyn SessionLauncher>,
}

impl Orchestrator {
	pub fn new(settings: Arc<Settings>, launcher: Arc<dyn SessionLauncher>) -> Self {
		Self { settings, launcher }
	}

	/// Runs one session per wallet and waits for all of them.
	///
	/// Reports come back in wallet-list order. A later entry repeating an
	/// earlier address is not launched and reports `Aborted`.
	pub async fn run(&self, wallets: Vec<Wallet>) -> RunReport {
		let started = Instant::now();
		let duplicates = duplicate_addresses(&wallets);
		if !duplicates.is_empty() {
			warn!(target: "swapper", ?duplicates, "wallet list repeats addresses; only the first entry of each runs");
		}
		let limit = self.settings.max_concurrency.map(|n| Arc::new(Semaphore::new(n.max(1))));

		info!(
			target: "swapper",
			wallets = wallets.len(),
			max_concurrency = ?self.settings.max_concurrency,
			"starting sessions"
		);

		let mut slots: Vec<Option<SessionReport>> = vec![None; wallets.len()];
		let mut addresses = Vec::with_capacity(wallets.len());
		let mut seen = HashSet::new();
		let mut tasks = JoinSet::new();

		for (index, wallet) in wallets.into_iter().enumerate() {
			addresses.push(wallet.address.clone());
			if !seen.insert(wallet.address.clone()) {
				error!(target: "swapper", address = %wallet.address, "duplicate wallet rejected");
				slots[index] = Some(SessionReport::aborted(&wallet.address, "duplicate wallet address in list"));
				continue;
			}

			let span = info_span!("wallet", address = %wallet.address);
			let settings = Arc::clone(&self.settings);
			let launcher = Arc::clone(&self.launcher);
			let limit = limit.clone();
			tasks.spawn(
				async move {
					let _permit = match limit {
						Some(limit) => limit.acquire_owned().await.ok(),
						None => None,
					};
					(index, run_isolated(wallet, settings, launcher).await)
				}
				.instrument(span),
			);
		}

		while let Some(joined) = tasks.join_next().await {
			match joined {
				Ok((index, report)) => slots[index] = Some(report),
				Err(err) => error!(target: "swapper", error = %err, "session task failed to join"),
			}
		}

		let sessions = slots
			.into_iter()
			.zip(addresses)
			.map(|(slot, address)| slot.unwrap_or_else(|| SessionReport::aborted(address, "session task was lost")))
			.collect::<Vec<_>>();
		let report = RunReport::new(sessions, started.elapsed());

		info!(
			target: "swapper",
			done = report.totals.done,
			aborted = report.totals.aborted,
			elapsed_ms = report.elapsed_ms,
			"all sessions finished"
		);
		report
	}
}

/// Runs one session, turning a panic into an `Aborted` report.
async fn run_isolated(wallet: Wallet, settings: Arc<Settings>, launcher: Arc<dyn SessionLauncher>) -> SessionReport {
	let address = wallet.address.clone();
	let session = WalletSession::new(wallet, settings);

	match AssertUnwindSafe(session.run(launcher.as_ref())).catch_unwind().await {
		Ok(report) => report,
		Err(panic) => {
			let message = panic
				.downcast_ref::<&str>()
				.map(|s| s.to_string())
				.or_else(|| panic.downcast_ref::<String>().cloned())
				.unwrap_or_else(|| "unknown panic".to_string());
			error!(target: "swapper.session", %message, "session panicked");
			SessionReport::aborted(address, format!("session panicked: {message}"))
		}
	}
}
