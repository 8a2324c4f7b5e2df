mod support;

use std::sync::Arc;

use swapper::profile::lock_path;
use swapper::{FailedSwapPolicy, SaleResult, SessionState, Settings, Wallet, WalletSession};
use tempfile::TempDir;

use support::{Action, Behavior, FakeLauncher, FakePage, happy_page, settings};

const ADDRESS: &str = "7Np41oeYqPefeNQEHSv1UDhYrehxin3NStELsSKCT4K2";

fn wallet() -> Wallet {
	Wallet::new(ADDRESS, "4vJ9JU1bJJE96FWSJKvHsmmFADCg4gpZQff4P3bkLKi")
}

fn existing_profile(settings: &Settings) {
	std::fs::create_dir_all(settings.profiles_dir.join(ADDRESS)).unwrap();
}

async fn run(settings: Settings, page: &Arc<FakePage>) -> swapper::SessionReport {
	let launcher = FakeLauncher::new().with(ADDRESS, Behavior::Page(page.clone()));
	WalletSession::new(wallet(), Arc::new(settings)).run(&launcher).await
}

#[tokio::test]
async fn fresh_profile_with_failing_restore_aborts_before_selling() {
	let temp = TempDir::new().unwrap();
	let settings = settings(temp.path());
	let page = happy_page(&settings, "Max: 2");
	page.hide(&settings.selectors.wallet.import_wallet);
	let submit = settings.selectors.trade.submit_button.clone();
	let onboarding = settings.extension.onboarding_url();

	let report = run(settings, &page).await;

	assert_eq!(
		report.states,
		vec![SessionState::Idle, SessionState::ProfileCheck, SessionState::Restoring, SessionState::Aborted]
	);
	assert_eq!(page.navigations_to(&onboarding), 3);
	assert!(report.abort_reason.as_deref().unwrap().starts_with("wallet restore failed"));
	assert!(report.sales.is_empty());
	assert_eq!(page.clicks_on(&submit), 0);
	assert_eq!(page.closes(), 1);
	assert!(!lock_path(&temp.path().join(ADDRESS)).exists());
}

#[tokio::test]
async fn fresh_profile_restores_connects_and_sells_both_tokens() {
	let temp = TempDir::new().unwrap();
	let settings = settings(temp.path());
	let page = happy_page(&settings, "Max: 2");
	let key_input = settings.selectors.wallet.private_key_input.to_string();

	let report = run(settings, &page).await;

	assert_eq!(
		report.states,
		vec![
			SessionState::Idle,
			SessionState::ProfileCheck,
			SessionState::Restoring,
			SessionState::Connecting,
			SessionState::Configuring,
			SessionState::SellingTokenA,
			SessionState::SellingTokenB,
			SessionState::Done,
		]
	);
	assert!(page.actions().contains(&Action::Fill(key_input, "4vJ9JU1bJJE96FWSJKvHsmmFADCg4gpZQff4P3bkLKi".into())));
	assert_eq!(report.sale("SOL").unwrap().result, SaleResult::Confirmed);
	assert_eq!(report.sale("USDC").unwrap().result, SaleResult::Confirmed);
}

#[tokio::test]
async fn zero_balance_on_first_sale_aborts_and_skips_second() {
	let temp = TempDir::new().unwrap();
	let settings = settings(temp.path());
	existing_profile(&settings);
	let page = happy_page(&settings, "Max: 0");
	let submit = settings.selectors.trade.submit_button.clone();

	let report = run(settings, &page).await;

	assert_eq!(report.terminal, SessionState::Aborted);
	assert!(report.states.contains(&SessionState::Unlocking));
	assert!(!report.states.contains(&SessionState::SellingTokenB));

	let sol = report.sale("SOL").unwrap();
	assert_eq!(sol.attempts, 1);
	assert!(matches!(&sol.result, SaleResult::Skipped(reason) if reason.contains("nothing to sell")));
	assert_eq!(report.sale("USDC").unwrap().result, SaleResult::NotAttempted);
	assert_eq!(page.clicks_on(&submit), 0);
	assert_eq!(page.closes(), 1);
}

#[tokio::test]
async fn missing_balance_indicator_is_a_fatal_skip() {
	let temp = TempDir::new().unwrap();
	let settings = settings(temp.path());
	existing_profile(&settings);
	let page = happy_page(&settings, "Max: 2");
	page.hide(&settings.selectors.trade.balance_label);

	let report = run(settings, &page).await;

	assert_eq!(report.terminal, SessionState::Aborted);
	let sol = report.sale("SOL").unwrap();
	assert_eq!(sol.attempts, 1);
	assert!(matches!(&sol.result, SaleResult::Skipped(reason) if reason.contains("cannot determine")));
	assert_eq!(page.reloads(), 0);
}

#[tokio::test]
async fn blocked_submit_label_is_retried_after_reload() {
	let temp = TempDir::new().unwrap();
	let settings = settings(temp.path());
	existing_profile(&settings);
	let page = happy_page(&settings, "Max: 2");
	page.set_texts(
		&settings.selectors.trade.submit_button,
		&["Place Order", "Insufficient liquidity", "Place Order"],
	);

	let report = run(settings, &page).await;

	assert_eq!(report.terminal, SessionState::Done);
	assert_eq!(report.sale("SOL").unwrap().attempts, 1);
	let usdc = report.sale("USDC").unwrap();
	assert_eq!(usdc.attempts, 2);
	assert_eq!(usdc.result, SaleResult::Confirmed);
	assert_eq!(page.reloads(), 1);
}

#[tokio::test]
async fn failed_swap_stops_session_by_default() {
	let temp = TempDir::new().unwrap();
	let settings = settings(temp.path());
	existing_profile(&settings);
	let page = happy_page(&settings, "Max: 2");
	page.set_texts(&settings.selectors.trade.status_banner, &["Failed to send transaction"]);

	let report = run(settings, &page).await;

	assert_eq!(report.terminal, SessionState::Done);
	assert!(!report.states.contains(&SessionState::SellingTokenB));
	let sol = report.sale("SOL").unwrap();
	assert_eq!(sol.result, SaleResult::Failed);
	assert_eq!(sol.attempts, 1);
	assert_eq!(report.sale("USDC").unwrap().result, SaleResult::NotAttempted);
}

#[tokio::test]
async fn failed_swap_with_continue_policy_attempts_second_sale() {
	let temp = TempDir::new().unwrap();
	let mut settings = settings(temp.path());
	settings.failed_swap_policy = FailedSwapPolicy::Continue;
	existing_profile(&settings);
	let page = happy_page(&settings, "Max: 2");
	page.set_texts(
		&settings.selectors.trade.status_banner,
		&["Failed to send transaction", "Order filled"],
	);

	let report = run(settings, &page).await;

	assert_eq!(report.terminal, SessionState::Done);
	assert!(report.states.contains(&SessionState::SellingTokenB));
	assert_eq!(report.sale("SOL").unwrap().result, SaleResult::Failed);
	assert_eq!(report.sale("USDC").unwrap().result, SaleResult::Confirmed);
}

#[tokio::test]
async fn second_sale_outcome_never_aborts_the_session() {
	let temp = TempDir::new().unwrap();
	let settings = settings(temp.path());
	existing_profile(&settings);
	let page = happy_page(&settings, "Max: 2");
	page.set_texts(&settings.selectors.trade.balance_label, &["Max: 2", "Max: 0"]);

	let report = run(settings, &page).await;

	assert_eq!(report.terminal, SessionState::Done);
	assert_eq!(report.sale("SOL").unwrap().result, SaleResult::Confirmed);
	assert!(matches!(report.sale("USDC").unwrap().result, SaleResult::Skipped(_)));
}

#[tokio::test]
async fn submitted_amount_is_capped_at_balance() {
	let temp = TempDir::new().unwrap();
	let mut settings = settings(temp.path());
	settings.sol_sell_amount = Some(5.0);
	settings.usdc_sell_amount = Some(0.25);
	existing_profile(&settings);
	let page = happy_page(&settings, "Max: 1.5");
	let amount_input = settings.selectors.trade.amount_input.clone();

	let report = run(settings, &page).await;

	assert_eq!(page.typed_into(&amount_input), vec!["1.5".to_string(), "0.25".to_string()]);
	assert_eq!(report.sale("SOL").unwrap().amount, Some(1.5));
	assert_eq!(report.sale("USDC").unwrap().amount, Some(0.25));
}

#[tokio::test]
async fn exhausted_sell_attempts_abort_the_session() {
	let temp = TempDir::new().unwrap();
	let settings = settings(temp.path());
	existing_profile(&settings);
	let page = happy_page(&settings, "Max: 2");
	page.set_texts(&settings.selectors.trade.submit_button, &["Enter an amount"]);

	let report = run(settings, &page).await;

	assert_eq!(report.terminal, SessionState::Aborted);
	let sol = report.sale("SOL").unwrap();
	assert_eq!(sol.attempts, 3);
	assert!(matches!(&sol.result, SaleResult::Exhausted(reason) if reason.contains("Enter an amount")));
	assert_eq!(page.reloads(), 2);
	assert_eq!(report.sale("USDC").unwrap().result, SaleResult::NotAttempted);
}

#[tokio::test]
async fn unrecognized_balance_text_is_retried() {
	let temp = TempDir::new().unwrap();
	let settings = settings(temp.path());
	existing_profile(&settings);
	let page = happy_page(&settings, "Max: 2");
	page.set_texts(&settings.selectors.trade.balance_label, &["Loading...", "Max: 2"]);

	let report = run(settings, &page).await;

	assert_eq!(report.terminal, SessionState::Done);
	assert_eq!(report.sale("SOL").unwrap().attempts, 2);
	assert_eq!(report.sale("USDC").unwrap().attempts, 1);
}

#[tokio::test]
async fn missing_connect_button_aborts_fresh_session() {
	let temp = TempDir::new().unwrap();
	let settings = settings(temp.path());
	let page = happy_page(&settings, "Max: 2");
	page.hide(&settings.selectors.trade.connect_wallet_button);

	let report = run(settings, &page).await;

	assert_eq!(report.terminal, SessionState::Aborted);
	assert_eq!(report.states.last(), Some(&SessionState::Aborted));
	assert!(report.states.contains(&SessionState::Connecting));
	assert!(report.abort_reason.unwrap().contains("Connect Wallet button not visible"));
	assert_eq!(page.reloads(), 0);
}

#[tokio::test]
async fn fast_mode_failure_does_not_abort() {
	let temp = TempDir::new().unwrap();
	let mut settings = settings(temp.path());
	settings.fast_mode = true;
	existing_profile(&settings);
	let page = happy_page(&settings, "Max: 2");
	page.hide(&settings.selectors.trade.settings_icon);

	let report = run(settings, &page).await;

	assert_eq!(report.terminal, SessionState::Done);
	assert!(report.sales.iter().all(|sale| sale.result.is_confirmed()));
}

#[tokio::test]
async fn held_profile_lock_aborts_without_launching() {
	let temp = TempDir::new().unwrap();
	let settings = settings(temp.path());
	std::fs::write(lock_path(&temp.path().join(ADDRESS)), std::process::id().to_string()).unwrap();
	let page = happy_page(&settings, "Max: 2");
	let launcher = FakeLauncher::new().with(ADDRESS, Behavior::Page(page.clone()));

	let report = WalletSession::new(wallet(), Arc::new(settings)).run(&launcher).await;

	assert_eq!(report.states, vec![SessionState::Idle, SessionState::Aborted]);
	assert!(report.abort_reason.unwrap().contains("locked"));
	assert!(launcher.launches().is_empty());
}

#[cfg(unix)]
#[tokio::test]
async fn stale_profile_lock_from_dead_process_is_reclaimed() {
	let temp = TempDir::new().unwrap();
	let settings = settings(temp.path());
	existing_profile(&settings);
	let lock = lock_path(&temp.path().join(ADDRESS));
	std::fs::write(&lock, format!("{}\n", i32::MAX)).unwrap();
	let page = happy_page(&settings, "Max: 2");

	let report = run(settings, &page).await;

	assert_eq!(report.terminal, SessionState::Done);
	assert!(report.abort_reason.is_none());
	assert!(!lock.exists());
}

#[tokio::test]
async fn unlock_failure_on_existing_profile_aborts() {
	let temp = TempDir::new().unwrap();
	let mut settings = settings(temp.path());
	settings.max_retries.unlock = 2;
	existing_profile(&settings);
	let page = happy_page(&settings, "Max: 2");
	let unlock = settings.selectors.wallet.unlock_button.clone();
	page.break_on(&unlock);
	let popup = settings.extension.popup_url();

	let report = run(settings, &page).await;

	assert_eq!(
		report.states,
		vec![SessionState::Idle, SessionState::ProfileCheck, SessionState::Unlocking, SessionState::Aborted]
	);
	assert!(report.abort_reason.unwrap().starts_with("failed to unlock wallet"));
	assert_eq!(page.navigations_to(&popup), 2);
	assert!(report.sales.is_empty());
	assert_eq!(page.reloads(), 0);
	assert_eq!(page.closes(), 1);
}

#[tokio::test]
async fn connect_exhausts_its_budget_then_aborts() {
	let temp = TempDir::new().unwrap();
	let mut settings = settings(temp.path());
	settings.max_retries.connect = 4;
	let page = happy_page(&settings, "Max: 2");
	page.break_on(&settings.selectors.trade.wallet_option);
	let connect_button = settings.selectors.trade.connect_wallet_button.clone();

	let report = run(settings, &page).await;

	assert_eq!(report.terminal, SessionState::Aborted);
	assert!(report.states.contains(&SessionState::Connecting));
	assert!(!report.states.contains(&SessionState::Configuring));
	assert!(report.abort_reason.unwrap().starts_with("wallet connection failed"));
	assert_eq!(page.clicks_on(&connect_button), 4);
	assert_eq!(page.reloads(), 3);
	assert!(report.sales.is_empty());
}

#[tokio::test]
async fn approval_unlocks_wallet_before_approving() {
	let temp = TempDir::new().unwrap();
	let settings = settings(temp.path());
	existing_profile(&settings);
	let page = happy_page(&settings, "Max: 2");
	let wallet = settings.selectors.wallet.clone();
	let submit = settings.selectors.trade.submit_button.clone();

	let report = run(settings, &page).await;

	assert_eq!(report.terminal, SessionState::Done);
	let after_submit = page.actions_after_click(&submit);
	assert_eq!(
		after_submit[..3],
		[
			Action::Fill(wallet.password_input.to_string(), "correct horse".into()),
			Action::Click(wallet.unlock_button.to_string()),
			Action::Click(wallet.approve_button.to_string()),
		]
	);
	assert_eq!(page.clicks_on(&wallet.approve_button), 2);
}

#[tokio::test]
async fn approval_on_unlocked_wallet_clicks_approve_only() {
	let temp = TempDir::new().unwrap();
	let settings = settings(temp.path());
	existing_profile(&settings);
	let page = happy_page(&settings, "Max: 2");
	let wallet = settings.selectors.wallet.clone();
	page.hide(&wallet.unlock_button);
	let submit = settings.selectors.trade.submit_button.clone();

	let report = run(settings, &page).await;

	assert_eq!(report.terminal, SessionState::Done);
	assert_eq!(
		page.actions_after_click(&submit).first(),
		Some(&Action::Click(wallet.approve_button.to_string()))
	);
	let password = wallet.password_input.to_string();
	assert!(!page.actions().iter().any(|a| matches!(a, Action::Fill(k, _) if *k == password)));
	assert_eq!(page.clicks_on(&submit), 2);
}
