//! Per-wallet browser sessions that restore or unlock a wallet extension,
//! connect it to a trading site and sell two tokens in sequence.
//!
//! The browser itself sits behind the traits in [`driver`]; the `swapper-driver`
//! crate provides the Chromium implementation.

pub mod balance;
pub mod config;
pub mod driver;
pub mod error;
pub mod orchestrator;
pub mod profile;
pub mod proxy;
pub mod report;
pub mod retry;
pub mod sale;
pub mod selectors;
pub mod session;
pub mod step;
pub mod wallet;

pub use config::{FailedSwapPolicy, Settings};
pub use driver::{BrowserSession, LaunchSpec, Locator, SessionLauncher, SurfaceTarget, UiDriver};
pub use error::{Error, Result};
pub use orchestrator::Orchestrator;
pub use report::{RunReport, SessionReport};
pub use retry::{Recovery, RetryPolicy};
pub use sale::{SaleReport, SaleRequest, SaleResult};
pub use session::{SessionState, WalletSession};
pub use step::StepOutcome;
pub use wallet::Wallet;
