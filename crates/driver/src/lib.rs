//! Chromium implementation of the `swapper` driver traits.
//!
//! Each wallet gets its own browser process on its own profile directory.
//! The process is driven over the DevTools protocol; nothing is shared between
//! sessions.

mod cdp;
mod detect;
mod launcher;
mod page;
mod query;
mod session;

pub use detect::{find_chrome_executable, resolve_executable};
pub use launcher::ChromiumLauncher;
pub use session::ChromiumSession;
