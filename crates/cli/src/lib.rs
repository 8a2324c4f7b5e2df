//! Command-line front end: loads settings and wallets, runs the orchestrator
//! against Chromium and prints the run report.

pub mod cli;
pub mod commands;
pub mod error;
pub mod logging;
pub mod output;
pub mod settings;
