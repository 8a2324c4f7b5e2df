//! Result envelope printed by every command.
//!
//! ```json
//! {
//!   "ok": true,
//!   "command": "run",
//!   "data": { ... },
//!   "timings": { "durationMs": 1234 }
//! }
//! ```
//!
//! Failures carry `error: { code, message }` instead of `data`.

use std::io::{self, Write};
use std::time::Instant;

use clap::ValueEnum;
use serde::Serialize;
use swapper::{RunReport, SaleResult, SessionReport};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
	/// Human-readable text
	#[default]
	Text,
	/// Pretty-printed JSON
	Json,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandResult<T: Serialize> {
	pub ok: bool,
	pub command: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub data: Option<T>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub error: Option<CommandError>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub timings: Option<Timings>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandError {
	pub code: ErrorCode,
	pub message: String,
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Timings {
	pub duration_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
	BrowserLaunchFailed,
	ConfigInvalid,
	ProfileLocked,
	Timeout,
	SelectorNotFound,
	DriverError,
	IoError,
	/// At least one session ended aborted under `--strict`.
	SessionsIncomplete,
	InternalError,
}

impl std::fmt::Display for ErrorCode {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let name = match self {
			ErrorCode::BrowserLaunchFailed => "BROWSER_LAUNCH_FAILED",
			ErrorCode::ConfigInvalid => "CONFIG_INVALID",
			ErrorCode::ProfileLocked => "PROFILE_LOCKED",
			ErrorCode::Timeout => "TIMEOUT",
			ErrorCode::SelectorNotFound => "SELECTOR_NOT_FOUND",
			ErrorCode::DriverError => "DRIVER_ERROR",
			ErrorCode::IoError => "IO_ERROR",
			ErrorCode::SessionsIncomplete => "SESSIONS_INCOMPLETE",
			ErrorCode::InternalError => "INTERNAL_ERROR",
		};
		f.write_str(name)
	}
}

/// Builds a [`CommandResult`], timing from construction to [`ResultBuilder::build`].
pub struct ResultBuilder<T: Serialize> {
	command: String,
	data: Option<T>,
	error: Option<CommandError>,
	started: Instant,
}

impl<T: Serialize> ResultBuilder<T> {
	pub fn new(command: impl Into<String>) -> Self {
		Self {
			command: command.into(),
			data: None,
			error: None,
			started: Instant::now(),
		}
	}

	pub fn data(mut self, data: T) -> Self {
		self.data = Some(data);
		self
	}

	pub fn error(mut self, code: ErrorCode, message: impl Into<String>) -> Self {
		self.error = Some(CommandError {
			code,
			message: message.into(),
		});
		self
	}

	pub fn build(self) -> CommandResult<T> {
		CommandResult {
			ok: self.error.is_none(),
			command: self.command,
			data: self.data,
			error: self.error,
			timings: Some(Timings {
				duration_ms: self.started.elapsed().as_millis() as u64,
			}),
		}
	}
}

pub fn print_result<T: Serialize>(result: &CommandResult<T>, format: OutputFormat) {
	match format {
		OutputFormat::Json => {
			if let Ok(json) = serde_json::to_string_pretty(result) {
				println!("{json}");
			}
		}
		OutputFormat::Text => print_result_text(result),
	}
}

fn print_result_text<T: Serialize>(result: &CommandResult<T>) {
	let mut stdout = io::stdout().lock();
	if let Some(error) = &result.error {
		let _ = writeln!(stdout, "{} failed [{}]: {}", result.command, error.code, error.message);
		return;
	}
	let Some(data) = &result.data else {
		return;
	};
	match serde_json::to_value(data) {
		Ok(serde_json::Value::String(text)) => {
			let _ = writeln!(stdout, "{text}");
		}
		Ok(value) => {
			if let Ok(pretty) = serde_json::to_string_pretty(&value) {
				let _ = writeln!(stdout, "{pretty}");
			}
		}
		Err(_) => {}
	}
}

pub fn print_error_stderr(error: &CommandError) {
	eprintln!("Error [{}]: {}", error.code, error.message);
}

/// One line per wallet followed by the run totals.
pub fn render_run_report(report: &RunReport) -> String {
	let mut out = String::new();
	for session in &report.sessions {
		out.push_str(&render_session(session));
		out.push('\n');
	}
	let totals = &report.totals;
	out.push_str(&format!(
		"{} wallets: {} done, {} aborted; {} sales confirmed, {} failed ({:.1}s)",
		totals.wallets,
		totals.done,
		totals.aborted,
		totals.sales_confirmed,
		totals.sales_failed,
		report.elapsed_ms as f64 / 1000.0
	));
	out
}

fn render_session(session: &SessionReport) -> String {
	let mut line = format!("{} {}", session.address, session.terminal);
	if let Some(reason) = &session.abort_reason {
		line.push_str(&format!(" ({reason})"));
	}
	for sale in &session.sales {
		let result = match &sale.result {
			SaleResult::Confirmed => match sale.amount {
				Some(amount) => format!("confirmed {amount}"),
				None => "confirmed".to_string(),
			},
			SaleResult::Failed => "failed".to_string(),
			SaleResult::Skipped(reason) => format!("skipped: {reason}"),
			SaleResult::Exhausted(reason) => format!("exhausted: {reason}"),
			SaleResult::NotAttempted => "not attempted".to_string(),
		};
		line.push_str(&format!("\n  {} {result} after {} attempt(s)", sale.token, sale.attempts));
	}
	line
}
