use std::path::PathBuf;

use thiserror::Error;

use crate::output::{CommandError, ErrorCode};

pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
	/// The command already printed its result; only the exit status is left.
	#[error("")]
	OutputAlreadyPrinted,

	#[error("config file {} not found", path.display())]
	ConfigNotFound { path: PathBuf },

	#[error("wallet list {} not found", path.display())]
	WalletsNotFound { path: PathBuf },

	/// Strict run where some sessions did not reach `done`.
	#[error("{aborted} of {wallets} wallet session(s) aborted")]
	SessionsIncomplete { aborted: usize, wallets: usize },

	#[error(transparent)]
	Core(#[from] swapper::Error),

	#[error(transparent)]
	Io(#[from] std::io::Error),

	#[error(transparent)]
	Json(#[from] serde_json::Error),

	#[error(transparent)]
	Anyhow(#[from] anyhow::Error),
}

impl CliError {
	pub fn is_output_already_printed(&self) -> bool {
		matches!(self, CliError::OutputAlreadyPrinted)
	}

	pub fn to_command_error(&self) -> CommandError {
		let code = match self {
			CliError::OutputAlreadyPrinted => ErrorCode::InternalError,
			CliError::ConfigNotFound { .. } | CliError::WalletsNotFound { .. } => ErrorCode::ConfigInvalid,
			CliError::SessionsIncomplete { .. } => ErrorCode::SessionsIncomplete,
			CliError::Core(err) => core_code(err),
			CliError::Io(_) => ErrorCode::IoError,
			CliError::Json(_) | CliError::Anyhow(_) => ErrorCode::InternalError,
		};
		CommandError {
			code,
			message: self.to_string(),
		}
	}
}

fn core_code(err: &swapper::Error) -> ErrorCode {
	use swapper::Error;
	match err {
		Error::Driver(_) => ErrorCode::DriverError,
		Error::Timeout { .. } => ErrorCode::Timeout,
		Error::ElementNotFound { .. } => ErrorCode::SelectorNotFound,
		Error::Launch(_) => ErrorCode::BrowserLaunchFailed,
		Error::Config(_) => ErrorCode::ConfigInvalid,
		Error::ProfileLocked { .. } => ErrorCode::ProfileLocked,
		Error::Io(_) => ErrorCode::IoError,
		Error::Json(_) => ErrorCode::InternalError,
	}
}
