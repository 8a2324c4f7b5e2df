use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
	/// Browser-side failure reported by the driver backend.
	#[error("driver error: {0}")]
	Driver(String),

	#[error("timeout after {ms}ms waiting for: {condition}")]
	Timeout { ms: u64, condition: String },

	#[error("element not found: {locator}")]
	ElementNotFound { locator: String },

	#[error("browser launch failed: {0}")]
	Launch(String),

	#[error("invalid configuration: {0}")]
	Config(String),

	/// Another session already holds the profile directory.
	#[error("profile is locked by another session: {}", path.display())]
	ProfileLocked { path: PathBuf },

	#[error(transparent)]
	Io(#[from] std::io::Error),

	#[error(transparent)]
	Json(#[from] serde_json::Error),
}
