use std::path::Path;

use serde_json::json;

use crate::cli::Overrides;
use crate::error::Result;
use crate::output::OutputFormat;
use crate::settings::{self, PASSWORD_ENV};

/// Prints the effective settings and whether they would pass validation.
pub fn execute(config: Option<&Path>, overrides: &Overrides, format: OutputFormat) -> Result<()> {
	let mut effective = settings::load(config)?;
	settings::apply_overrides(&mut effective, overrides);
	settings::apply_env_password(&mut effective, std::env::var(PASSWORD_ENV).ok());

	let problem = effective.validate().err().map(|e| e.to_string());
	let data = json!({
		"config": settings::redacted_view(&effective),
		"valid": problem.is_none(),
		"problem": problem,
	});

	super::emit(
		"config",
		data,
		|data| {
			let mut text = serde_json::to_string_pretty(&data["config"]).unwrap_or_default();
			if let Some(problem) = data["problem"].as_str() {
				text.push_str(&format!("\n\nnot runnable: {problem}"));
			}
			text
		},
		format,
	);
	Ok(())
}
