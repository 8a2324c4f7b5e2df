use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use swapper::{Orchestrator, RunReport};
use swapper_driver::ChromiumLauncher;
use tracing::info;

use crate::cli::RunArgs;
use crate::error::{CliError, Result};
use crate::output::{ErrorCode, OutputFormat, ResultBuilder, print_result, render_run_report};
use crate::settings;

pub async fn execute(config: Option<&Path>, args: RunArgs, format: OutputFormat) -> Result<()> {
	let settings = settings::resolve(config, &args.overrides)?;
	let wallets = super::read_wallets(&args.wallets.path)?;
	let extension = settings.extension.unpacked_dir()?.to_path_buf();

	let launcher = ChromiumLauncher::detect(settings.chrome_executable.as_deref())?.with_extension(extension);
	info!(
		target: "swapper",
		wallets = wallets.len(),
		browser = %launcher.executable().display(),
		"starting run"
	);

	let orchestrator = Orchestrator::new(Arc::new(settings), Arc::new(launcher));
	let report = orchestrator.run(wallets).await;

	if let Some(path) = &args.report {
		write_report(path, &report)?;
		info!(target: "swapper", path = %path.display(), "report written");
	}

	let incomplete = args.strict && !report.all_done();
	let failure = incomplete.then(|| CliError::SessionsIncomplete {
		aborted: report.totals.aborted,
		wallets: report.totals.wallets,
	});

	match format {
		OutputFormat::Text => {
			println!("{}", render_run_report(&report));
			if let Some(err) = &failure {
				eprintln!("{err}");
			}
		}
		OutputFormat::Json => {
			let mut builder = ResultBuilder::new("run").data(&report);
			if let Some(err) = &failure {
				builder = builder.error(ErrorCode::SessionsIncomplete, err.to_string());
			}
			print_result(&builder.build(), format);
		}
	}

	match failure {
		Some(_) => Err(CliError::OutputAlreadyPrinted),
		None => Ok(()),
	}
}

fn write_report(path: &Path, report: &RunReport) -> Result<()> {
	if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
		std::fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
	}
	let json = serde_json::to_string_pretty(report)?;
	std::fs::write(path, json).with_context(|| format!("writing report to {}", path.display()))?;
	Ok(())
}
