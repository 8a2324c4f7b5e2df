mod config;
mod profiles;
mod run;

use std::path::Path;

use serde::Serialize;
use swapper::Wallet;
use swapper::wallet::load_wallets;

use crate::cli::{Cli, Commands};
use crate::error::{CliError, Result};
use crate::output::{OutputFormat, ResultBuilder, print_result};

pub async fn dispatch(cli: Cli) -> Result<()> {
	let format = cli.format;
	let config = cli.config.as_deref();
	match cli.command {
		Commands::Run(args) => run::execute(config, args, format).await,
		Commands::Config { overrides } => config::execute(config, &overrides, format),
		Commands::Profiles { wallets, profiles_dir } => {
			profiles::execute(config, &wallets.path, profiles_dir.as_deref(), format)
		}
	}
}

fn read_wallets(path: &Path) -> Result<Vec<Wallet>> {
	if !path.exists() {
		return Err(CliError::WalletsNotFound {
			path: path.to_path_buf(),
		});
	}
	Ok(load_wallets(path)?)
}

/// Prints `render(&data)` for text output, the JSON envelope otherwise.
fn emit<T: Serialize>(command: &str, data: T, render: impl FnOnce(&T) -> String, format: OutputFormat) {
	match format {
		OutputFormat::Text => println!("{}", render(&data)),
		OutputFormat::Json => print_result(&ResultBuilder::new(command).data(data).build(), format),
	}
}
