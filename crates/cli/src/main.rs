use clap::Parser;
use swapper_cli::{
	cli::Cli,
	commands,
	error::CliError,
	logging,
	output::{self, OutputFormat, ResultBuilder},
};

#[tokio::main]
async fn main() {
	let cli = Cli::parse();
	logging::init_logging(cli.verbose);

	let format = cli.format;
	let command = cli.command.name();

	if let Err(err) = commands::dispatch(cli).await {
		if !err.is_output_already_printed() {
			handle_error(err, command, format);
		}
		std::process::exit(1);
	}
}

fn handle_error(err: CliError, command: &str, format: OutputFormat) {
	let cmd_error = err.to_command_error();

	output::print_error_stderr(&cmd_error);

	if format == OutputFormat::Json {
		let result: output::CommandResult<()> = ResultBuilder::new(command)
			.error(cmd_error.code, cmd_error.message)
			.build();
		output::print_result(&result, format);
	}
}
