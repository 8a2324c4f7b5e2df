use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::writer::MakeWriterExt;

pub fn init_logging(verbosity: u8) {
	let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directives(verbosity)));

	let stderr = std::io::stderr.with_max_level(tracing::Level::TRACE);

	tracing_subscriber::fmt()
		.with_env_filter(env_filter)
		.with_writer(stderr)
		.with_target(true)
		.with_level(true)
		.compact()
		.init();
}

// 0 = session milestones only
// 1 (-v) = every state transition and retry
// 2+ (-vv) = devtools traffic as well
fn default_directives(verbosity: u8) -> &'static str {
	match verbosity {
		0 => "warn,swapper=info,swapper.driver=warn",
		1 => "info,swapper=debug,swapper.driver=info",
		_ => "debug",
	}
}
