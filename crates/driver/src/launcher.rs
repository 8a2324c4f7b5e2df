//! Spawning one Chromium process per wallet profile.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::Deserialize;
use swapper::{BrowserSession, Error, LaunchSpec, Result, SessionLauncher};
use tokio::process::{Child, Command};
use tracing::{debug, info};

use crate::cdp::CdpConnection;
use crate::detect::resolve_executable;
use crate::session::ChromiumSession;

/// File Chromium writes into the profile once remote debugging is listening.
const ACTIVE_PORT_FILE: &str = "DevToolsActivePort";
const STARTUP_POLL: Duration = Duration::from_millis(200);
const STARTUP_TIMEOUT: Duration = Duration::from_secs(20);

/// `/json/version` response subset.
#[derive(Debug, Deserialize)]
struct VersionInfo {
	#[serde(rename = "webSocketDebuggerUrl")]
	web_socket_debugger_url: String,
	#[serde(rename = "Browser")]
	browser: Option<String>,
}

pub struct ChromiumLauncher {
	executable: PathBuf,
	extension_dir: Option<PathBuf>,
}

impl ChromiumLauncher {
	pub fn new(executable: PathBuf) -> Self {
		Self {
			executable,
			extension_dir: None,
		}
	}

	/// Resolves the executable from `explicit` or the usual install locations.
	pub fn detect(explicit: Option<&Path>) -> Result<Self> {
		resolve_executable(explicit).map(Self::new)
	}

	/// Unpacked extension loaded into every launched profile.
	pub fn with_extension(mut self, dir: PathBuf) -> Self {
		self.extension_dir = Some(dir);
		self
	}

	pub fn executable(&self) -> &Path {
		&self.executable
	}

	fn args(&self, spec: &LaunchSpec) -> Vec<String> {
		let mut args = vec![
			"--remote-debugging-port=0".to_string(),
			format!("--user-data-dir={}", spec.profile_dir.display()),
			"--no-first-run".to_string(),
			"--no-default-browser-check".to_string(),
			format!("--lang={}", spec.locale),
		];
		if spec.headless {
			args.push("--headless=new".into());
		}
		if let Some(proxy) = &spec.proxy {
			args.push(format!("--proxy-server={}", proxy.server));
		}
		if let Some(dir) = &self.extension_dir {
			args.push(format!("--disable-extensions-except={}", dir.display()));
			args.push(format!("--load-extension={}", dir.display()));
		}
		args.extend(spec.extra_args.iter().cloned());
		args.push("about:blank".into());
		args
	}

	async fn wait_for_endpoint(&self, child: &mut Child, profile_dir: &Path) -> Result<VersionInfo> {
		let client = reqwest::Client::builder()
			.timeout(Duration::from_millis(400))
			.build()
			.map_err(|e| Error::Launch(format!("failed to create HTTP client: {e}")))?;
		let deadline = Instant::now() + STARTUP_TIMEOUT;
		let mut last_error = "endpoint not reachable".to_string();

		while Instant::now() < deadline {
			tokio::time::sleep(STARTUP_POLL).await;

			if let Some(status) = child.try_wait()? {
				return Err(Error::Launch(format!(
					"browser exited before its debugging endpoint became available (status: {status})"
				)));
			}

			let Some(port) = read_active_port(profile_dir).await else {
				continue;
			};
			match fetch_version(&client, port).await {
				Ok(info) => return Ok(info),
				Err(err) => last_error = err,
			}
		}

		Err(Error::Launch(format!(
			"debugging endpoint not available after {}ms: {last_error}",
			STARTUP_TIMEOUT.as_millis()
		)))
	}
}

#[async_trait]
impl SessionLauncher for ChromiumLauncher {
	async fn launch(&self, spec: &LaunchSpec) -> Result<Box<dyn BrowserSession>> {
		tokio::fs::create_dir_all(&spec.profile_dir).await?;
		// A crashed run leaves the previous port behind.
		let _ = tokio::fs::remove_file(spec.profile_dir.join(ACTIVE_PORT_FILE)).await;

		let args = self.args(spec);
		debug!(target: "swapper.driver", executable = %self.executable.display(), ?args, "launching browser");

		let mut child = Command::new(&self.executable)
			.args(&args)
			.stdin(Stdio::null())
			.stdout(Stdio::null())
			.stderr(Stdio::null())
			.kill_on_drop(true)
			.spawn()
			.map_err(|e| Error::Launch(format!("failed to start {}: {e}", self.executable.display())))?;

		let info = self.wait_for_endpoint(&mut child, &spec.profile_dir).await?;
		let conn = CdpConnection::connect(&info.web_socket_debugger_url).await?;
		info!(
			target: "swapper.driver",
			browser = info.browser.as_deref().unwrap_or("unknown"),
			profile = %spec.profile_dir.display(),
			"browser ready"
		);

		let session = ChromiumSession::new(Arc::new(conn), child, spec.slow_mo, spec.proxy.clone());
		Ok(Box::new(session))
	}
}

async fn read_active_port(profile_dir: &Path) -> Option<u16> {
	let raw = tokio::fs::read_to_string(profile_dir.join(ACTIVE_PORT_FILE)).await.ok()?;
	parse_active_port(&raw)
}

/// First line of `DevToolsActivePort` is the port; the second is the browser path.
fn parse_active_port(raw: &str) -> Option<u16> {
	raw.lines().next()?.trim().parse().ok().filter(|port| *port != 0)
}

async fn fetch_version(client: &reqwest::Client, port: u16) -> std::result::Result<VersionInfo, String> {
	let url = format!("http://127.0.0.1:{port}/json/version");
	let response = client.get(&url).send().await.map_err(|e| e.to_string())?;
	if !response.status().is_success() {
		return Err(format!("unexpected status {}", response.status()));
	}
	response.json().await.map_err(|e| format!("failed to parse {url}: {e}"))
}
