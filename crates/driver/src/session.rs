//! [`BrowserSession`] backed by a launched Chromium process.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use secrecy::ExposeSecret;
use serde::Deserialize;
use serde_json::json;
use swapper::proxy::ProxyConfig;
use swapper::{BrowserSession, Error, Result, SurfaceTarget, UiDriver};
use tokio::process::Child;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::cdp::CdpConnection;
use crate::page::CdpPage;

const CLOSE_GRACE: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TargetInfo {
	target_id: String,
	#[serde(rename = "type")]
	kind: String,
	title: String,
	url: String,
}

impl TargetInfo {
	fn is_blank(&self) -> bool {
		matches!(self.url.as_str(), "about:blank" | "chrome://newtab/" | "chrome://new-tab-page/")
	}
}

pub struct ChromiumSession {
	conn: Arc<CdpConnection>,
	child: Option<Child>,
	slow_mo: Duration,
	proxy: Option<ProxyConfig>,
	/// Attached pages by target id.
	pages: Mutex<HashMap<String, Arc<CdpPage>>>,
	auth_tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl ChromiumSession {
	pub fn new(conn: Arc<CdpConnection>, child: Child, slow_mo: Duration, proxy: Option<ProxyConfig>) -> Self {
		Self {
			conn,
			child: Some(child),
			slow_mo,
			proxy: proxy.filter(ProxyConfig::has_credentials),
			pages: Mutex::default(),
			auth_tasks: Mutex::default(),
		}
	}

	async fn page_targets(&self) -> Result<Vec<TargetInfo>> {
		let response = self.conn.call("Target.getTargets", json!({}), None).await?;
		let targets: Vec<TargetInfo> = serde_json::from_value(response["targetInfos"].clone())?;
		Ok(targets.into_iter().filter(|t| t.kind == "page").collect())
	}

	fn cached(&self, target_id: &str) -> Option<Arc<CdpPage>> {
		self.pages.lock().get(target_id).cloned()
	}

	async fn attach(&self, target_id: &str) -> Result<Arc<CdpPage>> {
		if let Some(page) = self.cached(target_id) {
			return Ok(page);
		}

		let response = self
			.conn
			.call("Target.attachToTarget", json!({ "targetId": target_id, "flatten": true }), None)
			.await?;
		let session_id = response["sessionId"]
			.as_str()
			.ok_or_else(|| Error::Driver(format!("attach to {target_id} returned no session")))?
			.to_string();
		self.conn.call("Page.enable", json!({}), Some(&session_id)).await?;
		if let Some(proxy) = &self.proxy {
			self.enable_proxy_auth(&session_id, proxy).await?;
		}
		debug!(target: "swapper.driver", target_id, session_id = %session_id, "attached to page");

		let page = Arc::new(CdpPage::new(
			Arc::clone(&self.conn),
			session_id,
			target_id.to_string(),
			self.slow_mo,
		));
		self.pages.lock().insert(target_id.to_string(), Arc::clone(&page));
		Ok(page)
	}

	/// Answers proxy authentication challenges for one page session.
	///
	/// `Fetch.enable` pauses every request of the page, so each paused request
	/// is resumed on its own task and none waits behind another's reply.
	async fn enable_proxy_auth(&self, session_id: &str, proxy: &ProxyConfig) -> Result<()> {
		let mut events = self.conn.listen(session_id);
		self.conn
			.call("Fetch.enable", json!({ "handleAuthRequests": true }), Some(session_id))
			.await?;

		let conn = Arc::clone(&self.conn);
		let session = session_id.to_string();
		let credentials = json!({
			"response": "ProvideCredentials",
			"username": proxy.username.clone().unwrap_or_default(),
			"password": proxy.password.as_ref().map(|p| p.expose_secret().to_string()).unwrap_or_default(),
		});

		let task = tokio::spawn(async move {
			while let Some(event) = events.recv().await {
				let request_id = event.params["requestId"].clone();
				let (method, params) = match event.method.as_str() {
					"Fetch.requestPaused" => ("Fetch.continueRequest", json!({ "requestId": request_id })),
					"Fetch.authRequired" => (
						"Fetch.continueWithAuth",
						json!({ "requestId": request_id, "authChallengeResponse": credentials.clone() }),
					),
					_ => continue,
				};
				let conn = Arc::clone(&conn);
				let session = session.clone();
				tokio::spawn(async move {
					if let Err(err) = conn.call(method, params, Some(&session)).await {
						debug!(target: "swapper.driver", method, error = %err, "proxy auth reply failed");
					}
				});
			}
		});
		self.auth_tasks.lock().push(task);
		Ok(())
	}

	async fn open_page(&self, url: &str) -> Result<Arc<CdpPage>> {
		let response = self.conn.call("Target.createTarget", json!({ "url": "about:blank" }), None).await?;
		let target_id = response["targetId"]
			.as_str()
			.ok_or_else(|| Error::Driver("createTarget returned no target id".into()))?
			.to_string();
		let page = self.attach(&target_id).await?;
		page.navigate(url).await?;
		Ok(page)
	}
}

#[async_trait]
impl BrowserSession for ChromiumSession {
	async fn surface(&self, target: &SurfaceTarget) -> Result<Arc<dyn UiDriver>> {
		let targets = self.page_targets().await?;

		let found = targets
			.iter()
			.find(|t| t.title.contains(&target.title_contains) && !target.skip.contains(&t.target_id));
		if let Some(found) = found {
			return Ok(self.attach(&found.target_id).await?);
		}

		let Some(url) = &target.url else {
			return Err(Error::Driver(format!("no page titled '{}'", target.title_contains)));
		};

		if let Some(blank) = targets.iter().find(|t| t.is_blank()) {
			let page = self.attach(&blank.target_id).await?;
			page.navigate(url).await?;
			return Ok(page);
		}
		Ok(self.open_page(url).await?)
	}

	async fn surface_ids(&self) -> Result<Vec<String>> {
		Ok(self.page_targets().await?.into_iter().map(|t| t.target_id).collect())
	}

	async fn close(&mut self) -> Result<()> {
		for task in self.auth_tasks.lock().drain(..) {
			task.abort();
		}
		self.pages.lock().clear();

		if let Err(err) = self.conn.call("Browser.close", json!({}), None).await {
			debug!(target: "swapper.driver", error = %err, "Browser.close failed, killing process");
		}

		let Some(mut child) = self.child.take() else {
			return Ok(());
		};
		let waited = tokio::time::timeout(CLOSE_GRACE, child.wait()).await;
		match waited {
			Ok(status) => {
				let status = status?;
				debug!(target: "swapper.driver", %status, "browser exited");
			}
			Err(_) => {
				warn!(target: "swapper.driver", "browser did not exit in time, killing");
				child.kill().await?;
			}
		}
		Ok(())
	}
}

impl Drop for ChromiumSession {
	fn drop(&mut self) {
		for task in self.auth_tasks.get_mut().drain(..) {
			task.abort();
		}
		// `kill_on_drop` reaps the process if close() never ran.
	}
}
