//! [`UiDriver`] over one attached page target.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde_json::{Value, json};
use swapper::{Error, Locator, Result, UiDriver};
use tracing::debug;

use crate::cdp::CdpConnection;
use crate::query::Query;

const POLL_INTERVAL: Duration = Duration::from_millis(100);
const LOAD_TIMEOUT: Duration = Duration::from_secs(30);

const VISIBLE_JS: &str = "(el => { if (!el) return false; const r = el.getBoundingClientRect(); \
	const s = getComputedStyle(el); return r.width > 0 && r.height > 0 && s.visibility !== 'hidden' && s.display !== 'none'; })";
const CENTER_JS: &str = "(el => { if (!el) return null; el.scrollIntoView({block: 'center', inline: 'center'}); \
	const r = el.getBoundingClientRect(); return {x: r.left + r.width / 2, y: r.top + r.height / 2}; })";
const FOCUS_JS: &str = "(el => { if (!el) return false; el.focus(); return true; })";
const SELECT_ALL_JS: &str = "(el => { if (!el) return false; el.focus(); \
	if (typeof el.select === 'function') { el.select(); } else { document.execCommand('selectAll'); } return true; })";
const TEXT_JS: &str = "(el => el ? (el.innerText ?? el.textContent ?? '') : null)";
const CHECKED_JS: &str = "(el => el ? !!el.checked : null)";

pub struct CdpPage {
	conn: Arc<CdpConnection>,
	session_id: String,
	target_id: String,
	slow_mo: Duration,
}

impl CdpPage {
	pub fn new(conn: Arc<CdpConnection>, session_id: String, target_id: String, slow_mo: Duration) -> Self {
		Self {
			conn,
			session_id,
			target_id,
			slow_mo,
		}
	}

	async fn call(&self, method: &str, params: Value) -> Result<Value> {
		self.conn.call(method, params, Some(&self.session_id)).await
	}

	async fn evaluate(&self, expression: &str) -> Result<Value> {
		let response = self
			.call(
				"Runtime.evaluate",
				json!({ "expression": expression, "returnByValue": true, "awaitPromise": true }),
			)
			.await?;
		if let Some(details) = response.get("exceptionDetails") {
			let text = details
				.pointer("/exception/description")
				.or_else(|| details.get("text"))
				.and_then(Value::as_str)
				.unwrap_or("script exception");
			return Err(Error::Driver(text.to_string()));
		}
		Ok(response.pointer("/result/value").cloned().unwrap_or(Value::Null))
	}

	/// Applies `func` (a one-argument JS arrow function) to the resolved element.
	async fn on_element(&self, locator: &Locator, func: &str) -> Result<Value> {
		let element = Query::from_locator(locator).element_js();
		self.evaluate(&format!("{func}({element})")).await
	}

	async fn visible_now(&self, locator: &Locator) -> Result<bool> {
		Ok(self.on_element(locator, VISIBLE_JS).await?.as_bool().unwrap_or(false))
	}

	async fn wait_for_load(&self) -> Result<()> {
		let deadline = Instant::now() + LOAD_TIMEOUT;
		loop {
			// The context may be swapped out mid-navigation; treat that as "not yet".
			let state = self.evaluate("document.readyState").await.unwrap_or(Value::Null);
			if state == "complete" {
				return Ok(());
			}
			if Instant::now() >= deadline {
				return Err(Error::Timeout {
					ms: LOAD_TIMEOUT.as_millis() as u64,
					condition: "page load".into(),
				});
			}
			tokio::time::sleep(POLL_INTERVAL).await;
		}
	}

	async fn mouse_click(&self, x: f64, y: f64) -> Result<()> {
		for kind in ["mouseMoved", "mousePressed", "mouseReleased"] {
			self.call(
				"Input.dispatchMouseEvent",
				json!({ "type": kind, "x": x, "y": y, "button": "left", "clickCount": 1 }),
			)
			.await?;
		}
		Ok(())
	}

	async fn pace(&self) {
		if !self.slow_mo.is_zero() {
			tokio::time::sleep(self.slow_mo).await;
		}
	}

	fn not_found(locator: &Locator) -> Error {
		Error::ElementNotFound {
			locator: locator.to_string(),
		}
	}
}

#[async_trait]
impl UiDriver for CdpPage {
	async fn navigate(&self, url: &str) -> Result<()> {
		debug!(target: "swapper.driver", url, "navigate");
		let response = self.call("Page.navigate", json!({ "url": url })).await?;
		if let Some(reason) = response.get("errorText").and_then(Value::as_str) {
			return Err(Error::Driver(format!("navigation to {url} failed: {reason}")));
		}
		self.wait_for_load().await?;
		self.pace().await;
		Ok(())
	}

	async fn is_visible(&self, locator: &Locator, timeout: Duration) -> Result<bool> {
		let deadline = Instant::now() + timeout;
		loop {
			if self.visible_now(locator).await? {
				return Ok(true);
			}
			if Instant::now() >= deadline {
				return Ok(false);
			}
			tokio::time::sleep(POLL_INTERVAL).await;
		}
	}

	async fn click(&self, locator: &Locator) -> Result<()> {
		let point = self.on_element(locator, CENTER_JS).await?;
		let (Some(x), Some(y)) = (point["x"].as_f64(), point["y"].as_f64()) else {
			return Err(Self::not_found(locator));
		};
		debug!(target: "swapper.driver", %locator, x, y, "click");
		self.mouse_click(x, y).await?;
		self.pace().await;
		Ok(())
	}

	async fn type_text(&self, locator: &Locator, text: &str) -> Result<()> {
		if self.on_element(locator, FOCUS_JS).await? != Value::Bool(true) {
			return Err(Self::not_found(locator));
		}
		self.call("Input.insertText", json!({ "text": text })).await?;
		self.pace().await;
		Ok(())
	}

	async fn fill(&self, locator: &Locator, text: &str) -> Result<()> {
		if self.on_element(locator, SELECT_ALL_JS).await? != Value::Bool(true) {
			return Err(Self::not_found(locator));
		}
		if text.is_empty() {
			self.evaluate("document.execCommand('delete')").await?;
		} else {
			self.call("Input.insertText", json!({ "text": text })).await?;
		}
		self.pace().await;
		Ok(())
	}

	async fn check(&self, locator: &Locator) -> Result<()> {
		match self.on_element(locator, CHECKED_JS).await? {
			Value::Bool(true) => Ok(()),
			Value::Bool(false) => self.click(locator).await,
			_ => Err(Self::not_found(locator)),
		}
	}

	async fn read_text(&self, locator: &Locator) -> Result<String> {
		match self.on_element(locator, TEXT_JS).await? {
			Value::String(text) => Ok(text),
			_ => Err(Self::not_found(locator)),
		}
	}

	async fn reload(&self) -> Result<()> {
		debug!(target: "swapper.driver", target_id = %self.target_id, "reload");
		self.call("Page.reload", json!({ "ignoreCache": false })).await?;
		// Give the old document a moment to unload before polling readyState.
		tokio::time::sleep(POLL_INTERVAL).await;
		self.wait_for_load().await
	}

	async fn bring_to_front(&self) -> Result<()> {
		self.call("Page.bringToFront", json!({})).await?;
		Ok(())
	}
}

