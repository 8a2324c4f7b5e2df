//! Browser capability consumed by the session machinery.
//!
//! The traits here are the only surface the retry and session layers touch.
//! Concrete backends (Chromium over CDP in `swapper-driver`, scripted fakes in
//! tests) implement them; nothing in this crate depends on a browser.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::proxy::ProxyConfig;

/// Declarative element descriptor.
///
/// A locator is resolved again on every operation, so a stale page never
/// leaves a dangling handle behind. `nth` picks among multiple matches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Locator {
	Css {
		selector: String,
		#[serde(default)]
		nth: usize,
	},
	#[serde(rename = "xpath")]
	XPath {
		expr: String,
		#[serde(default)]
		nth: usize,
	},
	/// Element whose own text equals (exact) or contains `text`.
	Text {
		text: String,
		#[serde(default)]
		exact: bool,
		#[serde(default)]
		nth: usize,
	},
	/// Element with an ARIA role (or the matching native tag) and accessible name.
	Role {
		role: String,
		name: String,
		#[serde(default)]
		nth: usize,
	},
}

impl Locator {
	pub fn css(selector: impl Into<String>) -> Self {
		Locator::Css {
			selector: selector.into(),
			nth: 0,
		}
	}

	pub fn xpath(expr: impl Into<String>) -> Self {
		Locator::XPath { expr: expr.into(), nth: 0 }
	}

	pub fn text(text: impl Into<String>) -> Self {
		Locator::Text {
			text: text.into(),
			exact: false,
			nth: 0,
		}
	}

	pub fn exact_text(text: impl Into<String>) -> Self {
		Locator::Text {
			text: text.into(),
			exact: true,
			nth: 0,
		}
	}

	pub fn role(role: impl Into<String>, name: impl Into<String>) -> Self {
		Locator::Role {
			role: role.into(),
			name: name.into(),
			nth: 0,
		}
	}

	/// Returns the same locator narrowed to the `n`-th match (zero based).
	pub fn nth(mut self, n: usize) -> Self {
		match &mut self {
			Locator::Css { nth, .. } | Locator::XPath { nth, .. } | Locator::Text { nth, .. } | Locator::Role { nth, .. } => *nth = n,
		}
		self
	}

	pub fn index(&self) -> usize {
		match self {
			Locator::Css { nth, .. } | Locator::XPath { nth, .. } | Locator::Text { nth, .. } | Locator::Role { nth, .. } => *nth,
		}
	}
}

impl fmt::Display for Locator {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Locator::Css { selector, .. } => write!(f, "css={selector}")?,
			Locator::XPath { expr, .. } => write!(f, "xpath={expr}")?,
			Locator::Text { text, exact: true, .. } => write!(f, "text=\"{text}\"")?,
			Locator::Text { text, .. } => write!(f, "text={text}")?,
			Locator::Role { role, name, .. } => write!(f, "role={role}[name=\"{name}\"]")?,
		}
		match self.index() {
			0 => Ok(()),
			n => write!(f, " >> nth={n}"),
		}
	}
}

/// Page-level operations on one browser surface (tab or extension page).
#[async_trait]
pub trait UiDriver: Send + Sync {
	async fn navigate(&self, url: &str) -> Result<()>;

	/// Polls until the element is visible or `timeout` runs out.
	///
	/// A zero timeout performs a single check.
	async fn is_visible(&self, locator: &Locator, timeout: Duration) -> Result<bool>;

	async fn wait_visible(&self, locator: &Locator, timeout: Duration) -> Result<()> {
		if self.is_visible(locator, timeout).await? {
			Ok(())
		} else {
			Err(Error::Timeout {
				ms: timeout.as_millis() as u64,
				condition: format!("{locator} to be visible"),
			})
		}
	}

	async fn click(&self, locator: &Locator) -> Result<()>;

	/// Types `text` key by key into the element, appending to any value.
	async fn type_text(&self, locator: &Locator, text: &str) -> Result<()>;

	/// Replaces the element's value with `text`.
	async fn fill(&self, locator: &Locator, text: &str) -> Result<()>;

	/// Ensures a checkbox-like element is checked.
	async fn check(&self, locator: &Locator) -> Result<()>;

	async fn read_text(&self, locator: &Locator) -> Result<String>;

	async fn reload(&self) -> Result<()>;

	async fn bring_to_front(&self) -> Result<()>;
}

/// Identifies a surface by title fragment, with a URL to open when absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SurfaceTarget {
	pub title_contains: String,
	pub url: Option<String>,
	/// Surface ids passed over while matching.
	pub skip: Vec<String>,
}

impl SurfaceTarget {
	pub fn new(title_contains: impl Into<String>, url: impl Into<String>) -> Self {
		Self {
			title_contains: title_contains.into(),
			url: Some(url.into()),
			skip: Vec::new(),
		}
	}

	/// Matches only surfaces the page opened itself that are not in `known`.
	pub fn opened_since(title_contains: impl Into<String>, known: Vec<String>) -> Self {
		Self {
			title_contains: title_contains.into(),
			url: None,
			skip: known,
		}
	}
}

/// One isolated browser instance bound to a single profile directory.
#[async_trait]
pub trait BrowserSession: Send + Sync {
	/// Returns the first open surface whose title contains the target fragment.
	///
	/// When none matches and the target carries a URL, a blank page is reused
	/// or a new one is opened at that URL.
	async fn surface(&self, target: &SurfaceTarget) -> Result<Arc<dyn UiDriver>>;

	/// Ids of every surface currently open.
	async fn surface_ids(&self) -> Result<Vec<String>>;

	/// Releases the browser and its OS process.
	async fn close(&mut self) -> Result<()>;
}

/// Everything needed to start an isolated browser for one wallet.
#[derive(Debug, Clone)]
pub struct LaunchSpec {
	pub profile_dir: PathBuf,
	pub proxy: Option<ProxyConfig>,
	pub headless: bool,
	pub locale: String,
	/// Delay applied after each driver action.
	pub slow_mo: Duration,
	pub extra_args: Vec<String>,
}

#[async_trait]
pub trait SessionLauncher: Send + Sync {
	async fn launch(&self, spec: &LaunchSpec) -> Result<Box<dyn BrowserSession>>;
}
