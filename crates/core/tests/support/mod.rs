//! Scripted in-memory browser for driving sessions without Chromium.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet, VecDeque};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use secrecy::SecretString;
use swapper::config::Timeouts;
use swapper::{BrowserSession, Error, LaunchSpec, Locator, Result, SessionLauncher, Settings, SurfaceTarget, UiDriver};

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
	Navigate(String),
	Click(String),
	Type(String, String),
	Fill(String, String),
	Check(String),
}

#[derive(Default)]
struct Script {
	hidden: HashSet<String>,
	/// Visible, but every action on it fails.
	broken: HashSet<String>,
	/// Queued texts per locator; the last one sticks.
	texts: HashMap<String, VecDeque<String>>,
	actions: Vec<Action>,
	reloads: u32,
	closes: u32,
}

/// Every surface of a fake browser shares one page model keyed by locator.
#[derive(Default)]
pub struct FakePage {
	script: Mutex<Script>,
}

impl FakePage {
	pub fn new() -> Arc<Self> {
		Arc::new(Self::default())
	}

	pub fn hide(&self, locator: &Locator) {
		self.script.lock().unwrap().hidden.insert(locator.to_string());
	}

	pub fn break_on(&self, locator: &Locator) {
		self.script.lock().unwrap().broken.insert(locator.to_string());
	}

	pub fn navigations_to(&self, url: &str) -> usize {
		self.actions()
			.iter()
			.filter(|a| matches!(a, Action::Navigate(u) if u == url))
			.count()
	}

	/// Actions recorded after the first click on `locator`.
	pub fn actions_after_click(&self, locator: &Locator) -> Vec<Action> {
		let click = Action::Click(locator.to_string());
		let actions = self.actions();
		match actions.iter().position(|a| *a == click) {
			Some(at) => actions[at + 1..].to_vec(),
			None => Vec::new(),
		}
	}

	pub fn set_texts(&self, locator: &Locator, texts: &[&str]) {
		let queue = texts.iter().map(|t| t.to_string()).collect();
		self.script.lock().unwrap().texts.insert(locator.to_string(), queue);
	}

	pub fn actions(&self) -> Vec<Action> {
		self.script.lock().unwrap().actions.clone()
	}

	pub fn clicks_on(&self, locator: &Locator) -> usize {
		let key = locator.to_string();
		self.actions()
			.iter()
			.filter(|a| matches!(a, Action::Click(k) if *k == key))
			.count()
	}

	pub fn typed_into(&self, locator: &Locator) -> Vec<String> {
		let key = locator.to_string();
		self.actions()
			.into_iter()
			.filter_map(|a| match a {
				Action::Type(k, text) if k == key => Some(text),
				_ => None,
			})
			.collect()
	}

	pub fn reloads(&self) -> u32 {
		self.script.lock().unwrap().reloads
	}

	pub fn closes(&self) -> u32 {
		self.script.lock().unwrap().closes
	}

	fn visible(&self, locator: &Locator) -> bool {
		!self.script.lock().unwrap().hidden.contains(&locator.to_string())
	}

	fn act(&self, locator: &Locator, action: Action) -> Result<()> {
		if !self.visible(locator) {
			return Err(Error::ElementNotFound {
				locator: locator.to_string(),
			});
		}
		let mut script = self.script.lock().unwrap();
		if script.broken.contains(&locator.to_string()) {
			return Err(Error::Driver(format!("{locator}: element is detached")));
		}
		script.actions.push(action);
		Ok(())
	}
}

#[async_trait]
impl UiDriver for FakePage {
	async fn navigate(&self, url: &str) -> Result<()> {
		self.script.lock().unwrap().actions.push(Action::Navigate(url.to_string()));
		Ok(())
	}

	async fn is_visible(&self, locator: &Locator, _timeout: Duration) -> Result<bool> {
		Ok(self.visible(locator))
	}

	async fn click(&self, locator: &Locator) -> Result<()> {
		self.act(locator, Action::Click(locator.to_string()))
	}

	async fn type_text(&self, locator: &Locator, text: &str) -> Result<()> {
		self.act(locator, Action::Type(locator.to_string(), text.to_string()))
	}

	async fn fill(&self, locator: &Locator, text: &str) -> Result<()> {
		self.act(locator, Action::Fill(locator.to_string(), text.to_string()))
	}

	async fn check(&self, locator: &Locator) -> Result<()> {
		self.act(locator, Action::Check(locator.to_string()))
	}

	async fn read_text(&self, locator: &Locator) -> Result<String> {
		let mut script = self.script.lock().unwrap();
		let not_found = || Error::ElementNotFound {
			locator: locator.to_string(),
		};
		let queue = script.texts.get_mut(&locator.to_string()).ok_or_else(not_found)?;
		let text = if queue.len() > 1 { queue.pop_front() } else { queue.front().cloned() };
		text.ok_or_else(not_found)
	}

	async fn reload(&self) -> Result<()> {
		self.script.lock().unwrap().reloads += 1;
		Ok(())
	}

	async fn bring_to_front(&self) -> Result<()> {
		Ok(())
	}
}

const FAKE_SURFACE_ID: &str = "page-1";

struct FakeBrowser {
	page: Arc<FakePage>,
}

#[async_trait]
impl BrowserSession for FakeBrowser {
	/// Every lookup lands on the one shared page, listed under a single id.
	async fn surface(&self, target: &SurfaceTarget) -> Result<Arc<dyn UiDriver>> {
		if target.skip.iter().any(|id| id == FAKE_SURFACE_ID) {
			return Err(Error::Driver(format!("no new page titled '{}'", target.title_contains)));
		}
		Ok(self.page.clone())
	}

	async fn surface_ids(&self) -> Result<Vec<String>> {
		Ok(vec![FAKE_SURFACE_ID.to_string()])
	}

	async fn close(&mut self) -> Result<()> {
		self.page.script.lock().unwrap().closes += 1;
		Ok(())
	}
}

#[derive(Clone)]
pub enum Behavior {
	Page(Arc<FakePage>),
	FailLaunch,
	Panic,
}

/// Hands out fake browsers keyed by the profile directory name (the address).
#[derive(Default)]
pub struct FakeLauncher {
	behaviors: Mutex<HashMap<String, Behavior>>,
	launches: Mutex<Vec<LaunchSpec>>,
}

impl FakeLauncher {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with(self, address: &str, behavior: Behavior) -> Self {
		self.behaviors.lock().unwrap().insert(address.to_string(), behavior);
		self
	}

	pub fn launches(&self) -> Vec<LaunchSpec> {
		self.launches.lock().unwrap().clone()
	}
}

#[async_trait]
impl SessionLauncher for FakeLauncher {
	async fn launch(&self, spec: &LaunchSpec) -> Result<Box<dyn BrowserSession>> {
		let address = spec
			.profile_dir
			.file_name()
			.map(|n| n.to_string_lossy().into_owned())
			.unwrap_or_default();
		self.launches.lock().unwrap().push(spec.clone());
		let behavior = self.behaviors.lock().unwrap().get(&address).cloned();

		match behavior {
			Some(Behavior::Page(page)) => Ok(Box::new(FakeBrowser { page })),
			Some(Behavior::FailLaunch) => Err(Error::Launch("chrome exited with status 1".into())),
			Some(Behavior::Panic) => panic!("renderer crashed"),
			None => Err(Error::Launch(format!("no script for {address}"))),
		}
	}
}

/// Settings with a password, tight budgets and profiles under `profiles`.
pub fn settings(profiles: &Path) -> Settings {
	let mut settings = Settings {
		extension_password: SecretString::from("correct horse"),
		profiles_dir: profiles.to_path_buf(),
		timeouts: Timeouts {
			probe_ms: 0,
			expect_ms: 0,
			confirmation_ms: 0,
			attempt_ms: None,
		},
		..Settings::default()
	};
	settings.max_retries.restore = 3;
	settings.max_retries.sell = 3;
	settings
}

/// Page where every step succeeds and every swap confirms.
pub fn happy_page(settings: &Settings, balance: &str) -> Arc<FakePage> {
	let trade = &settings.selectors.trade;
	let page = FakePage::new();
	page.set_texts(&trade.balance_label, &[balance]);
	page.set_texts(&trade.submit_button, &["Place Order"]);
	page.set_texts(&trade.status_banner, &["Order filled"]);
	page
}
