//! Locating a Chromium-family executable.

use std::path::{Path, PathBuf};

use swapper::{Error, Result};

/// Uses `explicit` when given, otherwise searches well-known install locations.
pub fn resolve_executable(explicit: Option<&Path>) -> Result<PathBuf> {
	match explicit {
		Some(path) if path.is_file() => Ok(path.to_path_buf()),
		Some(path) => which::which(path).map_err(|_| Error::Launch(format!("browser executable {} not found", path.display()))),
		None => find_chrome_executable().ok_or_else(|| {
			Error::Launch("could not find a Chrome/Chromium executable; set chromeExecutable in the config".into())
		}),
	}
}

pub fn find_chrome_executable() -> Option<PathBuf> {
	candidates().into_iter().find_map(|candidate| {
		let path = Path::new(&candidate);
		if path.is_absolute() {
			path.exists().then(|| path.to_path_buf())
		} else {
			which::which(&candidate).ok()
		}
	})
}

fn candidates() -> Vec<String> {
	if cfg!(target_os = "macos") {
		[
			"/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
			"/Applications/Chromium.app/Contents/MacOS/Chromium",
			"/Applications/Brave Browser.app/Contents/MacOS/Brave Browser",
		]
		.map(String::from)
		.to_vec()
	} else if cfg!(target_os = "windows") {
		windows_candidates()
	} else {
		[
			"google-chrome-stable",
			"google-chrome",
			"chromium-browser",
			"chromium",
			"brave-browser",
			"/usr/bin/google-chrome-stable",
			"/usr/bin/google-chrome",
			"/usr/bin/chromium-browser",
			"/usr/bin/chromium",
			"/snap/bin/chromium",
		]
		.map(String::from)
		.to_vec()
	}
}

fn windows_candidates() -> Vec<String> {
	let mut roots: Vec<PathBuf> = ["PROGRAMFILES", "PROGRAMFILES(X86)", "LOCALAPPDATA"]
		.into_iter()
		.filter_map(|key| std::env::var_os(key).map(PathBuf::from))
		.collect();
	if roots.is_empty() {
		roots.push(PathBuf::from(r"C:\Program Files"));
	}

	let suffixes: &[&[&str]] = &[
		&["Google", "Chrome", "Application", "chrome.exe"],
		&["Chromium", "Application", "chrome.exe"],
		&["BraveSoftware", "Brave-Browser", "Application", "brave.exe"],
	];

	let mut out = Vec::new();
	for root in &roots {
		for suffix in suffixes {
			let path: PathBuf = suffix.iter().fold(root.clone(), |path, part| path.join(part));
			out.push(path.to_string_lossy().into_owned());
		}
	}
	out.extend(["chrome.exe", "chromium.exe"].map(String::from));
	out
}
