//! Exclusive ownership of a wallet's browser profile for one run.

use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::error::{Error, Result};

/// Lock file held next to a profile directory while a session runs.
///
/// The file is created exclusively and removed on drop, so a second session
/// for the same profile fails fast instead of sharing the directory. A lock
/// left behind by a process that no longer exists is reclaimed.
#[derive(Debug)]
pub struct ProfileLock {
	path: PathBuf,
}

impl ProfileLock {
	pub fn acquire(profile_dir: &Path) -> Result<Self> {
		let path = lock_path(profile_dir);
		if let Some(parent) = path.parent() {
			std::fs::create_dir_all(parent)?;
		}

		let mut reclaimed = false;
		let mut file = loop {
			match OpenOptions::new().write(true).create_new(true).open(&path) {
				Ok(file) => break file,
				Err(err) if err.kind() == ErrorKind::AlreadyExists => {
					let Some(owner) = stale_owner(&path) else {
						return Err(Error::ProfileLocked { path });
					};
					if reclaimed {
						return Err(Error::ProfileLocked { path });
					}
					warn!(target: "swapper.session", path = %path.display(), pid = owner, "reclaiming stale profile lock");
					match std::fs::remove_file(&path) {
						Ok(()) => {}
						Err(err) if err.kind() == ErrorKind::NotFound => {}
						Err(err) => return Err(err.into()),
					}
					reclaimed = true;
				}
				Err(err) => return Err(err.into()),
			}
		};
		writeln!(file, "{}", std::process::id())?;

		Ok(Self { path })
	}

	pub fn path(&self) -> &Path {
		&self.path
	}
}

/// PID recorded in an existing lock file, if that process is gone.
///
/// An unreadable or empty file may belong to a session that has not yet
/// written its PID, so it is never treated as stale.
fn stale_owner(path: &Path) -> Option<u32> {
	let contents = std::fs::read_to_string(path).ok()?;
	let pid = contents.trim().parse::<u32>().ok().filter(|pid| *pid != 0)?;
	(!pid_is_alive(pid)).then_some(pid)
}

#[cfg(unix)]
fn pid_is_alive(pid: u32) -> bool {
	let Ok(pid) = libc::pid_t::try_from(pid) else {
		return false;
	};
	// SAFETY: signal 0 performs the existence and permission checks only.
	let rc = unsafe { libc::kill(pid, 0) };
	rc == 0 || std::io::Error::last_os_error().raw_os_error() == Some(libc::EPERM)
}

#[cfg(not(unix))]
fn pid_is_alive(_pid: u32) -> bool {
	true
}

impl Drop for ProfileLock {
	fn drop(&mut self) {
		if let Err(err) = std::fs::remove_file(&self.path) {
			warn!(target: "swapper.session", path = %self.path.display(), error = %err, "failed to remove profile lock");
		}
	}
}

/// `<root>/<address>` → `<root>/<address>.lock`
pub fn lock_path(profile_dir: &Path) -> PathBuf {
	let mut name = profile_dir.file_name().map(|n| n.to_os_string()).unwrap_or_default();
	name.push(".lock");
	profile_dir.with_file_name(name)
}

/// A profile counts as existing once its directory has been created.
pub fn profile_exists(profile_dir: &Path) -> bool {
	profile_dir.is_dir()
}

#[cfg(test)]
mod tests {
	use tempfile::TempDir;

	use super::*;

	#[test]
	fn second_acquire_fails_until_first_is_dropped() {
		let temp = TempDir::new().unwrap();
		let profile = temp.path().join("wallet-a");

		let first = ProfileLock::acquire(&profile).unwrap();
		assert!(first.path().exists());

		let err = ProfileLock::acquire(&profile).unwrap_err();
		assert!(matches!(err, Error::ProfileLocked { .. }));

		drop(first);
		assert!(!lock_path(&profile).exists());
		assert!(ProfileLock::acquire(&profile).is_ok());
	}

	#[test]
	fn lock_does_not_create_profile_directory() {
		let temp = TempDir::new().unwrap();
		let profile = temp.path().join("wallet-b");

		let _lock = ProfileLock::acquire(&profile).unwrap();
		assert!(!profile_exists(&profile));
		assert_eq!(lock_path(&profile), temp.path().join("wallet-b.lock"));
	}

	#[cfg(unix)]
	#[test]
	fn lock_left_by_dead_process_is_reclaimed() {
		let temp = TempDir::new().unwrap();
		let profile = temp.path().join("wallet-c");
		std::fs::write(lock_path(&profile), format!("{}\n", i32::MAX)).unwrap();

		let lock = ProfileLock::acquire(&profile).unwrap();
		let owner = std::fs::read_to_string(lock.path()).unwrap();
		assert_eq!(owner.trim(), std::process::id().to_string());
	}

	#[test]
	fn lock_held_by_live_process_is_respected() {
		let temp = TempDir::new().unwrap();
		let profile = temp.path().join("wallet-d");
		std::fs::write(lock_path(&profile), format!("{}\n", std::process::id())).unwrap();

		let err = ProfileLock::acquire(&profile).unwrap_err();
		assert!(matches!(err, Error::ProfileLocked { .. }));
	}

	#[test]
	fn lock_without_pid_is_respected() {
		let temp = TempDir::new().unwrap();
		let profile = temp.path().join("wallet-e");
		std::fs::write(lock_path(&profile), "").unwrap();

		assert!(ProfileLock::acquire(&profile).is_err());
		assert!(lock_path(&profile).exists());
	}
}
