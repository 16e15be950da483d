//! Instance numbering and per-instance config binding
//!
//! Every running copy holds a lock file `lock_<pid>_<instance>` under
//! `~/.tilda/locks`. The lowest number without a live lock is taken, and
//! the instance reads its settings from `~/.tilda/config_<instance>`.

use std::ffi::OsString;
use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use directories::BaseDirs;
use thiserror::Error;

use crate::config::{ConfigError, ConfigStore};

const CONFIG_PREFIX: &str = "/.tilda/config_";
const LOCK_PREFIX: &str = "lock_";
const MAX_INSTANCES: u32 = 1024;

/// Instance allocation errors
#[derive(Error, Debug)]
pub enum InstanceError {
    #[error("Lock directory error: {0}")]
    Io(#[from] io::Error),

    #[error("No free instance number below {MAX_INSTANCES}")]
    NoFreeInstance,

    #[error("Failed to initialize config: {0}")]
    Config(#[from] ConfigError),

    #[error("Home directory not found")]
    NoHomeDir,
}

/// Config file for an instance: `<home>/.tilda/config_<instance>`
pub fn config_file_path(home: &Path, instance: u32) -> PathBuf {
    let mut path = OsString::from(home.as_os_str());
    path.push(CONFIG_PREFIX);
    path.push(instance.to_string());
    PathBuf::from(path)
}

/// Directory holding the instance lock files
pub fn lock_dir(home: &Path) -> PathBuf {
    home.join(".tilda").join("locks")
}

/// Current user's home directory
pub fn home_dir() -> Result<PathBuf, InstanceError> {
    BaseDirs::new()
        .map(|dirs| dirs.home_dir().to_path_buf())
        .ok_or(InstanceError::NoHomeDir)
}

/// Held instance number; the lock file is removed on drop
#[derive(Debug)]
pub struct InstanceLock {
    id: u32,
    path: PathBuf,
}

impl InstanceLock {
    /// Take the lowest instance number not held by a live process
    pub fn acquire(dir: &Path) -> Result<Self, InstanceError> {
        fs::create_dir_all(dir)?;
        let pid = std::process::id();

        let mut skip = Vec::new();
        loop {
            let held = live_instances(dir)?;
            let Some(id) = (0..MAX_INSTANCES).find(|n| !held.contains(n) && !skip.contains(n))
            else {
                return Err(InstanceError::NoFreeInstance);
            };

            let path = dir.join(lock_file_name(pid, id));
            OpenOptions::new().write(true).create_new(true).open(&path)?;

            // Two processes can race for the same number; the lower pid keeps it.
            let contested = read_locks(dir)?
                .into_iter()
                .any(|(other, n)| n == id && other < pid && process_alive(other));
            if contested {
                log::debug!("Instance {} taken concurrently, retrying", id);
                let _ = fs::remove_file(&path);
                skip.push(id);
                continue;
            }

            log::debug!("Acquired instance {} ({})", id, path.display());
            return Ok(Self { id, path });
        }
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for InstanceLock {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.path) {
            log::warn!("Failed to remove lock {}: {}", self.path.display(), e);
        }
    }
}

/// A running instance with its config location resolved
#[derive(Debug)]
pub struct Instance {
    config_path: PathBuf,
    lock: InstanceLock,
}

impl Instance {
    /// Allocate an instance number under `home` and open its config store
    pub fn bind(home: &Path) -> Result<(Self, ConfigStore), InstanceError> {
        let lock = InstanceLock::acquire(&lock_dir(home))?;
        let config_path = config_file_path(home, lock.id());
        let store = ConfigStore::init(&config_path)?;

        log::info!(
            "Instance {} using config {}",
            lock.id(),
            config_path.display()
        );

        Ok((Self { config_path, lock }, store))
    }

    pub fn id(&self) -> u32 {
        self.lock.id()
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }
}

fn lock_file_name(pid: u32, instance: u32) -> String {
    format!("{}{}_{}", LOCK_PREFIX, pid, instance)
}

/// Parse `lock_<pid>_<instance>`
fn parse_lock_name(name: &str) -> Option<(u32, u32)> {
    let rest = name.strip_prefix(LOCK_PREFIX)?;
    let (pid, instance) = rest.split_once('_')?;
    Some((pid.parse().ok()?, instance.parse().ok()?))
}

fn read_locks(dir: &Path) -> io::Result<Vec<(u32, u32)>> {
    let mut locks = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if let Some(parsed) = entry.file_name().to_str().and_then(parse_lock_name) {
            locks.push(parsed);
        }
    }
    Ok(locks)
}

/// Instance numbers held by live processes; stale locks are deleted
fn live_instances(dir: &Path) -> io::Result<Vec<u32>> {
    let mut held = Vec::new();
    for (pid, instance) in read_locks(dir)? {
        if process_alive(pid) {
            held.push(instance);
        } else {
            log::info!("Removing stale lock for instance {} (pid {})", instance, pid);
            let _ = fs::remove_file(dir.join(lock_file_name(pid, instance)));
        }
    }
    Ok(held)
}

#[cfg(unix)]
fn process_alive(pid: u32) -> bool {
    let Ok(pid) = libc::pid_t::try_from(pid) else {
        return false;
    };
    // Signal 0 only checks for existence and permission
    if unsafe { libc::kill(pid, 0) } == 0 {
        return true;
    }
    io::Error::last_os_error().raw_os_error() == Some(libc::EPERM)
}

#[cfg(not(unix))]
fn process_alive(_pid: u32) -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_file_path() {
        let path = config_file_path(Path::new("/home/u"), 2);
        assert_eq!(path, PathBuf::from("/home/u/.tilda/config_2"));
    }

    #[test]
    fn test_config_file_path_is_plain_concatenation() {
        for id in [0, 1, 9, 10, 1023] {
            let path = config_file_path(Path::new("/srv/home/x"), id);
            assert_eq!(
                path.to_str().unwrap(),
                format!("/srv/home/x/.tilda/config_{}", id)
            );
        }
    }

    #[test]
    fn test_parse_lock_name() {
        assert_eq!(parse_lock_name("lock_1234_0"), Some((1234, 0)));
        assert_eq!(parse_lock_name("lock_1_12"), Some((1, 12)));
        assert_eq!(parse_lock_name("lock_abc_0"), None);
        assert_eq!(parse_lock_name("config_0"), None);
    }

    #[test]
    fn test_acquire_lowest_free() {
        let dir = tempfile::tempdir().unwrap();
        let first = InstanceLock::acquire(dir.path()).unwrap();
        let second = InstanceLock::acquire(dir.path()).unwrap();
        assert_eq!(first.id(), 0);
        assert_eq!(second.id(), 1);
        assert!(first.path().exists());

        drop(first);
        let third = InstanceLock::acquire(dir.path()).unwrap();
        assert_eq!(third.id(), 0);
        drop(second);
        drop(third);
    }

    #[test]
    fn test_drop_removes_lock() {
        let dir = tempfile::tempdir().unwrap();
        let lock = InstanceLock::acquire(dir.path()).unwrap();
        let path = lock.path().to_path_buf();
        drop(lock);
        assert!(!path.exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_stale_lock_is_reclaimed() {
        let dir = tempfile::tempdir().unwrap();
        let stale = dir.path().join(lock_file_name(2_147_483_646, 0));
        fs::write(&stale, b"").unwrap();

        let lock = InstanceLock::acquire(dir.path()).unwrap();
        assert_eq!(lock.id(), 0);
        assert!(!stale.exists());
    }

    #[test]
    fn test_bind_instance() {
        let home = tempfile::tempdir().unwrap();
        let (instance, store) = Instance::bind(home.path()).unwrap();
        assert_eq!(instance.id(), 0);
        assert_eq!(
            instance.config_path(),
            config_file_path(home.path(), 0).as_path()
        );
        assert_eq!(store.path(), instance.config_path());
        assert!(lock_dir(home.path()).join(lock_file_name(std::process::id(), 0)).exists());
    }
}
