//! Per-profile client state kept on disk.
//!
//! `<state_dir>/user-id` holds the random identifier every request is scoped
//! by; it is generated once and reused. `<state_dir>/api-key` is a local backup
//! of the API key for when the server cannot be reached.

use std::{
  fs,
  io::ErrorKind,
  path::PathBuf,
};

use anyhow::{Context, Result};
use uuid::Uuid;

const USER_ID_FILE: &str = "user-id";
const API_KEY_FILE: &str = "api-key";

#[derive(Debug, Clone)]
pub struct Identity {
  dir: PathBuf,
}

impl Identity {
  pub fn new(dir: impl Into<PathBuf>) -> Self { Self { dir: dir.into() } }

  /// The cached user id, generating and persisting a new one on first use.
  pub fn user_id(&self) -> Result<String> {
    if let Some(id) = self.read(USER_ID_FILE)? {
      return Ok(id);
    }
    let id = Uuid::new_v4().to_string();
    self.write(USER_ID_FILE, &id)?;
    tracing::debug!(user_id = %id, "generated new user id");
    Ok(id)
  }

  /// The locally backed-up API key, if any.
  pub fn backup_key(&self) -> Result<Option<String>> { self.read(API_KEY_FILE) }

  pub fn store_backup_key(&self, key: &str) -> Result<()> { self.write(API_KEY_FILE, key) }

  /// Remove the local key backup. Missing files are not an error.
  pub fn clear_backup_key(&self) -> Result<()> {
    match fs::remove_file(self.dir.join(API_KEY_FILE)) {
      Err(e) if e.kind() != ErrorKind::NotFound => Err(e).context("removing api-key backup"),
      _ => Ok(()),
    }
  }

  fn read(&self, name: &str) -> Result<Option<String>> {
    let path = self.dir.join(name);
    match fs::read_to_string(&path) {
      Ok(s) => Ok(Some(s.trim().to_owned()).filter(|s| !s.is_empty())),
      Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
      Err(e) => Err(e).with_context(|| format!("reading {}", path.display())),
    }
  }

  fn write(&self, name: &str, value: &str) -> Result<()> {
    fs::create_dir_all(&self.dir)
      .with_context(|| format!("creating state directory {}", self.dir.display()))?;
    let path = self.dir.join(name);
    fs::write(&path, value).with_context(|| format!("writing {}", path.display()))
  }
}
