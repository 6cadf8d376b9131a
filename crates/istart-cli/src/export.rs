//! JSON export of every project and its logs.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use istart_core::{log::Log, project::Project};
use serde::Serialize;

/// One project with its full history.
#[derive(Debug, Serialize)]
pub struct ProjectExport {
  pub project: Project,
  pub logs:    Vec<Log>,
}

/// Document written by `istart export`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Export {
  pub export_date: DateTime<Utc>,
  pub projects:    Vec<ProjectExport>,
}

impl Export {
  /// `istart-export-YYYY-MM-DD.json`, dated in UTC.
  pub fn default_file_name(&self) -> PathBuf {
    PathBuf::from(format!("istart-export-{}.json", self.export_date.format("%Y-%m-%d")))
  }

  /// Pretty-print to `path`, replacing any existing file.
  pub fn write_to(&self, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(self).context("serializing export")?;
    std::fs::write(path, json).with_context(|| format!("writing {}", path.display()))
  }
}
