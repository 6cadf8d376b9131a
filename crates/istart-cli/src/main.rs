//! `istart`: command-line client for the iStart project tracker.
//!
//! # Usage
//!
//! ```text
//! istart create --name "Compiler" --description "A toy compiler" --deadline 30 -m lexer -m parser
//! istart log proj-1712345678901-k3j9x0a2b "Finished the lexer and its tests"
//! istart --url http://tracker.local:3001 projects
//! istart export --out backup.json
//! ```

mod app;
mod client;
mod export;
mod identity;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use client::{ApiClient, ApiConfig, NewProjectBody};
use identity::Identity;
use serde::Deserialize;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "istart", about = "Track daily progress on your projects")]
struct Args {
  /// Path to a TOML config file (url, state_dir).
  #[arg(short, long, value_name = "FILE")]
  config: Option<PathBuf>,

  /// Base URL of the iStart server (default: http://localhost:3001).
  #[arg(long, env = "ISTART_URL")]
  url: Option<String>,

  /// Directory holding the profile's user id and key backup.
  #[arg(long, env = "ISTART_STATE_DIR", value_name = "DIR")]
  state_dir: Option<PathBuf>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// List projects with their status.
  Projects,
  /// Show a project's progress, milestones, and timeline.
  Show { project_id: String },
  /// Create a project.
  Create {
    #[arg(long)]
    name:        String,
    #[arg(long)]
    description: String,
    /// Length of the project in days.
    #[arg(long)]
    deadline:    u32,
    /// A milestone; repeat for several.
    #[arg(short, long = "milestone")]
    milestones:  Vec<String>,
    /// First day of the project (YYYY-MM-DD); defaults to today.
    #[arg(long)]
    start:       Option<chrono::NaiveDate>,
  },
  /// Delete a project and all of its logs.
  Delete { project_id: String },
  /// Log and score today's work.
  Log {
    project_id: String,
    #[arg(required = true, num_args = 1..)]
    work:       Vec<String>,
  },
  /// Mark a milestone done, or undo it.
  Toggle { project_id: String, index: usize },
  /// Show or set the Gemini API key.
  #[command(subcommand)]
  Key(KeyCommand),
  /// Save every project and its logs as JSON.
  Export {
    /// Output file; defaults to istart-export-YYYY-MM-DD.json.
    #[arg(short, long, value_name = "FILE")]
    out: Option<PathBuf>,
  },
  /// Delete every project, log, and setting of this profile.
  Reset {
    #[arg(long)]
    yes: bool,
  },
}

#[derive(Subcommand, Debug)]
enum KeyCommand {
  Get,
  Set { key: String },
}

// ─── Config file ──────────────────────────────────────────────────────────────

/// Shape of the optional TOML config file.
#[derive(Deserialize, Default)]
struct ConfigFile {
  #[serde(default)]
  url:       String,
  #[serde(default)]
  state_dir: Option<PathBuf>,
}

fn default_state_dir() -> PathBuf {
  match std::env::var("HOME") {
    Ok(home) => PathBuf::from(home).join(".config").join("istart"),
    Err(_) => PathBuf::from(".istart"),
  }
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_writer(std::io::stderr)
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .from_env_lossy(),
    )
    .init();

  let args = Args::parse();

  let file_cfg: ConfigFile = if let Some(path) = &args.config {
    let raw = std::fs::read_to_string(path)
      .with_context(|| format!("reading config file {}", path.display()))?;
    toml::from_str(&raw).context("parsing config file")?
  } else {
    ConfigFile::default()
  };

  // CLI flags override config file, which overrides defaults.
  let base_url = args
    .url
    .or_else(|| (!file_cfg.url.is_empty()).then(|| file_cfg.url.clone()))
    .unwrap_or_else(|| "http://localhost:3001".to_string());
  let state_dir = args
    .state_dir
    .or(file_cfg.state_dir)
    .unwrap_or_else(default_state_dir);

  let identity = Identity::new(state_dir);
  let client = ApiClient::new(ApiConfig {
    base_url,
    user_id: identity.user_id()?,
  })?;

  match args.command {
    Command::Projects => app::list_projects(&client).await,
    Command::Show { project_id } => app::show_project(&client, &project_id).await,
    Command::Create {
      name,
      description,
      deadline,
      milestones,
      start,
    } => {
      let body = NewProjectBody {
        name,
        description,
        milestones,
        deadline,
        start_date: start,
      };
      app::create_project(&client, body).await
    }
    Command::Delete { project_id } => app::delete_project(&client, &project_id).await,
    Command::Log { project_id, work } => app::log_work(&client, &project_id, &work.join(" ")).await,
    Command::Toggle { project_id, index } => {
      app::toggle_milestone(&client, &project_id, index).await
    }
    Command::Key(KeyCommand::Get) => app::key_get(&client, &identity).await,
    Command::Key(KeyCommand::Set { key }) => app::key_set(&client, &identity, &key).await,
    Command::Export { out } => app::export(&client, out).await,
    Command::Reset { yes } => app::reset(&client, &identity, yes).await,
  }
}
