//! Subcommand implementations and terminal output.

use std::path::PathBuf;

use anyhow::{Result, bail};
use chrono::{Local, NaiveDate, Utc};
use istart_core::{
  dates::{days_since, format_relative},
  log::Log,
  project::Project,
  status::{ProgressReport, ProgressStatus, classify},
};

use crate::{
  client::{ApiClient, NewProjectBody},
  export::{Export, ProjectExport},
  identity::Identity,
};

/// Calendar day as the user sees it.
fn today() -> NaiveDate { Local::now().date_naive() }

fn status_marker(status: ProgressStatus) -> &'static str {
  match status {
    ProgressStatus::OnTrack => "✓",
    ProgressStatus::SlightlyBehind => "~",
    ProgressStatus::Behind => "!",
  }
}

// ─── Projects ─────────────────────────────────────────────────────────────────

pub async fn list_projects(client: &ApiClient) -> Result<()> {
  let projects = client.list_projects().await?;
  if projects.is_empty() {
    println!("No projects yet. Create one with `istart create`.");
    return Ok(());
  }

  let today = today();
  for p in &projects {
    let day = days_since(p.start_date, today);
    let status = classify(p.cumulative_score, day, p.deadline);
    println!(
      "{} {:<28} day {:>3}/{:<3} {:>6.1}/{:<6} {:<16} {}",
      status_marker(status),
      p.name,
      day,
      p.deadline,
      p.cumulative_score,
      p.max_score(),
      status.label(),
      p.id,
    );
  }
  Ok(())
}

pub async fn show_project(client: &ApiClient, project_id: &str) -> Result<()> {
  let project = client.get_project(project_id).await?;
  let logs = client.list_logs(project_id).await?;
  let report = client.status(project_id).await?;

  print_project(&project, &report);
  print_logs(&logs);
  Ok(())
}

fn print_project(project: &Project, report: &ProgressReport) {
  println!("{}  ({})", project.name, project.id);
  println!("{}", project.description);
  println!();
  println!(
    "Day {} of {} ({} remaining), started {}",
    report.day, report.deadline, report.days_remaining, project.start_date
  );
  println!(
    "Score {:.1} / {} (expected {:.1}, pace {:+.1}) {} {}",
    report.cumulative_score,
    report.max_score,
    report.expected_score,
    report.pace,
    status_marker(report.status),
    report.label,
  );

  if !project.milestones.is_empty() {
    println!();
    println!(
      "Milestones ({}/{})",
      report.completed_milestones, report.total_milestones
    );
    for (i, milestone) in project.milestones.iter().enumerate() {
      let done = if project.completed_milestones.contains(&i) { "x" } else { " " };
      println!("  [{done}] {i}: {milestone}");
    }
  }
}

fn print_logs(logs: &[Log]) {
  if logs.is_empty() {
    println!();
    println!("No work logged yet.");
    return;
  }

  let today = today();
  println!();
  // Newest first, like a timeline.
  for log in logs.iter().rev() {
    println!(
      "Day {:<3} {:<12} {:>4.1}/20  {}",
      log.day,
      format_relative(log.date, today),
      log.score,
      log.work
    );
    if !log.analysis.is_empty() {
      println!("           {}", log.analysis);
    }
  }
}

pub async fn create_project(client: &ApiClient, body: NewProjectBody) -> Result<()> {
  let project = client.create_project(&body).await?;
  println!("Created {} ({})", project.name, project.id);
  Ok(())
}

pub async fn delete_project(client: &ApiClient, project_id: &str) -> Result<()> {
  let logs_removed = client.delete_project(project_id).await?;
  println!("Deleted {project_id} and {logs_removed} log(s)");
  Ok(())
}

pub async fn toggle_milestone(client: &ApiClient, project_id: &str, index: usize) -> Result<()> {
  let project = client.toggle_milestone(project_id, index).await?;
  let done = project.completed_milestones.contains(&index);
  let label = project.milestones.get(index).map(String::as_str).unwrap_or("?");
  println!("[{}] {label}", if done { "x" } else { " " });
  Ok(())
}

// ─── Daily work ───────────────────────────────────────────────────────────────

pub async fn log_work(client: &ApiClient, project_id: &str, work: &str) -> Result<()> {
  if work.trim().is_empty() {
    bail!("describe what you worked on today");
  }

  let entry = client.submit_entry(project_id, work).await?;
  let log = &entry.log;
  let progress = &entry.progress;

  println!("Day {} scored {:.1}/20", log.day, log.score);
  println!("{}", log.analysis);
  if !log.suggestion.is_empty() {
    println!("Tomorrow: {}", log.suggestion);
  }
  println!(
    "Total {:.1} / {} {} {}",
    entry.project.cumulative_score,
    progress.max_score,
    status_marker(progress.status),
    progress.label,
  );
  Ok(())
}

// ─── API key ──────────────────────────────────────────────────────────────────

/// The user's API key from the server, or the local backup when the server
/// cannot be asked.
pub async fn resolve_api_key(client: &ApiClient, identity: &Identity) -> Result<String> {
  match client.get_user().await {
    Ok(user) => Ok(user.api_key),
    Err(e) => {
      tracing::warn!(error = %e, "could not fetch settings; using local key backup");
      Ok(identity.backup_key()?.unwrap_or_default())
    }
  }
}

pub async fn key_get(client: &ApiClient, identity: &Identity) -> Result<()> {
  let key = resolve_api_key(client, identity).await?;
  if key.is_empty() {
    println!("No API key set. Use `istart key set <KEY>`.");
  } else {
    println!("{}", mask(&key));
  }
  Ok(())
}

/// Save the key on the server and as a local backup. The backup is written
/// even when the server is unreachable.
pub async fn key_set(client: &ApiClient, identity: &Identity, key: &str) -> Result<()> {
  let key = key.trim();
  identity.store_backup_key(key)?;
  let saved = client.set_api_key(key).await;
  if let Err(e) = &saved {
    tracing::warn!(error = %e, "could not save key on server");
  }
  println!("{}", key_save_outcome(&saved));
  Ok(())
}

fn key_save_outcome<T>(saved: &Result<T>) -> String {
  match saved {
    Ok(_) => "API key saved".to_owned(),
    Err(e) => format!("Could not save API key on server: {e:#}\nAPI key saved locally only"),
  }
}

fn mask(key: &str) -> String {
  let chars: Vec<char> = key.chars().collect();
  if chars.len() <= 4 {
    return "*".repeat(chars.len());
  }
  let hidden = chars.len() - 4;
  let tail: String = chars[hidden..].iter().collect();
  format!("{}{tail}", "*".repeat(hidden))
}

// ─── Export ───────────────────────────────────────────────────────────────────

/// Write every project and its logs to `out`, or to a dated file in the
/// current directory.
pub async fn export(client: &ApiClient, out: Option<PathBuf>) -> Result<()> {
  let mut projects = Vec::new();
  for project in client.list_projects().await? {
    let logs = client.list_logs(&project.id).await?;
    projects.push(ProjectExport { project, logs });
  }

  let export = Export { export_date: Utc::now(), projects };
  let path = out.unwrap_or_else(|| export.default_file_name());
  export.write_to(&path)?;
  tracing::debug!(path = %path.display(), projects = export.projects.len(), "export written");
  println!("Exported {} project(s) to {}", export.projects.len(), path.display());
  Ok(())
}

// ─── Reset ────────────────────────────────────────────────────────────────────

pub async fn reset(client: &ApiClient, identity: &Identity, confirmed: bool) -> Result<()> {
  if !confirmed {
    bail!("this deletes every project and log; re-run with --yes to confirm");
  }
  let summary = client.reset().await?;
  identity.clear_backup_key()?;
  println!(
    "Removed {} project(s) and {} log(s)",
    summary.projects_removed, summary.logs_removed
  );
  Ok(())
}
