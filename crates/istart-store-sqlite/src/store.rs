//! [`SqliteStore`], the SQLite implementation of [`TrackerStore`].

use std::path::Path;

use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use istart_core::{
  log::{Log, NewLog},
  project::{NewProject, Project, ProjectDeletion, ProjectPatch, generate_project_id},
  store::TrackerStore,
  user::{ResetSummary, User},
};

use crate::{
  encode::{
    LOG_COLUMNS, PROJECT_COLUMNS, RawLog, RawProject, RawUser, encode_date, encode_dt,
    encode_indices, encode_labels, encode_uuid, now,
  },
  schema::SCHEMA,
  Error, Result,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// An iStart store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn fetch_user(&self, user_id: String) -> Result<User> {
    let raw: RawUser = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(
          "SELECT user_id, api_key, created_at, updated_at FROM users WHERE user_id = ?1",
          rusqlite::params![user_id],
          RawUser::from_row,
        )?)
      })
      .await?;
    raw.into_user()
  }
}

/// Wrap a store error so it can leave a `tokio_rusqlite` closure.
fn boxed(e: Error) -> tokio_rusqlite::Error { tokio_rusqlite::Error::Other(Box::new(e)) }

fn select_project(
  conn: &rusqlite::Connection,
  user_id: &str,
  project_id: &str,
) -> rusqlite::Result<Option<RawProject>> {
  conn
    .query_row(
      &format!("SELECT {PROJECT_COLUMNS} FROM projects WHERE project_id = ?1 AND user_id = ?2"),
      rusqlite::params![project_id, user_id],
      RawProject::from_row,
    )
    .optional()
}

// ─── TrackerStore impl ───────────────────────────────────────────────────────

impl TrackerStore for SqliteStore {
  type Error = Error;

  // ── Users ─────────────────────────────────────────────────────────────────

  async fn ensure_user(&self, user_id: &str) -> Result<User> {
    let id_str = user_id.to_owned();
    let at_str = encode_dt(now());

    let created = self
      .conn
      .call(move |conn| {
        let inserted = conn.execute(
          "INSERT OR IGNORE INTO users (user_id, api_key, created_at, updated_at)
           VALUES (?1, '', ?2, ?2)",
          rusqlite::params![id_str, at_str],
        )?;
        Ok(inserted > 0)
      })
      .await?;

    if created {
      tracing::debug!(user_id, "created user settings on first read");
    }
    self.fetch_user(user_id.to_owned()).await
  }

  async fn set_api_key(&self, user_id: &str, api_key: &str) -> Result<User> {
    let id_str  = user_id.to_owned();
    let key_str = api_key.trim().to_owned();
    let at_str  = encode_dt(now());

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO users (user_id, api_key, created_at, updated_at)
           VALUES (?1, ?2, ?3, ?3)
           ON CONFLICT (user_id) DO UPDATE
             SET api_key = excluded.api_key, updated_at = excluded.updated_at",
          rusqlite::params![id_str, key_str, at_str],
        )?;
        Ok(())
      })
      .await?;

    self.fetch_user(user_id.to_owned()).await
  }

  async fn reset_user(&self, user_id: &str) -> Result<ResetSummary> {
    let id_str = user_id.to_owned();

    let summary = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let logs_removed =
          tx.execute("DELETE FROM logs WHERE user_id = ?1", rusqlite::params![id_str])?;
        let projects_removed =
          tx.execute("DELETE FROM projects WHERE user_id = ?1", rusqlite::params![id_str])?;
        tx.execute("DELETE FROM users WHERE user_id = ?1", rusqlite::params![id_str])?;
        tx.commit()?;
        Ok(ResetSummary { projects_removed, logs_removed })
      })
      .await?;

    tracing::info!(
      user_id,
      projects = summary.projects_removed,
      logs = summary.logs_removed,
      "reset user data"
    );
    Ok(summary)
  }

  // ── Projects ──────────────────────────────────────────────────────────────

  async fn list_projects(&self, user_id: &str) -> Result<Vec<Project>> {
    let id_str = user_id.to_owned();

    let raws: Vec<RawProject> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {PROJECT_COLUMNS} FROM projects
           WHERE user_id = ?1
           ORDER BY created_at DESC, rowid DESC"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![id_str], RawProject::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawProject::into_project).collect()
  }

  async fn get_project(&self, user_id: &str, project_id: &str) -> Result<Option<Project>> {
    let user_str    = user_id.to_owned();
    let project_str = project_id.to_owned();

    let raw: Option<RawProject> = self
      .conn
      .call(move |conn| Ok(select_project(conn, &user_str, &project_str)?))
      .await?;

    raw.map(RawProject::into_project).transpose()
  }

  async fn create_project(&self, user_id: &str, input: NewProject) -> Result<Project> {
    let input = input.validate()?;
    let at = now();

    let project = Project {
      id:                   input.id.unwrap_or_else(|| generate_project_id(at)),
      user_id:              user_id.to_owned(),
      name:                 input.name,
      description:          input.description,
      milestones:           input.milestones,
      deadline:             input.deadline,
      start_date:           input.start_date.unwrap_or_else(|| at.date_naive()),
      cumulative_score:     input.cumulative_score,
      completed_milestones: input.completed_milestones,
      created_at:           at,
      updated_at:           at,
    };

    let id_str         = project.id.clone();
    let user_str       = project.user_id.clone();
    let name           = project.name.clone();
    let description    = project.description.clone();
    let milestones_str = encode_labels(&project.milestones)?;
    let deadline       = i64::from(project.deadline);
    let start_str      = encode_date(project.start_date);
    let score          = project.cumulative_score;
    let completed_str  = encode_indices(&project.completed_milestones)?;
    let at_str         = encode_dt(at);

    let inserted = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let taken = tx
          .query_row(
            "SELECT 1 FROM projects WHERE project_id = ?1",
            rusqlite::params![id_str],
            |_| Ok(true),
          )
          .optional()?
          .unwrap_or(false);
        if taken {
          return Ok(false);
        }
        tx.execute(
          "INSERT INTO projects (
             project_id, user_id, name, description, milestones, deadline,
             start_date, cumulative_score, completed_milestones, created_at, updated_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?10)",
          rusqlite::params![
            id_str,
            user_str,
            name,
            description,
            milestones_str,
            deadline,
            start_str,
            score,
            completed_str,
            at_str,
          ],
        )?;
        tx.commit()?;
        Ok(true)
      })
      .await?;

    if !inserted {
      return Err(istart_core::Error::ProjectExists(project.id).into());
    }
    Ok(project)
  }

  async fn update_project(
    &self,
    user_id:    &str,
    project_id: &str,
    patch:      ProjectPatch,
  ) -> Result<Option<Project>> {
    patch.validate()?;

    let user_str    = user_id.to_owned();
    let project_str = project_id.to_owned();
    let at          = now();

    let updated = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let Some(raw) = select_project(&tx, &user_str, &project_str)? else {
          return Ok(None);
        };

        let mut project = raw.into_project().map_err(boxed)?;
        patch.apply(&mut project);
        project.updated_at = at;

        tx.execute(
          "UPDATE projects
             SET name = ?3, description = ?4, milestones = ?5, deadline = ?6,
                 start_date = ?7, cumulative_score = ?8, completed_milestones = ?9,
                 updated_at = ?10
           WHERE project_id = ?1 AND user_id = ?2",
          rusqlite::params![
            project_str,
            user_str,
            project.name,
            project.description,
            encode_labels(&project.milestones).map_err(boxed)?,
            i64::from(project.deadline),
            encode_date(project.start_date),
            project.cumulative_score,
            encode_indices(&project.completed_milestones).map_err(boxed)?,
            encode_dt(project.updated_at),
          ],
        )?;
        tx.commit()?;
        Ok(Some(project))
      })
      .await?;

    Ok(updated)
  }

  async fn delete_project(
    &self,
    user_id:    &str,
    project_id: &str,
  ) -> Result<Option<ProjectDeletion>> {
    let user_str    = user_id.to_owned();
    let project_str = project_id.to_owned();

    let deletion = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let logs_removed = tx.execute(
          "DELETE FROM logs WHERE project_id = ?1 AND user_id = ?2",
          rusqlite::params![project_str, user_str],
        )?;
        let projects_removed = tx.execute(
          "DELETE FROM projects WHERE project_id = ?1 AND user_id = ?2",
          rusqlite::params![project_str, user_str],
        )?;
        if projects_removed == 0 {
          // Dropping the transaction rolls back the log delete.
          return Ok(None);
        }
        tx.commit()?;
        Ok(Some(ProjectDeletion { logs_removed }))
      })
      .await?;

    if let Some(d) = deletion {
      tracing::info!(user_id, project_id, logs = d.logs_removed, "deleted project");
    }
    Ok(deletion)
  }

  // ── Logs ──────────────────────────────────────────────────────────────────

  async fn list_logs(&self, user_id: &str, project_id: &str) -> Result<Vec<Log>> {
    let user_str    = user_id.to_owned();
    let project_str = project_id.to_owned();

    let raws: Vec<RawLog> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {LOG_COLUMNS} FROM logs
           WHERE user_id = ?1 AND project_id = ?2
           ORDER BY day ASC, created_at ASC"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![user_str, project_str], RawLog::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawLog::into_log).collect()
  }

  async fn create_log(&self, user_id: &str, project_id: &str, input: NewLog) -> Result<Log> {
    let log = build_log(user_id, project_id, input.validate()?);
    let row = LogRow::from(&log);

    let inserted = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        if select_project(&tx, &row.user_id, &row.project_id)?.is_none() {
          return Ok(false);
        }
        row.insert(&tx)?;
        tx.commit()?;
        Ok(true)
      })
      .await?;

    if !inserted {
      return Err(istart_core::Error::ProjectNotFound(project_id.to_owned()).into());
    }
    Ok(log)
  }

  async fn delete_logs(&self, user_id: &str, project_id: &str) -> Result<usize> {
    let user_str    = user_id.to_owned();
    let project_str = project_id.to_owned();

    let removed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM logs WHERE user_id = ?1 AND project_id = ?2",
          rusqlite::params![user_str, project_str],
        )?)
      })
      .await?;
    Ok(removed)
  }

  async fn record_daily_log(
    &self,
    user_id:    &str,
    project_id: &str,
    input:      NewLog,
  ) -> Result<(Log, Project)> {
    let log    = build_log(user_id, project_id, input.validate()?);
    let row    = LogRow::from(&log);
    let score  = log.score;
    let at_str = encode_dt(now());

    let raw: Option<RawProject> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let updated = tx.execute(
          "UPDATE projects
             SET cumulative_score = cumulative_score + ?3, updated_at = ?4
           WHERE project_id = ?1 AND user_id = ?2",
          rusqlite::params![row.project_id, row.user_id, score, at_str],
        )?;
        if updated == 0 {
          return Ok(None);
        }
        row.insert(&tx)?;
        let project = select_project(&tx, &row.user_id, &row.project_id)?;
        tx.commit()?;
        Ok(project)
      })
      .await?;

    let Some(raw) = raw else {
      return Err(istart_core::Error::ProjectNotFound(project_id.to_owned()).into());
    };
    Ok((log, raw.into_project()?))
  }
}

// ─── Log insertion ───────────────────────────────────────────────────────────

fn build_log(user_id: &str, project_id: &str, input: NewLog) -> Log {
  let at = now();
  Log {
    id:         Uuid::new_v4(),
    project_id: project_id.to_owned(),
    user_id:    user_id.to_owned(),
    day:        input.day,
    work:       input.work,
    score:      input.score,
    date:       input.date.unwrap_or_else(|| at.date_naive()),
    analysis:   input.analysis,
    suggestion: input.suggestion,
    on_track:   input.on_track,
    created_at: at,
  }
}

/// Owned column values for one `logs` insert, movable into a connection
/// closure.
struct LogRow {
  log_id:     String,
  project_id: String,
  user_id:    String,
  day:        i64,
  work:       String,
  score:      f64,
  date:       String,
  analysis:   String,
  suggestion: String,
  on_track:   bool,
  created_at: String,
}

impl From<&Log> for LogRow {
  fn from(log: &Log) -> Self {
    Self {
      log_id:     encode_uuid(log.id),
      project_id: log.project_id.clone(),
      user_id:    log.user_id.clone(),
      day:        log.day,
      work:       log.work.clone(),
      score:      log.score,
      date:       encode_date(log.date),
      analysis:   log.analysis.clone(),
      suggestion: log.suggestion.clone(),
      on_track:   log.on_track,
      created_at: encode_dt(log.created_at),
    }
  }
}

impl LogRow {
  fn insert(&self, conn: &rusqlite::Connection) -> rusqlite::Result<()> {
    conn.execute(
      "INSERT INTO logs (
         log_id, project_id, user_id, day, work, score, date,
         analysis, suggestion, on_track, created_at
       ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
      rusqlite::params![
        self.log_id,
        self.project_id,
        self.user_id,
        self.day,
        self.work,
        self.score,
        self.date,
        self.analysis,
        self.suggestion,
        self.on_track,
        self.created_at,
      ],
    )?;
    Ok(())
  }
}
