//! SQL schema for the iStart SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS users (
    user_id     TEXT PRIMARY KEY,
    api_key     TEXT NOT NULL DEFAULT '',
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL
);

-- user_id is an opaque client-generated identifier; no foreign key to users.
CREATE TABLE IF NOT EXISTS projects (
    project_id           TEXT PRIMARY KEY,
    user_id              TEXT NOT NULL,
    name                 TEXT NOT NULL,
    description          TEXT NOT NULL,
    milestones           TEXT NOT NULL DEFAULT '[]',   -- JSON array of labels
    deadline             INTEGER NOT NULL CHECK (deadline >= 1),
    start_date           TEXT NOT NULL,                -- YYYY-MM-DD
    cumulative_score     REAL NOT NULL DEFAULT 0 CHECK (cumulative_score >= 0),
    completed_milestones TEXT NOT NULL DEFAULT '[]',   -- JSON array of indices
    created_at           TEXT NOT NULL,
    updated_at           TEXT NOT NULL
);

-- Logs are append-only; rows are only removed together with their project.
CREATE TABLE IF NOT EXISTS logs (
    log_id      TEXT PRIMARY KEY,
    project_id  TEXT NOT NULL REFERENCES projects(project_id),
    user_id     TEXT NOT NULL,
    day         INTEGER NOT NULL,
    work        TEXT NOT NULL,
    score       REAL NOT NULL CHECK (score >= 0 AND score <= 20),
    date        TEXT NOT NULL,                         -- YYYY-MM-DD
    analysis    TEXT NOT NULL,
    suggestion  TEXT NOT NULL,
    on_track    INTEGER NOT NULL,
    created_at  TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS projects_user_idx ON projects(user_id, created_at);
CREATE INDEX IF NOT EXISTS logs_project_idx  ON logs(project_id, day);
CREATE INDEX IF NOT EXISTS logs_user_idx     ON logs(user_id, created_at);

PRAGMA user_version = 1;
";
