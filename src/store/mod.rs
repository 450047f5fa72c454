mod models;
mod queries;

pub use models::*;

use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::Connection;

use crate::config;

/// The narrow persistence surface the terminal UI talks to.
pub trait Repository {
    fn record_history(
        &self,
        command: &str,
        output: &str,
        status: CommandStatus,
        directory: &str,
    ) -> Result<HistoryEntry>;
    fn history(&self, search: Option<&str>, limit: usize) -> Result<Vec<HistoryEntry>>;

    fn add_favorite(&self, command: &str, description: &str) -> Result<Favorite>;
    fn remove_favorite(&self, id: &str) -> Result<()>;
    fn favorites(&self) -> Result<Vec<Favorite>>;
    fn is_favorite(&self, command: &str) -> Result<bool>;

    fn share_command(
        &self,
        session_id: &str,
        user: &str,
        command: &str,
        output: &str,
    ) -> Result<SharedCommand>;
    /// Start following `session_id`. Only commands shared after this call
    /// are returned by [`Repository::poll_feed`].
    fn subscribe(&self, session_id: &str) -> Result<SharedFeed>;
    /// Commands shared into the feed's session since the last poll, by any
    /// process writing to the same database. Oldest first.
    fn poll_feed(&self, feed: &mut SharedFeed) -> Result<Vec<SharedCommand>>;
}

/// Read position in one session's shared command log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SharedFeed {
    pub session_id: String,
    last_seq: i64,
}

pub struct Store {
    pub conn: Connection,
}

impl Store {
    pub fn open() -> Result<Self> {
        Self::open_at(&config::db_path()?)
    }

    pub fn open_at(db_path: &Path) -> Result<Self> {
        let conn = Connection::open(db_path)
            .with_context(|| format!("failed to open database at {}", db_path.display()))?;
        conn.execute_batch(
            "PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON; PRAGMA busy_timeout=5000;",
        )?;
        Ok(Store { conn })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        let store = Store { conn };
        store.migrate()?;
        Ok(store)
    }

    pub fn migrate(&self) -> Result<()> {
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS command_history (
                id TEXT PRIMARY KEY,
                command TEXT NOT NULL,
                output TEXT NOT NULL DEFAULT '',
                status TEXT NOT NULL DEFAULT 'success',
                directory TEXT NOT NULL DEFAULT '',
                created_at TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE TABLE IF NOT EXISTS favorites (
                id TEXT PRIMARY KEY,
                command TEXT NOT NULL UNIQUE,
                description TEXT NOT NULL DEFAULT '',
                created_at TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE TABLE IF NOT EXISTS terminal_sessions (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                owner TEXT NOT NULL,
                created_at TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE TABLE IF NOT EXISTS session_members (
                session_id TEXT NOT NULL REFERENCES terminal_sessions(id) ON DELETE CASCADE,
                user TEXT NOT NULL,
                joined_at TEXT NOT NULL DEFAULT (datetime('now')),
                PRIMARY KEY (session_id, user)
            );

            CREATE TABLE IF NOT EXISTS shared_commands (
                id TEXT PRIMARY KEY,
                session_id TEXT NOT NULL REFERENCES terminal_sessions(id) ON DELETE CASCADE,
                user TEXT NOT NULL,
                command TEXT NOT NULL,
                output TEXT NOT NULL DEFAULT '',
                created_at TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE TABLE IF NOT EXISTS shared_snippets (
                id TEXT PRIMARY KEY,
                session_id TEXT NOT NULL REFERENCES terminal_sessions(id) ON DELETE CASCADE,
                name TEXT NOT NULL,
                command TEXT NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                tags TEXT NOT NULL DEFAULT '[]',
                created_by TEXT NOT NULL,
                created_at TEXT NOT NULL DEFAULT (datetime('now'))
            );
            ",
        )?;
        Ok(())
    }

    pub fn subscribe(&self, session_id: &str) -> Result<SharedFeed> {
        Ok(SharedFeed {
            session_id: session_id.to_string(),
            last_seq: self.last_shared_seq(session_id)?,
        })
    }

    pub fn poll_feed(&self, feed: &mut SharedFeed) -> Result<Vec<SharedCommand>> {
        let fresh = self.shared_after(&feed.session_id, feed.last_seq)?;
        if let Some(last) = fresh.last() {
            feed.last_seq = last.seq;
        }
        Ok(fresh)
    }
}

impl Repository for Store {
    fn record_history(
        &self,
        command: &str,
        output: &str,
        status: CommandStatus,
        directory: &str,
    ) -> Result<HistoryEntry> {
        Store::record_history(self, command, output, status, directory)
    }

    fn history(&self, search: Option<&str>, limit: usize) -> Result<Vec<HistoryEntry>> {
        Store::history(self, search, limit)
    }

    fn add_favorite(&self, command: &str, description: &str) -> Result<Favorite> {
        Store::add_favorite(self, command, description)
    }

    fn remove_favorite(&self, id: &str) -> Result<()> {
        Store::remove_favorite(self, id)
    }

    fn favorites(&self) -> Result<Vec<Favorite>> {
        Store::favorites(self)
    }

    fn is_favorite(&self, command: &str) -> Result<bool> {
        Store::is_favorite(self, command)
    }

    fn share_command(
        &self,
        session_id: &str,
        user: &str,
        command: &str,
        output: &str,
    ) -> Result<SharedCommand> {
        Store::share_command(self, session_id, user, command, output)
    }

    fn subscribe(&self, session_id: &str) -> Result<SharedFeed> {
        Store::subscribe(self, session_id)
    }

    fn poll_feed(&self, feed: &mut SharedFeed) -> Result<Vec<SharedCommand>> {
        Store::poll_feed(self, feed)
    }
}
