use anyhow::{Context, Result, bail};
use rusqlite::{OptionalExtension, Row, params};
use uuid::Uuid;

use super::Store;
use super::models::{
    CommandStatus, Favorite, HistoryEntry, SessionMember, SharedCommand, SharedSnippet,
    TerminalSession,
};

fn history_from_row(row: &Row<'_>) -> rusqlite::Result<HistoryEntry> {
    let status_str: String = row.get(3)?;
    Ok(HistoryEntry {
        id: row.get(0)?,
        command: row.get(1)?,
        output: row.get(2)?,
        status: CommandStatus::from_str(&status_str),
        directory: row.get(4)?,
        created_at: row.get(5)?,
    })
}

fn favorite_from_row(row: &Row<'_>) -> rusqlite::Result<Favorite> {
    Ok(Favorite {
        id: row.get(0)?,
        command: row.get(1)?,
        description: row.get(2)?,
        created_at: row.get(3)?,
    })
}

fn shared_from_row(row: &Row<'_>) -> rusqlite::Result<SharedCommand> {
    Ok(SharedCommand {
        id: row.get(0)?,
        session_id: row.get(1)?,
        user: row.get(2)?,
        command: row.get(3)?,
        output: row.get(4)?,
        created_at: row.get(5)?,
        seq: row.get(6)?,
    })
}

impl Store {
    // ── History ──

    pub fn record_history(
        &self,
        command: &str,
        output: &str,
        status: CommandStatus,
        directory: &str,
    ) -> Result<HistoryEntry> {
        let id = Uuid::new_v4().to_string();
        self.conn.execute(
            "INSERT INTO command_history (id, command, output, status, directory)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![id, command, output, status.as_str(), directory],
        )?;
        let entry = self.conn.query_row(
            "SELECT id, command, output, status, directory, created_at
             FROM command_history WHERE id = ?1",
            params![id],
            history_from_row,
        )?;
        Ok(entry)
    }

    /// Newest first. `search` is a case-insensitive substring of the command.
    pub fn history(&self, search: Option<&str>, limit: usize) -> Result<Vec<HistoryEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, command, output, status, directory, created_at
             FROM command_history
             WHERE ?1 IS NULL OR instr(lower(command), lower(?1)) > 0
             ORDER BY created_at DESC, rowid DESC
             LIMIT ?2",
        )?;
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let entries = stmt
            .query_map(params![search, limit], history_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    pub fn clear_history(&self) -> Result<()> {
        self.conn.execute("DELETE FROM command_history", [])?;
        Ok(())
    }

    // ── Favorites ──

    /// Adding a command that is already a favorite returns the existing row.
    pub fn add_favorite(&self, command: &str, description: &str) -> Result<Favorite> {
        let id = Uuid::new_v4().to_string();
        self.conn.execute(
            "INSERT OR IGNORE INTO favorites (id, command, description) VALUES (?1, ?2, ?3)",
            params![id, command, description],
        )?;
        let favorite = self.conn.query_row(
            "SELECT id, command, description, created_at FROM favorites WHERE command = ?1",
            params![command],
            favorite_from_row,
        )?;
        Ok(favorite)
    }

    pub fn remove_favorite(&self, id: &str) -> Result<()> {
        self.conn
            .execute("DELETE FROM favorites WHERE id = ?1", params![id])?;
        Ok(())
    }

    pub fn favorites(&self) -> Result<Vec<Favorite>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, command, description, created_at FROM favorites
             ORDER BY created_at DESC, rowid DESC",
        )?;
        let favorites = stmt
            .query_map([], favorite_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(favorites)
    }

    pub fn is_favorite(&self, command: &str) -> Result<bool> {
        let found = self
            .conn
            .query_row(
                "SELECT 1 FROM favorites WHERE command = ?1",
                params![command],
                |_| Ok(()),
            )
            .optional()?;
        Ok(found.is_some())
    }

    // ── Collaboration sessions ──

    /// Create a session with `owner` as its first member.
    pub fn create_session(&self, name: &str, owner: &str) -> Result<TerminalSession> {
        let id = Uuid::new_v4().to_string();
        self.conn.execute(
            "INSERT INTO terminal_sessions (id, name, owner) VALUES (?1, ?2, ?3)",
            params![id, name, owner],
        )?;
        self.join_session(&id, owner)?;
        self.get_session(&id)
    }

    pub fn get_session(&self, id: &str) -> Result<TerminalSession> {
        let session = self
            .conn
            .query_row(
                "SELECT id, name, owner, created_at FROM terminal_sessions WHERE id = ?1",
                params![id],
                |row| {
                    Ok(TerminalSession {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        owner: row.get(2)?,
                        created_at: row.get(3)?,
                    })
                },
            )
            .with_context(|| format!("no session with id {id}"))?;
        Ok(session)
    }

    pub fn join_session(&self, session_id: &str, user: &str) -> Result<()> {
        self.get_session(session_id)?;
        self.conn.execute(
            "INSERT OR IGNORE INTO session_members (session_id, user) VALUES (?1, ?2)",
            params![session_id, user],
        )?;
        Ok(())
    }

    pub fn leave_session(&self, session_id: &str, user: &str) -> Result<()> {
        self.conn.execute(
            "DELETE FROM session_members WHERE session_id = ?1 AND user = ?2",
            params![session_id, user],
        )?;
        Ok(())
    }

    pub fn members(&self, session_id: &str) -> Result<Vec<SessionMember>> {
        let mut stmt = self.conn.prepare(
            "SELECT session_id, user, joined_at FROM session_members
             WHERE session_id = ?1 ORDER BY joined_at, rowid",
        )?;
        let members = stmt
            .query_map(params![session_id], |row| {
                Ok(SessionMember {
                    session_id: row.get(0)?,
                    user: row.get(1)?,
                    joined_at: row.get(2)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(members)
    }

    /// Record a command run inside a shared session. Only members may share.
    pub fn share_command(
        &self,
        session_id: &str,
        user: &str,
        command: &str,
        output: &str,
    ) -> Result<SharedCommand> {
        let is_member = self
            .conn
            .query_row(
                "SELECT 1 FROM session_members WHERE session_id = ?1 AND user = ?2",
                params![session_id, user],
                |_| Ok(()),
            )
            .optional()?
            .is_some();
        if !is_member {
            bail!("{user} is not a member of session {session_id}");
        }

        let id = Uuid::new_v4().to_string();
        self.conn.execute(
            "INSERT INTO shared_commands (id, session_id, user, command, output)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![id, session_id, user, command, output],
        )?;
        let shared = self.conn.query_row(
            "SELECT id, session_id, user, command, output, created_at, rowid
             FROM shared_commands WHERE id = ?1",
            params![id],
            shared_from_row,
        )?;
        Ok(shared)
    }

    /// Oldest first.
    pub fn shared_commands(&self, session_id: &str) -> Result<Vec<SharedCommand>> {
        self.shared_after(session_id, 0)
    }

    /// Commands shared into `session_id` with a `seq` above `after`, oldest first.
    pub fn shared_after(&self, session_id: &str, after: i64) -> Result<Vec<SharedCommand>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, session_id, user, command, output, created_at, rowid
             FROM shared_commands WHERE session_id = ?1 AND rowid > ?2
             ORDER BY rowid",
        )?;
        let commands = stmt
            .query_map(params![session_id, after], shared_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(commands)
    }

    pub fn last_shared_seq(&self, session_id: &str) -> Result<i64> {
        let seq = self.conn.query_row(
            "SELECT COALESCE(MAX(rowid), 0) FROM shared_commands WHERE session_id = ?1",
            params![session_id],
            |row| row.get(0),
        )?;
        Ok(seq)
    }

    // ── Snippets ──

    pub fn save_snippet(
        &self,
        session_id: &str,
        name: &str,
        command: &str,
        description: &str,
        tags: &[String],
        created_by: &str,
    ) -> Result<SharedSnippet> {
        self.get_session(session_id)?;
        let id = Uuid::new_v4().to_string();
        let tags_json = serde_json::to_string(tags)?;
        self.conn.execute(
            "INSERT INTO shared_snippets (id, session_id, name, command, description, tags, created_by)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![id, session_id, name, command, description, tags_json, created_by],
        )?;
        let snippet = self
            .snippets(session_id)?
            .into_iter()
            .find(|s| s.id == id)
            .context("snippet vanished after insert")?;
        Ok(snippet)
    }

    pub fn snippets(&self, session_id: &str) -> Result<Vec<SharedSnippet>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, session_id, name, command, description, tags, created_by, created_at
             FROM shared_snippets WHERE session_id = ?1
             ORDER BY name",
        )?;
        let rows = stmt
            .query_map(params![session_id], |row| {
                let tags: String = row.get(5)?;
                Ok((
                    SharedSnippet {
                        id: row.get(0)?,
                        session_id: row.get(1)?,
                        name: row.get(2)?,
                        command: row.get(3)?,
                        description: row.get(4)?,
                        tags: Vec::new(),
                        created_by: row.get(6)?,
                        created_at: row.get(7)?,
                    },
                    tags,
                ))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(mut snippet, tags)| {
                snippet.tags = serde_json::from_str(&tags)
                    .with_context(|| format!("bad tags on snippet {}", snippet.id))?;
                Ok(snippet)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Repository;

    #[test]
    fn test_history_is_newest_first() {
        let store = Store::open_in_memory().unwrap();
        store
            .record_history("ls", "a  b", CommandStatus::Success, "/home/user")
            .unwrap();
        store
            .record_history("bogus", "Command not found", CommandStatus::Error, "/tmp")
            .unwrap();

        let entries = store.history(None, 10).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].command, "bogus");
        assert_eq!(entries[0].status, CommandStatus::Error);
        assert_eq!(entries[0].directory, "/tmp");
        assert_eq!(entries[1].command, "ls");
    }

    #[test]
    fn test_history_search_and_limit() {
        let store = Store::open_in_memory().unwrap();
        for cmd in ["git status", "ls", "GIT log", "pwd"] {
            store
                .record_history(cmd, "", CommandStatus::Success, "/")
                .unwrap();
        }

        let git: Vec<String> = store
            .history(Some("git"), 10)
            .unwrap()
            .into_iter()
            .map(|e| e.command)
            .collect();
        assert_eq!(git, vec!["GIT log", "git status"]);

        assert_eq!(store.history(None, 3).unwrap().len(), 3);
        assert!(store.history(Some("nothing"), 10).unwrap().is_empty());
    }

    #[test]
    fn test_clear_history() {
        let store = Store::open_in_memory().unwrap();
        store
            .record_history("ls", "", CommandStatus::Success, "/")
            .unwrap();
        store.clear_history().unwrap();
        assert!(store.history(None, 10).unwrap().is_empty());
    }

    #[test]
    fn test_favorites_are_idempotent() {
        let store = Store::open_in_memory().unwrap();
        let first = store.add_favorite("git status", "").unwrap();
        let again = store.add_favorite("git status", "ignored").unwrap();
        assert_eq!(first.id, again.id);
        assert_eq!(store.favorites().unwrap().len(), 1);
        assert!(store.is_favorite("git status").unwrap());
        assert!(!store.is_favorite("ls").unwrap());

        store.remove_favorite(&first.id).unwrap();
        assert!(store.favorites().unwrap().is_empty());
        assert!(!store.is_favorite("git status").unwrap());
    }

    #[test]
    fn test_session_membership() {
        let store = Store::open_in_memory().unwrap();
        let session = store.create_session("pairing", "alice").unwrap();
        assert_eq!(session.owner, "alice");

        store.join_session(&session.id, "bob").unwrap();
        store.join_session(&session.id, "bob").unwrap();
        let users: Vec<String> = store
            .members(&session.id)
            .unwrap()
            .into_iter()
            .map(|m| m.user)
            .collect();
        assert_eq!(users, vec!["alice", "bob"]);

        store.leave_session(&session.id, "alice").unwrap();
        assert_eq!(store.members(&session.id).unwrap().len(), 1);
    }

    #[test]
    fn test_join_unknown_session_fails() {
        let store = Store::open_in_memory().unwrap();
        let err = store.join_session("missing", "bob").unwrap_err();
        assert!(format!("{err:#}").contains("no session with id missing"));
    }

    #[test]
    fn test_share_requires_membership() {
        let store = Store::open_in_memory().unwrap();
        let session = store.create_session("s", "alice").unwrap();
        assert!(store.share_command(&session.id, "mallory", "ls", "").is_err());

        store.share_command(&session.id, "alice", "ls", "a").unwrap();
        store.share_command(&session.id, "alice", "pwd", "/").unwrap();
        let log: Vec<String> = store
            .shared_commands(&session.id)
            .unwrap()
            .into_iter()
            .map(|c| c.command)
            .collect();
        assert_eq!(log, vec!["ls", "pwd"]);
    }

    #[test]
    fn test_feed_only_returns_new_commands() {
        let store = Store::open_in_memory().unwrap();
        let session = store.create_session("s", "alice").unwrap();
        let other = store.create_session("other", "alice").unwrap();
        store.share_command(&session.id, "alice", "before", "").unwrap();

        let mut feed = store.subscribe(&session.id).unwrap();
        let mut other_feed = Repository::subscribe(&store, &other.id).unwrap();
        assert!(store.poll_feed(&mut feed).unwrap().is_empty());

        let sent = store.share_command(&session.id, "alice", "ls", "a").unwrap();
        assert_eq!(store.poll_feed(&mut feed).unwrap(), vec![sent]);
        assert!(store.poll_feed(&mut feed).unwrap().is_empty());
        assert!(store.poll_feed(&mut other_feed).unwrap().is_empty());
    }

    #[test]
    fn test_feed_sees_commands_from_another_connection() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pandora.db");
        let ada = Store::open_at(&path).unwrap();
        ada.migrate().unwrap();
        let bob = Store::open_at(&path).unwrap();
        bob.migrate().unwrap();

        let session = ada.create_session("pair", "ada").unwrap();
        bob.join_session(&session.id, "bob").unwrap();
        let mut feed = ada.subscribe(&session.id).unwrap();

        bob.share_command(&session.id, "bob", "git status", "clean")
            .unwrap();
        bob.share_command(&session.id, "bob", "git log", "").unwrap();

        let seen: Vec<String> = ada
            .poll_feed(&mut feed)
            .unwrap()
            .into_iter()
            .map(|c| c.command)
            .collect();
        assert_eq!(seen, vec!["git status", "git log"]);
        assert!(ada.poll_feed(&mut feed).unwrap().is_empty());
    }

    #[test]
    fn test_snippets_keep_tags() {
        let store = Store::open_in_memory().unwrap();
        let session = store.create_session("s", "alice").unwrap();
        let tags = vec!["deploy".to_string(), "k8s".to_string()];
        store
            .save_snippet(&session.id, "rollout", "kubectl rollout status", "", &tags, "alice")
            .unwrap();
        store
            .save_snippet(&session.id, "build", "docker build .", "image", &[], "alice")
            .unwrap();

        let snippets = store.snippets(&session.id).unwrap();
        assert_eq!(snippets.len(), 2);
        assert_eq!(snippets[0].name, "build");
        assert_eq!(snippets[1].tags, tags);
    }

    #[test]
    fn test_repository_trait_object() {
        let store = Store::open_in_memory().unwrap();
        let repo: &dyn Repository = &store;
        repo.record_history("ls", "", CommandStatus::Success, "/")
            .unwrap();
        repo.add_favorite("ls", "").unwrap();
        assert_eq!(repo.history(Some("ls"), 5).unwrap().len(), 1);
        assert!(repo.is_favorite("ls").unwrap());
    }
}
