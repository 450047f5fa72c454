use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandStatus {
    Success,
    Error,
}

impl CommandStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CommandStatus::Success => "success",
            CommandStatus::Error => "error",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s {
            "error" => CommandStatus::Error,
            _ => CommandStatus::Success,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            CommandStatus::Success => "✓",
            CommandStatus::Error => "✗",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: String,
    pub command: String,
    pub output: String,
    pub status: CommandStatus,
    pub directory: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Favorite {
    pub id: String,
    pub command: String,
    pub description: String,
    pub created_at: String,
}

/// A shared terminal session other users can join.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TerminalSession {
    pub id: String,
    pub name: String,
    pub owner: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionMember {
    pub session_id: String,
    pub user: String,
    pub joined_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SharedCommand {
    pub id: String,
    pub session_id: String,
    pub user: String,
    pub command: String,
    pub output: String,
    pub created_at: String,
    /// Insertion order across every writer of the database.
    pub seq: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SharedSnippet {
    pub id: String,
    pub session_id: String,
    pub name: String,
    pub command: String,
    pub description: String,
    pub tags: Vec<String>,
    pub created_by: String,
    pub created_at: String,
}
