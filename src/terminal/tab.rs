use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::command::ResultKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineKind {
    Command,
    Output,
    Error,
}

impl LineKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LineKind::Command => "command",
            LineKind::Output => "output",
            LineKind::Error => "error",
        }
    }
}

impl From<ResultKind> for LineKind {
    fn from(kind: ResultKind) -> Self {
        match kind {
            ResultKind::Output => LineKind::Output,
            ResultKind::Error => LineKind::Error,
        }
    }
}

/// One entry in a tab's scrollback. Never mutated after it is appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputLine {
    pub id: u64,
    pub content: String,
    pub kind: LineKind,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct Tab {
    pub id: String,
    pub title: String,
    pub directory: String,
    output_lines: Vec<OutputLine>,
    command_history: Vec<String>,
    /// Offset from the newest history entry; `None` when not browsing.
    history_index: Option<usize>,
    /// What the user had typed before the first step into history.
    draft: String,
    next_line_id: u64,
}

impl Tab {
    pub fn new(title: impl Into<String>, directory: impl Into<String>) -> Self {
        Tab {
            id: Uuid::new_v4().to_string(),
            title: title.into(),
            directory: directory.into(),
            output_lines: Vec::new(),
            command_history: Vec::new(),
            history_index: None,
            draft: String::new(),
            next_line_id: 0,
        }
    }

    pub fn output_lines(&self) -> &[OutputLine] {
        &self.output_lines
    }

    pub fn command_history(&self) -> &[String] {
        &self.command_history
    }

    pub fn history_index(&self) -> Option<usize> {
        self.history_index
    }

    pub(super) fn push_line(&mut self, kind: LineKind, content: impl Into<String>) {
        // Ids keep increasing across clears so they stay unique for the tab's lifetime.
        let id = self.next_line_id;
        self.next_line_id += 1;
        self.output_lines.push(OutputLine {
            id,
            content: content.into(),
            kind,
            timestamp: Utc::now(),
        });
    }

    pub(super) fn clear_lines(&mut self) {
        self.output_lines.clear();
    }

    pub(super) fn record_command(&mut self, text: &str) {
        self.command_history.push(text.to_string());
        self.history_index = None;
        self.draft.clear();
    }

    /// Step back to an older command. `current_input` is kept as the draft
    /// when browsing starts. Returns the text to display, or `None` when
    /// there is nothing older.
    pub fn history_previous(&mut self, current_input: &str) -> Option<&str> {
        let next = match self.history_index {
            None if self.command_history.is_empty() => return None,
            None => {
                self.draft = current_input.to_string();
                0
            }
            Some(i) if i + 1 < self.command_history.len() => i + 1,
            Some(_) => return None,
        };
        self.history_index = Some(next);
        self.history_entry(next)
    }

    /// Step forward to a newer command, ending on the saved draft. Returns
    /// `None` when not browsing.
    pub fn history_next(&mut self) -> Option<String> {
        match self.history_index? {
            0 => {
                self.history_index = None;
                Some(std::mem::take(&mut self.draft))
            }
            i => {
                self.history_index = Some(i - 1);
                self.history_entry(i - 1).map(ToString::to_string)
            }
        }
    }

    fn history_entry(&self, offset: usize) -> Option<&str> {
        let len = self.command_history.len();
        self.command_history
            .get(len.checked_sub(offset + 1)?)
            .map(String::as_str)
    }
}
