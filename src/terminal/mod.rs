//! The tab/session state machine.
//!
//! [`Terminal`] owns every tab and is the only writer of their state. All
//! command submissions go through [`Terminal::submit_command`], which runs
//! the line through the corrector and the dispatcher and appends the echoed
//! command plus its result to the active tab.

mod tab;

pub use tab::{LineKind, OutputLine, Tab};

use std::panic::{self, AssertUnwindSafe};

use crate::assist::{Correction, correct_command};
use crate::command::{CommandResult, Dispatcher, ResultKind};

/// How new tabs are set up.
#[derive(Debug, Clone)]
pub struct TerminalSettings {
    pub user: String,
    /// Starting directory for new tabs; the filesystem's home when unset.
    pub initial_directory: Option<String>,
    /// Run fixes for well-known typos (`gti`, `sl`, ...) instead of the
    /// line as typed. Fuzzy matches are only ever offered as hints.
    pub auto_correct: bool,
}

/// Commands the corrector is never allowed to produce on its own.
const NEVER_AUTO_RUN: &[&str] = &["rm", "mv", "cp"];

impl Default for TerminalSettings {
    fn default() -> Self {
        TerminalSettings {
            user: "user".to_string(),
            initial_directory: None,
            auto_correct: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The tab's scrollback was reset.
    Cleared,
    Completed(CommandResult),
}

/// Everything that happened for one submitted line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub tab_id: String,
    pub command: String,
    /// The line actually run, when the corrector changed it.
    pub corrected: Option<String>,
    /// Working directory the command ran in.
    pub directory: String,
    pub outcome: Outcome,
}

impl Submission {
    pub fn kind(&self) -> ResultKind {
        match &self.outcome {
            Outcome::Cleared => ResultKind::Output,
            Outcome::Completed(result) => result.kind,
        }
    }
}

pub struct Terminal {
    tabs: Vec<Tab>,
    active: String,
    dispatcher: Dispatcher,
    settings: TerminalSettings,
    computer_name: String,
}

impl Terminal {
    /// Start a session with a single tab.
    pub fn new(dispatcher: Dispatcher, settings: TerminalSettings) -> Self {
        let computer_name = match dispatcher.file_system().computer_name() {
            Ok(name) => name,
            Err(e) => {
                tracing::warn!("failed to look up computer name: {e:#}");
                "Computer".to_string()
            }
        };
        let first = Self::make_tab(&dispatcher, &settings, &computer_name);
        Terminal {
            active: first.id.clone(),
            tabs: vec![first],
            dispatcher,
            settings,
            computer_name,
        }
    }

    fn make_tab(dispatcher: &Dispatcher, settings: &TerminalSettings, computer: &str) -> Tab {
        let directory = settings
            .initial_directory
            .clone()
            .unwrap_or_else(|| dispatcher.file_system().home_dir());
        Tab::new(format!("{}@{computer}", settings.user), directory)
    }

    pub fn tabs(&self) -> &[Tab] {
        &self.tabs
    }

    pub fn active_tab_id(&self) -> &str {
        &self.active
    }

    pub fn active_tab(&self) -> &Tab {
        // `active` always names a live tab and `tabs` is never empty.
        let i = self.active_index();
        &self.tabs[i]
    }

    pub fn active_tab_mut(&mut self) -> &mut Tab {
        let i = self.active_index();
        &mut self.tabs[i]
    }

    fn active_index(&self) -> usize {
        self.tabs
            .iter()
            .position(|t| t.id == self.active)
            .unwrap_or(self.tabs.len() - 1)
    }

    pub fn computer_name(&self) -> &str {
        &self.computer_name
    }

    pub fn settings(&self) -> &TerminalSettings {
        &self.settings
    }

    /// Open a new tab and make it active. Returns its id.
    pub fn add_tab(&mut self) -> String {
        let tab = Self::make_tab(&self.dispatcher, &self.settings, &self.computer_name);
        let id = tab.id.clone();
        tracing::info!(tab = %id, "tab added");
        self.tabs.push(tab);
        self.active = id.clone();
        id
    }

    /// Close a tab. The last remaining tab cannot be closed. Returns whether
    /// a tab was removed.
    pub fn close_tab(&mut self, id: &str) -> bool {
        if self.tabs.len() <= 1 {
            return false;
        }
        let Some(pos) = self.tabs.iter().position(|t| t.id == id) else {
            return false;
        };
        self.tabs.remove(pos);
        if self.active == id
            && let Some(last) = self.tabs.last()
        {
            self.active = last.id.clone();
        }
        tracing::info!(tab = %id, "tab closed");
        true
    }

    /// Switch to the tab with `id`. Unknown ids are ignored.
    pub fn set_active_tab(&mut self, id: &str) -> bool {
        if self.tabs.iter().any(|t| t.id == id) {
            self.active = id.to_string();
            true
        } else {
            false
        }
    }

    /// Move to the next (or previous) tab, wrapping around.
    pub fn cycle_tab(&mut self, forward: bool) {
        let len = self.tabs.len();
        let i = self.active_index();
        let next = if forward { (i + 1) % len } else { (i + len - 1) % len };
        self.active = self.tabs[next].id.clone();
    }

    /// Empty the active tab's scrollback without touching its history.
    pub fn clear_output(&mut self) {
        self.active_tab_mut().clear_lines();
    }

    /// Run `text` in the active tab. Blank input does nothing.
    pub fn submit_command(&mut self, text: &str) -> Option<Submission> {
        if text.trim().is_empty() {
            return None;
        }

        let auto_correct = self.settings.auto_correct;
        let i = self.active_index();
        let tab = &mut self.tabs[i];
        tab.record_command(text);
        let directory = tab.directory.clone();

        let correction = correct_command(text);
        let corrected = (auto_correct && applies_unasked(&correction)).then_some(correction.corrected);
        let line = corrected.as_deref().unwrap_or(text);

        if line.trim().eq_ignore_ascii_case("clear") {
            tab.clear_lines();
            return Some(Submission {
                tab_id: tab.id.clone(),
                command: text.to_string(),
                corrected,
                directory,
                outcome: Outcome::Cleared,
            });
        }
        tab.push_line(LineKind::Command, line);

        let dispatcher = &self.dispatcher;
        let run = panic::catch_unwind(AssertUnwindSafe(|| {
            dispatcher.execute_command(line, &directory)
        }));
        let result = match run {
            Ok(execution) => {
                if let Some(dir) = execution.directory {
                    tab.title = dir_title(&dir);
                    tab.directory = dir;
                }
                execution.result
            }
            Err(payload) => {
                let message = payload
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .filter(|s| !s.is_empty())
                    .unwrap_or_else(|| "An error occurred".to_string());
                tracing::error!(command = line, "command panicked: {message}");
                CommandResult::error(message)
            }
        };
        tab.push_line(result.kind.into(), result.content.clone());

        Some(Submission {
            tab_id: tab.id.clone(),
            command: text.to_string(),
            corrected,
            directory,
            outcome: Outcome::Completed(result),
        })
    }
}

fn applies_unasked(correction: &Correction) -> bool {
    let command = correction
        .corrected
        .split_whitespace()
        .next()
        .unwrap_or_default()
        .to_lowercase();
    correction.is_correction && correction.known_typo && !NEVER_AUTO_RUN.contains(&command.as_str())
}

/// Last path component, or the path itself for `/`.
fn dir_title(dir: &str) -> String {
    dir.trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|s| !s.is_empty())
        .unwrap_or("/")
        .to_string()
}
