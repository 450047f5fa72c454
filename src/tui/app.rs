use std::time::Duration;

use anyhow::Result;
use crossterm::event::{KeyCode, KeyModifiers};
use ratatui::DefaultTerminal;

use crate::assist::{Correction, Predictor, correct_command};
use crate::command::ResultKind;
use crate::store::{
    CommandStatus, Favorite, HistoryEntry, Repository, SharedCommand, SharedFeed,
};
use crate::terminal::{Outcome, Submission, Terminal};

use super::event::{self, AppEvent};
use super::keymap::{Action, KeyMap};
use super::theme::Theme;
use super::ui;

/// How many stored commands are replayed into the predictor at startup.
const SEED_LIMIT: usize = 500;
const PANEL_LIMIT: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Prompt,
    History,
    Favorites,
    Help,
}

#[derive(Debug, Clone)]
pub struct StatusMessage {
    pub text: String,
    pub is_error: bool,
}

/// A shared session this instance broadcasts into and listens to.
pub struct Share {
    pub session_id: String,
    feed: SharedFeed,
}

pub struct App {
    pub terminal: Terminal,
    pub predictor: Predictor,
    repo: Box<dyn Repository>,
    pub keymap: KeyMap,
    pub theme: Theme,
    pub user: String,
    pub record_history: bool,
    pub should_quit: bool,
    pub mode: Mode,

    // Prompt
    pub input: String,
    pub suggestions: Vec<String>,

    // History / favorites panel
    pub search: String,
    pub history_items: Vec<HistoryEntry>,
    pub favorite_items: Vec<Favorite>,
    pub panel_index: usize,

    pub share: Option<Share>,
    pub shared_feed: Vec<SharedCommand>,
    pub status: Option<StatusMessage>,
}

impl App {
    pub fn new(
        terminal: Terminal,
        repo: Box<dyn Repository>,
        theme: Theme,
        record_history: bool,
    ) -> Self {
        let mut predictor = Predictor::new();
        match repo.history(None, SEED_LIMIT) {
            Ok(entries) => {
                for entry in entries.iter().rev() {
                    predictor.add_command(&entry.command, std::slice::from_ref(&entry.directory));
                }
            }
            Err(e) => tracing::warn!("failed to load history for suggestions: {e:#}"),
        }

        let user = terminal.settings().user.clone();
        App {
            terminal,
            predictor,
            repo,
            keymap: KeyMap::default_keymap(),
            theme,
            user,
            record_history,
            should_quit: false,
            mode: Mode::Prompt,
            input: String::new(),
            suggestions: Vec::new(),
            search: String::new(),
            history_items: Vec::new(),
            favorite_items: Vec::new(),
            panel_index: 0,
            share: None,
            shared_feed: Vec::new(),
            status: None,
        }
    }

    /// Broadcast submitted commands into `session_id` and show what others share.
    pub fn attach_share(&mut self, session_id: &str) -> Result<()> {
        let feed = self.repo.subscribe(session_id)?;
        self.share = Some(Share {
            session_id: session_id.to_string(),
            feed,
        });
        Ok(())
    }

    pub fn run(&mut self, terminal: &mut DefaultTerminal) -> Result<()> {
        let tick_rate = Duration::from_millis(250);

        loop {
            terminal.draw(|frame| ui::draw(frame, self))?;

            match event::poll(tick_rate)? {
                AppEvent::Key(key) => self.handle_key(key.code, key.modifiers),
                AppEvent::Tick => self.drain_shared(),
            }

            if self.should_quit {
                return Ok(());
            }
        }
    }

    fn context(&self) -> Vec<String> {
        vec![self.terminal.active_tab().directory.clone()]
    }

    /// The live typo hint for the current input, if any.
    pub fn correction(&self) -> Option<Correction> {
        Some(correct_command(&self.input)).filter(|c| c.is_correction)
    }

    fn set_status(&mut self, text: impl Into<String>, is_error: bool) {
        self.status = Some(StatusMessage {
            text: text.into(),
            is_error,
        });
    }

    fn refresh_suggestions(&mut self) {
        self.suggestions = self.predictor.predict_next(&self.input, &self.context());
    }

    fn set_input(&mut self, text: String) {
        self.input = text;
        self.refresh_suggestions();
    }

    pub fn handle_key(&mut self, code: KeyCode, modifiers: KeyModifiers) {
        match self.mode {
            Mode::Prompt => self.handle_prompt_key(code, modifiers),
            Mode::History | Mode::Favorites => self.handle_panel_key(code, modifiers),
            Mode::Help => self.mode = Mode::Prompt,
        }
    }

    fn handle_prompt_key(&mut self, code: KeyCode, modifiers: KeyModifiers) {
        if let Some(action) = self.keymap.lookup_prompt(code, modifiers) {
            self.perform(action);
            return;
        }
        match code {
            KeyCode::Char(c) if !modifiers.contains(KeyModifiers::CONTROL) => {
                self.input.push(c);
                self.refresh_suggestions();
            }
            KeyCode::Backspace => {
                self.input.pop();
                self.refresh_suggestions();
            }
            KeyCode::Esc => {
                self.input.clear();
                self.suggestions.clear();
            }
            _ => {}
        }
    }

    fn handle_panel_key(&mut self, code: KeyCode, modifiers: KeyModifiers) {
        if let Some(action) = self.keymap.lookup_panel(code, modifiers) {
            self.perform(action);
            return;
        }
        if self.mode != Mode::History {
            return;
        }
        match code {
            KeyCode::Char(c) if !modifiers.contains(KeyModifiers::CONTROL) => {
                self.search.push(c);
                self.load_history();
            }
            KeyCode::Backspace => {
                self.search.pop();
                self.load_history();
            }
            _ => {}
        }
    }

    fn perform(&mut self, action: Action) {
        match action {
            Action::Submit => self.submit(),
            Action::HistoryPrevious => {
                let input = self.input.clone();
                if let Some(text) = self.terminal.active_tab_mut().history_previous(&input) {
                    let text = text.to_string();
                    self.set_input(text);
                }
            }
            Action::HistoryNext => {
                if let Some(text) = self.terminal.active_tab_mut().history_next() {
                    self.set_input(text);
                }
            }
            Action::AcceptSuggestion => {
                let accepted = self
                    .suggestions
                    .first()
                    .cloned()
                    .or_else(|| self.correction().map(|c| c.corrected));
                if let Some(text) = accepted {
                    self.set_input(text);
                }
            }
            Action::ClearScreen => self.terminal.clear_output(),
            Action::ToggleFavorite => self.toggle_favorite(),
            Action::NewTab => {
                self.terminal.add_tab();
            }
            Action::CloseTab => {
                let id = self.terminal.active_tab_id().to_string();
                if !self.terminal.close_tab(&id) {
                    self.set_status("Cannot close the last tab", true);
                }
            }
            Action::NextTab => self.terminal.cycle_tab(true),
            Action::PrevTab => self.terminal.cycle_tab(false),
            Action::ShowHistory => {
                self.search.clear();
                self.load_history();
                self.mode = Mode::History;
            }
            Action::ShowFavorites => {
                self.load_favorites();
                self.mode = Mode::Favorites;
            }
            Action::CopyShareId => self.copy_share_id(),
            Action::ShowHelp => self.mode = Mode::Help,
            Action::MoveUp => self.panel_index = self.panel_index.saturating_sub(1),
            Action::MoveDown => {
                if self.panel_index + 1 < self.panel_len() {
                    self.panel_index += 1;
                }
            }
            Action::Select => {
                let picked = match self.mode {
                    Mode::History => self.history_items.get(self.panel_index).map(|e| e.command.clone()),
                    Mode::Favorites => self.favorite_items.get(self.panel_index).map(|f| f.command.clone()),
                    Mode::Prompt | Mode::Help => None,
                };
                if let Some(command) = picked {
                    self.set_input(command);
                }
                self.mode = Mode::Prompt;
            }
            Action::DeleteItem => {
                if self.mode == Mode::Favorites
                    && let Some(id) = self.favorite_items.get(self.panel_index).map(|f| f.id.clone())
                {
                    if let Err(e) = self.repo.remove_favorite(&id) {
                        tracing::warn!("failed to remove favorite: {e:#}");
                        self.set_status("Could not remove favorite", true);
                    }
                    self.load_favorites();
                }
            }
            Action::ClosePanel => self.mode = Mode::Prompt,
            Action::Quit => self.should_quit = true,
        }
    }

    fn panel_len(&self) -> usize {
        match self.mode {
            Mode::History => self.history_items.len(),
            Mode::Favorites => self.favorite_items.len(),
            Mode::Prompt | Mode::Help => 0,
        }
    }

    fn submit(&mut self) {
        let text = std::mem::take(&mut self.input);
        self.suggestions.clear();
        let context = self.context();
        let Some(submission) = self.terminal.submit_command(&text) else {
            return;
        };
        let ran = submission.corrected.as_deref().unwrap_or(&submission.command);
        self.predictor.add_command(ran, &context);
        self.persist(&submission);
    }

    /// Store failures never interrupt the session; they only show in the status bar.
    fn persist(&mut self, submission: &Submission) {
        let (output, status) = match &submission.outcome {
            Outcome::Cleared => ("", CommandStatus::Success),
            Outcome::Completed(result) => (
                result.content.as_str(),
                match result.kind {
                    ResultKind::Output => CommandStatus::Success,
                    ResultKind::Error => CommandStatus::Error,
                },
            ),
        };
        let command = submission.corrected.as_deref().unwrap_or(&submission.command);

        if self.record_history
            && let Err(e) = self
                .repo
                .record_history(command, output, status, &submission.directory)
        {
            tracing::warn!("failed to record history: {e:#}");
            self.set_status("History could not be saved", true);
        }

        if let Some(share) = &self.share
            && let Err(e) = self
                .repo
                .share_command(&share.session_id, &self.user, command, output)
        {
            tracing::warn!("failed to share command: {e:#}");
            self.set_status(format!("Sharing failed: {e}"), true);
        }
    }

    fn toggle_favorite(&mut self) {
        let command = if self.input.trim().is_empty() {
            self.terminal.active_tab().command_history().last().cloned()
        } else {
            Some(self.input.trim().to_string())
        };
        let Some(command) = command else {
            self.set_status("Nothing to favorite yet", true);
            return;
        };

        let result = match self.repo.is_favorite(&command) {
            Ok(true) => self.repo.favorites().and_then(|all| {
                for fav in all.iter().filter(|f| f.command == command) {
                    self.repo.remove_favorite(&fav.id)?;
                }
                Ok(format!("Removed favorite: {command}"))
            }),
            Ok(false) => self
                .repo
                .add_favorite(&command, "")
                .map(|_| format!("Added favorite: {command}")),
            Err(e) => Err(e),
        };
        match result {
            Ok(message) => self.set_status(message, false),
            Err(e) => {
                tracing::warn!("failed to update favorites: {e:#}");
                self.set_status("Could not update favorites", true);
            }
        }
    }

    fn load_history(&mut self) {
        let search = Some(self.search.as_str()).filter(|s| !s.is_empty());
        match self.repo.history(search, PANEL_LIMIT) {
            Ok(items) => self.history_items = items,
            Err(e) => {
                tracing::warn!("failed to load history: {e:#}");
                self.history_items.clear();
                self.set_status("Could not load history", true);
            }
        }
        self.panel_index = 0;
    }

    fn load_favorites(&mut self) {
        match self.repo.favorites() {
            Ok(items) => self.favorite_items = items,
            Err(e) => {
                tracing::warn!("failed to load favorites: {e:#}");
                self.favorite_items.clear();
                self.set_status("Could not load favorites", true);
            }
        }
        self.panel_index = self.panel_index.min(self.favorite_items.len().saturating_sub(1));
    }

    fn copy_share_id(&mut self) {
        let Some(id) = self.share.as_ref().map(|s| s.session_id.clone()) else {
            self.set_status("Not in a shared session (start with --share <id>)", true);
            return;
        };
        let copied = arboard::Clipboard::new().and_then(|mut cb| cb.set_text(id.clone()));
        match copied {
            Ok(()) => self.set_status(format!("Copied session id {id}"), false),
            Err(e) => {
                tracing::warn!("clipboard unavailable: {e}");
                self.set_status(format!("Session id: {id}"), false);
            }
        }
    }

    /// Pull commands shared into the session since the last tick.
    pub fn drain_shared(&mut self) {
        let Some(share) = &mut self.share else {
            return;
        };
        let incoming = match self.repo.poll_feed(&mut share.feed) {
            Ok(incoming) => incoming,
            Err(e) => {
                tracing::warn!("failed to poll shared session: {e:#}");
                self.set_status("Shared session unavailable", true);
                return;
            }
        };
        for shared in incoming {
            if shared.user != self.user {
                self.set_status(format!("{} ran: {}", shared.user, shared.command), false);
            }
            self.shared_feed.push(shared);
        }
    }
}
