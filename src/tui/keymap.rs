use crossterm::event::{KeyCode, KeyModifiers};

// ── Actions ──────────────────────────────────────────────────────────

/// Every discrete action the TUI can perform in response to a key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    // Prompt
    Submit,
    HistoryPrevious,
    HistoryNext,
    AcceptSuggestion,
    ClearScreen,
    ToggleFavorite,

    // Tabs
    NewTab,
    CloseTab,
    NextTab,
    PrevTab,

    // Panels
    ShowHistory,
    ShowFavorites,
    CopyShareId,
    ShowHelp,
    MoveUp,
    MoveDown,
    Select,
    DeleteItem,
    ClosePanel,

    Quit,
}

// ── Help categories ──────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HelpCategory {
    Prompt,
    Tabs,
    Panels,
}

impl HelpCategory {
    fn label(self) -> &'static str {
        match self {
            Self::Prompt => "Prompt",
            Self::Tabs => "Tabs",
            Self::Panels => "History / Favorites",
        }
    }

    const ORDERED: &[Self] = &[Self::Prompt, Self::Tabs, Self::Panels];
}

// ── Keybinding ───────────────────────────────────────────────────────

/// A single key → action mapping with metadata for the help overlay.
#[derive(Debug, Clone)]
pub struct KeyBinding {
    pub code: KeyCode,
    pub modifiers: KeyModifiers,
    pub action: Action,
    /// Key label shown in help (e.g. `"Ctrl+T"`). Empty hides the row.
    pub label: &'static str,
    pub description: &'static str,
    pub category: HelpCategory,
}

#[derive(Debug, Clone)]
pub struct HelpEntry {
    pub label: &'static str,
    pub description: &'static str,
}

// ── KeyMap ────────────────────────────────────────────────────────────

/// Every key binding in the TUI: `prompt` while typing commands, `panel`
/// while the history or favorites list is open.
pub struct KeyMap {
    pub prompt: Vec<KeyBinding>,
    pub panel: Vec<KeyBinding>,
}

impl KeyMap {
    pub fn default_keymap() -> Self {
        Self {
            prompt: default_prompt_bindings(),
            panel: default_panel_bindings(),
        }
    }

    pub fn lookup_prompt(&self, code: KeyCode, modifiers: KeyModifiers) -> Option<Action> {
        lookup(&self.prompt, code, modifiers)
    }

    pub fn lookup_panel(&self, code: KeyCode, modifiers: KeyModifiers) -> Option<Action> {
        lookup(&self.panel, code, modifiers)
    }

    /// Grouped help rows in display order.
    pub fn help_entries(&self) -> Vec<(&'static str, Vec<HelpEntry>)> {
        let mut out = Vec::new();
        for &cat in HelpCategory::ORDERED {
            let mut entries: Vec<HelpEntry> = Vec::new();
            for kb in self.prompt.iter().chain(&self.panel) {
                if kb.category == cat
                    && !kb.label.is_empty()
                    && !entries.iter().any(|e| e.label == kb.label)
                {
                    entries.push(HelpEntry {
                        label: kb.label,
                        description: kb.description,
                    });
                }
            }
            if !entries.is_empty() {
                out.push((cat.label(), entries));
            }
        }
        out
    }
}

// ── Lookup helper ────────────────────────────────────────────────────

fn lookup(bindings: &[KeyBinding], code: KeyCode, modifiers: KeyModifiers) -> Option<Action> {
    bindings
        .iter()
        .find(|kb| kb.code == code && kb.modifiers == modifiers)
        .map(|kb| kb.action)
}

fn ctrl(c: char) -> (KeyCode, KeyModifiers) {
    (KeyCode::Char(c), KeyModifiers::CONTROL)
}

fn plain(code: KeyCode) -> (KeyCode, KeyModifiers) {
    (code, KeyModifiers::NONE)
}

fn bind(
    (code, modifiers): (KeyCode, KeyModifiers),
    action: Action,
    label: &'static str,
    description: &'static str,
    category: HelpCategory,
) -> KeyBinding {
    KeyBinding {
        code,
        modifiers,
        action,
        label,
        description,
        category,
    }
}

// ── Default bindings ─────────────────────────────────────────────────

#[allow(clippy::enum_glob_use)]
fn default_prompt_bindings() -> Vec<KeyBinding> {
    use Action::*;
    use HelpCategory::*;

    vec![
        bind(plain(KeyCode::Enter), Submit, "  Enter", "Run command", Prompt),
        bind(plain(KeyCode::Up), HistoryPrevious, "  Up/Down", "Browse command history", Prompt),
        bind(plain(KeyCode::Down), HistoryNext, "", "", Prompt),
        bind(plain(KeyCode::Tab), AcceptSuggestion, "  Tab", "Accept suggestion or correction", Prompt),
        bind(ctrl('l'), ClearScreen, "  Ctrl+L", "Clear screen", Prompt),
        bind(ctrl('f'), ToggleFavorite, "  Ctrl+F", "Favorite the last command", Prompt),
        bind(plain(KeyCode::F(1)), ShowHelp, "  F1", "This help screen", Prompt),
        bind(ctrl('c'), Quit, "  Ctrl+C", "Quit", Prompt),
        bind(ctrl('t'), NewTab, "  Ctrl+T", "New tab", Tabs),
        bind(ctrl('w'), CloseTab, "  Ctrl+W", "Close tab", Tabs),
        bind(ctrl('j'), NextTab, "  Ctrl+J/K", "Next / previous tab", Tabs),
        bind(ctrl('k'), PrevTab, "", "", Tabs),
        bind(ctrl('r'), ShowHistory, "  Ctrl+R", "Search history", Panels),
        bind(ctrl('b'), ShowFavorites, "  Ctrl+B", "Favorites", Panels),
        bind(ctrl('y'), CopyShareId, "  Ctrl+Y", "Copy shared session id", Panels),
    ]
}

#[allow(clippy::enum_glob_use)]
fn default_panel_bindings() -> Vec<KeyBinding> {
    use Action::*;
    use HelpCategory::*;

    vec![
        bind(plain(KeyCode::Up), MoveUp, "  Up/Down", "Move selection", Panels),
        bind(plain(KeyCode::Down), MoveDown, "", "", Panels),
        bind(plain(KeyCode::Enter), Select, "  Enter", "Insert into prompt", Panels),
        bind(plain(KeyCode::Delete), DeleteItem, "  Del", "Remove favorite", Panels),
        bind(plain(KeyCode::Esc), ClosePanel, "  Esc", "Close panel", Panels),
        bind(ctrl('c'), Quit, "", "", Panels),
    ]
}

// ── Tests ────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_prompt_quit() {
        let km = KeyMap::default_keymap();
        assert_eq!(
            km.lookup_prompt(KeyCode::Char('c'), KeyModifiers::CONTROL),
            Some(Action::Quit)
        );
    }

    #[test]
    fn lookup_prompt_tabs() {
        let km = KeyMap::default_keymap();
        assert_eq!(
            km.lookup_prompt(KeyCode::Char('t'), KeyModifiers::CONTROL),
            Some(Action::NewTab)
        );
        assert_eq!(
            km.lookup_prompt(KeyCode::Char('k'), KeyModifiers::CONTROL),
            Some(Action::PrevTab)
        );
    }

    #[test]
    fn plain_characters_are_not_bound() {
        let km = KeyMap::default_keymap();
        assert_eq!(km.lookup_prompt(KeyCode::Char('t'), KeyModifiers::NONE), None);
        assert_eq!(km.lookup_panel(KeyCode::Char('x'), KeyModifiers::NONE), None);
    }

    #[test]
    fn same_key_differs_by_table() {
        let km = KeyMap::default_keymap();
        assert_eq!(
            km.lookup_prompt(KeyCode::Up, KeyModifiers::NONE),
            Some(Action::HistoryPrevious)
        );
        assert_eq!(
            km.lookup_panel(KeyCode::Up, KeyModifiers::NONE),
            Some(Action::MoveUp)
        );
    }

    #[test]
    fn help_entries_cover_all_categories() {
        let km = KeyMap::default_keymap();
        let labels: Vec<&str> = km.help_entries().iter().map(|(l, _)| *l).collect();
        assert_eq!(labels, vec!["Prompt", "Tabs", "History / Favorites"]);
    }

    #[test]
    fn help_entries_no_duplicates() {
        let km = KeyMap::default_keymap();
        for (_, entries) in km.help_entries() {
            let mut seen = std::collections::HashSet::new();
            for e in &entries {
                assert!(seen.insert(e.label), "duplicate help label: {:?}", e.label);
            }
        }
    }

    #[test]
    fn no_key_is_bound_twice_in_a_table() {
        let km = KeyMap::default_keymap();
        for table in [&km.prompt, &km.panel] {
            let mut seen = std::collections::HashSet::new();
            for kb in table {
                assert!(
                    seen.insert((kb.code, kb.modifiers)),
                    "{:?} bound twice",
                    kb.code
                );
            }
        }
    }
}
