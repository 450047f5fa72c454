use ratatui::style::{Color, Modifier, Style};
use serde::Deserialize;

use crate::terminal::LineKind;

/// Colours used by the renderer. Any of them can be overridden through
/// `[theme]` in `config.toml`.
#[derive(Debug, Clone)]
pub struct Theme {
    // ── Borders ───────────────────────────────────────────────
    pub border_focused: Color,
    pub border_unfocused: Color,

    // ── Text ──────────────────────────────────────────────────
    pub text_primary: Color,
    pub text_secondary: Color,
    pub text_accent: Color,

    // ── Scrollback ────────────────────────────────────────────
    pub line_command: Color,
    pub line_output: Color,
    pub line_error: Color,

    // ── Prompt ────────────────────────────────────────────────
    pub prompt_directory: Color,
    pub correction_hint: Color,
    pub suggestion_selected: Color,
    pub favorite_marker: Color,

    // ── Tabs ──────────────────────────────────────────────────
    pub tab_active: Color,
    pub tab_inactive: Color,

    // ── Status bar ────────────────────────────────────────────
    pub status_info: Color,
    pub status_error: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            border_focused: Color::Cyan,
            border_unfocused: Color::DarkGray,

            text_primary: Color::White,
            text_secondary: Color::DarkGray,
            text_accent: Color::Cyan,

            line_command: Color::Cyan,
            line_output: Color::White,
            line_error: Color::Red,

            prompt_directory: Color::Blue,
            correction_hint: Color::Yellow,
            suggestion_selected: Color::Cyan,
            favorite_marker: Color::Yellow,

            tab_active: Color::Cyan,
            tab_inactive: Color::DarkGray,

            status_info: Color::Green,
            status_error: Color::Red,
        }
    }
}

impl Theme {
    pub fn focused_border(&self) -> Style {
        Style::default().fg(self.border_focused)
    }

    pub fn unfocused_border(&self) -> Style {
        Style::default().fg(self.border_unfocused)
    }

    /// Scrollback style for one output line.
    pub fn line_style(&self, kind: LineKind) -> Style {
        match kind {
            LineKind::Command => Style::default()
                .fg(self.line_command)
                .add_modifier(Modifier::BOLD),
            LineKind::Output => Style::default().fg(self.line_output),
            LineKind::Error => Style::default().fg(self.line_error),
        }
    }

    pub fn tab_active_style(&self) -> Style {
        Style::default()
            .fg(self.tab_active)
            .add_modifier(Modifier::BOLD | Modifier::REVERSED)
    }

    pub fn tab_inactive_style(&self) -> Style {
        Style::default().fg(self.tab_inactive)
    }

    pub fn status_style(&self, is_error: bool) -> Style {
        let color = if is_error {
            self.status_error
        } else {
            self.status_info
        };
        Style::default().fg(color).add_modifier(Modifier::BOLD)
    }
}

// ── Config deserialization ────────────────────────────────────────────

/// The `[theme]` table of `config.toml`. Every key is optional and names a
/// colour for one part of the terminal:
///
/// ```toml
/// [theme]
/// line_error = "light_red"
/// prompt_directory = "rgb(120,200,255)"
/// ```
#[derive(Debug, Default, Deserialize, Clone)]
pub struct ThemeConfig {
    // Scrollback and panel frames.
    pub border_focused: Option<String>,
    pub border_unfocused: Option<String>,

    pub text_primary: Option<String>,
    pub text_secondary: Option<String>,
    pub text_accent: Option<String>,

    /// Echoed `$ command` lines.
    pub line_command: Option<String>,
    pub line_output: Option<String>,
    pub line_error: Option<String>,

    // Prompt row.
    pub prompt_directory: Option<String>,
    /// The "did you mean" hint above the prompt.
    pub correction_hint: Option<String>,
    /// First predictor suggestion, the one Tab accepts.
    pub suggestion_selected: Option<String>,
    pub favorite_marker: Option<String>,

    pub tab_active: Option<String>,
    pub tab_inactive: Option<String>,

    pub status_info: Option<String>,
    pub status_error: Option<String>,
}

/// Named colours (`"cyan"`, `"dark_gray"`, ...) or `"rgb(R,G,B)"`.
fn parse_color(s: &str) -> Option<Color> {
    let s = s.trim();
    if let Some(inner) = s.strip_prefix("rgb(").and_then(|r| r.strip_suffix(')')) {
        let channels = inner
            .split(',')
            .map(|part| part.trim().parse::<u8>().ok())
            .collect::<Option<Vec<u8>>>()?;
        return match channels[..] {
            [r, g, b] => Some(Color::Rgb(r, g, b)),
            _ => None,
        };
    }

    let lower = s.to_lowercase().replace('-', "_");
    let color = match lower.as_str() {
        "black" => Color::Black,
        "red" => Color::Red,
        "green" => Color::Green,
        "yellow" => Color::Yellow,
        "blue" => Color::Blue,
        "magenta" => Color::Magenta,
        "cyan" => Color::Cyan,
        "gray" | "grey" => Color::Gray,
        "dark_gray" | "dark_grey" | "darkgray" | "darkgrey" => Color::DarkGray,
        "light_red" | "lightred" => Color::LightRed,
        "light_green" | "lightgreen" => Color::LightGreen,
        "light_yellow" | "lightyellow" => Color::LightYellow,
        "light_blue" | "lightblue" => Color::LightBlue,
        "light_magenta" | "lightmagenta" => Color::LightMagenta,
        "light_cyan" | "lightcyan" => Color::LightCyan,
        "white" => Color::White,
        _ => return None,
    };
    Some(color)
}

/// Unknown colour names leave the default in place.
fn override_with(target: &mut Color, source: Option<&String>) {
    if let Some(s) = source {
        match parse_color(s) {
            Some(color) => *target = color,
            None => tracing::warn!("ignoring unknown theme colour {s:?}"),
        }
    }
}

impl ThemeConfig {
    /// The default palette with each configured colour swapped in.
    pub fn build(&self) -> Theme {
        let mut t = Theme::default();

        override_with(&mut t.border_focused, self.border_focused.as_ref());
        override_with(&mut t.border_unfocused, self.border_unfocused.as_ref());
        override_with(&mut t.text_primary, self.text_primary.as_ref());
        override_with(&mut t.text_secondary, self.text_secondary.as_ref());
        override_with(&mut t.text_accent, self.text_accent.as_ref());
        override_with(&mut t.line_command, self.line_command.as_ref());
        override_with(&mut t.line_output, self.line_output.as_ref());
        override_with(&mut t.line_error, self.line_error.as_ref());
        override_with(&mut t.prompt_directory, self.prompt_directory.as_ref());
        override_with(&mut t.correction_hint, self.correction_hint.as_ref());
        override_with(&mut t.suggestion_selected, self.suggestion_selected.as_ref());
        override_with(&mut t.favorite_marker, self.favorite_marker.as_ref());
        override_with(&mut t.tab_active, self.tab_active.as_ref());
        override_with(&mut t.tab_inactive, self.tab_inactive.as_ref());
        override_with(&mut t.status_info, self.status_info.as_ref());
        override_with(&mut t.status_error, self.status_error.as_ref());

        t
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_named_colors() {
        assert_eq!(parse_color("cyan"), Some(Color::Cyan));
        assert_eq!(parse_color("DarkGray"), Some(Color::DarkGray));
        assert_eq!(parse_color("light-red"), Some(Color::LightRed));
        assert_eq!(parse_color("nope"), None);
    }

    #[test]
    fn parse_rgb_color() {
        assert_eq!(
            parse_color("rgb(255, 165, 0)"),
            Some(Color::Rgb(255, 165, 0))
        );
        assert_eq!(parse_color("rgb(256,0,0)"), None);
        assert_eq!(parse_color("rgb(1,2)"), None);
        assert_eq!(parse_color("rgb(1,2,3,4)"), None);
    }

    #[test]
    fn theme_config_overrides() {
        let cfg = ThemeConfig {
            line_error: Some("light_red".into()),
            tab_active: Some("rgb(100,200,50)".into()),
            line_output: Some("not-a-colour".into()),
            ..Default::default()
        };
        let t = cfg.build();
        assert_eq!(t.line_error, Color::LightRed);
        assert_eq!(t.tab_active, Color::Rgb(100, 200, 50));
        assert_eq!(t.line_output, Color::White);
    }

    #[test]
    fn line_styles_follow_kind() {
        let t = Theme::default();
        assert_eq!(
            t.line_style(LineKind::Error),
            Style::default().fg(Color::Red)
        );
        assert!(
            t.line_style(LineKind::Command)
                .add_modifier
                .contains(Modifier::BOLD)
        );
    }

    #[test]
    fn tab_styles() {
        let t = Theme::default();
        let active = t.tab_active_style();
        assert_eq!(active.fg, Some(t.tab_active));
        assert!(active.add_modifier.contains(Modifier::REVERSED));
        assert_eq!(t.tab_inactive_style().fg, Some(t.tab_inactive));
    }
}
