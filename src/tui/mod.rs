mod app;
mod event;
pub mod keymap;
pub mod theme;
mod ui;

pub use app::App;

use anyhow::Result;

use crate::store::Repository;
use crate::terminal::Terminal;

/// Run the interactive terminal until the user quits. `share` attaches the
/// session to a shared session id.
pub fn run(
    terminal: Terminal,
    repo: Box<dyn Repository>,
    theme: theme::Theme,
    record_history: bool,
    share: Option<&str>,
) -> Result<()> {
    let mut app = App::new(terminal, repo, theme, record_history);
    if let Some(session_id) = share {
        app.attach_share(session_id)?;
    }

    let mut screen = ratatui::init();
    let result = app.run(&mut screen);
    ratatui::restore();
    result
}
