use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Wrap},
};

use super::app::{App, Mode};

pub fn draw(frame: &mut Frame, app: &App) {
    let suggestion_rows = app.suggestions.len().min(5) as u16;
    let outer = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(suggestion_rows),
            Constraint::Length(3),
            Constraint::Length(1),
        ])
        .split(frame.area());

    draw_tab_bar(frame, app, outer[0]);
    draw_scrollback(frame, app, outer[1]);
    draw_suggestions(frame, app, outer[2]);
    draw_prompt(frame, app, outer[3]);
    draw_status_bar(frame, app, outer[4]);

    match app.mode {
        Mode::Prompt => {}
        Mode::History | Mode::Favorites => draw_panel(frame, app),
        Mode::Help => draw_help(frame, app),
    }
}

fn draw_tab_bar(frame: &mut Frame, app: &App, area: Rect) {
    let theme = &app.theme;
    let mut spans = vec![Span::styled(
        " pandora ",
        Style::default()
            .fg(theme.text_accent)
            .add_modifier(Modifier::BOLD),
    )];
    for (i, tab) in app.terminal.tabs().iter().enumerate() {
        let style = if tab.id == app.terminal.active_tab_id() {
            theme.tab_active_style()
        } else {
            theme.tab_inactive_style()
        };
        spans.push(Span::raw(" "));
        spans.push(Span::styled(format!(" {} {} ", i + 1, tab.title), style));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn draw_scrollback(frame: &mut Frame, app: &App, area: Rect) {
    let theme = &app.theme;
    let tab = app.terminal.active_tab();
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme.unfocused_border())
        .title(format!(" {} ", tab.directory));
    let inner_height = block.inner(area).height as usize;

    let mut lines: Vec<Line> = Vec::new();
    for output in tab.output_lines() {
        let style = theme.line_style(output.kind);
        if output.kind == crate::terminal::LineKind::Command {
            lines.push(Line::from(Span::styled(format!("$ {}", output.content), style)));
        } else {
            lines.extend(
                output
                    .content
                    .lines()
                    .map(|l| Line::from(Span::styled(l.to_string(), style))),
            );
        }
    }
    // Keep the newest lines in view.
    let skip = lines.len().saturating_sub(inner_height);
    let visible: Vec<Line> = lines.into_iter().skip(skip).collect();

    frame.render_widget(
        Paragraph::new(visible)
            .block(block)
            .wrap(Wrap { trim: false }),
        area,
    );
}

fn draw_suggestions(frame: &mut Frame, app: &App, area: Rect) {
    if area.height == 0 {
        return;
    }
    let theme = &app.theme;
    let items: Vec<ListItem> = app
        .suggestions
        .iter()
        .enumerate()
        .map(|(i, s)| {
            let style = if i == 0 {
                Style::default()
                    .fg(theme.suggestion_selected)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(theme.text_secondary)
            };
            let prefix = if i == 0 { " ⇥ " } else { "   " };
            ListItem::new(Line::from(vec![
                Span::styled(prefix, style),
                Span::styled(s.as_str(), style),
            ]))
        })
        .collect();
    frame.render_widget(List::new(items), area);
}

fn draw_prompt(frame: &mut Frame, app: &App, area: Rect) {
    let theme = &app.theme;
    let tab = app.terminal.active_tab();

    let mut title = vec![Span::raw(" ")];
    if let Some(correction) = app.correction() {
        title.push(Span::styled(
            format!("did you mean: {} ", correction.corrected),
            Style::default().fg(theme.correction_hint),
        ));
    }
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme.focused_border())
        .title(Line::from(title));

    let line = Line::from(vec![
        Span::styled(
            format!("{}@{} ", app.user, app.terminal.computer_name()),
            Style::default().fg(theme.text_secondary),
        ),
        Span::styled(
            tab.title.clone(),
            Style::default().fg(theme.prompt_directory),
        ),
        Span::styled(" ❯ ", Style::default().fg(theme.text_accent)),
        Span::styled(app.input.as_str(), Style::default().fg(theme.text_primary)),
        Span::styled("█", Style::default().fg(theme.text_accent)),
    ]);
    frame.render_widget(Paragraph::new(line).block(block), area);
}

fn draw_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let theme = &app.theme;
    let mut spans = Vec::new();
    if let Some(share) = &app.share {
        spans.push(Span::styled(
            format!(" shared: {} ", share.session_id),
            Style::default().fg(theme.favorite_marker),
        ));
    }
    match &app.status {
        Some(status) => spans.push(Span::styled(
            format!(" {} ", status.text),
            theme.status_style(status.is_error),
        )),
        None => spans.push(Span::styled(
            " F1 help  Ctrl+T new tab  Ctrl+R history  Ctrl+C quit",
            Style::default().fg(theme.text_secondary),
        )),
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

/// A rectangle of `width` x `height` centred in `area`, clamped to fit.
fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width.saturating_sub(4));
    let height = height.min(area.height.saturating_sub(4));
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width, height)
}

fn draw_panel(frame: &mut Frame, app: &App) {
    let theme = &app.theme;
    let rows: Vec<(String, Option<String>)> = match app.mode {
        Mode::History => app
            .history_items
            .iter()
            .map(|e| {
                (
                    format!("{} {}", e.status.symbol(), e.command),
                    Some(e.created_at.clone()),
                )
            })
            .collect(),
        _ => app
            .favorite_items
            .iter()
            .map(|f| {
                let description = Some(f.description.clone()).filter(|d| !d.is_empty());
                (format!("★ {}", f.command), description)
            })
            .collect(),
    };
    let title = if app.mode == Mode::History {
        " History "
    } else {
        " Favorites "
    };

    let area = centered(frame.area(), 70, rows.len() as u16 + 4);
    frame.render_widget(Clear, area);
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(theme.focused_border());
    let inner = block.inner(area);
    frame.render_widget(block, area);
    if inner.height < 2 {
        return;
    }

    let search_area = Rect::new(inner.x, inner.y, inner.width, 1);
    let search_line = if app.mode == Mode::History {
        Line::from(vec![
            Span::styled("search: ", Style::default().fg(theme.text_secondary)),
            Span::raw(app.search.as_str()),
            Span::styled("█", Style::default().fg(theme.text_accent)),
        ])
    } else {
        Line::from(Span::styled(
            "Enter insert  Del remove  Esc close",
            Style::default().fg(theme.text_secondary),
        ))
    };
    frame.render_widget(Paragraph::new(search_line), search_area);

    let list_area = Rect::new(
        inner.x,
        inner.y + 1,
        inner.width,
        inner.height.saturating_sub(1),
    );
    if rows.is_empty() {
        frame.render_widget(
            Paragraph::new("  Nothing here yet").style(Style::default().fg(theme.text_secondary)),
            list_area,
        );
        return;
    }
    let items: Vec<ListItem> = rows
        .iter()
        .enumerate()
        .map(|(i, (label, detail))| {
            let selected = i == app.panel_index;
            let style = if selected {
                Style::default()
                    .fg(theme.suggestion_selected)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(theme.text_primary)
            };
            let mut spans = vec![
                Span::styled(if selected { "▸ " } else { "  " }, style),
                Span::styled(label.as_str(), style),
            ];
            if let Some(detail) = detail {
                spans.push(Span::styled(
                    format!("  {detail}"),
                    Style::default().fg(theme.text_secondary),
                ));
            }
            ListItem::new(Line::from(spans))
        })
        .collect();
    frame.render_widget(List::new(items), list_area);
}

fn draw_help(frame: &mut Frame, app: &App) {
    let theme = &app.theme;
    let mut lines: Vec<Line> = Vec::new();
    for (category, entries) in app.keymap.help_entries() {
        lines.push(Line::from(Span::styled(
            category,
            Style::default()
                .fg(theme.text_accent)
                .add_modifier(Modifier::BOLD),
        )));
        for entry in entries {
            lines.push(Line::from(vec![
                Span::styled(
                    format!("{:<14}", entry.label),
                    Style::default().fg(theme.favorite_marker),
                ),
                Span::styled(entry.description, Style::default().fg(theme.text_primary)),
            ]));
        }
        lines.push(Line::from(""));
    }
    lines.push(Line::from(Span::styled(
        "Type 'help' at the prompt for commands. Press any key to close.",
        Style::default().fg(theme.text_secondary),
    )));

    let area = centered(frame.area(), 60, lines.len() as u16 + 2);
    frame.render_widget(Clear, area);
    let block = Block::default()
        .title(" Keyboard shortcuts ")
        .borders(Borders::ALL)
        .border_style(theme.focused_border());
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn centered_fits_inside_area() {
        let area = Rect::new(0, 0, 100, 40);
        let r = centered(area, 60, 10);
        assert_eq!(r, Rect::new(20, 15, 60, 10));

        let small = centered(Rect::new(0, 0, 20, 8), 60, 10);
        assert_eq!(small.width, 16);
        assert_eq!(small.height, 4);
    }
}
