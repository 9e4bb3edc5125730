use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::prelude::*;
use ratatui::widgets::{List, ListItem, ListState, Paragraph, Wrap};

use super::theme::*;
use super::{panel_block, push_wrapped_line};
use crate::app::{FormField, FormScreen, TextInput};
use crate::form::{ActionButton, FormMode};

pub(super) fn render_agent_form(f: &mut Frame<'_>, form: &FormScreen, area: Rect) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(area);
    let left = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(4),
            Constraint::Length(3),
        ])
        .split(columns[0]);

    render_input(f, "Name", &form.name_input, form.focus == FormField::Name, left[0]);
    render_input(
        f,
        "Persona",
        &form.persona_input,
        form.focus == FormField::Persona,
        left[1],
    );
    render_action(f, form, left[2]);
    render_files(f, form, columns[1]);
}

fn render_input(f: &mut Frame<'_>, title: &str, input: &TextInput, focused: bool, area: Rect) {
    let block = panel_block(title, focused);
    let inner = block.inner(area);
    let width = inner.width as usize;
    let mut lines = Vec::new();
    for line in input.buffer().split('\n') {
        push_wrapped_line(&mut lines, line, Style::default().fg(Color::White), width);
    }
    let (_, cursor_row) = input.cursor_display_position(width);
    let scroll = cursor_row.saturating_sub(inner.height.saturating_sub(1));
    let paragraph = Paragraph::new(lines).block(block).scroll((scroll, 0));
    f.render_widget(paragraph, area);

    if focused && inner.width > 0 && inner.height > 0 {
        let (col, row) = input.cursor_display_position(width);
        let cursor_x = inner.x.saturating_add(col.min(inner.width.saturating_sub(1)));
        let cursor_y = inner
            .y
            .saturating_add(row.saturating_sub(scroll).min(inner.height.saturating_sub(1)));
        f.set_cursor(cursor_x, cursor_y);
    }
}

fn render_action(f: &mut Frame<'_>, form: &FormScreen, area: Rect) {
    let focused = form.focus == FormField::Action;
    let action = form.controller.action();
    let style = match action {
        ActionButton::Save { enabled: true } if focused => Style::default()
            .bg(PANEL_HIGHLIGHT_BG)
            .fg(Color::Black)
            .add_modifier(Modifier::BOLD),
        ActionButton::Save { enabled: true } => Style::default()
            .fg(BAR_TEXT)
            .add_modifier(Modifier::BOLD),
        ActionButton::Saving | ActionButton::ProcessingFiles => Style::default().fg(STATUS_BUSY),
        ActionButton::Save { enabled: false } => Style::default().fg(FG_DIM),
    };
    let mode = match form.controller.mode() {
        FormMode::Create => "new agent",
        FormMode::Manage => form.controller.created_at().unwrap_or("saved agent"),
    };
    let line = Line::from(vec![
        Span::styled(format!(" [{}] ", action.label()), style),
        Span::styled(format!("  {}", mode), Style::default().fg(FG_DIM)),
    ]);
    let paragraph = Paragraph::new(line).block(panel_block("", focused));
    f.render_widget(paragraph, area);
}

fn render_files(f: &mut Frame<'_>, form: &FormScreen, area: Rect) {
    let focused = form.focus == FormField::Files;
    let title = format!("Files ({})", form.controller.staging().len());
    let block = panel_block(&title, focused);

    if form.controller.staging().is_empty() {
        let hint = Paragraph::new(format!(
            "No files. Press a (or Ctrl+O) to add. {}.",
            form.controller.policy().rejection_reason()
        ))
        .wrap(Wrap { trim: true })
        .style(Style::default().fg(FG_DIM))
        .block(block);
        f.render_widget(hint, area);
        return;
    }

    let items: Vec<ListItem> = form
        .controller
        .staging()
        .iter()
        .map(|file| {
            let mut lines = vec![Line::from(vec![
                Span::styled(file.name().to_string(), Style::default().fg(FG_PRIMARY)),
                Span::styled(format!("  {}", human_size(file.size())), Style::default().fg(FG_DIM)),
            ])];
            let mut status = vec![Span::styled(
                format!("  {}", file.status.label()),
                Style::default().fg(file_status_color(file.status)),
            )];
            if let Some(message) = &file.message {
                status.push(Span::styled(format!(" · {}", message), Style::default().fg(FG_DIM)));
            }
            lines.push(Line::from(status));
            ListItem::new(lines)
        })
        .collect();

    let mut state = ListState::default();
    if focused {
        state.select(Some(form.selected_file));
    }
    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().bg(PANEL_HIGHLIGHT_BG).fg(Color::Black))
        .highlight_symbol("▶ ");
    f.render_stateful_widget(list, area, &mut state);
}

fn human_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} {}", bytes, UNITS[0])
    } else {
        format!("{:.1} {}", value, UNITS[unit])
    }
}
