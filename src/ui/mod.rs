use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use unicode_width::UnicodeWidthChar;

use crate::app::{App, ConfirmDeleteState, DeleteTarget, InputPromptState, OverlayState, Screen};
use crate::form::Notice;

mod chat;
mod form;
mod list;
mod theme;
use theme::*;

pub fn render(f: &mut Frame<'_>, app: &mut App) {
    let size = f.size();
    if size.width < 60 || size.height < 16 {
        let block = Paragraph::new("Terminal too small: resize to at least 60x16.")
            .wrap(Wrap { trim: true })
            .alignment(Alignment::Center)
            .block(
                Block::default()
                    .title("agentdesk")
                    .borders(Borders::ALL)
                    .style(Style::default().fg(FG_PRIMARY).bg(MENU_BG)),
            )
            .style(Style::default().fg(FG_PRIMARY).bg(BG_PRIMARY));
        f.render_widget(block, size);
        return;
    }

    let base = Block::default().style(Style::default().bg(BG_PRIMARY));
    f.render_widget(base, size);

    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(5),
            Constraint::Length(1),
        ])
        .split(size);

    render_title_bar(f, app, vertical[0]);
    match &app.screen {
        Screen::AgentList => list::render_agent_list(f, app, vertical[1]),
        Screen::AgentForm(form) => form::render_agent_form(f, form, vertical[1]),
        Screen::Chat(chat) => chat::render_chat(f, chat, vertical[1]),
    }
    render_status_bar(f, app, vertical[2]);

    if let Some(overlay) = app.overlay.as_ref() {
        render_overlay(f, overlay);
    }
}

fn render_title_bar(f: &mut Frame<'_>, app: &App, area: Rect) {
    let line = Line::from(vec![
        Span::styled(
            " agentdesk ",
            Style::default()
                .fg(BAR_TEXT)
                .bg(BAR_BG)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!(" {} ", app.screen.title()),
            Style::default().fg(BAR_TEXT).bg(BAR_BG),
        ),
        Span::styled(
            format!(" {} ", app.base_url),
            Style::default().fg(FG_DIM).bg(BAR_BG),
        ),
    ]);
    f.render_widget(
        Paragraph::new(line).style(Style::default().bg(BAR_BG)),
        area,
    );
}

fn render_status_bar(f: &mut Frame<'_>, app: &App, area: Rect) {
    f.render_widget(Clear, area);
    let status = Paragraph::new(app.status_message.as_str())
        .style(Style::default().fg(BAR_TEXT).bg(BAR_BG));
    f.render_widget(status, area);
}

fn render_overlay(f: &mut Frame<'_>, overlay: &OverlayState) {
    match overlay {
        OverlayState::Notice(notice) => render_notice_overlay(f, notice),
        OverlayState::InputPrompt(state) => render_input_prompt_overlay(f, state),
        OverlayState::ConfirmDelete(state) => render_confirm_delete_overlay(f, state),
    }
}

fn overlay_block(title: &str, accent: Color) -> Block<'_> {
    Block::default()
        .title(Span::styled(
            title,
            Style::default().fg(accent).add_modifier(Modifier::BOLD),
        ))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(MENU_BORDER))
        .style(Style::default().bg(MENU_BG))
}

fn render_notice_overlay(f: &mut Frame<'_>, notice: &Notice) {
    let area = centered_rect(60, 30, f.size());
    f.render_widget(Clear, area);
    let block = overlay_block(notice.title.as_str(), notice_color(notice.level));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(1)])
        .split(inner);

    let detail = Paragraph::new(notice.detail.as_str())
        .wrap(Wrap { trim: false })
        .style(Style::default().fg(Color::White).bg(MENU_BG));
    f.render_widget(detail, chunks[0]);

    let hint = Paragraph::new("Enter / Esc to dismiss").style(Style::default().fg(FG_DIM).bg(MENU_BG));
    f.render_widget(hint, chunks[1]);
}

fn render_input_prompt_overlay(f: &mut Frame<'_>, state: &InputPromptState) {
    let area = centered_rect(70, 30, f.size());
    f.render_widget(Clear, area);
    let block = overlay_block(state.title.as_str(), BAR_TEXT);
    let inner = block.inner(area);
    f.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(inner);

    let placeholder =
        Paragraph::new(state.placeholder.as_str()).style(Style::default().fg(FG_DIM).bg(MENU_BG));
    f.render_widget(placeholder, chunks[0]);

    let mut input_spans = vec![Span::styled("> ", Style::default().fg(FG_PRIMARY))];
    if state.value.is_empty() {
        input_spans.push(Span::styled("(nothing yet)", Style::default().fg(FG_DIM)));
    } else {
        input_spans.push(Span::styled(
            state.value.buffer(),
            Style::default().fg(Color::White),
        ));
    }
    input_spans.push(Span::styled(" ▍", Style::default().fg(BORDER_FOCUS)));
    let input = Paragraph::new(Line::from(input_spans)).style(Style::default().bg(MENU_BG));
    f.render_widget(input, chunks[1]);

    let message = match state.error.as_ref() {
        Some(error) => Paragraph::new(error.as_str()).style(Style::default().fg(STATUS_ERROR).bg(MENU_BG)),
        None => Paragraph::new("Enter confirm · Esc cancel").style(Style::default().fg(FG_DIM).bg(MENU_BG)),
    };
    f.render_widget(message, chunks[2]);
}

fn render_confirm_delete_overlay(f: &mut Frame<'_>, state: &ConfirmDeleteState) {
    let area = centered_rect(50, 28, f.size());
    f.render_widget(Clear, area);
    let title = match state.target {
        DeleteTarget::Agent(_) => "Delete Agent",
        DeleteTarget::File(_) => "Delete File",
    };
    let block = overlay_block(title, BAR_TEXT);
    let inner = block.inner(area);
    f.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(inner);

    let message = Paragraph::new(vec![
        Line::from(vec![
            Span::styled("About to delete: ", Style::default().fg(FG_DIM)),
            Span::styled(state.display(), Style::default().fg(Color::White)),
        ]),
        Line::from(Span::styled(
            "This cannot be undone.",
            Style::default().fg(FG_DIM),
        )),
    ])
    .style(Style::default().bg(MENU_BG));
    f.render_widget(message, chunks[0]);

    let button_style = |selected: bool| {
        if selected {
            Style::default()
                .bg(PANEL_HIGHLIGHT_BG)
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(BAR_TEXT)
        }
    };
    let buttons = Paragraph::new(Line::from(vec![
        Span::styled(" [Delete] ", button_style(state.selected_index == 0)),
        Span::styled("  ", Style::default().bg(MENU_BG)),
        Span::styled(" [Cancel] ", button_style(state.selected_index == 1)),
    ]))
    .style(Style::default().bg(MENU_BG))
    .alignment(Alignment::Center);
    f.render_widget(buttons, chunks[1]);

    let hint = Paragraph::new("←/→ choose · Enter confirm · y delete · Esc cancel")
        .style(Style::default().fg(FG_DIM).bg(MENU_BG));
    f.render_widget(hint, chunks[2]);
}

fn panel_block(title: &str, focused: bool) -> Block<'_> {
    Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(if focused { BORDER_FOCUS } else { BORDER_IDLE }))
        .style(Style::default().bg(BG_PANEL).fg(FG_PRIMARY))
}

fn push_wrapped_line(lines: &mut Vec<Line<'static>>, text: &str, style: Style, width: usize) {
    for segment in wrap_to_width(text, width) {
        lines.push(Line::from(Span::styled(segment, style)));
    }
}

fn wrap_to_width(text: &str, width: usize) -> Vec<String> {
    if width == 0 {
        return vec![text.to_string()];
    }
    if text.is_empty() {
        return vec![String::new()];
    }
    let mut result = Vec::new();
    let mut current = String::new();
    let mut current_width = 0usize;
    for ch in text.chars() {
        let ch_width = UnicodeWidthChar::width(ch).unwrap_or(1).max(1);
        if current_width + ch_width > width && !current.is_empty() {
            result.push(current);
            current = String::new();
            current_width = 0;
        }
        current.push(ch);
        current_width += ch_width;
    }
    result.push(current);
    result
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(area);
    Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(horizontal[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrap_counts_wide_characters_as_two_cells() {
        assert_eq!(wrap_to_width("abcd", 3), vec!["abc", "d"]);
        assert_eq!(wrap_to_width("代理人", 4), vec!["代理", "人"]);
        assert_eq!(wrap_to_width("", 4), vec![""]);
    }
}
