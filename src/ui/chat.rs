use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

use super::theme::*;
use super::{panel_block, push_wrapped_line};
use crate::app::ChatScreen;

pub(super) fn render_chat(f: &mut Frame<'_>, chat: &ChatScreen, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(4)])
        .split(area);
    render_history(f, chat, chunks[0]);
    render_input(f, chat, chunks[1]);
}

fn render_history(f: &mut Frame<'_>, chat: &ChatScreen, area: Rect) {
    let block = panel_block("Conversation", false);
    let inner = block.inner(area);
    let width = inner.width as usize;

    let mut lines: Vec<Line<'static>> = Vec::new();
    if chat.session.messages().is_empty() {
        lines.push(Line::from(Span::styled(
            "Ask the agent about its documents.",
            Style::default().fg(FG_DIM),
        )));
    }
    for message in chat.session.messages() {
        let (label, color) = if message.role == "user" {
            ("You", BORDER_FOCUS)
        } else {
            ("Agent", STATUS_OK)
        };
        lines.push(Line::from(Span::styled(
            label,
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        )));
        for line in message.content.lines() {
            push_wrapped_line(&mut lines, line, Style::default().fg(FG_PRIMARY), width);
        }
        for citation in &message.citations {
            let page = citation
                .page
                .map(|page| format!(", p. {}", page))
                .unwrap_or_default();
            push_wrapped_line(
                &mut lines,
                &format!("  [{}] {}{}: {}", citation.id, citation.file, page, citation.text),
                Style::default().fg(FG_DIM),
                width,
            );
        }
        lines.push(Line::default());
    }
    if chat.session.is_sending() {
        lines.push(Line::from(Span::styled("…", Style::default().fg(FG_DIM))));
    }

    let total = lines.len() as u16;
    let bottom = total.saturating_sub(inner.height);
    let scroll = bottom.saturating_sub(chat.scroll_back);
    f.render_widget(Paragraph::new(lines).block(block).scroll((scroll, 0)), area);
}

fn render_input(f: &mut Frame<'_>, chat: &ChatScreen, area: Rect) {
    let block = panel_block("Message", true);
    let inner = block.inner(area);
    let width = inner.width as usize;
    let mut lines = Vec::new();
    for line in chat.input.buffer().split('\n') {
        push_wrapped_line(&mut lines, line, Style::default().fg(Color::White), width);
    }
    let (col, row) = chat.input.cursor_display_position(width);
    let scroll = row.saturating_sub(inner.height.saturating_sub(1));
    f.render_widget(Paragraph::new(lines).block(block).scroll((scroll, 0)), area);

    if inner.width > 0 && inner.height > 0 {
        let cursor_x = inner.x.saturating_add(col.min(inner.width.saturating_sub(1)));
        let cursor_y = inner
            .y
            .saturating_add(row.saturating_sub(scroll).min(inner.height.saturating_sub(1)));
        f.set_cursor(cursor_x, cursor_y);
    }
}
