use ratatui::prelude::*;
use ratatui::widgets::{List, ListItem, ListState, Paragraph};

use super::panel_block;
use super::theme::*;
use crate::app::App;
use crate::directory::Badge;

pub(super) fn render_agent_list(f: &mut Frame<'_>, app: &App, area: Rect) {
    let block = panel_block("Agents", true);
    if app.directory.is_empty() {
        let empty = Paragraph::new("No agents yet. Press n to create one.")
            .style(Style::default().fg(FG_DIM))
            .block(block);
        f.render_widget(empty, area);
        return;
    }

    let name_width = app
        .directory
        .agents()
        .iter()
        .map(|agent| agent.name.chars().count())
        .max()
        .unwrap_or(0)
        .clamp(8, 40);

    let items: Vec<ListItem> = app
        .directory
        .agents()
        .iter()
        .map(|agent| {
            let badge = Badge::of(agent);
            let persona = agent.persona.lines().next().unwrap_or("");
            ListItem::new(Line::from(vec![
                Span::styled(
                    format!("{:<width$}  ", agent.name, width = name_width),
                    Style::default().fg(FG_PRIMARY),
                ),
                Span::styled(
                    format!("{:<11}", badge.label()),
                    Style::default().fg(badge_color(badge)),
                ),
                Span::styled(
                    format!("{:<22}", agent.created_at.as_deref().unwrap_or("")),
                    Style::default().fg(FG_DIM),
                ),
                Span::styled(persona.to_string(), Style::default().fg(FG_DIM)),
            ]))
        })
        .collect();

    let mut state = ListState::default();
    state.select(Some(app.directory.selected_index()));
    let list = List::new(items)
        .block(block)
        .highlight_style(
            Style::default()
                .bg(PANEL_HIGHLIGHT_BG)
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("▶ ");
    f.render_stateful_widget(list, area, &mut state);
}
