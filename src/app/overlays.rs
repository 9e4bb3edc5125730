use std::path::{Path, PathBuf};

use crossterm::event::{KeyCode, KeyEvent};

use super::keyboard::edit_text;
use super::{App, OverlayState, PendingAction, PendingInputAction};

impl App {
    pub(crate) fn handle_overlay_key(&mut self, key: KeyEvent) {
        let Some(overlay) = self.overlay.as_mut() else {
            return;
        };
        match overlay {
            OverlayState::Notice(_) => {
                if matches!(key.code, KeyCode::Enter | KeyCode::Esc | KeyCode::Char(' ')) {
                    self.dismiss_notice();
                }
            }
            OverlayState::InputPrompt(state) => match key.code {
                KeyCode::Esc => self.overlay = None,
                KeyCode::Enter => {
                    let paths = parse_paths(state.value.buffer(), &self.workspace_root);
                    if paths.is_empty() {
                        state.error = Some(String::from("Enter at least one path"));
                        return;
                    }
                    let action = match state.action {
                        PendingInputAction::AddFiles => PendingAction::AddFiles(paths),
                    };
                    self.overlay = None;
                    self.queue(action, "Reading files…");
                }
                _ => {
                    if edit_text(&mut state.value, key, false) {
                        state.error = None;
                    }
                }
            },
            OverlayState::ConfirmDelete(state) => match key.code {
                KeyCode::Left | KeyCode::Right | KeyCode::Tab | KeyCode::BackTab => {
                    state.selected_index = 1 - state.selected_index.min(1);
                }
                KeyCode::Char('y') => {
                    let target = state.target.clone();
                    self.overlay = None;
                    self.queue(PendingAction::Delete(target), "Deleting…");
                }
                KeyCode::Enter => {
                    let confirmed = state.selected_index == 0;
                    let target = state.target.clone();
                    self.overlay = None;
                    if confirmed {
                        self.queue(PendingAction::Delete(target), "Deleting…");
                    }
                }
                KeyCode::Esc | KeyCode::Char('n') => self.overlay = None,
                _ => {}
            },
        }
    }
}

/// Splits `a.pdf; docs/b.pdf` into paths; relative ones resolve against the workspace.
fn parse_paths(raw: &str, workspace_root: &Path) -> Vec<PathBuf> {
    raw.split(';')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            let part = part.trim_matches(|ch| ch == '"' || ch == '\'');
            let path = PathBuf::from(part);
            if path.is_absolute() {
                path
            } else {
                workspace_root.join(path)
            }
        })
        .collect()
}
