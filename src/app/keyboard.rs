use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use super::{
    App, ConfirmDeleteState, DeleteTarget, FormField, InputPromptState, OverlayState,
    PendingAction, PendingInputAction, Screen, TextInput,
};
use crate::form::ActionButton;

impl App {
    /// The main entry point for keyboard events.
    ///
    /// Overlays capture everything; otherwise the key goes to the current
    /// screen. Anything that needs the network is queued, not awaited here.
    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }
        // A queued action has not run yet; drop input until it has.
        if self.pending.is_some() {
            return;
        }

        if self.overlay.is_some() {
            self.handle_overlay_key(key);
            return;
        }

        if key.modifiers.contains(KeyModifiers::CONTROL)
            && matches!(key.code, KeyCode::Char('c') | KeyCode::Char('q'))
        {
            self.should_quit = true;
            return;
        }

        match &self.screen {
            Screen::AgentList => self.handle_list_key(key),
            Screen::AgentForm(_) => self.handle_form_key(key),
            Screen::Chat(_) => self.handle_chat_key(key),
        }
    }

    fn handle_list_key(&mut self, key: KeyEvent) {
        let selected = self
            .directory
            .selected_agent()
            .map(|agent| agent.name.clone());
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Up | KeyCode::Char('k') => self.directory.select_previous(),
            KeyCode::Down | KeyCode::Char('j') => self.directory.select_next(),
            KeyCode::Char('r') => self.queue(PendingAction::RefreshAgents, "Loading agents…"),
            KeyCode::Char('n') => self.queue(PendingAction::OpenCreate, ""),
            KeyCode::Enter => {
                if let Some(name) = selected {
                    let status = format!("Loading {}…", name);
                    self.queue(PendingAction::OpenManage(name), status);
                }
            }
            KeyCode::Char('c') => {
                if let Some(name) = selected {
                    let status = format!("Loading chat with {}…", name);
                    self.queue(PendingAction::OpenChat(name), status);
                }
            }
            KeyCode::Char('d') | KeyCode::Delete => {
                if let Some(name) = selected {
                    self.overlay = Some(OverlayState::ConfirmDelete(ConfirmDeleteState {
                        target: DeleteTarget::Agent(name),
                        selected_index: 1,
                    }));
                }
            }
            _ => {}
        }
    }

    fn handle_form_key(&mut self, key: KeyEvent) {
        let Screen::AgentForm(form) = &mut self.screen else {
            return;
        };
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

        match key.code {
            KeyCode::Esc => {
                self.back_to_list();
                return;
            }
            KeyCode::Tab => {
                form.focus = form.focus.next();
                return;
            }
            KeyCode::BackTab => {
                form.focus = form.focus.previous();
                return;
            }
            KeyCode::Char('s') if ctrl => {
                self.request_submit();
                return;
            }
            KeyCode::Char('o') if ctrl => {
                self.prompt_add_files();
                return;
            }
            _ => {}
        }

        match form.focus {
            FormField::Name => {
                if key.code == KeyCode::Enter {
                    form.focus = FormField::Persona;
                } else if edit_text(&mut form.name_input, key, false) {
                    form.controller.set_name(form.name_input.buffer());
                }
            }
            FormField::Persona => {
                if edit_text(&mut form.persona_input, key, true) {
                    form.controller.set_persona(form.persona_input.buffer());
                }
            }
            FormField::Files => match key.code {
                KeyCode::Up => form.selected_file = form.selected_file.saturating_sub(1),
                KeyCode::Down => {
                    form.selected_file += 1;
                    form.clamp_selection();
                }
                KeyCode::Char('a') | KeyCode::Enter => self.prompt_add_files(),
                KeyCode::Char('d') | KeyCode::Delete => {
                    let Some(name) = form.selected_file_name() else {
                        return;
                    };
                    let existing = form
                        .controller
                        .staging()
                        .get(&name)
                        .is_some_and(|file| file.is_existing());
                    if existing {
                        self.overlay = Some(OverlayState::ConfirmDelete(ConfirmDeleteState {
                            target: DeleteTarget::File(name),
                            selected_index: 1,
                        }));
                    } else {
                        self.queue(PendingAction::Delete(DeleteTarget::File(name)), "");
                    }
                }
                _ => {}
            },
            FormField::Action => {
                if matches!(key.code, KeyCode::Enter | KeyCode::Char(' ')) {
                    self.request_submit();
                }
            }
        }
    }

    fn request_submit(&mut self) {
        let Screen::AgentForm(form) = &self.screen else {
            return;
        };
        match form.controller.action() {
            ActionButton::Save { enabled: true } => self.queue(PendingAction::Submit, "Saving…"),
            // The controller explains why it refuses.
            ActionButton::ProcessingFiles => self.queue(PendingAction::Submit, ""),
            ActionButton::Save { enabled: false } => {
                self.status_message = String::from("Nothing to save");
            }
            ActionButton::Saving => {}
        }
    }

    fn prompt_add_files(&mut self) {
        self.overlay = Some(OverlayState::InputPrompt(InputPromptState {
            title: String::from("Add Files"),
            placeholder: String::from("One or more paths, separated by ';'"),
            value: TextInput::new(),
            error: None,
            action: PendingInputAction::AddFiles,
        }));
    }

    fn handle_chat_key(&mut self, key: KeyEvent) {
        let Screen::Chat(chat) = &mut self.screen else {
            return;
        };
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Esc => {
                self.screen = Screen::AgentList;
                self.queue(PendingAction::RefreshAgents, "Loading agents…");
            }
            KeyCode::Char('l') if ctrl => self.queue(PendingAction::ClearChat, "Clearing chat…"),
            KeyCode::Enter if key.modifiers.contains(KeyModifiers::ALT) => {
                chat.input.insert_newline()
            }
            KeyCode::Enter => {
                if chat.session.is_sending() || chat.input.buffer().trim().is_empty() {
                    return;
                }
                let text = chat.input.take();
                self.queue(PendingAction::SendMessage(text), "Waiting for reply…");
            }
            KeyCode::Up => {
                chat.input.history_previous();
            }
            KeyCode::Down => {
                chat.input.history_next();
            }
            KeyCode::PageUp => chat.scroll_back = chat.scroll_back.saturating_add(5),
            KeyCode::PageDown => chat.scroll_back = chat.scroll_back.saturating_sub(5),
            _ => {
                edit_text(&mut chat.input, key, false);
            }
        }
    }
}

/// Applies a plain editing key. Returns `true` when the text changed.
pub(crate) fn edit_text(input: &mut TextInput, key: KeyEvent, multiline: bool) -> bool {
    let before = input.buffer().len();
    match key.code {
        KeyCode::Char(ch)
            if !key
                .modifiers
                .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) =>
        {
            input.insert_char(ch);
            return true;
        }
        KeyCode::Enter if multiline => {
            input.insert_newline();
            return true;
        }
        KeyCode::Backspace => input.backspace(),
        KeyCode::Delete => input.delete(),
        KeyCode::Left => input.move_left(),
        KeyCode::Right => input.move_right(),
        KeyCode::Home => input.move_to_line_start(),
        KeyCode::End => input.move_to_line_end(),
        _ => {}
    }
    input.buffer().len() != before
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::sync::Arc;

    use super::*;
    use crate::api::fake::FakeAgentApi;
    use crate::config::ConsoleSettings;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    async fn form_app() -> App {
        let mut app = App::new(
            PathBuf::from("."),
            &ConsoleSettings::default(),
            Arc::new(FakeAgentApi::new()),
        );
        app.queue(PendingAction::OpenCreate, "");
        app.run_pending().await;
        app
    }

    #[tokio::test]
    async fn typing_in_name_field_updates_controller() {
        let mut app = form_app().await;
        for ch in "Bot".chars() {
            app.handle_key(press(KeyCode::Char(ch)));
        }
        let Screen::AgentForm(form) = &app.screen else {
            panic!("expected form screen");
        };
        assert_eq!(form.controller.name(), "Bot");
        assert!(form.controller.action().is_enabled());
    }

    #[tokio::test]
    async fn enter_on_disabled_save_does_nothing() {
        let mut app = form_app().await;
        app.handle_key(press(KeyCode::BackTab));
        app.handle_key(press(KeyCode::Enter));
        assert!(!app.has_pending());
        assert_eq!(app.status_message, "Nothing to save");
    }

    #[tokio::test]
    async fn escape_leaves_the_form() {
        let mut app = form_app().await;
        app.handle_key(press(KeyCode::Esc));
        assert!(matches!(app.screen, Screen::AgentList));
        assert_eq!(app.pending, Some(PendingAction::RefreshAgents));
    }

    #[test]
    fn edit_text_reports_changes() {
        let mut input = TextInput::new();
        assert!(edit_text(&mut input, press(KeyCode::Char('x')), false));
        assert!(!edit_text(&mut input, press(KeyCode::Left), false));
        assert!(!edit_text(&mut input, press(KeyCode::Enter), false));
        assert!(edit_text(&mut input, press(KeyCode::Enter), true));
        assert_eq!(input.buffer(), "\nx");
    }
}
