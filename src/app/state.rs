use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::Arc;

use crate::api::AgentApi;
use crate::chat::ChatSession;
use crate::directory::AgentDirectory;
use crate::form::{FormController, FormOptions, Notice};

/// The main application state.
pub struct App {
    /// Set to `true` to exit the main loop.
    pub should_quit: bool,
    pub screen: Screen,
    /// Modal shown above the screen; captures all input.
    pub overlay: Option<OverlayState>,
    /// Notices waiting for the current modal to close.
    pub(crate) queued_notices: VecDeque<Notice>,
    /// The message currently displayed in the status bar.
    pub status_message: String,
    pub workspace_root: PathBuf,
    pub base_url: String,
    pub directory: AgentDirectory,
    /// Work queued by a key press, run after the next frame is drawn.
    pub(crate) pending: Option<PendingAction>,
    pub(crate) api: Arc<dyn AgentApi>,
    pub(crate) options: FormOptions,
}

pub enum Screen {
    AgentList,
    AgentForm(FormScreen),
    Chat(ChatScreen),
}

impl Screen {
    pub fn title(&self) -> String {
        match self {
            Screen::AgentList => String::from("My Agents"),
            Screen::AgentForm(form) => match form.controller.identifier() {
                Some(name) => format!("Manage Agent · {}", name),
                None => String::from("Create Agent"),
            },
            Screen::Chat(chat) => format!("Chat · {}", chat.session.agent()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Name,
    Persona,
    Files,
    Action,
}

impl FormField {
    pub fn next(self) -> Self {
        match self {
            FormField::Name => FormField::Persona,
            FormField::Persona => FormField::Files,
            FormField::Files => FormField::Action,
            FormField::Action => FormField::Name,
        }
    }

    pub fn previous(self) -> Self {
        match self {
            FormField::Name => FormField::Action,
            FormField::Persona => FormField::Name,
            FormField::Files => FormField::Persona,
            FormField::Action => FormField::Files,
        }
    }
}

pub struct FormScreen {
    pub controller: FormController,
    pub focus: FormField,
    pub name_input: TextInput,
    pub persona_input: TextInput,
    pub selected_file: usize,
}

impl FormScreen {
    pub fn new(controller: FormController) -> Self {
        let name_input = TextInput::with_text(controller.name());
        let persona_input = TextInput::with_text(controller.persona());
        Self {
            controller,
            focus: FormField::Name,
            name_input,
            persona_input,
            selected_file: 0,
        }
    }

    pub fn selected_file_name(&self) -> Option<String> {
        self.controller
            .staging()
            .iter()
            .nth(self.selected_file)
            .map(|file| file.name().to_string())
    }

    pub fn clamp_selection(&mut self) {
        let len = self.controller.staging().len();
        if self.selected_file >= len {
            self.selected_file = len.saturating_sub(1);
        }
    }
}

pub struct ChatScreen {
    pub session: ChatSession,
    pub input: TextInput,
    /// Lines scrolled up from the bottom of the transcript.
    pub scroll_back: u16,
}

pub enum OverlayState {
    Notice(Notice),
    InputPrompt(InputPromptState),
    ConfirmDelete(ConfirmDeleteState),
}

pub struct InputPromptState {
    pub title: String,
    pub placeholder: String,
    pub value: TextInput,
    pub error: Option<String>,
    pub action: PendingInputAction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingInputAction {
    AddFiles,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteTarget {
    Agent(String),
    File(String),
}

pub struct ConfirmDeleteState {
    pub target: DeleteTarget,
    /// 0 = delete, 1 = cancel.
    pub selected_index: usize,
}

impl ConfirmDeleteState {
    pub fn display(&self) -> &str {
        match &self.target {
            DeleteTarget::Agent(name) | DeleteTarget::File(name) => name,
        }
    }
}

/// Network work deferred until after a redraw so the status line shows it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingAction {
    RefreshAgents,
    OpenCreate,
    OpenManage(String),
    OpenChat(String),
    Submit,
    AddFiles(Vec<PathBuf>),
    Delete(DeleteTarget),
    SendMessage(String),
    ClearChat,
}

/// Single-buffer text input with cursor and submit history.
#[derive(Debug, Clone, Default)]
pub struct TextInput {
    buffer: String,
    cursor: usize,
    history: Vec<String>,
    history_index: Option<usize>,
}

impl TextInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_text(text: &str) -> Self {
        Self {
            buffer: text.to_string(),
            cursor: text.len(),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    /// Inserts a character at the current cursor position.
    pub fn insert_char(&mut self, ch: char) {
        self.buffer.insert(self.cursor, ch);
        self.cursor += ch.len_utf8();
        self.reset_history_navigation();
    }

    pub fn insert_newline(&mut self) {
        self.insert_char('\n');
    }

    pub fn backspace(&mut self) {
        if self.cursor == 0 {
            return;
        }
        if let Some((idx, _)) = self.buffer[..self.cursor].char_indices().next_back() {
            self.buffer.drain(idx..self.cursor);
            self.cursor = idx;
            self.reset_history_navigation();
        }
    }

    pub fn delete(&mut self) {
        if let Some(ch) = self.buffer[self.cursor..].chars().next() {
            let end = self.cursor + ch.len_utf8();
            self.buffer.drain(self.cursor..end);
            self.reset_history_navigation();
        }
    }

    pub fn move_left(&mut self) {
        if let Some((idx, _)) = self.buffer[..self.cursor].char_indices().next_back() {
            self.cursor = idx;
        }
    }

    pub fn move_right(&mut self) {
        if let Some(ch) = self.buffer[self.cursor..].chars().next() {
            self.cursor += ch.len_utf8();
        }
    }

    /// Moves the cursor to the start of the current line.
    pub fn move_to_line_start(&mut self) {
        self.cursor = self.buffer[..self.cursor]
            .rfind('\n')
            .map(|pos| pos + 1)
            .unwrap_or(0);
    }

    /// Moves the cursor to the end of the current line.
    pub fn move_to_line_end(&mut self) {
        self.cursor = self.buffer[self.cursor..]
            .find('\n')
            .map(|pos| self.cursor + pos)
            .unwrap_or(self.buffer.len());
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
        self.cursor = 0;
        self.reset_history_navigation();
    }

    /// Takes the buffer, remembering non-blank entries in history.
    pub fn take(&mut self) -> String {
        let content = std::mem::take(&mut self.buffer);
        if !content.trim().is_empty() {
            self.history.push(content.clone());
        }
        self.cursor = 0;
        self.reset_history_navigation();
        content
    }

    pub fn history_previous(&mut self) -> bool {
        if self.history.is_empty() {
            return false;
        }
        let target = match self.history_index {
            Some(idx) => idx.saturating_sub(1),
            None => self.history.len() - 1,
        };
        self.load_history(target)
    }

    pub fn history_next(&mut self) -> bool {
        match self.history_index {
            Some(idx) if idx + 1 < self.history.len() => self.load_history(idx + 1),
            Some(_) => {
                self.history_index = None;
                self.buffer.clear();
                self.cursor = 0;
                true
            }
            None => false,
        }
    }

    fn load_history(&mut self, index: usize) -> bool {
        match self.history.get(index).cloned() {
            Some(entry) => {
                self.buffer = entry;
                self.cursor = self.buffer.len();
                self.history_index = Some(index);
                true
            }
            None => false,
        }
    }

    fn reset_history_navigation(&mut self) {
        self.history_index = None;
    }

    /// (col, row) of the cursor once the buffer is wrapped at `width` cells.
    pub fn cursor_display_position(&self, width: usize) -> (u16, u16) {
        if width == 0 {
            return (0, 0);
        }
        let mut col = 0usize;
        let mut row = 0usize;
        for ch in self.buffer[..self.cursor].chars() {
            if ch == '\n' {
                row += 1;
                col = 0;
                continue;
            }
            let char_width = unicode_width::UnicodeWidthChar::width(ch)
                .unwrap_or(1)
                .max(1);
            if col + char_width > width {
                row += 1;
                col = 0;
            }
            col += char_width;
        }
        (col as u16, row as u16)
    }
}
