use std::path::PathBuf;
use std::sync::Arc;

use log::{info, warn};

use super::{App, ChatScreen, DeleteTarget, FormScreen, OverlayState, PendingAction, Screen, TextInput};
use crate::chat::ChatSession;
use crate::form::{FormController, LocalFile, Notice, NoticeLevel, SubmitOutcome};

impl App {
    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Queues network work; the status line shows `status` until it runs.
    pub(crate) fn queue(&mut self, action: PendingAction, status: impl Into<String>) {
        self.status_message = status.into();
        self.pending = Some(action);
    }

    /// Runs the queued action, if any.
    pub async fn run_pending(&mut self) {
        let Some(action) = self.pending.take() else {
            return;
        };
        match action {
            PendingAction::RefreshAgents => self.refresh_agents().await,
            PendingAction::OpenCreate => {
                let controller = FormController::create(Arc::clone(&self.api), self.options.clone());
                self.screen = Screen::AgentForm(FormScreen::new(controller));
                self.status_message = String::from("Name the agent, describe its persona and add PDFs");
            }
            PendingAction::OpenManage(name) => self.open_manage(&name).await,
            PendingAction::OpenChat(name) => self.open_chat(&name).await,
            PendingAction::Submit => self.submit_form().await,
            PendingAction::AddFiles(paths) => self.add_files(paths).await,
            PendingAction::Delete(target) => self.delete(target).await,
            PendingAction::SendMessage(text) => self.send_message(&text).await,
            PendingAction::ClearChat => self.clear_chat().await,
        }
        self.absorb_form_notices();
    }

    async fn refresh_agents(&mut self) {
        match self.directory.refresh().await {
            Ok(()) => {
                self.status_message = format!(
                    "{} agent(s) · Enter manage · n new · c chat · d delete · r refresh · q quit",
                    self.directory.agents().len()
                );
            }
            Err(err) => {
                warn!("failed to load agents: {}", err);
                self.status_message = String::from("Could not load agents");
                self.show_notice(Notice::error("Could not load agents", err.user_message()));
            }
        }
    }

    async fn open_manage(&mut self, name: &str) {
        match FormController::load(Arc::clone(&self.api), name, self.options.clone()).await {
            Ok(controller) => {
                self.screen = Screen::AgentForm(FormScreen::new(controller));
                self.status_message =
                    String::from("Tab next field · Ctrl+O add files · Ctrl+S save · Esc back");
            }
            Err(err) => {
                warn!("failed to load agent {}: {}", name, err);
                self.show_notice(Notice::error("Could not load agent", err.user_message()));
            }
        }
    }

    async fn open_chat(&mut self, name: &str) {
        let mut session = ChatSession::new(Arc::clone(&self.api), name);
        match session.load().await {
            Ok(()) => {
                self.screen = Screen::Chat(ChatScreen {
                    session,
                    input: TextInput::new(),
                    scroll_back: 0,
                });
                self.status_message = String::from("Enter send · Ctrl+L clear history · Esc back");
            }
            Err(err) => {
                warn!("failed to load chat for {}: {}", name, err);
                self.show_notice(Notice::error("Could not load chat", err.user_message()));
            }
        }
    }

    async fn submit_form(&mut self) {
        let Screen::AgentForm(form) = &mut self.screen else {
            return;
        };
        let outcome = form.controller.submit().await;
        form.clamp_selection();
        self.status_message = match outcome {
            SubmitOutcome::Processing => String::from("Processing files…"),
            SubmitOutcome::Saved => String::from("Saved"),
            SubmitOutcome::Rejected | SubmitOutcome::Failed => String::from("Not saved"),
            SubmitOutcome::NavigateToList => String::new(),
        };
        if outcome == SubmitOutcome::NavigateToList {
            self.absorb_form_notices();
            self.back_to_list();
        }
    }

    async fn add_files(&mut self, paths: Vec<PathBuf>) {
        let mut files = Vec::new();
        let mut unreadable = Vec::new();
        for path in paths {
            match LocalFile::read(&path).await {
                Ok(file) => files.push(file),
                Err(err) => {
                    warn!("{:#}", err);
                    unreadable.push(path.display().to_string());
                }
            }
        }
        if !unreadable.is_empty() {
            self.show_notice(Notice::error("Could not read files", unreadable.join(", ")));
        }
        if let Screen::AgentForm(form) = &mut self.screen {
            let report = form.controller.add_files(files);
            self.status_message = format!("{} file(s) staged", report.added.len());
        }
    }

    async fn delete(&mut self, target: DeleteTarget) {
        match target {
            DeleteTarget::Agent(name) => match self.directory.delete(&name).await {
                Ok(()) => self.status_message = format!("Deleted {}", name),
                Err(err) => {
                    warn!("failed to delete agent {}: {}", name, err);
                    self.show_notice(Notice::error("Could not delete agent", err.user_message()));
                }
            },
            DeleteTarget::File(name) => {
                if let Screen::AgentForm(form) = &mut self.screen
                    && form.controller.remove_file(&name).await
                {
                    form.clamp_selection();
                    self.status_message = format!("Removed {}", name);
                }
            }
        }
    }

    async fn send_message(&mut self, text: &str) {
        let Screen::Chat(chat) = &mut self.screen else {
            return;
        };
        chat.scroll_back = 0;
        let result = chat.session.send(text).await;
        self.status_message = String::from("Enter send · Ctrl+L clear history · Esc back");
        if let Err(notice) = result {
            self.show_notice(notice);
        }
    }

    async fn clear_chat(&mut self) {
        let Screen::Chat(chat) = &mut self.screen else {
            return;
        };
        match chat.session.clear().await {
            Ok(()) => self.status_message = String::from("Chat history cleared"),
            Err(notice) => self.show_notice(notice),
        }
    }

    /// Leaves the current screen. A form's processing session stops here.
    pub(crate) fn back_to_list(&mut self) {
        if let Screen::AgentForm(form) = &mut self.screen {
            form.controller.stop_session();
            info!("closed form for {}", form.controller.name());
        }
        self.screen = Screen::AgentList;
        self.queue(PendingAction::RefreshAgents, "Loading agents…");
    }

    /// Blocking notices open a modal; the rest go to the status line.
    pub(crate) fn show_notice(&mut self, notice: Notice) {
        if !notice.is_blocking() && notice.level != NoticeLevel::Warning {
            self.status_message = if notice.detail.is_empty() {
                notice.title
            } else {
                format!("{}: {}", notice.title, notice.detail)
            };
            return;
        }
        if self.overlay.is_none() {
            self.overlay = Some(OverlayState::Notice(notice));
        } else {
            self.queued_notices.push_back(notice);
        }
    }

    pub(crate) fn dismiss_notice(&mut self) {
        self.overlay = self.queued_notices.pop_front().map(OverlayState::Notice);
    }

    pub(crate) fn absorb_form_notices(&mut self) {
        let notices = match &mut self.screen {
            Screen::AgentForm(form) => form.controller.take_notices(),
            _ => return,
        };
        for notice in notices {
            self.show_notice(notice);
        }
    }
}
