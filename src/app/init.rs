use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::Arc;

use log::debug;

use super::{App, PendingAction, Screen};
use crate::api::AgentApi;
use crate::config::ConsoleSettings;
use crate::directory::AgentDirectory;

impl App {
    /// Creates the console state. The agent list is loaded on the first frame.
    pub fn new(workspace_root: PathBuf, settings: &ConsoleSettings, api: Arc<dyn AgentApi>) -> Self {
        let canonical_root = workspace_root.canonicalize().unwrap_or(workspace_root);
        debug!(
            "initializing console for {} against {}",
            canonical_root.display(),
            settings.base_url
        );

        Self {
            should_quit: false,
            screen: Screen::AgentList,
            overlay: None,
            queued_notices: VecDeque::new(),
            status_message: String::from("Loading agents…"),
            workspace_root: canonical_root,
            base_url: settings.base_url.clone(),
            directory: AgentDirectory::new(Arc::clone(&api)),
            pending: Some(PendingAction::RefreshAgents),
            api,
            options: settings.form_options(),
        }
    }
}
