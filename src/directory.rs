//! The agent list shown on the dashboard.

use std::sync::Arc;

use log::info;

use crate::api::{AgentApi, AgentSummary, ApiResult};

/// Readiness derived from the list row's processing flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Badge {
    Ready,
    Failed,
    Processing,
    /// No processing run has finished yet: no files, or the first batch is still going.
    Pending,
}

impl Badge {
    pub fn of(agent: &AgentSummary) -> Self {
        match (agent.processing_complete, agent.files_processed) {
            (true, true) => Badge::Ready,
            (true, false) => Badge::Failed,
            (false, _) if agent.has_processing_history() => Badge::Processing,
            (false, _) => Badge::Pending,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Badge::Ready => "Ready",
            Badge::Failed => "Failed",
            Badge::Processing => "Processing",
            Badge::Pending => "Pending",
        }
    }
}

pub struct AgentDirectory {
    api: Arc<dyn AgentApi>,
    agents: Vec<AgentSummary>,
    selected: usize,
}

impl AgentDirectory {
    pub fn new(api: Arc<dyn AgentApi>) -> Self {
        Self {
            api,
            agents: Vec::new(),
            selected: 0,
        }
    }

    /// Reloads the list, keeping the selection on the same agent when it survives.
    pub async fn refresh(&mut self) -> ApiResult<()> {
        let previous = self.selected_agent().map(|agent| agent.name.clone());
        self.agents = self.api.list_agents().await?;
        self.selected = previous
            .and_then(|name| self.agents.iter().position(|agent| agent.name == name))
            .unwrap_or(0);
        self.clamp_selection();
        Ok(())
    }

    pub fn agents(&self) -> &[AgentSummary] {
        &self.agents
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    pub fn selected_index(&self) -> usize {
        self.selected
    }

    pub fn selected_agent(&self) -> Option<&AgentSummary> {
        self.agents.get(self.selected)
    }

    pub fn select_next(&mut self) {
        if !self.agents.is_empty() {
            self.selected = (self.selected + 1) % self.agents.len();
        }
    }

    pub fn select_previous(&mut self) {
        if !self.agents.is_empty() {
            self.selected = self
                .selected
                .checked_sub(1)
                .unwrap_or(self.agents.len() - 1);
        }
    }

    /// Deletes the agent on the backend, then drops it from the local list.
    pub async fn delete(&mut self, name: &str) -> ApiResult<()> {
        self.api.delete_agent(name).await?;
        info!("deleted agent {}", name);
        self.agents.retain(|agent| agent.name != name);
        self.clamp_selection();
        Ok(())
    }

    fn clamp_selection(&mut self) {
        if self.selected >= self.agents.len() {
            self.selected = self.agents.len().saturating_sub(1);
        }
    }
}
