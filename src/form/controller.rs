//! The agent form: one controller per create/manage screen.
//!
//! `FormController` owns the staged files, the last-saved snapshot and the
//! processing session, and drives the primary action through
//! `Save` -> `Saving…` -> `Processing Files…` -> `Save`.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::api::{AgentApi, AgentRecord, ApiResult};

use super::changes::FormSnapshot;
use super::notice::Notice;
use super::policy::{FilePolicy, NameError, validate_agent_name};
use super::poller::{PollEvent, Poller, SessionId};
use super::staging::{AddReport, DisplayStatus, LocalFile, StagingSet};
use super::upload::UploadBatch;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormMode {
    /// The agent does not exist yet; the first save creates it.
    Create,
    Manage,
}

/// State of the primary action control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionButton {
    Save { enabled: bool },
    Saving,
    ProcessingFiles,
}

impl ActionButton {
    pub fn label(&self) -> &'static str {
        match self {
            ActionButton::Save { .. } => "Save",
            ActionButton::Saving => "Saving…",
            ActionButton::ProcessingFiles => "Processing Files…",
        }
    }

    pub fn is_enabled(&self) -> bool {
        matches!(self, ActionButton::Save { enabled: true })
    }
}

/// Why a submit was refused before reaching the backend.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormError {
    #[error("Files are still being processed. Try again once processing has finished.")]
    StillProcessing,
    #[error("A save is already in progress")]
    SaveInProgress,
    #[error(transparent)]
    InvalidName(#[from] NameError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Refused locally; nothing was sent.
    Rejected,
    /// Saved and nothing left to process.
    Saved,
    /// Saved; uploaded files are now being processed.
    Processing,
    /// Nothing left to do on this agent; go back to the list.
    NavigateToList,
    /// A request failed; the user's edits are untouched.
    Failed,
}

#[derive(Debug, Clone)]
pub struct FormOptions {
    pub poll_interval: Duration,
    pub policy: FilePolicy,
}

impl Default for FormOptions {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(2),
            policy: FilePolicy::default(),
        }
    }
}

/// One run of the status poller plus the flags derived from its ticks.
struct ProcessingSession {
    poller: Poller,
    identifier: String,
    any_processing: bool,
}

pub struct FormController {
    api: Arc<dyn AgentApi>,
    options: FormOptions,
    mode: FormMode,
    /// Name the backend knows the agent by; changes after a rename.
    identifier: Option<String>,
    name: String,
    persona: String,
    created_at: Option<String>,
    staging: StagingSet,
    snapshot: FormSnapshot,
    action: ActionButton,
    session: Option<ProcessingSession>,
    next_session: SessionId,
    /// Set when a session completes; keeps the action enabled until the next save.
    just_completed: bool,
    events_tx: UnboundedSender<PollEvent>,
    events_rx: UnboundedReceiver<PollEvent>,
    notices: VecDeque<Notice>,
}

impl FormController {
    /// Blank form for a new agent.
    pub fn create(api: Arc<dyn AgentApi>, options: FormOptions) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            api,
            options,
            mode: FormMode::Create,
            identifier: None,
            name: String::new(),
            persona: String::new(),
            created_at: None,
            staging: StagingSet::new(),
            snapshot: FormSnapshot::default(),
            action: ActionButton::Save { enabled: false },
            session: None,
            next_session: 1,
            just_completed: false,
            events_tx,
            events_rx,
            notices: VecDeque::new(),
        }
    }

    /// Loads an existing agent and starts following any processing that is
    /// still running from an earlier session.
    pub async fn load(
        api: Arc<dyn AgentApi>,
        identifier: &str,
        options: FormOptions,
    ) -> ApiResult<Self> {
        let record = api.get_agent(identifier).await?;
        let mut form = Self::create(api, options);
        form.mode = FormMode::Manage;
        form.identifier = Some(record.name.clone());
        form.apply_record(&record);
        let in_flight = form.staging.any_in_flight();
        form.start_session(in_flight);
        Ok(form)
    }

    fn apply_record(&mut self, record: &AgentRecord) {
        self.name = record.name.clone();
        self.persona = record.persona.clone();
        self.created_at = record.created_at.clone();
        self.staging = StagingSet::from_record(record);
        self.snapshot = FormSnapshot::capture(&self.name, &self.persona, &self.staging);
        self.refresh_action();
    }

    // --- Accessors ---

    pub fn mode(&self) -> FormMode {
        self.mode
    }

    pub fn identifier(&self) -> Option<&str> {
        self.identifier.as_deref()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn persona(&self) -> &str {
        &self.persona
    }

    pub fn created_at(&self) -> Option<&str> {
        self.created_at.as_deref()
    }

    pub fn staging(&self) -> &StagingSet {
        &self.staging
    }

    pub fn action(&self) -> ActionButton {
        self.action
    }

    pub fn policy(&self) -> &FilePolicy {
        &self.options.policy
    }

    pub fn has_changes(&self) -> bool {
        self.snapshot
            .has_changes(&self.name, &self.persona, &self.staging)
    }

    /// The latest tick of the active session saw pending/processing files.
    pub fn is_processing(&self) -> bool {
        self.session
            .as_ref()
            .map(|session| session.any_processing)
            .unwrap_or(false)
    }

    pub fn has_session(&self) -> bool {
        self.session.is_some()
    }

    pub fn just_completed(&self) -> bool {
        self.just_completed
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        self.notices.drain(..).collect()
    }

    // --- Edits ---

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
        self.refresh_action();
    }

    pub fn set_persona(&mut self, persona: impl Into<String>) {
        self.persona = persona.into();
        self.refresh_action();
    }

    /// Stages a batch of files; refused files produce one combined notice.
    pub fn add_files(&mut self, files: Vec<LocalFile>) -> AddReport {
        let report = self.staging.add_batch(files, &self.options.policy);
        if !report.rejected.is_empty() {
            self.notices.push_back(Notice::rejected_files(
                self.options.policy.rejection_reason(),
                &report.rejected,
            ));
        }
        if !report.duplicates.is_empty() {
            debug!("ignored duplicate files: {:?}", report.duplicates);
        }
        self.refresh_action();
        report
    }

    /// Removes a file. Server-known files are deleted on the backend first;
    /// if that fails the entry stays. Returns whether the entry was removed.
    pub async fn remove_file(&mut self, name: &str) -> bool {
        let Some(file) = self.staging.get(name) else {
            return false;
        };
        if file.is_existing()
            && let Some(identifier) = self.identifier.clone()
        {
            if let Err(err) = self.api.delete_file(&identifier, name).await {
                warn!("failed to delete {} from {}: {}", name, identifier, err);
                self.notices.push_back(Notice::error(
                    "Could not delete file",
                    format!("{}: {}", name, err.user_message()),
                ));
                return false;
            }
            info!("deleted {} from {}", name, identifier);
        }
        // The entry may already be gone if a reconcile raced the request.
        self.staging.remove(name);
        self.refresh_action();
        true
    }

    // --- Submit ---

    /// Local preconditions for a submit; nothing is sent when this fails.
    pub fn check_submittable(&self) -> Result<(), FormError> {
        if self.is_processing() {
            return Err(FormError::StillProcessing);
        }
        if self.action == ActionButton::Saving {
            return Err(FormError::SaveInProgress);
        }
        validate_agent_name(&self.name)?;
        Ok(())
    }

    pub async fn submit(&mut self) -> SubmitOutcome {
        if let Err(err) = self.check_submittable() {
            let notice = match &err {
                FormError::StillProcessing => Notice::warning("Please wait", err.to_string()),
                FormError::InvalidName(_) => Notice::error("Invalid agent name", err.to_string()),
                FormError::SaveInProgress => return SubmitOutcome::Rejected,
            };
            self.notices.push_back(notice);
            return SubmitOutcome::Rejected;
        }

        let was_create = self.mode == FormMode::Create;
        let had_changes = self.has_changes();
        self.action = ActionButton::Saving;

        let saved = match self.identifier.clone() {
            Some(identifier) if !was_create => {
                self.api
                    .update_agent(&identifier, &self.name, &self.persona)
                    .await
            }
            _ => self.api.create_agent(&self.name, &self.persona).await,
        };
        let record = match saved {
            Ok(record) => record,
            Err(err) => {
                warn!("saving agent {} failed: {}", self.name, err);
                return self.fail("Save failed", err.user_message());
            }
        };
        self.after_save(&record);

        let Some(identifier) = self.identifier.clone() else {
            return self.fail("Save failed", "The backend did not return an agent name".into());
        };

        if let Some(batch) = UploadBatch::collect(&self.staging) {
            self.action = ActionButton::ProcessingFiles;
            match batch
                .submit(self.api.as_ref(), &identifier, &mut self.staging)
                .await
            {
                Ok(summary) => {
                    if !summary.rejected.is_empty() {
                        let reason = summary
                            .rejection_reason
                            .as_deref()
                            .unwrap_or(self.options.policy.rejection_reason());
                        self.notices
                            .push_back(Notice::rejected_files(reason, &summary.rejected));
                    }
                    if !summary.uploaded.is_empty() {
                        self.just_completed = false;
                        self.start_session(true);
                        return SubmitOutcome::Processing;
                    }
                }
                Err(err) => {
                    warn!("upload to {} failed: {}", identifier, err);
                    return self.fail("Upload failed", err.user_message());
                }
            }
        }

        // Nothing to process: the save is complete.
        self.snapshot = FormSnapshot::capture(&self.name, &self.persona, &self.staging);
        let acknowledged = !had_changes && self.just_completed;
        self.just_completed = false;
        self.action = ActionButton::Save { enabled: false };
        self.refresh_action();

        if was_create || acknowledged {
            SubmitOutcome::NavigateToList
        } else {
            self.notices
                .push_back(Notice::success("Saved", format!("{} was saved", self.name)));
            SubmitOutcome::Saved
        }
    }

    fn after_save(&mut self, record: &AgentRecord) {
        let saved_name = if record.name.is_empty() {
            self.name.clone()
        } else {
            record.name.clone()
        };
        let renamed = self
            .identifier
            .as_deref()
            .is_some_and(|previous| previous != saved_name);
        if self.mode == FormMode::Create {
            info!("created agent {}", saved_name);
            self.created_at = record.created_at.clone();
        } else if renamed {
            info!("renamed agent to {}", saved_name);
        }
        self.mode = FormMode::Manage;
        self.identifier = Some(saved_name);
        self.snapshot.name = self.name.clone();
        self.snapshot.persona = self.persona.clone();

        // A session still following the old name would only see 404s.
        if renamed && let Some(session) = self.session.as_ref() {
            let in_flight = session.any_processing || self.staging.any_in_flight();
            self.start_session(in_flight);
        }
    }

    fn fail(&mut self, title: &str, detail: String) -> SubmitOutcome {
        self.stop_session();
        self.notices.push_back(Notice::error(title, detail));
        self.action = ActionButton::Save { enabled: true };
        SubmitOutcome::Failed
    }

    // --- Processing session ---

    fn start_session(&mut self, started_processing: bool) {
        self.stop_session();
        let Some(identifier) = self.identifier.clone() else {
            return;
        };
        let session = self.next_session;
        self.next_session += 1;
        let poller = Poller::spawn(
            Arc::clone(&self.api),
            identifier.clone(),
            self.options.poll_interval,
            session,
            started_processing,
            self.events_tx.clone(),
        );
        self.session = Some(ProcessingSession {
            poller,
            identifier,
            any_processing: started_processing,
        });
    }

    /// Stops polling. Safe to call repeatedly; also runs on drop.
    pub fn stop_session(&mut self) {
        if let Some(session) = self.session.take() {
            debug!(
                "stopping processing session {} for {}",
                session.poller.session(),
                session.identifier
            );
            session.poller.stop();
        }
    }

    /// Drains every event that has already arrived. Returns how many applied.
    pub fn poll_events(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(event) = self.events_rx.try_recv() {
            if self.apply_event(event) {
                applied += 1;
            }
        }
        applied
    }

    /// Waits for the next event of the active session. Returns `false` when
    /// there is no session to wait on.
    pub async fn next_event(&mut self) -> bool {
        while self.session.is_some() {
            match self.events_rx.recv().await {
                Some(event) => {
                    if self.apply_event(event) {
                        return true;
                    }
                }
                None => return false,
            }
        }
        false
    }

    /// Follows the active session until it completes or goes idle.
    pub async fn wait_for_processing(&mut self) {
        while self.next_event().await {}
    }

    fn apply_event(&mut self, event: PollEvent) -> bool {
        let current = self.session.as_ref().map(|session| session.poller.session());
        if current != Some(event.session()) {
            debug!("dropping event from stale session {}", event.session());
            return false;
        }
        match event {
            PollEvent::Status {
                files,
                any_processing,
                ..
            } => {
                for (name, entry) in files {
                    self.staging.set_status(
                        &name,
                        DisplayStatus::parse(&entry.status),
                        Some(entry.message),
                    );
                }
                if let Some(session) = self.session.as_mut() {
                    session.any_processing = any_processing;
                }
            }
            PollEvent::Completed { record, .. } => self.complete(record),
            PollEvent::Idle { .. } => {
                self.session = None;
                if self.action == ActionButton::ProcessingFiles {
                    self.action = ActionButton::Save { enabled: true };
                }
                self.refresh_action();
            }
        }
        true
    }

    fn complete(&mut self, record: Option<AgentRecord>) {
        self.session = None;
        // Without a record the last poll statuses stand. The batch became
        // server-known when its upload succeeded; anything staged since stays pending.
        match record {
            Some(record) => self.staging.reconcile(&record),
            None => debug!("completion re-fetch failed; keeping polled statuses"),
        }
        // Keep the last saved fields; only the file set moves forward.
        let (name, persona) = (self.snapshot.name.clone(), self.snapshot.persona.clone());
        self.snapshot = FormSnapshot::capture(&name, &persona, &self.staging);
        self.just_completed = true;
        self.action = ActionButton::Save { enabled: true };
        self.refresh_action();

        let failed: Vec<String> = self
            .staging
            .iter()
            .filter(|file| file.status == DisplayStatus::Error)
            .map(|file| file.name().to_string())
            .collect();
        if failed.is_empty() {
            self.notices
                .push_back(Notice::success("Processing complete", "All files are ready"));
        } else {
            self.notices.push_back(Notice::warning(
                "Processing finished with errors",
                failed.join(", "),
            ));
        }
    }

    fn refresh_action(&mut self) {
        if let ActionButton::Save { .. } = self.action {
            self.action = ActionButton::Save {
                enabled: self.has_changes() || self.just_completed,
            };
        }
    }
}

impl Drop for FormController {
    fn drop(&mut self) {
        self.stop_session();
    }
}
