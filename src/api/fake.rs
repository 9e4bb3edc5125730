//! In-memory `AgentApi` used by the unit tests. Records every call in order.

use std::collections::{BTreeMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;

use super::models::{Citation, Conversation, FileStatusEntry};
use super::{
    AgentApi, AgentRecord, AgentSummary, ApiError, ApiResult, ChatHistory, ChatMessage, FileRecord,
    ProcessingStatus, SendMessageResponse, UploadPart, UploadResponse,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    List,
    Create(String),
    Get(String),
    Update(String, String),
    DeleteAgent(String),
    Upload(String, Vec<String>),
    DeleteFile(String, String),
    Status(String),
    ChatHistory(String),
    SendMessage(String, String),
    ClearChat(String),
}

#[derive(Default)]
struct State {
    agents: BTreeMap<String, AgentRecord>,
    chats: BTreeMap<String, Vec<ChatMessage>>,
    calls: Vec<Call>,
    status_script: VecDeque<ProcessingStatus>,
    status_failures: usize,
    fail_get: bool,
    fail_create: Option<String>,
    fail_update: Option<String>,
    fail_uploads: Option<String>,
    fail_delete_file: Option<String>,
    reject_uploads: Vec<String>,
    rejection_reason: Option<String>,
    upload_echo: Vec<FileRecord>,
}

#[derive(Default)]
pub struct FakeAgentApi {
    state: Mutex<State>,
}

pub fn file(name: &str, processed: bool, status: &str) -> FileRecord {
    FileRecord {
        name: name.into(),
        size: 4,
        mime_type: "application/pdf".into(),
        processed,
        processing_status: Some(status.into()),
        error_message: None,
    }
}

pub fn status(complete: bool, files: &[(&str, &str)]) -> ProcessingStatus {
    ProcessingStatus {
        agent_name: None,
        processing_complete: complete,
        files_processed: complete && files.iter().all(|(_, status)| *status == "success"),
        file_status: files
            .iter()
            .map(|(name, status)| {
                (
                    name.to_string(),
                    FileStatusEntry {
                        status: status.to_string(),
                        message: String::new(),
                    },
                )
            })
            .collect(),
    }
}

impl FakeAgentApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_agent(name: &str, persona: &str) -> Self {
        let api = Self::new();
        api.insert_agent(name, persona, Vec::new());
        api
    }

    pub fn insert_agent(&self, name: &str, persona: &str, files: Vec<FileRecord>) {
        self.lock().agents.insert(
            name.to_string(),
            AgentRecord {
                name: name.to_string(),
                persona: persona.to_string(),
                created_at: Some("2024-01-01T00:00:00".into()),
                updated_at: None,
                files,
            },
        );
    }

    pub fn agent(&self, name: &str) -> Option<AgentRecord> {
        self.lock().agents.get(name).cloned()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.lock().calls.clone()
    }

    pub fn count(&self, predicate: impl Fn(&Call) -> bool) -> usize {
        self.lock().calls.iter().filter(|call| predicate(call)).count()
    }

    pub fn status_calls(&self) -> usize {
        self.count(|call| matches!(call, Call::Status(_)))
    }

    /// Served in order; the last entry repeats once the queue is down to one.
    pub fn script_status(&self, script: Vec<ProcessingStatus>) {
        self.lock().status_script = script.into();
    }

    pub fn fail_next_status(&self, times: usize) {
        self.lock().status_failures = times;
    }

    pub fn fail_get(&self) {
        self.lock().fail_get = true;
    }

    pub fn fail_create(&self, message: &str) {
        self.lock().fail_create = Some(message.into());
    }

    pub fn fail_update(&self, message: &str) {
        self.lock().fail_update = Some(message.into());
    }

    pub fn fail_uploads(&self, message: &str) {
        self.lock().fail_uploads = Some(message.into());
    }

    pub fn fail_delete_file(&self, message: &str) {
        self.lock().fail_delete_file = Some(message.into());
    }

    pub fn reject_uploads(&self, names: &[&str], reason: &str) {
        let mut state = self.lock();
        state.reject_uploads = names.iter().map(|name| name.to_string()).collect();
        state.rejection_reason = Some(reason.into());
    }

    pub fn echo_upload(&self, file: FileRecord) {
        self.lock().upload_echo.push(file);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }
}

fn not_found(what: &str) -> ApiError {
    ApiError::Status {
        status: 404,
        message: format!("{} not found", what),
    }
}

fn failed(message: &str) -> ApiError {
    ApiError::Status {
        status: 500,
        message: message.to_string(),
    }
}

impl State {
    fn next_status(&mut self, name: &str) -> ApiResult<ProcessingStatus> {
        let scripted = if self.status_script.len() > 1 {
            self.status_script.pop_front()
        } else {
            self.status_script.front().cloned()
        };
        let agent = self.agents.get_mut(name).ok_or_else(|| not_found("Agent"))?;
        match scripted {
            Some(status) => {
                for file in agent.files.iter_mut() {
                    if let Some(entry) = status.file_status.get(&file.name) {
                        file.processing_status = Some(entry.status.clone());
                        file.processed = entry.status == "success";
                    }
                }
                Ok(status)
            }
            None => {
                let file_status = agent
                    .files
                    .iter()
                    .map(|file| {
                        (
                            file.name.clone(),
                            FileStatusEntry {
                                status: file.processing_status.clone().unwrap_or_default(),
                                message: String::new(),
                            },
                        )
                    })
                    .collect();
                Ok(ProcessingStatus {
                    agent_name: Some(name.to_string()),
                    processing_complete: true,
                    files_processed: agent.files.iter().all(|file| file.processed),
                    file_status,
                })
            }
        }
    }
}

#[async_trait]
impl AgentApi for FakeAgentApi {
    async fn list_agents(&self) -> ApiResult<Vec<AgentSummary>> {
        let mut state = self.lock();
        state.calls.push(Call::List);
        Ok(state
            .agents
            .values()
            .map(|agent| {
                let complete =
                    !agent.files.is_empty() && agent.files.iter().all(|file| file.processed);
                AgentSummary {
                    name: agent.name.clone(),
                    created_at: agent.created_at.clone(),
                    persona: agent.persona.clone(),
                    processing_status: None,
                    processing_complete: complete,
                    files_processed: complete,
                    processing_results: complete.then(|| serde_json::Value::Array(Vec::new())),
                    processing_error: None,
                }
            })
            .collect())
    }

    async fn create_agent(&self, name: &str, persona: &str) -> ApiResult<AgentRecord> {
        let mut state = self.lock();
        state.calls.push(Call::Create(name.to_string()));
        if let Some(message) = state.fail_create.clone() {
            return Err(failed(&message));
        }
        if state.agents.contains_key(name) {
            return Err(ApiError::Status {
                status: 400,
                message: "Agent with this name already exists".into(),
            });
        }
        let record = AgentRecord {
            name: name.to_string(),
            persona: persona.to_string(),
            ..AgentRecord::default()
        };
        state.agents.insert(name.to_string(), record.clone());
        Ok(record)
    }

    async fn get_agent(&self, name: &str) -> ApiResult<AgentRecord> {
        let mut state = self.lock();
        state.calls.push(Call::Get(name.to_string()));
        if state.fail_get {
            return Err(ApiError::Transport("connection refused".into()));
        }
        state.agents.get(name).cloned().ok_or_else(|| not_found("Agent"))
    }

    async fn update_agent(
        &self,
        name: &str,
        new_name: &str,
        persona: &str,
    ) -> ApiResult<AgentRecord> {
        let mut state = self.lock();
        state
            .calls
            .push(Call::Update(name.to_string(), new_name.to_string()));
        if let Some(message) = state.fail_update.clone() {
            return Err(failed(&message));
        }
        let mut record = state.agents.remove(name).ok_or_else(|| not_found("Agent"))?;
        record.name = new_name.to_string();
        record.persona = persona.to_string();
        state.agents.insert(new_name.to_string(), record.clone());
        Ok(record)
    }

    async fn delete_agent(&self, name: &str) -> ApiResult<()> {
        let mut state = self.lock();
        state.calls.push(Call::DeleteAgent(name.to_string()));
        state.agents.remove(name).map(|_| ()).ok_or_else(|| not_found("Agent"))
    }

    async fn upload_files(&self, name: &str, files: Vec<UploadPart>) -> ApiResult<UploadResponse> {
        let mut state = self.lock();
        let names: Vec<String> = files.iter().map(|file| file.name.clone()).collect();
        state.calls.push(Call::Upload(name.to_string(), names));
        if let Some(message) = state.fail_uploads.clone() {
            return Err(failed(&message));
        }
        let rejected = state.reject_uploads.clone();
        let reason = state.rejection_reason.clone();
        let echo = state.upload_echo.clone();
        let agent = state.agents.get_mut(name).ok_or_else(|| not_found("Agent"))?;
        let mut accepted = Vec::new();
        let mut rejected_files = Vec::new();
        for part in files {
            if rejected.contains(&part.name) {
                rejected_files.push(part.name);
                continue;
            }
            let record = FileRecord {
                name: part.name.clone(),
                size: part.bytes.len() as u64,
                mime_type: part.mime_type,
                processed: false,
                processing_status: Some("pending".into()),
                error_message: None,
            };
            agent.files.retain(|file| file.name != part.name);
            agent.files.push(record.clone());
            accepted.push(record);
        }
        Ok(UploadResponse {
            message: Some("Files uploaded successfully".into()),
            files: if echo.is_empty() { Vec::new() } else { echo },
            rejection_reason: if rejected_files.is_empty() { None } else { reason },
            rejected_files,
        })
    }

    async fn delete_file(&self, name: &str, filename: &str) -> ApiResult<()> {
        let mut state = self.lock();
        state
            .calls
            .push(Call::DeleteFile(name.to_string(), filename.to_string()));
        if let Some(message) = state.fail_delete_file.clone() {
            return Err(failed(&message));
        }
        let agent = state.agents.get_mut(name).ok_or_else(|| not_found("Agent"))?;
        let before = agent.files.len();
        agent.files.retain(|file| file.name != filename);
        if agent.files.len() == before {
            return Err(not_found("File"));
        }
        Ok(())
    }

    async fn processing_status(&self, name: &str) -> ApiResult<ProcessingStatus> {
        let mut state = self.lock();
        state.calls.push(Call::Status(name.to_string()));
        if state.status_failures > 0 {
            state.status_failures -= 1;
            return Err(ApiError::Transport("timed out".into()));
        }
        state.next_status(name)
    }

    async fn chat_history(&self, name: &str) -> ApiResult<ChatHistory> {
        let mut state = self.lock();
        state.calls.push(Call::ChatHistory(name.to_string()));
        let messages = state.chats.get(name).cloned().unwrap_or_default();
        let conversations = if messages.is_empty() {
            Vec::new()
        } else {
            vec![Conversation {
                conversation_id: "default".into(),
                messages,
            }]
        };
        Ok(ChatHistory { conversations })
    }

    async fn send_message(
        &self,
        name: &str,
        conversation_id: &str,
        message: &str,
    ) -> ApiResult<SendMessageResponse> {
        let mut state = self.lock();
        state
            .calls
            .push(Call::SendMessage(name.to_string(), message.to_string()));
        if !state.agents.contains_key(name) {
            return Err(not_found("Agent"));
        }
        let reply = ChatMessage {
            role: "assistant".into(),
            content: format!("You said: {} [^1]", message),
            citations: vec![Citation {
                id: 1,
                file: "a.pdf".into(),
                page: Some(1),
                text: "excerpt".into(),
            }],
            timestamp: None,
        };
        let history = state.chats.entry(name.to_string()).or_default();
        history.push(ChatMessage {
            role: "user".into(),
            content: message.to_string(),
            ..ChatMessage::default()
        });
        history.push(reply.clone());
        Ok(SendMessageResponse {
            conversation_id: conversation_id.to_string(),
            message: reply,
        })
    }

    async fn clear_chat(&self, name: &str) -> ApiResult<()> {
        let mut state = self.lock();
        state.calls.push(Call::ClearChat(name.to_string()));
        state.chats.remove(name);
        Ok(())
    }
}
