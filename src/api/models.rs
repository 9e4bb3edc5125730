//! Wire structures for the agent console REST API.
//! Field names follow the JSON the backend emits; unknown fields are ignored.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

// --- Agents ---

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AgentList {
    #[serde(default)]
    pub agents: Vec<AgentSummary>,
}

/// One row of `GET /api/agents`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AgentSummary {
    pub name: String,
    #[serde(default, rename = "createdAt")]
    pub created_at: Option<String>,
    #[serde(default)]
    pub persona: String,
    #[serde(default)]
    pub processing_status: Option<String>,
    #[serde(default)]
    pub processing_complete: bool,
    #[serde(default)]
    pub files_processed: bool,
    /// Written by the backend when a processing run finishes.
    #[serde(default)]
    pub processing_results: Option<serde_json::Value>,
    #[serde(default)]
    pub processing_error: Option<String>,
}

impl AgentSummary {
    /// Whether any processing run has finished for this agent, successfully or not.
    pub fn has_processing_history(&self) -> bool {
        self.processing_results.is_some() || self.processing_error.is_some()
    }
}

/// Full agent record from `GET /api/agents/{name}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AgentRecord {
    pub name: String,
    #[serde(default)]
    pub persona: String,
    #[serde(default, rename = "createdAt")]
    pub created_at: Option<String>,
    #[serde(default, rename = "updatedAt")]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub files: Vec<FileRecord>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FileRecord {
    pub name: String,
    #[serde(default)]
    pub size: u64,
    #[serde(default, rename = "type")]
    pub mime_type: String,
    #[serde(default)]
    pub processed: bool,
    #[serde(default)]
    pub processing_status: Option<String>,
    #[serde(default)]
    pub error_message: Option<String>,
}

/// Body of `POST /api/agents` and `PUT /api/agents/{name}`.
#[derive(Debug, Clone, Serialize)]
pub struct AgentPayload<'a> {
    pub name: &'a str,
    pub persona: &'a str,
}

/// Create/update acknowledgement. The backend wraps the record under `agent`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AgentMutation {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub agent: Option<AgentRecord>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Ack {
    #[serde(default)]
    pub message: Option<String>,
}

// --- Uploads & processing ---

/// One file handed to the upload endpoint.
#[derive(Debug, Clone)]
pub struct UploadPart {
    pub name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UploadResponse {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub files: Vec<FileRecord>,
    #[serde(default)]
    pub rejected_files: Vec<String>,
    #[serde(default)]
    pub rejection_reason: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProcessingStatus {
    #[serde(default)]
    pub agent_name: Option<String>,
    #[serde(default)]
    pub processing_complete: bool,
    #[serde(default)]
    pub files_processed: bool,
    #[serde(default)]
    pub file_status: BTreeMap<String, FileStatusEntry>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct FileStatusEntry {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub message: String,
}

// --- Chat ---

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatHistory {
    #[serde(default)]
    pub conversations: Vec<Conversation>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Conversation {
    pub conversation_id: String,
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct ChatMessage {
    pub role: String,
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub citations: Vec<Citation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct Citation {
    pub id: u32,
    #[serde(default)]
    pub file: String,
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SendMessagePayload<'a> {
    pub message: &'a str,
    pub conversation_id: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SendMessageResponse {
    pub conversation_id: String,
    pub message: ChatMessage,
}

/// Error body shape shared by every endpoint.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ErrorBody {
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn agent_record_reads_backend_field_names() {
        let raw = r#"{
            "name": "Bot",
            "persona": "P",
            "createdAt": "2024-01-01T00:00:00",
            "createdBy": "admin",
            "files": [
                {"name": "a.pdf", "size": 12, "type": "application/pdf",
                 "processed": true, "processing_status": "success", "lastModified": 1.5}
            ]
        }"#;
        let record: AgentRecord = serde_json::from_str(raw).unwrap();
        assert_eq!(record.name, "Bot");
        assert_eq!(record.created_at.as_deref(), Some("2024-01-01T00:00:00"));
        assert_eq!(record.files.len(), 1);
        assert_eq!(record.files[0].mime_type, "application/pdf");
        assert!(record.files[0].processed);
    }

    #[test]
    fn processing_status_defaults_missing_flags() {
        let raw = r#"{"file_status": {"a.pdf": {"status": "processing", "message": ""}}}"#;
        let status: ProcessingStatus = serde_json::from_str(raw).unwrap();
        assert!(!status.processing_complete);
        assert_eq!(status.file_status["a.pdf"].status, "processing");
    }

    #[test]
    fn send_message_response_carries_citations() {
        let raw = r#"{
            "conversation_id": "default",
            "message": {"role": "assistant", "content": "Hi [^1]",
                        "citations": [{"id": 1, "file": "a.pdf", "page": 3, "text": "x"}]}
        }"#;
        let resp: SendMessageResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(resp.message.citations[0].page, Some(3));
    }
}
