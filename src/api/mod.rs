//! `api` 模組負責與代理管理後端的 REST 介面溝通。
//!
//! `AgentApi` trait 抽象化了每一個端點，`http` 子模組提供以 `reqwest`
//! 實作的版本，測試則使用記憶體內的假後端。

// --- 子模組宣告 ---

/// `http` 模組：透過 HTTP 與後端溝通的 `AgentApi` 實作。
pub mod http;
/// `models` 模組：端點的請求與回應資料結構。
pub mod models;

#[cfg(test)]
pub mod fake;

use async_trait::async_trait;

pub use http::HttpAgentApi;
pub use models::{
    AgentRecord, AgentSummary, ChatHistory, ChatMessage, FileRecord, ProcessingStatus,
    SendMessageResponse, UploadPart, UploadResponse,
};

/// 後端呼叫可能產生的錯誤。
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// 後端回傳非 2xx 狀態；`message` 取自 `{error}` 回應主體（若有）。
    #[error("{message} (HTTP {status})")]
    Status { status: u16, message: String },
    /// 連線、逾時等傳輸層錯誤。
    #[error("request failed: {0}")]
    Transport(String),
    /// 回應主體無法解析。
    #[error("unexpected response: {0}")]
    Decode(String),
}

impl ApiError {
    /// The message shown to the user, without the status decoration.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Status { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

/// 所有後端實作都必須遵守的介面。
///
/// 方法都以 `&self` 呼叫，讓同一個實例可以被表單控制器與背景輪詢任務
/// 透過 `Arc` 共用。
#[async_trait]
pub trait AgentApi: Send + Sync {
    /// `GET /api/agents`
    async fn list_agents(&self) -> ApiResult<Vec<AgentSummary>>;

    /// `POST /api/agents`
    async fn create_agent(&self, name: &str, persona: &str) -> ApiResult<AgentRecord>;

    /// `GET /api/agents/{name}`
    async fn get_agent(&self, name: &str) -> ApiResult<AgentRecord>;

    /// `PUT /api/agents/{name}`; `name` is the identifier before any rename.
    async fn update_agent(&self, name: &str, new_name: &str, persona: &str)
    -> ApiResult<AgentRecord>;

    /// `DELETE /api/agents/{name}`
    async fn delete_agent(&self, name: &str) -> ApiResult<()>;

    /// `POST /api/agents/{name}/upload` with every part in one multipart body.
    async fn upload_files(&self, name: &str, files: Vec<UploadPart>) -> ApiResult<UploadResponse>;

    /// `DELETE /api/agents/{name}/files/{filename}`
    async fn delete_file(&self, name: &str, filename: &str) -> ApiResult<()>;

    /// `GET /api/agents/{name}/processing-status`
    async fn processing_status(&self, name: &str) -> ApiResult<ProcessingStatus>;

    /// `GET /api/agents/{name}/chat-history`
    async fn chat_history(&self, name: &str) -> ApiResult<ChatHistory>;

    /// `POST /api/agents/{name}/send-message`
    async fn send_message(
        &self,
        name: &str,
        conversation_id: &str,
        message: &str,
    ) -> ApiResult<SendMessageResponse>;

    /// `POST /api/agents/{name}/clear-chat`
    async fn clear_chat(&self, name: &str) -> ApiResult<()>;
}
