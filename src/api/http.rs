use std::collections::BTreeMap;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use log::debug;
use reqwest::header::{COOKIE, HeaderMap, HeaderName, HeaderValue};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;

use crate::config::ConsoleSettings;

use super::models::{
    Ack, AgentList, AgentMutation, AgentPayload, ErrorBody, SendMessagePayload,
};
use super::{
    AgentApi, AgentRecord, AgentSummary, ApiError, ApiResult, ChatHistory, ProcessingStatus,
    SendMessageResponse, UploadPart, UploadResponse,
};

/// `AgentApi` 的 HTTP 實作。
pub struct HttpAgentApi {
    /// 後端根網址，例如 `http://localhost:5000`（不含結尾斜線）。
    base_url: String,
    /// `reqwest` 的非同步 HTTP 客戶端，內部為 `Arc`，複製成本低。
    client: Client,
    /// 每個請求都會附上的標頭（自訂標頭與 session cookie）。
    headers: HeaderMap,
}

impl HttpAgentApi {
    /// 根據主控台設定建立客戶端。
    pub fn new(settings: &ConsoleSettings) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.request_timeout_secs.max(1)))
            .build()
            .context("failed to build HTTP client")?;
        let headers = build_headers(&settings.headers, settings.resolved_session_cookie())?;
        Ok(Self {
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            client,
            headers,
        })
    }

    fn agent_url(&self, name: &str) -> String {
        format!("{}/api/agents/{}", self.base_url, urlencoding::encode(name))
    }

    async fn send(&self, request: RequestBuilder) -> ApiResult<Response> {
        request
            .headers(self.headers.clone())
            .send()
            .await
            .map_err(|err| ApiError::Transport(err.to_string()))
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> ApiResult<T> {
        let response = self.send(request).await?;
        decode(response).await
    }
}

/// 根據設定建構每個請求共用的 HTTP 標頭。
fn build_headers(extra: &BTreeMap<String, String>, cookie: Option<String>) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    if let Some(cookie) = cookie {
        let value = format!("session={}", cookie);
        headers.insert(COOKIE, HeaderValue::from_str(&value).context("invalid session cookie")?);
    }
    for (key, value) in extra.iter() {
        let header_name = HeaderName::from_bytes(key.as_bytes())
            .with_context(|| format!("invalid header name: {}", key))?;
        let header_value = HeaderValue::from_str(value)
            .with_context(|| format!("invalid value for header {}", key))?;
        headers.insert(header_name, header_value);
    }
    Ok(headers)
}

/// Reads the body once, mapping non-2xx statuses and `{error}` bodies to `ApiError::Status`.
async fn decode<T: DeserializeOwned>(response: Response) -> ApiResult<T> {
    let status = response.status();
    let text = response
        .text()
        .await
        .map_err(|err| ApiError::Transport(err.to_string()))?;
    if !status.is_success() {
        return Err(ApiError::Status {
            status: status.as_u16(),
            message: error_message(&text)
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("request failed").to_string()),
        });
    }
    if let Some(message) = error_message(&text) {
        return Err(ApiError::Status {
            status: status.as_u16(),
            message,
        });
    }
    serde_json::from_str(&text).map_err(|err| ApiError::Decode(err.to_string()))
}

fn error_message(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }
    match serde_json::from_str::<ErrorBody>(trimmed) {
        Ok(parsed) => Some(parsed.error),
        // Non-JSON error pages (proxies, HTML 500s) are passed through as-is.
        Err(_) if !trimmed.starts_with('{') => Some(trimmed.chars().take(200).collect()),
        Err(_) => None,
    }
}

#[async_trait]
impl AgentApi for HttpAgentApi {
    async fn list_agents(&self) -> ApiResult<Vec<AgentSummary>> {
        let url = format!("{}/api/agents", self.base_url);
        let list: AgentList = self.send_json(self.client.get(url)).await?;
        Ok(list.agents)
    }

    async fn create_agent(&self, name: &str, persona: &str) -> ApiResult<AgentRecord> {
        let url = format!("{}/api/agents", self.base_url);
        let payload = AgentPayload { name, persona };
        let created: AgentMutation = self.send_json(self.client.post(url).json(&payload)).await?;
        debug!("create agent {}: {:?}", name, created.message);
        Ok(created.agent.unwrap_or_else(|| AgentRecord {
            name: name.to_string(),
            persona: persona.to_string(),
            ..AgentRecord::default()
        }))
    }

    async fn get_agent(&self, name: &str) -> ApiResult<AgentRecord> {
        self.send_json(self.client.get(self.agent_url(name))).await
    }

    async fn update_agent(
        &self,
        name: &str,
        new_name: &str,
        persona: &str,
    ) -> ApiResult<AgentRecord> {
        let payload = AgentPayload {
            name: new_name,
            persona,
        };
        let updated: AgentMutation = self
            .send_json(self.client.put(self.agent_url(name)).json(&payload))
            .await?;
        Ok(updated.agent.unwrap_or_else(|| AgentRecord {
            name: new_name.to_string(),
            persona: persona.to_string(),
            ..AgentRecord::default()
        }))
    }

    async fn delete_agent(&self, name: &str) -> ApiResult<()> {
        let _: Ack = self.send_json(self.client.delete(self.agent_url(name))).await?;
        Ok(())
    }

    async fn upload_files(&self, name: &str, files: Vec<UploadPart>) -> ApiResult<UploadResponse> {
        let url = format!("{}/upload", self.agent_url(name));
        let mut form = Form::new();
        for file in files {
            let part = Part::bytes(file.bytes)
                .file_name(file.name)
                .mime_str(&file.mime_type)
                .map_err(|err| ApiError::Transport(err.to_string()))?;
            form = form.part("files", part);
        }
        self.send_json(self.client.post(url).multipart(form)).await
    }

    async fn delete_file(&self, name: &str, filename: &str) -> ApiResult<()> {
        let url = format!(
            "{}/files/{}",
            self.agent_url(name),
            urlencoding::encode(filename)
        );
        let _: Ack = self.send_json(self.client.delete(url)).await?;
        Ok(())
    }

    async fn processing_status(&self, name: &str) -> ApiResult<ProcessingStatus> {
        let url = format!("{}/processing-status", self.agent_url(name));
        self.send_json(self.client.get(url)).await
    }

    async fn chat_history(&self, name: &str) -> ApiResult<ChatHistory> {
        let url = format!("{}/chat-history", self.agent_url(name));
        self.send_json(self.client.get(url)).await
    }

    async fn send_message(
        &self,
        name: &str,
        conversation_id: &str,
        message: &str,
    ) -> ApiResult<SendMessageResponse> {
        let url = format!("{}/send-message", self.agent_url(name));
        let payload = SendMessagePayload {
            message,
            conversation_id,
        };
        self.send_json(self.client.post(url).json(&payload)).await
    }

    async fn clear_chat(&self, name: &str) -> ApiResult<()> {
        let url = format!("{}/clear-chat", self.agent_url(name));
        let _: Ack = self.send_json(self.client.post(url)).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_message_prefers_json_error_field() {
        assert_eq!(
            error_message(r#"{"error": "Agent not found"}"#).as_deref(),
            Some("Agent not found")
        );
        assert_eq!(error_message(r#"{"agents": []}"#), None);
        assert_eq!(error_message("   "), None);
        assert_eq!(error_message("Bad Gateway").as_deref(), Some("Bad Gateway"));
    }

    #[test]
    fn headers_include_cookie_and_extras() {
        let mut extra = BTreeMap::new();
        extra.insert("X-Console".to_string(), "1".to_string());
        let headers = build_headers(&extra, Some("abc".into())).unwrap();
        assert_eq!(headers.get(COOKIE).unwrap(), "session=abc");
        assert_eq!(headers.get("x-console").unwrap(), "1");
    }

    #[test]
    fn agent_urls_are_percent_encoded() {
        let settings = ConsoleSettings {
            base_url: "http://localhost:5000/".into(),
            ..ConsoleSettings::default()
        };
        let api = HttpAgentApi::new(&settings).unwrap();
        assert_eq!(
            api.agent_url("My Bot"),
            "http://localhost:5000/api/agents/My%20Bot"
        );
    }
}
