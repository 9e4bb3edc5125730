//! 主控台設定，通常從 `config/console.toml` 載入。

use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::form::{FilePolicy, FormOptions};

/// 設定檔相對於工作區根目錄的位置。
pub const CONFIG_RELATIVE_PATH: &str = "config/console.toml";
/// 覆寫 `base_url` 的環境變數。
pub const BASE_URL_ENV: &str = "AGENTDESK_BASE_URL";

/// 主控台設定的頂層結構。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsoleSettings {
    /// 後端根網址。
    pub base_url: String,
    /// 處理狀態的輪詢間隔（毫秒）。
    pub poll_interval_ms: u64,
    /// 單一請求的逾時秒數。
    pub request_timeout_secs: u64,
    /// 直接指定的 session cookie 值。
    pub session_cookie: Option<String>,
    /// 從此環境變數讀取 session cookie。
    pub session_cookie_env: Option<String>,
    /// 每個請求額外附上的標頭。
    pub headers: BTreeMap<String, String>,
    /// 上傳檔案的允許清單。
    pub uploads: UploadSettings,
}

impl Default for ConsoleSettings {
    fn default() -> Self {
        Self {
            base_url: String::from("http://localhost:5000"),
            poll_interval_ms: 2000,
            request_timeout_secs: 30,
            session_cookie: None,
            session_cookie_env: Some(String::from("AGENTDESK_SESSION")),
            headers: BTreeMap::new(),
            uploads: UploadSettings::default(),
        }
    }
}

/// `[uploads]` 區段。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadSettings {
    pub allowed_extensions: Vec<String>,
    pub allowed_mime_types: Vec<String>,
    pub rejection_reason: String,
}

impl Default for UploadSettings {
    fn default() -> Self {
        Self {
            allowed_extensions: vec![String::from("pdf")],
            allowed_mime_types: vec![String::from("application/pdf")],
            rejection_reason: String::from("Only PDF files are supported"),
        }
    }
}

impl ConsoleSettings {
    /// 從工作區讀取設定；檔案不存在時使用內建預設值。
    /// 之後套用 `AGENTDESK_BASE_URL` 覆寫。
    pub fn load(workspace_root: &Path) -> Result<Self> {
        let config_path = Self::path(workspace_root);
        let settings = if config_path.exists() {
            let raw = fs::read_to_string(&config_path)
                .with_context(|| format!("failed to read settings: {}", config_path.display()))?;
            Self::from_toml(&raw)
                .with_context(|| format!("failed to parse settings: {}", config_path.display()))?
        } else {
            Self::default()
        };
        Ok(settings.with_base_url_override(env::var(BASE_URL_ENV).ok()))
    }

    pub fn from_toml(raw: &str) -> Result<Self> {
        Ok(toml::from_str(raw)?)
    }

    pub fn path(workspace_root: &Path) -> PathBuf {
        workspace_root.join(CONFIG_RELATIVE_PATH)
    }

    fn with_base_url_override(mut self, base_url: Option<String>) -> Self {
        if let Some(url) = base_url.filter(|url| !url.trim().is_empty()) {
            self.base_url = url.trim().to_string();
        }
        self
    }

    /// 將目前設定寫入 `config/console.toml`。
    pub fn save_to_file(&self, workspace_root: &Path) -> Result<PathBuf> {
        let config_path = Self::path(workspace_root);
        if let Some(config_dir) = config_path.parent()
            && !config_dir.exists()
        {
            fs::create_dir_all(config_dir)
                .with_context(|| format!("failed to create {}", config_dir.display()))?;
        }
        let serialized = toml::to_string_pretty(self).context("failed to serialize settings")?;
        fs::write(&config_path, serialized)
            .with_context(|| format!("failed to write {}", config_path.display()))?;
        Ok(config_path)
    }

    /// 先取設定檔中的值，其次才是環境變數。
    pub fn resolved_session_cookie(&self) -> Option<String> {
        if let Some(cookie) = &self.session_cookie {
            Some(cookie.clone())
        } else if let Some(var) = &self.session_cookie_env {
            env::var(var).ok()
        } else {
            None
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(100))
    }

    pub fn file_policy(&self) -> FilePolicy {
        FilePolicy::new(
            self.uploads.allowed_extensions.clone(),
            self.uploads.allowed_mime_types.clone(),
            self.uploads.rejection_reason.clone(),
        )
    }

    pub fn form_options(&self) -> FormOptions {
        FormOptions {
            poll_interval: self.poll_interval(),
            policy: self.file_policy(),
        }
    }
}
