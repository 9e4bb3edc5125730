//! 日誌初始化。
//!
//! 互動模式下終端機被 TUI 佔用，因此寫入檔案（log4rs）；
//! 命令列模式則寫到 stderr（env_logger）。

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::LevelFilter;
use log4rs::append::file::FileAppender;
use log4rs::config::{Appender, Config, Root};
use log4rs::encode::pattern::PatternEncoder;

/// 工作區內可選的 log4rs 設定檔。
pub const LOG4RS_RELATIVE_PATH: &str = "config/log4rs.yaml";
/// 沒有設定檔時的預設日誌檔名。
pub const DEFAULT_LOG_FILE: &str = "agentdesk.log";

const FILE_PATTERN: &str = "{d(%Y-%m-%d %H:%M:%S)} {l:<5} {t} - {m}{n}";

/// 互動模式：優先使用 `config/log4rs.yaml`，否則寫入 `agentdesk.log`。
pub fn init_file_logging(workspace_root: &Path) -> Result<PathBuf> {
    let yaml = workspace_root.join(LOG4RS_RELATIVE_PATH);
    if yaml.exists() {
        log4rs::init_file(&yaml, Default::default())
            .with_context(|| format!("failed to load {}", yaml.display()))?;
        return Ok(yaml);
    }

    let log_path = workspace_root.join(DEFAULT_LOG_FILE);
    let appender = FileAppender::builder()
        .encoder(Box::new(PatternEncoder::new(FILE_PATTERN)))
        .build(&log_path)
        .with_context(|| format!("failed to open {}", log_path.display()))?;
    let config = Config::builder()
        .appender(Appender::builder().build("file", Box::new(appender)))
        .build(Root::builder().appender("file").build(LevelFilter::Info))
        .context("invalid logging configuration")?;
    log4rs::init_config(config).context("logger already initialised")?;
    Ok(log_path)
}

/// 命令列模式：`RUST_LOG` 控制等級，預設 `info`。
pub fn init_stderr_logging() {
    let env = env_logger::Env::default().default_filter_or("info");
    // A second init (e.g. from tests) is harmless.
    let _ = env_logger::Builder::from_env(env)
        .format_timestamp_secs()
        .try_init();
}
