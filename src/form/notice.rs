/// Severity of a user-facing message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// A message for the user, queued by the controllers and shown by the UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub title: String,
    pub detail: String,
}

impl Notice {
    pub fn new(level: NoticeLevel, title: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            level,
            title: title.into(),
            detail: detail.into(),
        }
    }

    pub fn info(title: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Info, title, detail)
    }

    pub fn success(title: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Success, title, detail)
    }

    pub fn warning(title: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Warning, title, detail)
    }

    pub fn error(title: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Error, title, detail)
    }

    /// Errors stay on screen until dismissed; everything else is transient.
    pub fn is_blocking(&self) -> bool {
        self.level == NoticeLevel::Error
    }

    /// One notice for a whole batch of refused files.
    pub fn rejected_files(reason: &str, names: &[String]) -> Self {
        Self::warning(
            "Some files were not added",
            format!("{}: {}", reason, names.join(", ")),
        )
    }
}
