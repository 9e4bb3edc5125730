//! Client-side validation that runs before anything reaches the network.

use std::path::Path;

/// Allow-list for uploaded documents.
#[derive(Debug, Clone)]
pub struct FilePolicy {
    extensions: Vec<String>,
    mime_types: Vec<String>,
    rejection_reason: String,
}

impl FilePolicy {
    pub fn new(extensions: Vec<String>, mime_types: Vec<String>, rejection_reason: String) -> Self {
        Self {
            extensions: extensions
                .into_iter()
                .map(|ext| ext.trim_start_matches('.').to_ascii_lowercase())
                .collect(),
            mime_types: mime_types
                .into_iter()
                .map(|mime| mime.to_ascii_lowercase())
                .collect(),
            rejection_reason,
        }
    }

    /// PDF only, matching the backend's own upload filter.
    pub fn pdf_only() -> Self {
        Self::new(
            vec![String::from("pdf")],
            vec![String::from("application/pdf")],
            String::from("Only PDF files are supported"),
        )
    }

    /// A file passes when either its extension or its MIME hint is on the list.
    pub fn allows(&self, name: &str, mime_type: &str) -> bool {
        let extension_ok = Path::new(name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| self.extensions.iter().any(|allowed| allowed.eq_ignore_ascii_case(ext)))
            .unwrap_or(false);
        let mime = mime_type.trim().to_ascii_lowercase();
        let mime_ok = !mime.is_empty() && self.mime_types.iter().any(|allowed| *allowed == mime);
        extension_ok || mime_ok
    }

    pub fn rejection_reason(&self) -> &str {
        &self.rejection_reason
    }
}

impl Default for FilePolicy {
    fn default() -> Self {
        Self::pdf_only()
    }
}

/// Why an agent name was refused locally.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NameError {
    #[error("Agent name is required")]
    Empty,
    #[error(
        "Agent name contains invalid characters. Use only letters, numbers, spaces, hyphens, and underscores."
    )]
    InvalidCharacters,
}

/// Same character set the backend accepts for agent directories.
pub fn validate_agent_name(name: &str) -> Result<(), NameError> {
    if name.trim().is_empty() {
        return Err(NameError::Empty);
    }
    let valid = name
        .chars()
        .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, ' ' | '-' | '_'));
    if valid {
        Ok(())
    } else {
        Err(NameError::InvalidCharacters)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_or_mime_is_enough() {
        let policy = FilePolicy::pdf_only();
        assert!(policy.allows("report.PDF", ""));
        assert!(policy.allows("report", "application/pdf"));
        assert!(policy.allows("scan.bin", "Application/PDF"));
        assert!(!policy.allows("a.txt", "text/plain"));
        assert!(!policy.allows("pdf", ""));
    }

    #[test]
    fn configured_extensions_are_normalised() {
        let policy = FilePolicy::new(vec![".DOCX".into()], vec![], "Word only".into());
        assert!(policy.allows("notes.docx", ""));
        assert!(!policy.allows("notes.pdf", "application/pdf"));
        assert_eq!(policy.rejection_reason(), "Word only");
    }

    #[test]
    fn agent_names_follow_backend_charset() {
        assert_eq!(validate_agent_name("Support Bot_2-b"), Ok(()));
        assert_eq!(validate_agent_name("   "), Err(NameError::Empty));
        assert_eq!(
            validate_agent_name("bot/../x"),
            Err(NameError::InvalidCharacters)
        );
    }
}
