use std::collections::BTreeSet;

use super::staging::StagingSet;

/// Last-confirmed state of the form; replaced after every successful save.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormSnapshot {
    pub name: String,
    pub persona: String,
    pub files: BTreeSet<String>,
}

impl FormSnapshot {
    pub fn capture(name: &str, persona: &str, staging: &StagingSet) -> Self {
        Self {
            name: name.to_string(),
            persona: persona.to_string(),
            files: staging
                .iter()
                .filter(|file| file.is_existing())
                .map(|file| file.name().to_string())
                .collect(),
        }
    }

    /// Any field edit, a different file count, or a not-yet-uploaded file.
    pub fn has_changes(&self, name: &str, persona: &str, staging: &StagingSet) -> bool {
        name != self.name
            || persona != self.persona
            || staging.len() != self.files.len()
            || staging.has_pending_uploads()
    }
}
