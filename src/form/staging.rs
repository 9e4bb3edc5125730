//! The set of documents attached to an agent form.
//!
//! Every entry is either already known to the backend (`FileSource::Existing`)
//! or staged locally and waiting for the next upload (`FileSource::PendingUpload`).
//! Names are unique within the set.

use std::collections::BTreeSet;
use std::path::Path;

use anyhow::{Context, Result};

use crate::api::{AgentRecord, FileRecord, UploadPart};

use super::policy::FilePolicy;

/// Per-file status shown next to each document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayStatus {
    /// Staged locally, not uploaded yet.
    Ready,
    Pending,
    Processing,
    Success,
    Error,
    Unknown,
}

impl DisplayStatus {
    /// Maps the backend's `processing_status` strings.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "ready" => Self::Ready,
            "pending" => Self::Pending,
            "processing" => Self::Processing,
            "success" => Self::Success,
            "error" => Self::Error,
            _ => Self::Unknown,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Ready => "Ready to upload",
            Self::Pending => "Pending",
            Self::Processing => "Processing",
            Self::Success => "Processed",
            Self::Error => "Error",
            Self::Unknown => "Unknown",
        }
    }

    /// Pending or processing on the backend.
    pub fn is_in_flight(&self) -> bool {
        matches!(self, Self::Pending | Self::Processing)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExistingFile {
    pub name: String,
    pub size: u64,
    pub mime_type: String,
    pub processed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingUpload {
    pub name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileSource {
    Existing(ExistingFile),
    PendingUpload(PendingUpload),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedFile {
    pub source: FileSource,
    pub status: DisplayStatus,
    pub message: Option<String>,
}

impl StagedFile {
    fn from_record(record: &FileRecord) -> Self {
        let status = if record.processed {
            DisplayStatus::Success
        } else {
            record
                .processing_status
                .as_deref()
                .map(DisplayStatus::parse)
                .unwrap_or(DisplayStatus::Pending)
        };
        Self {
            source: FileSource::Existing(ExistingFile {
                name: record.name.clone(),
                size: record.size,
                mime_type: record.mime_type.clone(),
                processed: record.processed,
            }),
            status,
            message: record.error_message.clone().filter(|msg| !msg.is_empty()),
        }
    }

    pub fn name(&self) -> &str {
        match &self.source {
            FileSource::Existing(file) => &file.name,
            FileSource::PendingUpload(file) => &file.name,
        }
    }

    pub fn size(&self) -> u64 {
        match &self.source {
            FileSource::Existing(file) => file.size,
            FileSource::PendingUpload(file) => file.bytes.len() as u64,
        }
    }

    pub fn is_existing(&self) -> bool {
        matches!(self.source, FileSource::Existing(_))
    }

    pub fn is_processed(&self) -> bool {
        matches!(&self.source, FileSource::Existing(file) if file.processed)
    }
}

/// A document picked by the user, read into memory before staging.
#[derive(Debug, Clone)]
pub struct LocalFile {
    pub name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl LocalFile {
    /// Builds a file with its MIME hint guessed from the name.
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let name = name.into();
        let mime_type = mime_guess::from_path(&name)
            .first_raw()
            .unwrap_or("application/octet-stream")
            .to_string();
        Self {
            name,
            mime_type,
            bytes,
        }
    }

    pub async fn read(path: &Path) -> Result<Self> {
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .with_context(|| format!("not a file path: {}", path.display()))?;
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("failed to read {}", path.display()))?;
        Ok(Self::new(name, bytes))
    }
}

/// Outcome of staging one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddResult {
    Added,
    Rejected,
    Duplicate,
}

/// Outcome of staging a batch; rejections are reported together.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddReport {
    pub added: Vec<String>,
    pub rejected: Vec<String>,
    pub duplicates: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct StagingSet {
    files: Vec<StagedFile>,
}

impl StagingSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_record(record: &AgentRecord) -> Self {
        let mut set = Self::new();
        for file in &record.files {
            if !set.contains(&file.name) {
                set.files.push(StagedFile::from_record(file));
            }
        }
        set
    }

    pub fn iter(&self) -> impl Iterator<Item = &StagedFile> {
        self.files.iter()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&StagedFile> {
        self.files.iter().find(|file| file.name() == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn names(&self) -> BTreeSet<String> {
        self.files.iter().map(|file| file.name().to_string()).collect()
    }

    pub fn add(&mut self, file: LocalFile, policy: &FilePolicy) -> AddResult {
        if !policy.allows(&file.name, &file.mime_type) {
            return AddResult::Rejected;
        }
        if self.contains(&file.name) {
            return AddResult::Duplicate;
        }
        self.files.push(StagedFile {
            source: FileSource::PendingUpload(PendingUpload {
                name: file.name,
                mime_type: file.mime_type,
                bytes: file.bytes,
            }),
            status: DisplayStatus::Ready,
            message: None,
        });
        AddResult::Added
    }

    pub fn add_batch(&mut self, files: Vec<LocalFile>, policy: &FilePolicy) -> AddReport {
        let mut report = AddReport::default();
        for file in files {
            let name = file.name.clone();
            match self.add(file, policy) {
                AddResult::Added => report.added.push(name),
                AddResult::Rejected => report.rejected.push(name),
                AddResult::Duplicate => report.duplicates.push(name),
            }
        }
        report
    }

    /// Local removal only; the controller decides whether the backend is told.
    pub fn remove(&mut self, name: &str) -> Option<StagedFile> {
        let index = self.files.iter().position(|file| file.name() == name)?;
        Some(self.files.remove(index))
    }

    /// No-op when the name is gone (e.g. removed while a poll was in flight).
    pub fn set_status(&mut self, name: &str, status: DisplayStatus, message: Option<String>) -> bool {
        match self.files.iter_mut().find(|file| file.name() == name) {
            Some(file) => {
                file.status = status;
                file.message = message.filter(|msg| !msg.is_empty());
                true
            }
            None => false,
        }
    }

    pub fn has_pending_uploads(&self) -> bool {
        self.files.iter().any(|file| !file.is_existing())
    }

    pub fn pending_upload_names(&self) -> Vec<String> {
        self.files
            .iter()
            .filter(|file| !file.is_existing())
            .map(|file| file.name().to_string())
            .collect()
    }

    pub fn upload_parts(&self) -> Vec<UploadPart> {
        self.files
            .iter()
            .filter_map(|file| match &file.source {
                FileSource::PendingUpload(pending) => Some(UploadPart {
                    name: pending.name.clone(),
                    mime_type: pending.mime_type.clone(),
                    bytes: pending.bytes.clone(),
                }),
                FileSource::Existing(_) => None,
            })
            .collect()
    }

    /// Converts the named pending uploads into existing, unprocessed entries.
    pub fn mark_uploaded(&mut self, names: &[String]) {
        for file in self.files.iter_mut() {
            if !names.iter().any(|name| name == file.name()) {
                continue;
            }
            if let FileSource::PendingUpload(pending) = &file.source {
                file.source = FileSource::Existing(ExistingFile {
                    name: pending.name.clone(),
                    size: pending.bytes.len() as u64,
                    mime_type: pending.mime_type.clone(),
                    processed: false,
                });
            }
        }
    }

    /// Replaces every server-known entry with the authoritative record.
    /// Pending uploads the record does not mention are kept.
    pub fn reconcile(&mut self, record: &AgentRecord) {
        let mut next = Self::from_record(record);
        for file in self.files.drain(..) {
            if !file.is_existing() && !next.contains(file.name()) {
                next.files.push(file);
            }
        }
        *self = next;
    }

    pub fn any_in_flight(&self) -> bool {
        self.files.iter().any(|file| file.status.is_in_flight())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pdf(name: &str) -> LocalFile {
        LocalFile::new(name, b"%PDF-1.4".to_vec())
    }

    fn record_with(files: Vec<FileRecord>) -> AgentRecord {
        AgentRecord {
            name: "Bot".into(),
            persona: "P".into(),
            files,
            ..AgentRecord::default()
        }
    }

    fn file_record(name: &str, processed: bool, status: &str) -> FileRecord {
        FileRecord {
            name: name.into(),
            size: 10,
            mime_type: "application/pdf".into(),
            processed,
            processing_status: Some(status.into()),
            error_message: None,
        }
    }

    #[test]
    fn add_stages_ready_pending_upload() {
        let mut set = StagingSet::new();
        assert_eq!(set.add(pdf("a.pdf"), &FilePolicy::pdf_only()), AddResult::Added);
        let file = set.get("a.pdf").unwrap();
        assert_eq!(file.status, DisplayStatus::Ready);
        assert!(!file.is_existing());
        assert_eq!(file.size(), 8);
    }

    #[test]
    fn duplicate_names_are_ignored() {
        let policy = FilePolicy::pdf_only();
        let mut set = StagingSet::new();
        let report = set.add_batch(vec![pdf("a.pdf"), pdf("a.pdf"), pdf("b.pdf")], &policy);
        assert_eq!(report.added, vec!["a.pdf", "b.pdf"]);
        assert_eq!(report.duplicates, vec!["a.pdf"]);
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn rejected_files_never_enter_the_set() {
        let mut set = StagingSet::new();
        let report = set.add_batch(
            vec![LocalFile::new("a.txt", vec![1]), LocalFile::new("b.png", vec![2])],
            &FilePolicy::pdf_only(),
        );
        assert_eq!(report.rejected, vec!["a.txt", "b.png"]);
        assert!(set.is_empty());
    }

    #[test]
    fn names_stay_unique_across_add_and_remove() {
        let policy = FilePolicy::pdf_only();
        let mut set = StagingSet::new();
        let ops: [(&str, bool); 8] = [
            ("a.pdf", true),
            ("b.pdf", true),
            ("a.pdf", true),
            ("a.pdf", false),
            ("a.pdf", true),
            ("a.pdf", true),
            ("b.pdf", false),
            ("b.pdf", true),
        ];
        for (name, add) in ops {
            if add {
                set.add(pdf(name), &policy);
            } else {
                set.remove(name);
            }
            assert_eq!(set.names().len(), set.len());
        }
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn set_status_on_missing_name_is_noop() {
        let mut set = StagingSet::new();
        assert!(!set.set_status("gone.pdf", DisplayStatus::Success, None));
        assert!(set.is_empty());
    }

    #[test]
    fn record_files_map_to_display_status() {
        let set = StagingSet::from_record(&record_with(vec![
            file_record("done.pdf", true, "pending"),
            file_record("busy.pdf", false, "processing"),
            file_record("odd.pdf", false, "queued"),
        ]));
        assert_eq!(set.get("done.pdf").unwrap().status, DisplayStatus::Success);
        assert!(set.get("done.pdf").unwrap().is_processed());
        assert_eq!(set.get("busy.pdf").unwrap().status, DisplayStatus::Processing);
        assert_eq!(set.get("odd.pdf").unwrap().status, DisplayStatus::Unknown);
        assert!(set.any_in_flight());
    }

    #[test]
    fn mark_uploaded_converts_only_named_entries() {
        let policy = FilePolicy::pdf_only();
        let mut set = StagingSet::new();
        set.add(pdf("a.pdf"), &policy);
        set.add(pdf("b.pdf"), &policy);
        set.mark_uploaded(&["a.pdf".to_string()]);
        assert!(set.get("a.pdf").unwrap().is_existing());
        assert!(!set.get("b.pdf").unwrap().is_existing());
        assert_eq!(set.upload_parts().len(), 1);
    }

    #[test]
    fn reconcile_keeps_unmentioned_local_files() {
        let policy = FilePolicy::pdf_only();
        let mut set = StagingSet::from_record(&record_with(vec![file_record(
            "a.pdf",
            false,
            "processing",
        )]));
        set.add(pdf("late.pdf"), &policy);
        set.reconcile(&record_with(vec![file_record("a.pdf", true, "success")]));
        assert!(set.get("a.pdf").unwrap().is_processed());
        assert!(!set.get("late.pdf").unwrap().is_existing());
        assert_eq!(set.len(), 2);
    }

    #[tokio::test]
    async fn local_file_reads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("manual.pdf");
        std::fs::write(&path, b"%PDF").unwrap();
        let file = LocalFile::read(&path).await.unwrap();
        assert_eq!(file.name, "manual.pdf");
        assert_eq!(file.mime_type, "application/pdf");
        assert_eq!(file.bytes, b"%PDF");
    }
}
