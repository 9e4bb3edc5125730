//! Sends every staged-but-not-uploaded file in one multipart request.

use log::{debug, info};

use crate::api::{AgentApi, ApiResult, UploadResponse};

use super::staging::{DisplayStatus, StagingSet};

/// Files taken from the staging set for a single upload request.
#[derive(Debug)]
pub struct UploadBatch {
    names: Vec<String>,
}

/// What the backend did with an upload, applied back onto the staging set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadSummary {
    pub uploaded: Vec<String>,
    pub rejected: Vec<String>,
    pub rejection_reason: Option<String>,
}

impl UploadBatch {
    /// Returns `None` when nothing is waiting to be uploaded.
    pub fn collect(staging: &StagingSet) -> Option<Self> {
        let names = staging.pending_upload_names();
        if names.is_empty() {
            None
        } else {
            Some(Self { names })
        }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Marks the batch `Processing` before the request goes out, then uploads.
    /// On success the files become server-known; on failure they go back to
    /// `Ready` so the user can retry.
    pub async fn submit(
        self,
        api: &dyn AgentApi,
        identifier: &str,
        staging: &mut StagingSet,
    ) -> ApiResult<UploadSummary> {
        let parts = staging.upload_parts();
        for name in &self.names {
            staging.set_status(name, DisplayStatus::Processing, None);
        }
        debug!("uploading {} file(s) to {}", parts.len(), identifier);

        match api.upload_files(identifier, parts).await {
            Ok(response) => Ok(self.apply(response, staging)),
            Err(err) => {
                for name in &self.names {
                    staging.set_status(name, DisplayStatus::Ready, None);
                }
                Err(err)
            }
        }
    }

    fn apply(self, response: UploadResponse, staging: &mut StagingSet) -> UploadSummary {
        let rejected: Vec<String> = response
            .rejected_files
            .into_iter()
            .filter(|name| self.names.contains(name))
            .collect();
        for name in &rejected {
            staging.remove(name);
        }
        let uploaded: Vec<String> = self
            .names
            .into_iter()
            .filter(|name| !rejected.contains(name))
            .collect();
        staging.mark_uploaded(&uploaded);

        // The backend may echo per-file state; anything it reports wins over
        // the optimistic `Processing`.
        for echoed in &response.files {
            if let Some(status) = echoed.processing_status.as_deref() {
                let status = if echoed.processed {
                    DisplayStatus::Success
                } else {
                    DisplayStatus::parse(status)
                };
                staging.set_status(&echoed.name, status, echoed.error_message.clone());
            }
        }
        if let Some(message) = &response.message {
            info!("{}", message);
        }

        UploadSummary {
            uploaded,
            rejected,
            rejection_reason: response.rejection_reason,
        }
    }
}
