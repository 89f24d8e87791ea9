//! Client-enforced limits.
//!
//! The upload size bound is the only parameter validated locally;
//! everything else passes through to the server unvalidated. The job
//! timeout is a client-side safety net: a job stuck in queued or
//! processing past the deadline is force-failed rather than left
//! hanging.

use std::time::Duration;

use crate::error::ConvertError;
use crate::upload::Upload;

/// Default maximum upload size: 5 MiB.
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 5_242_880;

/// Default ceiling on queued + processing time.
pub const DEFAULT_JOB_TIMEOUT: Duration = Duration::from_secs(600);

/// Tunable client-side limits.
#[derive(Debug, Clone)]
pub struct Limits {
    /// Uploads larger than this are rejected locally, before any
    /// request is made. Deployments vary (5 MiB and 8 MiB observed).
    pub max_upload_bytes: u64,
    /// Maximum time a job may spend queued or processing before it is
    /// force-transitioned to an error.
    pub job_timeout: Duration,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            job_timeout: DEFAULT_JOB_TIMEOUT,
        }
    }
}

/// Check the local submission preconditions: a file is present and its
/// size is within the configured bound.
pub fn validate_upload(upload: &Upload, limits: &Limits) -> Result<(), ConvertError> {
    if upload.filename.is_empty() || upload.data.is_empty() {
        return Err(ConvertError::Validation("no file selected".to_string()));
    }
    if upload.size() > limits.max_upload_bytes {
        return Err(ConvertError::Validation(format!(
            "file too large: {} bytes exceeds the {} byte limit",
            upload.size(),
            limits.max_upload_bytes
        )));
    }
    Ok(())
}
