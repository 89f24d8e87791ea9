//! Error taxonomy for the conversion client.
//!
//! Four distinct failure channels: local validation (never reaches the
//! server), server-side rejection of a submission, transport failure
//! (network or mid-stream disconnect), and result-fetch failure (the
//! conversion succeeded; only delivery failed).

/// Why the server declined a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// The uploaded file is not a supported image or video format.
    UnsupportedFormat,
    /// The payload exceeded the server's upload limit.
    PayloadTooLarge,
    /// The server's job queue is full.
    AtCapacity,
}

impl RejectReason {
    /// Fixed, human-readable reason string surfaced to the UI.
    pub fn message(self) -> &'static str {
        match self {
            Self::UnsupportedFormat => "unsupported format",
            Self::PayloadTooLarge => "file too large",
            Self::AtCapacity => "server at capacity",
        }
    }
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}

/// Errors surfaced by the conversion client.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConvertError {
    /// A local precondition failed. No request was made.
    #[error("validation failed: {0}")]
    Validation(String),

    /// The server declined the submission.
    #[error("submission rejected: {0}")]
    Rejected(RejectReason),

    /// A network or stream failure, including mid-stream disconnects.
    #[error("transport failure: {0}")]
    Transport(String),

    /// The conversion finished but the artifact could not be retrieved.
    /// Never reverts a job out of the finished state.
    #[error("result fetch failed: {0}")]
    Fetch(String),
}

impl ConvertError {
    /// The human-readable reason string carried to the UI projection.
    pub fn reason(&self) -> String {
        match self {
            Self::Validation(msg) | Self::Transport(msg) | Self::Fetch(msg) => msg.clone(),
            Self::Rejected(r) => r.message().to_string(),
        }
    }
}
