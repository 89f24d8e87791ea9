//! Typed status events from the server's progress stream.
//!
//! The server pushes JSON messages tagged by a `status` field. They
//! deserialize into a closed [`StreamMessage`] enum so that an
//! unrecognized status is a parse error rather than a silently-ignored
//! string comparison.

use serde::Deserialize;

/// All known progress-stream message types.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "status")]
pub enum StreamMessage {
    /// The job is waiting to start. Status text only, no payload.
    #[serde(rename = "queued")]
    Queued,

    /// The conversion is running. Carries a completion percentage.
    ///
    /// Historically emitted as `started`; newer servers say
    /// `processing`. Both map here.
    #[serde(rename = "started", alias = "processing")]
    Processing { progress: f64 },

    /// The conversion completed. Carries the artifact reference used
    /// for the one-shot result fetch.
    #[serde(rename = "finished")]
    Finished { result: String },
}

/// Parse one progress-stream text frame into a typed message.
///
/// Returns `Err` for malformed JSON and for unknown `status` values;
/// the controller treats either as a fatal stream error.
pub fn parse_message(text: &str) -> Result<StreamMessage, serde_json::Error> {
    serde_json::from_str(text)
}
