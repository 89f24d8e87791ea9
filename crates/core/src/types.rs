/// Server-assigned job identifier, opaque to the client.
pub type JobId = String;

/// Opaque reference to a completed artifact on the server.
pub type ResultRef = String;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
