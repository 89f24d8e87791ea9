//! Job-lifecycle controller for a remote ASCII-art conversion service.
//!
//! Submits a file plus conversion parameters, attaches to the server's
//! push stream of status events, reconciles server-pushed completion
//! with user-initiated cancellation, and drives exactly one result
//! fetch. UI layers observe the controller through broadcast
//! [`JobEvent`] notifications; the controller never touches
//! presentation state itself.

pub mod api;
pub mod controller;
pub mod events;
pub mod messages;
pub mod service;
pub mod socket;
pub mod subscription;

pub use api::HttpConvertService;
pub use controller::{CancelOutcome, ControllerHandle, JobController};
pub use events::JobEvent;
pub use service::ConvertService;
pub use subscription::{StreamError, Subscription};
