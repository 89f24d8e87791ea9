//! Pure domain logic for the glyphify conversion client.
//!
//! Everything here is I/O-free: the job status state machine, the
//! conversion parameter set, client-side limits, and the error
//! taxonomy shared by the transport and controller layers.

pub mod error;
pub mod job;
pub mod limits;
pub mod params;
pub mod types;
pub mod upload;
