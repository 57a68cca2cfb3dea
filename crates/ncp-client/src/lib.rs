//! ncp-client
//!
//! Typed HTTP client for the NCP backend: generation, saved plans,
//! explanations, exports and admin operations, plus the cancellable
//! background-operation tracker that drives progress display.

pub mod admin;
pub mod client;
pub mod error;
pub mod generation;
pub mod ncps;
pub mod operations;

pub use client::NcpClient;
pub use error::ClientError;
pub use generation::GenerationOutcome;
pub use operations::{Operations, PendingOperation, ProgressTicker};
