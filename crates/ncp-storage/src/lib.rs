//! ncp-storage
//!
//! Object persistence for care plans, explanations, settings and the NNN
//! lookup table. S3 in production, an in-memory map for local runs and tests.

pub mod client;
pub mod error;
pub mod ncps;
pub mod objects;
pub mod state;
pub mod store;
