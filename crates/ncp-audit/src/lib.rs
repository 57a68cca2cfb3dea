//! ncp-audit
//!
//! Application-level audit events and the per-request record of a
//! care plan generation.

pub mod error;
pub mod events;
pub mod tracker;
