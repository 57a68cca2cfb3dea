//! ncp-core
//!
//! Pure domain types for Nursing Care Plans: assessment input and its
//! validation schemas, the seven-section care plan, explanations, users,
//! token usage, the progress estimator, the NNN lookup schema and the
//! storage key layout. No AWS SDK dependency.

pub mod error;
pub mod health;
pub mod models;
pub mod progress;
pub mod schema;
pub mod stats;
pub mod storage_keys;
pub mod validation;
