//! ncp-cli
//!
//! Terminal front end for the NCP backend. The library half holds the
//! pieces with no I/O beyond the filesystem (config, assessment files,
//! session bookkeeping and text rendering) so they can be tested.

pub mod config;
pub mod input;
pub mod render;
pub mod session;
