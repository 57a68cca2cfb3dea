//! ncp-auth
//!
//! Cognito sign-in flows, JWT validation, admin gates and user
//! administration.

pub mod client;
pub mod error;
pub mod flows;
pub mod jwt;
pub mod users;
