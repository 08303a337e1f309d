//! Perigee - identity and authorization core
//!
//! Authenticates principals with passwords or pluggable external providers,
//! issues and verifies RS256 bearer tokens, and answers allow/deny questions
//! against stored access-control grants.

pub mod auth;
pub mod authz;
pub mod entities;
pub mod errors;
pub mod password;
pub mod providers;
pub mod seed;
pub mod settings;
pub mod storage;
pub mod tokens;
