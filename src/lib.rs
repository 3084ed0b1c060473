//! zentao-client - authenticated client for the ZenTao project management API
//!
//! The client derives and caches short-lived app tokens, translates
//! REST-style paths into ZenTao module/function calls, and retries once when
//! the server reports an expired token.

pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;

pub use api::{ApiError, ClientConfig, Credentials, ZentaoClient};
