//! ZenTao API client and its building blocks.
//!
//! This module provides the interface for communicating with the ZenTao API:
//! token derivation and caching, path translation, URL assembly and the
//! request executor.

pub mod auth;
mod client;
pub mod clock;
pub mod error;
pub mod token;
pub mod token_cache;
pub mod translate;
pub mod types;
pub mod url;

pub use auth::{AuthMode, Credentials};
pub use client::{ClientConfig, ZentaoClient, DEFAULT_TIMEOUT_SECS};
pub use error::{ApiError, Result};
pub use translate::{translate, TranslatedCall};
