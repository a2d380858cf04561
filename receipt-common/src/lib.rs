//! # Receipt Common Library
//!
//! Shared code for the receipt services including:
//! - Token authority (signed identity tokens, bearer header parsing)
//! - Recognition record models
//! - Documents store access and the duplicate-submission guard
//! - Configuration loading
//! - Error types

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod models;

pub use error::{Error, Result};
pub use models::{Identity, RecognitionRecord};
