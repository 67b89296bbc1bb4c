//! Sitechat Core Library
//!
//! This crate provides the foundational utilities for the sitechat pipeline:
//! - Error handling (`AppError`, `AppResult`)
//! - Logging infrastructure
//! - Configuration management
//! - Cooperative cancellation (`CancelToken`)

pub mod cancel;
pub mod config;
pub mod error;
pub mod logging;

// Re-export commonly used types
pub use cancel::CancelToken;
pub use config::AppConfig;
pub use error::{AppError, AppResult};
