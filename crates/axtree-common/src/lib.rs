//! # axtree Common
//!
//! Error types and logging configuration shared by the axtree crates.
//!
//! ## Features
//!
//! - Unified error type with a distinct configuration category
//! - Logging configuration and setup
//! - Option extension trait

use thiserror::Error;

pub mod logging;

pub use logging::{init_logging, LogConfig, LogFormat};

/// Unified error type for axtree.
#[derive(Error, Debug)]
pub enum AxError {
    /// Configuration errors: a missing or incompatible collaborator
    /// (HTML parser, logging backend).
    #[error("Config error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Resource not found.
    #[error("Resource not found: {0}")]
    NotFound(String),
}

impl AxError {
    /// Create a configuration error with source.
    pub fn config_with_source<E: std::error::Error + Send + Sync + 'static>(
        message: impl Into<String>,
        source: E,
    ) -> Self {
        Self::Config {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Check if this is a configuration error.
    pub fn is_config(&self) -> bool {
        matches!(self, AxError::Config { .. })
    }
}

/// Result type alias for axtree operations.
pub type Result<T> = std::result::Result<T, AxError>;

/// Extension trait for Option.
pub trait OptionExt<T> {
    /// Convert None to a NotFound error.
    fn ok_or_not_found(self, resource: impl Into<String>) -> Result<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_not_found(self, resource: impl Into<String>) -> Result<T> {
        self.ok_or_else(|| AxError::NotFound(resource.into()))
    }
}
