//! Top-level error type for warden-core.
//!
//! The pipeline entry point never returns this: call-level failures are
//! encoded in [`crate::pipeline::ToolResult`]. This type covers the
//! embedder-facing fallible operations around the pipeline — registering
//! tools, loading and updating permission configuration, parsing rules.

use thiserror::Error;

use crate::permission::{RuleParseError, RuleStoreError};
use crate::registry::RegistryError;
use crate::validate::ValidationError;

/// Flattened error for warden-core setup and configuration operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Tool registration failed.
    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),

    /// A permission rule string did not parse.
    #[error("rule error: {0}")]
    Rule(#[from] RuleParseError),

    /// Permission configuration could not be read or written.
    #[error("config error: {0}")]
    Config(#[from] RuleStoreError),

    /// Parameter validation failed outside the pipeline.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl Error {
    /// Returns true if this is a registration error.
    pub fn is_registry(&self) -> bool {
        matches!(self, Self::Registry(_))
    }

    /// Returns true if this is a rule parse error.
    pub fn is_rule(&self) -> bool {
        matches!(self, Self::Rule(_))
    }

    /// Returns true if this is a configuration storage error.
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }
}

/// Result type for warden-core operations.
pub type Result<T> = std::result::Result<T, Error>;
