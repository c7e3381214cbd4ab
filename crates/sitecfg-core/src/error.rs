//! Error types for the sitecfg core.

/// Core error type for shared sitecfg types.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// Invalid AWS account ID format.
    #[error("invalid AWS account ID: {0} (must be 12-digit numeric string)")]
    InvalidAccountId(String),

    /// Invalid region identifier.
    #[error("invalid AWS region: {0:?}")]
    InvalidRegion(String),
}

/// Convenience result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;
