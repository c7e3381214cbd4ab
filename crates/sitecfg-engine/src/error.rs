//! Reconciliation error types.
//!
//! Every failure that leaves the engine is a [`WebsiteError`]: an
//! [`ErrorKind`] tagged with the serialized identifier of the resource and the
//! lifecycle [`Operation`] that was attempted, so a failure can be correlated
//! with the exact resource and step.
//!
//! Internal stages (identifier decoding, validation, normalization, fetching)
//! return bare [`ErrorKind`]s; the lifecycle controller attaches context with
//! [`ErrorKind::during`].
//!
//! # Usage
//!
//! ```
//! use sitecfg_engine::error::{ErrorKind, Operation};
//!
//! let err = ErrorKind::Transient("SlowDown: reduce your request rate".into())
//!     .during(Operation::Update, "my-site");
//! assert!(err.is_retryable());
//! assert_eq!(err.identifier, "my-site");
//! ```

use std::fmt;

use crate::remote::RemoteError;

/// The lifecycle step an error was raised from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Creating a configuration on an absent resource.
    Create,
    /// Refreshing actual state.
    Read,
    /// Replacing the configuration of a present resource.
    Update,
    /// Removing the configuration.
    Delete,
    /// Adopting an existing configuration by identifier.
    Import,
}

impl Operation {
    /// Returns the lowercase name of the operation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Read => "read",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Import => "import",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What went wrong, independent of where.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ErrorKind {
    // -----------------------------------------------------------------------
    // Local (never reach the remote service)
    // -----------------------------------------------------------------------
    /// The serialized identifier could not be decoded.
    #[error("malformed identifier: {0}")]
    MalformedIdentifier(String),

    /// Attribute groups that cannot be combined were declared together.
    #[error("mutually exclusive attributes: {0}")]
    MutuallyExclusiveAttributes(String),

    /// A required attribute, or a required part of a declared group, is missing.
    #[error("incomplete attribute group: {0}")]
    IncompleteAttributeGroup(String),

    /// A declared attribute has a value the remote service cannot accept.
    #[error("invalid attribute: {0}")]
    InvalidAttribute(String),

    // -----------------------------------------------------------------------
    // Remote state
    // -----------------------------------------------------------------------
    /// The bucket has no website configuration.
    #[error("website configuration not found")]
    NotFound,

    /// The bucket itself does not exist.
    #[error("bucket not found")]
    BucketNotFound,

    /// The bucket cannot hold a website configuration.
    #[error("unsupported target: {0}")]
    UnsupportedTarget(String),

    // -----------------------------------------------------------------------
    // Post-apply verification
    // -----------------------------------------------------------------------
    /// The confirming read after a write did not match what was written.
    #[error("drift after apply: {0}")]
    DriftAfterApply(String),

    /// The configuration was still present after a delete.
    #[error("destroy incomplete: website configuration still present after delete")]
    DestroyIncomplete,

    // -----------------------------------------------------------------------
    // Remote failures
    // -----------------------------------------------------------------------
    /// Network, timeout or throttling failure. Retrying the same plan may succeed.
    #[error("transient remote failure: {0}")]
    Transient(String),

    /// Malformed remote response or a violated engine invariant.
    #[error("fatal: {0}")]
    Fatal(String),
}

impl ErrorKind {
    /// Attach the operation and resource identifier.
    #[must_use]
    pub fn during(self, operation: Operation, identifier: impl fmt::Display) -> WebsiteError {
        WebsiteError {
            identifier: identifier.to_string(),
            operation,
            kind: self,
        }
    }

    /// Whether the caller may retry with the same plan.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transient(_))
    }
}

/// Remote error codes that signal a temporary condition.
const TRANSIENT_CODES: &[&str] = &[
    "SlowDown",
    "ServiceUnavailable",
    "InternalError",
    "RequestTimeout",
    "OperationAborted",
];

/// Remote error codes returned by bucket classes without website support.
const UNSUPPORTED_CODES: &[&str] = &["MethodNotAllowed", "NotImplemented"];

impl From<RemoteError> for ErrorKind {
    fn from(err: RemoteError) -> Self {
        match err {
            RemoteError::Timeout => Self::Transient("remote call timed out".to_owned()),
            RemoteError::Connection(msg) => Self::Transient(format!("connection error: {msg}")),
            RemoteError::Malformed(msg) => Self::Fatal(format!("malformed remote response: {msg}")),
            RemoteError::Service { code, message } => match code.as_str() {
                "NoSuchWebsiteConfiguration" => Self::NotFound,
                "NoSuchBucket" => Self::BucketNotFound,
                c if UNSUPPORTED_CODES.contains(&c) => Self::UnsupportedTarget(message),
                c if TRANSIENT_CODES.contains(&c) => Self::Transient(format!("{code}: {message}")),
                _ if message.to_ascii_lowercase().contains("directory bucket") => {
                    Self::UnsupportedTarget(message)
                }
                _ => Self::Fatal(format!("{code}: {message}")),
            },
        }
    }
}

/// A failure of one lifecycle operation on one resource.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{operation} {identifier}: {kind}")]
pub struct WebsiteError {
    /// Serialized identifier of the resource (bucket name when none exists yet).
    pub identifier: String,
    /// The operation being attempted.
    pub operation: Operation,
    /// The failure.
    #[source]
    pub kind: ErrorKind,
}

impl WebsiteError {
    /// Whether the caller may retry with the same plan.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        self.kind.is_retryable()
    }
}

/// Convenience result type for lifecycle operations.
pub type WebsiteResult<T> = Result<T, WebsiteError>;
