//! The remote service contract.
//!
//! [`WebsiteRemote`] is the only seam between the engine and the service that
//! stores website configurations. Documents cross it whole: the service
//! replaces the entire configuration on every write and offers no
//! compare-and-swap, so the engine detects races after the fact rather than
//! locking.
//!
//! # Object safety
//!
//! The trait uses `#[async_trait]` so the controller can hold an
//! `Arc<dyn WebsiteRemote>`.

use sitecfg_core::AccountId;
use sitecfg_model::{BucketClass, WebsiteConfiguration};
use sitecfg_xml::XmlError;

/// Failure reported by a remote call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RemoteError {
    /// The service answered with an error code.
    #[error("{code}: {message}")]
    Service {
        /// Service error code, e.g. `NoSuchBucket`.
        code: String,
        /// Human-readable message.
        message: String,
    },

    /// The call did not complete before its deadline.
    #[error("remote call timed out")]
    Timeout,

    /// The connection failed before a response arrived.
    #[error("connection error: {0}")]
    Connection(String),

    /// The response could not be decoded.
    #[error("malformed response: {0}")]
    Malformed(String),
}

impl RemoteError {
    /// Shorthand for a service error.
    #[must_use]
    pub fn service(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Service {
            code: code.into(),
            message: message.into(),
        }
    }
}

impl From<XmlError> for RemoteError {
    fn from(err: XmlError) -> Self {
        Self::Malformed(err.to_string())
    }
}

/// Operations the engine needs from the remote service.
#[async_trait::async_trait]
pub trait WebsiteRemote: Send + Sync + std::fmt::Debug {
    /// Fetch the bucket's website configuration. `Ok(None)` means the bucket
    /// exists but has no configuration.
    async fn get_configuration(
        &self,
        bucket: &str,
        expected_owner: Option<&AccountId>,
    ) -> Result<Option<WebsiteConfiguration>, RemoteError>;

    /// Replace the bucket's website configuration with `document`.
    async fn put_configuration(
        &self,
        bucket: &str,
        expected_owner: Option<&AccountId>,
        document: &WebsiteConfiguration,
    ) -> Result<(), RemoteError>;

    /// Remove the bucket's website configuration.
    async fn delete_configuration(
        &self,
        bucket: &str,
        expected_owner: Option<&AccountId>,
    ) -> Result<(), RemoteError>;

    /// Report the bucket's class.
    async fn get_bucket_class(&self, bucket: &str) -> Result<BucketClass, RemoteError>;
}
