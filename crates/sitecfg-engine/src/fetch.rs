//! Remote state fetcher.
//!
//! Reads the current configuration for one identifier and returns it in
//! canonical form. Every remote call is bounded by the configured deadline;
//! an elapsed deadline is reported as [`ErrorKind::Transient`]. Dropping the
//! returned future cancels the call and leaves nothing behind.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use sitecfg_core::AwsRegion;
use sitecfg_model::BucketClass;
use tracing::debug;

use crate::error::ErrorKind;
use crate::identifier::ResourceIdentifier;
use crate::normalize::CanonicalConfiguration;
use crate::remote::{RemoteError, WebsiteRemote};

/// Error text for buckets that can never hold a website configuration.
pub const DIRECTORY_BUCKET_UNSUPPORTED: &str = "directory buckets are not supported";

/// Fetched state of one resource, with the computed attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActualConfiguration {
    /// The resource the state belongs to.
    pub identifier: ResourceIdentifier,
    /// Canonical configuration held by the remote service.
    pub configuration: CanonicalConfiguration,
    /// Domain of the bucket's website endpoint, e.g.
    /// `s3-website-us-east-1.amazonaws.com`.
    pub website_domain: String,
    /// Full website endpoint, `<bucket>.<website_domain>`.
    pub website_endpoint: String,
}

impl ActualConfiguration {
    /// The computed `routing_rules` attribute.
    #[must_use]
    pub fn routing_rules_json(&self) -> Option<String> {
        self.configuration.routing_rules_json()
    }
}

/// Run a remote call under `deadline`, classifying its failure.
pub(crate) async fn bounded<T, F>(deadline: Duration, call: F) -> Result<T, ErrorKind>
where
    F: Future<Output = Result<T, RemoteError>>,
{
    match tokio::time::timeout(deadline, call).await {
        Ok(result) => result.map_err(ErrorKind::from),
        Err(_) => Err(ErrorKind::from(RemoteError::Timeout)),
    }
}

/// Read-only access to remote state. Cheap to clone; safe to share between
/// concurrent passes on different identifiers.
#[derive(Debug, Clone)]
pub struct RemoteStateFetcher {
    remote: Arc<dyn WebsiteRemote>,
    region: AwsRegion,
    deadline: Duration,
}

impl RemoteStateFetcher {
    /// Create a fetcher over `remote`.
    #[must_use]
    pub fn new(remote: Arc<dyn WebsiteRemote>, region: AwsRegion, deadline: Duration) -> Self {
        Self {
            remote,
            region,
            deadline,
        }
    }

    /// Fail with [`ErrorKind::UnsupportedTarget`] unless the bucket can hold
    /// a website configuration.
    ///
    /// Directory buckets are recognized by name without a remote call;
    /// anything else is asked for its class.
    pub async fn check_target(&self, identifier: &ResourceIdentifier) -> Result<(), ErrorKind> {
        let bucket = identifier.bucket();
        if BucketClass::from_bucket_name(bucket) == Some(BucketClass::Directory) {
            debug!(bucket, "directory bucket rejected locally");
            return Err(ErrorKind::UnsupportedTarget(
                DIRECTORY_BUCKET_UNSUPPORTED.to_owned(),
            ));
        }

        let class = bounded(self.deadline, self.remote.get_bucket_class(bucket)).await?;
        if !class.supports_website() {
            debug!(bucket, class = %class, "bucket class rejects website configuration");
            return Err(ErrorKind::UnsupportedTarget(format!(
                "bucket class {class} does not support website configuration"
            )));
        }
        Ok(())
    }

    /// Fetch the canonical configuration.
    ///
    /// # Errors
    ///
    /// - [`ErrorKind::NotFound`] when the bucket has no configuration
    /// - [`ErrorKind::BucketNotFound`] when the bucket does not exist
    /// - [`ErrorKind::UnsupportedTarget`] for buckets that cannot host a site
    pub async fn fetch(
        &self,
        identifier: &ResourceIdentifier,
    ) -> Result<CanonicalConfiguration, ErrorKind> {
        self.check_target(identifier).await?;
        self.read_configuration(identifier)
            .await?
            .ok_or(ErrorKind::NotFound)
    }

    /// Fetch the configuration with the computed endpoint attributes.
    pub async fn fetch_actual(
        &self,
        identifier: &ResourceIdentifier,
    ) -> Result<ActualConfiguration, ErrorKind> {
        let configuration = self.fetch(identifier).await?;
        Ok(self.actual(identifier.clone(), configuration))
    }

    /// Like [`fetch`](Self::fetch), mapping [`ErrorKind::NotFound`] to `None`.
    pub async fn fetch_optional(
        &self,
        identifier: &ResourceIdentifier,
    ) -> Result<Option<CanonicalConfiguration>, ErrorKind> {
        match self.fetch(identifier).await {
            Ok(configuration) => Ok(Some(configuration)),
            Err(ErrorKind::NotFound) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Attach the computed attributes to a fetched configuration.
    #[must_use]
    pub fn actual(
        &self,
        identifier: ResourceIdentifier,
        configuration: CanonicalConfiguration,
    ) -> ActualConfiguration {
        ActualConfiguration {
            website_domain: self.region.website_domain(),
            website_endpoint: self.region.website_endpoint(identifier.bucket()),
            identifier,
            configuration,
        }
    }

    /// Read the configuration of a target that already passed
    /// [`check_target`](Self::check_target) in the same pass.
    pub(crate) async fn read_configuration(
        &self,
        identifier: &ResourceIdentifier,
    ) -> Result<Option<CanonicalConfiguration>, ErrorKind> {
        let document = bounded(
            self.deadline,
            self.remote
                .get_configuration(identifier.bucket(), identifier.expected_owner()),
        )
        .await?;

        debug!(identifier = %identifier, found = document.is_some(), "fetched website configuration");
        Ok(document.map(CanonicalConfiguration::from))
    }

    /// The remote handle, for writes issued by the controller.
    pub(crate) fn remote(&self) -> &dyn WebsiteRemote {
        self.remote.as_ref()
    }

    /// The per-call deadline.
    pub(crate) fn deadline(&self) -> Duration {
        self.deadline
    }
}
