//! In-memory remote service.
//!
//! [`InMemoryWebsiteService`] implements [`WebsiteRemote`] the way a local
//! emulator would: buckets live in a `DashMap`, and each bucket's website
//! configuration is stored as the RestXml document the real service would
//! return, so every read goes through the same XML codec.
//!
//! Besides plain storage it counts calls per operation and exposes fault
//! hooks used to exercise the engine's failure paths:
//!
//! - one-shot injected errors per call ([`InMemoryWebsiteService::fail_next`])
//! - per-call latency ([`InMemoryWebsiteService::set_latency`])
//! - host-name lowercasing on write
//! - deletes that report success but keep the document
//! - a competing writer whose document lands right after the next put
//! - a put that reports success but stores nothing
//! - out-of-band writes and removals

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use bytes::Bytes;
use dashmap::DashMap;
use parking_lot::Mutex;
use sitecfg_core::AccountId;
use sitecfg_model::{BucketClass, WebsiteConfiguration};
use sitecfg_xml::{website_from_xml, website_to_xml};
use tracing::debug;

use crate::remote::{RemoteError, WebsiteRemote};

/// Account that owns buckets created without an explicit owner.
pub const DEFAULT_ACCOUNT_ID: &str = "000000000000";

/// The remote calls, for counting and fault injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RemoteCall {
    /// `GetConfiguration`.
    GetConfiguration,
    /// `PutConfiguration`.
    PutConfiguration,
    /// `DeleteConfiguration`.
    DeleteConfiguration,
    /// `GetBucketClass`.
    GetBucketClass,
}

#[derive(Debug)]
struct BucketEntry {
    class: BucketClass,
    owner: String,
    website: Option<Bytes>,
}

#[derive(Debug, Default)]
struct CallCounts {
    get: AtomicU64,
    put: AtomicU64,
    delete: AtomicU64,
    class: AtomicU64,
}

impl CallCounts {
    fn counter(&self, call: RemoteCall) -> &AtomicU64 {
        match call {
            RemoteCall::GetConfiguration => &self.get,
            RemoteCall::PutConfiguration => &self.put,
            RemoteCall::DeleteConfiguration => &self.delete,
            RemoteCall::GetBucketClass => &self.class,
        }
    }
}

#[derive(Debug, Default)]
struct Faults {
    injected: HashMap<RemoteCall, VecDeque<RemoteError>>,
    latency: Option<Duration>,
    lowercase_host_names: bool,
    ignore_deletes: bool,
    racing_write: Option<WebsiteConfiguration>,
    discard_next_put: bool,
}

/// In-memory website configuration store.
///
/// Thread-safe; share it behind an `Arc`. The fault mutex is never held
/// across an await point.
pub struct InMemoryWebsiteService {
    buckets: DashMap<String, BucketEntry>,
    calls: CallCounts,
    faults: Mutex<Faults>,
}

impl std::fmt::Debug for InMemoryWebsiteService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryWebsiteService")
            .field("bucket_count", &self.buckets.len())
            .finish_non_exhaustive()
    }
}

impl Default for InMemoryWebsiteService {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryWebsiteService {
    /// Create an empty service with no buckets.
    #[must_use]
    pub fn new() -> Self {
        Self {
            buckets: DashMap::new(),
            calls: CallCounts::default(),
            faults: Mutex::new(Faults::default()),
        }
    }

    // -----------------------------------------------------------------------
    // Bucket management
    // -----------------------------------------------------------------------

    /// Create a bucket owned by the default account. The class follows the
    /// bucket name (`--x-s3` suffix means directory bucket).
    pub fn create_bucket(&self, bucket: &str) {
        let class = BucketClass::from_bucket_name(bucket).unwrap_or(BucketClass::GeneralPurpose);
        self.insert_bucket(bucket, class, DEFAULT_ACCOUNT_ID);
    }

    /// Create a bucket owned by `owner`.
    pub fn create_bucket_owned_by(&self, bucket: &str, owner: &AccountId) {
        let class = BucketClass::from_bucket_name(bucket).unwrap_or(BucketClass::GeneralPurpose);
        self.insert_bucket(bucket, class, owner.as_str());
    }

    /// Create a bucket with an explicit class, regardless of its name.
    pub fn create_bucket_with_class(&self, bucket: &str, class: BucketClass) {
        self.insert_bucket(bucket, class, DEFAULT_ACCOUNT_ID);
    }

    fn insert_bucket(&self, bucket: &str, class: BucketClass, owner: &str) {
        self.buckets.insert(
            bucket.to_owned(),
            BucketEntry {
                class,
                owner: owner.to_owned(),
                website: None,
            },
        );
        debug!(bucket, class = %class, owner, "bucket created");
    }

    /// Remove a bucket along with its configuration.
    pub fn delete_bucket(&self, bucket: &str) -> bool {
        self.buckets.remove(bucket).is_some()
    }

    // -----------------------------------------------------------------------
    // Out-of-band state access
    // -----------------------------------------------------------------------

    /// Raw stored XML document for `bucket`, if any.
    #[must_use]
    pub fn stored_document(&self, bucket: &str) -> Option<Bytes> {
        self.buckets
            .get(bucket)
            .and_then(|entry| entry.website.clone())
    }

    /// Overwrite the stored configuration without counting a call, as another
    /// client would.
    pub fn set_configuration(
        &self,
        bucket: &str,
        document: &WebsiteConfiguration,
    ) -> Result<(), RemoteError> {
        let body = Bytes::from(website_to_xml(document)?);
        let mut entry = self
            .buckets
            .get_mut(bucket)
            .ok_or_else(|| no_such_bucket(bucket))?;
        entry.website = Some(body);
        Ok(())
    }

    /// Drop the stored configuration without counting a call.
    pub fn remove_configuration(&self, bucket: &str) -> bool {
        self.buckets
            .get_mut(bucket)
            .is_some_and(|mut entry| entry.website.take().is_some())
    }

    // -----------------------------------------------------------------------
    // Call counters
    // -----------------------------------------------------------------------

    /// How many times `call` has been invoked.
    #[must_use]
    pub fn call_count(&self, call: RemoteCall) -> u64 {
        self.calls.counter(call).load(Ordering::Relaxed)
    }

    /// Total calls across all operations.
    #[must_use]
    pub fn total_calls(&self) -> u64 {
        [
            RemoteCall::GetConfiguration,
            RemoteCall::PutConfiguration,
            RemoteCall::DeleteConfiguration,
            RemoteCall::GetBucketClass,
        ]
        .into_iter()
        .map(|call| self.call_count(call))
        .sum()
    }

    // -----------------------------------------------------------------------
    // Fault hooks
    // -----------------------------------------------------------------------

    /// Fail the next invocation of `call` with `error`. Queued errors are
    /// consumed in order, one per invocation.
    pub fn fail_next(&self, call: RemoteCall, error: RemoteError) {
        self.faults
            .lock()
            .injected
            .entry(call)
            .or_default()
            .push_back(error);
    }

    /// Delay every call by `latency`; `None` removes the delay.
    pub fn set_latency(&self, latency: Option<Duration>) {
        self.faults.lock().latency = latency;
    }

    /// Lowercase every host name on write, the way some services normalize
    /// DNS names.
    pub fn lowercase_host_names(&self, enabled: bool) {
        self.faults.lock().lowercase_host_names = enabled;
    }

    /// Make deletes report success while keeping the document.
    pub fn ignore_deletes(&self, enabled: bool) {
        self.faults.lock().ignore_deletes = enabled;
    }

    /// Store `document` right after the next successful put, as if a
    /// competing writer's request landed immediately afterwards.
    pub fn race_next_put(&self, document: WebsiteConfiguration) {
        self.faults.lock().racing_write = Some(document);
    }

    /// Make the next put report success without storing anything.
    pub fn discard_next_put(&self) {
        self.faults.lock().discard_next_put = true;
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    /// Count the call, apply latency and return an injected error if queued.
    async fn enter(&self, call: RemoteCall) -> Result<(), RemoteError> {
        self.calls.counter(call).fetch_add(1, Ordering::Relaxed);

        let latency = self.faults.lock().latency;
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }

        let injected = self
            .faults
            .lock()
            .injected
            .get_mut(&call)
            .and_then(VecDeque::pop_front);
        match injected {
            Some(err) => {
                debug!(?call, error = %err, "injected remote failure");
                Err(err)
            }
            None => Ok(()),
        }
    }

    /// Look up a website-capable bucket and check the expected owner.
    fn check_bucket(
        entry: &BucketEntry,
        bucket: &str,
        expected_owner: Option<&AccountId>,
    ) -> Result<(), RemoteError> {
        if !entry.class.supports_website() {
            return Err(RemoteError::service(
                "MethodNotAllowed",
                format!(
                    "The specified method is not allowed against bucket {bucket}: website configuration is not supported for directory buckets"
                ),
            ));
        }
        if let Some(owner) = expected_owner {
            if owner.as_str() != entry.owner {
                return Err(RemoteError::service("AccessDenied", "Access Denied"));
            }
        }
        Ok(())
    }
}

fn no_such_bucket(bucket: &str) -> RemoteError {
    RemoteError::service(
        "NoSuchBucket",
        format!("The specified bucket does not exist: {bucket}"),
    )
}

fn lowercase_hosts(document: &mut WebsiteConfiguration) {
    if let Some(ref mut rart) = document.redirect_all_requests_to {
        rart.host_name.make_ascii_lowercase();
    }
    for rule in &mut document.routing_rules {
        if let Some(ref mut host) = rule.redirect.host_name {
            host.make_ascii_lowercase();
        }
    }
}

#[async_trait::async_trait]
impl WebsiteRemote for InMemoryWebsiteService {
    async fn get_configuration(
        &self,
        bucket: &str,
        expected_owner: Option<&AccountId>,
    ) -> Result<Option<WebsiteConfiguration>, RemoteError> {
        self.enter(RemoteCall::GetConfiguration).await?;

        let body = {
            let entry = self.buckets.get(bucket).ok_or_else(|| no_such_bucket(bucket))?;
            Self::check_bucket(&entry, bucket, expected_owner)?;
            entry.website.clone()
        };

        match body {
            Some(body) => Ok(Some(website_from_xml(&body)?)),
            None => Ok(None),
        }
    }

    async fn put_configuration(
        &self,
        bucket: &str,
        expected_owner: Option<&AccountId>,
        document: &WebsiteConfiguration,
    ) -> Result<(), RemoteError> {
        self.enter(RemoteCall::PutConfiguration).await?;

        let lowercase = self.faults.lock().lowercase_host_names;
        let mut stored = document.clone();
        if lowercase {
            lowercase_hosts(&mut stored);
        }
        let body = Bytes::from(website_to_xml(&stored)?);

        let mut entry = self
            .buckets
            .get_mut(bucket)
            .ok_or_else(|| no_such_bucket(bucket))?;
        Self::check_bucket(&entry, bucket, expected_owner)?;

        // One-shot hooks are only consumed by a put that reaches storage.
        let (discard, racing) = {
            let mut faults = self.faults.lock();
            (
                std::mem::take(&mut faults.discard_next_put),
                faults.racing_write.take(),
            )
        };
        if discard {
            debug!(bucket, "put_configuration discarded");
            return Ok(());
        }
        let racing_body = racing
            .map(|doc| website_to_xml(&doc).map(Bytes::from))
            .transpose()?;
        entry.website = Some(racing_body.unwrap_or(body));
        debug!(bucket, "put_configuration completed");
        Ok(())
    }

    async fn delete_configuration(
        &self,
        bucket: &str,
        expected_owner: Option<&AccountId>,
    ) -> Result<(), RemoteError> {
        self.enter(RemoteCall::DeleteConfiguration).await?;

        let ignore = self.faults.lock().ignore_deletes;
        let mut entry = self
            .buckets
            .get_mut(bucket)
            .ok_or_else(|| no_such_bucket(bucket))?;
        Self::check_bucket(&entry, bucket, expected_owner)?;

        if !ignore {
            entry.website = None;
        }
        debug!(bucket, ignored = ignore, "delete_configuration completed");
        Ok(())
    }

    async fn get_bucket_class(&self, bucket: &str) -> Result<BucketClass, RemoteError> {
        self.enter(RemoteCall::GetBucketClass).await?;

        self.buckets
            .get(bucket)
            .map(|entry| entry.class)
            .ok_or_else(|| no_such_bucket(bucket))
    }
}
