//! End-to-end reconciliation scenarios for sitecfg.
//!
//! Each scenario drives a [`WebsiteController`] against an
//! [`InMemoryWebsiteService`], the way the declarative front end would:
//! create, refresh, update, import and destroy, plus the failure modes the
//! service can produce.
//!
//! Run them with:
//! ```text
//! cargo test -p sitecfg-integration
//! ```
//!
//! Set `RUST_LOG=sitecfg_engine=debug` to see every pipeline step.

use std::sync::{Arc, Once};

use sitecfg_engine::{EngineConfig, InMemoryWebsiteService, WebsiteController};

static INIT: Once = Once::new();

/// Initialize tracing (once). `RUST_LOG` takes precedence over the
/// configured `LOG_LEVEL`.
fn init_tracing(level: &str) {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level)),
            )
            .with_test_writer()
            .init();
    });
}

/// A fresh in-memory service and a controller bound to it.
#[must_use]
pub fn harness() -> (Arc<InMemoryWebsiteService>, WebsiteController) {
    harness_with(EngineConfig::from_env())
}

/// Like [`harness`], with an explicit configuration.
#[must_use]
pub fn harness_with(config: EngineConfig) -> (Arc<InMemoryWebsiteService>, WebsiteController) {
    init_tracing(&config.log_level);

    let service = Arc::new(InMemoryWebsiteService::new());
    let controller = WebsiteController::new(service.clone(), config)
        .unwrap_or_else(|e| panic!("invalid engine config: {e}"));
    (service, controller)
}

/// Generate a unique bucket name for a test.
#[must_use]
pub fn test_bucket_name(prefix: &str) -> String {
    let id = uuid::Uuid::new_v4().to_string()[..8].to_owned();
    format!("test-{prefix}-{id}")
}

/// Create a bucket and return its name.
pub fn create_test_bucket(service: &InMemoryWebsiteService, prefix: &str) -> String {
    let name = test_bucket_name(prefix);
    service.create_bucket(&name);
    name
}

mod test_concurrency;
mod test_drift;
mod test_import;
mod test_lifecycle;
mod test_routing_rules;
