//! Reconciliation engine for bucket static-website configurations.
//!
//! Keeps the website configuration of one bucket in line with a declared
//! desired state: decode identifiers, fetch actual state, normalize both
//! sides to one canonical form, diff, apply, then verify with a confirming
//! read.
//!
//! # Architecture
//!
//! ```text
//! Declarative front end (create / read / update / delete / import)
//!        |
//!        v
//! WebsiteController (lifecycle, apply, confirming fetch)
//!        |
//!        +--> validation + normalize + plan (pure, local)
//!        |
//!        v
//! RemoteStateFetcher (deadlines, error classification)
//!        |
//!        v
//! WebsiteRemote (remote service or InMemoryWebsiteService)
//! ```

pub mod config;
pub mod error;
pub mod fetch;
pub mod identifier;
pub mod lifecycle;
pub mod memory;
pub mod normalize;
pub mod plan;
pub mod remote;
pub mod validation;

pub use config::EngineConfig;
pub use error::{ErrorKind, Operation, WebsiteError, WebsiteResult};
pub use fetch::{ActualConfiguration, RemoteStateFetcher};
pub use identifier::ResourceIdentifier;
pub use lifecycle::{LifecycleState, WebsiteController};
pub use memory::InMemoryWebsiteService;
pub use normalize::{CanonicalConfiguration, RoutingRuleSet, normalize_rules};
pub use plan::{AttributeDiff, PlanAction, ReconciliationPlan, WebsiteAttribute, plan, plan_destroy};
pub use remote::{RemoteError, WebsiteRemote};
pub use validation::{WebsiteSpec, validate};
