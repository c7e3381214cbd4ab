//! Lifecycle controller.
//!
//! [`WebsiteController`] runs reconciliation passes for the declarative
//! front end:
//!
//! ```text
//! validate -> fetch -> normalize -> plan -> apply -> confirming fetch
//! ```
//!
//! A pass is a short sequential pipeline. The controller holds no mutable
//! state: its configuration and remote handle are shared immutably, so
//! passes for different identifiers can run concurrently. Passes for the same
//! identifier are not coordinated. The confirming fetch after every write
//! detects a racing writer and reports it as [`ErrorKind::DriftAfterApply`].
//!
//! Resource states move along:
//!
//! ```text
//! Absent -> Creating -> Present -> (Updating -> Present)* -> Destroying -> Absent
//! Absent -> Importing -> Present
//! ```

use std::fmt;
use std::sync::Arc;

use sitecfg_core::CoreResult;
use sitecfg_model::DesiredConfiguration;
use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::error::{ErrorKind, Operation, WebsiteError, WebsiteResult};
use crate::fetch::{ActualConfiguration, RemoteStateFetcher, bounded};
use crate::identifier::ResourceIdentifier;
use crate::plan::{PlanAction, ReconciliationPlan, plan, plan_destroy};
use crate::remote::WebsiteRemote;
use crate::validation::{WebsiteSpec, validate};

/// Where a resource is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleState {
    /// No configuration exists.
    Absent,
    /// A configuration is being written for the first time.
    Creating,
    /// A configuration exists and is managed.
    Present,
    /// A present configuration is being replaced.
    Updating,
    /// The configuration is being removed.
    Destroying,
    /// An existing configuration is being adopted.
    Importing,
}

impl LifecycleState {
    /// Whether `self -> next` is a legal move. Failed steps fall back to
    /// the state they started from.
    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        use LifecycleState::{Absent, Creating, Destroying, Importing, Present, Updating};
        matches!(
            (self, next),
            (Absent, Creating | Importing)
                | (Creating | Importing, Present | Absent)
                | (Present, Updating | Destroying)
                | (Updating, Present)
                | (Destroying, Absent | Present)
        )
    }

    /// Returns the state name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Absent => "absent",
            Self::Creating => "creating",
            Self::Present => "present",
            Self::Updating => "updating",
            Self::Destroying => "destroying",
            Self::Importing => "importing",
        }
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-call transition log.
///
/// The engine keeps no state between calls, so each tracker starts from the
/// state the plan implies (`Create` from `Absent`, `Update` and `Destroy`
/// from `Present`) and only validates and logs the transitions of that call.
/// A failed step leaves the tracker where it failed; the next pass starts
/// again from fetched remote state.
#[derive(Debug)]
struct Lifecycle {
    identifier: String,
    operation: Operation,
    state: LifecycleState,
}

impl Lifecycle {
    fn start(identifier: &ResourceIdentifier, operation: Operation, state: LifecycleState) -> Self {
        Self {
            identifier: identifier.encode(),
            operation,
            state,
        }
    }

    fn advance(&mut self, next: LifecycleState) -> WebsiteResult<()> {
        if !self.state.can_transition_to(next) {
            return Err(self.fail(ErrorKind::Fatal(format!(
                "invalid lifecycle transition {} -> {next}",
                self.state
            ))));
        }
        info!(
            identifier = %self.identifier,
            operation = %self.operation,
            from = %self.state,
            to = %next,
            "lifecycle transition"
        );
        self.state = next;
        Ok(())
    }

    /// Wrap `kind` with this call's context.
    fn fail(&self, kind: ErrorKind) -> WebsiteError {
        debug!(
            identifier = %self.identifier,
            operation = %self.operation,
            state = %self.state,
            error = %kind,
            "lifecycle step failed"
        );
        kind.during(self.operation, &self.identifier)
    }
}

/// Drives reconciliation passes against a remote service.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
///
/// use sitecfg_engine::config::EngineConfig;
/// use sitecfg_engine::lifecycle::WebsiteController;
/// use sitecfg_engine::memory::InMemoryWebsiteService;
/// use sitecfg_model::DesiredConfiguration;
///
/// # tokio_test::block_on(async {
/// let service = Arc::new(InMemoryWebsiteService::new());
/// service.create_bucket("my-site");
///
/// let controller = WebsiteController::new(service, EngineConfig::default()).unwrap();
/// let desired = DesiredConfiguration::new("my-site").with_index_document("index.html");
/// let id = controller.create(&desired).await.unwrap();
///
/// let actual = controller.read(&id).await.unwrap().unwrap();
/// assert_eq!(actual.website_endpoint, "my-site.s3-website-us-east-1.amazonaws.com");
/// # });
/// ```
#[derive(Debug, Clone)]
pub struct WebsiteController {
    fetcher: RemoteStateFetcher,
    config: Arc<EngineConfig>,
}

impl WebsiteController {
    /// Create a controller over `remote`.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidRegion` for an unusable configured region.
    pub fn new(remote: Arc<dyn WebsiteRemote>, config: EngineConfig) -> CoreResult<Self> {
        let fetcher = RemoteStateFetcher::new(remote, config.region()?, config.operation_timeout());
        Ok(Self {
            fetcher,
            config: Arc::new(config),
        })
    }

    /// The engine configuration.
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The state fetcher used by this controller.
    #[must_use]
    pub fn fetcher(&self) -> &RemoteStateFetcher {
        &self.fetcher
    }

    // -----------------------------------------------------------------------
    // Front-end operations
    // -----------------------------------------------------------------------

    /// Create the declared configuration and return its identifier.
    pub async fn create(&self, desired: &DesiredConfiguration) -> WebsiteResult<ResourceIdentifier> {
        let (identifier, spec) =
            validate(desired).map_err(|kind| kind.during(Operation::Create, &desired.bucket))?;

        let actual = self
            .fetcher
            .fetch_optional(&identifier)
            .await
            .map_err(|kind| kind.during(Operation::Create, &identifier))?;
        let plan = plan(&spec, actual.as_ref());
        debug!(identifier = %identifier, plan = %plan, "planned create");

        self.execute(Operation::Create, &plan, &identifier, Some(&spec))
            .await?;
        Ok(identifier)
    }

    /// Refresh actual state. `Ok(None)` means the configuration, or its
    /// bucket, no longer exists and the resource should be dropped.
    pub async fn read(
        &self,
        identifier: &ResourceIdentifier,
    ) -> WebsiteResult<Option<ActualConfiguration>> {
        match self.fetcher.fetch_actual(identifier).await {
            Ok(actual) => Ok(Some(actual)),
            Err(kind @ (ErrorKind::NotFound | ErrorKind::BucketNotFound)) => {
                warn!(identifier = %identifier, reason = %kind, "website configuration gone, removing from state");
                Ok(None)
            }
            Err(kind) => Err(kind.during(Operation::Read, identifier)),
        }
    }

    /// Replace the configuration of an existing resource.
    ///
    /// Changing the bucket or expected owner is rejected: that is a new
    /// resource, see [`ResourceIdentifier::requires_replacement`].
    pub async fn update(
        &self,
        identifier: &ResourceIdentifier,
        desired: &DesiredConfiguration,
    ) -> WebsiteResult<()> {
        let (declared, spec) =
            validate(desired).map_err(|kind| kind.during(Operation::Update, identifier))?;
        if identifier.requires_replacement(&declared) {
            return Err(ErrorKind::Fatal(format!(
                "changing the resource identity to {declared} requires replacement"
            ))
            .during(Operation::Update, identifier));
        }

        let actual = self
            .fetcher
            .fetch_optional(identifier)
            .await
            .map_err(|kind| kind.during(Operation::Update, identifier))?;
        let plan = plan(&spec, actual.as_ref());
        debug!(identifier = %identifier, plan = %plan, "planned update");

        self.execute(Operation::Update, &plan, identifier, Some(&spec))
            .await?;
        Ok(())
    }

    /// Remove the configuration. An already-absent configuration is success.
    pub async fn delete(&self, identifier: &ResourceIdentifier) -> WebsiteResult<()> {
        let plan = plan_destroy(identifier);
        self.execute(Operation::Delete, &plan, identifier, None)
            .await?;
        Ok(())
    }

    /// Adopt an existing configuration from its serialized identifier.
    ///
    /// # Errors
    ///
    /// [`ErrorKind::MalformedIdentifier`] for an undecodable identifier and
    /// [`ErrorKind::NotFound`] when nothing is configured.
    pub async fn import(
        &self,
        serialized: &str,
    ) -> WebsiteResult<(ResourceIdentifier, ActualConfiguration)> {
        let identifier = ResourceIdentifier::decode(serialized)
            .map_err(|kind| kind.during(Operation::Import, serialized))?;

        let mut lifecycle = Lifecycle::start(&identifier, Operation::Import, LifecycleState::Absent);
        lifecycle.advance(LifecycleState::Importing)?;

        let actual = match self.fetcher.fetch_actual(&identifier).await {
            Ok(actual) => actual,
            Err(kind) => return Err(lifecycle.fail(kind)),
        };

        lifecycle.advance(LifecycleState::Present)?;
        info!(identifier = %identifier, "website configuration imported");
        Ok((identifier, actual))
    }

    /// Execute `plan` against `identifier`.
    ///
    /// `Create` and `Update` check the target, need the `spec` to write and
    /// finish with a confirming fetch; `Destroy` ignores it.
    pub async fn apply(
        &self,
        plan: &ReconciliationPlan,
        identifier: &ResourceIdentifier,
        spec: Option<&WebsiteSpec>,
    ) -> WebsiteResult<ResourceIdentifier> {
        let operation = match plan.action {
            PlanAction::Create => Operation::Create,
            PlanAction::Destroy => Operation::Delete,
            PlanAction::NoOp | PlanAction::Update => Operation::Update,
        };
        if matches!(plan.action, PlanAction::Create | PlanAction::Update) {
            self.fetcher
                .check_target(identifier)
                .await
                .map_err(|kind| kind.during(operation, identifier))?;
        }
        self.execute(operation, plan, identifier, spec).await?;
        Ok(identifier.clone())
    }

    /// Run one full pass from an optional existing identifier to an optional
    /// declaration, returning the executed plan.
    ///
    /// - no declaration: destroy what the identifier names
    /// - a declaration whose identity differs from `identifier`: destroy the
    ///   old resource, then create the new one
    /// - otherwise: plan against fetched state and apply
    pub async fn reconcile(
        &self,
        identifier: Option<&ResourceIdentifier>,
        desired: Option<&DesiredConfiguration>,
    ) -> WebsiteResult<ReconciliationPlan> {
        let Some(desired) = desired else {
            let Some(identifier) = identifier else {
                return Ok(ReconciliationPlan {
                    action: PlanAction::NoOp,
                    attribute_diffs: std::collections::BTreeMap::new(),
                });
            };
            let plan = plan_destroy(identifier);
            self.execute(Operation::Delete, &plan, identifier, None)
                .await?;
            return Ok(plan);
        };

        let operation = if identifier.is_some() {
            Operation::Update
        } else {
            Operation::Create
        };
        let context = identifier.map_or_else(|| desired.bucket.clone(), ToString::to_string);
        let (declared, spec) = validate(desired).map_err(|kind| kind.during(operation, &context))?;

        if let Some(old) = identifier.filter(|old| old.requires_replacement(&declared)) {
            info!(from = %old, to = %declared, "identity changed, replacing resource");
            self.execute(Operation::Delete, &plan_destroy(old), old, None)
                .await?;
        }

        let actual = self
            .fetcher
            .fetch_optional(&declared)
            .await
            .map_err(|kind| kind.during(operation, &declared))?;
        let plan = plan(&spec, actual.as_ref());
        debug!(identifier = %declared, plan = %plan, "planned reconciliation");

        self.execute(operation, &plan, &declared, Some(&spec))
            .await?;
        Ok(plan)
    }

    // -----------------------------------------------------------------------
    // Plan execution
    // -----------------------------------------------------------------------

    async fn execute(
        &self,
        operation: Operation,
        plan: &ReconciliationPlan,
        identifier: &ResourceIdentifier,
        spec: Option<&WebsiteSpec>,
    ) -> WebsiteResult<()> {
        match plan.action {
            PlanAction::NoOp => {
                debug!(identifier = %identifier, "no changes");
                Ok(())
            }
            PlanAction::Create | PlanAction::Update => {
                let Some(spec) = spec else {
                    return Err(ErrorKind::Fatal(format!(
                        "{} plan executed without a desired configuration",
                        plan.action
                    ))
                    .during(operation, identifier));
                };
                self.write(operation, plan, identifier, spec).await
            }
            PlanAction::Destroy => self.destroy(operation, identifier).await,
        }
    }

    async fn write(
        &self,
        operation: Operation,
        plan: &ReconciliationPlan,
        identifier: &ResourceIdentifier,
        spec: &WebsiteSpec,
    ) -> WebsiteResult<()> {
        let (from, during) = if plan.action == PlanAction::Create {
            (LifecycleState::Absent, LifecycleState::Creating)
        } else {
            (LifecycleState::Present, LifecycleState::Updating)
        };
        let mut lifecycle = Lifecycle::start(identifier, operation, from);
        lifecycle.advance(during)?;

        let document = spec.to_canonical().to_document();
        let put = bounded(
            self.fetcher.deadline(),
            self.fetcher.remote().put_configuration(
                identifier.bucket(),
                identifier.expected_owner(),
                &document,
            ),
        )
        .await;
        if let Err(kind) = put {
            return Err(lifecycle.fail(kind));
        }
        debug!(identifier = %identifier, action = %plan.action, "configuration submitted");

        let confirmed = match self.fetcher.read_configuration(identifier).await {
            Ok(confirmed) => confirmed,
            Err(kind) => return Err(lifecycle.fail(kind)),
        };
        let Some(confirmed) = confirmed else {
            warn!(identifier = %identifier, action = %plan.action, "configuration absent after apply");
            return Err(lifecycle.fail(ErrorKind::DriftAfterApply(format!(
                "configuration absent after {}",
                plan.action
            ))));
        };

        let recheck = crate::plan::plan(spec, Some(&confirmed));
        if !recheck.is_noop() {
            warn!(identifier = %identifier, drift = %recheck, "remote state differs after apply");
            let attrs: Vec<&str> = recheck
                .changed_attributes()
                .iter()
                .map(|a| a.as_str())
                .collect();
            return Err(lifecycle.fail(ErrorKind::DriftAfterApply(format!(
                "{} differ after {}",
                attrs.join(", "),
                plan.action
            ))));
        }

        lifecycle.advance(LifecycleState::Present)?;
        info!(identifier = %identifier, action = %plan.action, "website configuration applied");
        Ok(())
    }

    async fn destroy(
        &self,
        operation: Operation,
        identifier: &ResourceIdentifier,
    ) -> WebsiteResult<()> {
        let mut lifecycle = Lifecycle::start(identifier, operation, LifecycleState::Present);
        lifecycle.advance(LifecycleState::Destroying)?;

        let deleted = bounded(
            self.fetcher.deadline(),
            self.fetcher
                .remote()
                .delete_configuration(identifier.bucket(), identifier.expected_owner()),
        )
        .await;
        match deleted {
            Ok(()) => {}
            Err(ErrorKind::NotFound | ErrorKind::BucketNotFound) => {
                debug!(identifier = %identifier, "already absent");
            }
            Err(kind) => return Err(lifecycle.fail(kind)),
        }

        match self.fetcher.fetch_optional(identifier).await {
            Ok(None) | Err(ErrorKind::BucketNotFound) => {}
            Ok(Some(_)) => {
                warn!(identifier = %identifier, "configuration still present after delete");
                return Err(lifecycle.fail(ErrorKind::DestroyIncomplete));
            }
            Err(kind) => return Err(lifecycle.fail(kind)),
        }

        lifecycle.advance(LifecycleState::Absent)?;
        info!(identifier = %identifier, "website configuration destroyed");
        Ok(())
    }
}
