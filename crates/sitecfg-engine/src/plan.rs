//! Reconciliation planning.
//!
//! A plan compares the canonical desired configuration against the canonical
//! actual one, attribute by attribute. `routing_rules` is a single attribute:
//! the remote service only replaces the whole rule set, so any change inside
//! the sequence marks the whole attribute as changed.

use std::collections::BTreeMap;
use std::fmt;

use serde_json::{Map, Value, json};
use tracing::debug;

use crate::identifier::ResourceIdentifier;
use crate::normalize::CanonicalConfiguration;
use crate::validation::WebsiteSpec;

/// Top-level attributes of a website configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum WebsiteAttribute {
    /// `index_document`
    IndexDocument,
    /// `error_document`
    ErrorDocument,
    /// `redirect_all_requests_to`
    RedirectAllRequestsTo,
    /// `routing_rules`, compared as one ordered set.
    RoutingRules,
}

impl WebsiteAttribute {
    /// Every attribute, in plan order.
    pub const ALL: [Self; 4] = [
        Self::IndexDocument,
        Self::ErrorDocument,
        Self::RedirectAllRequestsTo,
        Self::RoutingRules,
    ];

    /// Returns the attribute name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::IndexDocument => "index_document",
            Self::ErrorDocument => "error_document",
            Self::RedirectAllRequestsTo => "redirect_all_requests_to",
            Self::RoutingRules => "routing_rules",
        }
    }

    /// This attribute's value in `config`, in the remote API's JSON shape.
    #[must_use]
    pub fn value_in(&self, config: &CanonicalConfiguration) -> Option<Value> {
        match self {
            Self::IndexDocument => config
                .index_document
                .as_ref()
                .map(|d| json!({ "Suffix": d.suffix })),
            Self::ErrorDocument => config
                .error_document
                .as_ref()
                .map(|d| json!({ "Key": d.key })),
            Self::RedirectAllRequestsTo => config.redirect_all_requests_to.as_ref().map(|r| {
                let mut obj = Map::new();
                obj.insert("HostName".to_owned(), Value::String(r.host_name.clone()));
                if let Some(protocol) = r.protocol {
                    obj.insert(
                        "Protocol".to_owned(),
                        Value::String(protocol.as_str().to_owned()),
                    );
                }
                Value::Object(obj)
            }),
            Self::RoutingRules => config.routing_rules.as_ref().map(|set| set.to_value()),
        }
    }
}

impl fmt::Display for WebsiteAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Before and after values of one changed attribute. `None` means unset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeDiff {
    /// Current value.
    pub before: Option<Value>,
    /// Planned value.
    pub after: Option<Value>,
}

/// What a plan does to the remote configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlanAction {
    /// Actual state already matches.
    NoOp,
    /// No configuration exists; write one.
    Create,
    /// A configuration exists but differs; replace it.
    Update,
    /// Remove the configuration.
    Destroy,
}

impl PlanAction {
    /// Returns the lowercase action name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NoOp => "no-op",
            Self::Create => "create",
            Self::Update => "update",
            Self::Destroy => "destroy",
        }
    }
}

impl fmt::Display for PlanAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The outcome of one planning step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconciliationPlan {
    /// The action to execute.
    pub action: PlanAction,
    /// Changed attributes only.
    pub attribute_diffs: BTreeMap<WebsiteAttribute, AttributeDiff>,
}

impl ReconciliationPlan {
    /// Whether nothing needs to change.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.action == PlanAction::NoOp
    }

    /// Changed attributes, in plan order.
    #[must_use]
    pub fn changed_attributes(&self) -> Vec<WebsiteAttribute> {
        self.attribute_diffs.keys().copied().collect()
    }
}

impl fmt::Display for ReconciliationPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.action.as_str())?;
        if !self.attribute_diffs.is_empty() {
            let names: Vec<&str> = self.attribute_diffs.keys().map(|a| a.as_str()).collect();
            write!(f, " [{}]", names.join(", "))?;
        }
        Ok(())
    }
}

/// Attributes whose value differs between `before` and `after`.
#[must_use]
pub fn diff(
    before: Option<&CanonicalConfiguration>,
    after: &CanonicalConfiguration,
) -> BTreeMap<WebsiteAttribute, AttributeDiff> {
    WebsiteAttribute::ALL
        .into_iter()
        .filter_map(|attr| {
            let old = before.and_then(|config| attr.value_in(config));
            let new = attr.value_in(after);
            (old != new).then_some((
                attr,
                AttributeDiff {
                    before: old,
                    after: new,
                },
            ))
        })
        .collect()
}

/// Plan the change that brings `actual` to `spec`.
///
/// `actual == None` means no configuration exists remotely.
#[must_use]
pub fn plan(spec: &WebsiteSpec, actual: Option<&CanonicalConfiguration>) -> ReconciliationPlan {
    let desired = spec.to_canonical();
    let attribute_diffs = diff(actual, &desired);
    let action = match actual {
        None => PlanAction::Create,
        Some(_) if attribute_diffs.is_empty() => PlanAction::NoOp,
        Some(_) => PlanAction::Update,
    };
    ReconciliationPlan {
        action,
        attribute_diffs,
    }
}

/// Plan removal of the configuration behind `identifier`.
#[must_use]
pub fn plan_destroy(identifier: &ResourceIdentifier) -> ReconciliationPlan {
    debug!(identifier = %identifier, "planned destroy");
    ReconciliationPlan {
        action: PlanAction::Destroy,
        attribute_diffs: BTreeMap::new(),
    }
}
