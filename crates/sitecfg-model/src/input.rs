//! Declared (desired) website configuration, as produced by the front end.
//!
//! The declaration is deliberately loose: every attribute group is optional
//! and combinations are checked by the engine's validation step, which turns a
//! [`DesiredConfiguration`] into a validated `WebsiteSpec`.

use serde::{Deserialize, Serialize};

use crate::types::{ErrorDocument, IndexDocument, Protocol, RedirectAllRequestsTo};

/// A user's declared website configuration for one bucket.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DesiredConfiguration {
    /// Bucket the configuration is attached to.
    pub bucket: String,
    /// Account ID expected to own the bucket.
    pub expected_bucket_owner: Option<String>,
    /// Index document settings.
    pub index_document: Option<IndexDocument>,
    /// Error document settings.
    pub error_document: Option<ErrorDocument>,
    /// Redirect every request elsewhere. Excludes all other attributes.
    pub redirect_all_requests_to: Option<RedirectAllRequestsTo>,
    /// Routing rules, in either declaration form.
    pub routing_rules: Option<RoutingRulesInput>,
}

impl DesiredConfiguration {
    /// Start a declaration for `bucket` with nothing else set.
    #[must_use]
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            ..Self::default()
        }
    }

    /// Set the expected bucket owner.
    #[must_use]
    pub fn with_expected_owner(mut self, owner: impl Into<String>) -> Self {
        self.expected_bucket_owner = Some(owner.into());
        self
    }

    /// Set the index document suffix.
    #[must_use]
    pub fn with_index_document(mut self, suffix: impl Into<String>) -> Self {
        self.index_document = Some(IndexDocument {
            suffix: suffix.into(),
        });
        self
    }

    /// Set the error document key.
    #[must_use]
    pub fn with_error_document(mut self, key: impl Into<String>) -> Self {
        self.error_document = Some(ErrorDocument { key: key.into() });
        self
    }

    /// Redirect all requests to `host_name`.
    #[must_use]
    pub fn with_redirect_all_requests_to(
        mut self,
        host_name: impl Into<String>,
        protocol: Option<Protocol>,
    ) -> Self {
        self.redirect_all_requests_to = Some(RedirectAllRequestsTo {
            host_name: host_name.into(),
            protocol,
        });
        self
    }

    /// Declare routing rules as structured blocks.
    #[must_use]
    pub fn with_routing_rule_blocks(mut self, rules: Vec<StructuredRoutingRule>) -> Self {
        self.routing_rules = Some(RoutingRulesInput::Structured(rules));
        self
    }

    /// Declare routing rules as a serialized JSON array.
    #[must_use]
    pub fn with_routing_rules_json(mut self, json: impl Into<String>) -> Self {
        self.routing_rules = Some(RoutingRulesInput::Serialized(json.into()));
        self
    }
}

/// The two ways routing rules can be declared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoutingRulesInput {
    /// Repeated `routing_rule` blocks.
    Structured(Vec<StructuredRoutingRule>),
    /// A raw JSON array using the remote API's key names, e.g.
    /// `[{"Condition":{"KeyPrefixEquals":"docs/"},"Redirect":{...}}]`.
    Serialized(String),
}

/// One `routing_rule` block.
///
/// Nested blocks arrive as lists, the way a block-structured configuration
/// language hands them over; `condition` allows at most one entry and
/// `redirect` requires exactly one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StructuredRoutingRule {
    pub condition: Vec<StructuredCondition>,
    pub redirect: Vec<StructuredRedirect>,
}

impl StructuredRoutingRule {
    /// A rule with a single redirect block and no condition.
    #[must_use]
    pub fn redirect(redirect: StructuredRedirect) -> Self {
        Self {
            condition: Vec::new(),
            redirect: vec![redirect],
        }
    }

    /// Attach a condition block.
    #[must_use]
    pub fn when(mut self, condition: StructuredCondition) -> Self {
        self.condition.push(condition);
        self
    }
}

/// A `condition` block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StructuredCondition {
    pub http_error_code_returned_equals: Option<String>,
    pub key_prefix_equals: Option<String>,
}

/// A `redirect` block. `protocol` is kept as declared text and checked during
/// normalization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StructuredRedirect {
    pub host_name: Option<String>,
    pub http_redirect_code: Option<String>,
    pub protocol: Option<String>,
    pub replace_key_prefix_with: Option<String>,
    pub replace_key_with: Option<String>,
}
