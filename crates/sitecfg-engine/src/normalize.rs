//! Configuration normalizer.
//!
//! Routing rules arrive in two shapes: repeated structured blocks, or one
//! serialized JSON array using the remote API's key names. Both, and every
//! document read back from the remote service, are funnelled through
//! [`canonical_rule`] into a [`RoutingRuleSet`], and all comparisons happen on
//! [`CanonicalConfiguration`] only.
//!
//! Canonical form:
//!
//! - rule order is preserved and duplicates are kept
//! - a condition with no field set is the same as no condition
//! - unset fields are `None`; an explicit empty string stays `Some("")`
//! - an empty rule list is the same as no rules

use serde_json::{Map, Value};
use sitecfg_model::{
    Condition, ErrorDocument, IndexDocument, Protocol, Redirect, RedirectAllRequestsTo,
    RoutingRule, RoutingRulesInput, StructuredRoutingRule, WebsiteConfiguration,
};

use crate::error::ErrorKind;

/// An ordered, non-empty sequence of canonical routing rules.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RoutingRuleSet(Vec<RoutingRule>);

impl RoutingRuleSet {
    /// Canonicalize `rules`. Returns `None` for an empty list.
    #[must_use]
    pub fn from_rules(rules: Vec<RoutingRule>) -> Option<Self> {
        if rules.is_empty() {
            return None;
        }
        Some(Self(rules.into_iter().map(canonical_rule).collect()))
    }

    /// The rules, in evaluation order.
    #[must_use]
    pub fn rules(&self) -> &[RoutingRule] {
        &self.0
    }

    /// Number of rules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the set holds no rules. Never true for a set built by
    /// [`RoutingRuleSet::from_rules`].
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// JSON array with the remote API's key names and unset fields omitted.
    #[must_use]
    pub fn to_value(&self) -> Value {
        Value::Array(self.0.iter().map(rule_value).collect())
    }

    /// Compact serialized form, exposed as the computed `routing_rules`
    /// attribute.
    #[must_use]
    pub fn to_json(&self) -> String {
        self.to_value().to_string()
    }

    /// Consume the set, returning the rules.
    #[must_use]
    pub fn into_rules(self) -> Vec<RoutingRule> {
        self.0
    }
}

/// Bring one rule into canonical form.
#[must_use]
pub fn canonical_rule(rule: RoutingRule) -> RoutingRule {
    RoutingRule {
        condition: rule.condition.filter(|c| !c.is_empty()),
        redirect: rule.redirect,
    }
}

/// Normalize declared routing rules.
///
/// Returns `Ok(None)` when the declaration holds no rules.
pub fn normalize_rules(input: &RoutingRulesInput) -> Result<Option<RoutingRuleSet>, ErrorKind> {
    let rules = match input {
        RoutingRulesInput::Structured(blocks) => blocks
            .iter()
            .enumerate()
            .map(|(i, block)| structured_rule(i, block))
            .collect::<Result<Vec<_>, _>>()?,
        RoutingRulesInput::Serialized(json) => serialized_rules(json)?,
    };

    for (i, rule) in rules.iter().enumerate() {
        if rule.redirect.is_empty() {
            return Err(ErrorKind::IncompleteAttributeGroup(format!(
                "routing rule {i}: redirect must set at least one field"
            )));
        }
    }

    Ok(RoutingRuleSet::from_rules(rules))
}

fn structured_rule(index: usize, block: &StructuredRoutingRule) -> Result<RoutingRule, ErrorKind> {
    if block.condition.len() > 1 {
        return Err(ErrorKind::InvalidAttribute(format!(
            "routing_rule {index}: at most one condition block is allowed, found {}",
            block.condition.len()
        )));
    }
    let redirect = match block.redirect.as_slice() {
        [] => {
            return Err(ErrorKind::IncompleteAttributeGroup(format!(
                "routing_rule {index}: a redirect block is required"
            )));
        }
        [redirect] => redirect,
        many => {
            return Err(ErrorKind::InvalidAttribute(format!(
                "routing_rule {index}: exactly one redirect block is allowed, found {}",
                many.len()
            )));
        }
    };

    let protocol = redirect
        .protocol
        .as_deref()
        .map(str::parse::<Protocol>)
        .transpose()
        .map_err(|e| ErrorKind::InvalidAttribute(format!("routing_rule {index}: {e}")))?;

    Ok(RoutingRule {
        condition: block.condition.first().map(|c| Condition {
            http_error_code_returned_equals: c.http_error_code_returned_equals.clone(),
            key_prefix_equals: c.key_prefix_equals.clone(),
        }),
        redirect: Redirect {
            host_name: redirect.host_name.clone(),
            http_redirect_code: redirect.http_redirect_code.clone(),
            protocol,
            replace_key_prefix_with: redirect.replace_key_prefix_with.clone(),
            replace_key_with: redirect.replace_key_with.clone(),
        },
    })
}

fn serialized_rules(json: &str) -> Result<Vec<RoutingRule>, ErrorKind> {
    let value: Value = serde_json::from_str(json)
        .map_err(|e| ErrorKind::InvalidAttribute(format!("routing_rules: malformed JSON: {e}")))?;

    let Some(items) = value.as_array() else {
        return Err(ErrorKind::InvalidAttribute(
            "routing_rules: expected a JSON array of rules".to_owned(),
        ));
    };
    for (i, item) in items.iter().enumerate() {
        if item.is_object() && item.get("Redirect").is_none() {
            return Err(ErrorKind::IncompleteAttributeGroup(format!(
                "routing rule {i}: Redirect is required"
            )));
        }
    }

    serde_json::from_value(value)
        .map_err(|e| ErrorKind::InvalidAttribute(format!("routing_rules: {e}")))
}

fn insert_opt(map: &mut Map<String, Value>, key: &str, value: Option<&str>) {
    if let Some(v) = value {
        map.insert(key.to_owned(), Value::String(v.to_owned()));
    }
}

fn rule_value(rule: &RoutingRule) -> Value {
    let mut obj = Map::new();
    if let Some(ref cond) = rule.condition {
        let mut c = Map::new();
        insert_opt(
            &mut c,
            "HttpErrorCodeReturnedEquals",
            cond.http_error_code_returned_equals.as_deref(),
        );
        insert_opt(&mut c, "KeyPrefixEquals", cond.key_prefix_equals.as_deref());
        obj.insert("Condition".to_owned(), Value::Object(c));
    }

    let r = &rule.redirect;
    let mut redirect = Map::new();
    insert_opt(&mut redirect, "HostName", r.host_name.as_deref());
    insert_opt(&mut redirect, "HttpRedirectCode", r.http_redirect_code.as_deref());
    insert_opt(&mut redirect, "Protocol", r.protocol.as_ref().map(Protocol::as_str));
    insert_opt(
        &mut redirect,
        "ReplaceKeyPrefixWith",
        r.replace_key_prefix_with.as_deref(),
    );
    insert_opt(&mut redirect, "ReplaceKeyWith", r.replace_key_with.as_deref());
    obj.insert("Redirect".to_owned(), Value::Object(redirect));

    Value::Object(obj)
}

/// The single comparable form of a website configuration, used for both
/// desired and actual state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CanonicalConfiguration {
    /// Index document settings.
    pub index_document: Option<IndexDocument>,
    /// Error document settings.
    pub error_document: Option<ErrorDocument>,
    /// Redirect-everything target.
    pub redirect_all_requests_to: Option<RedirectAllRequestsTo>,
    /// Routing rules; never an empty set.
    pub routing_rules: Option<RoutingRuleSet>,
}

impl CanonicalConfiguration {
    /// The whole document to submit to the remote service.
    #[must_use]
    pub fn to_document(&self) -> WebsiteConfiguration {
        WebsiteConfiguration {
            error_document: self.error_document.clone(),
            index_document: self.index_document.clone(),
            redirect_all_requests_to: self.redirect_all_requests_to.clone(),
            routing_rules: self
                .routing_rules
                .as_ref()
                .map(|set| set.rules().to_vec())
                .unwrap_or_default(),
        }
    }

    /// The computed `routing_rules` attribute.
    #[must_use]
    pub fn routing_rules_json(&self) -> Option<String> {
        self.routing_rules.as_ref().map(RoutingRuleSet::to_json)
    }
}

impl From<WebsiteConfiguration> for CanonicalConfiguration {
    fn from(document: WebsiteConfiguration) -> Self {
        Self {
            index_document: document.index_document,
            error_document: document.error_document,
            redirect_all_requests_to: document.redirect_all_requests_to,
            routing_rules: RoutingRuleSet::from_rules(document.routing_rules),
        }
    }
}
