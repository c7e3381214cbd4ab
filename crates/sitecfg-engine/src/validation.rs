//! Declaration validation.
//!
//! [`validate`] is the only way to obtain a [`WebsiteSpec`], so a spec that
//! mixes `redirect_all_requests_to` with hosting attributes cannot exist.
//! Everything here is local: a declaration rejected by validation never
//! reaches the remote service.

use sitecfg_core::AccountId;
use sitecfg_model::{DesiredConfiguration, ErrorDocument, IndexDocument, RedirectAllRequestsTo};

use crate::error::ErrorKind;
use crate::identifier::ResourceIdentifier;
use crate::normalize::{CanonicalConfiguration, RoutingRuleSet, normalize_rules};

/// A validated website configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebsiteSpec {
    /// Serve content from the bucket. At least one field is set.
    Hosting {
        /// Index document settings.
        index_document: Option<IndexDocument>,
        /// Error document settings.
        error_document: Option<ErrorDocument>,
        /// Canonical routing rules.
        routing_rules: Option<RoutingRuleSet>,
    },
    /// Redirect every request to another host.
    RedirectAll(RedirectAllRequestsTo),
}

impl WebsiteSpec {
    /// The canonical form of this spec, comparable with fetched state.
    #[must_use]
    pub fn to_canonical(&self) -> CanonicalConfiguration {
        match self {
            Self::Hosting {
                index_document,
                error_document,
                routing_rules,
            } => CanonicalConfiguration {
                index_document: index_document.clone(),
                error_document: error_document.clone(),
                redirect_all_requests_to: None,
                routing_rules: routing_rules.clone(),
            },
            Self::RedirectAll(target) => CanonicalConfiguration {
                redirect_all_requests_to: Some(target.clone()),
                ..CanonicalConfiguration::default()
            },
        }
    }
}

/// Validate a declaration, producing its identifier and spec.
pub fn validate(
    desired: &DesiredConfiguration,
) -> Result<(ResourceIdentifier, WebsiteSpec), ErrorKind> {
    let identifier = declared_identifier(desired)?;

    if let Some(ref target) = desired.redirect_all_requests_to {
        let conflicts: Vec<&str> = [
            ("index_document", desired.index_document.is_some()),
            ("error_document", desired.error_document.is_some()),
            ("routing_rules", desired.routing_rules.is_some()),
        ]
        .into_iter()
        .filter_map(|(name, set)| set.then_some(name))
        .collect();
        if !conflicts.is_empty() {
            return Err(ErrorKind::MutuallyExclusiveAttributes(format!(
                "redirect_all_requests_to conflicts with {}",
                conflicts.join(", ")
            )));
        }
        if target.host_name.is_empty() {
            return Err(ErrorKind::IncompleteAttributeGroup(
                "redirect_all_requests_to.host_name must not be empty".to_owned(),
            ));
        }
        return Ok((identifier, WebsiteSpec::RedirectAll(target.clone())));
    }

    if desired
        .index_document
        .as_ref()
        .is_some_and(|d| d.suffix.is_empty())
    {
        return Err(ErrorKind::IncompleteAttributeGroup(
            "index_document.suffix must not be empty".to_owned(),
        ));
    }
    if desired
        .error_document
        .as_ref()
        .is_some_and(|d| d.key.is_empty())
    {
        return Err(ErrorKind::IncompleteAttributeGroup(
            "error_document.key must not be empty".to_owned(),
        ));
    }

    let routing_rules = desired
        .routing_rules
        .as_ref()
        .map(normalize_rules)
        .transpose()?
        .flatten();

    if desired.index_document.is_none() && desired.error_document.is_none() && routing_rules.is_none()
    {
        return Err(ErrorKind::IncompleteAttributeGroup(
            "one of index_document, error_document, redirect_all_requests_to or routing rules must be declared"
                .to_owned(),
        ));
    }

    Ok((
        identifier,
        WebsiteSpec::Hosting {
            index_document: desired.index_document.clone(),
            error_document: desired.error_document.clone(),
            routing_rules,
        },
    ))
}

/// The identifier implied by the declaration's `bucket` and
/// `expected_bucket_owner`. An empty owner counts as undeclared.
fn declared_identifier(desired: &DesiredConfiguration) -> Result<ResourceIdentifier, ErrorKind> {
    let owner = desired
        .expected_bucket_owner
        .as_deref()
        .filter(|o| !o.is_empty())
        .map(AccountId::new)
        .transpose()
        .map_err(|e| ErrorKind::InvalidAttribute(format!("expected_bucket_owner: {e}")))?;

    ResourceIdentifier::new(desired.bucket.clone(), owner).map_err(|kind| match kind {
        ErrorKind::MalformedIdentifier(reason) => {
            ErrorKind::InvalidAttribute(format!("bucket: {reason}"))
        }
        other => other,
    })
}
