//! Website configuration document types.
//!
//! Field names follow the remote API. The serde representation uses the API's
//! PascalCase keys so that a serialized routing-rule array deserializes straight
//! into [`RoutingRule`]; absent optional fields are omitted, never written as
//! empty strings.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Redirect protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Protocol {
    #[serde(rename = "http")]
    Http,
    #[serde(rename = "https")]
    Https,
}

impl Protocol {
    /// Returns the string value of this enum variant.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Http => "http",
            Self::Https => "https",
        }
    }
}

impl std::fmt::Display for Protocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A protocol string other than `http` or `https`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown protocol {0:?} (expected \"http\" or \"https\")")]
pub struct UnknownProtocol(pub String);

impl FromStr for Protocol {
    type Err = UnknownProtocol;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "http" => Ok(Self::Http),
            "https" => Ok(Self::Https),
            other => Err(UnknownProtocol(other.to_owned())),
        }
    }
}

/// Index document served for directory requests.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct IndexDocument {
    pub suffix: String,
}

/// Object returned when a 4XX error occurs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ErrorDocument {
    pub key: String,
}

/// Redirect target for every request to the bucket's website endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RedirectAllRequestsTo {
    pub host_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol: Option<Protocol>,
}

/// Condition under which a routing rule's redirect applies.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct Condition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_error_code_returned_equals: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_prefix_equals: Option<String>,
}

impl Condition {
    /// Whether no field is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.http_error_code_returned_equals.is_none() && self.key_prefix_equals.is_none()
    }
}

/// Where a matching request is redirected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct Redirect {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_redirect_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol: Option<Protocol>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replace_key_prefix_with: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replace_key_with: Option<String>,
}

impl Redirect {
    /// Whether no field is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.host_name.is_none()
            && self.http_redirect_code.is_none()
            && self.protocol.is_none()
            && self.replace_key_prefix_with.is_none()
            && self.replace_key_with.is_none()
    }
}

/// A single routing rule. Rules are evaluated top-down by the remote service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct RoutingRule {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<Condition>,
    pub redirect: Redirect,
}

/// The website configuration document stored by the remote service.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WebsiteConfiguration {
    pub error_document: Option<ErrorDocument>,
    pub index_document: Option<IndexDocument>,
    pub redirect_all_requests_to: Option<RedirectAllRequestsTo>,
    pub routing_rules: Vec<RoutingRule>,
}

/// Storage class of a bucket, as far as website hosting is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BucketClass {
    /// Regular bucket; can serve a static website.
    GeneralPurpose,
    /// Directory bucket (S3 Express One Zone); rejects website configuration.
    Directory,
}

impl BucketClass {
    /// Name suffix shared by every directory bucket.
    pub const DIRECTORY_SUFFIX: &str = "--x-s3";

    /// Derive the class from the bucket name when the name alone decides it.
    ///
    /// Directory bucket names always end in `--x-s3`; anything else needs the
    /// remote service to answer.
    #[must_use]
    pub fn from_bucket_name(bucket: &str) -> Option<Self> {
        bucket
            .ends_with(Self::DIRECTORY_SUFFIX)
            .then_some(Self::Directory)
    }

    /// Whether buckets of this class accept a website configuration.
    #[must_use]
    pub fn supports_website(self) -> bool {
        matches!(self, Self::GeneralPurpose)
    }

    /// Returns the string value of this enum variant.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GeneralPurpose => "general_purpose",
            Self::Directory => "directory",
        }
    }
}

impl std::fmt::Display for BucketClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
