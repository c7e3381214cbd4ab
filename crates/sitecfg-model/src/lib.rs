//! Website configuration model types for sitecfg.
//!
//! [`types`] holds the document shapes exchanged with the remote service (the
//! `WebsiteConfiguration` document and its routing rules), which are also the
//! canonical comparison form. [`input`] holds the declaration produced by the
//! configuration front end, including both ways of declaring routing rules.

pub mod input;
pub mod types;

pub use input::{
    DesiredConfiguration, RoutingRulesInput, StructuredCondition, StructuredRedirect,
    StructuredRoutingRule,
};
pub use types::{
    BucketClass, Condition, ErrorDocument, IndexDocument, Protocol, Redirect,
    RedirectAllRequestsTo, RoutingRule, UnknownProtocol, WebsiteConfiguration,
};
