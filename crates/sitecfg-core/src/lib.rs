//! Core types shared across the sitecfg crates.
//!
//! This crate provides the foundational building blocks used by the model,
//! codec, and reconciliation engine crates: validated AWS account IDs, region
//! identifiers (including the static-website domain each region serves), and
//! the core error type.

mod error;
mod types;

pub use error::{CoreError, CoreResult};
pub use types::{AccountId, AwsRegion};
