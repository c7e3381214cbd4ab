//! Composite resource identifier.
//!
//! The serialized identifier is the only artifact the front end persists. Its
//! format is the bucket name alone, or `bucket,expected_owner` when an owner
//! is declared; both shapes must keep decoding across releases.

use std::fmt;
use std::str::FromStr;

use sitecfg_core::AccountId;

use crate::error::ErrorKind;

/// Separator between the bucket and the expected owner.
pub const DELIMITER: char = ',';

/// Identity of one managed website configuration.
///
/// Immutable: a different bucket or owner is a different identifier, which is
/// why changing either forces replacement of the resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceIdentifier {
    bucket: String,
    expected_owner: Option<AccountId>,
}

impl ResourceIdentifier {
    /// Build an identifier, checking that the bucket segment is encodable.
    pub fn new(
        bucket: impl Into<String>,
        expected_owner: Option<AccountId>,
    ) -> Result<Self, ErrorKind> {
        let bucket = bucket.into();
        if bucket.is_empty() {
            return Err(ErrorKind::MalformedIdentifier(
                "bucket segment is empty".to_owned(),
            ));
        }
        if bucket.contains(DELIMITER) {
            return Err(ErrorKind::MalformedIdentifier(format!(
                "bucket {bucket:?} contains the delimiter {DELIMITER:?}"
            )));
        }
        Ok(Self {
            bucket,
            expected_owner,
        })
    }

    /// The bucket name.
    #[must_use]
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// The expected bucket owner, if declared.
    #[must_use]
    pub fn expected_owner(&self) -> Option<&AccountId> {
        self.expected_owner.as_ref()
    }

    /// Serialize to the persisted form.
    #[must_use]
    pub fn encode(&self) -> String {
        encode(&self.bucket, self.expected_owner.as_ref())
    }

    /// Parse the persisted form.
    pub fn decode(serialized: &str) -> Result<Self, ErrorKind> {
        let mut parts = serialized.split(DELIMITER);
        let bucket = parts.next().unwrap_or_default();
        let owner = parts.next();
        if parts.next().is_some() {
            return Err(ErrorKind::MalformedIdentifier(format!(
                "{serialized:?} has more than one {DELIMITER:?} delimiter"
            )));
        }

        let expected_owner = match owner {
            None => None,
            Some("") => {
                return Err(ErrorKind::MalformedIdentifier(format!(
                    "{serialized:?} has an empty expected owner segment"
                )));
            }
            Some(owner) => Some(
                AccountId::new(owner)
                    .map_err(|e| ErrorKind::MalformedIdentifier(e.to_string()))?,
            ),
        };

        Self::new(bucket, expected_owner)
    }

    /// Whether moving from `self` to `other` means destroying and recreating
    /// the resource rather than updating it in place.
    #[must_use]
    pub fn requires_replacement(&self, other: &Self) -> bool {
        self != other
    }
}

/// Serialize a bucket and optional owner to the persisted form.
#[must_use]
pub fn encode(bucket: &str, expected_owner: Option<&AccountId>) -> String {
    match expected_owner {
        Some(owner) => format!("{bucket}{DELIMITER}{owner}"),
        None => bucket.to_owned(),
    }
}

impl fmt::Display for ResourceIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.bucket)?;
        if let Some(ref owner) = self.expected_owner {
            write!(f, "{DELIMITER}{owner}")?;
        }
        Ok(())
    }
}

impl FromStr for ResourceIdentifier {
    type Err = ErrorKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::decode(s)
    }
}
