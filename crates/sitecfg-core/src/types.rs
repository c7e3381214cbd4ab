//! Common AWS type definitions.

use std::fmt;
use std::str::FromStr;

use crate::CoreError;

/// AWS Account ID (12-digit string).
///
/// Used as the expected bucket owner of a website configuration. Requests
/// carrying an expected owner fail remotely when the bucket belongs to a
/// different account.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize)]
pub struct AccountId(String);

impl AccountId {
    /// Create a new account ID from a string.
    ///
    /// # Errors
    /// Returns an error if the account ID is not a 12-digit numeric string.
    pub fn new(id: impl Into<String>) -> Result<Self, CoreError> {
        let id = id.into();
        if id.len() != 12 || !id.chars().all(|c| c.is_ascii_digit()) {
            return Err(CoreError::InvalidAccountId(id));
        }
        Ok(Self(id))
    }

    /// Get the account ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for AccountId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl<'de> serde::Deserialize<'de> for AccountId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::new(raw).map_err(serde::de::Error::custom)
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Regions whose website endpoints use the legacy dash-separated form
/// (`s3-website-<region>`) instead of `s3-website.<region>`.
const LEGACY_WEBSITE_REGIONS: &[&str] = &[
    "ap-northeast-1",
    "ap-southeast-1",
    "ap-southeast-2",
    "eu-west-1",
    "sa-east-1",
    "us-east-1",
    "us-gov-west-1",
    "us-west-1",
    "us-west-2",
];

/// AWS Region identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct AwsRegion(String);

impl AwsRegion {
    /// Default region.
    pub const DEFAULT: &str = "us-east-1";

    /// Create a new region.
    #[must_use]
    pub fn new(region: impl Into<String>) -> Self {
        Self(region.into())
    }

    /// Parse a region, rejecting empty or whitespace-containing values.
    ///
    /// # Errors
    /// Returns [`CoreError::InvalidRegion`] for an unusable region string.
    pub fn parse(region: &str) -> Result<Self, CoreError> {
        if region.is_empty() || region.chars().any(char::is_whitespace) {
            return Err(CoreError::InvalidRegion(region.to_owned()));
        }
        Ok(Self(region.to_owned()))
    }

    /// Get the region as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The static-website hosting domain served in this region.
    ///
    /// # Examples
    ///
    /// ```
    /// use sitecfg_core::AwsRegion;
    ///
    /// assert_eq!(
    ///     AwsRegion::new("us-east-1").website_domain(),
    ///     "s3-website-us-east-1.amazonaws.com"
    /// );
    /// assert_eq!(
    ///     AwsRegion::new("eu-central-1").website_domain(),
    ///     "s3-website.eu-central-1.amazonaws.com"
    /// );
    /// ```
    #[must_use]
    pub fn website_domain(&self) -> String {
        if LEGACY_WEBSITE_REGIONS.contains(&self.as_str()) {
            format!("s3-website-{}.amazonaws.com", self.0)
        } else {
            format!("s3-website.{}.amazonaws.com", self.0)
        }
    }

    /// The website endpoint for `bucket` in this region.
    #[must_use]
    pub fn website_endpoint(&self, bucket: &str) -> String {
        format!("{bucket}.{}", self.website_domain())
    }
}

impl Default for AwsRegion {
    fn default() -> Self {
        Self(Self::DEFAULT.to_owned())
    }
}

impl fmt::Display for AwsRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
