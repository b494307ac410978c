use serde::{Deserialize, Serialize};
use std::fmt;

use crate::shared::ValidationError;

/// Maximum number of keys a single listing page may return.
const MAX_PAGE_SIZE: u32 = 1000;

/// Canned ACL applied to every object of the collection.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub enum CannedAcl {
    #[default]
    Private,
    PublicRead,
    PublicReadWrite,
    AuthenticatedRead,
    AwsExecRead,
    BucketOwnerRead,
    BucketOwnerFullControl,
}

impl CannedAcl {
    /// Returns the wire name of the ACL.
    pub fn as_str(&self) -> &'static str {
        match self {
            CannedAcl::Private => "private",
            CannedAcl::PublicRead => "public-read",
            CannedAcl::PublicReadWrite => "public-read-write",
            CannedAcl::AuthenticatedRead => "authenticated-read",
            CannedAcl::AwsExecRead => "aws-exec-read",
            CannedAcl::BucketOwnerRead => "bucket-owner-read",
            CannedAcl::BucketOwnerFullControl => "bucket-owner-full-control",
        }
    }
}

impl fmt::Display for CannedAcl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The remote collection swept by the pipeline.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CollectionConfig {
    /// Name of the bucket to sweep.
    #[serde(default)]
    pub bucket: String,
    /// Only keys starting with this prefix are listed.
    #[serde(default)]
    pub prefix: Option<String>,
    /// Region override; the default provider chain is used when absent.
    #[serde(default)]
    pub region: Option<String>,
    /// ACL set on every object.
    #[serde(default)]
    pub canned_acl: CannedAcl,
    /// Maximum number of keys requested per listing page.
    #[serde(default)]
    pub page_size: Option<u32>,
}

impl CollectionConfig {
    /// Validates the collection configuration.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.bucket.trim().is_empty() {
            return Err(ValidationError::MissingBucket);
        }

        if let Some(page_size) = self.page_size
            && (page_size == 0 || page_size > MAX_PAGE_SIZE)
        {
            return Err(ValidationError::InvalidFieldValue {
                field: "collection.page_size".to_string(),
                constraint: format!("must be between 1 and {MAX_PAGE_SIZE}"),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_bucket_is_rejected() {
        let config = CollectionConfig::default();

        assert!(matches!(
            config.validate(),
            Err(ValidationError::MissingBucket)
        ));
    }

    #[test]
    fn canned_acl_deserializes_from_wire_name() {
        let config: CollectionConfig = serde_json::from_str(
            r#"{"bucket": "assets", "canned_acl": "bucket-owner-full-control"}"#,
        )
        .unwrap();

        assert_eq!(config.canned_acl, CannedAcl::BucketOwnerFullControl);
        assert_eq!(config.canned_acl.as_str(), "bucket-owner-full-control");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn oversized_pages_are_rejected() {
        let config = CollectionConfig {
            bucket: "assets".to_string(),
            page_size: Some(5000),
            ..CollectionConfig::default()
        };

        assert!(config.validate().is_err());
    }
}
