use aws_config::{BehaviorVersion, Region};
use aws_sdk_s3::Client;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::types::{EncodingType, ObjectCannedAcl};
use sweep_config::shared::CollectionConfig;
use tracing::{debug, info};

use crate::collection::{Collection, Page, PageRequest, RawEntry};
use crate::error::{ErrorKind, SweepResult};
use crate::types::ItemKey;
use crate::{bail, sweep_error};

/// S3 bucket swept object by object, setting a canned ACL on each one.
///
/// Listing uses `ListObjectsV2` with URL encoding so that keys with characters not allowed in
/// XML survive the round trip; the mutation is `PutObjectAcl`.
#[derive(Debug, Clone)]
pub struct S3Collection {
    client: Client,
    bucket: String,
    prefix: Option<String>,
    canned_acl: ObjectCannedAcl,
    page_size: Option<i32>,
}

impl S3Collection {
    /// Creates a collection for `config` using the default AWS credential and region chain.
    pub async fn new(config: &CollectionConfig) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(region) = &config.region {
            loader = loader.region(Region::new(region.clone()));
        }
        let sdk_config = loader.load().await;

        info!(
            bucket = %config.bucket,
            canned_acl = %config.canned_acl,
            "created s3 collection"
        );

        Self::from_client(Client::new(&sdk_config), config)
    }

    /// Creates a collection for `config` on top of an existing client.
    pub fn from_client(client: Client, config: &CollectionConfig) -> Self {
        Self {
            client,
            bucket: config.bucket.clone(),
            prefix: config.prefix.clone(),
            canned_acl: ObjectCannedAcl::from(config.canned_acl.as_str()),
            page_size: config.page_size.map(|page_size| page_size as i32),
        }
    }
}

impl Collection for S3Collection {
    async fn list_page(&self, request: PageRequest) -> SweepResult<Page> {
        let output = self
            .client
            .list_objects_v2()
            .bucket(&self.bucket)
            .encoding_type(EncodingType::Url)
            .set_prefix(self.prefix.clone())
            .set_max_keys(self.page_size)
            .set_start_after(request.start_after.map(ItemKey::into_inner))
            .set_continuation_token(request.continuation_token)
            .send()
            .await
            .map_err(|err| {
                sweep_error!(
                    ErrorKind::ListingFailed,
                    "Listing the bucket failed",
                    format!("bucket '{}': {}", self.bucket, DisplayErrorContext(&err)),
                    source: err
                )
            })?;

        let entries = output
            .contents()
            .iter()
            .map(|object| RawEntry {
                raw_key: object.key().map(ToOwned::to_owned),
            })
            .collect::<Vec<_>>();

        let next_token = if output.is_truncated().unwrap_or(false) {
            let Some(token) = output.next_continuation_token() else {
                bail!(
                    ErrorKind::ListingFailed,
                    "Truncated listing returned no continuation token",
                    format!("bucket: '{}'", self.bucket)
                );
            };

            Some(token.to_owned())
        } else {
            None
        };

        debug!(
            bucket = %self.bucket,
            entries = entries.len(),
            has_more = next_token.is_some(),
            "listed s3 page"
        );

        Ok(Page {
            entries,
            next_token,
        })
    }

    async fn mutate(&self, key: &ItemKey) -> SweepResult<()> {
        self.client
            .put_object_acl()
            .bucket(&self.bucket)
            .key(key.as_str())
            .acl(self.canned_acl.clone())
            .send()
            .await
            .map_err(|err| {
                sweep_error!(
                    ErrorKind::MutationFailed,
                    "Setting the object ACL failed",
                    format!("key '{key}': {}", DisplayErrorContext(&err)),
                    source: err
                )
            })?;

        Ok(())
    }
}
