//! AWS SDK integration: the S3 policy store, STS account lookup and SDK configuration.

mod s3_client;
mod sts;

pub use s3_client::AwsS3PolicyStore;
pub use sts::caller_account_id;

use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region, SdkConfig};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AwsError {
    #[error("S3 client error: {0}")]
    S3Error(String),
    #[error("STS client error: {0}")]
    StsError(String),
}

pub type AwsResult<T> = Result<T, AwsError>;

/// Remote control plane holding bucket policies.
///
/// Policies travel as raw JSON text; interpretation happens in the service layer.
#[async_trait]
pub trait PolicyStore: Send + Sync {
    /// Names of every bucket visible to the caller, in listing order.
    async fn list_buckets(&self) -> AwsResult<Vec<String>>;

    /// Current policy of `bucket`, or `None` when the bucket has no policy.
    async fn get_bucket_policy(&self, bucket: &str) -> AwsResult<Option<String>>;

    async fn put_bucket_policy(&self, bucket: &str, policy: &str) -> AwsResult<()>;

    async fn delete_bucket_policy(&self, bucket: &str) -> AwsResult<()>;
}

/// Overrides for the default AWS configuration chain.
#[derive(Debug, Clone, Default)]
pub struct AwsOptions {
    pub profile: Option<String>,
    pub region: Option<String>,
}

/// Load AWS configuration using the standard credential provider chain.
pub async fn load_sdk_config(options: &AwsOptions) -> SdkConfig {
    let mut loader = aws_config::defaults(BehaviorVersion::latest());
    if let Some(profile) = &options.profile {
        log::debug!("Using AWS profile {}", profile);
        loader = loader.profile_name(profile);
    }
    if let Some(region) = &options.region {
        log::debug!("Using AWS region {}", region);
        loader = loader.region(Region::new(region.clone()));
    }
    loader.load().await
}
