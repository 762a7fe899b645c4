//! AWS S3 client wrapper for bucket policy operations

use async_trait::async_trait;
use aws_config::{Region, SdkConfig};
use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata};
use aws_sdk_s3::types::BucketLocationConstraint;
use aws_sdk_s3::Client as S3Client;
use log::debug;

use crate::aws::{AwsError, AwsResult, PolicyStore};

const NO_SUCH_BUCKET_POLICY: &str = "NoSuchBucketPolicy";
const DEFAULT_REGION: &str = "us-east-1";

pub struct AwsS3PolicyStore {
    config: SdkConfig,
    client: S3Client,
}

impl AwsS3PolicyStore {
    pub fn new(config: &SdkConfig) -> Self {
        let config = if config.region().is_some() {
            config.clone()
        } else {
            debug!("No AWS region configured, defaulting to {}", DEFAULT_REGION);
            config
                .to_builder()
                .region(Region::new(DEFAULT_REGION))
                .build()
        };
        let client = S3Client::new(&config);
        Self { config, client }
    }

    /// Client bound to the bucket's home region.
    ///
    /// Bucket policy calls sent to another region are answered with a redirect, so
    /// the region is looked up first. If the lookup itself is denied the default
    /// client is used and the real call reports whatever S3 says.
    async fn client_for_bucket(&self, bucket: &str) -> S3Client {
        let location = match self.client.get_bucket_location().bucket(bucket).send().await {
            Ok(response) => response,
            Err(e) => {
                debug!(
                    "Could not resolve region of bucket '{}', using default client: {}",
                    bucket,
                    DisplayErrorContext(&e)
                );
                return self.client.clone();
            }
        };

        let region = bucket_region(location.location_constraint());
        let current = self.config.region().map(|r| r.as_ref().to_string());
        if current.as_deref() == Some(region.as_str()) {
            return self.client.clone();
        }

        debug!("Bucket '{}' lives in {}", bucket, region);
        let config = aws_sdk_s3::config::Builder::from(&self.config)
            .region(Region::new(region))
            .build();
        S3Client::from_conf(config)
    }
}

/// Map a `GetBucketLocation` constraint to a region name.
fn bucket_region(constraint: Option<&BucketLocationConstraint>) -> String {
    match constraint.map(BucketLocationConstraint::as_str) {
        None | Some("") => DEFAULT_REGION.to_string(),
        Some("EU") => "eu-west-1".to_string(),
        Some(region) => region.to_string(),
    }
}

#[async_trait]
impl PolicyStore for AwsS3PolicyStore {
    async fn list_buckets(&self) -> AwsResult<Vec<String>> {
        let mut names = Vec::new();
        let mut continuation_token: Option<String> = None;

        loop {
            let response = self
                .client
                .list_buckets()
                .set_continuation_token(continuation_token.take())
                .send()
                .await
                .map_err(|e| {
                    AwsError::S3Error(format!(
                        "Failed to list buckets: {}",
                        DisplayErrorContext(&e)
                    ))
                })?;

            names.extend(
                response
                    .buckets()
                    .iter()
                    .filter_map(|bucket| bucket.name().map(str::to_string)),
            );

            match response.continuation_token() {
                Some(token) if !token.is_empty() => continuation_token = Some(token.to_string()),
                _ => break,
            }
        }

        debug!("Listed {} buckets", names.len());
        Ok(names)
    }

    async fn get_bucket_policy(&self, bucket: &str) -> AwsResult<Option<String>> {
        let client = self.client_for_bucket(bucket).await;
        match client.get_bucket_policy().bucket(bucket).send().await {
            Ok(response) => Ok(response.policy().map(str::to_string)),
            Err(e) if e.code() == Some(NO_SUCH_BUCKET_POLICY) => {
                debug!("Bucket '{}' has no policy", bucket);
                Ok(None)
            }
            Err(e) => Err(AwsError::S3Error(format!(
                "Failed to get bucket policy for '{bucket}': {}",
                DisplayErrorContext(&e)
            ))),
        }
    }

    async fn put_bucket_policy(&self, bucket: &str, policy: &str) -> AwsResult<()> {
        let client = self.client_for_bucket(bucket).await;
        client
            .put_bucket_policy()
            .bucket(bucket)
            .policy(policy)
            .send()
            .await
            .map_err(|e| {
                AwsError::S3Error(format!(
                    "Failed to put bucket policy on '{bucket}': {}",
                    DisplayErrorContext(&e)
                ))
            })?;
        Ok(())
    }

    async fn delete_bucket_policy(&self, bucket: &str) -> AwsResult<()> {
        let client = self.client_for_bucket(bucket).await;
        client
            .delete_bucket_policy()
            .bucket(bucket)
            .send()
            .await
            .map_err(|e| {
                AwsError::S3Error(format!(
                    "Failed to delete bucket policy on '{bucket}': {}",
                    DisplayErrorContext(&e)
                ))
            })?;
        Ok(())
    }
}
