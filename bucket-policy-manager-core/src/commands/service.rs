//! Bucket Policy Manager Service Layer
//!
//! The service holds the policy store and the account's backup store and exposes
//! the high-level operations (apply, remove, restore) used by the CLI.

use aws_sdk_sts::Client as StsClient;
use log::{debug, info};
use serde_json::Value;
use std::path::Path;

use crate::aws::{caller_account_id, load_sdk_config, AwsOptions, AwsS3PolicyStore, PolicyStore};
use crate::backups::BackupStore;
use crate::error::{PolicyManagerError, PolicyManagerResult};
use crate::types::PolicyDocument;

/// Runs bucket policy operations against one policy store, writing snapshots
/// into the caller account's backup directory.
pub struct PolicyManagerService<S> {
    pub(crate) store: S,
    pub(crate) backups: BackupStore,
}

/// A bucket policy as fetched, alongside its parsed form.
pub(crate) struct FetchedPolicy {
    /// Exactly what the store returned; this is what gets backed up.
    pub(crate) raw: Value,
    pub(crate) document: PolicyDocument,
}

impl PolicyManagerService<AwsS3PolicyStore> {
    /// Create a service backed by AWS.
    ///
    /// Loads the SDK configuration, resolves the caller's account id and binds the
    /// backup store to `<backup_root>/policy_backups_<account_id>`.
    ///
    /// # Errors
    ///
    /// Returns an error if the caller identity cannot be resolved.
    pub async fn connect(options: &AwsOptions, backup_root: &Path) -> PolicyManagerResult<Self> {
        let config = load_sdk_config(options).await;
        let account_id = caller_account_id(&StsClient::new(&config)).await?;
        info!("Using AWS account {}", account_id);

        Ok(Self::new(
            AwsS3PolicyStore::new(&config),
            BackupStore::for_account(backup_root, &account_id),
        ))
    }
}

impl<S: PolicyStore> PolicyManagerService<S> {
    pub fn new(store: S, backups: BackupStore) -> Self {
        Self { store, backups }
    }

    pub fn backups(&self) -> &BackupStore {
        &self.backups
    }

    /// Every bucket in the account. An empty account is an error.
    pub async fn list_buckets(&self) -> PolicyManagerResult<Vec<String>> {
        let buckets = self.store.list_buckets().await?;
        if buckets.is_empty() {
            return Err(PolicyManagerError::NoBuckets);
        }
        Ok(buckets)
    }

    /// Fetch and parse the current policy of `bucket`.
    pub(crate) async fn fetch_policy(
        &self,
        bucket: &str,
    ) -> PolicyManagerResult<Option<FetchedPolicy>> {
        let Some(json) = self.store.get_bucket_policy(bucket).await? else {
            return Ok(None);
        };
        debug!("Fetched policy of '{}' ({} bytes)", bucket, json.len());

        let malformed = |e: serde_json::Error| {
            PolicyManagerError::policy(format!("Malformed policy on bucket '{bucket}': {e}"))
        };
        let raw: Value = serde_json::from_str(&json).map_err(malformed)?;
        let document = PolicyDocument::from_value(raw.clone()).map_err(malformed)?;

        Ok(Some(FetchedPolicy { raw, document }))
    }

    pub(crate) async fn store_policy(
        &self,
        bucket: &str,
        policy: &PolicyDocument,
    ) -> PolicyManagerResult<()> {
        let json = policy.to_json().map_err(|e| {
            PolicyManagerError::policy(format!("Failed to serialize policy: {e}"))
        })?;
        self.store.put_bucket_policy(bucket, &json).await?;
        info!(
            "Stored policy with {} statements on '{}'",
            policy.statement.len(),
            bucket
        );
        Ok(())
    }

    // apply() is implemented in apply.rs
    // remove() is implemented in remove.rs
    // restore() is implemented in restore.rs
}
