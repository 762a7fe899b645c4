//! Restore logic: upload a saved policy file verbatim

use log::info;
use std::path::Path;

use crate::aws::PolicyStore;
use crate::backups::read_policy_file;
use crate::error::{PolicyManagerError, PolicyManagerResult};

impl<S: PolicyStore> super::service::PolicyManagerService<S> {
    /// Replace the policy of `bucket` with the contents of `backup_file`.
    ///
    /// No merge and no backup of the policy being replaced.
    pub async fn restore(&self, bucket: &str, backup_file: &Path) -> PolicyManagerResult<()> {
        let policy = read_policy_file(backup_file).await?;
        let json = serde_json::to_string(&policy).map_err(|e| {
            PolicyManagerError::policy(format!("Failed to serialize policy: {e}"))
        })?;

        self.store.put_bucket_policy(bucket, &json).await?;
        info!("Restored policy of '{}' from {}", bucket, backup_file.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::backups::BackupStore;
    use crate::commands::PolicyManagerService;
    use crate::error::PolicyManagerError;
    use crate::test_support::InMemoryPolicyStore;
    use crate::types::{ApplyOptions, BucketStatus};
    use crate::PolicyTemplate;
    use serde_json::json;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_restore_round_trips_a_backup() {
        let temp_dir = TempDir::new().unwrap();
        let original = json!({
            "Version": "2012-10-17",
            "Statement": [{"Sid": "DenyHttp", "Effect": "Deny", "Action": "s3:*", "Resource": "arn:aws:s3:::logs/*"}]
        });
        let store = InMemoryPolicyStore::with_buckets(&["logs"])
            .with_policy("logs", &original.to_string());
        let service = PolicyManagerService::new(
            store,
            BackupStore::for_account(temp_dir.path(), "123456789012"),
        );

        let template = PolicyTemplate::from_json(
            "read",
            r#"{"Statement":[{"Sid":"AllowRead","Effect":"Allow"}]}"#,
        )
        .unwrap();
        let report = service
            .apply(&["logs".to_string()], &template, ApplyOptions::default())
            .await;
        let Some(BucketStatus::Success {
            backup_file: Some(backup),
        }) = report.status_of("logs")
        else {
            panic!("expected a backup, got {:?}", report);
        };
        assert_ne!(service.store.policy("logs").unwrap(), original);

        service.restore("logs", backup).await.unwrap();

        assert_eq!(service.store.policy("logs").unwrap(), original);
    }

    #[tokio::test]
    async fn test_restore_missing_file_fails() {
        let temp_dir = TempDir::new().unwrap();
        let service = PolicyManagerService::new(
            InMemoryPolicyStore::with_buckets(&["logs"]),
            BackupStore::for_account(temp_dir.path(), "123456789012"),
        );

        let err = service
            .restore("logs", &temp_dir.path().join("nope.json"))
            .await
            .unwrap_err();
        assert!(matches!(err, PolicyManagerError::FileSystem { .. }));
        assert!(service.store.policy("logs").is_none());
    }
}
