//! Remove logic: drop statements by `Sid` from each selected bucket's policy

use log::{info, warn};

use super::service::FetchedPolicy;
use crate::aws::PolicyStore;
use crate::error::PolicyManagerResult;
use crate::types::{BucketStatus, OperationReport, SkipReason};

impl<S: PolicyStore> super::service::PolicyManagerService<S> {
    /// Remove every statement with `sid` from each bucket in `buckets`.
    ///
    /// S3 rejects a policy without statements, so a bucket left with none has its
    /// policy deleted instead.
    pub async fn remove(&self, buckets: &[String], sid: &str) -> OperationReport {
        let mut report = OperationReport::default();
        for bucket in buckets {
            let status = match self.remove_from_bucket(bucket, sid).await {
                Ok(status) => status,
                Err(e) => {
                    warn!("Failed to remove '{}' from '{}': {}", sid, bucket, e);
                    BucketStatus::Error(e.to_string())
                }
            };
            report.push(bucket.as_str(), status);
        }
        report
    }

    async fn remove_from_bucket(&self, bucket: &str, sid: &str) -> PolicyManagerResult<BucketStatus> {
        let Some(FetchedPolicy {
            document: mut policy,
            ..
        }) = self.fetch_policy(bucket).await?
        else {
            return Ok(BucketStatus::Skipped(SkipReason::NoPolicy));
        };

        let removed = policy.remove_statements(sid);
        if removed == 0 {
            return Ok(BucketStatus::Skipped(SkipReason::SidNotFound(sid.to_string())));
        }

        if policy.statement.is_empty() {
            self.store.delete_bucket_policy(bucket).await?;
            info!("Deleted policy of '{}' after removing its last statement", bucket);
        } else {
            self.store_policy(bucket, &policy).await?;
            info!("Removed {} statement(s) '{}' from '{}'", removed, sid, bucket);
        }

        Ok(BucketStatus::Success { backup_file: None })
    }
}
