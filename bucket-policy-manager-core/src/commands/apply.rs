//! Apply logic: merge a template statement into each selected bucket's policy

use log::{info, warn};

use super::service::FetchedPolicy;
use crate::aws::PolicyStore;
use crate::error::PolicyManagerResult;
use crate::templates::PolicyTemplate;
use crate::types::{ApplyOptions, BucketStatus, OperationReport, SkipReason};

impl<S: PolicyStore> super::service::PolicyManagerService<S> {
    /// Apply `template` to every bucket in `buckets`, in order.
    ///
    /// A bucket whose policy already holds a statement with the template's `Sid`
    /// is skipped. Failures are recorded per bucket and never stop the batch.
    pub async fn apply(
        &self,
        buckets: &[String],
        template: &PolicyTemplate,
        options: ApplyOptions,
    ) -> OperationReport {
        let mut report = OperationReport::default();
        for bucket in buckets {
            let status = match self.apply_to_bucket(bucket, template, options).await {
                Ok(status) => status,
                Err(e) => {
                    warn!("Failed to apply '{}' to '{}': {}", template.name(), bucket, e);
                    BucketStatus::Error(e.to_string())
                }
            };
            report.push(bucket.as_str(), status);
        }
        report
    }

    async fn apply_to_bucket(
        &self,
        bucket: &str,
        template: &PolicyTemplate,
        options: ApplyOptions,
    ) -> PolicyManagerResult<BucketStatus> {
        let current = self.fetch_policy(bucket).await?;

        let backup_file = if options.backup {
            self.backups
                .backup(bucket, current.as_ref().map(|fetched| &fetched.raw))
                .await?
        } else {
            None
        };

        let incoming = template.render(bucket)?;

        let final_policy = match current {
            Some(FetchedPolicy {
                document: mut existing,
                ..
            }) => {
                // The Sid may itself carry the bucket placeholder, so compare the rendered one.
                let sid = incoming
                    .statement
                    .first()
                    .and_then(|stmt| stmt.sid.clone())
                    .unwrap_or_else(|| template.sid().to_string());

                if existing.find_statement(&sid).is_some() {
                    info!("Bucket '{}' already has statement '{}'", bucket, sid);
                    return Ok(BucketStatus::Skipped(SkipReason::SidAlreadyExists(sid)));
                }

                existing.append_statements(incoming);
                existing
            }
            None => incoming,
        };

        self.store_policy(bucket, &final_policy).await?;
        Ok(BucketStatus::Success { backup_file })
    }
}
