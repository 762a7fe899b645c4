//! In-memory policy store used by the service tests.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use crate::aws::{AwsError, AwsResult, PolicyStore};

#[derive(Default)]
pub(crate) struct InMemoryPolicyStore {
    buckets: Vec<String>,
    policies: Mutex<HashMap<String, String>>,
    denied: HashSet<String>,
    deletes: Mutex<Vec<String>>,
}

impl InMemoryPolicyStore {
    pub(crate) fn with_buckets(names: &[&str]) -> Self {
        Self {
            buckets: names.iter().map(|name| name.to_string()).collect(),
            ..Self::default()
        }
    }

    pub(crate) fn with_policy(self, bucket: &str, policy: &str) -> Self {
        self.policies
            .lock()
            .unwrap()
            .insert(bucket.to_string(), policy.to_string());
        self
    }

    /// Every call touching `bucket` fails as if access were denied.
    pub(crate) fn deny(mut self, bucket: &str) -> Self {
        self.denied.insert(bucket.to_string());
        self
    }

    pub(crate) fn policy(&self, bucket: &str) -> Option<serde_json::Value> {
        self.policies
            .lock()
            .unwrap()
            .get(bucket)
            .map(|json| serde_json::from_str(json).unwrap())
    }

    pub(crate) fn deleted(&self) -> Vec<String> {
        self.deletes.lock().unwrap().clone()
    }

    fn check_access(&self, bucket: &str) -> AwsResult<()> {
        if self.denied.contains(bucket) {
            return Err(AwsError::S3Error(format!(
                "Failed to access '{bucket}': AccessDenied: Access Denied"
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl PolicyStore for InMemoryPolicyStore {
    async fn list_buckets(&self) -> AwsResult<Vec<String>> {
        Ok(self.buckets.clone())
    }

    async fn get_bucket_policy(&self, bucket: &str) -> AwsResult<Option<String>> {
        self.check_access(bucket)?;
        Ok(self.policies.lock().unwrap().get(bucket).cloned())
    }

    async fn put_bucket_policy(&self, bucket: &str, policy: &str) -> AwsResult<()> {
        self.check_access(bucket)?;
        self.policies
            .lock()
            .unwrap()
            .insert(bucket.to_string(), policy.to_string());
        Ok(())
    }

    async fn delete_bucket_policy(&self, bucket: &str) -> AwsResult<()> {
        self.check_access(bucket)?;
        self.policies.lock().unwrap().remove(bucket);
        self.deletes.lock().unwrap().push(bucket.to_string());
        Ok(())
    }
}
