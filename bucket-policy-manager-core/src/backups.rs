//! Timestamped local snapshots of bucket policies.
//!
//! Backups live in `<root>/policy_backups_<account_id>/` and are named
//! `bucket_policy_backup_<bucket>_<YYYYMMDD_HHMMSS>.json`, so a lexical sort of
//! the file names is also a chronological one.

use chrono::{Local, NaiveDateTime};
use log::{debug, info};
use serde::Serialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::error::{PolicyManagerError, PolicyManagerResult};
use crate::files::glob_files;

const BACKUP_DIR_PREFIX: &str = "policy_backups_";
const BACKUP_FILE_PREFIX: &str = "bucket_policy_backup_";
const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

#[derive(Debug, Clone)]
pub struct BackupStore {
    dir: PathBuf,
}

impl BackupStore {
    /// Backup store for `account_id` under `root`.
    pub fn for_account(root: impl AsRef<Path>, account_id: &str) -> Self {
        Self {
            dir: root
                .as_ref()
                .join(format!("{BACKUP_DIR_PREFIX}{account_id}")),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub async fn ensure_dir(&self) -> PolicyManagerResult<()> {
        fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| PolicyManagerError::file_system("create directory", &self.dir, e))
    }

    /// Snapshot `policy` for `bucket` exactly as it was fetched. Returns `None`
    /// when there is nothing to back up.
    pub async fn backup(
        &self,
        bucket: &str,
        policy: Option<&Value>,
    ) -> PolicyManagerResult<Option<PathBuf>> {
        let Some(policy) = policy else {
            debug!("No policy to back up for bucket '{}'", bucket);
            return Ok(None);
        };

        self.ensure_dir().await?;

        let path = self
            .dir
            .join(backup_file_name(bucket, &Local::now().naive_local()));
        let content = to_pretty_json(policy).map_err(|e| {
            PolicyManagerError::Backup(format!("Failed to serialize policy of '{bucket}': {e}"))
        })?;

        fs::write(&path, content)
            .await
            .map_err(|e| PolicyManagerError::file_system("write backup", &path, e))?;

        info!("Backed up policy of '{}' to {}", bucket, path.display());
        Ok(Some(path))
    }

    /// Backup files, newest first, optionally restricted to one bucket.
    pub async fn list(&self, bucket: Option<&str>) -> PolicyManagerResult<Vec<PathBuf>> {
        self.ensure_dir().await?;

        let pattern = match bucket {
            Some(bucket) => format!(
                "{BACKUP_FILE_PREFIX}{}_*.json",
                glob::Pattern::escape(bucket)
            ),
            None => format!("{BACKUP_FILE_PREFIX}*.json"),
        };

        let mut backups = glob_files(&self.dir, &pattern)?;
        backups.sort_by(|a, b| b.cmp(a));
        Ok(backups)
    }
}

/// Four-space indented JSON, matching hand-edited policy files.
fn to_pretty_json(value: &Value) -> serde_json::Result<String> {
    let mut buffer = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
    value.serialize(&mut serializer)?;
    // serde_json only ever emits valid UTF-8
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

pub(crate) fn backup_file_name(bucket: &str, timestamp: &NaiveDateTime) -> String {
    format!(
        "{BACKUP_FILE_PREFIX}{bucket}_{}.json",
        timestamp.format(TIMESTAMP_FORMAT)
    )
}

/// Read a backup (or any policy JSON file) for restore.
pub async fn read_policy_file(path: impl AsRef<Path>) -> PolicyManagerResult<Value> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)
        .await
        .map_err(|e| PolicyManagerError::file_system("read", path, e))?;

    serde_json::from_str(&content).map_err(|e| {
        PolicyManagerError::Backup(format!("Invalid JSON in {}: {e}", path.display()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use regex::Regex;
    use serde_json::json;
    use tempfile::TempDir;

    fn sample_policy() -> Value {
        json!({
            "Version": "2012-10-17",
            "Statement": [{"Sid": "AllowRead", "Effect": "Allow", "Action": "s3:GetObject"}]
        })
    }

    #[test]
    fn test_backup_file_name_format() {
        let timestamp = NaiveDate::from_ymd_opt(2024, 3, 9)
            .unwrap()
            .and_hms_opt(7, 5, 1)
            .unwrap();
        assert_eq!(
            backup_file_name("my-bucket", &timestamp),
            "bucket_policy_backup_my-bucket_20240309_070501.json"
        );
    }

    #[tokio::test]
    async fn test_backup_writes_policy_under_account_dir() {
        let temp_dir = TempDir::new().unwrap();
        let store = BackupStore::for_account(temp_dir.path(), "123456789012");
        let policy = sample_policy();

        let path = store
            .backup("b", Some(&policy))
            .await
            .unwrap()
            .expect("a backup should be written");

        let relative = path.strip_prefix(temp_dir.path()).unwrap();
        let pattern =
            Regex::new(r"^policy_backups_123456789012/bucket_policy_backup_b_\d{8}_\d{6}\.json$")
                .unwrap();
        assert!(
            pattern.is_match(&relative.to_string_lossy()),
            "unexpected backup path {}",
            relative.display()
        );

        assert_eq!(read_policy_file(&path).await.unwrap(), policy);

        let content = fs::read_to_string(&path).await.unwrap();
        assert!(content.contains("\n    \"Statement\": ["));
    }

    #[tokio::test]
    async fn test_backup_keeps_policy_shape_as_fetched() {
        let temp_dir = TempDir::new().unwrap();
        let store = BackupStore::for_account(temp_dir.path(), "123456789012");
        let original = json!({
            "Version": "2012-10-17",
            "Statement": {"Sid": "Only", "Effect": "Allow", "Action": "s3:GetObject"},
            "Id": null
        });

        let path = store
            .backup("b", Some(&original))
            .await
            .unwrap()
            .expect("a backup should be written");

        assert_eq!(read_policy_file(&path).await.unwrap(), original);
    }

    #[tokio::test]
    async fn test_backup_without_policy_writes_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let store = BackupStore::for_account(temp_dir.path(), "123456789012");

        assert_eq!(store.backup("b", None).await.unwrap(), None);
        assert!(!store.dir().exists());
    }

    #[tokio::test]
    async fn test_list_filters_and_sorts_newest_first() {
        let temp_dir = TempDir::new().unwrap();
        let store = BackupStore::for_account(temp_dir.path(), "111122223333");
        store.ensure_dir().await.unwrap();

        for name in [
            "bucket_policy_backup_alpha_20240101_000000.json",
            "bucket_policy_backup_alpha_20240301_120000.json",
            "bucket_policy_backup_beta_20240201_000000.json",
            "unrelated.json",
        ] {
            fs::write(store.dir().join(name), "{}").await.unwrap();
        }

        let names = |paths: Vec<PathBuf>| -> Vec<String> {
            paths
                .iter()
                .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
                .collect()
        };

        assert_eq!(
            names(store.list(None).await.unwrap()),
            vec![
                "bucket_policy_backup_beta_20240201_000000.json",
                "bucket_policy_backup_alpha_20240301_120000.json",
                "bucket_policy_backup_alpha_20240101_000000.json",
            ]
        );
        assert_eq!(
            names(store.list(Some("alpha")).await.unwrap()),
            vec![
                "bucket_policy_backup_alpha_20240301_120000.json",
                "bucket_policy_backup_alpha_20240101_000000.json",
            ]
        );
        assert!(store.list(Some("gamma")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_read_policy_file_rejects_invalid_json() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("broken.json");
        fs::write(&path, "{oops").await.unwrap();

        let err = read_policy_file(&path).await.unwrap_err();
        assert!(matches!(err, PolicyManagerError::Backup(_)));

        let err = read_policy_file(temp_dir.path().join("missing.json"))
            .await
            .unwrap_err();
        assert!(matches!(err, PolicyManagerError::FileSystem { .. }));
    }
}
