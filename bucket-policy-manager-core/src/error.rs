//! Error types for bucket policy operations.

use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::aws::AwsError;

/// Errors raised while loading templates, handling backups or mutating bucket policies.
#[derive(Debug, Error)]
pub enum PolicyManagerError {
    #[error("Policy template '{name}' not found in {}", .dir.display())]
    TemplateNotFound { name: String, dir: PathBuf },

    #[error("Invalid JSON in policy template: {name}: {message}")]
    InvalidTemplate { name: String, message: String },

    #[error("Policy document error: {0}")]
    Policy(String),

    #[error("File system error during {operation} on {}: {source}", .path.display())]
    FileSystem {
        operation: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Backup error: {0}")]
    Backup(String),

    #[error("Bucket selection error: {0}")]
    Selection(String),

    #[error("No S3 buckets found in your account.")]
    NoBuckets,

    #[error(transparent)]
    Aws(#[from] AwsError),
}

impl PolicyManagerError {
    pub(crate) fn file_system(
        operation: impl Into<String>,
        path: impl AsRef<Path>,
        source: std::io::Error,
    ) -> Self {
        Self::FileSystem {
            operation: operation.into(),
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    pub(crate) fn invalid_template(name: impl Into<String>, message: impl ToString) -> Self {
        Self::InvalidTemplate {
            name: name.into(),
            message: message.to_string(),
        }
    }

    pub(crate) fn policy(message: impl Into<String>) -> Self {
        Self::Policy(message.into())
    }
}

pub type PolicyManagerResult<T> = Result<T, PolicyManagerError>;
