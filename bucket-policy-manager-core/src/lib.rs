//! This crate provides the core logic for the bucket policy manager:
//! - Policy templates with `${bucket_name}` substitution
//! - Statement merge and removal keyed by `Sid`
//! - Timestamped local backups and restore
//! - The S3/STS adapters used to read and write bucket policies
//!

pub mod aws;
pub mod backups;
pub mod commands;
mod error;
mod files;
pub mod selection;
pub mod templates;
mod types;

#[cfg(test)]
pub(crate) mod test_support;

// Re-exports for a small, focused public API
pub use aws::{AwsError, AwsOptions, AwsS3PolicyStore, PolicyStore};
pub use backups::BackupStore;
pub use commands::PolicyManagerService;
pub use error::{PolicyManagerError, PolicyManagerResult};
pub use selection::select_buckets;
pub use templates::{PolicyTemplate, TemplateCatalog, BUCKET_NAME_PLACEHOLDER};
pub use types::{
    ApplyOptions, BucketOutcome, BucketStatus, OperationReport, PolicyDocument, SkipReason,
    Statement,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rendering_documented_example() {
        let template = PolicyTemplate::from_json(
            "read-only",
            r#"{"Statement":[{"Sid":"AllowRead","Effect":"Allow","Action":"s3:GetObject","Resource":"arn:aws:s3:::${bucket_name}/*"}]}"#,
        )
        .expect("template should load");
        let policy = template.render("my-bucket").expect("should render");
        assert_eq!(
            policy.statement[0].body["Resource"],
            "arn:aws:s3:::my-bucket/*"
        );
        assert_eq!(policy.statement[0].sid.as_deref(), Some("AllowRead"));
    }
}
