//! Caller identity lookup

use crate::aws::{AwsError, AwsResult};
use aws_sdk_sts::error::DisplayErrorContext;
use aws_sdk_sts::Client as StsClient;

/// Account id of the credentials in use; namespaces the local backup directory.
pub async fn caller_account_id(client: &StsClient) -> AwsResult<String> {
    let response = client.get_caller_identity().send().await.map_err(|e| {
        AwsError::StsError(format!(
            "Failed to get caller identity: {}",
            DisplayErrorContext(&e)
        ))
    })?;

    response
        .account()
        .map(str::to_string)
        .ok_or_else(|| {
            AwsError::StsError("Caller identity response did not include an account id".into())
        })
}
