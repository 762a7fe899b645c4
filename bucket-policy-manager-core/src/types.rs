//! Core types: policy documents and per-bucket operation results.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::path::PathBuf;

/// A bucket policy document.
///
/// Only the `Statement` list is interpreted. Every other top-level member is
/// carried through untouched so that a fetch/modify/put cycle loses nothing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PolicyDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(deserialize_with = "one_or_many")]
    pub statement: Vec<Statement>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A single policy statement, identified by its optional `Sid`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Statement {
    #[serde(rename = "Sid", default, skip_serializing_if = "Option::is_none")]
    pub sid: Option<String>,
    #[serde(flatten)]
    pub body: Map<String, Value>,
}

// IAM grammar allows `"Statement": {...}` as well as a list.
#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    Many(Vec<Statement>),
    One(Statement),
}

fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<Statement>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::Many(statements) => statements,
        OneOrMany::One(statement) => vec![statement],
    })
}

impl PolicyDocument {
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    pub fn from_value(value: Value) -> serde_json::Result<Self> {
        serde_json::from_value(value)
    }

    /// Compact form, as sent to the policy store.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// First statement carrying `sid`, if any.
    pub fn find_statement(&self, sid: &str) -> Option<&Statement> {
        self.statement
            .iter()
            .find(|stmt| stmt.sid.as_deref() == Some(sid))
    }

    /// Drop every statement whose `Sid` equals `sid`, returning how many were removed.
    pub fn remove_statements(&mut self, sid: &str) -> usize {
        let before = self.statement.len();
        self.statement
            .retain(|stmt| stmt.sid.as_deref() != Some(sid));
        before - self.statement.len()
    }

    /// Append the statements of `other` after the existing ones.
    pub fn append_statements(&mut self, other: PolicyDocument) {
        self.statement.extend(other.statement);
    }
}

/// Options controlling `apply`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApplyOptions {
    /// Snapshot the existing policy before mutating it.
    pub backup: bool,
}

impl Default for ApplyOptions {
    fn default() -> Self {
        Self { backup: true }
    }
}

/// Why a bucket was left untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    SidAlreadyExists(String),
    NoPolicy,
    SidNotFound(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SidAlreadyExists(sid) => write!(f, "Policy with Sid {sid} already exists"),
            Self::NoPolicy => write!(f, "No policy exists"),
            Self::SidNotFound(sid) => write!(f, "No policy with Sid {sid} found"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BucketStatus {
    Success { backup_file: Option<PathBuf> },
    Skipped(SkipReason),
    Error(String),
}

impl BucketStatus {
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketOutcome {
    pub bucket: String,
    pub status: BucketStatus,
}

/// Per-bucket results of an apply or remove run, in processing order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OperationReport {
    pub outcomes: Vec<BucketOutcome>,
}

impl OperationReport {
    pub fn push(&mut self, bucket: impl Into<String>, status: BucketStatus) {
        self.outcomes.push(BucketOutcome {
            bucket: bucket.into(),
            status,
        });
    }

    pub fn has_errors(&self) -> bool {
        self.outcomes.iter().any(|outcome| outcome.status.is_error())
    }

    pub fn status_of(&self, bucket: &str) -> Option<&BucketStatus> {
        self.outcomes
            .iter()
            .find(|outcome| outcome.bucket == bucket)
            .map(|outcome| &outcome.status)
    }
}
