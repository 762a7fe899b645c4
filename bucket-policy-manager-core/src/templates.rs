//! Policy templates stored as `<templates_dir>/<name>.json`.
//!
//! A template is a policy document holding exactly one statement with a `Sid`.
//! Any string value may contain [`BUCKET_NAME_PLACEHOLDER`], which is replaced by
//! the target bucket name when the template is rendered.

use log::{debug, trace};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::error::{PolicyManagerError, PolicyManagerResult};
use crate::files::glob_files;
use crate::types::PolicyDocument;

pub const BUCKET_NAME_PLACEHOLDER: &str = "${bucket_name}";

const DEFAULT_TEMPLATES_DIR: &str = "policy_templates";

/// Replace the bucket placeholder in every string value of `value`.
///
/// Object keys and non-string scalars are returned unchanged.
pub fn substitute_bucket_name(value: &Value, bucket_name: &str) -> Value {
    match value {
        Value::String(s) => Value::String(s.replace(BUCKET_NAME_PLACEHOLDER, bucket_name)),
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|item| substitute_bucket_name(item, bucket_name))
                .collect(),
        ),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(key, item)| (key.clone(), substitute_bucket_name(item, bucket_name)))
                .collect(),
        ),
        other => other.clone(),
    }
}

/// A validated template, not yet bound to a bucket.
#[derive(Debug, Clone, PartialEq)]
pub struct PolicyTemplate {
    name: String,
    sid: String,
    document: Value,
}

impl PolicyTemplate {
    /// Parse and validate template text.
    pub fn from_json(name: &str, json: &str) -> PolicyManagerResult<Self> {
        let document: Value = serde_json::from_str(json)
            .map_err(|e| PolicyManagerError::invalid_template(name, e))?;

        let parsed = PolicyDocument::from_value(document.clone())
            .map_err(|e| PolicyManagerError::invalid_template(name, e))?;

        if parsed.statement.len() != 1 {
            return Err(PolicyManagerError::invalid_template(
                name,
                format!(
                    "expected exactly one statement, found {}",
                    parsed.statement.len()
                ),
            ));
        }

        let sid = parsed.statement[0].sid.clone().ok_or_else(|| {
            PolicyManagerError::invalid_template(name, "the statement has no Sid")
        })?;

        Ok(Self {
            name: name.to_string(),
            sid,
            document,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// `Sid` of the template statement. Placeholders are not substituted here.
    pub fn sid(&self) -> &str {
        &self.sid
    }

    /// Bind the template to `bucket_name`.
    pub fn render(&self, bucket_name: &str) -> PolicyManagerResult<PolicyDocument> {
        let rendered = substitute_bucket_name(&self.document, bucket_name);
        PolicyDocument::from_value(rendered)
            .map_err(|e| PolicyManagerError::invalid_template(&self.name, e))
    }
}

/// Directory of operator-authored templates.
#[derive(Debug, Clone)]
pub struct TemplateCatalog {
    dir: PathBuf,
}

impl Default for TemplateCatalog {
    fn default() -> Self {
        Self::new(DEFAULT_TEMPLATES_DIR)
    }
}

impl TemplateCatalog {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Create the templates directory if it does not exist yet.
    pub async fn ensure_dir(&self) -> PolicyManagerResult<()> {
        fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| PolicyManagerError::file_system("create directory", &self.dir, e))
    }

    /// Template names (file stems of `*.json`), sorted.
    pub async fn list(&self) -> PolicyManagerResult<Vec<String>> {
        self.ensure_dir().await?;

        let mut names: Vec<String> = glob_files(&self.dir, "*.json")?
            .into_iter()
            .filter_map(|path| {
                path.file_stem()
                    .and_then(|stem| stem.to_str())
                    .map(str::to_string)
            })
            .collect();
        names.sort();

        trace!("Found {} templates in {}", names.len(), self.dir.display());
        Ok(names)
    }

    /// Read and validate `<dir>/<name>.json`.
    pub async fn load(&self, name: &str) -> PolicyManagerResult<PolicyTemplate> {
        self.ensure_dir().await?;

        let path = self.dir.join(format!("{name}.json"));
        debug!("Loading policy template from {}", path.display());

        let content = match fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(PolicyManagerError::TemplateNotFound {
                    name: name.to_string(),
                    dir: self.dir.clone(),
                });
            }
            Err(e) => return Err(PolicyManagerError::file_system("read", &path, e)),
        };

        PolicyTemplate::from_json(name, &content)
    }
}
