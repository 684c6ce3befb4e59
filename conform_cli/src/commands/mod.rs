pub mod batch;
pub mod check;
pub mod dates;
pub mod list;
pub mod probe;
pub mod schema;
pub mod setup;
pub mod show;
pub mod status;
pub mod validate;

use crate::cli::{Cli, SubmissionArgs};
use conform_core::catalog::Catalog;
use conform_core::connector::{Connector, ConnectorVariant};
use conform_core::dates::StatusFormatter;
use conform_core::fields::{Audience, Submission, ValidationErrors};
use conform_core::settings::{Settings, SettingsError};
use conform_core::ConformError;
use serde_json::Value;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum CommandError {
    #[error("Connector '{0}' not found")]
    ConnectorNotFound(String),

    #[error("Variant '{0}' not found")]
    VariantNotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("{0}")]
    Validation(#[from] ValidationErrors),

    #[error("Catalog has {0} definition error(s)")]
    DefinitionErrors(usize),

    #[error("{failed} of {total} submission(s) failed validation")]
    BatchFailures { failed: usize, total: usize },

    #[error("Connection test failed: {0}")]
    ProbeFailed(String),

    #[error("Core library error: {0}")]
    Core(#[from] ConformError),

    #[error("Settings error: {0}")]
    Settings(#[from] SettingsError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl CommandError {
    /// Failures already reported in full on stdout.
    pub fn is_reported(&self) -> bool {
        matches!(
            self,
            CommandError::Validation(_)
                | CommandError::DefinitionErrors(_)
                | CommandError::BatchFailures { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, CommandError>;

/// Settings, the active catalog and the clock for one invocation.
pub struct Context {
    pub settings: Settings,
    pub catalog: Catalog,
}

impl Context {
    /// Catalog precedence: `--catalog`, then `catalog_path` from settings, then
    /// the built-in demo catalog.
    pub fn load(cli: &Cli) -> Result<Self> {
        let settings = Settings::load()?;
        let catalog = match cli.catalog.as_ref().or(settings.catalog_path.as_ref()) {
            Some(path) => Catalog::load_from_path(path)?,
            None => Catalog::demo().clone(),
        };
        debug!(plugins = catalog.plugins.len(), "catalog ready");
        Ok(Self { settings, catalog })
    }

    pub fn formatter(&self, cli: &Cli) -> Result<StatusFormatter> {
        let fmt = match &cli.now {
            Some(now) => StatusFormatter::at_str(now)?,
            None => StatusFormatter::wall_clock(),
        };
        Ok(fmt.with_due_soon_days(self.settings.due_soon_threshold_days))
    }

    /// Audience for echoing back what the user just submitted.
    pub fn submitter_audience(&self) -> Audience {
        if self.settings.reveal_to_writer {
            Audience::Writer
        } else {
            Audience::Reader
        }
    }

    pub fn connector(&self, name: &str) -> Result<&Connector> {
        self.catalog
            .plugin(name)
            .or_else(|| self.catalog.plugin_by_slug(name))
            .ok_or_else(|| CommandError::ConnectorNotFound(name.to_string()))
    }

    /// A variant by id, or a connector's default variant by connector id/slug.
    pub fn variant(&self, name: &str) -> Result<(&Connector, &ConnectorVariant)> {
        if let Some(found) = self.catalog.variant(name) {
            return Ok(found);
        }
        let connector = self
            .connector(name)
            .map_err(|_| CommandError::VariantNotFound(name.to_string()))?;
        let variant = connector
            .default_variant()
            .ok_or_else(|| CommandError::VariantNotFound(name.to_string()))?;
        Ok((connector, variant))
    }
}

/// Builds a submission from `--file` and `--set` arguments.
pub fn read_submission(args: &SubmissionArgs) -> Result<Submission> {
    let mut submission = match &args.file {
        Some(path) => read_json_object(path)?,
        None => Submission::new(),
    };
    for pair in &args.set {
        let (key, raw) = pair
            .split_once('=')
            .ok_or_else(|| CommandError::InvalidInput(format!("expected KEY=VALUE, got '{}'", pair)))?;
        submission.insert(key.trim().to_string(), parse_set_value(raw));
    }
    Ok(submission)
}

pub fn read_json_object(path: &Path) -> Result<serde_json::Map<String, Value>> {
    let content = std::fs::read_to_string(path)?;
    match serde_json::from_str::<Value>(&content)? {
        Value::Object(map) => Ok(map),
        _ => Err(CommandError::InvalidInput(format!(
            "{} must contain a JSON object",
            path.display()
        ))),
    }
}

/// JSON literals stay typed; anything that is not valid JSON is taken as text.
fn parse_set_value(raw: &str) -> Value {
    match serde_json::from_str::<Value>(raw) {
        Ok(value @ (Value::Bool(_) | Value::Array(_) | Value::Null | Value::Number(_))) => value,
        _ => Value::String(raw.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_set_value() {
        assert_eq!(parse_set_value("true"), json!(true));
        assert_eq!(parse_set_value("[\"a\",\"b\"]"), json!(["a", "b"]));
        assert_eq!(parse_set_value("8443"), json!(8443));
        assert_eq!(parse_set_value("mycompany"), json!("mycompany"));
        assert_eq!(parse_set_value("\"quoted\""), json!("\"quoted\""));
    }

    #[test]
    fn test_read_submission_set_overrides_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("submission.json");
        std::fs::write(&path, r#"{"subdomain": "old", "username": "a@b.co"}"#).unwrap();

        let args = SubmissionArgs {
            file: Some(path.clone()),
            set: vec!["subdomain=new".to_string()],
        };
        let submission = read_submission(&args).unwrap();
        assert_eq!(submission["subdomain"], "new");
        assert_eq!(submission["username"], "a@b.co");

        let bad = SubmissionArgs {
            file: None,
            set: vec!["novalue".to_string()],
        };
        assert!(matches!(
            read_submission(&bad),
            Err(CommandError::InvalidInput(_))
        ));
    }
}
