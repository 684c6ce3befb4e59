use crate::cli::{Cli, SubmissionArgs};
use crate::commands::{read_json_object, read_submission, CommandError, Context, Result};
use crate::output::{format_output, OutputData, Theme};
use conform_core::connector::ConnectorVariant;
use conform_core::fields::ValidatedConfig;
use serde_json::Value;
use std::path::Path;
use tracing::debug;

pub fn run(cli: &Cli, variant_id: &str, input: &SubmissionArgs, update: Option<&Path>) -> Result<()> {
    let ctx = Context::load(cli)?;
    let (_, variant) = ctx.variant(variant_id)?;
    let submission = read_submission(input)?;
    let theme = Theme::new(!cli.no_color);

    let result = match update {
        Some(path) => {
            let previous = read_stored(path, variant)?;
            variant.validate_update(&previous, &submission)
        }
        None => variant.validate(&submission),
    };

    match result {
        Ok(config) => {
            debug!(variant = %variant.id, fields = config.len(), "submission valid");
            let data = OutputData::Validated {
                variant: variant.id.clone(),
                config: variant.read_back(&config, ctx.submitter_audience()),
            };
            format_output(&data, &cli.output, theme)
        }
        Err(errors) => {
            let data = OutputData::FieldErrors {
                variant: variant.id.clone(),
                errors: errors.as_slice().to_vec(),
            };
            format_output(&data, &cli.output, theme)?;
            Err(CommandError::Validation(errors))
        }
    }
}

/// Reads a stored configuration as written by `conform validate --output json`
/// (the `data.config` object) or as a bare JSON object.
///
/// Each value is coerced through its field so it compares equal to a fresh
/// submission of the same value. Masked (`null`) and unknown keys are skipped.
pub fn read_stored(path: &Path, variant: &ConnectorVariant) -> Result<ValidatedConfig> {
    let mut object = read_json_object(path)?;
    let envelope = object
        .get("data")
        .and_then(|data| data.get("config"))
        .and_then(|config| config.as_object())
        .cloned();
    if let Some(config) = envelope {
        object = config;
    }
    let mut stored = ValidatedConfig::new();
    for (key, value) in &object {
        let Some(field) = variant.field(key) else {
            continue;
        };
        if is_masked(value) {
            continue;
        }
        match field.validate(Some(value)) {
            Ok(Some(value)) => stored.insert(key.as_str(), value),
            Ok(None) => {}
            Err(errors) => {
                let reasons: Vec<String> = errors.into_iter().map(|e| e.message).collect();
                return Err(CommandError::InvalidInput(format!(
                    "stored value for '{}' is invalid: {}",
                    key,
                    reasons.join("; ")
                )));
            }
        }
    }
    Ok(stored)
}

/// Values a reader-facing read-back leaves blank.
fn is_masked(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use conform_core::catalog::Catalog;
    use conform_core::fields::FieldValue;

    #[test]
    fn test_read_stored_accepts_output_envelope() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stored.json");
        std::fs::write(
            &path,
            r#"{"type":"Validated","data":{"variant":"hubspot-private-app","config":{"accessToken":null,"objects":["contacts","deals"],"backfillFrom":"2024-01-01","extra":"x"}}}"#,
        )
        .unwrap();

        let (_, variant) = Catalog::demo().variant("hubspot-private-app").unwrap();
        let stored = read_stored(&path, variant).unwrap();
        assert!(!stored.contains_key("accessToken"));
        assert!(!stored.contains_key("extra"));
        assert_eq!(
            stored.get("objects"),
            Some(&FieldValue::List(vec!["contacts".into(), "deals".into()]))
        );
        assert!(matches!(stored.get("backfillFrom"), Some(FieldValue::Date(_))));
    }

    #[test]
    fn test_masked_secret_keeps_stored_value_on_update() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stored.json");
        std::fs::write(
            &path,
            r#"{"subdomain":"acme","username":"ops@acme.com","apiKey":null}"#,
        )
        .unwrap();

        let (_, variant) = Catalog::demo().variant("salesforce-api-key").unwrap();
        let stored = read_stored(&path, variant).unwrap();
        assert!(!stored.contains_key("apiKey"));

        let mut previous = stored.clone();
        previous.insert("apiKey", FieldValue::Text("k-123".into()));
        let mut edit = conform_core::fields::Submission::new();
        edit.insert("subdomain".into(), Value::String("acme".into()));
        edit.insert("username".into(), Value::String("admin@acme.com".into()));
        edit.insert("apiKey".into(), Value::Null);

        let updated = variant.validate_update(&previous, &edit).unwrap();
        assert_eq!(updated.get("apiKey"), Some(&FieldValue::Text("k-123".into())));
        assert_eq!(
            updated.get("username"),
            Some(&FieldValue::Text("admin@acme.com".into()))
        );
    }
}
