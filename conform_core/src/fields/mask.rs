use super::value::ValidatedConfig;
use super::{FieldKind, FieldMode, FormField};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Who a stored configuration is being rendered for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Audience {
    /// The request that wrote the values, e.g. the response to a create call.
    Writer,
    /// Anyone reading the configuration back later.
    Reader,
}

impl FormField {
    /// Whether this field's stored value must be withheld from `audience`.
    pub fn is_masked_for(&self, audience: Audience) -> bool {
        if audience == Audience::Writer {
            return false;
        }
        let hidden_secret = matches!(&self.kind, FieldKind::Secret(rules) if !rules.revealable);
        hidden_secret || self.mode() == FieldMode::WriteOnly
    }
}

/// Renders a stored configuration for display.
///
/// Masked fields are emitted as `null` so the form can still show that a value
/// exists. Markdown blocks and keys with no field definition are never emitted.
pub fn read_back(
    fields: &[FormField],
    stored: &ValidatedConfig,
    audience: Audience,
) -> Map<String, Value> {
    let mut out = Map::new();
    for field in fields {
        if field.is_display_only() {
            continue;
        }
        let Some(value) = stored.get(field.key()) else {
            continue;
        };
        let rendered = if field.is_masked_for(audience) {
            Value::Null
        } else {
            value.to_json()
        };
        out.insert(field.key().to_string(), rendered);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::{FieldValue, SecretRules, TextRules};

    fn secret(revealable: bool, mode: FieldMode) -> FormField {
        FormField::new(
            "s",
            "apiKey",
            "API Key",
            FieldKind::Secret(SecretRules {
                revealable,
                text: TextRules::default(),
            }),
        )
        .with_mode(mode)
    }

    fn stored(pairs: &[(&str, &str)]) -> ValidatedConfig {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), FieldValue::Text(v.to_string())))
            .collect()
    }

    #[test]
    fn test_unrevealable_secret_is_null_for_readers() {
        let fields = vec![secret(false, FieldMode::ReadWrite)];
        for input in ["s3cr3t", "", "null"] {
            let out = read_back(&fields, &stored(&[("apiKey", input)]), Audience::Reader);
            assert_eq!(out.get("apiKey"), Some(&Value::Null));
        }
    }

    #[test]
    fn test_writer_sees_own_values() {
        let fields = vec![secret(false, FieldMode::WriteOnly)];
        let out = read_back(&fields, &stored(&[("apiKey", "s3cr3t")]), Audience::Writer);
        assert_eq!(out["apiKey"], "s3cr3t");
    }

    #[test]
    fn test_write_only_masks_even_revealable() {
        let fields = vec![secret(true, FieldMode::WriteOnly)];
        let out = read_back(&fields, &stored(&[("apiKey", "s3cr3t")]), Audience::Reader);
        assert_eq!(out["apiKey"], Value::Null);

        let fields = vec![secret(true, FieldMode::ReadWrite)];
        let out = read_back(&fields, &stored(&[("apiKey", "s3cr3t")]), Audience::Reader);
        assert_eq!(out["apiKey"], "s3cr3t");
    }

    #[test]
    fn test_undefined_keys_are_dropped() {
        let fields = vec![FormField::new(
            "u",
            "username",
            "Username",
            FieldKind::Email,
        )];
        let out = read_back(
            &fields,
            &stored(&[("username", "admin@company.com"), ("leaked", "x")]),
            Audience::Reader,
        );
        assert_eq!(out.len(), 1);
        assert_eq!(out["username"], "admin@company.com");
    }
}
