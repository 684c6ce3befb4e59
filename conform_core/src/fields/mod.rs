//! Form field model for connector credential forms.
//!
//! A [`FormField`] is a set of shared attributes ([`FieldBase`]) plus one
//! [`FieldKind`] carrying the kind-specific constraints. On the wire the kind is
//! the `__typename` discriminant and every attribute sits at the top level:
//!
//! ```json
//! {
//!   "__typename": "SecretField",
//!   "id": "sf-oauth-client-secret",
//!   "key": "clientSecret",
//!   "label": "Client Secret",
//!   "required": true,
//!   "widget": "PASSWORD",
//!   "mode": "WRITE_ONLY",
//!   "revealable": false
//! }
//! ```

mod errors;
mod grammar;
mod mask;
mod validate;
mod value;

pub use errors::{FieldError, FieldErrorKind, ValidationErrors};
pub use grammar::{is_valid_email, is_valid_hostname, is_valid_url};
pub use mask::{read_back, Audience};
pub use validate::{validate_submission, validate_update, Submission};
pub use value::{FieldValue, FileUpload, ValidatedConfig};

use chrono::NaiveDate;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Presentation hint. Has no effect on validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Widget {
    #[default]
    TextInput,
    Textarea,
    Password,
    EmailInput,
    UrlInput,
    HostnameInput,
    Select,
    Radio,
    Multiselect,
    Checkbox,
    Toggle,
    DatePicker,
    FileUpload,
    MarkdownDisplay,
}

/// Controls whether a stored value is shown again and whether it may be edited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FieldMode {
    /// Rendered, but a submitted change is rejected.
    ReadOnly,
    /// Accepted on write, never echoed back once stored.
    WriteOnly,
    #[default]
    ReadWrite,
}

impl FieldMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldMode::ReadOnly => "read-only",
            FieldMode::WriteOnly => "write-only",
            FieldMode::ReadWrite => "read-write",
        }
    }
}

/// Attributes every field kind carries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FieldBase {
    /// Stable identifier of this field instance
    pub id: String,
    /// Property name in the submitted configuration
    pub key: String,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub widget: Widget,
    #[serde(default)]
    pub mode: FieldMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TextRules {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
    /// Regular expression the whole value must match
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SecretRules {
    /// When false the value is never returned in cleartext to anyone but its writer
    #[serde(default)]
    pub revealable: bool,
    #[serde(flatten)]
    pub text: TextRules,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl SelectOption {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
            description: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SelectRules {
    pub options: Vec<SelectOption>,
    /// Accept values that are not among `options`
    #[serde(default)]
    pub allow_custom: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct MultiSelectRules {
    pub options: Vec<SelectOption>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_selections: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_selections: Option<usize>,
}

/// Element type of an [`FieldKind::Array`] field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ItemType {
    #[default]
    String,
    Email,
    Url,
    Hostname,
    Number,
    Boolean,
    /// Unrecognised tags accept any scalar
    #[serde(other)]
    Any,
}

impl ItemType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemType::String => "string",
            ItemType::Email => "email",
            ItemType::Url => "url",
            ItemType::Hostname => "hostname",
            ItemType::Number => "number",
            ItemType::Boolean => "boolean",
            ItemType::Any => "any",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ArrayRules {
    #[serde(default)]
    pub item_type: ItemType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_items: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_items: Option<usize>,
}

/// Inclusive calendar bounds.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DateRules {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FileRules {
    /// MIME types (`application/json`), wildcards (`image/*`) or suffixes (`.csv`).
    /// Empty accepts every type.
    #[serde(default)]
    pub accepted_types: Vec<String>,
    /// Upper bound in bytes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_size: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
pub struct MarkdownBlock {
    pub content: String,
}

/// The closed set of field kinds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "__typename")]
pub enum FieldKind {
    #[serde(rename = "StringField")]
    String(TextRules),
    #[serde(rename = "SecretField")]
    Secret(SecretRules),
    #[serde(rename = "EmailField")]
    Email,
    #[serde(rename = "URLField")]
    Url,
    #[serde(rename = "HostnameField")]
    Hostname,
    #[serde(rename = "SelectField")]
    Select(SelectRules),
    #[serde(rename = "MultiSelectField")]
    MultiSelect(MultiSelectRules),
    #[serde(rename = "BooleanField")]
    Boolean,
    #[serde(rename = "ArrayField")]
    Array(ArrayRules),
    #[serde(rename = "DateField")]
    Date(DateRules),
    #[serde(rename = "FileField")]
    File(FileRules),
    #[serde(rename = "MarkdownField")]
    Markdown(MarkdownBlock),
}

impl FieldKind {
    /// The `__typename` discriminant.
    pub fn typename(&self) -> &'static str {
        match self {
            FieldKind::String(_) => "StringField",
            FieldKind::Secret(_) => "SecretField",
            FieldKind::Email => "EmailField",
            FieldKind::Url => "URLField",
            FieldKind::Hostname => "HostnameField",
            FieldKind::Select(_) => "SelectField",
            FieldKind::MultiSelect(_) => "MultiSelectField",
            FieldKind::Boolean => "BooleanField",
            FieldKind::Array(_) => "ArrayField",
            FieldKind::Date(_) => "DateField",
            FieldKind::File(_) => "FileField",
            FieldKind::Markdown(_) => "MarkdownField",
        }
    }

    /// Short lowercase name used in descriptions and CLI output.
    pub fn name(&self) -> &'static str {
        match self {
            FieldKind::String(_) => "string",
            FieldKind::Secret(_) => "secret",
            FieldKind::Email => "email",
            FieldKind::Url => "url",
            FieldKind::Hostname => "hostname",
            FieldKind::Select(_) => "select",
            FieldKind::MultiSelect(_) => "multiselect",
            FieldKind::Boolean => "boolean",
            FieldKind::Array(_) => "array",
            FieldKind::Date(_) => "date",
            FieldKind::File(_) => "file",
            FieldKind::Markdown(_) => "markdown",
        }
    }
}

/// One configurable field of a connector variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FormField {
    #[serde(flatten)]
    pub base: FieldBase,
    #[serde(flatten)]
    pub kind: FieldKind,
}

impl FormField {
    pub fn new(
        id: impl Into<String>,
        key: impl Into<String>,
        label: impl Into<String>,
        kind: FieldKind,
    ) -> Self {
        Self {
            base: FieldBase {
                id: id.into(),
                key: key.into(),
                label: label.into(),
                description: None,
                required: false,
                widget: Widget::default(),
                mode: FieldMode::default(),
                default_value: None,
                placeholder: None,
            },
            kind,
        }
    }

    pub fn required(mut self) -> Self {
        self.base.required = true;
        self
    }

    pub fn with_mode(mut self, mode: FieldMode) -> Self {
        self.base.mode = mode;
        self
    }

    pub fn with_widget(mut self, widget: Widget) -> Self {
        self.base.widget = widget;
        self
    }

    pub fn with_default(mut self, value: impl Into<String>) -> Self {
        self.base.default_value = Some(value.into());
        self
    }

    pub fn key(&self) -> &str {
        &self.base.key
    }

    pub fn label(&self) -> &str {
        &self.base.label
    }

    pub fn is_required(&self) -> bool {
        self.base.required
    }

    pub fn mode(&self) -> FieldMode {
        self.base.mode
    }

    /// Markdown blocks are display-only and never part of a submission.
    pub fn is_display_only(&self) -> bool {
        matches!(self.kind, FieldKind::Markdown(_))
    }

    pub fn is_secret(&self) -> bool {
        matches!(self.kind, FieldKind::Secret(_))
    }

    /// One-line human summary, e.g.
    /// `Client Secret [clientSecret] secret, required, write-only, masked`.
    pub fn describe(&self) -> String {
        let mut parts = vec![self.kind.name().to_string()];
        if self.is_display_only() {
            parts.push("display only".to_string());
            return format!("{} [{}] {}", self.base.label, self.base.key, parts.join(", "));
        }

        parts.push(if self.base.required {
            "required".to_string()
        } else {
            "optional".to_string()
        });
        parts.push(self.base.mode.as_str().to_string());
        parts.extend(self.constraint_notes());

        format!("{} [{}] {}", self.base.label, self.base.key, parts.join(", "))
    }

    fn constraint_notes(&self) -> Vec<String> {
        let mut notes = Vec::new();
        match &self.kind {
            FieldKind::String(rules) => notes.extend(text_notes(rules)),
            FieldKind::Secret(rules) => {
                if !rules.revealable {
                    notes.push("masked".to_string());
                }
                notes.extend(text_notes(&rules.text));
            }
            FieldKind::Select(rules) => {
                let values: Vec<&str> = rules.options.iter().map(|o| o.value.as_str()).collect();
                notes.push(format!("one of {}", values.join("|")));
                if rules.allow_custom {
                    notes.push("custom values allowed".to_string());
                }
            }
            FieldKind::MultiSelect(rules) => {
                let values: Vec<&str> = rules.options.iter().map(|o| o.value.as_str()).collect();
                notes.push(format!("any of {}", values.join("|")));
                if let Some(range) = range_note(rules.min_selections, rules.max_selections) {
                    notes.push(format!("{} selections", range));
                }
            }
            FieldKind::Array(rules) => {
                notes.push(format!("items: {}", rules.item_type.as_str()));
                if let Some(range) = range_note(rules.min_items, rules.max_items) {
                    notes.push(format!("{} items", range));
                }
            }
            FieldKind::Date(rules) => match (rules.min_date, rules.max_date) {
                (Some(min), Some(max)) => notes.push(format!("between {} and {}", min, max)),
                (Some(min), None) => notes.push(format!("on or after {}", min)),
                (None, Some(max)) => notes.push(format!("on or before {}", max)),
                (None, None) => {}
            },
            FieldKind::File(rules) => {
                if !rules.accepted_types.is_empty() {
                    notes.push(format!("accepts {}", rules.accepted_types.join(", ")));
                }
                if let Some(max) = rules.max_size {
                    notes.push(format!("max {} bytes", max));
                }
            }
            FieldKind::Email
            | FieldKind::Url
            | FieldKind::Hostname
            | FieldKind::Boolean
            | FieldKind::Markdown(_) => {}
        }
        notes
    }
}

fn text_notes(rules: &TextRules) -> Vec<String> {
    let mut notes = Vec::new();
    if let Some(range) = range_note(rules.min_length, rules.max_length) {
        notes.push(format!("length {}", range));
    }
    if let Some(pattern) = &rules.pattern {
        notes.push(format!("pattern {}", pattern));
    }
    notes
}

fn range_note(min: Option<usize>, max: Option<usize>) -> Option<String> {
    match (min, max) {
        (Some(min), Some(max)) => Some(format!("{}..={}", min, max)),
        (Some(min), None) => Some(format!(">= {}", min)),
        (None, Some(max)) => Some(format!("<= {}", max)),
        (None, None) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deserialize_secret_field() {
        let field: FormField = serde_json::from_value(json!({
            "__typename": "SecretField",
            "id": "sf-oauth-client-secret",
            "key": "clientSecret",
            "label": "Client Secret",
            "required": true,
            "widget": "PASSWORD",
            "mode": "WRITE_ONLY",
            "revealable": false
        }))
        .unwrap();

        assert_eq!(field.key(), "clientSecret");
        assert_eq!(field.mode(), FieldMode::WriteOnly);
        assert_eq!(field.base.widget, Widget::Password);
        match &field.kind {
            FieldKind::Secret(rules) => assert!(!rules.revealable),
            other => panic!("expected secret, got {:?}", other),
        }
    }

    #[test]
    fn test_unit_kind_and_defaults() {
        let field: FormField = serde_json::from_value(json!({
            "__typename": "HostnameField",
            "id": "sf-api-subdomain",
            "key": "subdomain",
            "label": "Salesforce Subdomain"
        }))
        .unwrap();

        assert_eq!(field.kind, FieldKind::Hostname);
        assert!(!field.is_required());
        assert_eq!(field.mode(), FieldMode::ReadWrite);
    }

    #[test]
    fn test_serialize_keeps_typename_at_top_level() {
        let field = FormField::new(
            "env",
            "environment",
            "Environment",
            FieldKind::Select(SelectRules {
                options: vec![SelectOption::new("production", "Production")],
                allow_custom: false,
            }),
        )
        .required();

        let value = serde_json::to_value(&field).unwrap();
        assert_eq!(value["__typename"], "SelectField");
        assert_eq!(value["key"], "environment");
        assert_eq!(value["allowCustom"], false);
        assert_eq!(value["options"][0]["value"], "production");
    }

    #[test]
    fn test_unknown_item_type_falls_back_to_any() {
        let rules: ArrayRules = serde_json::from_value(json!({"itemType": "uuid"})).unwrap();
        assert_eq!(rules.item_type, ItemType::Any);
    }

    #[test]
    fn test_describe() {
        let secret = FormField::new(
            "s",
            "clientSecret",
            "Client Secret",
            FieldKind::Secret(SecretRules::default()),
        )
        .required()
        .with_mode(FieldMode::WriteOnly);
        assert_eq!(
            secret.describe(),
            "Client Secret [clientSecret] secret, required, write-only, masked"
        );

        let name = FormField::new(
            "n",
            "name",
            "Name",
            FieldKind::String(TextRules {
                min_length: Some(2),
                max_length: Some(10),
                pattern: None,
            }),
        );
        assert_eq!(name.describe(), "Name [name] string, optional, read-write, length 2..=10");

        let intro = FormField::new(
            "md",
            "intro",
            "Intro",
            FieldKind::Markdown(MarkdownBlock {
                content: "# Setup".to_string(),
            }),
        );
        assert_eq!(intro.describe(), "Intro [intro] markdown, display only");
    }
}
