//! Per-kind validators and the whole-submission entry points.
//!
//! Validation never stops at the first failure: every field is checked and
//! every problem is reported, so a form can highlight all invalid inputs at once.

use super::errors::{FieldError, FieldErrorKind, ValidationErrors};
use super::grammar::{is_valid_email, is_valid_hostname, is_valid_url};
use super::value::{FieldValue, FileUpload, ValidatedConfig};
use super::{
    ArrayRules, DateRules, FieldKind, FieldMode, FileRules, FormField, ItemType,
    MultiSelectRules, SelectOption, SelectRules, TextRules,
};
use chrono::{DateTime, NaiveDate};
use regex::Regex;
use serde_json::Value;
use tracing::{debug, warn};

/// Raw configuration as delivered by the transport: a flat string-keyed object
/// with no type information.
pub type Submission = serde_json::Map<String, Value>;

/// What READ_ONLY fields are compared against.
enum Baseline<'a> {
    /// New configuration: the field's `defaultValue`.
    Create,
    /// Edit of an existing configuration.
    Update(&'a ValidatedConfig),
}

/// Validates a new submission against a variant's field list.
///
/// On success the returned config holds exactly the submitted, non-empty keys.
pub fn validate_submission(
    fields: &[FormField],
    submission: &Submission,
) -> Result<ValidatedConfig, ValidationErrors> {
    run(fields, submission, Baseline::Create)
}

/// Validates an edit of `previous`.
///
/// READ_ONLY fields must keep their stored value. READ_ONLY and WRITE_ONLY
/// fields left empty keep their stored value.
pub fn validate_update(
    fields: &[FormField],
    previous: &ValidatedConfig,
    submission: &Submission,
) -> Result<ValidatedConfig, ValidationErrors> {
    run(fields, submission, Baseline::Update(previous))
}

fn run(
    fields: &[FormField],
    submission: &Submission,
    baseline: Baseline<'_>,
) -> Result<ValidatedConfig, ValidationErrors> {
    let mut errors = Vec::new();
    let mut validated = ValidatedConfig::new();

    for field in fields {
        let key = field.key();
        let raw = submission.get(key);

        if field.is_display_only() {
            if raw.is_some() {
                errors.push(FieldError::new(
                    key,
                    FieldErrorKind::UnexpectedField,
                    format!("'{}' is a display block and cannot be submitted", key),
                ));
            }
            continue;
        }

        if let Baseline::Update(previous) = &baseline {
            if field.mode() != FieldMode::ReadWrite && raw.map_or(true, is_empty) {
                if let Some(stored) = previous.get(key) {
                    validated.insert(key, stored.clone());
                    continue;
                }
            }
        }

        match validate_field(field, raw) {
            Ok(Some(value)) => {
                if field.mode() == FieldMode::ReadOnly {
                    if let Some(error) = read_only_violation(field, &value, &baseline) {
                        errors.push(error);
                        continue;
                    }
                }
                validated.insert(key, value);
            }
            Ok(None) => {}
            Err(mut field_errors) => errors.append(&mut field_errors),
        }
    }

    let mut unknown: Vec<&String> = submission
        .keys()
        .filter(|k| !fields.iter().any(|f| f.key() == k.as_str()))
        .collect();
    unknown.sort();
    for key in unknown {
        errors.push(FieldError::new(
            key.as_str(),
            FieldErrorKind::UnexpectedField,
            format!("'{}' is not a field of this connector variant", key),
        ));
    }

    if errors.is_empty() {
        debug!(
            target: "conform.validate",
            fields = fields.len(),
            accepted = validated.len(),
            "submission accepted"
        );
        Ok(validated)
    } else {
        debug!(
            target: "conform.validate",
            fields = fields.len(),
            errors = errors.len(),
            "submission rejected"
        );
        Err(ValidationErrors::new(errors))
    }
}

/// Stored configs reload through untagged serde, so a text value shaped like
/// a date comes back as `FieldValue::Date`. Compare by rendering instead.
fn same_value(stored: &FieldValue, submitted: &FieldValue) -> bool {
    match (stored, submitted) {
        (FieldValue::File(_), _) | (_, FieldValue::File(_)) => stored == submitted,
        _ => stored.as_text() == submitted.as_text(),
    }
}

fn read_only_violation(
    field: &FormField,
    value: &FieldValue,
    baseline: &Baseline<'_>,
) -> Option<FieldError> {
    let unchanged = match baseline {
        Baseline::Create => field.base.default_value.as_deref() == Some(value.as_text().as_str()),
        Baseline::Update(previous) => previous
            .get(field.key())
            .is_some_and(|stored| same_value(stored, value)),
    };
    if unchanged {
        None
    } else {
        Some(FieldError::new(
            field.key(),
            FieldErrorKind::ReadOnlyField,
            format!("{} is read-only and cannot be changed", field.label()),
        ))
    }
}

impl FormField {
    /// Validates one raw value (or its absence).
    ///
    /// `Ok(None)` means an optional field was left empty.
    pub fn validate(&self, raw: Option<&Value>) -> Result<Option<FieldValue>, Vec<FieldError>> {
        validate_field(self, raw)
    }
}

fn validate_field(
    field: &FormField,
    raw: Option<&Value>,
) -> Result<Option<FieldValue>, Vec<FieldError>> {
    let raw = match raw {
        Some(value) if !is_empty(value) => value,
        _ => {
            return if field.is_required() {
                Err(vec![FieldError::new(
                    field.key(),
                    FieldErrorKind::MissingRequiredField,
                    format!("{} is required", field.label()),
                )])
            } else {
                Ok(None)
            };
        }
    };

    let mut check = Check::new(field);
    let value = match &field.kind {
        FieldKind::String(rules) => check.text(raw, rules),
        FieldKind::Secret(rules) => check.text(raw, &rules.text),
        FieldKind::Email => check.formatted(raw, "an email address", is_valid_email),
        FieldKind::Url => check.formatted(raw, "a URL", is_valid_url),
        FieldKind::Hostname => check.formatted(raw, "a hostname", is_valid_hostname),
        FieldKind::Select(rules) => check.select(raw, rules),
        FieldKind::MultiSelect(rules) => check.multi_select(raw, rules),
        FieldKind::Boolean => check.boolean(raw),
        FieldKind::Array(rules) => check.array(raw, rules),
        FieldKind::Date(rules) => check.date(raw, rules),
        FieldKind::File(rules) => check.file(raw, rules),
        FieldKind::Markdown(_) => None,
    };

    if check.errors.is_empty() {
        Ok(value)
    } else {
        Err(check.errors)
    }
}

/// Null, a blank string and an empty list all count as "no value".
fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

/// Error collector for one field.
struct Check<'a> {
    field: &'a FormField,
    errors: Vec<FieldError>,
}

impl<'a> Check<'a> {
    fn new(field: &'a FormField) -> Self {
        Self {
            field,
            errors: Vec::new(),
        }
    }

    fn fail(&mut self, kind: FieldErrorKind, message: impl Into<String>) {
        self.errors
            .push(FieldError::new(self.field.key(), kind, message));
    }

    fn label(&self) -> &'a str {
        self.field.label()
    }

    /// Strings pass through, numbers are rendered, anything else is rejected.
    fn scalar_text(&mut self, raw: &Value) -> Option<String> {
        match scalar_to_string(raw) {
            Some(s) => Some(s),
            None => {
                let label = self.label();
                self.fail(
                    FieldErrorKind::FormatInvalid,
                    format!("{} must be text", label),
                );
                None
            }
        }
    }

    fn text(&mut self, raw: &Value, rules: &TextRules) -> Option<FieldValue> {
        let text = self.scalar_text(raw)?;
        let label = self.label();

        let length = text.chars().count();
        let too_short = rules.min_length.is_some_and(|min| length < min);
        let too_long = rules.max_length.is_some_and(|max| length > max);
        if too_short || too_long {
            let bounds = match (rules.min_length, rules.max_length) {
                (Some(min), Some(max)) => format!("between {} and {}", min, max),
                (Some(min), None) => format!("at least {}", min),
                (None, Some(max)) => format!("at most {}", max),
                (None, None) => unreachable!("length bound violated without bounds"),
            };
            self.fail(
                FieldErrorKind::LengthOutOfRange,
                format!(
                    "{} must be {} characters long (got {})",
                    label, bounds, length
                ),
            );
        }

        if let Some(pattern) = &rules.pattern {
            match Regex::new(&format!("^(?:{})$", pattern)) {
                Ok(re) if re.is_match(&text) => {}
                Ok(_) => self.fail(
                    FieldErrorKind::PatternMismatch,
                    format!("{} does not match the required format", label),
                ),
                Err(err) => {
                    warn!(
                        target: "conform.validate",
                        key = self.field.key(),
                        error = %err,
                        "field pattern does not compile"
                    );
                    self.fail(
                        FieldErrorKind::PatternMismatch,
                        format!("{} cannot be checked: its pattern is invalid", label),
                    );
                }
            }
        }

        Some(FieldValue::Text(text))
    }

    fn formatted(
        &mut self,
        raw: &Value,
        what: &str,
        is_valid: fn(&str) -> bool,
    ) -> Option<FieldValue> {
        let text = self.scalar_text(raw)?;
        let text = text.trim().to_string();
        if !is_valid(&text) {
            let label = self.label();
            self.fail(
                FieldErrorKind::FormatInvalid,
                format!("{} must be {}", label, what),
            );
        }
        Some(FieldValue::Text(text))
    }

    fn select(&mut self, raw: &Value, rules: &SelectRules) -> Option<FieldValue> {
        let text = self.scalar_text(raw)?;
        let text = text.trim().to_string();
        if !rules.allow_custom && !has_option(&rules.options, &text) {
            let label = self.label();
            self.fail(
                FieldErrorKind::InvalidOption,
                format!(
                    "'{}' is not a valid choice for {} (expected one of: {})",
                    text,
                    label,
                    option_values(&rules.options)
                ),
            );
        }
        Some(FieldValue::Text(text))
    }

    fn multi_select(&mut self, raw: &Value, rules: &MultiSelectRules) -> Option<FieldValue> {
        let mut selected = self.list(raw)?;
        dedup_in_order(&mut selected);
        let label = self.label();

        let invalid: Vec<&str> = selected
            .iter()
            .filter(|v| !has_option(&rules.options, v))
            .map(|v| v.as_str())
            .collect();
        if !invalid.is_empty() {
            let message = format!(
                "{} has invalid choice(s): {} (expected any of: {})",
                label,
                invalid.join(", "),
                option_values(&rules.options)
            );
            self.fail(FieldErrorKind::InvalidOption, message);
        }

        if let Some(bounds) = out_of_range(selected.len(), rules.min_selections, rules.max_selections)
        {
            self.fail(
                FieldErrorKind::SelectionCountOutOfRange,
                format!(
                    "{} needs {} selections (got {})",
                    label,
                    bounds,
                    selected.len()
                ),
            );
        }

        Some(FieldValue::List(selected))
    }

    fn boolean(&mut self, raw: &Value) -> Option<FieldValue> {
        match raw {
            Value::Bool(b) => Some(FieldValue::Bool(*b)),
            Value::String(s) if s == "true" => Some(FieldValue::Bool(true)),
            Value::String(s) if s == "false" => Some(FieldValue::Bool(false)),
            _ => {
                let label = self.label();
                self.fail(
                    FieldErrorKind::FormatInvalid,
                    format!("{} must be true or false", label),
                );
                None
            }
        }
    }

    fn array(&mut self, raw: &Value, rules: &ArrayRules) -> Option<FieldValue> {
        let items = self.list(raw)?;
        let label = self.label();

        let bad: Vec<&str> = items
            .iter()
            .filter(|item| !item_matches(rules.item_type, item))
            .map(|item| item.as_str())
            .collect();
        if !bad.is_empty() {
            let message = format!(
                "{} items must be of type {}: {}",
                label,
                rules.item_type.as_str(),
                bad.join(", ")
            );
            self.fail(FieldErrorKind::FormatInvalid, message);
        }

        if let Some(bounds) = out_of_range(items.len(), rules.min_items, rules.max_items) {
            self.fail(
                FieldErrorKind::ItemCountOutOfRange,
                format!("{} needs {} items (got {})", label, bounds, items.len()),
            );
        }

        Some(FieldValue::List(items))
    }

    fn date(&mut self, raw: &Value, rules: &DateRules) -> Option<FieldValue> {
        let label = self.label();
        let date = match raw.as_str().and_then(|s| parse_calendar_date(s.trim())) {
            Some(date) => date,
            None => {
                self.fail(
                    FieldErrorKind::FormatInvalid,
                    format!("{} must be a date in YYYY-MM-DD format", label),
                );
                return None;
            }
        };

        let before = rules.min_date.is_some_and(|min| date < min);
        let after = rules.max_date.is_some_and(|max| date > max);
        if before || after {
            let bounds = match (rules.min_date, rules.max_date) {
                (Some(min), Some(max)) => format!("between {} and {}", min, max),
                (Some(min), None) => format!("on or after {}", min),
                (None, Some(max)) => format!("on or before {}", max),
                (None, None) => unreachable!("date bound violated without bounds"),
            };
            self.fail(
                FieldErrorKind::DateOutOfRange,
                format!("{} must be {} (got {})", label, bounds, date),
            );
        }

        Some(FieldValue::Date(date))
    }

    fn file(&mut self, raw: &Value, rules: &FileRules) -> Option<FieldValue> {
        let label = self.label();
        let upload: FileUpload = match serde_json::from_value(raw.clone()) {
            Ok(upload) => upload,
            Err(_) => {
                self.fail(
                    FieldErrorKind::FormatInvalid,
                    format!("{} must be a file with name, mimeType and size", label),
                );
                return None;
            }
        };

        if !rules.accepted_types.is_empty()
            && !rules
                .accepted_types
                .iter()
                .any(|pattern| file_type_matches(pattern, &upload))
        {
            self.fail(
                FieldErrorKind::UnacceptedFileType,
                format!(
                    "{} does not accept {} ({}); accepted: {}",
                    label,
                    upload.name,
                    upload.mime_type,
                    rules.accepted_types.join(", ")
                ),
            );
        }

        if let Some(max) = rules.max_size {
            if upload.size > max {
                self.fail(
                    FieldErrorKind::FileTooLarge,
                    format!(
                        "{} is {} bytes; {} allows at most {}",
                        upload.name, upload.size, label, max
                    ),
                );
            }
        }

        Some(FieldValue::File(upload))
    }

    /// Lists arrive either as JSON arrays of scalars or as comma-separated text.
    fn list(&mut self, raw: &Value) -> Option<Vec<String>> {
        let items: Option<Vec<String>> = match raw {
            Value::Array(values) => values.iter().map(item_to_string).collect(),
            Value::String(s) => Some(
                s.split(',')
                    .map(|part| part.trim())
                    .filter(|part| !part.is_empty())
                    .map(str::to_string)
                    .collect(),
            ),
            _ => None,
        };
        if items.is_none() {
            let label = self.label();
            self.fail(
                FieldErrorKind::FormatInvalid,
                format!("{} must be a list of values", label),
            );
        }
        items
    }
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// List items additionally accept booleans, for `boolean` arrays.
fn item_to_string(value: &Value) -> Option<String> {
    match value {
        Value::Bool(b) => Some(b.to_string()),
        other => scalar_to_string(other),
    }
}

fn has_option(options: &[SelectOption], value: &str) -> bool {
    options.iter().any(|o| o.value == value)
}

fn option_values(options: &[SelectOption]) -> String {
    options
        .iter()
        .map(|o| o.value.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

fn dedup_in_order(values: &mut Vec<String>) {
    let mut seen = std::collections::HashSet::new();
    values.retain(|v| seen.insert(v.clone()));
}

/// Inclusive bounds check; returns a description of the bounds when violated.
fn out_of_range(count: usize, min: Option<usize>, max: Option<usize>) -> Option<String> {
    let below = min.is_some_and(|min| count < min);
    let above = max.is_some_and(|max| count > max);
    if !(below || above) {
        return None;
    }
    Some(match (min, max) {
        (Some(min), Some(max)) => format!("between {} and {}", min, max),
        (Some(min), None) => format!("at least {}", min),
        (None, Some(max)) => format!("at most {}", max),
        (None, None) => unreachable!("count bound violated without bounds"),
    })
}

fn item_matches(item_type: ItemType, item: &str) -> bool {
    match item_type {
        ItemType::String | ItemType::Any => true,
        ItemType::Email => is_valid_email(item),
        ItemType::Url => is_valid_url(item),
        ItemType::Hostname => is_valid_hostname(item),
        ItemType::Number => item.parse::<f64>().is_ok_and(|n| n.is_finite()),
        ItemType::Boolean => item == "true" || item == "false",
    }
}

/// `YYYY-MM-DD`, or an RFC 3339 timestamp reduced to its calendar date.
fn parse_calendar_date(input: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .ok()
        .or_else(|| {
            DateTime::parse_from_rfc3339(input)
                .ok()
                .map(|dt| dt.date_naive())
        })
}

fn file_type_matches(pattern: &str, upload: &FileUpload) -> bool {
    let pattern = pattern.trim().to_ascii_lowercase();
    let mime = upload.mime_type.trim().to_ascii_lowercase();
    if let Some(suffix) = pattern.strip_prefix('.') {
        let name = upload.name.to_ascii_lowercase();
        return name
            .rsplit_once('.')
            .is_some_and(|(_, ext)| ext == suffix);
    }
    if let Some(family) = pattern.strip_suffix("/*") {
        return mime
            .split_once('/')
            .is_some_and(|(top, _)| top == family);
    }
    pattern == "*" || pattern == "*/*" || pattern == mime
}
