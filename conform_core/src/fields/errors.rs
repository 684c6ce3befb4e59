use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Why a single field failed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub enum FieldErrorKind {
    MissingRequiredField,
    LengthOutOfRange,
    PatternMismatch,
    FormatInvalid,
    InvalidOption,
    SelectionCountOutOfRange,
    ItemCountOutOfRange,
    DateOutOfRange,
    UnacceptedFileType,
    FileTooLarge,
    UnexpectedField,
    ReadOnlyField,
}

impl FieldErrorKind {
    pub fn code_str(&self) -> &'static str {
        match self {
            FieldErrorKind::MissingRequiredField => "missing_required_field",
            FieldErrorKind::LengthOutOfRange => "length_out_of_range",
            FieldErrorKind::PatternMismatch => "pattern_mismatch",
            FieldErrorKind::FormatInvalid => "format_invalid",
            FieldErrorKind::InvalidOption => "invalid_option",
            FieldErrorKind::SelectionCountOutOfRange => "selection_count_out_of_range",
            FieldErrorKind::ItemCountOutOfRange => "item_count_out_of_range",
            FieldErrorKind::DateOutOfRange => "date_out_of_range",
            FieldErrorKind::UnacceptedFileType => "unaccepted_file_type",
            FieldErrorKind::FileTooLarge => "file_too_large",
            FieldErrorKind::UnexpectedField => "unexpected_field",
            FieldErrorKind::ReadOnlyField => "read_only_field",
        }
    }
}

impl std::fmt::Display for FieldErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct FieldError {
    pub key: String,
    pub kind: FieldErrorKind,
    pub message: String,
}

impl FieldError {
    pub fn new(key: impl Into<String>, kind: FieldErrorKind, message: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            kind,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for FieldError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {} ({})", self.key, self.message, self.kind)
    }
}

/// Every field-level failure of one submission, in field-definition order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema, thiserror::Error)]
#[error("{} field error(s) in submission", .errors.len())]
pub struct ValidationErrors {
    errors: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn new(errors: Vec<FieldError>) -> Self {
        Self { errors }
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.errors.iter()
    }

    pub fn as_slice(&self) -> &[FieldError] {
        &self.errors
    }

    pub fn into_vec(self) -> Vec<FieldError> {
        self.errors
    }

    /// Errors reported for one field key.
    pub fn for_key<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a FieldError> + 'a {
        self.errors.iter().filter(move |e| e.key == key)
    }

    pub fn kinds_for(&self, key: &str) -> Vec<FieldErrorKind> {
        self.for_key(key).map(|e| e.kind).collect()
    }

    pub fn has(&self, key: &str, kind: FieldErrorKind) -> bool {
        self.for_key(key).any(|e| e.kind == kind)
    }

    /// Groups messages by field key so a form can highlight every invalid field.
    pub fn by_key(&self) -> BTreeMap<String, Vec<String>> {
        let mut grouped: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for error in &self.errors {
            grouped
                .entry(error.key.clone())
                .or_default()
                .push(error.message.clone());
        }
        grouped
    }
}

impl IntoIterator for ValidationErrors {
    type Item = FieldError;
    type IntoIter = std::vec::IntoIter<FieldError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grouping_by_key() {
        let errors = ValidationErrors::new(vec![
            FieldError::new("name", FieldErrorKind::LengthOutOfRange, "too short"),
            FieldError::new("email", FieldErrorKind::FormatInvalid, "not an email"),
            FieldError::new("name", FieldErrorKind::PatternMismatch, "bad pattern"),
        ]);

        assert_eq!(errors.to_string(), "3 field error(s) in submission");
        assert_eq!(
            errors.kinds_for("name"),
            vec![
                FieldErrorKind::LengthOutOfRange,
                FieldErrorKind::PatternMismatch
            ]
        );
        let grouped = errors.by_key();
        assert_eq!(grouped["name"].len(), 2);
        assert_eq!(grouped["email"], vec!["not an email".to_string()]);
    }

    #[test]
    fn test_kind_serializes_by_name() {
        let value = serde_json::to_value(FieldErrorKind::MissingRequiredField).unwrap();
        assert_eq!(value, "MissingRequiredField");
        assert_eq!(
            FieldErrorKind::SelectionCountOutOfRange.code_str(),
            "selection_count_out_of_range"
        );
    }
}
