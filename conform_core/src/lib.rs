// src/lib.rs
pub mod batch;
pub mod catalog;
pub mod check;
pub mod connector;
pub mod dates;
pub mod error;
pub mod fields;
pub mod org;
pub mod settings;
pub mod status;

pub use crate::catalog::{catalog_json_schema, Catalog};
pub use crate::check::{check_catalog, check_connector, DefinitionIssue, Severity};
pub use crate::connector::{
    AuthMethod, ConnectionInstance, Connector, ConnectorVariant, ExpectedResponse, ProbeMethod,
    ProbeOutcome, ProbeRequest, TestConfig,
};
pub use crate::dates::StatusFormatter;
pub use crate::error::ConformError;
pub use crate::fields::{
    read_back, validate_submission, validate_update, Audience, FieldError, FieldErrorKind,
    FieldKind, FieldMode, FieldValue, FormField, Submission, ValidatedConfig, ValidationErrors,
};
pub use crate::settings::{Settings, SettingsError};
