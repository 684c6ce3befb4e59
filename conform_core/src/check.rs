//! Static checks over catalog definitions.
//!
//! Validation of submissions assumes well-formed field definitions; these
//! checks catch the definitions that would make a form impossible to fill in
//! or a connection test impossible to run.

use crate::catalog::Catalog;
use crate::connector::{Connector, ConnectorVariant};
use crate::dates::parse_instant;
use crate::fields::{FieldKind, FieldMode, FormField, SelectOption};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefinitionIssue {
    pub severity: Severity,
    /// Dotted path, e.g. `salesforce/salesforce-oauth/clientId`
    pub location: String,
    pub message: String,
}

impl fmt::Display for DefinitionIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level = match self.severity {
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        write!(f, "{}: {}: {}", level, self.location, self.message)
    }
}

#[derive(Default)]
struct Report {
    issues: Vec<DefinitionIssue>,
}

impl Report {
    fn error(&mut self, location: &str, message: impl Into<String>) {
        self.push(Severity::Error, location, message.into());
    }

    fn warn(&mut self, location: &str, message: impl Into<String>) {
        self.push(Severity::Warning, location, message.into());
    }

    fn push(&mut self, severity: Severity, location: &str, message: String) {
        self.issues.push(DefinitionIssue {
            severity,
            location: location.to_string(),
            message,
        });
    }
}

/// Checks a whole catalog. An empty result means every definition is usable.
pub fn check_catalog(catalog: &Catalog) -> Vec<DefinitionIssue> {
    let mut report = Report::default();

    let mut ids = HashSet::new();
    let mut slugs = HashSet::new();
    let mut variant_ids = HashSet::new();
    for plugin in &catalog.plugins {
        if !ids.insert(plugin.id.as_str()) {
            report.error(&plugin.id, "duplicate connector id");
        }
        if !slugs.insert(plugin.slug.as_str()) {
            report.error(&plugin.id, format!("duplicate slug '{}'", plugin.slug));
        }
        for variant in &plugin.variants {
            if !variant_ids.insert(variant.id.as_str()) {
                report.error(
                    &format!("{}/{}", plugin.id, variant.id),
                    "variant id is used by another variant",
                );
            }
        }
        check_connector_into(plugin, &mut report);
    }

    for org in &catalog.organizations {
        let location = format!("organizations/{}", org.id);
        for plugin in &org.plugins {
            if catalog.plugin(&plugin.id).is_none() {
                report.error(
                    &location,
                    format!("plugin '{}' is not in the catalog", plugin.id),
                );
            }
            check_date(&mut report, &location, "nextNudgeDate", plugin.next_nudge_date.as_deref());
        }
        if !org.counts_match() {
            let (prioritized, connected) = org.tally();
            report.warn(
                &location,
                format!(
                    "counters say {} prioritized / {} connected, plugins list has {} / {}",
                    org.prioritized_integrations, org.connected_integrations, prioritized, connected
                ),
            );
        }
    }

    debug!(target: "conform.check", issues = report.issues.len(), "catalog checked");
    report.issues
}

/// Checks a single connector and its variants.
pub fn check_connector(connector: &Connector) -> Vec<DefinitionIssue> {
    let mut report = Report::default();
    check_connector_into(connector, &mut report);
    report.issues
}

fn check_connector_into(connector: &Connector, report: &mut Report) {
    let location = connector.id.as_str();
    if connector.variants.is_empty() {
        report.error(location, "connector has no variants");
    }
    if connector.variants.iter().filter(|v| v.recommended).count() > 1 {
        report.warn(location, "more than one variant is marked recommended");
    }
    if connector.prioritized && connector.priority_due_date.is_none() {
        report.warn(location, "prioritized connector has no priorityDueDate");
    }
    if connector.connected && connector.connected_date.is_none() {
        report.warn(location, "connected connector has no connectedDate");
    }
    check_date(report, location, "priorityDueDate", connector.priority_due_date.as_deref());
    check_date(report, location, "nextNudgeDate", connector.next_nudge_date.as_deref());
    check_date(report, location, "connectedDate", connector.connected_date.as_deref());

    for variant in &connector.variants {
        check_variant(connector, variant, report);
    }
}

fn check_variant(connector: &Connector, variant: &ConnectorVariant, report: &mut Report) {
    let location = format!("{}/{}", connector.id, variant.id);

    let mut keys = HashSet::new();
    let mut field_ids = HashSet::new();
    for field in &variant.form_fields {
        if !keys.insert(field.key()) {
            report.error(&location, format!("duplicate field key '{}'", field.key()));
        }
        if !field_ids.insert(field.base.id.as_str()) {
            report.error(&location, format!("duplicate field id '{}'", field.base.id));
        }
        check_field(&format!("{}/{}", location, field.key()), field, report);
    }

    let test = &variant.test_config;
    if test.timeout_ms == 0 {
        report.error(&location, "testConfig.timeoutMs must be positive");
    }
    if test.method.is_http() && test.endpoint.is_none() {
        report.error(
            &location,
            format!("testConfig uses {:?} but has no endpoint", test.method),
        );
    }
    for key in test.placeholders() {
        match variant.field(&key) {
            None => report.error(
                &location,
                format!("endpoint placeholder '${{{}}}' names no field", key),
            ),
            Some(field) if field.is_display_only() => report.error(
                &location,
                format!("endpoint placeholder '${{{}}}' names a markdown block", key),
            ),
            Some(field) if !field.is_required() && field.base.default_value.is_none() => {
                report.warn(
                    &location,
                    format!(
                        "endpoint placeholder '${{{}}}' names an optional field with no default",
                        key
                    ),
                )
            }
            Some(_) => {}
        }
    }
    if let Some(pattern) = &test.expected_response.body_pattern {
        if let Err(err) = Regex::new(pattern) {
            report.error(&location, format!("bodyPattern does not compile: {}", err));
        }
    }
}

fn check_field(location: &str, field: &FormField, report: &mut Report) {
    if field.mode() == FieldMode::ReadOnly
        && field.is_required()
        && field.base.default_value.is_none()
        && !field.is_display_only()
    {
        report.error(
            location,
            "required READ_ONLY field has no defaultValue, so no submission can satisfy it",
        );
    }

    match &field.kind {
        FieldKind::String(rules) => {
            check_text(location, rules.min_length, rules.max_length, rules.pattern.as_deref(), report)
        }
        FieldKind::Secret(rules) => check_text(
            location,
            rules.text.min_length,
            rules.text.max_length,
            rules.text.pattern.as_deref(),
            report,
        ),
        FieldKind::Select(rules) => {
            check_options(location, &rules.options, report);
            if let Some(default) = &field.base.default_value {
                if !rules.allow_custom && !rules.options.iter().any(|o| &o.value == default) {
                    report.error(
                        location,
                        format!("defaultValue '{}' is not one of the options", default),
                    );
                }
            }
        }
        FieldKind::MultiSelect(rules) => {
            check_options(location, &rules.options, report);
            check_bounds(location, "selections", rules.min_selections, rules.max_selections, report);
            if let Some(min) = rules.min_selections {
                if min > rules.options.len() {
                    report.error(
                        location,
                        format!(
                            "minSelections {} exceeds the {} available options",
                            min,
                            rules.options.len()
                        ),
                    );
                }
            }
        }
        FieldKind::Array(rules) => {
            check_bounds(location, "items", rules.min_items, rules.max_items, report)
        }
        FieldKind::Date(rules) => {
            if let (Some(min), Some(max)) = (rules.min_date, rules.max_date) {
                if min > max {
                    report.error(location, format!("minDate {} is after maxDate {}", min, max));
                }
            }
        }
        FieldKind::File(rules) => {
            if rules.max_size == Some(0) {
                report.error(location, "maxSize of 0 rejects every file");
            }
        }
        FieldKind::Boolean => {
            if let Some(default) = &field.base.default_value {
                if default != "true" && default != "false" {
                    report.error(location, "boolean defaultValue must be 'true' or 'false'");
                }
            }
        }
        FieldKind::Email | FieldKind::Url | FieldKind::Hostname | FieldKind::Markdown(_) => {}
    }
}

fn check_text(
    location: &str,
    min: Option<usize>,
    max: Option<usize>,
    pattern: Option<&str>,
    report: &mut Report,
) {
    check_bounds(location, "length", min, max, report);
    if let Some(pattern) = pattern {
        if let Err(err) = Regex::new(&format!("^(?:{})$", pattern)) {
            report.error(location, format!("pattern does not compile: {}", err));
        }
    }
}

fn check_bounds(
    location: &str,
    what: &str,
    min: Option<usize>,
    max: Option<usize>,
    report: &mut Report,
) {
    if let (Some(min), Some(max)) = (min, max) {
        if min > max {
            report.error(location, format!("minimum {} {} exceeds maximum {}", what, min, max));
        }
    }
}

fn check_options(location: &str, options: &[SelectOption], report: &mut Report) {
    if options.is_empty() {
        report.error(location, "select field has no options");
    }
    let mut seen = HashSet::new();
    for option in options {
        if !seen.insert(option.value.as_str()) {
            report.error(location, format!("option value '{}' is repeated", option.value));
        }
    }
}

fn check_date(report: &mut Report, location: &str, name: &str, value: Option<&str>) {
    if let Some(value) = value {
        if parse_instant(value).is_err() {
            report.error(location, format!("{} '{}' is not an ISO date", name, value));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::{MultiSelectRules, SelectRules, TextRules};

    #[test]
    fn test_demo_catalog_is_clean() {
        let issues = check_catalog(Catalog::demo());
        assert!(issues.is_empty(), "{:?}", issues);
    }

    #[test]
    fn test_bad_definitions_are_reported() {
        let mut catalog = Catalog::demo().clone();
        let variant = &mut catalog.plugins[0].variants[0];
        variant.form_fields.push(FormField::new(
            "dup",
            "subdomain",
            "Again",
            FieldKind::String(TextRules {
                min_length: Some(10),
                max_length: Some(2),
                pattern: Some("([a-z".to_string()),
            }),
        ));
        variant.form_fields.push(
            FormField::new(
                "region",
                "region",
                "Region",
                FieldKind::Select(SelectRules {
                    options: vec![SelectOption::new("us", "US")],
                    allow_custom: false,
                }),
            )
            .with_default("eu"),
        );
        variant.form_fields.push(FormField::new(
            "scopes",
            "scopes",
            "Scopes",
            FieldKind::MultiSelect(MultiSelectRules {
                options: Vec::new(),
                min_selections: Some(1),
                max_selections: None,
            }),
        ));
        variant.test_config.endpoint = Some("https://${tenant}.example.com".to_string());
        variant.test_config.timeout_ms = 0;

        let issues = check_catalog(&catalog);
        let messages: Vec<String> = issues.iter().map(|i| i.message.clone()).collect();
        let has = |needle: &str| messages.iter().any(|m| m.contains(needle));
        assert!(has("duplicate field key 'subdomain'"));
        assert!(has("minimum length 10 exceeds maximum 2"));
        assert!(has("pattern does not compile"));
        assert!(has("defaultValue 'eu' is not one of the options"));
        assert!(has("select field has no options"));
        assert!(has("minSelections 1 exceeds"));
        assert!(has("'${tenant}' names no field"));
        assert!(has("timeoutMs must be positive"));
        assert!(issues.iter().all(|i| i.severity == Severity::Error));
    }

    #[test]
    fn test_read_only_required_without_default() {
        let field = FormField::new("r", "region", "Region", FieldKind::Hostname)
            .required()
            .with_mode(FieldMode::ReadOnly);
        let mut report = Report::default();
        check_field("x/region", &field, &mut report);
        assert_eq!(report.issues.len(), 1);
        assert_eq!(
            report.issues[0].to_string(),
            "error: x/region: required READ_ONLY field has no defaultValue, so no submission can satisfy it"
        );
    }

    #[test]
    fn test_org_mismatch_is_a_warning() {
        let mut catalog = Catalog::demo().clone();
        catalog.organizations[0].connected_integrations = 5;
        catalog.organizations[0].plugins[0].id = "zendesk".to_string();
        let issues = check_catalog(&catalog);
        assert!(issues
            .iter()
            .any(|i| i.severity == Severity::Warning && i.location == "organizations/1"));
        assert!(issues
            .iter()
            .any(|i| i.message.contains("'zendesk' is not in the catalog")));
    }
}
