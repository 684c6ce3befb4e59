//! Pretty formatter for terminal output.
//!
//! Bold titles, dimmed metadata, tables for anything columnar. Every color
//! goes through [`Theme`] so `--no-color` produces plain text.

use super::{BatchItem, ConnectorSummary, OutputData};
use crate::commands::Result;
use comfy_table::{
    modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, presets::UTF8_FULL_CONDENSED, Cell,
    ContentArrangement, Table,
};
use conform_core::check::{DefinitionIssue, Severity};
use conform_core::connector::Connector;
use conform_core::fields::FieldError;
use conform_core::status::{ConnectorStatus, OrgNudge};
use owo_colors::OwoColorize;
use serde_json::{Map, Value};

/// Terminal width for formatting (default fallback)
const DEFAULT_WIDTH: usize = 80;

const HIDDEN: &str = "(hidden)";

#[derive(Debug, Clone, Copy)]
pub struct Theme {
    pub color: bool,
}

impl Theme {
    pub fn new(color: bool) -> Self {
        Self { color }
    }

    pub fn title(&self, text: &str) -> String {
        self.paint(text, |s| s.cyan().bold().to_string())
    }

    pub fn strong(&self, text: &str) -> String {
        self.paint(text, |s| s.bold().to_string())
    }

    pub fn dim(&self, text: &str) -> String {
        self.paint(text, |s| s.dimmed().to_string())
    }

    pub fn good(&self, text: &str) -> String {
        self.paint(text, |s| s.green().to_string())
    }

    pub fn warn(&self, text: &str) -> String {
        self.paint(text, |s| s.yellow().to_string())
    }

    pub fn bad(&self, text: &str) -> String {
        self.paint(text, |s| s.red().bold().to_string())
    }

    pub fn link(&self, text: &str) -> String {
        self.paint(text, |s| s.blue().to_string())
    }

    fn paint(&self, text: &str, style: impl Fn(&str) -> String) -> String {
        if self.color {
            style(text)
        } else {
            text.to_string()
        }
    }

    fn table(&self) -> Table {
        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .apply_modifier(UTF8_ROUND_CORNERS)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_width(terminal_width() as u16);
        table
    }
}

pub(super) fn format_pretty_output(data: &OutputData, theme: Theme) -> Result<()> {
    match data {
        OutputData::ConnectorList(connectors) => print_connector_list(connectors, theme),
        OutputData::ConnectorDetail(connector) => print_connector(connector, theme),
        OutputData::Validated { variant, config } => {
            println!(
                "{} {}",
                theme.good("✓ Valid configuration for"),
                theme.strong(variant)
            );
            println!();
            print!("{}", format_pretty(&Value::Object(config.clone()), theme));
        }
        OutputData::FieldErrors { variant, errors } => print_field_errors(variant, errors, theme),
        OutputData::Probe {
            variant,
            request,
            outcome,
        } => {
            println!("{} {}", theme.title("Connection test for"), theme.strong(variant));
            println!();
            println!(
                "  {}: {}",
                theme.dim("method"),
                request
                    .method
                    .verb()
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("{:?}", request.method))
            );
            if let Some(url) = &request.url {
                println!("  {}: {}", theme.dim("url"), theme.link(url));
            }
            println!("  {}: {} ms", theme.dim("timeout"), request.timeout_ms);
            if let Some(outcome) = outcome {
                println!();
                if outcome.success {
                    println!("{} {}", theme.good("✓"), outcome.message);
                } else {
                    println!("{} {}", theme.bad("✗"), outcome.message);
                }
                if let Some(details) = &outcome.details {
                    println!("  {}", theme.dim(details));
                }
            }
        }
        OutputData::Batch { variant, results } => print_batch(variant, results, theme),
        OutputData::Status { connectors, nudges } => print_status(connectors, nudges, theme),
        OutputData::DateStatus { date, days, label } => {
            let painted = if *days < 0 {
                theme.bad(label)
            } else if *days <= 1 {
                theme.warn(label)
            } else {
                theme.good(label)
            };
            println!("{}  {}", painted, theme.dim(date));
        }
        OutputData::Issues(issues) => print_issues(issues, theme),
        OutputData::Schema(schema) => {
            println!("{}", serde_json::to_string_pretty(schema)?);
        }
    }
    Ok(())
}

fn print_connector_list(connectors: &[ConnectorSummary], theme: Theme) {
    if connectors.is_empty() {
        println!("{}", theme.warn("No connectors match"));
        return;
    }
    println!("{}", theme.title("Connectors"));
    println!();

    let mut table = theme.table();
    table.set_header(vec!["Id", "Name", "Category", "Variants", "Status"]);
    for c in connectors {
        let name = if c.enabled {
            c.name.clone()
        } else {
            format!("{} (disabled)", c.name)
        };
        table.add_row(vec![
            Cell::new(&c.id),
            Cell::new(name),
            Cell::new(c.category.as_deref().unwrap_or("-")),
            Cell::new(c.variants.join(", ")),
            Cell::new(&c.status),
        ]);
    }
    println!("{}", table);
    println!();
    println!(
        "{} Use {} to see a connector's form fields",
        theme.good("Tip:"),
        theme.title("conform show <connector>")
    );
}

fn print_connector(connector: &Connector, theme: Theme) {
    println!(
        "{} {}",
        theme.title(&connector.name),
        theme.dim(&format!("({})", connector.id))
    );
    println!("{}", connector.description);
    if let Some(url) = &connector.support_url {
        println!("{}: {}", theme.dim("support"), theme.link(url));
    }

    for variant in &connector.variants {
        println!();
        let marker = if variant.recommended {
            theme.good(" recommended")
        } else {
            String::new()
        };
        println!(
            "{} {} {}{}",
            theme.strong("▸"),
            theme.strong(&variant.name),
            theme.dim(&format!("[{}] {}", variant.id, variant.auth_method.as_str())),
            marker
        );
        if let Some(description) = &variant.description {
            println!("  {}", theme.dim(description));
        }
        for field in &variant.form_fields {
            println!("  {} {}", theme.dim("•"), field.describe());
        }
        let test = &variant.test_config;
        let target = test.endpoint.as_deref().unwrap_or("(no endpoint)");
        println!(
            "  {} {} {} {}",
            theme.dim("test:"),
            test.method.verb().unwrap_or("offline"),
            theme.link(target),
            theme.dim(&format!("{} ms", test.timeout_ms))
        );
    }
}

fn print_field_errors(variant: &str, errors: &[FieldError], theme: Theme) {
    println!(
        "{} {}",
        theme.bad(&format!("✗ {} field error(s) for", errors.len())),
        theme.strong(variant)
    );
    println!();
    let mut table = theme.table();
    table.set_header(vec!["Field", "Error", "Message"]);
    for error in errors {
        table.add_row(vec![
            Cell::new(&error.key),
            Cell::new(error.kind.code_str()),
            Cell::new(&error.message),
        ]);
    }
    println!("{}", table);
}

fn print_batch(variant: &str, results: &[BatchItem], theme: Theme) {
    let invalid: Vec<&BatchItem> = results.iter().filter(|r| !r.valid).collect();
    println!(
        "{} {}: {} valid, {} invalid",
        theme.title("Batch validation for"),
        theme.strong(variant),
        theme.good(&(results.len() - invalid.len()).to_string()),
        if invalid.is_empty() {
            "0".to_string()
        } else {
            theme.bad(&invalid.len().to_string())
        }
    );
    if invalid.is_empty() {
        return;
    }
    println!();
    let mut table = theme.table();
    table.set_header(vec!["#", "Field", "Error"]);
    for item in invalid {
        for error in &item.errors {
            table.add_row(vec![
                Cell::new(item.index),
                Cell::new(&error.key),
                Cell::new(&error.message),
            ]);
        }
    }
    println!("{}", table);
}

fn print_status(connectors: &[ConnectorStatus], nudges: &[OrgNudge], theme: Theme) {
    println!("{}", theme.title("Integration status"));
    println!();
    let mut table = theme.table();
    table.set_header(vec!["Connector", "Status", "Next nudge"]);
    for status in connectors {
        let headline = status.headline();
        let painted = match &status.due {
            Some(due) if due.overdue => theme.bad(&headline),
            Some(due) if due.due_soon => theme.warn(&headline),
            _ if status.connected => theme.good(&headline),
            _ => headline,
        };
        let nudge = status
            .nudge
            .as_ref()
            .map(|n| n.label.clone())
            .unwrap_or_else(|| "-".to_string());
        table.add_row(vec![Cell::new(&status.name), Cell::new(painted), Cell::new(nudge)]);
    }
    println!("{}", table);

    if nudges.is_empty() {
        return;
    }
    println!();
    println!("{}", theme.title("Organization nudges"));
    println!();
    let mut table = theme.table();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_header(vec!["Organization", "Integration", "Date", "Nudge"]);
    for nudge in nudges {
        let label = if nudge.days_remaining < 0 {
            theme.bad(&nudge.label)
        } else {
            nudge.label.clone()
        };
        table.add_row(vec![
            Cell::new(&nudge.organization),
            Cell::new(&nudge.plugin_name),
            Cell::new(&nudge.date),
            Cell::new(label),
        ]);
    }
    println!("{}", table);
}

fn print_issues(issues: &[DefinitionIssue], theme: Theme) {
    if issues.is_empty() {
        println!("{}", theme.good("✓ No definition problems found"));
        return;
    }
    for issue in issues {
        let level = match issue.severity {
            Severity::Error => theme.bad("error"),
            Severity::Warning => theme.warn("warning"),
        };
        println!("{} {} {}", level, theme.strong(&issue.location), issue.message);
    }
    let errors = issues
        .iter()
        .filter(|i| i.severity == Severity::Error)
        .count();
    println!();
    println!(
        "{} error(s), {} warning(s)",
        errors,
        issues.len() - errors
    );
}

// ============================================================================
// Generic values
// ============================================================================

/// Formats a JSON value as indented `key: value` lines.
pub fn format_pretty(value: &Value, theme: Theme) -> String {
    let mut output = String::new();
    match value {
        Value::Object(obj) => format_object(obj, &mut output, 0, theme),
        other => {
            output.push_str(&format_scalar(other, theme));
            output.push('\n');
        }
    }
    output
}

fn format_object(obj: &Map<String, Value>, output: &mut String, depth: usize, theme: Theme) {
    let indent = "  ".repeat(depth);
    for (key, value) in obj {
        match value {
            Value::Object(nested) => {
                output.push_str(&format!("{}{}:\n", indent, theme.title(key)));
                format_object(nested, output, depth + 1, theme);
            }
            Value::Array(items) if items.iter().any(|v| v.is_object()) => {
                output.push_str(&format!("{}{}:\n", indent, theme.title(key)));
                for item in items {
                    format_object(
                        item.as_object().unwrap_or(&Map::new()),
                        output,
                        depth + 1,
                        theme,
                    );
                }
            }
            other => {
                output.push_str(&format!(
                    "{}{}: {}\n",
                    indent,
                    theme.dim(key),
                    format_scalar(other, theme)
                ));
            }
        }
    }
}

fn format_scalar(value: &Value, theme: Theme) -> String {
    match value {
        Value::Null => theme.dim(HIDDEN),
        Value::Bool(true) => theme.good("true"),
        Value::Bool(false) => theme.bad("false"),
        Value::Number(n) => n.to_string(),
        Value::String(s) => truncate_str(s, terminal_width().saturating_sub(20).max(40)),
        Value::Array(items) => items
            .iter()
            .map(|v| match v {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect::<Vec<_>>()
            .join(", "),
        Value::Object(obj) => format!("{{{}...}}", obj.len()),
    }
}

fn truncate_str(s: &str, max_len: usize) -> String {
    let first_line = s.lines().next().unwrap_or(s);
    if first_line.chars().count() <= max_len {
        first_line.to_string()
    } else {
        let truncated: String = first_line.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", truncated)
    }
}

fn terminal_width() -> usize {
    terminal_size::terminal_size()
        .map(|(w, _)| w.0 as usize)
        .unwrap_or(DEFAULT_WIDTH)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_plain_theme_has_no_escapes() {
        let theme = Theme::new(false);
        assert_eq!(theme.title("Connectors"), "Connectors");
        assert_eq!(theme.bad("error"), "error");
        assert!(Theme::new(true).title("Connectors").contains('\u{1b}'));
    }

    #[test]
    fn test_format_pretty_hides_masked_values() {
        let out = format_pretty(
            &json!({
                "subdomain": "mycompany",
                "clientSecret": null,
                "objects": ["contacts", "deals"]
            }),
            Theme::new(false),
        );
        assert!(out.contains("subdomain: mycompany"));
        assert!(out.contains("clientSecret: (hidden)"));
        assert!(out.contains("objects: contacts, deals"));
    }

    #[test]
    fn test_truncate_str() {
        let long = "This is a very long string that should be truncated";
        let truncated = truncate_str(long, 20);
        assert!(truncated.ends_with("..."));
        assert!(truncated.chars().count() <= 20);
    }
}
