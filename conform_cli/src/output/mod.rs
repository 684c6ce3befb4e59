use crate::cli::OutputFormat;
use crate::commands::Result;
use conform_core::check::DefinitionIssue;
use conform_core::connector::{Connector, ProbeOutcome, ProbeRequest};
use conform_core::fields::FieldError;
use conform_core::status::{ConnectorStatus, OrgNudge};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

mod pretty;
pub use pretty::{format_pretty, Theme};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectorSummary {
    pub id: String,
    pub name: String,
    pub category: Option<String>,
    pub enabled: bool,
    pub variants: Vec<String>,
    pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchItem {
    pub index: usize,
    pub valid: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<FieldError>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum OutputData {
    ConnectorList(Vec<ConnectorSummary>),
    ConnectorDetail(Box<Connector>),
    Validated {
        variant: String,
        config: Map<String, Value>,
    },
    FieldErrors {
        variant: String,
        errors: Vec<FieldError>,
    },
    Probe {
        variant: String,
        request: ProbeRequest,
        outcome: Option<ProbeOutcome>,
    },
    Batch {
        variant: String,
        results: Vec<BatchItem>,
    },
    Status {
        connectors: Vec<ConnectorStatus>,
        nudges: Vec<OrgNudge>,
    },
    DateStatus {
        date: String,
        days: i64,
        label: String,
    },
    Issues(Vec<DefinitionIssue>),
    Schema(Value),
}

pub fn format_output(data: &OutputData, format: &OutputFormat, theme: Theme) -> Result<()> {
    match format {
        OutputFormat::Json => match data {
            OutputData::Schema(schema) => println!("{}", serde_json::to_string_pretty(schema)?),
            _ => println!("{}", serde_json::to_string_pretty(data)?),
        },
        OutputFormat::Yaml => {
            println!("{}", serde_yaml::to_string(data)?);
        }
        OutputFormat::Text => {
            format_text_output(data)?;
        }
        OutputFormat::Pretty => {
            pretty::format_pretty_output(data, theme)?;
        }
    }
    Ok(())
}

fn format_text_output(data: &OutputData) -> Result<()> {
    match data {
        OutputData::ConnectorList(connectors) => {
            for c in connectors {
                println!(
                    "{}\t{}\t{}\t{}",
                    c.id,
                    c.name,
                    c.category.as_deref().unwrap_or("-"),
                    c.status
                );
            }
        }
        OutputData::ConnectorDetail(connector) => {
            println!("{} ({})", connector.name, connector.id);
            for variant in &connector.variants {
                println!("{}: {}", variant.id, variant.auth_method.as_str());
                for field in &variant.form_fields {
                    println!("  {}", field.describe());
                }
            }
        }
        OutputData::Validated { config, .. } => {
            for (key, value) in config {
                println!("{}={}", key, text_value(value));
            }
        }
        OutputData::FieldErrors { errors, .. } => {
            for error in errors {
                println!("{}\t{}\t{}", error.key, error.kind.code_str(), error.message);
            }
        }
        OutputData::Probe {
            request, outcome, ..
        } => {
            println!(
                "{}\t{}\t{}ms",
                request.method.verb().unwrap_or("-"),
                request.url.as_deref().unwrap_or("-"),
                request.timeout_ms
            );
            if let Some(outcome) = outcome {
                println!(
                    "{}\t{}",
                    if outcome.success { "success" } else { "failed" },
                    outcome.message
                );
            }
        }
        OutputData::Batch { results, .. } => {
            for item in results {
                let codes: Vec<String> = item
                    .errors
                    .iter()
                    .map(|e| format!("{}:{}", e.key, e.kind.code_str()))
                    .collect();
                println!(
                    "{}\t{}\t{}",
                    item.index,
                    if item.valid { "ok" } else { "invalid" },
                    codes.join(",")
                );
            }
        }
        OutputData::Status { connectors, nudges } => {
            for status in connectors {
                println!("{}\t{}", status.id, status.headline());
            }
            for nudge in nudges {
                println!("{}\t{}\t{}", nudge.organization, nudge.plugin_id, nudge.label);
            }
        }
        OutputData::DateStatus { label, .. } => {
            println!("{}", label);
        }
        OutputData::Issues(issues) => {
            for issue in issues {
                println!("{}", issue);
            }
        }
        OutputData::Schema(schema) => {
            println!("{}", serde_json::to_string_pretty(schema)?);
        }
    }
    Ok(())
}

fn text_value(value: &Value) -> String {
    match value {
        Value::Null => "<hidden>".to_string(),
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(text_value)
            .collect::<Vec<_>>()
            .join(","),
        other => other.to_string(),
    }
}
