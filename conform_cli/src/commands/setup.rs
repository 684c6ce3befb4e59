use crate::cli::Cli;
use crate::commands::{CommandError, Context, Result};
use crate::output::{format_output, OutputData, Theme};
use conform_core::connector::ConnectorVariant;
use conform_core::fields::{FieldKind, FormField, SelectOption, Submission};
use serde_json::Value;
use std::io::{self, Write};

/// Rounds of re-prompting for fields that failed validation.
const MAX_ROUNDS: usize = 3;

pub fn run(cli: &Cli, name: &str) -> Result<()> {
    let ctx = Context::load(cli)?;
    let (connector, variant) = ctx.variant(name)?;
    let theme = Theme::new(!cli.no_color);

    println!();
    println!(
        "{} {} {}",
        theme.title(&connector.name),
        theme.dim("-"),
        theme.strong(&variant.name)
    );
    if let Some(description) = &variant.description {
        println!("{}", theme.dim(description));
    }
    println!("{}", theme.dim("Press Enter to accept [defaults] or skip optional fields."));
    println!();

    let mut submission = Submission::new();
    for field in &variant.form_fields {
        prompt_into(&mut submission, field, theme)?;
    }

    for round in 1..=MAX_ROUNDS {
        match variant.validate(&submission) {
            Ok(config) => {
                println!();
                let data = OutputData::Validated {
                    variant: variant.id.clone(),
                    config: variant.read_back(&config, ctx.submitter_audience()),
                };
                format_output(&data, &cli.output, theme)?;
                print_next_steps(variant, theme);
                return Ok(());
            }
            Err(errors) if round < MAX_ROUNDS => {
                println!();
                println!("{}", theme.bad("Some values need fixing:"));
                for error in errors.iter() {
                    println!("  {} {}", theme.bad("✗"), error.message);
                }
                println!();
                let mut retry: Vec<&str> = errors.iter().map(|e| e.key.as_str()).collect();
                retry.dedup();
                for key in retry {
                    match variant.field(key) {
                        Some(field) => prompt_into(&mut submission, field, theme)?,
                        None => {
                            submission.remove(key);
                        }
                    }
                }
            }
            Err(errors) => {
                let data = OutputData::FieldErrors {
                    variant: variant.id.clone(),
                    errors: errors.as_slice().to_vec(),
                };
                format_output(&data, &cli.output, theme)?;
                return Err(CommandError::Validation(errors));
            }
        }
    }
    Ok(())
}

fn prompt_into(submission: &mut Submission, field: &FormField, theme: Theme) -> Result<()> {
    match prompt_field(field, theme)? {
        Some(value) => {
            submission.insert(field.key().to_string(), value);
        }
        None => {
            submission.remove(field.key());
        }
    }
    Ok(())
}

/// Asks for one field. `None` leaves the field out of the submission.
fn prompt_field(field: &FormField, theme: Theme) -> Result<Option<Value>> {
    let default = field.base.default_value.as_deref();
    let required = if field.is_required() { "*" } else { "" };

    match &field.kind {
        FieldKind::Markdown(block) => {
            println!("{}", theme.strong(field.label()));
            for line in block.content.lines() {
                println!("  {}", theme.dim(line));
            }
            println!();
            Ok(None)
        }
        FieldKind::Secret(_) => {
            print!("  {}{}: ", theme.strong(field.label()), required);
            io::stdout().flush()?;
            let value = read_secret()?;
            Ok((!value.is_empty()).then_some(Value::String(value)))
        }
        FieldKind::Boolean => {
            let hint = if default == Some("true") { "[Y/n]" } else { "[y/N]" };
            print!("  {}{} {}: ", theme.strong(field.label()), required, theme.dim(hint));
            io::stdout().flush()?;
            let answer = read_line()?.to_lowercase();
            let value = match answer.as_str() {
                "" => default.map(|d| d == "true").unwrap_or(false),
                "y" | "yes" | "true" => true,
                _ => false,
            };
            Ok(Some(Value::Bool(value)))
        }
        FieldKind::Select(rules) => {
            print_options(&rules.options, theme);
            let answer = ask(field, required, default, theme)?;
            Ok(answer.map(|a| Value::String(pick_option(&rules.options, &a))))
        }
        FieldKind::MultiSelect(rules) => {
            print_options(&rules.options, theme);
            let answer = ask(field, required, default, theme)?;
            Ok(answer.map(|a| {
                Value::Array(
                    a.split(',')
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .map(|s| Value::String(pick_option(&rules.options, s)))
                        .collect(),
                )
            }))
        }
        FieldKind::File(_) => {
            let answer = ask(field, required, default, theme)?;
            answer.map(|path| file_upload(&path)).transpose()
        }
        _ => Ok(ask(field, required, default, theme)?.map(Value::String)),
    }
}

fn ask(
    field: &FormField,
    required: &str,
    default: Option<&str>,
    theme: Theme,
) -> Result<Option<String>> {
    let hint = match (default, field.base.placeholder.as_deref()) {
        (Some(d), _) => format!(" [{}]", d),
        (None, Some(p)) => format!(" (e.g. {})", p),
        (None, None) => String::new(),
    };
    print!("  {}{}{}: ", theme.strong(field.label()), required, theme.dim(&hint));
    io::stdout().flush()?;
    let input = read_line()?;
    Ok(if input.is_empty() {
        default.map(str::to_string)
    } else {
        Some(input)
    })
}

fn print_options(options: &[SelectOption], theme: Theme) {
    for (i, option) in options.iter().enumerate() {
        let description = option
            .description
            .as_deref()
            .map(|d| format!(" - {}", d))
            .unwrap_or_default();
        println!(
            "    {} {} {}",
            theme.title(&format!("{:>2}.", i + 1)),
            option.label,
            theme.dim(&format!("({}){}", option.value, description))
        );
    }
}

/// Accepts a 1-based option number or the option value itself.
fn pick_option(options: &[SelectOption], answer: &str) -> String {
    answer
        .parse::<usize>()
        .ok()
        .and_then(|n| n.checked_sub(1))
        .and_then(|i| options.get(i))
        .map(|o| o.value.clone())
        .unwrap_or_else(|| answer.to_string())
}

fn file_upload(path: &str) -> Result<Value> {
    let path = std::path::Path::new(path);
    let size = std::fs::metadata(path)?.len();
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default()
        .to_string();
    let mime_type = match path.extension().and_then(|e| e.to_str()) {
        Some("json") => "application/json",
        Some("pem") | Some("crt") => "application/x-pem-file",
        Some("csv") => "text/csv",
        Some("txt") => "text/plain",
        _ => "application/octet-stream",
    };
    Ok(serde_json::json!({ "name": name, "mimeType": mime_type, "size": size }))
}

fn print_next_steps(variant: &ConnectorVariant, theme: Theme) {
    println!();
    println!(
        "{} Preview the connection test with {}",
        theme.good("Tip:"),
        theme.title(&format!("conform probe {} --file <submission.json>", variant.id))
    );
}

fn read_line() -> Result<String> {
    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().to_string())
}

fn read_secret() -> Result<String> {
    // Use rpassword for hidden input
    match rpassword::read_password() {
        Ok(password) => Ok(password.trim().to_string()),
        Err(_) => {
            // Fallback to regular input if rpassword fails (e.g., in non-TTY)
            read_line()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pick_option_by_number_or_value() {
        let options = vec![
            SelectOption::new("production", "Production"),
            SelectOption::new("sandbox", "Sandbox"),
        ];
        assert_eq!(pick_option(&options, "2"), "sandbox");
        assert_eq!(pick_option(&options, "production"), "production");
        assert_eq!(pick_option(&options, "0"), "0");
        assert_eq!(pick_option(&options, "9"), "9");
    }

    #[test]
    fn test_file_upload_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("service-account.json");
        std::fs::write(&path, b"{}").unwrap();
        let value = file_upload(path.to_str().unwrap()).unwrap();
        assert_eq!(value["name"], "service-account.json");
        assert_eq!(value["mimeType"], "application/json");
        assert_eq!(value["size"], 2);
    }
}
