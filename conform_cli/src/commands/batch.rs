use crate::cli::Cli;
use crate::commands::{CommandError, Context, Result};
use crate::output::{format_output, BatchItem, OutputData, Theme};
use conform_core::batch::validate_batch;
use conform_core::fields::Submission;
use serde_json::Value;
use std::path::Path;

pub fn run(cli: &Cli, variant_id: &str, file: &Path) -> Result<()> {
    let ctx = Context::load(cli)?;
    let (_, variant) = ctx.variant(variant_id)?;
    let submissions = read_submissions(&std::fs::read_to_string(file)?)?;

    let results: Vec<BatchItem> = validate_batch(variant, &submissions)
        .into_iter()
        .enumerate()
        .map(|(index, result)| BatchItem {
            index,
            valid: result.is_ok(),
            errors: result.err().map(|e| e.into_vec()).unwrap_or_default(),
        })
        .collect();
    let failed = results.iter().filter(|r| !r.valid).count();
    let total = results.len();

    format_output(
        &OutputData::Batch {
            variant: variant.id.clone(),
            results,
        },
        &cli.output,
        Theme::new(!cli.no_color),
    )?;

    if failed > 0 {
        return Err(CommandError::BatchFailures { failed, total });
    }
    Ok(())
}

/// A JSON array of objects, or one JSON object per non-blank line.
fn read_submissions(content: &str) -> Result<Vec<Submission>> {
    let values: Vec<Value> = if content.trim_start().starts_with('[') {
        serde_json::from_str(content)?
    } else {
        content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(serde_json::from_str)
            .collect::<std::result::Result<_, _>>()?
    };
    values
        .into_iter()
        .enumerate()
        .map(|(index, value)| match value {
            Value::Object(map) => Ok(map),
            _ => Err(CommandError::InvalidInput(format!(
                "submission {} is not a JSON object",
                index
            ))),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_submissions_array_and_lines() {
        let array = read_submissions(r#"[{"a": "1"}, {"a": "2"}]"#).unwrap();
        assert_eq!(array.len(), 2);

        let lines = read_submissions("{\"a\": \"1\"}\n\n{\"a\": \"2\"}\n").unwrap();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1]["a"], "2");

        assert!(matches!(
            read_submissions("[1, 2]"),
            Err(CommandError::InvalidInput(_))
        ));
    }
}
