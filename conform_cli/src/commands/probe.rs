use crate::cli::{Cli, SubmissionArgs};
use crate::commands::{read_submission, CommandError, Context, Result};
use crate::output::{format_output, OutputData, Theme};
use std::time::Duration;

/// Validates the submission and prints the connection test it would run.
///
/// Nothing is sent over the network. With `--status` the given response is
/// judged against the variant's expected response instead.
pub fn run(
    cli: &Cli,
    variant_id: &str,
    input: &SubmissionArgs,
    status: Option<u16>,
    body: &str,
) -> Result<()> {
    let ctx = Context::load(cli)?;
    let (_, variant) = ctx.variant(variant_id)?;
    let theme = Theme::new(!cli.no_color);

    let config = match variant.validate(&read_submission(input)?) {
        Ok(config) => config,
        Err(errors) => {
            let data = OutputData::FieldErrors {
                variant: variant.id.clone(),
                errors: errors.as_slice().to_vec(),
            };
            format_output(&data, &cli.output, theme)?;
            return Err(CommandError::Validation(errors));
        }
    };

    let request = variant.prepare_probe(&config)?;
    let outcome = match status {
        Some(code) => Some(
            variant
                .test_config
                .expected_response
                .evaluate(code, body, Duration::ZERO),
        ),
        None => variant.test_config.run_offline(),
    };
    let failed = outcome.as_ref().filter(|o| !o.success).map(|o| o.message.clone());

    format_output(
        &OutputData::Probe {
            variant: variant.id.clone(),
            request,
            outcome,
        },
        &cli.output,
        theme,
    )?;

    match failed {
        Some(message) => Err(CommandError::ProbeFailed(message)),
        None => Ok(()),
    }
}
