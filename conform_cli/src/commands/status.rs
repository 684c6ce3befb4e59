use crate::cli::Cli;
use crate::commands::{Context, Result};
use crate::output::{format_output, OutputData, Theme};
use conform_core::status::{catalog_status, connector_status, org_nudges};

pub fn run(cli: &Cli, connector: Option<&str>, orgs: bool) -> Result<()> {
    let ctx = Context::load(cli)?;
    let fmt = ctx.formatter(cli)?;

    let connectors = match connector {
        Some(name) => vec![connector_status(ctx.connector(name)?, &fmt)?],
        None => catalog_status(&ctx.catalog, &fmt)?,
    };
    let nudges = if orgs {
        org_nudges(&ctx.catalog.organizations, &fmt)?
    } else {
        Vec::new()
    };

    format_output(
        &OutputData::Status { connectors, nudges },
        &cli.output,
        Theme::new(!cli.no_color),
    )
}
