use crate::cli::Cli;
use crate::commands::{Context, Result};
use crate::output::{format_output, ConnectorSummary, OutputData, Theme};
use conform_core::status::connector_status;

pub fn run(cli: &Cli, category: Option<&str>, enabled: bool) -> Result<()> {
    let ctx = Context::load(cli)?;
    let fmt = ctx.formatter(cli)?;

    let enabled = enabled.then_some(true);
    let mut summaries = Vec::new();
    for connector in ctx.catalog.plugins(category, enabled) {
        let status = connector_status(connector, &fmt)?;
        summaries.push(ConnectorSummary {
            id: connector.id.clone(),
            name: connector.name.clone(),
            category: connector.category.clone(),
            enabled: connector.enabled,
            variants: connector.variants.iter().map(|v| v.id.clone()).collect(),
            status: status.headline(),
        });
    }

    format_output(
        &OutputData::ConnectorList(summaries),
        &cli.output,
        Theme::new(!cli.no_color),
    )
}
