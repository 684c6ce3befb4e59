use crate::cli::Cli;
use crate::commands::{Context, Result};
use crate::output::{format_output, OutputData, Theme};

pub fn run(cli: &Cli, name: &str) -> Result<()> {
    let ctx = Context::load(cli)?;
    let connector = ctx.connector(name)?;
    format_output(
        &OutputData::ConnectorDetail(Box::new(connector.clone())),
        &cli.output,
        Theme::new(!cli.no_color),
    )
}
