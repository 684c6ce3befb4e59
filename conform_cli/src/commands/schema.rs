use crate::cli::Cli;
use crate::commands::Result;
use crate::output::{format_output, OutputData, Theme};
use conform_core::catalog::catalog_json_schema;

pub fn run(cli: &Cli) -> Result<()> {
    format_output(
        &OutputData::Schema(catalog_json_schema()),
        &cli.output,
        Theme::new(!cli.no_color),
    )
}
