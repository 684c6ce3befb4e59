use crate::cli::Cli;
use crate::commands::{CommandError, Context, Result};
use crate::output::{format_output, OutputData, Theme};
use conform_core::catalog::Catalog;
use conform_core::check::{check_catalog, Severity};
use std::path::Path;

pub fn run(cli: &Cli, path: Option<&Path>) -> Result<()> {
    let catalog = match path {
        Some(path) => Catalog::load_from_path(path)?,
        None => Context::load(cli)?.catalog,
    };
    let issues = check_catalog(&catalog);
    let errors = issues
        .iter()
        .filter(|i| i.severity == Severity::Error)
        .count();

    format_output(
        &OutputData::Issues(issues),
        &cli.output,
        Theme::new(!cli.no_color),
    )?;

    if errors > 0 {
        return Err(CommandError::DefinitionErrors(errors));
    }
    Ok(())
}
