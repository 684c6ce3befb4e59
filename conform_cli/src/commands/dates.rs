use crate::cli::Cli;
use crate::commands::{Context, Result};
use crate::output::{format_output, OutputData, Theme};
use conform_core::dates::{format_connected_status, format_due_status, format_nudge_status};

#[derive(Debug, Clone, Copy)]
pub enum DateKind {
    Due,
    Nudge,
    Connected,
}

pub fn run(cli: &Cli, kind: DateKind, date: &str) -> Result<()> {
    let ctx = Context::load(cli)?;
    let fmt = ctx.formatter(cli)?;

    let (days, label) = match kind {
        DateKind::Due => {
            let days = fmt.days_remaining(date)?;
            (days, format_due_status(days))
        }
        DateKind::Nudge => {
            let days = fmt.days_remaining(date)?;
            (days, format_nudge_status(days))
        }
        DateKind::Connected => {
            let days = fmt.days_since(date)?;
            (days, format_connected_status(days))
        }
    };

    format_output(
        &OutputData::DateStatus {
            date: date.to_string(),
            days,
            label,
        },
        &cli.output,
        Theme::new(!cli.no_color),
    )
}
