use clap::Parser;
use owo_colors::OwoColorize;
use std::process;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod cli;
mod commands;
mod output;

use cli::{Cli, Commands};
use commands::dates::DateKind;
use commands::*;
use output::Theme;

fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let default_filter = match cli.verbose {
        0 => "conform_cli=info,conform=warn",
        1 => "conform_cli=debug,conform=debug",
        _ => "conform_cli=trace,conform=trace",
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let result = match &cli.command {
        None => {
            // No command provided - show quick overview
            show_overview(&cli)
        }
        Some(Commands::List { category, enabled }) => {
            list::run(&cli, category.as_deref(), *enabled)
        }
        Some(Commands::Show { connector }) => show::run(&cli, connector),
        Some(Commands::Validate {
            variant,
            input,
            update,
        }) => validate::run(&cli, variant, input, update.as_deref()),
        Some(Commands::Probe {
            variant,
            input,
            status,
            body,
        }) => probe::run(&cli, variant, input, *status, body),
        Some(Commands::Batch { variant, file }) => batch::run(&cli, variant, file),
        Some(Commands::Status { connector, orgs }) => {
            status::run(&cli, connector.as_deref(), *orgs)
        }
        Some(Commands::Due { date }) => dates::run(&cli, DateKind::Due, date),
        Some(Commands::Nudge { date }) => dates::run(&cli, DateKind::Nudge, date),
        Some(Commands::Connected { date }) => dates::run(&cli, DateKind::Connected, date),
        Some(Commands::Check { path }) => check::run(&cli, path.as_deref()),
        Some(Commands::Schema) => schema::run(&cli),
        Some(Commands::Setup { variant }) => setup::run(&cli, variant),
    };

    if let Err(e) = result {
        // Field and definition problems were already printed with the output
        if !e.is_reported() {
            if cli.no_color {
                eprintln!("Error: {}", e);
            } else {
                eprintln!("{}: {}", "Error".red().bold(), e);
            }
        }
        process::exit(1);
    }
}

fn show_overview(cli: &Cli) -> commands::Result<()> {
    let ctx = Context::load(cli)?;
    let theme = Theme::new(!cli.no_color);
    let catalog = &ctx.catalog;

    println!();
    println!(
        "{}  {}",
        theme.title("Conform"),
        theme.dim("- Integration form validation and onboarding dates")
    );
    println!();

    let variants: usize = catalog.plugins.iter().map(|c| c.variants.len()).sum();
    let connected = catalog.plugins.iter().filter(|c| c.connected).count();
    let prioritized = catalog
        .plugins
        .iter()
        .filter(|c| c.prioritized && !c.connected)
        .count();

    println!(
        "  {} connectors with {} variants ({} connected, {} prioritized)",
        theme.good(&catalog.plugins.len().to_string()),
        theme.good(&variants.to_string()),
        theme.good(&connected.to_string()),
        theme.warn(&prioritized.to_string())
    );
    println!(
        "  {} organizations, {} onboardings",
        theme.strong(&catalog.organizations.len().to_string()),
        theme.strong(&catalog.onboardings.len().to_string())
    );
    println!();

    println!("{}", theme.title("Quick Start:"));
    for (command, what) in [
        ("conform list", "Connectors and their status"),
        ("conform show <connector>", "Variants and form fields"),
        ("conform setup <variant>", "Fill in a form interactively"),
        ("conform status --orgs", "Due dates and nudges"),
    ] {
        println!("  {}{}", theme.title(&format!("{:<28}", command)), theme.dim(what));
    }
    println!();

    println!(
        "{} Use {} for full help",
        theme.dim("Tip:"),
        theme.title("conform --help")
    );
    println!();

    Ok(())
}
