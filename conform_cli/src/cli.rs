use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "conform")]
#[command(about = "Conform - validate integration credential forms and track onboarding dates")]
#[command(version)]
#[command(after_help = "\x1b[1;36mQuick Start:\x1b[0m
  conform list                                 List connectors in the catalog
  conform show salesforce                      Show variants and their fields
  conform validate salesforce-api-key --set subdomain=acme --set username=ops@acme.com --set apiKey=...
  conform status --now 2025-10-29             Dashboard status as of a date

\x1b[1;36mDates:\x1b[0m
  conform due 2025-11-02 --now 2025-10-29     Due in 4 days
  conform connected 2025-10-28                 1 day connected

\x1b[1;36mCatalog:\x1b[0m
  conform check my-catalog.yaml                Check connector definitions
  conform schema > catalog.schema.json         JSON Schema for catalog files")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Output format
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Pretty)]
    pub output: OutputFormat,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    /// Verbose output (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Catalog file (YAML or JSON) instead of the configured or built-in one
    #[arg(long, global = true, env = "CONFORM_CATALOG_PATH")]
    pub catalog: Option<PathBuf>,

    /// Evaluate dates as of this ISO date or timestamp instead of the current time
    #[arg(long, global = true)]
    pub now: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List connectors in the catalog
    #[command(alias = "ls")]
    #[command(after_help = "\x1b[1;33mExamples:\x1b[0m
  conform list                     All connectors
  conform list --category crm      Only CRM connectors
  conform list --enabled --output json")]
    List {
        /// Only connectors in this category (case-insensitive)
        #[arg(long)]
        category: Option<String>,
        /// Only enabled connectors
        #[arg(long)]
        enabled: bool,
    },

    /// Show a connector's variants and form fields
    Show {
        /// Connector id or slug
        connector: String,
    },

    /// Validate a configuration submission against a variant
    ///
    /// Values come from a JSON object file, `--set key=value` pairs, or both
    /// (`--set` wins). Exits non-zero when any field fails.
    #[command(after_help = "\x1b[1;33mExamples:\x1b[0m
  conform validate salesforce-oauth --file submission.json
  conform validate hubspot-private-app --set objects=contacts,deals --set accessToken=pat-na1-abc
  conform validate salesforce-api-key --update stored.json --set username=new@acme.com")]
    Validate {
        /// Variant id
        variant: String,
        #[command(flatten)]
        input: SubmissionArgs,
        /// Stored configuration (JSON) being edited
        #[arg(long)]
        update: Option<PathBuf>,
    },

    /// Validate a submission, then show the connection test it would run
    #[command(after_help = "\x1b[1;33mExamples:\x1b[0m
  conform probe salesforce-oauth --file submission.json
  conform probe salesforce-oauth --file submission.json --status 401 --body denied")]
    Probe {
        /// Variant id
        variant: String,
        #[command(flatten)]
        input: SubmissionArgs,
        /// Judge a response with this HTTP status against the expected response
        #[arg(long)]
        status: Option<u16>,
        /// Response body to judge together with --status
        #[arg(long, default_value = "")]
        body: String,
    },

    /// Validate every submission in a file (JSON array or one object per line)
    Batch {
        /// Variant id
        variant: String,
        /// File with the submissions
        file: PathBuf,
    },

    /// Dashboard status for connectors and organization nudges
    Status {
        /// Only this connector (id or slug)
        connector: Option<String>,
        /// Include pending organization nudges
        #[arg(long)]
        orgs: bool,
    },

    /// Format a due date ("Due in 4 days", "2 days overdue")
    Due {
        /// ISO date
        date: String,
    },

    /// Format a nudge date ("NOTIFYING TOMORROW")
    Nudge {
        /// ISO date
        date: String,
    },

    /// Format a connection date ("12 days connected")
    Connected {
        /// ISO date
        date: String,
    },

    /// Check catalog definitions for problems
    Check {
        /// Catalog file; defaults to the active catalog
        path: Option<PathBuf>,
    },

    /// Print the JSON Schema for catalog files
    Schema,

    /// Fill in a variant's form interactively
    #[command(alias = "init")]
    Setup {
        /// Variant id, or a connector id/slug to use its recommended variant
        variant: String,
    },
}

#[derive(clap::Args, Clone, Debug)]
pub struct SubmissionArgs {
    /// JSON file holding the submission object
    #[arg(long, short)]
    pub file: Option<PathBuf>,
    /// key=value pair; JSON values (true, 42, ["a"]) are parsed, anything else is text
    #[arg(long = "set", value_name = "KEY=VALUE")]
    pub set: Vec<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output with colors and tables
    Pretty,
    /// JSON output
    Json,
    /// YAML output
    Yaml,
    /// Plain text, one item per line
    Text,
}
