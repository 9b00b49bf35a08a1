//! impress-metadata
//!
//! Validate article metadata documents, import JATS reference lists and
//! inspect the entity schema.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "impress-metadata", version, about)]
struct Cli {
    /// Schema configuration replacing the built-in tables (.json or .toml)
    #[arg(long, global = true)]
    schema: Option<PathBuf>,

    /// TOML overrides for required properties and identifier kinds
    #[arg(long, global = true)]
    overrides: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Report missing required properties in a document
    Validate {
        document: PathBuf,
        /// Print issues as JSON
        #[arg(long)]
        json: bool,
    },
    /// Normalize a JATS reference list into a document's references
    Import {
        /// XML containing element-citation or mixed-citation elements
        references: PathBuf,
        /// Existing document to import into (a new one is started otherwise)
        #[arg(long)]
        into: Option<PathBuf>,
        /// Write the resulting document here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Also extract fpage/lpage/page-range/elocation-id
        #[arg(long)]
        locations: bool,
    },
    /// Print the section table of contents of a document
    Toc { document: PathBuf },
    /// Print the effective schema configuration
    Schema {
        #[arg(long, value_enum, default_value_t = Format::Toml)]
        format: Format,
    },
    /// Export a document as a standalone entities database
    Export {
        document: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Json,
    Toml,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = commands::load_config(cli.schema.as_deref(), cli.overrides.as_deref())?;

    match cli.command {
        Command::Validate { document, json } => {
            let open = commands::validate(config, &document, json)?;
            if open > 0 {
                std::process::exit(1);
            }
        }
        Command::Import {
            references,
            into,
            output,
            locations,
        } => commands::import(config, &references, into.as_deref(), output.as_deref(), locations)?,
        Command::Toc { document } => commands::toc(config, &document)?,
        Command::Schema { format } => commands::schema(&config, matches!(format, Format::Json))?,
        Command::Export { document, output } => commands::export(config, &document, output.as_deref())?,
    }
    Ok(())
}
