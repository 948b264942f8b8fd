//! Forest Schema CLI
//!
//! Builds the Forest Admin schema from a JSON model manifest and reconciles it
//! with `.forestadmin-schema.json`, or checks an existing schema file.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use forest_schema::{ForestConfig, ForestContext, Mode, SchemaFile, SmartFeatureCatalog, StaticModels};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "forest-schema")]
#[command(about = "Build and check Forest Admin schema files")]
struct Cli {
    /// Configuration file (defaults to forest.toml lookup)
    #[arg(short, long)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the schema from a model manifest and reconcile the schema file
    Build {
        /// JSON manifest describing the host models
        #[arg(short, long)]
        models: PathBuf,

        /// Force development mode (rewrite the schema file)
        #[arg(long)]
        debug: bool,

        /// Print the synchronized schema to stdout
        #[arg(long)]
        print: bool,
    },

    /// Validate an existing schema file
    Check {
        /// Schema file (defaults to the configured path)
        #[arg(short, long)]
        path: Option<PathBuf>,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = ForestConfig::load_from(cli.config.as_deref())?;

    match cli.command {
        Commands::Build { models, debug, print } => {
            if debug {
                config.debug = true;
            }
            let host = StaticModels::from_path(&models)?;
            let mode = config.mode();
            let mut context = ForestContext::new(config);

            // Smart features are registered by host code, not from a manifest.
            context.startup(&host, &SmartFeatureCatalog::new())?;

            let built = context.schema().map(|s| s.collections.len()).unwrap_or(0);
            println!("Built {} collections from {:?}", built, models);

            match (mode, context.schema_data()) {
                (Mode::Development, Some(_)) => {
                    println!("Wrote {}", context.schema_file().path().display());
                }
                (Mode::Production, Some(_)) => {
                    println!("Using {}", context.schema_file().path().display());
                }
                (_, None) => {
                    println!("Schema is not synchronized");
                    std::process::exit(1);
                }
            }

            if print {
                if let Some(schema) = context.schema_data() {
                    println!("{}", schema.to_pretty_json()?);
                }
            }
        }

        Commands::Check { path } => {
            let file = SchemaFile::new(path.unwrap_or_else(|| config.schema_file_path()));
            let document = file.load_and_validate()?;
            println!("{} is valid", file.path().display());
            println!("  liana: {} {}", document.meta.liana, document.meta.liana_version);
            println!("  orm: {}", document.meta.orm_version);
            println!("  database: {}", document.meta.database_type);
            for collection in &document.collections {
                println!(
                    "  - {} ({} fields, {} actions, {} segments)",
                    collection.name,
                    collection.fields.len(),
                    collection.actions.len(),
                    collection.segments.len()
                );
            }
            println!("  checksum: {}", document.checksum()?);
        }
    }

    Ok(())
}
