//! acs-fixtures - generate and inspect E2E fixture files

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::info;
use tracing_subscriber::EnvFilter;

use acs_fixtures::{generate, json, sheet};

#[derive(Parser)]
#[command(name = "acs-fixtures")]
#[command(about = "Generate and inspect fixture data for the ACS E2E suite")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a random fixture file
    Generate {
        /// What to generate
        #[arg(value_enum)]
        entity: Entity,

        /// Number of records
        #[arg(short, long, default_value = "5")]
        count: usize,

        /// Output format
        #[arg(short, long, value_enum, default_value = "json")]
        format: Format,

        /// Output file
        #[arg(short, long)]
        out: PathBuf,

        /// Sheet name for xlsx output (defaults to the conventional one)
        #[arg(long)]
        sheet: Option<String>,

        /// RNG seed for reproducible output
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Parse a fixture and print the normalized records as JSON
    Inspect {
        /// What the file contains
        #[arg(value_enum)]
        entity: Entity,

        /// Fixture file (.json or .xlsx)
        path: PathBuf,

        /// Sheet name for xlsx input
        #[arg(long)]
        sheet: Option<String>,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Entity {
    Employees,
    Locations,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Format {
    Json,
    Xlsx,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Generate { entity, count, format, out, sheet, seed } => {
            let seed = seed.unwrap_or_else(rand::random);
            info!("Generating {} {:?} with seed {}", count, entity, seed);
            let mut rng = StdRng::seed_from_u64(seed);
            generate_file(entity, format, &out, sheet.as_deref(), count, &mut rng)?;
            info!("Wrote {}", out.display());
        }
        Commands::Inspect { entity, path, sheet } => {
            let output = match entity {
                Entity::Employees => serde_json::to_string_pretty(
                    &acs_fixtures::load_employees(&path, sheet.as_deref())
                        .with_context(|| format!("loading {}", path.display()))?,
                )?,
                Entity::Locations => serde_json::to_string_pretty(
                    &acs_fixtures::load_locations(&path, sheet.as_deref())
                        .with_context(|| format!("loading {}", path.display()))?,
                )?,
            };
            println!("{}", output);
        }
    }

    Ok(())
}

fn generate_file(
    entity: Entity,
    format: Format,
    out: &Path,
    sheet_name: Option<&str>,
    count: usize,
    rng: &mut StdRng,
) -> anyhow::Result<()> {
    match (entity, format) {
        (Entity::Employees, Format::Json) => {
            json::write_employees(out, &generate::employees(rng, count))?;
        }
        (Entity::Employees, Format::Xlsx) => {
            let name = sheet_name.unwrap_or(sheet::EMPLOYEE_SHEET);
            sheet::write_employees(out, name, &generate::employees(rng, count))?;
        }
        (Entity::Locations, Format::Json) => {
            json::write_locations(out, &generate::locations(rng, count))?;
        }
        (Entity::Locations, Format::Xlsx) => {
            let name = sheet_name.unwrap_or(sheet::LOCATION_SHEET);
            sheet::write_locations(out, name, &generate::locations(rng, count))?;
        }
    }
    Ok(())
}
