//! Demo data loader: replaces every collection with the JSON files in a directory

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use gradebook_api::seed::seed_from_dir;
use gradebook_common::config::{ConfigOverrides, RootFolderInitializer, ServiceConfig, TomlConfig};
use gradebook_common::db::init_database;

#[derive(Parser, Debug)]
#[command(name = "gradebook-seed")]
#[command(about = "Load demo data into the gradebook database")]
#[command(version)]
struct Args {
    /// Directory holding students.json, matieres.json, notes.json, professors.json
    #[arg(short, long, default_value = "data")]
    data_dir: PathBuf,

    /// Root folder holding the database
    #[arg(short, long, env = "GRADEBOOK_ROOT_FOLDER")]
    root_folder: Option<PathBuf>,

    /// Database file (default: <root>/gradebook.db)
    #[arg(long, env = "GRADEBOOK_DATABASE")]
    database: Option<PathBuf>,

    /// TOML config file
    #[arg(short, long, env = "GRADEBOOK_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gradebook_api=info,gradebook_common=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let toml = match &args.config {
        Some(path) => Some(TomlConfig::load(path).context("Failed to load config file")?),
        None => TomlConfig::load_default(),
    };
    let config = ServiceConfig::resolve(
        ConfigOverrides {
            root_folder: args.root_folder,
            database_path: args.database,
            ..ConfigOverrides::default()
        },
        toml.as_ref(),
    );

    RootFolderInitializer::new(config.root_folder.clone())
        .ensure_directory_exists()
        .context("Failed to create root folder")?;

    info!("Seeding {} from {}", config.database_path.display(), args.data_dir.display());
    let pool = init_database(&config.database_path)
        .await
        .context("Failed to initialize database")?;

    let summary = seed_from_dir(&pool, &args.data_dir)
        .await
        .context("Seeding failed")?;

    println!(
        "Imported {} students, {} matieres, {} notes, {} professors",
        summary.students, summary.matieres, summary.notes, summary.professors
    );
    Ok(())
}
