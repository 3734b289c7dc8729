mod commands;

use std::path::PathBuf;

use app_settings::MediaSettings;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "clubmedia", about = "Store and remove club and profile images")]
struct Cli {
    /// Storage root; overrides the configured value for this run.
    #[arg(long, global = true, env = "CLUBMEDIA_ROOT")]
    root: Option<PathBuf>,

    /// Read settings from this file instead of the platform default.
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Load an image file as an inline payload.
    Select {
        file: PathBuf,
        #[arg(long)]
        content_type: Option<String>,
    },
    /// Select a file and store it under a category.
    Save {
        category: String,
        file: PathBuf,
        #[arg(long)]
        content_type: Option<String>,
    },
    /// Run a raw field value through the ingestion step.
    Process { category: String, value: String },
    /// Remove a stored image. Missing files are not an error.
    Delete { category: String, reference: String },
    /// Compute the crop rectangle for a final overlay position.
    Crop {
        file: PathBuf,
        #[arg(long, default_value_t = 0.0)]
        x: f64,
        #[arg(long, default_value_t = 0.0)]
        y: f64,
        #[arg(long)]
        size: f64,
        #[arg(long)]
        display_width: Option<f64>,
        #[arg(long)]
        display_height: Option<f64>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut settings = match &cli.settings {
        Some(path) => MediaSettings::load_from(path)?,
        None => MediaSettings::load().unwrap_or_else(|err| {
            tracing::warn!("failed to load settings, using defaults: {err}");
            MediaSettings::default()
        }),
    };
    if let Some(root) = cli.root {
        settings.set_storage_root(root);
    }

    let out = match cli.command {
        Command::Select { file, content_type } => {
            commands::select(&file, content_type.as_deref()).await?
        }
        Command::Save {
            category,
            file,
            content_type,
        } => commands::save(&settings, &category, &file, content_type.as_deref()).await?,
        Command::Process { category, value } => commands::process(&settings, &category, &value)?,
        Command::Delete {
            category,
            reference,
        } => commands::delete(&settings, &category, &reference)?,
        Command::Crop {
            file,
            x,
            y,
            size,
            display_width,
            display_height,
        } => {
            let display = display_width.zip(display_height);
            commands::crop(&settings, &file, (x, y, size), display).await?
        }
    };
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}
