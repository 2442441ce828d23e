mod config;
mod convert_cmd;
mod doctor_cmd;
mod history_cmd;
mod terminal_output;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::debug;

use inkread_config::{config_dir, config_file_path, load_and_prepare};
use inkread_core::ConversionId;
use inkread_logging::init_logger;

#[derive(Parser)]
#[command(name = "inkread")]
#[command(about = "Inkread: turn handwriting photos into editable text")]
#[command(version)]
struct Cli {
    /// Config file (defaults to ~/.inkread/config.yaml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract text from an image and store the conversion
    Convert {
        image: PathBuf,
        /// Retry the save this many times if storing fails
        #[arg(long, default_value_t = 0)]
        retry: u32,
    },
    /// List recent conversions
    History,
    /// Print the text of a conversion
    Show { id: String },
    /// Replace the text of a conversion
    Edit {
        id: String,
        #[arg(long, conflicts_with = "file", required_unless_present = "file")]
        text: Option<String>,
        /// Read the new text from a file
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// Write the text of a conversion to `ocr-text-<millis>.txt`
    Export {
        id: String,
        #[arg(long)]
        dir: Option<PathBuf>,
    },
    /// Delete a conversion
    Delete { id: String },
    /// Check configuration and connectivity
    Doctor,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        terminal_output::note_error(&format!("{e:#}"));
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let path = cli
        .config
        .unwrap_or_else(|| config_file_path(&config_dir()));
    let settings = load_and_prepare(&path).await?;
    init_logger(settings.log_dir(), settings.log_level());
    debug!(path = %path.display(), "Configuration loaded");

    if let Commands::Doctor = cli.command {
        return doctor_cmd::run(&settings, &path).await;
    }

    let controller = config::build_controller(&settings)?;
    match cli.command {
        Commands::Convert { image, retry } => convert_cmd::run(&controller, &image, retry).await,
        Commands::History => history_cmd::list(&controller).await,
        Commands::Show { id } => history_cmd::show(&controller, &ConversionId::new(id)).await,
        Commands::Edit { id, text, file } => {
            let text = match (text, file) {
                (Some(text), _) => text,
                (None, Some(file)) => tokio::fs::read_to_string(&file).await?,
                (None, None) => anyhow::bail!("either --text or --file is required"),
            };
            history_cmd::edit(&controller, &ConversionId::new(id), text).await
        }
        Commands::Export { id, dir } => {
            let dir = dir.unwrap_or_else(|| settings.export_dir());
            history_cmd::export(&controller, &ConversionId::new(id), &dir).await
        }
        Commands::Delete { id } => history_cmd::delete(&controller, &ConversionId::new(id)).await,
        Commands::Doctor => Ok(()),
    }
}
