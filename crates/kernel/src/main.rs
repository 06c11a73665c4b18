//! Depot command-line front end.
//!
//! Stores files and produces image derivatives through the kernel services,
//! printing JSON results to stdout.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use depot_kernel::file::mime;
use depot_kernel::{AppState, Config, UploadedFile};

#[derive(Debug, Parser)]
#[command(name = "depot", version, about = "File store with cached image derivatives")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Store a file and record it.
    Store {
        /// File to upload.
        file: PathBuf,
        /// Declared MIME type (default: sniffed from the content).
        #[arg(long = "type")]
        mime_type: Option<String>,
        /// Name to store the file under (default: the file's own name).
        #[arg(long)]
        name: Option<String>,
        /// Store directly in the store root instead of a hash directory.
        #[arg(long)]
        root: bool,
    },
    /// Show a file record.
    Get { id: Uuid },
    /// Print the path of a resized derivative, generating it if needed.
    Resize {
        id: Uuid,
        #[arg(long)]
        width: u32,
        #[arg(long)]
        height: u32,
    },
    /// Print the raw/1x/2x set for a display size.
    Set {
        id: Uuid,
        #[arg(long)]
        width: u32,
        #[arg(long)]
        height: u32,
    },
    /// Print the raw/1x/2x set for an image stored at double resolution.
    Retina { id: Uuid },
    /// Delete all cached derivatives of a file.
    Purge { id: Uuid },
    /// Check a file's sniffed MIME type against an allow-list.
    CheckType {
        file: PathBuf,
        /// Allowed types (default: the configured list).
        #[arg(long, value_delimiter = ',')]
        allow: Vec<String>,
    },
}

#[derive(Debug, Serialize)]
struct PathOutput<'a> {
    path: &'a str,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    init_tracing();

    let cli = Cli::parse();

    let config = Config::from_env().context("failed to load configuration")?;
    info!(
        store = %config.file_store_path,
        public_dir = ?config.public_dir,
        "Configuration loaded"
    );

    let state = AppState::new(&config)
        .await
        .context("failed to initialize application state")?;

    run(&state, cli.command).await
}

async fn run(state: &AppState, command: Command) -> Result<()> {
    match command {
        Command::Store {
            file,
            mime_type,
            name,
            root,
        } => {
            let data = tokio::fs::read(&file)
                .await
                .with_context(|| format!("failed to read {}", file.display()))?;
            let client_name = match name {
                Some(name) => name,
                None => file
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .context("file has no name; pass --name")?,
            };
            let mime_type = mime_type.unwrap_or_else(|| mime::sniff(&data).to_string());

            let upload = UploadedFile::from_bytes(client_name.clone(), mime_type, data);
            let record = state.files().store(upload, &client_name, root).await?;
            print_json(&record)
        }
        Command::Get { id } => print_json(&state.files().file_by_id(id).await?),
        Command::Resize { id, width, height } => {
            let file = state.files().file_by_id(id).await?;
            let path = state
                .resize_cache()
                .resized_image_path(&file, width, height)
                .await?;
            print_json(&PathOutput { path: &path })
        }
        Command::Set { id, width, height } => {
            let file = state.files().file_by_id(id).await?;
            let set = state
                .variants()
                .resize_to_set(Some(&file), width, height)
                .await?;
            print_json(&set)
        }
        Command::Retina { id } => {
            let file = state.files().file_by_id(id).await?;
            let set = state.variants().resize_to_retina_set(Some(&file)).await?;
            print_json(&set)
        }
        Command::Purge { id } => {
            let file = state.files().file_by_id(id).await?;
            let removed = state.resize_cache().purge(&file).await?;
            print_json(&serde_json::json!({ "removed": removed }))
        }
        Command::CheckType { file, allow } => {
            let upload = UploadedFile::from_temp_file(
                file.to_string_lossy().into_owned(),
                mime::UNKNOWN_MIME_TYPE,
                &file,
            );
            let sniffed = upload.sniff_mime_type().await?;
            state
                .files()
                .check_file_mime_type(&upload, Some(allow.as_slice()))
                .await?;
            print_json(&serde_json::json!({ "type": sniffed, "allowed": true }))
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("failed to encode output")?;
    println!("{json}");
    Ok(())
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
