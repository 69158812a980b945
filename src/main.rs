use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use anyhow::Context;
use clap::Parser;
use crossterm::cursor::MoveToColumn;
use crossterm::queue;
use crossterm::style::Print;
use crossterm::terminal::{Clear, ClearType};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;
use chunkpost::config::{Config, DEFAULT_CONFIG_FILE};
use chunkpost::utils::{completion_summary, progress_line};
use chunkpost::{ChunkProgress, ChunkedUploader, ProgressCallback};

/// Upload a file to a chunk receiver, one base64 chunk at a time.
#[derive(Parser, Debug)]
#[command(name = "chunkpost", version)]
struct Cli {
    /// File to upload
    file: PathBuf,

    /// TOML config file; used when present
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Receiver base url, chunks are posted to `{server_url}upload`
    #[arg(long)]
    server_url: Option<String>,

    /// Chunk size in bytes
    #[arg(long)]
    chunk_size: Option<usize>,

    /// Fail when the receiver never reports completion
    #[arg(long)]
    strict: bool,
}

fn load_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = if cli.config.exists() {
        Config::load_config(&cli.config)
            .with_context(|| format!("Failed to load {:?}", cli.config))?
    } else {
        let server_url = cli
            .server_url
            .clone()
            .with_context(|| format!("{:?} not found, pass --server-url", cli.config))?;
        Config::new(server_url)
    };

    if let Some(server_url) = &cli.server_url {
        config.server_url = server_url.clone();
    }
    if let Some(chunk_size) = cli.chunk_size {
        config.chunk_size = chunk_size;
    }

    Ok(config)
}

fn render_progress(out: &mut impl Write, progress: &ChunkProgress) -> io::Result<()> {
    queue!(
        out,
        MoveToColumn(0),
        Clear(ClearType::CurrentLine),
        Print(progress_line(progress))
    )?;
    out.flush()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;
    let uploader = ChunkedUploader::from_config(&config).context("Failed to create uploader")?;

    info!(
        server_url = %config.server_url,
        chunk_size = uploader.config().chunk_size,
        file = ?cli.file,
        "uploading"
    );

    let callback: ProgressCallback = Arc::new(|progress| {
        if let Err(err) = render_progress(&mut io::stdout(), &progress) {
            debug!(error = %err, "failed to draw progress line");
        }
    });
    let start_time = Instant::now();

    let result = if cli.strict {
        Some(uploader.upload_file_strict(&cli.file, Some(&callback)).await?)
    } else {
        uploader.upload_file(&cli.file, Some(&callback)).await?
    };
    println!();

    match result {
        Some(upload) => {
            println!("{}", completion_summary(&upload, start_time.elapsed()));
        }
        None => {
            println!("All chunks were sent but the receiver did not report completion");
        }
    }

    Ok(())
}
