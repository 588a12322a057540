//! rpresent-relay: websocket relay that mirrors a presenter's slide
//! position onto every connected viewer.
//!
//! Presenters connect to `/p`, viewers to `/v`. Each sends its identifier
//! as the first frame; after that the relay forwards slide numbers from
//! the presenter to all viewers of the same presentation.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use tokio::net::TcpListener;

use rpresent_common::RpresentError;
use rpresent_config::RelayConfig;
use rpresent_sync::{publish, serve, slide_source_path, IdIndex, ShareLinks, SyncContext, Timeouts};

#[derive(Parser)]
#[command(name = "rpresent-relay", about = "Remote-controlled presentation relay")]
struct Cli {
    /// Config file (defaults to $RPRESENT_CONFIG, then the platform config directory).
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Accept presenter and viewer connections (default).
    Serve(ServeArgs),

    /// Register a presentation in the index and print its share links.
    /// Run while the relay is stopped; it reads the index only at startup.
    Pair(PairArgs),
}

#[derive(Args, Default)]
struct StorageArgs {
    /// Directory to store slides and the index in.
    #[arg(short = 'd', long)]
    slides_dir: Option<PathBuf>,

    /// Base URL for share links.
    #[arg(short = 'b', long)]
    base_url: Option<String>,
}

#[derive(Args, Default)]
struct ServeArgs {
    /// Address to listen on.
    #[arg(long)]
    listen: Option<String>,

    #[command(flatten)]
    storage: StorageArgs,
}

#[derive(Args)]
struct PairArgs {
    /// Reuse this presentation id if it is already registered.
    #[arg(long)]
    existing_id: Option<String>,

    #[command(flatten)]
    storage: StorageArgs,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut config = match rpresent_config::load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("rpresent-relay: {e}");
            return ExitCode::FAILURE;
        }
    };

    init_logging(&config);

    let result = match cli.command.unwrap_or(Command::Serve(ServeArgs::default())) {
        Command::Serve(args) => {
            apply_storage(&mut config, args.storage);
            if let Some(listen) = args.listen {
                config.server.listen = listen;
            }
            run_server(config).await
        }
        Command::Pair(args) => {
            apply_storage(&mut config, args.storage);
            run_pair(&config, args.existing_id.as_deref())
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "rpresent-relay failed");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(config: &RelayConfig) {
    let level = config.logging.level.as_filter();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("rpresent_relay={level},rpresent_sync={level},rpresent_config={level}")
                    .into()
            }),
        )
        .init();
}

fn apply_storage(config: &mut RelayConfig, storage: StorageArgs) {
    if let Some(dir) = storage.slides_dir {
        config.server.slides_dir = dir;
    }
    if let Some(base_url) = storage.base_url {
        config.server.base_url = base_url;
    }
}

/// Create the storage directory and load the index. A corrupt index is fatal.
fn open_index(config: &RelayConfig) -> Result<(IdIndex, PathBuf), RpresentError> {
    std::fs::create_dir_all(&config.server.slides_dir)?;
    let index_path = config.server.index_path();
    let index = IdIndex::load(&index_path)?;
    Ok((index, index_path))
}

async fn run_server(config: RelayConfig) -> Result<(), RpresentError> {
    let (index, _) = open_index(&config)?;
    let ctx = SyncContext::new(Arc::new(index), Timeouts::from(&config.timeouts));

    let listener = TcpListener::bind(&config.server.listen).await.map_err(|e| {
        RpresentError::Network(format!("failed to bind {}: {e}", config.server.listen))
    })?;

    tokio::select! {
        _ = serve(listener, ctx) => {}
        signal = tokio::signal::ctrl_c() => {
            signal?;
            tracing::info!("shutting down");
        }
    }
    Ok(())
}

fn run_pair(config: &RelayConfig, existing_id: Option<&str>) -> Result<(), RpresentError> {
    let (index, index_path) = open_index(config)?;
    let publication = publish(&index, &index_path, existing_id);
    if !publication.persisted {
        return Err(RpresentError::Other(format!(
            "could not write {}",
            index_path.display()
        )));
    }

    let pair = &publication.pair;
    let links = ShareLinks::new(&config.server.base_url, pair);
    println!("Presentation ID: {}", pair.presentation_id);
    println!("Presenter URL:   {}", links.presenter_url);
    println!("Viewer URL:      {}", links.viewer_url);
    println!(
        "Slide source:    {}",
        slide_source_path(&config.server.slides_dir, &pair.presentation_id).display()
    );
    Ok(())
}
