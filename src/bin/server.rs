//! fileport Server Binary
//!
//! Starts the TCP file server.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use fileport::{Config, FileStore, Server};
use tracing_subscriber::{fmt, EnvFilter};

/// fileport Server
#[derive(Parser, Debug)]
#[command(name = "fileport-server")]
#[command(about = "Serve a directory over the fileport protocol")]
#[command(version)]
struct Args {
    /// Storage directory (created if missing)
    #[arg(short, long, default_value = "./server_files")]
    storage_dir: PathBuf,

    /// Listen address (host:port)
    #[arg(short, long, default_value = "127.0.0.1:8888")]
    listen: String,

    /// Per-connection read timeout in milliseconds (0 = none)
    #[arg(long, default_value = "0")]
    read_timeout_ms: u64,

    /// Per-connection write timeout in milliseconds (0 = none)
    #[arg(long, default_value = "0")]
    write_timeout_ms: u64,
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,fileport=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let args = Args::parse();

    tracing::info!("fileport server v{}", fileport::VERSION);
    tracing::info!("Storage directory: {}", args.storage_dir.display());
    tracing::info!("Listen address: {}", args.listen);

    // Build config from args
    let config = Config::builder()
        .storage_dir(&args.storage_dir)
        .listen_addr(&args.listen)
        .read_timeout_ms(args.read_timeout_ms)
        .write_timeout_ms(args.write_timeout_ms)
        .build();

    // Bootstrap owns directory creation
    let store = match FileStore::create(&config.storage_dir) {
        Ok(store) => Arc::new(store),
        Err(e) => {
            tracing::error!("Failed to open storage: {}", e);
            std::process::exit(1);
        }
    };

    let server = match Server::bind(config, store) {
        Ok(server) => server,
        Err(e) => {
            tracing::error!("Failed to start server: {}", e);
            std::process::exit(1);
        }
    };

    // Ctrl+C stops the accept loop
    match server.shutdown_handle() {
        Ok(handle) => {
            let result = ctrlc::set_handler(move || {
                tracing::info!("Received Ctrl+C, initiating shutdown...");
                handle.shutdown();
            });
            if let Err(e) = result {
                tracing::warn!("Could not install Ctrl+C handler: {}", e);
            }
        }
        Err(e) => tracing::warn!("Could not create shutdown handle: {}", e),
    }

    if let Err(e) = server.run() {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }

    tracing::info!("Server stopped");
}
