// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Keeper four letter word server
//!
//! # Usage
//!
//! ```bash
//! # Start server on default port (9181)
//! keeper-flw-server
//!
//! # Custom port and config
//! keeper-flw-server --port 9182 --config flw.json
//!
//! # Restrict the enabled words
//! keeper-flw-server --white-list ruok,mntr
//! ```

use clap::Parser;
use keeper_flw_server::{bootstrap, log_filter, FlwServer, ServerConfig};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::FmtSubscriber;

/// Keeper four letter word server - admin commands over TCP
#[derive(Parser, Debug)]
#[command(name = "keeper-flw-server")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// TCP port to listen on [default: 9181]
    #[arg(short, long)]
    port: Option<u16>,

    /// Bind address (0.0.0.0 for all interfaces) [default: 0.0.0.0]
    #[arg(short, long)]
    bind: Option<String>,

    /// Configuration file (JSON format)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Comma separated words to enable, or '*' for all
    #[arg(short, long)]
    white_list: Option<String>,

    /// Log level (trace, debug, info, warn, error); RUST_LOG adds per-target directives
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Initialize logging
    let directives = std::env::var("RUST_LOG").unwrap_or_default();
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(log_filter(&directives, &args.log_level))
        .with_target(true)
        .with_thread_ids(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let mut config = if let Some(config_path) = &args.config {
        info!("Loading config from {:?}", config_path);
        ServerConfig::from_file(config_path)?
    } else {
        ServerConfig::default()
    };
    if let Some(bind) = &args.bind {
        config.bind_address = bind.parse()?;
    }
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(white_list) = args.white_list {
        config.keeper.four_letter_word_white_list = white_list;
    }
    config.validate()?;

    let (_engine, registry) = bootstrap(&config)?;
    let server = FlwServer::new(config, registry)?;
    let config = server.config();

    info!("+----------------------------------------------------+");
    info!(
        "|       Keeper FLW Server v{}                  |",
        env!("CARGO_PKG_VERSION")
    );
    info!("+----------------------------------------------------+");
    info!(
        "|  Bind:   {:40} |",
        format!("{}:{}", config.bind_address, config.port)
    );
    info!("|  Server: {:40} |", config.keeper.server_id);
    info!("|  Role:   {:40} |", config.role);
    info!(
        "|  Words:  {:40} |",
        config.keeper.four_letter_word_white_list
    );
    info!("+----------------------------------------------------+");

    // Handle shutdown signals
    let server_handle = server.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("Shutdown signal received, stopping server...");
        server_handle.shutdown();
    });

    server.run().await?;

    info!("Four letter word server stopped");
    Ok(())
}
