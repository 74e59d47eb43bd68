// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Standalone four letter word admin listener.
//!
//! Serves the `keeper-flw` command catalogue over TCP, one word per
//! connection, backed by an in-process [`LocalEngine`].
//!
//! # Quick Start
//!
//! ```bash
//! # Listen on the default port (9181) with the default allow list
//! keeper-flw-server
//!
//! # Enable every word
//! keeper-flw-server --white-list '*'
//!
//! # Using config file
//! keeper-flw-server --config flw.json
//! ```
//!
//! # Configuration File
//!
//! ```json
//! {
//!   "port": 9181,
//!   "read_timeout_ms": 5000,
//!   "keeper": {
//!     "server_id": 1,
//!     "four_letter_word_white_list": "ruok,mntr,srvr,stat"
//!   }
//! }
//! ```

pub mod config;
pub mod server;

pub use config::{ConfigError, ServerConfig};
pub use server::{FlwServer, ServerError};

use keeper_flw::{CommandRegistry, LocalEngine, RegistryCell};
use std::sync::Arc;
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Build the local engine and a frozen registry for `config`.
pub fn bootstrap(config: &ServerConfig) -> Result<(Arc<LocalEngine>, Arc<RegistryCell>), ServerError> {
    let engine = Arc::new(LocalEngine::new(config.keeper.clone()));
    engine.set_role(config.server_role()?, true);
    engine.set_read_only(config.read_only);

    let registry = CommandRegistry::with_all_commands(engine.clone())?;
    let cell = Arc::new(RegistryCell::new());
    cell.initialize(registry)?;

    Ok((engine, cell))
}

/// `--log-level` name as a level; unknown names fall back to info.
pub fn log_level(name: &str) -> Level {
    match name {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    }
}

/// `RUST_LOG` style directives on top of the `--log-level` default.
pub fn log_filter(directives: &str, level_name: &str) -> EnvFilter {
    EnvFilter::new(directives).add_directive(log_level(level_name).into())
}
