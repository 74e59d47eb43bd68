// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Four-letter word admin commands for ZooKeeper-compatible coordination servers.
//!
//! Operators and monitoring agents send a four-byte word such as `mntr` or
//! `ruok` on a fresh connection and get one text report back.
//!
//! # Architecture
//!
//! - **Codes**: words are keyed by their big-endian `i32` packing ([`code`])
//! - **Commands**: a closed enum, one variant per word ([`command`])
//! - **Allow list**: administrator-enabled words, fail-closed ([`allow_list`])
//! - **Registry**: built once at startup, then frozen and shared ([`registry`])
//! - **Engine**: read-only snapshots of coordination state ([`engine`])
//!
//! # Example
//!
//! ```
//! use keeper_flw::{CommandCode, CommandRegistry, KeeperSettings, LocalEngine};
//! use std::sync::Arc;
//!
//! let engine = Arc::new(LocalEngine::new(KeeperSettings::default()));
//! let registry = CommandRegistry::with_all_commands(engine).unwrap();
//!
//! let reply = registry.dispatch(CommandCode::parse("ruok").unwrap());
//! assert_eq!(reply.response, "imok");
//! ```

pub mod allow_list;
pub mod code;
pub mod command;
pub mod engine;
pub mod registry;
pub mod sys;

pub use allow_list::{AllowList, ALLOW_ALL};
pub use code::{to_code, to_name, CommandCode};
pub use command::{Command, FourLetterCommand, NOP_MESSAGE, NOT_SERVING_MESSAGE};
pub use engine::{
    ConnectionId, ConnectionSnapshot, KeeperEngine, KeeperInfo, KeeperSettings, LocalEngine,
    ServerReport, ServerRole, ServerStatsSnapshot, SessionId, SessionsDump, StorageSnapshot,
};
pub use registry::{CommandRegistry, Dispatch, Outcome, RegistryBuilder, RegistryCell, RegistryError};

#[cfg(test)]
mod tests;
