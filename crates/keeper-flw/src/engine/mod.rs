// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Read-only view of the coordination engine.
//!
//! Commands never touch engine internals directly. Everything they report
//! comes through [`KeeperEngine`], whose accessors return owned point-in-time
//! snapshots. Implementations guard their state so that a snapshot is never
//! torn by a concurrent reset.

mod local;
mod settings;
mod stats;

pub use local::{ConnectionId, LocalEngine};
pub use settings::{KeeperSettings, DEFAULT_FOUR_LETTER_WORD_WHITE_LIST};
pub use stats::{LatencySnapshot, LatencyStats};

use std::collections::BTreeMap;
use std::fmt;
use std::io;
use std::net::SocketAddr;

/// Session identifier as assigned by the coordination engine.
pub type SessionId = i64;

/// Quorum role of this node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerRole {
    Leader,
    Follower,
    Observer,
    Standalone,
}

impl ServerRole {
    pub const fn as_str(self) -> &'static str {
        match self {
            ServerRole::Leader => "leader",
            ServerRole::Follower => "follower",
            ServerRole::Observer => "observer",
            ServerRole::Standalone => "standalone",
        }
    }

    /// Leader-only reporting applies to the leader of a quorum.
    pub const fn is_leader(self) -> bool {
        matches!(self, ServerRole::Leader)
    }
}

impl fmt::Display for ServerRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Quorum and request-pipeline facts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeeperInfo {
    pub role: ServerRole,
    /// False until this node has joined a quorum with a known leader.
    pub has_leader: bool,
    pub alive_connections_count: u64,
    pub outstanding_requests_count: u64,
    pub last_zxid: i64,
    pub total_nodes_count: u64,
    /// Leader only.
    pub follower_count: u64,
    /// Leader only.
    pub synced_follower_count: u64,
    /// Leader only.
    pub pending_syncs: u64,
}

/// Server-wide request counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ServerStatsSnapshot {
    pub packets_received: u64,
    pub packets_sent: u64,
    pub latency: LatencySnapshot,
}

/// Data tree and watch registry totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StorageSnapshot {
    pub node_count: u64,
    pub watch_count: u64,
    pub ephemerals_count: u64,
    pub approximate_data_size: u64,
    pub sessions_with_watches_count: u64,
    pub watched_paths_count: u64,
}

/// One live client connection and its counters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionSnapshot {
    pub peer: SocketAddr,
    pub session_id: SessionId,
    pub packets_received: u64,
    pub packets_sent: u64,
    /// Unix epoch milliseconds.
    pub established_ms: u64,
    pub session_timeout_ms: u64,
    pub last_operation: Option<String>,
    pub last_cxid: i64,
    pub last_zxid: i64,
    /// Unix epoch milliseconds of the last response, 0 if none.
    pub last_response_ms: u64,
    pub last_latency: u64,
    pub latency: LatencySnapshot,
}

/// Everything `mntr`, `srvr` and `stat` render, read at one instant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerReport {
    pub info: KeeperInfo,
    pub stats: ServerStatsSnapshot,
    pub storage: StorageSnapshot,
    pub connections: Vec<ConnectionSnapshot>,
}

/// Sessions and the ephemeral nodes they own.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SessionsDump {
    pub sessions: Vec<SessionId>,
    pub ephemerals: BTreeMap<SessionId, Vec<String>>,
}

/// Accessors the admin commands rely on.
///
/// Only the two reset operations mutate anything, and they only touch
/// statistics, never replicated state.
pub trait KeeperEngine: Send + Sync {
    fn info(&self) -> KeeperInfo;

    fn server_stats(&self) -> ServerStatsSnapshot;

    /// Reset server-wide latency and packet counters.
    fn reset_server_stats(&self);

    fn storage(&self) -> StorageSnapshot;

    /// Quorum info, server statistics, storage totals and the connection
    /// table taken together, so no part of the report is newer than another.
    fn server_report(&self) -> ServerReport;

    fn connections(&self) -> Vec<ConnectionSnapshot>;

    /// Reset every connection's counters in one step.
    fn reset_connection_stats(&self);

    /// Watched paths keyed by session. Cost grows with the watch table.
    fn watches_by_session(&self) -> BTreeMap<SessionId, Vec<String>>;

    /// Watching sessions keyed by path. Cost grows with the watch table.
    fn watches_by_path(&self) -> BTreeMap<String, Vec<SessionId>>;

    /// Complete only on the leader; other roles may return a partial view.
    fn sessions_and_ephemerals(&self) -> SessionsDump;

    fn settings(&self) -> &KeeperSettings;

    fn snapshot_dir_size(&self) -> io::Result<u64>;

    fn log_dir_size(&self) -> io::Result<u64>;

    fn is_read_only(&self) -> bool;
}
