// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! In-memory engine state.
//!
//! Backs the standalone server and the test suite. Each substate sits behind
//! its own lock. Accessors clone out while holding every lock they read, so
//! readers see either the state before a change or after it. Locks are always
//! taken in the order quorum, connections, tree, server stats.

use super::{
    ConnectionSnapshot, KeeperEngine, KeeperInfo, KeeperSettings, LatencyStats, ServerReport,
    ServerRole, ServerStatsSnapshot, SessionId, SessionsDump, StorageSnapshot,
};
use parking_lot::{Mutex, RwLock};
use std::collections::{BTreeMap, BTreeSet};
use std::io;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Handle to an entry in the connection table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

#[derive(Debug, Clone)]
struct QuorumState {
    role: ServerRole,
    has_leader: bool,
    outstanding_requests: u64,
    follower_count: u64,
    synced_follower_count: u64,
    pending_syncs: u64,
}

#[derive(Debug, Default)]
struct ServerStats {
    packets_received: u64,
    packets_sent: u64,
    latency: LatencyStats,
}

impl ServerStats {
    fn snapshot(&self) -> ServerStatsSnapshot {
        ServerStatsSnapshot {
            packets_received: self.packets_received,
            packets_sent: self.packets_sent,
            latency: self.latency.snapshot(),
        }
    }

    fn reset(&mut self) {
        self.packets_received = 0;
        self.packets_sent = 0;
        self.latency.reset();
    }
}

#[derive(Debug, Clone)]
struct ConnectionEntry {
    peer: SocketAddr,
    session_id: SessionId,
    session_timeout_ms: u64,
    established_ms: u64,
    packets_received: u64,
    packets_sent: u64,
    last_operation: Option<String>,
    last_cxid: i64,
    last_zxid: i64,
    last_response_ms: u64,
    last_latency: u64,
    latency: LatencyStats,
}

impl ConnectionEntry {
    fn reset_stats(&mut self) {
        self.packets_received = 0;
        self.packets_sent = 0;
        self.last_operation = None;
        self.last_cxid = -1;
        self.last_zxid = -1;
        self.last_response_ms = 0;
        self.last_latency = 0;
        self.latency.reset();
    }

    fn snapshot(&self) -> ConnectionSnapshot {
        ConnectionSnapshot {
            peer: self.peer,
            session_id: self.session_id,
            packets_received: self.packets_received,
            packets_sent: self.packets_sent,
            established_ms: self.established_ms,
            session_timeout_ms: self.session_timeout_ms,
            last_operation: self.last_operation.clone(),
            last_cxid: self.last_cxid,
            last_zxid: self.last_zxid,
            last_response_ms: self.last_response_ms,
            last_latency: self.last_latency,
            latency: self.latency.snapshot(),
        }
    }
}

#[derive(Debug, Default)]
struct ConnectionTable {
    next_id: u64,
    // BTreeMap keeps `cons` output in registration order.
    entries: BTreeMap<u64, ConnectionEntry>,
}

#[derive(Debug, Clone)]
struct NodeEntry {
    data_len: u64,
    ephemeral_owner: Option<SessionId>,
}

#[derive(Debug, Default)]
struct DataTree {
    last_zxid: i64,
    nodes: BTreeMap<String, NodeEntry>,
    sessions: BTreeSet<SessionId>,
    session_watches: BTreeMap<SessionId, BTreeSet<String>>,
    path_watches: BTreeMap<String, BTreeSet<SessionId>>,
}

impl DataTree {
    fn ephemerals(&self) -> BTreeMap<SessionId, Vec<String>> {
        let mut by_owner: BTreeMap<SessionId, Vec<String>> = BTreeMap::new();
        for (path, node) in &self.nodes {
            if let Some(owner) = node.ephemeral_owner {
                by_owner.entry(owner).or_default().push(path.clone());
            }
        }
        by_owner
    }

    fn storage(&self) -> StorageSnapshot {
        let watch_count = self
            .session_watches
            .values()
            .map(|paths| paths.len() as u64)
            .sum();
        let ephemerals_count = self
            .nodes
            .values()
            .filter(|node| node.ephemeral_owner.is_some())
            .count() as u64;
        let approximate_data_size = self
            .nodes
            .iter()
            .map(|(path, node)| path.len() as u64 + node.data_len)
            .sum();

        StorageSnapshot {
            node_count: self.nodes.len() as u64,
            watch_count,
            ephemerals_count,
            approximate_data_size,
            sessions_with_watches_count: self.session_watches.len() as u64,
            watched_paths_count: self.path_watches.len() as u64,
        }
    }

    fn drop_watch(&mut self, session_id: SessionId, path: &str) {
        if let Some(paths) = self.session_watches.get_mut(&session_id) {
            paths.remove(path);
            if paths.is_empty() {
                self.session_watches.remove(&session_id);
            }
        }
        if let Some(sessions) = self.path_watches.get_mut(path) {
            sessions.remove(&session_id);
            if sessions.is_empty() {
                self.path_watches.remove(path);
            }
        }
    }
}

/// Self-contained engine keeping all state in memory.
pub struct LocalEngine {
    settings: KeeperSettings,
    quorum: RwLock<QuorumState>,
    server_stats: Mutex<ServerStats>,
    connections: RwLock<ConnectionTable>,
    tree: RwLock<DataTree>,
    read_only: AtomicBool,
}

impl LocalEngine {
    /// Create an engine in standalone mode with an empty tree.
    pub fn new(settings: KeeperSettings) -> Self {
        Self {
            settings,
            quorum: RwLock::new(QuorumState {
                role: ServerRole::Standalone,
                has_leader: true,
                outstanding_requests: 0,
                follower_count: 0,
                synced_follower_count: 0,
                pending_syncs: 0,
            }),
            server_stats: Mutex::new(ServerStats::default()),
            connections: RwLock::new(ConnectionTable::default()),
            tree: RwLock::new(DataTree::default()),
            read_only: AtomicBool::new(false),
        }
    }

    pub fn set_role(&self, role: ServerRole, has_leader: bool) {
        let mut quorum = self.quorum.write();
        quorum.role = role;
        quorum.has_leader = has_leader;
    }

    /// Follower bookkeeping, only reported while leader.
    pub fn set_follower_stats(&self, followers: u64, synced: u64, pending_syncs: u64) {
        let mut quorum = self.quorum.write();
        quorum.follower_count = followers;
        quorum.synced_follower_count = synced;
        quorum.pending_syncs = pending_syncs;
    }

    pub fn set_outstanding_requests(&self, count: u64) {
        self.quorum.write().outstanding_requests = count;
    }

    pub fn set_read_only(&self, read_only: bool) {
        self.read_only.store(read_only, Ordering::Release);
    }

    /// Count one request/response pair in the server-wide statistics.
    pub fn record_request(&self, latency_ms: u64) {
        let mut stats = self.server_stats.lock();
        stats.packets_received += 1;
        stats.packets_sent += 1;
        stats.latency.add(latency_ms);
    }

    /// Add a client connection to the connection table.
    pub fn register_connection(&self, peer: SocketAddr, session_id: SessionId) -> ConnectionId {
        let mut table = self.connections.write();
        let id = table.next_id;
        table.next_id += 1;
        table.entries.insert(
            id,
            ConnectionEntry {
                peer,
                session_id,
                session_timeout_ms: self.settings.session_timeout_ms,
                established_ms: now_ms(),
                packets_received: 0,
                packets_sent: 0,
                last_operation: None,
                last_cxid: -1,
                last_zxid: -1,
                last_response_ms: 0,
                last_latency: 0,
                latency: LatencyStats::new(),
            },
        );
        ConnectionId(id)
    }

    pub fn unregister_connection(&self, id: ConnectionId) -> bool {
        self.connections.write().entries.remove(&id.0).is_some()
    }

    /// Account a request served on `id`, in both the connection and the
    /// server-wide statistics. Returns false for an unknown connection.
    pub fn record_connection_request(
        &self,
        id: ConnectionId,
        operation: &str,
        cxid: i64,
        latency_ms: u64,
    ) -> bool {
        self.record_connection_batch([(id, operation, cxid, latency_ms)]) == 1
    }

    /// Account a batch of requests as one update of the connection table.
    /// Returns how many requests matched a live connection.
    pub fn record_connection_batch<'a>(
        &self,
        requests: impl IntoIterator<Item = (ConnectionId, &'a str, i64, u64)>,
    ) -> usize {
        let zxid = self.tree.read().last_zxid;
        let now = now_ms();
        let mut table = self.connections.write();
        let mut stats = self.server_stats.lock();
        let mut matched = 0;
        for (id, operation, cxid, latency_ms) in requests {
            let Some(entry) = table.entries.get_mut(&id.0) else {
                continue;
            };
            entry.packets_received += 1;
            entry.packets_sent += 1;
            entry.last_operation = Some(operation.to_string());
            entry.last_cxid = cxid;
            entry.last_zxid = zxid;
            entry.last_response_ms = now;
            entry.last_latency = latency_ms;
            entry.latency.add(latency_ms);

            stats.packets_received += 1;
            stats.packets_sent += 1;
            stats.latency.add(latency_ms);
            matched += 1;
        }
        matched
    }

    pub fn open_session(&self, session_id: SessionId) {
        self.tree.write().sessions.insert(session_id);
    }

    /// Close a session, dropping its ephemeral nodes and watches.
    pub fn close_session(&self, session_id: SessionId) {
        let mut tree = self.tree.write();
        if !tree.sessions.remove(&session_id) {
            return;
        }
        let before = tree.nodes.len();
        tree.nodes
            .retain(|_, node| node.ephemeral_owner != Some(session_id));
        if tree.nodes.len() != before {
            tree.last_zxid += 1;
        }
        if let Some(paths) = tree.session_watches.remove(&session_id) {
            for path in paths {
                if let Some(sessions) = tree.path_watches.get_mut(&path) {
                    sessions.remove(&session_id);
                    if sessions.is_empty() {
                        tree.path_watches.remove(&path);
                    }
                }
            }
        }
    }

    /// Create or overwrite a node. Ephemeral nodes need an open owner session.
    pub fn create_node(
        &self,
        path: &str,
        data_len: u64,
        ephemeral_owner: Option<SessionId>,
    ) -> bool {
        let mut tree = self.tree.write();
        if let Some(owner) = ephemeral_owner {
            if !tree.sessions.contains(&owner) {
                return false;
            }
        }
        tree.nodes.insert(
            path.to_string(),
            NodeEntry {
                data_len,
                ephemeral_owner,
            },
        );
        tree.last_zxid += 1;
        true
    }

    pub fn remove_node(&self, path: &str) -> bool {
        let mut tree = self.tree.write();
        if tree.nodes.remove(path).is_none() {
            return false;
        }
        tree.last_zxid += 1;
        true
    }

    pub fn add_watch(&self, session_id: SessionId, path: &str) {
        let mut tree = self.tree.write();
        tree.session_watches
            .entry(session_id)
            .or_default()
            .insert(path.to_string());
        tree.path_watches
            .entry(path.to_string())
            .or_default()
            .insert(session_id);
    }

    pub fn remove_watch(&self, session_id: SessionId, path: &str) {
        self.tree.write().drop_watch(session_id, path);
    }

    fn has_complete_view(&self) -> bool {
        matches!(
            self.quorum.read().role,
            ServerRole::Leader | ServerRole::Standalone
        )
    }
}

impl KeeperEngine for LocalEngine {
    fn info(&self) -> KeeperInfo {
        let quorum = self.quorum.read();
        let table = self.connections.read();
        let tree = self.tree.read();
        keeper_info(&quorum, &table, &tree)
    }

    fn server_stats(&self) -> ServerStatsSnapshot {
        self.server_stats.lock().snapshot()
    }

    fn server_report(&self) -> ServerReport {
        let quorum = self.quorum.read();
        let table = self.connections.read();
        let tree = self.tree.read();
        let stats = self.server_stats.lock();

        ServerReport {
            info: keeper_info(&quorum, &table, &tree),
            stats: stats.snapshot(),
            storage: tree.storage(),
            connections: table.entries.values().map(ConnectionEntry::snapshot).collect(),
        }
    }

    fn reset_server_stats(&self) {
        self.server_stats.lock().reset();
    }

    fn storage(&self) -> StorageSnapshot {
        self.tree.read().storage()
    }

    fn connections(&self) -> Vec<ConnectionSnapshot> {
        self.connections
            .read()
            .entries
            .values()
            .map(ConnectionEntry::snapshot)
            .collect()
    }

    fn reset_connection_stats(&self) {
        let mut table = self.connections.write();
        for entry in table.entries.values_mut() {
            entry.reset_stats();
        }
    }

    fn watches_by_session(&self) -> BTreeMap<SessionId, Vec<String>> {
        self.tree
            .read()
            .session_watches
            .iter()
            .map(|(session, paths)| (*session, paths.iter().cloned().collect()))
            .collect()
    }

    fn watches_by_path(&self) -> BTreeMap<String, Vec<SessionId>> {
        self.tree
            .read()
            .path_watches
            .iter()
            .map(|(path, sessions)| (path.clone(), sessions.iter().copied().collect()))
            .collect()
    }

    fn sessions_and_ephemerals(&self) -> SessionsDump {
        let complete = self.has_complete_view();
        // Non-leaders only know about sessions attached to this node.
        let local_sessions: BTreeSet<SessionId> = if complete {
            BTreeSet::new()
        } else {
            self.connections
                .read()
                .entries
                .values()
                .map(|entry| entry.session_id)
                .collect()
        };

        let tree = self.tree.read();
        let visible = |session: &SessionId| complete || local_sessions.contains(session);

        SessionsDump {
            sessions: tree.sessions.iter().copied().filter(visible).collect(),
            ephemerals: tree
                .ephemerals()
                .into_iter()
                .filter(|(owner, _)| visible(owner))
                .collect(),
        }
    }

    fn settings(&self) -> &KeeperSettings {
        &self.settings
    }

    fn snapshot_dir_size(&self) -> io::Result<u64> {
        dir_size(Path::new(&self.settings.snapshot_storage_path))
    }

    fn log_dir_size(&self) -> io::Result<u64> {
        dir_size(Path::new(&self.settings.log_storage_path))
    }

    fn is_read_only(&self) -> bool {
        self.read_only.load(Ordering::Acquire)
    }
}

fn keeper_info(quorum: &QuorumState, table: &ConnectionTable, tree: &DataTree) -> KeeperInfo {
    KeeperInfo {
        role: quorum.role,
        has_leader: quorum.has_leader,
        alive_connections_count: table.entries.len() as u64,
        outstanding_requests_count: quorum.outstanding_requests,
        last_zxid: tree.last_zxid,
        total_nodes_count: tree.nodes.len() as u64,
        follower_count: quorum.follower_count,
        synced_follower_count: quorum.synced_follower_count,
        pending_syncs: quorum.pending_syncs,
    }
}

/// Total size of regular files below `path`.
fn dir_size(path: &Path) -> io::Result<u64> {
    let mut total = 0;
    for entry in std::fs::read_dir(path)? {
        let entry = entry?;
        let file_type = entry.file_type()?;
        if file_type.is_dir() {
            total += dir_size(&entry.path())?;
        } else if file_type.is_file() {
            total += entry.metadata()?.len();
        }
    }
    Ok(total)
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
