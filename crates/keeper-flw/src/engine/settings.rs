// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Coordination server settings reported by `conf`.

use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

/// Default four-letter word allow list.
pub const DEFAULT_FOUR_LETTER_WORD_WHITE_LIST: &str =
    "conf,cons,crst,envi,ruok,srst,srvr,stat,wchc,wchs,dirs,mntr,isro";

/// Settings of the coordination server hosting the admin commands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeeperSettings {
    #[serde(default = "default_server_id")]
    pub server_id: u32,

    /// Client port of the coordination server.
    #[serde(default = "default_tcp_port")]
    pub tcp_port: u16,

    /// `*` for every word, otherwise a comma or whitespace separated list.
    #[serde(default = "default_white_list")]
    pub four_letter_word_white_list: String,

    #[serde(default = "default_log_storage_path")]
    pub log_storage_path: String,

    #[serde(default = "default_snapshot_storage_path")]
    pub snapshot_storage_path: String,

    #[serde(default = "default_session_timeout_ms")]
    pub session_timeout_ms: u64,

    #[serde(default = "default_operation_timeout_ms")]
    pub operation_timeout_ms: u64,

    #[serde(default = "default_dead_session_check_period_ms")]
    pub dead_session_check_period_ms: u64,

    #[serde(default = "default_heart_beat_interval_ms")]
    pub heart_beat_interval_ms: u64,

    #[serde(default = "default_election_timeout_lower_bound_ms")]
    pub election_timeout_lower_bound_ms: u64,

    #[serde(default = "default_election_timeout_upper_bound_ms")]
    pub election_timeout_upper_bound_ms: u64,

    #[serde(default = "default_reserved_log_items")]
    pub reserved_log_items: u64,

    #[serde(default = "default_snapshot_distance")]
    pub snapshot_distance: u64,

    #[serde(default = "default_snapshots_to_keep")]
    pub snapshots_to_keep: u64,

    #[serde(default = "default_true")]
    pub auto_forwarding: bool,

    #[serde(default = "default_max_requests_batch_size")]
    pub max_requests_batch_size: u64,

    #[serde(default)]
    pub quorum_reads: bool,

    #[serde(default = "default_true")]
    pub force_sync: bool,
}

fn default_server_id() -> u32 {
    1
}

fn default_tcp_port() -> u16 {
    2181
}

fn default_white_list() -> String {
    DEFAULT_FOUR_LETTER_WORD_WHITE_LIST.to_string()
}

fn default_log_storage_path() -> String {
    "/var/lib/keeper/logs".to_string()
}

fn default_snapshot_storage_path() -> String {
    "/var/lib/keeper/snapshots".to_string()
}

fn default_session_timeout_ms() -> u64 {
    30_000
}

fn default_operation_timeout_ms() -> u64 {
    10_000
}

fn default_dead_session_check_period_ms() -> u64 {
    500
}

fn default_heart_beat_interval_ms() -> u64 {
    500
}

fn default_election_timeout_lower_bound_ms() -> u64 {
    1_000
}

fn default_election_timeout_upper_bound_ms() -> u64 {
    2_000
}

fn default_reserved_log_items() -> u64 {
    100_000
}

fn default_snapshot_distance() -> u64 {
    100_000
}

fn default_snapshots_to_keep() -> u64 {
    3
}

fn default_true() -> bool {
    true
}

fn default_max_requests_batch_size() -> u64 {
    100
}

impl Default for KeeperSettings {
    fn default() -> Self {
        Self {
            server_id: default_server_id(),
            tcp_port: default_tcp_port(),
            four_letter_word_white_list: default_white_list(),
            log_storage_path: default_log_storage_path(),
            snapshot_storage_path: default_snapshot_storage_path(),
            session_timeout_ms: default_session_timeout_ms(),
            operation_timeout_ms: default_operation_timeout_ms(),
            dead_session_check_period_ms: default_dead_session_check_period_ms(),
            heart_beat_interval_ms: default_heart_beat_interval_ms(),
            election_timeout_lower_bound_ms: default_election_timeout_lower_bound_ms(),
            election_timeout_upper_bound_ms: default_election_timeout_upper_bound_ms(),
            reserved_log_items: default_reserved_log_items(),
            snapshot_distance: default_snapshot_distance(),
            snapshots_to_keep: default_snapshots_to_keep(),
            auto_forwarding: true,
            max_requests_batch_size: default_max_requests_batch_size(),
            quorum_reads: false,
            force_sync: true,
        }
    }
}

impl KeeperSettings {
    /// Render as `key=value` lines in a stable order.
    pub fn dump(&self) -> String {
        let mut buf = String::new();
        let mut line = |key: &str, value: &dyn std::fmt::Display| {
            let _ = writeln!(buf, "{}={}", key, value);
        };

        line("server_id", &self.server_id);
        line("tcp_port", &self.tcp_port);
        line(
            "four_letter_word_white_list",
            &self.four_letter_word_white_list,
        );
        line("log_storage_path", &self.log_storage_path);
        line("snapshot_storage_path", &self.snapshot_storage_path);
        line("session_timeout_ms", &self.session_timeout_ms);
        line("operation_timeout_ms", &self.operation_timeout_ms);
        line(
            "dead_session_check_period_ms",
            &self.dead_session_check_period_ms,
        );
        line("heart_beat_interval_ms", &self.heart_beat_interval_ms);
        line(
            "election_timeout_lower_bound_ms",
            &self.election_timeout_lower_bound_ms,
        );
        line(
            "election_timeout_upper_bound_ms",
            &self.election_timeout_upper_bound_ms,
        );
        line("reserved_log_items", &self.reserved_log_items);
        line("snapshot_distance", &self.snapshot_distance);
        line("snapshots_to_keep", &self.snapshots_to_keep);
        line("auto_forwarding", &self.auto_forwarding);
        line("max_requests_batch_size", &self.max_requests_batch_size);
        line("quorum_reads", &self.quorum_reads);
        line("force_sync", &self.force_sync);

        buf
    }
}
