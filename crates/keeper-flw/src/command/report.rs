// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Server and connection reports: `mntr`, `srvr`, `stat`, `cons`.

use super::NOT_SERVING_MESSAGE;
use crate::engine::{ConnectionSnapshot, KeeperEngine, ServerReport};
use crate::sys::{self, VERSION};
use std::fmt::{Display, Write as _};

/// `zk_<key>\t<value>` lines, leader-only lines present only on the leader.
pub(super) fn monitor(engine: &dyn KeeperEngine) -> String {
    let report = engine.server_report();
    if !report.info.has_leader {
        return NOT_SERVING_MESSAGE.to_string();
    }
    let ServerReport {
        info,
        stats,
        storage,
        ..
    } = report;

    let mut buf = String::new();
    print(&mut buf, "version", VERSION);

    print(&mut buf, "avg_latency", stats.latency.avg);
    print(&mut buf, "max_latency", stats.latency.max);
    print(&mut buf, "min_latency", stats.latency.min);
    print(&mut buf, "packets_received", stats.packets_received);
    print(&mut buf, "packets_sent", stats.packets_sent);

    print(&mut buf, "num_alive_connections", info.alive_connections_count);
    print(&mut buf, "outstanding_requests", info.outstanding_requests_count);
    print(&mut buf, "server_state", info.role);

    print(&mut buf, "znode_count", storage.node_count);
    print(&mut buf, "watch_count", storage.watch_count);
    print(&mut buf, "ephemerals_count", storage.ephemerals_count);
    print(&mut buf, "approximate_data_size", storage.approximate_data_size);

    if let Some(open) = sys::open_file_descriptor_count() {
        print(&mut buf, "open_file_descriptor_count", open);
    }
    if let Some(max) = sys::max_file_descriptor_count() {
        print(&mut buf, "max_file_descriptor_count", max);
    }

    if info.role.is_leader() {
        print(&mut buf, "followers", info.follower_count);
        print(&mut buf, "synced_followers", info.synced_follower_count);
        print(&mut buf, "pending_syncs", info.pending_syncs);
    }

    buf
}

fn print(buf: &mut String, key: &str, value: impl Display) {
    let _ = writeln!(buf, "zk_{}\t{}", key, value);
}

pub(super) fn server_stat(engine: &dyn KeeperEngine) -> String {
    let report = engine.server_report();
    if !report.info.has_leader {
        return NOT_SERVING_MESSAGE.to_string();
    }
    let mut buf = String::new();
    write_version(&mut buf);
    write_server_body(&mut buf, &report);
    buf
}

/// `srvr` with a brief client listing spliced in after the version.
pub(super) fn stat(engine: &dyn KeeperEngine) -> String {
    let report = engine.server_report();
    if !report.info.has_leader {
        return NOT_SERVING_MESSAGE.to_string();
    }
    let mut buf = String::new();
    write_version(&mut buf);
    buf.push_str("Clients:\n");
    for conn in &report.connections {
        write_connection(&mut buf, conn, true);
    }
    buf.push('\n');
    write_server_body(&mut buf, &report);
    buf
}

pub(super) fn connections(engine: &dyn KeeperEngine) -> String {
    let mut buf = String::new();
    for conn in engine.connections() {
        write_connection(&mut buf, &conn, false);
    }
    buf.push('\n');
    buf
}

fn write_version(buf: &mut String) {
    let _ = writeln!(buf, "Keeper version: {}", VERSION);
}

fn write_server_body(buf: &mut String, report: &ServerReport) {
    let ServerReport { info, stats, .. } = report;

    let mut field = |key: &str, value: &dyn Display| {
        let _ = writeln!(buf, "{}: {}", key, value);
    };
    field(
        "Latency min/avg/max",
        &format_args!(
            "{}/{}/{}",
            stats.latency.min, stats.latency.avg, stats.latency.max
        ),
    );
    field("Received", &stats.packets_received);
    field("Sent", &stats.packets_sent);
    field("Connections", &info.alive_connections_count);
    field("Outstanding", &info.outstanding_requests_count);
    field("Zxid", &format_args!("0x{:x}", info.last_zxid));
    field("Mode", &info.role);
    field("Node count", &info.total_nodes_count);
}

fn write_connection(buf: &mut String, conn: &ConnectionSnapshot, brief: bool) {
    let _ = write!(
        buf,
        " {}(recved={},sent={}",
        conn.peer, conn.packets_received, conn.packets_sent
    );
    if !brief {
        if conn.session_id != 0 {
            let _ = write!(
                buf,
                ",sid=0x{:016x},lop={},est={},to={}",
                conn.session_id,
                conn.last_operation.as_deref().unwrap_or("NA"),
                conn.established_ms,
                conn.session_timeout_ms
            );
        }
        let _ = write!(
            buf,
            ",lcxid=0x{:x},lzxid=0x{:x},lresp={},llat={},minlat={},avglat={},maxlat={}",
            conn.last_cxid,
            conn.last_zxid,
            conn.last_response_ms,
            conn.last_latency,
            conn.latency.min,
            conn.latency.avg,
            conn.latency.max
        );
    }
    buf.push_str(")\n");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{KeeperSettings, LocalEngine, ServerRole};
    use std::net::SocketAddr;

    fn engine() -> LocalEngine {
        LocalEngine::new(KeeperSettings::default())
    }

    fn keys(report: &str) -> Vec<&str> {
        report
            .lines()
            .filter_map(|line| line.split('\t').next())
            .collect()
    }

    #[test]
    fn test_monitor_line_format() {
        let out = monitor(&engine());
        for line in out.lines() {
            assert!(line.starts_with("zk_"), "bad line {:?}", line);
            assert_eq!(line.split('\t').count(), 2, "bad line {:?}", line);
        }
        assert!(out.contains(&format!("zk_version\t{}\n", VERSION)));
        assert!(out.contains("zk_server_state\tstandalone\n"));
    }

    #[test]
    fn test_monitor_leader_only_fields() {
        let engine = engine();
        engine.set_follower_stats(2, 2, 1);

        for role in [ServerRole::Follower, ServerRole::Observer, ServerRole::Standalone] {
            engine.set_role(role, true);
            let out = monitor(&engine);
            let keys = keys(&out);
            assert!(!keys.contains(&"zk_followers"));
            assert!(!keys.contains(&"zk_synced_followers"));
            assert!(!keys.contains(&"zk_pending_syncs"));
        }

        engine.set_role(ServerRole::Leader, true);
        let out = monitor(&engine);
        assert!(out.contains("zk_followers\t2\n"));
        assert!(out.contains("zk_synced_followers\t2\n"));
        assert!(out.contains("zk_pending_syncs\t1\n"));
    }

    #[test]
    fn test_not_serving_without_leader() {
        let engine = engine();
        engine.set_role(ServerRole::Follower, false);
        assert_eq!(monitor(&engine), NOT_SERVING_MESSAGE);
        assert_eq!(server_stat(&engine), NOT_SERVING_MESSAGE);
        assert_eq!(stat(&engine), NOT_SERVING_MESSAGE);
    }

    #[test]
    fn test_server_stat_body() {
        let engine = engine();
        engine.record_request(3);
        engine.record_request(5);
        engine.create_node("/a", 1, None);

        let out = server_stat(&engine);
        assert!(out.starts_with("Keeper version: "));
        assert!(out.contains("Latency min/avg/max: 3/4/5\n"));
        assert!(out.contains("Received: 2\n"));
        assert!(out.contains("Sent: 2\n"));
        assert!(out.contains("Zxid: 0x1\n"));
        assert!(out.contains("Mode: standalone\n"));
        assert!(out.contains("Node count: 1\n"));
    }

    #[test]
    fn test_stat_lists_clients_briefly() {
        let engine = engine();
        let peer = SocketAddr::from(([10, 0, 0, 7], 41000));
        let id = engine.register_connection(peer, 0x42);
        engine.record_connection_request(id, "GETD", 1, 2);

        let out = stat(&engine);
        assert!(out.contains("Clients:\n 10.0.0.7:41000(recved=1,sent=1)\n\n"));
        assert!(!out.contains("sid="));
        assert!(out.contains("Connections: 1\n"));
    }

    #[test]
    fn test_cons_full_details() {
        let engine = engine();
        let peer = SocketAddr::from(([10, 0, 0, 7], 41000));
        let id = engine.register_connection(peer, 0x42);
        engine.record_connection_request(id, "GETD", 9, 2);

        let out = connections(&engine);
        assert!(out.starts_with(" 10.0.0.7:41000(recved=1,sent=1,sid=0x0000000000000042,lop=GETD,"));
        assert!(out.contains(",lcxid=0x9,"));
        assert!(out.contains(",llat=2,minlat=2,avglat=2,maxlat=2)\n"));
        assert!(out.ends_with(")\n\n"));
    }

    #[test]
    fn test_cons_without_connections() {
        assert_eq!(connections(&engine()), "\n");
    }
}
