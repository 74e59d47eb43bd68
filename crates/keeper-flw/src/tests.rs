// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

use super::*;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

fn engine_with_white_list(white_list: &str) -> Arc<LocalEngine> {
    Arc::new(LocalEngine::new(KeeperSettings {
        four_letter_word_white_list: white_list.to_string(),
        ..Default::default()
    }))
}

fn registry(engine: Arc<LocalEngine>) -> CommandRegistry {
    CommandRegistry::with_all_commands(engine).expect("catalogue registers cleanly")
}

fn code(name: &str) -> CommandCode {
    CommandCode::parse(name).expect("four byte word")
}

#[test]
fn test_every_word_registered() {
    let registry = registry(engine_with_white_list("*"));
    assert_eq!(registry.len(), FourLetterCommand::ALL.len());
    for kind in FourLetterCommand::ALL {
        let command = registry.get(kind.code()).expect("registered");
        assert_eq!(command.kind(), kind);
        assert_eq!(to_name(command.code()), kind.name());
    }
}

#[test]
fn test_duplicate_registration_is_fatal() {
    let engine: Arc<dyn KeeperEngine> = engine_with_white_list("*");
    let mut builder = RegistryBuilder::new();
    builder
        .register_command(Command::new(FourLetterCommand::Ruok, Arc::clone(&engine)))
        .unwrap();

    let err = builder
        .register_command(Command::new(FourLetterCommand::Ruok, engine))
        .unwrap_err();
    assert_eq!(
        err,
        RegistryError::DuplicateCode {
            code: code("ruok"),
            existing: "ruok",
            new: "ruok",
        }
    );
}

#[test]
fn test_allow_all_enables_every_registered_code() {
    let registry = registry(engine_with_white_list("*"));
    assert_eq!(registry.allow_list(), &AllowList::All);
    for kind in FourLetterCommand::ALL {
        assert!(registry.is_enabled(kind.code()), "{} disabled", kind.name());
    }
}

#[test]
fn test_allow_list_subset() {
    let registry = registry(engine_with_white_list("ruok,mntr"));
    assert!(registry.is_enabled(code("ruok")));
    assert!(registry.is_enabled(code("mntr")));
    assert!(!registry.is_enabled(code("dump")));
    assert!(registry.is_known(code("dump")));
}

#[test]
fn test_unknown_allow_list_entries_dropped() {
    let registry = registry(engine_with_white_list("ruok,zzzz,mntr"));
    assert!(!registry.is_known(code("zzzz")));
    assert!(!registry.is_enabled(code("zzzz")));
    assert!(registry.is_enabled(code("ruok")));
}

#[test]
fn test_default_allow_list() {
    let registry = registry(Arc::new(LocalEngine::new(KeeperSettings::default())));
    for word in DEFAULT_ENABLED {
        assert!(registry.is_enabled(code(word)), "{} disabled", word);
    }
    for word in ["wchp", "dump", "nopc"] {
        assert!(!registry.is_enabled(code(word)), "{} enabled", word);
    }
}

const DEFAULT_ENABLED: [&str; 13] = [
    "conf", "cons", "crst", "envi", "ruok", "srst", "srvr", "stat", "wchc", "wchs", "dirs",
    "mntr", "isro",
];

#[test]
fn test_dispatch_enabled_command() {
    let registry = registry(engine_with_white_list("ruok"));
    let reply = registry.dispatch(code("ruok"));
    assert_eq!(reply.outcome, Outcome::Executed(FourLetterCommand::Ruok));
    assert_eq!(reply.response, "imok");
}

#[test]
fn test_unknown_and_disabled_are_indistinguishable() {
    let registry = registry(engine_with_white_list("ruok"));

    let unknown = registry.dispatch(code("hack"));
    let disabled = registry.dispatch(code("dump"));
    let garbage = registry.dispatch(CommandCode::from_raw(0x0102_0304));

    assert_eq!(unknown.outcome, Outcome::Unknown);
    assert_eq!(disabled.outcome, Outcome::NotEnabled);
    assert_eq!(garbage.outcome, Outcome::Unknown);
    assert_eq!(unknown.response, disabled.response);
    assert_eq!(garbage.response, disabled.response);
    assert_eq!(unknown.response, NOP_MESSAGE);
}

#[test]
fn test_disabled_command_has_no_side_effect() {
    let engine = engine_with_white_list("mntr");
    engine.record_request(9);
    let registry = registry(Arc::clone(&engine));

    assert_eq!(registry.dispatch(code("srst")).outcome, Outcome::NotEnabled);
    assert_eq!(engine.server_stats().packets_received, 1);
}

#[test]
fn test_isro_dispatch() {
    let engine = engine_with_white_list("isro");
    let registry = registry(Arc::clone(&engine));
    assert_eq!(registry.dispatch(code("isro")).response, "rw");
    engine.set_read_only(true);
    assert_eq!(registry.dispatch(code("isro")).response, "ro");
}

#[test]
fn test_srst_then_mntr_shows_baseline() {
    let engine = engine_with_white_list("*");
    for latency in [5, 12, 7] {
        engine.record_request(latency);
    }
    let registry = registry(Arc::clone(&engine));

    let before = registry.dispatch(code("mntr")).response;
    assert!(before.contains("zk_packets_received\t3\n"));
    assert!(before.contains("zk_max_latency\t12\n"));

    assert_eq!(registry.dispatch(code("srst")).response, "Server stats reset.\n");

    let after = registry.dispatch(code("mntr")).response;
    assert!(after.contains("zk_avg_latency\t0\n"));
    assert!(after.contains("zk_max_latency\t0\n"));
    assert!(after.contains("zk_min_latency\t0\n"));
    assert!(after.contains("zk_packets_received\t0\n"));
    assert!(after.contains("zk_packets_sent\t0\n"));
}

#[test]
fn test_mntr_leader_fields_through_dispatch() {
    let engine = engine_with_white_list("*");
    engine.set_follower_stats(4, 3, 0);
    let registry = registry(Arc::clone(&engine));

    engine.set_role(ServerRole::Follower, true);
    let follower = registry.dispatch(code("mntr")).response;
    assert!(!follower.contains("zk_followers"));
    assert!(!follower.contains("zk_synced_followers"));
    assert!(!follower.contains("zk_pending_syncs"));

    engine.set_role(ServerRole::Leader, true);
    let leader = registry.dispatch(code("mntr")).response;
    assert!(leader.contains("zk_followers\t4\n"));
    assert!(leader.contains("zk_synced_followers\t3\n"));
    assert!(leader.contains("zk_pending_syncs\t0\n"));
}

#[test]
fn test_registry_cell_lifecycle() {
    let cell = RegistryCell::new();
    assert!(!cell.is_initialized());
    assert_eq!(
        cell.check_initialization().unwrap_err(),
        RegistryError::NotInitialized
    );

    cell.initialize(registry(engine_with_white_list("*"))).unwrap();
    assert!(cell.is_initialized());
    assert_eq!(cell.check_initialization().unwrap().len(), 16);

    let second = cell
        .initialize(registry(engine_with_white_list("*")))
        .unwrap_err();
    assert_eq!(second, RegistryError::AlreadyInitialized);
}

#[test]
fn test_concurrent_cons_and_crst_never_tear() {
    const CONNECTIONS: u16 = 32;

    let engine = engine_with_white_list("*");
    let ids: Vec<_> = (0..CONNECTIONS)
        .map(|i| engine.register_connection(SocketAddr::from(([127, 0, 0, 1], 20_000 + i)), 1))
        .collect();
    let registry = Arc::new(registry(Arc::clone(&engine)));
    let stop = Arc::new(AtomicBool::new(false));

    // Every connection is always bumped in lockstep, so a consistent snapshot
    // shows the same count on every line.
    let writer = {
        let engine = Arc::clone(&engine);
        let stop = Arc::clone(&stop);
        let ids = ids.clone();
        thread::spawn(move || {
            while !stop.load(Ordering::Relaxed) {
                engine.record_connection_batch(ids.iter().map(|id| (*id, "PING", 0, 1)));
            }
        })
    };

    let resetter = {
        let registry = Arc::clone(&registry);
        let stop = Arc::clone(&stop);
        thread::spawn(move || {
            while !stop.load(Ordering::Relaxed) {
                assert_eq!(
                    registry.dispatch(code("crst")).response,
                    "Connection stats reset.\n"
                );
            }
        })
    };

    for _ in 0..500 {
        let report = registry.dispatch(code("cons")).response;
        let counts: Vec<&str> = report
            .lines()
            .filter(|line| !line.is_empty())
            .map(|line| {
                let start = line.find("recved=").expect("recved field") + "recved=".len();
                let end = start + line[start..].find(',').expect("field separator");
                &line[start..end]
            })
            .collect();
        assert_eq!(counts.len(), CONNECTIONS as usize);
        assert!(
            counts.iter().all(|c| *c == counts[0]),
            "torn connection table: {:?}",
            counts
        );
    }

    stop.store(true, Ordering::Relaxed);
    writer.join().unwrap();
    resetter.join().unwrap();
}

#[test]
fn test_stat_clients_match_connection_count() {
    let engine = engine_with_white_list("*");
    engine.register_connection(SocketAddr::from(([127, 0, 0, 1], 20_000)), 1);
    let registry = Arc::new(registry(Arc::clone(&engine)));
    let stop = Arc::new(AtomicBool::new(false));

    let churn = {
        let engine = Arc::clone(&engine);
        let stop = Arc::clone(&stop);
        thread::spawn(move || {
            while !stop.load(Ordering::Relaxed) {
                let id = engine.register_connection(SocketAddr::from(([127, 0, 0, 1], 21_000)), 2);
                engine.record_connection_request(id, "PING", 0, 1);
                engine.unregister_connection(id);
            }
        })
    };

    for _ in 0..5_000 {
        let report = registry.dispatch(code("stat")).response;
        let listed = report.lines().filter(|line| line.starts_with(" 127.")).count();
        let counted: usize = report
            .lines()
            .find_map(|line| line.strip_prefix("Connections: "))
            .expect("connections line")
            .parse()
            .expect("connection count");
        assert_eq!(listed, counted, "clients disagree with count:\n{}", report);
    }

    stop.store(true, Ordering::Relaxed);
    churn.join().unwrap();
}

#[test]
fn test_server_report_counters_agree() {
    const CONNECTIONS: u16 = 8;

    let engine = engine_with_white_list("*");
    let ids: Vec<_> = (0..CONNECTIONS)
        .map(|i| engine.register_connection(SocketAddr::from(([127, 0, 0, 1], 22_000 + i)), 1))
        .collect();
    let stop = Arc::new(AtomicBool::new(false));

    let writer = {
        let engine = Arc::clone(&engine);
        let stop = Arc::clone(&stop);
        thread::spawn(move || {
            while !stop.load(Ordering::Relaxed) {
                engine.record_connection_batch(ids.iter().map(|id| (*id, "PING", 0, 1)));
            }
        })
    };

    for _ in 0..2_000 {
        let report = engine.server_report();
        let per_connection: u64 = report
            .connections
            .iter()
            .map(|conn| conn.packets_received)
            .sum();
        assert_eq!(report.stats.packets_received, per_connection);
        assert_eq!(report.info.alive_connections_count, CONNECTIONS as u64);
        assert_eq!(report.connections.len(), CONNECTIONS as usize);
    }

    stop.store(true, Ordering::Relaxed);
    writer.join().unwrap();
}
