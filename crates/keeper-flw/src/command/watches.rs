// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Watch and session reports: `wchs`, `wchc`, `wchp`, `dump`.

use crate::engine::KeeperEngine;
use std::fmt::Write as _;

pub(super) fn brief(engine: &dyn KeeperEngine) -> String {
    let storage = engine.storage();
    format!(
        "{} connections watching {} paths\nTotal watches:{}\n",
        storage.sessions_with_watches_count, storage.watched_paths_count, storage.watch_count
    )
}

pub(super) fn by_session(engine: &dyn KeeperEngine) -> String {
    let mut buf = String::new();
    for (session, paths) in engine.watches_by_session() {
        let _ = writeln!(buf, "0x{:016x}", session);
        for path in paths {
            let _ = writeln!(buf, "\t{}", path);
        }
    }
    buf
}

pub(super) fn by_path(engine: &dyn KeeperEngine) -> String {
    let mut buf = String::new();
    for (path, sessions) in engine.watches_by_path() {
        let _ = writeln!(buf, "{}", path);
        for session in sessions {
            let _ = writeln!(buf, "\t0x{:016x}", session);
        }
    }
    buf
}

pub(super) fn sessions_and_ephemerals(engine: &dyn KeeperEngine) -> String {
    let dump = engine.sessions_and_ephemerals();
    let mut buf = String::new();

    let _ = writeln!(buf, "Sessions dump ({}):", dump.sessions.len());
    for session in &dump.sessions {
        let _ = writeln!(buf, "0x{:016x}", session);
    }

    let _ = writeln!(buf, "Sessions with Ephemerals ({}):", dump.ephemerals.len());
    for (session, paths) in &dump.ephemerals {
        let _ = writeln!(buf, "0x{:016x}", session);
        for path in paths {
            let _ = writeln!(buf, "\t{}", path);
        }
    }
    buf
}
