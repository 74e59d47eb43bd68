// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Four-letter word command catalogue.
//!
//! Every word a client may send maps to one [`FourLetterCommand`] variant. The
//! set is closed: it is fixed by wire compatibility with ZooKeeper tooling,
//! so the catalogue is an enum rather than an open trait.

mod report;
mod watches;

use crate::code::{to_code, CommandCode};
use crate::engine::KeeperEngine;
use crate::sys::{Environment, VERSION};
use std::fmt::Write as _;
use std::sync::Arc;

/// Reply for words that are unknown or not in the allow list.
///
/// Both cases share one message so that callers cannot probe which words
/// exist on this server.
pub const NOP_MESSAGE: &str = "command is not executed because it is not in the whitelist\n";

/// Reply of `mntr`, `srvr` and `stat` while no leader is known.
pub const NOT_SERVING_MESSAGE: &str = "This instance is not currently serving requests\n";

/// One variant per supported four-letter word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FourLetterCommand {
    /// `ruok`: replies `imok` when the process is alive.
    Ruok,
    /// `mntr`: key/value health variables.
    Monitor,
    /// `srst`: reset server statistics.
    StatReset,
    /// `nopc`: fixed message for rejected words.
    Nop,
    /// `conf`: server configuration.
    Conf,
    /// `cons`: full connection details.
    Cons,
    /// `crst`: reset connection statistics.
    RestConnStats,
    /// `srvr`: full server details.
    ServerStat,
    /// `stat`: brief server and client details.
    Stat,
    /// `wchs`: watch summary.
    BriefWatch,
    /// `wchc`: watches by session. Cost grows with the watch table.
    Watch,
    /// `wchp`: watches by path. Cost grows with the watch table.
    WatchByPath,
    /// `dump`: sessions and ephemeral nodes. Complete only on the leader.
    Dump,
    /// `envi`: serving environment.
    Envi,
    /// `dirs`: snapshot and log directory sizes.
    DataSize,
    /// `isro`: `ro` or `rw`.
    IsReadOnly,
}

impl FourLetterCommand {
    /// Every supported command, in registration order.
    pub const ALL: [FourLetterCommand; 16] = [
        FourLetterCommand::Ruok,
        FourLetterCommand::Monitor,
        FourLetterCommand::StatReset,
        FourLetterCommand::Nop,
        FourLetterCommand::Conf,
        FourLetterCommand::Cons,
        FourLetterCommand::RestConnStats,
        FourLetterCommand::ServerStat,
        FourLetterCommand::Stat,
        FourLetterCommand::BriefWatch,
        FourLetterCommand::Watch,
        FourLetterCommand::WatchByPath,
        FourLetterCommand::Dump,
        FourLetterCommand::Envi,
        FourLetterCommand::DataSize,
        FourLetterCommand::IsReadOnly,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            FourLetterCommand::Ruok => "ruok",
            FourLetterCommand::Monitor => "mntr",
            FourLetterCommand::StatReset => "srst",
            FourLetterCommand::Nop => "nopc",
            FourLetterCommand::Conf => "conf",
            FourLetterCommand::Cons => "cons",
            FourLetterCommand::RestConnStats => "crst",
            FourLetterCommand::ServerStat => "srvr",
            FourLetterCommand::Stat => "stat",
            FourLetterCommand::BriefWatch => "wchs",
            FourLetterCommand::Watch => "wchc",
            FourLetterCommand::WatchByPath => "wchp",
            FourLetterCommand::Dump => "dump",
            FourLetterCommand::Envi => "envi",
            FourLetterCommand::DataSize => "dirs",
            FourLetterCommand::IsReadOnly => "isro",
        }
    }

    pub const fn code(self) -> CommandCode {
        let name = self.name().as_bytes();
        to_code(&[name[0], name[1], name[2], name[3]])
    }

    /// Produce this command's report from the engine's current state.
    pub fn run(self, engine: &dyn KeeperEngine) -> String {
        match self {
            FourLetterCommand::Ruok => "imok".to_string(),
            FourLetterCommand::Monitor => report::monitor(engine),
            FourLetterCommand::StatReset => {
                engine.reset_server_stats();
                "Server stats reset.\n".to_string()
            }
            FourLetterCommand::Nop => NOP_MESSAGE.to_string(),
            FourLetterCommand::Conf => engine.settings().dump(),
            FourLetterCommand::Cons => report::connections(engine),
            FourLetterCommand::RestConnStats => {
                engine.reset_connection_stats();
                "Connection stats reset.\n".to_string()
            }
            FourLetterCommand::ServerStat => report::server_stat(engine),
            FourLetterCommand::Stat => report::stat(engine),
            FourLetterCommand::BriefWatch => watches::brief(engine),
            FourLetterCommand::Watch => watches::by_session(engine),
            FourLetterCommand::WatchByPath => watches::by_path(engine),
            FourLetterCommand::Dump => watches::sessions_and_ephemerals(engine),
            FourLetterCommand::Envi => environment(),
            FourLetterCommand::DataSize => data_size(engine),
            FourLetterCommand::IsReadOnly => {
                let mode = if engine.is_read_only() { "ro" } else { "rw" };
                mode.to_string()
            }
        }
    }
}

/// A command bound to the engine it reports on.
#[derive(Clone)]
pub struct Command {
    kind: FourLetterCommand,
    engine: Arc<dyn KeeperEngine>,
}

impl Command {
    pub fn new(kind: FourLetterCommand, engine: Arc<dyn KeeperEngine>) -> Self {
        Self { kind, engine }
    }

    pub fn kind(&self) -> FourLetterCommand {
        self.kind
    }

    pub fn name(&self) -> &'static str {
        self.kind.name()
    }

    pub fn code(&self) -> CommandCode {
        self.kind.code()
    }

    pub fn run(&self) -> String {
        self.kind.run(self.engine.as_ref())
    }
}

impl std::fmt::Debug for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Command").field("kind", &self.kind).finish()
    }
}

fn environment() -> String {
    let env = Environment::current();
    let mut buf = String::from("Environment:\n");
    let _ = writeln!(buf, "keeper.version={}", VERSION);
    let _ = writeln!(buf, "host.name={}", env.host_name);
    let _ = writeln!(buf, "os.name={}", env.os_name);
    let _ = writeln!(buf, "os.arch={}", env.os_arch);
    let _ = writeln!(buf, "os.family={}", env.os_family);
    let _ = writeln!(buf, "cpu.count={}", env.cpu_count);
    let _ = writeln!(buf, "user.name={}", env.user_name);
    let _ = writeln!(buf, "user.home={}", env.user_home);
    let _ = writeln!(buf, "user.dir={}", env.user_dir);
    let _ = writeln!(buf, "user.tmp={}", env.user_tmp);
    buf
}

fn data_size(engine: &dyn KeeperEngine) -> String {
    let mut buf = String::new();
    match engine.snapshot_dir_size() {
        Ok(size) => {
            let _ = writeln!(buf, "snapshot_dir_size: {}", size);
        }
        Err(e) => tracing::warn!("dirs: cannot size snapshot directory: {}", e),
    }
    match engine.log_dir_size() {
        Ok(size) => {
            let _ = writeln!(buf, "log_dir_size: {}", size);
        }
        Err(e) => tracing::warn!("dirs: cannot size log directory: {}", e),
    }
    buf
}
