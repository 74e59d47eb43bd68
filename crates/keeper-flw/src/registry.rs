// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Command registry and dispatch.
//!
//! Startup fills a [`RegistryBuilder`] and freezes it into a
//! [`CommandRegistry`] once the allow list is parsed. The frozen registry has
//! no interior mutability, so connection tasks share it through an `Arc`
//! without locking.

use crate::allow_list::AllowList;
use crate::code::CommandCode;
use crate::command::{Command, FourLetterCommand, NOP_MESSAGE};
use crate::engine::KeeperEngine;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Registry errors. All of them are startup-fatal.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("four letter word code {code} registered twice ({existing} and {new})")]
    DuplicateCode {
        code: CommandCode,
        existing: &'static str,
        new: &'static str,
    },

    #[error("four letter word commands are not initialized")]
    NotInitialized,

    #[error("four letter word commands are already initialized")]
    AlreadyInitialized,
}

/// Registration phase of the registry.
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    commands: HashMap<CommandCode, Command>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one command keyed by the code of its name.
    pub fn register_command(&mut self, command: Command) -> Result<(), RegistryError> {
        let code = command.code();
        if let Some(existing) = self.commands.get(&code) {
            return Err(RegistryError::DuplicateCode {
                code,
                existing: existing.name(),
                new: command.name(),
            });
        }
        self.commands.insert(code, command);
        Ok(())
    }

    /// Register the whole catalogue against `engine`.
    pub fn register_commands(
        &mut self,
        engine: &Arc<dyn KeeperEngine>,
    ) -> Result<(), RegistryError> {
        for kind in FourLetterCommand::ALL {
            self.register_command(Command::new(kind, Arc::clone(engine)))?;
        }
        Ok(())
    }

    pub fn is_known(&self, code: CommandCode) -> bool {
        self.commands.contains_key(&code)
    }

    /// Parse the allow list from the engine settings and freeze the registry.
    pub fn initialize_white_list(self, engine: &dyn KeeperEngine) -> CommandRegistry {
        let config = engine.settings().four_letter_word_white_list.as_str();
        let allow_list = AllowList::parse(config, |code| self.is_known(code));
        info!(
            "Four letter word commands ready: {} registered, allow list {:?}",
            self.commands.len(),
            config
        );
        CommandRegistry {
            commands: self.commands,
            allow_list,
        }
    }
}

/// How a received code was handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Executed(FourLetterCommand),
    Unknown,
    NotEnabled,
}

/// Result of dispatching one code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dispatch {
    pub outcome: Outcome,
    /// Bytes to write back before closing the connection.
    pub response: String,
}

/// Frozen code -> command map with its allow list.
#[derive(Debug)]
pub struct CommandRegistry {
    commands: HashMap<CommandCode, Command>,
    allow_list: AllowList,
}

impl CommandRegistry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    /// Register the full catalogue and read the allow list from `engine`.
    pub fn with_all_commands(engine: Arc<dyn KeeperEngine>) -> Result<Self, RegistryError> {
        let mut builder = RegistryBuilder::new();
        builder.register_commands(&engine)?;
        Ok(builder.initialize_white_list(engine.as_ref()))
    }

    pub fn get(&self, code: CommandCode) -> Option<&Command> {
        self.commands.get(&code)
    }

    pub fn is_known(&self, code: CommandCode) -> bool {
        self.commands.contains_key(&code)
    }

    pub fn is_enabled(&self, code: CommandCode) -> bool {
        self.allow_list.is_enabled(code)
    }

    pub fn allow_list(&self) -> &AllowList {
        &self.allow_list
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Resolve and run a received code.
    ///
    /// Unknown and disabled words get the same reply; only the returned
    /// outcome and the log tell them apart.
    pub fn dispatch(&self, code: CommandCode) -> Dispatch {
        let Some(command) = self.get(code) else {
            warn!("Invalid four letter word command {}", code);
            return self.reject(Outcome::Unknown);
        };
        if !self.is_enabled(code) {
            warn!("Not enabled four letter word command {}", code);
            return self.reject(Outcome::NotEnabled);
        }

        debug!("Received four letter word command {}", command.name());
        Dispatch {
            outcome: Outcome::Executed(command.kind()),
            response: command.run(),
        }
    }

    fn reject(&self, outcome: Outcome) -> Dispatch {
        let response = self
            .get(FourLetterCommand::Nop.code())
            .map(Command::run)
            .unwrap_or_else(|| NOP_MESSAGE.to_string());
        Dispatch { outcome, response }
    }
}

/// Slot holding the registry once startup has produced it.
///
/// The server checks it before accepting any connection.
#[derive(Debug, Default)]
pub struct RegistryCell {
    registry: OnceLock<Arc<CommandRegistry>>,
}

impl RegistryCell {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install the registry. Only the first call succeeds.
    pub fn initialize(&self, registry: CommandRegistry) -> Result<(), RegistryError> {
        self.registry
            .set(Arc::new(registry))
            .map_err(|_| RegistryError::AlreadyInitialized)
    }

    pub fn is_initialized(&self) -> bool {
        self.registry.get().is_some()
    }

    /// Registry handle, or `NotInitialized` if startup has not finished.
    pub fn check_initialization(&self) -> Result<Arc<CommandRegistry>, RegistryError> {
        self.registry
            .get()
            .cloned()
            .ok_or(RegistryError::NotInitialized)
    }
}
