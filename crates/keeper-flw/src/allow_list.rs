// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Administrator allow list of four-letter words.

use crate::code::CommandCode;
use std::collections::HashSet;
use tracing::warn;

/// Configuration token enabling every registered word.
pub const ALLOW_ALL: &str = "*";

/// Words an administrator has enabled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AllowList {
    All,
    Only(HashSet<CommandCode>),
}

impl AllowList {
    /// Parse a comma or whitespace separated list of words, or `*`.
    ///
    /// Words rejected by `is_known` are logged and left out, so a typo can
    /// never enable a word that does not exist. An empty list enables nothing.
    pub fn parse(config: &str, is_known: impl Fn(CommandCode) -> bool) -> Self {
        let mut enabled = HashSet::new();

        for word in config
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|word| !word.is_empty())
        {
            if word == ALLOW_ALL {
                return AllowList::All;
            }
            match CommandCode::parse(word) {
                Some(code) if is_known(code) => {
                    enabled.insert(code);
                }
                _ => warn!(
                    "Invalid four letter word {:?} in allow list, ignoring it",
                    word
                ),
            }
        }

        AllowList::Only(enabled)
    }

    pub fn is_enabled(&self, code: CommandCode) -> bool {
        match self {
            AllowList::All => true,
            AllowList::Only(codes) => codes.contains(&code),
        }
    }
}
