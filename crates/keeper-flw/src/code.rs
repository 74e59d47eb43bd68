// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Four-letter word code packing.
//!
//! A word such as `mntr` travels on the wire as four ASCII bytes. Internally
//! it is keyed by the big-endian `i32` those bytes form, so `ruok` becomes
//! `0x72756f6b`.

use std::fmt;

/// Packed 32-bit key of a four-letter word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CommandCode(i32);

impl CommandCode {
    /// Pack four bytes, most significant first.
    pub const fn from_bytes(name: [u8; 4]) -> Self {
        Self(i32::from_be_bytes(name))
    }

    /// Wrap a raw code read from a connection.
    pub const fn from_raw(code: i32) -> Self {
        Self(code)
    }

    /// Parse a textual word. Anything other than exactly four ASCII bytes is rejected.
    pub fn parse(name: &str) -> Option<Self> {
        let bytes: [u8; 4] = name.as_bytes().try_into().ok()?;
        if !bytes.is_ascii() {
            return None;
        }
        Some(Self::from_bytes(bytes))
    }

    /// Raw packed value.
    pub const fn raw(self) -> i32 {
        self.0
    }

    /// Unpack into the four original bytes.
    pub const fn to_bytes(self) -> [u8; 4] {
        self.0.to_be_bytes()
    }

    /// Unpack into a printable word. Non-ASCII bytes are replaced, so this is
    /// only an exact inverse for codes built from ASCII words.
    pub fn to_name(self) -> String {
        String::from_utf8_lossy(&self.to_bytes()).into_owned()
    }
}

impl fmt::Display for CommandCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bytes = self.to_bytes();
        if bytes.iter().all(|b| b.is_ascii_graphic()) {
            write!(f, "{}", self.to_name())
        } else {
            write!(f, "0x{:08x}", self.0 as u32)
        }
    }
}

/// Pack a four-letter word into its code.
pub const fn to_code(name: &[u8; 4]) -> CommandCode {
    CommandCode::from_bytes(*name)
}

/// Unpack a code into its four-letter word.
pub fn to_name(code: CommandCode) -> String {
    code.to_name()
}
