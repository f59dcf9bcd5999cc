//! Byte order providers for fixed-width unsigned integers.
//!
//! Besides the usual little/big orders this covers the legacy PDP-11 "middle"
//! layout, where 16-bit words are little-endian but wider values are built
//! from those words most-significant-word first.

use serde::{Deserialize, Serialize};

/// Byte order used to decode (and encode) multi-byte integers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ByteOrder {
    Little,
    Big,
    /// Host order, resolved at compile time.
    #[default]
    Native,
    /// PDP-11 word order.
    Middle,
}

impl ByteOrder {
    /// The concrete order `Native` stands for on this host.
    pub const fn host() -> ByteOrder {
        if cfg!(target_endian = "big") {
            ByteOrder::Big
        } else {
            ByteOrder::Little
        }
    }

    /// Collapse `Native` into the host's concrete order.
    pub const fn resolve(self) -> ByteOrder {
        match self {
            ByteOrder::Native => ByteOrder::host(),
            other => other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ByteOrder::Little => "little",
            ByteOrder::Big => "big",
            ByteOrder::Native => "native",
            ByteOrder::Middle => "middle",
        }
    }

    pub fn u16_from(self, b: [u8; 2]) -> u16 {
        match self.resolve() {
            ByteOrder::Big => u16::from_be_bytes(b),
            _ => u16::from_le_bytes(b),
        }
    }

    pub fn u32_from(self, b: [u8; 4]) -> u32 {
        match self.resolve() {
            ByteOrder::Little => u32::from_le_bytes(b),
            ByteOrder::Big => u32::from_be_bytes(b),
            _ => {
                let hi = u16::from_le_bytes([b[0], b[1]]) as u32;
                let lo = u16::from_le_bytes([b[2], b[3]]) as u32;
                (hi << 16) | lo
            }
        }
    }

    pub fn u64_from(self, b: [u8; 8]) -> u64 {
        match self.resolve() {
            ByteOrder::Little => u64::from_le_bytes(b),
            ByteOrder::Big => u64::from_be_bytes(b),
            _ => b
                .chunks_exact(2)
                .fold(0u64, |acc, word| (acc << 16) | u16::from_le_bytes([word[0], word[1]]) as u64),
        }
    }

    pub fn u16_to(self, v: u16) -> [u8; 2] {
        match self.resolve() {
            ByteOrder::Big => v.to_be_bytes(),
            _ => v.to_le_bytes(),
        }
    }

    pub fn u32_to(self, v: u32) -> [u8; 4] {
        match self.resolve() {
            ByteOrder::Little => v.to_le_bytes(),
            ByteOrder::Big => v.to_be_bytes(),
            _ => {
                let [a, b] = ((v >> 16) as u16).to_le_bytes();
                let [c, d] = (v as u16).to_le_bytes();
                [a, b, c, d]
            }
        }
    }

    pub fn u64_to(self, v: u64) -> [u8; 8] {
        match self.resolve() {
            ByteOrder::Little => v.to_le_bytes(),
            ByteOrder::Big => v.to_be_bytes(),
            _ => {
                let mut out = [0u8; 8];
                for (i, word) in out.chunks_exact_mut(2).enumerate() {
                    let shift = 48 - 16 * i as u32;
                    word.copy_from_slice(&((v >> shift) as u16).to_le_bytes());
                }
                out
            }
        }
    }
}
