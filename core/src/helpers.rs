// Copyright (c) 2023 The mfc-attack Authors

use core::str::{from_utf8, FromStr};

use crate::card::{Key, KEY_SIZE};

/// Hex-encoded key length
pub const KEY_HEX_LEN: usize = KEY_SIZE * 2;

/// Format a key as upper-case hex into the provided buffer
pub fn fmt_key<'a>(key: &Key, buff: &'a mut [u8; KEY_HEX_LEN]) -> &'a str {
    const CHARS: &[u8; 16] = b"0123456789ABCDEF";

    for (i, b) in key.0.iter().enumerate() {
        buff[i * 2] = CHARS[(b >> 4) as usize];
        buff[i * 2 + 1] = CHARS[(b & 0x0f) as usize];
    }

    match from_utf8(&buff[..]) {
        Ok(v) => v,
        Err(_) => "INVALID_UTF8",
    }
}

/// Line parsing result for text dictionaries
#[derive(Copy, Clone, PartialEq, Debug)]
pub enum DictLine {
    /// Blank or comment line
    Skip,
    /// Valid key entry
    Key(Key),
    /// Line could not be parsed as a key
    Invalid,
}

/// Parse a single dictionary line (`#` comments and blank lines are skipped)
pub fn parse_dict_line(line: &str) -> DictLine {
    let l = line.trim();

    if l.is_empty() || l.starts_with('#') {
        return DictLine::Skip;
    }

    if l.len() != KEY_HEX_LEN {
        return DictLine::Invalid;
    }

    match Key::from_str(l) {
        Ok(k) => DictLine::Key(k),
        Err(_) => DictLine::Invalid,
    }
}

/// Compute dictionary progress as a percentage
pub fn dict_progress(current: u32, total: u32) -> u8 {
    // Avoid divide by zero for empty dictionaries
    if total == 0 {
        return 0;
    }

    let v = (current as u64 * 100) / total as u64;

    // Clamp to a maximum of 100
    v.min(100) as u8
}
