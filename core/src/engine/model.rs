// Copyright (c) 2023 The mfc-attack Authors

//! Progress model for presentation layers
//!
//! Written only by the [Engine][super::Engine], read at any time by the
//! presentation layer. Last write wins.

use core::fmt;

use super::progress::{Backdoor, NestedPhase, PrngType};
use crate::helpers::dict_progress;

/// Header shown while the user dictionary is in use
pub const HEADER_USER_DICT: &str = "MF Classic User Dictionary";

/// Header shown while the system dictionary is in use
pub const HEADER_SYSTEM_DICT: &str = "MF Classic System Dictionary";

/// Presentation projection of attack progress
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct ProgressModel {
    header: &'static str,
    card_present: bool,
    key_attack: Option<u8>,

    sectors_total: u8,
    sectors_read: u8,
    keys_found: u8,
    current_sector: u8,

    dict_keys_total: u32,
    dict_keys_current: u32,

    nested_phase: NestedPhase,
    prng_type: PrngType,
    backdoor: Backdoor,
    nested_target_key: u16,
    msb_count: u16,
}

impl ProgressModel {
    /// Create an empty progress model
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset the model to defaults
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn set_header(&mut self, header: &'static str) {
        self.header = header;
    }

    pub fn set_card_state(&mut self, present: bool) {
        self.card_present = present;
    }

    /// Enter key attack display for the provided sector
    pub fn set_key_attack(&mut self, sector: u8) {
        self.key_attack = Some(sector);
    }

    /// Leave key attack display
    pub fn reset_key_attack(&mut self) {
        self.key_attack = None;
    }

    pub fn set_sectors_total(&mut self, v: u8) {
        self.sectors_total = v;
    }

    pub fn set_sectors_read(&mut self, v: u8) {
        self.sectors_read = v;
    }

    pub fn set_keys_found(&mut self, v: u8) {
        self.keys_found = v;
    }

    pub fn set_current_sector(&mut self, v: u8) {
        self.current_sector = v;
    }

    pub fn set_total_dict_keys(&mut self, v: u32) {
        self.dict_keys_total = v;
    }

    pub fn set_current_dict_key(&mut self, v: u32) {
        self.dict_keys_current = v;
    }

    pub fn set_nested_phase(&mut self, v: NestedPhase) {
        self.nested_phase = v;
    }

    pub fn set_prng_type(&mut self, v: PrngType) {
        self.prng_type = v;
    }

    pub fn set_backdoor(&mut self, v: Backdoor) {
        self.backdoor = v;
    }

    pub fn set_nested_target_key(&mut self, v: u16) {
        self.nested_target_key = v;
    }

    pub fn set_msb_count(&mut self, v: u16) {
        self.msb_count = v;
    }

    pub fn header(&self) -> &'static str {
        self.header
    }

    pub fn card_present(&self) -> bool {
        self.card_present
    }

    /// Sector under key attack, if a key attack is active
    pub fn key_attack(&self) -> Option<u8> {
        self.key_attack
    }

    pub fn sectors_total(&self) -> u8 {
        self.sectors_total
    }

    pub fn sectors_read(&self) -> u8 {
        self.sectors_read
    }

    pub fn keys_found(&self) -> u8 {
        self.keys_found
    }

    pub fn current_sector(&self) -> u8 {
        self.current_sector
    }

    pub fn dict_keys_total(&self) -> u32 {
        self.dict_keys_total
    }

    pub fn dict_keys_current(&self) -> u32 {
        self.dict_keys_current
    }

    pub fn nested_phase(&self) -> NestedPhase {
        self.nested_phase
    }

    pub fn prng_type(&self) -> PrngType {
        self.prng_type
    }

    pub fn backdoor(&self) -> Backdoor {
        self.backdoor
    }

    pub fn nested_target_key(&self) -> u16 {
        self.nested_target_key
    }

    pub fn msb_count(&self) -> u16 {
        self.msb_count
    }

    /// Dictionary progress for the current sector (percentage)
    pub fn dict_progress(&self) -> u8 {
        dict_progress(self.dict_keys_current, self.dict_keys_total)
    }
}

impl fmt::Display for ProgressModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(s) = self.key_attack {
            return write!(f, "{}: key attack on sector {}", self.header, s);
        }

        write!(
            f,
            "{}: sector {}/{} keys {}/{} read {} dict {}/{} ({}%)",
            self.header,
            self.current_sector,
            self.sectors_total,
            self.keys_found,
            self.sectors_total as u16 * 2,
            self.sectors_read,
            self.dict_keys_current,
            self.dict_keys_total,
            self.dict_progress(),
        )?;

        if self.nested_phase != NestedPhase::None {
            write!(
                f,
                " nested {} (prng: {}, backdoor: {}, target: {}, msb: {})",
                self.nested_phase,
                self.prng_type,
                self.backdoor,
                self.nested_target_key,
                self.msb_count
            )?;
        }

        if !self.card_present {
            write!(f, " [no card]")?;
        }

        Ok(())
    }
}
