// Copyright (c) 2023 The mfc-attack Authors

//! Attack progress bookkeeping

use strum::{Display, EnumIter, EnumString};

use crate::card::{CardData, KeyType, MAX_SECTORS};

/// Nested attack phase, as reported by the card session
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default, Display, EnumString, EnumIter)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NestedPhase {
    #[default]
    None,
    AnalyzePrng,
    DictAttack,
    DictAttackVerify,
    DictAttackResume,
    Calibrate,
    Recalibrate,
    CollectNtEnc,
    Finished,
}

/// Card PRNG classification
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default, Display, EnumString, EnumIter)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PrngType {
    #[default]
    Unknown,
    Classic,
    Weak,
    Static,
    Hardened,
}

/// Vendor authentication backdoor classification
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default, Display, EnumString, EnumIter)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Backdoor {
    #[default]
    Unknown,
    None,
    TypeA,
    TypeB,
}

/// Bulk progress snapshot reported by the card session
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DataUpdate {
    pub sectors_read: u8,
    pub keys_found: u8,
    pub current_sector: u8,
    pub nested_phase: NestedPhase,
    pub prng_type: PrngType,
    pub backdoor: Backdoor,
    pub nested_target_key: u16,
    pub msb_count: u16,
}

/// Current attack statistics, owned by the [Engine][super::Engine]
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
pub struct Progress {
    pub sectors_total: u8,
    pub sectors_read: u8,
    pub keys_found: u8,
    pub current_sector: u8,

    pub dict_keys_total: u32,
    pub dict_keys_current: u32,

    pub nested_phase: NestedPhase,
    pub prng_type: PrngType,
    pub backdoor: Backdoor,
    pub nested_target_key: u16,
    pub msb_count: u16,

    pub is_key_attack: bool,
    pub key_attack_current_sector: u8,

    pub is_card_present: bool,
}

impl Progress {
    /// Reset all fields to zero / unknown
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Merge a session progress snapshot, clamping sector values to the card size
    pub fn merge(&mut self, u: &DataUpdate) {
        self.sectors_read = u.sectors_read;
        self.keys_found = u.keys_found;
        self.nested_phase = u.nested_phase;
        self.prng_type = u.prng_type;
        self.backdoor = u.backdoor;
        self.nested_target_key = u.nested_target_key;
        self.msb_count = u.msb_count;

        self.set_current_sector(u.current_sector);

        self.sectors_read = self.sectors_read.min(self.sectors_total);
        self.keys_found = self.keys_found.min(self.sectors_total.saturating_mul(2));
    }

    /// Update the sector under attack, clamped to the last sector
    pub fn set_current_sector(&mut self, sector: u8) {
        self.current_sector = match self.sectors_total {
            0 => sector,
            n => sector.min(n - 1),
        };
    }
}

/// Per-sector key state (bitmap per key slot), bounded to the card sector count
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
pub struct KeyState {
    a: u64,
    b: u64,
    sectors: u8,
}

impl KeyState {
    /// Create empty key state for a card with the provided number of sectors
    pub fn new(sectors: u8) -> Self {
        Self {
            a: 0,
            b: 0,
            sectors: sectors.min(MAX_SECTORS as u8),
        }
    }

    /// Seed sector key state from known card data
    pub fn from_card(data: &CardData) -> Self {
        let mut s = Self::new(data.total_sectors());

        for (i, k) in data.sectors.iter().enumerate() {
            if k.key_a.is_some() {
                s.set(i as u8, KeyType::A);
            }
            if k.key_b.is_some() {
                s.set(i as u8, KeyType::B);
            }
        }

        s
    }

    /// Number of sectors tracked
    pub fn sectors(&self) -> u8 {
        self.sectors
    }

    /// Merge key state, keeping keys known to either within this card's sectors
    pub fn merge(&mut self, other: &KeyState) {
        let mask = self.mask();
        self.a |= other.a & mask;
        self.b |= other.b & mask;
    }

    /// Mark a sector key as found, ignoring sectors the card does not have
    pub fn set(&mut self, sector: u8, key_type: KeyType) {
        if sector >= self.sectors {
            return;
        }

        match key_type {
            KeyType::A => self.a |= 1 << sector,
            KeyType::B => self.b |= 1 << sector,
        }
    }

    /// Number of sectors with at least one known key
    pub fn sectors_read(&self) -> u8 {
        (self.a | self.b).count_ones() as u8
    }

    /// Total number of known keys
    pub fn keys_found(&self) -> u8 {
        (self.a.count_ones() + self.b.count_ones()) as u8
    }

    fn mask(&self) -> u64 {
        match self.sectors {
            0 => 0,
            n => u64::MAX >> (64 - n as u32),
        }
    }
}
