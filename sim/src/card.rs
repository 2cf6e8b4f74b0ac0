// Copyright (c) 2023 The mfc-attack Authors

//! Virtual MIFARE Classic card, loaded from JSON fixtures
//!
//! ```json
//! {
//!   "card_type": "Mini",
//!   "prng": "Weak",
//!   "sectors": [
//!     { "a": "FFFFFFFFFFFF", "b": "A0A1A2A3A4A5" }
//!   ]
//! }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use mfc_attack_core::{
    card::{CardType, Key, KeyType},
    engine::{Backdoor, PrngType},
};

/// Sector keys for a virtual card
#[derive(Copy, Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct VirtualSector {
    #[serde(with = "hex_key")]
    pub a: Key,
    #[serde(with = "hex_key")]
    pub b: Key,
}

/// Virtual card, authenticating sector keys against a fixed key set
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct VirtualCard {
    pub card_type: CardType,

    /// Sector keys, sectors beyond this list use factory default keys
    #[serde(default)]
    pub sectors: Vec<VirtualSector>,

    #[serde(default)]
    pub prng: PrngType,

    #[serde(default)]
    pub backdoor: Backdoor,
}

/// Factory default sector key
pub const DEFAULT_KEY: Key = Key([0xff; 6]);

impl VirtualCard {
    /// Create a virtual card with default keys in every sector
    pub fn new(card_type: CardType) -> Self {
        Self {
            card_type,
            sectors: vec![],
            prng: PrngType::Weak,
            backdoor: Backdoor::None,
        }
    }

    /// Set keys for a sector, filling preceding sectors with default keys
    pub fn with_sector(mut self, sector: u8, a: Key, b: Key) -> Self {
        let i = sector as usize;
        while self.sectors.len() <= i {
            self.sectors.push(VirtualSector {
                a: DEFAULT_KEY,
                b: DEFAULT_KEY,
            });
        }
        self.sectors[i] = VirtualSector { a, b };
        self
    }

    /// Load a virtual card from a JSON file
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let s = std::fs::read_to_string(path)?;
        let c = serde_json::from_str(&s)?;
        Ok(c)
    }

    pub fn total_sectors(&self) -> u8 {
        self.card_type.total_sectors()
    }

    /// Fetch the key for a sector slot
    pub fn key(&self, sector: u8, key_type: KeyType) -> Option<Key> {
        if sector >= self.total_sectors() {
            return None;
        }

        let k = match self.sectors.get(sector as usize) {
            Some(s) if key_type == KeyType::A => s.a,
            Some(s) => s.b,
            None => DEFAULT_KEY,
        };

        Some(k)
    }

    /// Attempt authentication with a key
    pub fn authenticate(&self, sector: u8, key_type: KeyType, key: &Key) -> bool {
        self.key(sector, key_type).as_ref() == Some(key)
    }
}

/// Hex string serialisation for keys
mod hex_key {
    use std::str::FromStr;

    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    use mfc_attack_core::card::Key;

    pub fn serialize<S: Serializer>(k: &Key, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&k.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Key, D::Error> {
        let s = String::deserialize(d)?;
        Key::from_str(&s).map_err(|e| D::Error::custom(format!("invalid key '{s}': {e}")))
    }
}
