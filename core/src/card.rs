// Copyright (c) 2023 The mfc-attack Authors

//! MIFARE Classic card data model

use core::{fmt, str::FromStr};

use heapless::Vec;
use static_assertions::const_assert;
use strum::{Display, EnumIter, EnumString};

use crate::helpers::{fmt_key, KEY_HEX_LEN};

/// Size of a MIFARE Classic sector key in bytes
pub const KEY_SIZE: usize = 6;

/// Maximum number of sectors on any supported card (MIFARE Classic 4K)
pub const MAX_SECTORS: usize = 40;

// Sector key state is tracked in u64 bitmaps
const_assert!(MAX_SECTORS <= 64);

/// Sector authentication key (one dictionary candidate)
#[derive(Copy, Clone, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Key(pub [u8; KEY_SIZE]);

impl Key {
    /// Create a key from raw bytes
    pub const fn new(b: [u8; KEY_SIZE]) -> Self {
        Self(b)
    }

    /// Fetch raw key bytes
    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.0
    }
}

impl From<[u8; KEY_SIZE]> for Key {
    fn from(b: [u8; KEY_SIZE]) -> Self {
        Self(b)
    }
}

impl AsRef<[u8]> for Key {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut buff = [0u8; KEY_HEX_LEN];
        f.write_str(fmt_key(self, &mut buff))
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Key({self})")
    }
}

impl FromStr for Key {
    type Err = hex::FromHexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut b = [0u8; KEY_SIZE];
        hex::decode_to_slice(s.trim(), &mut b)?;
        Ok(Self(b))
    }
}

/// Sector key slot
#[derive(Copy, Clone, PartialEq, Eq, Debug, Display, EnumString, EnumIter)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum KeyType {
    A,
    B,
}

/// MIFARE Classic card variants
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default, Display, EnumString, EnumIter)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CardType {
    /// MIFARE Mini (320 bytes, 5 sectors)
    Mini,
    /// MIFARE Classic 1K (16 sectors)
    #[default]
    Classic1k,
    /// MIFARE Classic 4K (32 small + 8 large sectors)
    Classic4k,
}

impl CardType {
    /// Number of sectors for this card type
    pub const fn total_sectors(&self) -> u8 {
        match self {
            CardType::Mini => 5,
            CardType::Classic1k => 16,
            CardType::Classic4k => 40,
        }
    }
}

/// Known keys for a single sector
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SectorKeys {
    pub key_a: Option<Key>,
    pub key_b: Option<Key>,
}

impl SectorKeys {
    /// Fetch the key for a given slot
    pub fn get(&self, key_type: KeyType) -> Option<Key> {
        match key_type {
            KeyType::A => self.key_a,
            KeyType::B => self.key_b,
        }
    }

    /// Number of resolved key slots in this sector
    pub fn found(&self) -> u8 {
        self.key_a.is_some() as u8 + self.key_b.is_some() as u8
    }
}

/// Card data as read (or partially read) from a card
///
/// This tracks the keys recovered per sector and is exchanged between the
/// card session, the [Engine][crate::engine::Engine] and the device record.
#[derive(Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CardData {
    pub card_type: CardType,
    pub sectors: Vec<SectorKeys, MAX_SECTORS>,
}

impl Default for CardData {
    fn default() -> Self {
        Self::new(CardType::default())
    }
}

impl CardData {
    /// Create empty card data for the provided card type
    pub fn new(card_type: CardType) -> Self {
        let mut sectors = Vec::new();
        for _ in 0..card_type.total_sectors() {
            // Capacity is MAX_SECTORS, always sufficient
            let _ = sectors.push(SectorKeys::default());
        }

        Self { card_type, sectors }
    }

    /// Number of sectors for this card
    pub fn total_sectors(&self) -> u8 {
        self.card_type.total_sectors()
    }

    /// Fetch a sector key if known
    pub fn key(&self, sector: u8, key_type: KeyType) -> Option<Key> {
        self.sectors
            .get(sector as usize)
            .and_then(|s| s.get(key_type))
    }

    /// Check whether a sector key is known
    pub fn is_key_found(&self, sector: u8, key_type: KeyType) -> bool {
        self.key(sector, key_type).is_some()
    }

    /// Record a recovered sector key, ignoring out-of-range sectors
    pub fn set_key(&mut self, sector: u8, key_type: KeyType, key: Key) {
        if let Some(s) = self.sectors.get_mut(sector as usize) {
            match key_type {
                KeyType::A => s.key_a = Some(key),
                KeyType::B => s.key_b = Some(key),
            }
        }
    }

    /// Count sectors with at least one known key and the total number of known keys
    pub fn read_sectors_and_keys(&self) -> (u8, u8) {
        self.sectors
            .iter()
            .fold((0, 0), |(sectors, keys), s| match s.found() {
                0 => (sectors, keys),
                n => (sectors + 1, keys + n),
            })
    }

    /// Check whether every key on the card is known
    pub fn is_card_read(&self) -> bool {
        self.sectors.len() == self.total_sectors() as usize
            && self.sectors.iter().all(|s| s.found() == 2)
    }
}

#[cfg(test)]
mod test {
    extern crate std;

    use super::*;

    #[test]
    fn key_hex() {
        let k = Key::from_str("a0a1A2a3a4a5").unwrap();
        assert_eq!(k, Key([0xa0, 0xa1, 0xa2, 0xa3, 0xa4, 0xa5]));

        let mut buff = [0u8; 12];
        let s = crate::helpers::fmt_key(&k, &mut buff);
        assert_eq!(s, "A0A1A2A3A4A5");
        assert_eq!(std::format!("{k}"), "A0A1A2A3A4A5");
        assert_eq!(std::format!("{k:?}"), "Key(A0A1A2A3A4A5)");

        assert!(Key::from_str("a0a1a2").is_err());
        assert!(Key::from_str("zzzzzzzzzzzz").is_err());
    }

    #[test]
    fn read_sectors_and_keys() {
        let mut d = CardData::new(CardType::Mini);
        assert_eq!(d.sectors.len(), 5);
        assert_eq!(d.read_sectors_and_keys(), (0, 0));

        d.set_key(0, KeyType::A, Key([0xff; 6]));
        d.set_key(0, KeyType::B, Key([0xff; 6]));
        d.set_key(3, KeyType::B, Key([0x00; 6]));
        assert_eq!(d.read_sectors_and_keys(), (2, 3));

        // Out of range sectors are ignored
        d.set_key(12, KeyType::A, Key([0x00; 6]));
        assert_eq!(d.read_sectors_and_keys(), (2, 3));
        assert!(!d.is_card_read());

        for s in 0..5 {
            d.set_key(s, KeyType::A, Key([0x11; 6]));
            d.set_key(s, KeyType::B, Key([0x22; 6]));
        }
        assert!(d.is_card_read());
    }

    #[test]
    fn total_sectors() {
        let tests = &[
            (CardType::Mini, 5),
            (CardType::Classic1k, 16),
            (CardType::Classic4k, 40),
        ];

        for (t, n) in tests {
            assert_eq!(t.total_sectors(), *n);
            assert_eq!(CardData::new(*t).sectors.len(), *n as usize);
        }
    }
}
