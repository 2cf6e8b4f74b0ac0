// Copyright (c) 2023 The mfc-attack Authors

use strum::Display;

use crate::card::{Key, KeyType};

use super::progress::DataUpdate;

/// [`Engine`][super::Engine] input events, raised by the card session
#[derive(Copy, Clone, PartialEq, Debug, Display)]
pub enum Event {
    /// Card entered the field
    CardDetected,

    /// Card left the field
    CardLost,

    /// Session requests the attack mode and known card data
    RequestMode,

    /// Session requests the next dictionary key
    RequestKey,

    /// Session moved to the next sector
    NextSector {
        current_sector: u8,
    },

    /// Session found key A for a sector
    FoundKeyA {
        sector: u8,
        key: Key,
    },

    /// Session found key B for a sector
    FoundKeyB {
        sector: u8,
        key: Key,
    },

    /// Bulk progress update
    DataUpdate(DataUpdate),

    /// Session started a focused key attack on a sector
    KeyAttackStart {
        current_sector: u8,
    },

    /// Session finished a focused key attack
    KeyAttackStop,

    /// Session completed
    Success,
}

impl Event {
    /// Build a found key event for the provided key slot
    pub fn found_key(sector: u8, key_type: KeyType, key: Key) -> Self {
        match key_type {
            KeyType::A => Event::FoundKeyA { sector, key },
            KeyType::B => Event::FoundKeyB { sector, key },
        }
    }
}
