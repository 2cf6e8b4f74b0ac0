// Copyright (c) 2023 The mfc-attack Authors

//! Attack vectors pairing virtual cards with dictionaries

use std::str::FromStr;

use mfc_attack::{engine::ReadResult, CardType, Key};
use mfc_attack_sim::VirtualCard;

/// Test vector for a full dictionary attack
#[derive(Clone, Debug)]
pub struct Vector {
    pub name: &'static str,
    pub card_type: CardType,
    /// Non-default sector keys (sector, A, B)
    pub sectors: &'static [(u8, &'static str, &'static str)],
    /// User dictionary contents, `None` for no user dictionary
    pub user: Option<&'static [&'static str]>,
    /// System dictionary contents
    pub system: &'static [&'static str],
    /// Expected read result
    pub result: ReadResult,
    /// Expected number of recovered keys
    pub keys_found: u8,
}

impl Vector {
    /// Build the virtual card for this vector
    pub fn card(&self) -> VirtualCard {
        self.sectors
            .iter()
            .fold(VirtualCard::new(self.card_type), |c, (s, a, b)| {
                c.with_sector(*s, key(a), key(b))
            })
    }

    pub fn user_keys(&self) -> Option<Vec<Key>> {
        self.user.map(|k| k.iter().map(|k| key(k)).collect())
    }

    pub fn system_keys(&self) -> Vec<Key> {
        self.system.iter().map(|k| key(k)).collect()
    }
}

/// Parse a hex key
pub fn key(s: &str) -> Key {
    Key::from_str(s).unwrap()
}

pub const DEFAULT: &str = "FFFFFFFFFFFF";

pub const VECTORS: &[Vector] = &[
    Vector {
        name: "system_default_keys",
        card_type: CardType::Mini,
        sectors: &[],
        user: None,
        system: &[DEFAULT],
        result: ReadResult::Full,
        keys_found: 10,
    },
    Vector {
        name: "user_then_system",
        card_type: CardType::Mini,
        sectors: &[(0, "A0A1A2A3A4A5", "B0B1B2B3B4B5")],
        user: Some(&["A0A1A2A3A4A5"]),
        system: &["000000000000", DEFAULT, "B0B1B2B3B4B5"],
        result: ReadResult::Full,
        keys_found: 10,
    },
    Vector {
        name: "empty_user_dictionary",
        card_type: CardType::Mini,
        sectors: &[],
        user: Some(&[]),
        system: &[DEFAULT],
        result: ReadResult::Full,
        keys_found: 10,
    },
    Vector {
        name: "partial_read",
        card_type: CardType::Mini,
        sectors: &[(2, "123456789ABC", "123456789ABC")],
        user: None,
        system: &["A0A1A2A3A4A5", DEFAULT],
        result: ReadResult::Partial,
        keys_found: 8,
    },
    Vector {
        name: "classic_1k_key_reuse",
        card_type: CardType::Classic1k,
        sectors: &[
            (1, "D3F7D3F7D3F7", "D3F7D3F7D3F7"),
            (15, "D3F7D3F7D3F7", DEFAULT),
        ],
        user: Some(&["D3F7D3F7D3F7"]),
        system: &["A0A1A2A3A4A5", DEFAULT],
        result: ReadResult::Full,
        keys_found: 32,
    },
];
