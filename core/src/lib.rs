// Copyright (c) 2023 The mfc-attack Authors

//! MIFARE Classic key recovery core
//!
//! This provides a common [Engine][engine::Engine] orchestrating dictionary attacks
//! against MIFARE Classic cards, independent of the platform running the card session.
//!
//! Interactions with the [Engine][engine::Engine] are performed via [Event][engine::Event]s
//! raised by a card session and [Output][engine::Output]s returned to it, with
//! platform collaborators (storage, dictionaries, session control, device records)
//! provided through the [Driver][engine::Driver] trait.
//!
//! ## Operations
//!
//! An attack runs in up to two phases:
//!
//! 1. The user dictionary phase, attempted when a non-empty user dictionary is present
//! 2. The system dictionary phase, entered when the user phase completes (or is skipped
//!    with a card in the field), or directly when no usable user dictionary exists
//!
//! Within each phase the session drives the attack:
//!
//! 1. [`RequestMode`][engine::Event::RequestMode] returns the card data already known
//!    for the device, seeding sector and key counters
//! 2. [`RequestKey`][engine::Event::RequestKey] pulls the next candidate from the active
//!    dictionary, returning [`Output::NoKey`][engine::Output::NoKey] once exhausted
//! 3. [`NextSector`][engine::Event::NextSector] and
//!    [`KeyAttackStop`][engine::Event::KeyAttackStop] rewind the dictionary
//! 4. [`Success`][engine::Event::Success] persists card data and signals
//!    [`AttackComplete`][engine::Signal::AttackComplete] to the owner, which then calls
//!    [`Engine::on_signal`][engine::Engine::on_signal] to advance or finish
//!
//! [`Engine::exit`][engine::Engine::exit] tears down the session and dictionary and resets
//! all progress, and may be called at any time.
//!

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "alloc")]
extern crate alloc;

pub mod card;

pub mod dict;

pub mod engine;

pub mod helpers;

pub use card::{CardData, CardType, Key, KeyType};
