// Copyright (c) 2023 The mfc-attack Authors

//! MIFARE Classic dictionary attack host library (and CLI)
//!
//! This provides file-backed dictionaries, filesystem staging and tokio-based
//! card session plumbing for the platform-independent [Engine][engine::Engine],
//! with [AttackHandle] owning the engine for the lifetime of an attack.
//!

/// Re-export `mfc-attack-core` for consumers
pub use mfc_attack_core::{card, engine, helpers};

pub use mfc_attack_core::{CardData, CardType, Key, KeyType};

mod error;
pub use error::Error;

pub mod dict;
pub use dict::FileDict;

mod config;
pub use config::DictConfig;

pub mod session;
pub use session::{Done, Request, Session, SessionLink};

mod driver;
pub use driver::HostDriver;

mod handle;
pub use handle::{AttackHandle, Report, SkipHandle};
