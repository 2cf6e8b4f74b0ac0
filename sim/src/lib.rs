// Copyright (c) 2023 The mfc-attack Authors

//! Virtual MIFARE Classic card and simulated attack sessions
//!
//! This provides a [VirtualCard] (loaded from JSON fixtures) and a
//! [VirtualPoller] card session for running dictionary attacks via
//! [mfc_attack::AttackHandle] without hardware.

mod card;
pub use card::{VirtualCard, VirtualSector, DEFAULT_KEY};

mod poller;
pub use poller::{PollerOptions, VirtualPoller};
