// Copyright (c) 2023 The mfc-attack Authors

//! Tests for MIFARE Classic dictionary attacks.
//!
//! Vectors pair a virtual card with user and system dictionaries, scenarios
//! run them end to end via [mfc_attack::AttackHandle].
//!

pub mod vectors;

pub mod scenario;
