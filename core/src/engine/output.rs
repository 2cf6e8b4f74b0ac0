// Copyright (c) 2023 The mfc-attack Authors

use strum::Display;

use crate::card::{CardData, Key};

/// Session control command
#[derive(Copy, Clone, PartialEq, Eq, Debug, Display)]
pub enum Command {
    /// Continue the session
    Continue,
    /// Stop the session
    Stop,
}

/// [`Engine`][super::Engine] outputs (in response to session events)
#[derive(Clone, PartialEq, Debug)]
pub enum Output {
    None,

    /// Dictionary attack mode, with the card data already known for the device
    Mode(CardData),

    /// Next dictionary key
    Key(Key),

    /// Dictionary exhausted
    NoKey,

    /// Stop the session
    Stop,
}

impl Output {
    /// Fetch the session command for this output
    pub fn command(&self) -> Command {
        match self {
            Output::Stop => Command::Stop,
            _ => Command::Continue,
        }
    }

    /// Fetch the provided key, if any
    pub fn key(&self) -> Option<Key> {
        match self {
            Output::Key(k) => Some(*k),
            _ => None,
        }
    }
}
