// Copyright (c) 2023 The mfc-attack Authors

use mfc_attack_core::engine::Error as EngineError;

/// MIFARE Classic attack host error type
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Filesystem error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Attack engine error
    #[error("Engine operation failed: {0}")]
    Engine(#[from] EngineError),

    /// Card session or owner loop closed
    #[error("Card session closed")]
    SessionClosed,

    /// Path could not be used by the engine
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// Invalid key string
    #[error("Invalid key: {0}")]
    InvalidKey(String),
}
