// Copyright (c) 2023 The mfc-attack Authors

/// [Engine][super::Engine] errors
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "thiserror", derive(thiserror::Error))]
#[repr(u8)]
pub enum Error {
    /// Invalid argument length
    #[cfg_attr(feature = "thiserror", error("Invalid argument length"))]
    InvalidLength = 0x00,

    /// Failed to stage dictionary working copy (remove / copy)
    #[cfg_attr(feature = "thiserror", error("failed to stage dictionary working copy"))]
    StagingFailed = 0x01,

    /// System dictionary does not exist
    #[cfg_attr(feature = "thiserror", error("system dictionary missing"))]
    SystemDictMissing = 0x02,

    /// Dictionary could not be opened
    #[cfg_attr(feature = "thiserror", error("failed to open dictionary"))]
    DictOpenFailed = 0x03,

    /// Card session could not be started
    #[cfg_attr(feature = "thiserror", error("failed to start card session"))]
    SessionStartFailed = 0x04,

    /// Invalid engine state
    #[cfg_attr(feature = "thiserror", error("invalid engine state"))]
    InvalidState = 0x05,
}
