// Copyright (c) 2023 The mfc-attack Authors

use strum::Display;

/// Owner-context signals, raised by the [Engine][super::Engine] via
/// [Driver::notify][super::Driver::notify] or by the presentation layer
#[derive(Copy, Clone, PartialEq, Eq, Debug, Display)]
pub enum Signal {
    /// Card entered the field
    CardDetected,
    /// Card left the field
    CardLost,
    /// Attack progress changed
    DataUpdate,
    /// Session completed the current phase
    AttackComplete,
    /// User requested to skip the current phase
    Skip,
}

/// Read confidence reported when an attack finishes
#[derive(Copy, Clone, PartialEq, Eq, Debug, Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ReadResult {
    /// All sector keys recovered
    Full,
    /// Some sector keys remain unknown
    Partial,
}

/// Result of handling a [Signal]
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Outcome {
    /// Nothing further to do
    None,
    /// Advanced to the system dictionary with a new session
    Restarted,
    /// Attack finished, owner should exit the engine
    Finished(ReadResult),
}
