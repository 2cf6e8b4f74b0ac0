// Copyright (c) 2023 The mfc-attack Authors

use heapless::String;

use super::Error;

/// Maximum dictionary path length
pub const PATH_MAX: usize = 128;

/// Dictionary locations used by the [Engine][super::Engine]
///
/// Each dictionary has a source path (opened for iteration) and a nested
/// path holding the working copy staged at phase entry for nested attacks.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct DictPaths {
    user: String<PATH_MAX>,
    user_nested: String<PATH_MAX>,
    system: String<PATH_MAX>,
    system_nested: String<PATH_MAX>,
}

impl DictPaths {
    /// Create a new set of dictionary paths
    pub fn new(
        user: &str,
        user_nested: &str,
        system: &str,
        system_nested: &str,
    ) -> Result<Self, Error> {
        Ok(Self {
            user: String::try_from(user).map_err(|_| Error::InvalidLength)?,
            user_nested: String::try_from(user_nested).map_err(|_| Error::InvalidLength)?,
            system: String::try_from(system).map_err(|_| Error::InvalidLength)?,
            system_nested: String::try_from(system_nested).map_err(|_| Error::InvalidLength)?,
        })
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    pub fn user_nested(&self) -> &str {
        &self.user_nested
    }

    pub fn system(&self) -> &str {
        &self.system
    }

    pub fn system_nested(&self) -> &str {
        &self.system_nested
    }
}
