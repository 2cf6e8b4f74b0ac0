// Copyright (c) 2023 The mfc-attack Authors

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use mfc_attack_core::engine::DictPaths;

use crate::Error;

pub const SYSTEM_DICT: &str = "mf_classic_dict.nfc";
pub const USER_DICT: &str = "mf_classic_dict_user.nfc";
pub const SYSTEM_NESTED_DICT: &str = "mf_classic_dict_nested.nfc";
pub const USER_NESTED_DICT: &str = "mf_classic_dict_user_nested.nfc";

/// Dictionary locations
#[derive(Clone, PartialEq, Debug, clap::Args, Serialize, Deserialize)]
#[serde(default)]
pub struct DictConfig {
    /// Directory containing dictionary files
    #[clap(long, env = "MFC_DICT_DIR", default_value = ".")]
    pub dict_dir: PathBuf,

    /// System dictionary file name
    #[clap(long, default_value = SYSTEM_DICT)]
    pub system_dict: String,

    /// User dictionary file name
    #[clap(long, default_value = USER_DICT)]
    pub user_dict: String,

    /// System dictionary working copy for nested attacks
    #[clap(long, default_value = SYSTEM_NESTED_DICT)]
    pub system_nested_dict: String,

    /// User dictionary working copy for nested attacks
    #[clap(long, default_value = USER_NESTED_DICT)]
    pub user_nested_dict: String,
}

impl Default for DictConfig {
    fn default() -> Self {
        Self::new(".")
    }
}

impl DictConfig {
    /// Create a configuration using default file names in the provided directory
    pub fn new(dict_dir: impl AsRef<Path>) -> Self {
        Self {
            dict_dir: dict_dir.as_ref().to_path_buf(),
            system_dict: SYSTEM_DICT.to_string(),
            user_dict: USER_DICT.to_string(),
            system_nested_dict: SYSTEM_NESTED_DICT.to_string(),
            user_nested_dict: USER_NESTED_DICT.to_string(),
        }
    }

    pub fn system(&self) -> PathBuf {
        self.dict_dir.join(&self.system_dict)
    }

    pub fn user(&self) -> PathBuf {
        self.dict_dir.join(&self.user_dict)
    }

    pub fn system_nested(&self) -> PathBuf {
        self.dict_dir.join(&self.system_nested_dict)
    }

    pub fn user_nested(&self) -> PathBuf {
        self.dict_dir.join(&self.user_nested_dict)
    }

    /// Build engine dictionary paths
    pub fn paths(&self) -> Result<DictPaths, Error> {
        let user = path_str(self.user())?;
        let user_nested = path_str(self.user_nested())?;
        let system = path_str(self.system())?;
        let system_nested = path_str(self.system_nested())?;

        DictPaths::new(&user, &user_nested, &system, &system_nested).map_err(|_| {
            Error::InvalidPath(format!(
                "dictionary paths exceed {} bytes",
                mfc_attack_core::engine::PATH_MAX
            ))
        })
    }
}

fn path_str(p: PathBuf) -> Result<String, Error> {
    p.into_os_string()
        .into_string()
        .map_err(|p| Error::InvalidPath(p.to_string_lossy().to_string()))
}
