// Copyright (c) 2023 The mfc-attack Authors

//! File-backed key dictionaries
//!
//! Dictionaries are text files with one 12 digit hex key per line. Blank lines
//! and `#` comments are skipped, as are malformed lines (with a warning).

use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
};

use log::{debug, warn};

use mfc_attack_core::{
    card::Key,
    helpers::{parse_dict_line, DictLine},
};

pub use mfc_attack_core::dict::{Dictionary, MemDict, OpenMode};

use crate::Error;

/// File-backed [Dictionary], keys are loaded at open
#[derive(Clone, PartialEq, Debug)]
pub struct FileDict {
    path: PathBuf,
    keys: Vec<Key>,
    index: usize,
}

impl FileDict {
    /// Check whether a dictionary file exists
    pub fn is_present(path: impl AsRef<Path>) -> bool {
        path.as_ref().is_file()
    }

    /// Open a dictionary file with the provided mode
    pub fn open(path: impl AsRef<Path>, mode: OpenMode) -> Result<Self, Error> {
        let path = path.as_ref().to_path_buf();

        if !path.is_file() && mode == OpenMode::CreateIfAbsent {
            debug!("Creating empty dictionary '{}'", path.display());

            if let Some(p) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(p)?;
            }
            fs::write(&path, "")?;
        }

        let s = fs::read_to_string(&path)?;
        let keys = parse(&path, &s);

        debug!("Opened dictionary '{}' ({} keys)", path.display(), keys.len());

        Ok(Self {
            path,
            keys,
            index: 0,
        })
    }

    /// Append a key to a dictionary file (creating it if absent),
    /// returning `false` if the key already exists
    pub fn append(path: impl AsRef<Path>, key: &Key) -> Result<bool, Error> {
        let d = Self::open(path.as_ref(), OpenMode::CreateIfAbsent)?;
        if d.contains(key) {
            return Ok(false);
        }

        let mut f = fs::OpenOptions::new().append(true).open(path.as_ref())?;

        // Ensure the new key starts on a fresh line
        let s = fs::read_to_string(path.as_ref())?;
        if !s.is_empty() && !s.ends_with('\n') {
            writeln!(f)?;
        }
        writeln!(f, "{key}")?;

        Ok(true)
    }

    /// Dictionary file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loaded keys, in file order
    pub fn keys(&self) -> &[Key] {
        &self.keys
    }

    /// Check whether the dictionary contains a key
    pub fn contains(&self, key: &Key) -> bool {
        self.keys.contains(key)
    }
}

/// Parse a single hex-encoded key (12 digits, surrounding whitespace ignored)
pub fn parse_key(s: &str) -> Result<Key, Error> {
    match parse_dict_line(s) {
        DictLine::Key(k) => Ok(k),
        _ => Err(Error::InvalidKey(s.trim().to_string())),
    }
}

/// Parse dictionary text, warning on and skipping malformed lines
fn parse(path: &Path, s: &str) -> Vec<Key> {
    let mut keys = Vec::new();

    for (n, l) in s.lines().enumerate() {
        match parse_dict_line(l) {
            DictLine::Key(k) => keys.push(k),
            DictLine::Skip => (),
            DictLine::Invalid => {
                warn!("{}:{}: skipping invalid key '{}'", path.display(), n + 1, l.trim());
            }
        }
    }

    keys
}

impl Dictionary for FileDict {
    fn total_keys(&self) -> u32 {
        self.keys.len() as u32
    }

    fn next_key(&mut self) -> Option<Key> {
        let k = self.keys.get(self.index).copied()?;
        self.index += 1;
        Some(k)
    }

    fn rewind(&mut self) {
        self.index = 0;
    }

    fn release(self) {
        debug!("Released dictionary '{}'", self.path.display());
    }
}
