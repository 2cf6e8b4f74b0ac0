// Copyright (c) 2023 The mfc-attack Authors

//! End to end attack scenarios

use std::{
    fs,
    path::{Path, PathBuf},
};

use log::debug;

use mfc_attack::{AttackHandle, CardData, DictConfig, Key, KeyType, Report};
use mfc_attack_sim::{PollerOptions, VirtualPoller};

use crate::vectors::Vector;

/// Temporary dictionary directory, removed on drop
pub struct DictDir {
    path: PathBuf,
}

impl DictDir {
    /// Create an empty dictionary directory
    pub fn new() -> anyhow::Result<Self> {
        let n: u64 = rand::random();
        let path = std::env::temp_dir().join(format!("mfc-attack-{n:016x}"));

        fs::create_dir_all(&path)?;

        debug!("Created dictionary directory '{}'", path.display());

        Ok(Self { path })
    }

    /// Create a dictionary directory with the dictionaries for a vector
    pub fn setup(v: &Vector) -> anyhow::Result<Self> {
        let d = Self::new()?;
        let c = d.config();

        if let Some(k) = v.user_keys() {
            write_dict(&c.user(), &k)?;
        }
        write_dict(&c.system(), &v.system_keys())?;

        Ok(d)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Dictionary configuration for this directory
    pub fn config(&self) -> DictConfig {
        DictConfig::new(&self.path)
    }
}

impl Drop for DictDir {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.path);
    }
}

/// Write a dictionary file
pub fn write_dict(path: &Path, keys: &[Key]) -> anyhow::Result<()> {
    let mut s = String::from("# test dictionary\n");
    for k in keys {
        s.push_str(&format!("{k}\n"));
    }

    fs::write(path, s)?;

    Ok(())
}

/// Run a full attack for a vector
pub async fn run(v: &Vector, opts: PollerOptions) -> anyhow::Result<Report> {
    let d = DictDir::setup(v)?;

    let h = AttackHandle::new(
        &d.config(),
        VirtualPoller::new(v.card(), opts),
        CardData::new(v.card_type),
    )?;

    let r = h.run().await?;

    Ok(r)
}

/// Run a full attack for a vector, checking the report against expectations
pub async fn test(v: &Vector, opts: PollerOptions) -> anyhow::Result<Report> {
    let r = run(v, opts).await?;

    if r.result != v.result || r.keys_found != v.keys_found {
        return Err(anyhow::anyhow!(
            "{}: expected {} with {} keys, got {} with {} keys",
            v.name,
            v.result,
            v.keys_found,
            r.result,
            r.keys_found
        ));
    }

    // Recovered keys must match the card
    let card = v.card();
    for s in 0..r.card.total_sectors() {
        for t in [KeyType::A, KeyType::B] {
            if let Some(k) = r.card.key(s, t) {
                if card.key(s, t) != Some(k) {
                    return Err(anyhow::anyhow!(
                        "{}: sector {} key {} mismatch ({})",
                        v.name,
                        s,
                        t,
                        k
                    ));
                }
            }
        }
    }

    Ok(r)
}
