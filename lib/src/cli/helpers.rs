// Copyright (c) 2023 The mfc-attack Authors

use std::path::Path;

use log::debug;
use serde::Serialize;

use mfc_attack::{
    dict::{FileDict, OpenMode},
    engine::PATH_MAX,
};

/// Dictionary summary for `info` output
#[derive(Clone, PartialEq, Debug, Serialize)]
pub struct DictInfo {
    pub name: String,
    pub path: String,
    pub present: bool,
    pub keys: Option<usize>,
}

impl DictInfo {
    /// Load dictionary information, reading key counts where present
    pub fn load(name: &str, path: &Path) -> anyhow::Result<Self> {
        let present = FileDict::is_present(path);

        let keys = match present {
            true => Some(FileDict::open(path, OpenMode::MustExist)?.keys().len()),
            false => None,
        };

        Ok(Self {
            name: name.to_string(),
            path: path.display().to_string(),
            present,
            keys,
        })
    }
}

impl std::fmt::Display for DictInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.keys {
            Some(n) => write!(f, "{:14} {} ({} keys)", self.name, self.path, n),
            None => write!(f, "{:14} {} (missing)", self.name, self.path),
        }?;

        if self.path.len() > PATH_MAX {
            write!(f, " [path too long]")?;
        }

        Ok(())
    }
}

/// Helper to write output files if `--output` argument is provided
pub async fn write_output(file_name: &Path, value: &impl Serialize) -> anyhow::Result<()> {
    debug!("Writing output to '{}'", file_name.display());

    // Determine format from file name
    match file_name.extension().and_then(|e| e.to_str()) {
        // Encode to JSON for `.json` files
        Some("json") => {
            let s = serde_json::to_string_pretty(value)?;
            tokio::fs::write(file_name, s).await?;
        }
        _ => return Err(anyhow::anyhow!("unsupported output file format")),
    }

    Ok(())
}
