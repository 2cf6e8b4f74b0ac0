// Copyright (c) 2023 The mfc-attack Authors

//! Command line utility for inspecting and editing MIFARE Classic key dictionaries

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use log::{debug, info, warn, LevelFilter};

use mfc_attack::{
    dict::{parse_key, FileDict, OpenMode},
    DictConfig, Key,
};

mod helpers;
use helpers::*;

/// MIFARE Classic dictionary utility
#[derive(Clone, PartialEq, Debug, Parser)]
struct Options {
    /// Subcommand to execute
    #[clap(subcommand)]
    cmd: Actions,

    /// Enable verbose logging
    #[clap(long, default_value = "info")]
    log_level: LevelFilter,
}

#[derive(Clone, PartialEq, Debug, Subcommand)]
#[non_exhaustive]
enum Actions {
    /// Show configured dictionaries and key counts
    Info {
        #[clap(flatten)]
        dicts: DictConfig,

        /// Write dictionary information to a `.json` file
        #[clap(long)]
        output: Option<PathBuf>,
    },

    /// List keys in a dictionary
    List {
        /// Dictionary file
        file: PathBuf,
    },

    /// Check whether a dictionary contains a key
    Check {
        /// Dictionary file
        file: PathBuf,

        /// Hex-encoded key (12 digits)
        #[clap(value_parser = parse_key)]
        key: Key,
    },

    /// Add a key to a dictionary (creating the dictionary if absent)
    Add {
        /// Dictionary file
        file: PathBuf,

        /// Hex-encoded key (12 digits)
        #[clap(value_parser = parse_key)]
        key: Key,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse command line arguments
    let args = Options::parse();

    // Setup logging
    simplelog::SimpleLogger::init(args.log_level, simplelog::Config::default())?;

    debug!("Executing command: {:?}", args.cmd);

    match args.cmd {
        Actions::Info { dicts, output } => {
            let info = vec![
                DictInfo::load("system", &dicts.system())?,
                DictInfo::load("user", &dicts.user())?,
                DictInfo::load("system nested", &dicts.system_nested())?,
                DictInfo::load("user nested", &dicts.user_nested())?,
            ];

            info!("Dictionaries:");
            for i in &info {
                info!("  {}", i);
            }

            if !info[0].present {
                warn!("System dictionary missing, attacks will fail to start");
            }

            if let Some(o) = output {
                write_output(&o, &info).await?;
            }
        }
        Actions::List { file } => {
            let d = FileDict::open(&file, OpenMode::MustExist)?;

            info!("{} keys in '{}'", d.keys().len(), d.path().display());
            for (i, k) in d.keys().iter().enumerate() {
                info!("  {:4}: {}", i, k);
            }
        }
        Actions::Check { file, key } => {
            let d = FileDict::open(&file, OpenMode::MustExist)?;

            match d.contains(&key) {
                true => info!("Key {} found in '{}'", key, file.display()),
                false => {
                    return Err(anyhow::anyhow!(
                        "Key {} not found in '{}'",
                        key,
                        file.display()
                    ))
                }
            }
        }
        Actions::Add { file, key } => match FileDict::append(&file, &key)? {
            true => info!("Added key {} to '{}'", key, file.display()),
            false => info!("Key {} already present in '{}'", key, file.display()),
        },
    }

    Ok(())
}
