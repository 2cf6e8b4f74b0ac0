// Copyright (c) 2023 The mfc-attack Authors

use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use clap::Parser;
use log::{debug, info, LevelFilter};
use serde::de::DeserializeOwned;

use mfc_attack::{AttackHandle, CardData, DictConfig, Report};
use mfc_attack_sim::*;

/// MIFARE Classic dictionary attack simulator
///
/// Runs a full user / system dictionary attack against a virtual card
/// loaded from a JSON fixture.
#[derive(Clone, Debug, PartialEq, Parser)]
pub struct Args {
    /// Virtual card fixture (`.json`)
    card: PathBuf,

    #[clap(flatten)]
    dicts: DictConfig,

    #[clap(flatten)]
    poller: PollerOptions,

    /// Existing device record (`.json`), keys already known for the card
    #[clap(long)]
    record: Option<PathBuf>,

    /// Skip the current phase after this delay (milliseconds)
    #[clap(long)]
    skip_after_ms: Option<u64>,

    /// Write the attack report to a `.json` file
    #[clap(long)]
    output: Option<PathBuf>,

    /// Log level
    #[clap(long, default_value = "info")]
    log_level: LevelFilter,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Setup logging
    let _ = simplelog::SimpleLogger::init(args.log_level, simplelog::Config::default());

    let card = VirtualCard::load(&args.card)?;
    info!(
        "Loaded {} card with {} configured sectors",
        card.card_type,
        card.sectors.len()
    );

    let record = match &args.record {
        Some(r) => read_input::<CardData>(r).await?,
        None => CardData::new(card.card_type),
    };

    let h = AttackHandle::new(&args.dicts, VirtualPoller::new(card, args.poller.clone()), record)?
        .with_progress(|m| debug!("{}", m));

    // Schedule skip where requested
    if let Some(ms) = args.skip_after_ms {
        let s = h.skip_handle();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(ms)).await;
            s.skip();
        });
    }

    // Await attack completion or exit signal
    let report = tokio::select!(
        r = h.run() => r?,
        _ = tokio::signal::ctrl_c() => {
            debug!("Exit!");
            return Ok(());
        },
    );

    print_report(&report);

    if let Some(o) = &args.output {
        write_output(o, &report).await?;
    }

    Ok(())
}

fn print_report(r: &Report) {
    info!(
        "Result: {} ({} sectors read, {} keys found)",
        r.result, r.sectors_read, r.keys_found
    );

    for (i, s) in r.card.sectors.iter().enumerate() {
        let fmt = |k: Option<mfc_attack::Key>| match k {
            Some(k) => k.to_string(),
            None => "------------".to_string(),
        };
        info!("  {:2}: A {} B {}", i, fmt(s.key_a), fmt(s.key_b));
    }
}

/// Helper to read JSON input files
async fn read_input<T: DeserializeOwned>(file_name: &Path) -> anyhow::Result<T> {
    debug!("Reading input from '{}'", file_name.display());

    let s = tokio::fs::read_to_string(file_name).await?;
    let v = serde_json::from_str(&s)?;

    Ok(v)
}

/// Helper to write JSON output files
async fn write_output(file_name: &Path, value: &impl serde::Serialize) -> anyhow::Result<()> {
    debug!("Writing output to '{}'", file_name.display());

    let s = serde_json::to_string_pretty(value)?;
    tokio::fs::write(file_name, s).await?;

    Ok(())
}
