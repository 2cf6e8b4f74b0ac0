// Copyright (c) 2023 The mfc-attack Authors

use clap::Parser;
use log::{error, info, LevelFilter};

use mfc_attack_sim::PollerOptions;
use mfc_attack_tests::{scenario, vectors::VECTORS};

/// Test CLI arguments
#[derive(Clone, Debug, Parser)]
pub struct Opts {
    /// Run only the named vector
    #[clap(long)]
    pub vector: Option<String>,

    #[clap(flatten)]
    pub poller: PollerOptions,

    /// Log level
    #[clap(long, default_value = "info", env)]
    pub log_level: LevelFilter,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load command line arguments
    let args = Opts::parse();

    // Setup logging
    let _ = simplelog::SimpleLogger::init(args.log_level, Default::default());

    let mut failed = 0;

    for v in VECTORS {
        if matches!(&args.vector, Some(n) if n != v.name) {
            continue;
        }

        match scenario::test(v, args.poller.clone()).await {
            Ok(r) => info!("{}: OK ({}, {} keys)", v.name, r.result, r.keys_found),
            Err(e) => {
                error!("{}: FAILED: {}", v.name, e);
                failed += 1;
            }
        }
    }

    if failed > 0 {
        return Err(anyhow::anyhow!("{} vectors failed", failed));
    }

    Ok(())
}
