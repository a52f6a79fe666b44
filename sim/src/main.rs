// Copyright (c) 2022-2023 The MobileCoin Foundation

use std::time::Duration;

use clap::Parser;
use log::{debug, info, LevelFilter};

use ledger_mavryk::MavrykClient;
use mavryk_sim::*;

/// Speculos simulator wrapper tool
///
/// This calls out to Docker or a local speculos install to run the
/// baking app with a deterministic seed. Touch models (Stax, Flex)
/// require a local install.
#[derive(Clone, Debug, PartialEq, Parser)]
pub struct Args {
    /// Application to run
    #[clap(env = "NANOAPP")]
    app: String,

    #[clap(flatten)]
    opts: SimOptions,

    /// Query the app version once the simulator is reachable
    #[clap(long)]
    check: bool,

    /// Log level
    #[clap(long, default_value = "debug", env = "LOG_LEVEL")]
    log_level: LevelFilter,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Setup logging
    let mut c = simplelog::ConfigBuilder::new();
    c.add_filter_ignore_str("bollard");
    c.add_filter_ignore_str("hyper");
    c.add_filter_ignore_str("reqwest");

    let _ = simplelog::SimpleLogger::init(args.log_level, c.build());

    info!("Launching speculos ({}, {})...", args.opts.model, args.opts.driver);

    // Run with the driver for the selected model and mode
    let d = SimDriver::new(args.opts.driver, args.opts.model)?;
    run_simulator(d, &args.app, &args.opts, args.check).await?;

    Ok(())
}

async fn run_simulator<D: Driver>(
    driver: D,
    app: &str,
    opts: &SimOptions,
    check: bool,
) -> anyhow::Result<()> {
    // Start simulator
    let mut h = driver.run(app, opts.speculos()).await?;

    if check {
        let b = SpeculosBackend::connect(opts, Duration::from_secs(20)).await?;
        let v = MavrykClient::from(b).version().await?;

        info!("App version: {v} ({:?})", v.app_class());
    }

    // Await simulator exit or exit signal
    tokio::select!(
        // Await simulator task completion
        _ = driver.wait(&mut h) => {
            debug!("Complete!");
        }
        // Exit on ctrl + c
        _ = tokio::signal::ctrl_c() => {
            debug!("Exit!");
            driver.exit(h).await?;
        },
    );

    Ok(())
}
