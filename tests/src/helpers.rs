// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Emulator setup for tests
//!
//! Launches speculos with the configured seed, connects the backend and
//! resolves per-test fixtures.

use std::{path::PathBuf, str::FromStr, sync::Arc, time::Duration};

use anyhow::Context;
use log::{debug, info, LevelFilter};
use portpicker::pick_unused_port;
use simplelog::SimpleLogger;

use mavryk_sim::{Driver, DriverMode, Model, SimDriver, SimHandle, SimOptions, SpeculosBackend};

use crate::{
    config::configuration_from_env,
    fixtures::{base, standard, FixtureError, Fixtures},
    MavrykNavigator,
};

/// Timeout for the simulator to become reachable
const CONNECT_TIMEOUT: Duration = Duration::from_secs(20);

/// Setup logging with the `LOG_LEVEL` environment override
pub fn init_logging() {
    let log_level = match std::env::var("LOG_LEVEL").map(|v| LevelFilter::from_str(&v)) {
        Ok(Ok(l)) => l,
        _ => LevelFilter::Debug,
    };

    let log_cfg = simplelog::ConfigBuilder::new()
        .add_filter_ignore_str("bollard")
        .add_filter_ignore_str("hyper")
        .add_filter_ignore_str("reqwest")
        .build();

    let _ = SimpleLogger::init(log_level, log_cfg);
}

/// Whether snapshots should be (re)generated, from `GOLDEN_RUN`
pub fn golden_run() -> bool {
    matches!(
        std::env::var("GOLDEN_RUN").as_deref(),
        Ok("1") | Ok("true") | Ok("yes")
    )
}

/// Model selected by `MODEL`, defaulting to the nano S plus
pub fn model() -> anyhow::Result<Model> {
    match std::env::var("MODEL") {
        Ok(m) => Model::from_str(&m).map_err(|_| anyhow::anyhow!("Invalid MODEL: {m}")),
        Err(_) => Ok(Model::NanoSP),
    }
}

/// Driver selected by `DRIVER_MODE`, defaulting to a local speculos
pub fn driver_mode() -> anyhow::Result<DriverMode> {
    match std::env::var("DRIVER_MODE") {
        Ok(m) => DriverMode::from_str(&m).map_err(|_| anyhow::anyhow!("Invalid DRIVER_MODE: {m}")),
        Err(_) => Ok(DriverMode::Local),
    }
}

/// Simulator options for `model` on the given ports
///
/// The seed comes from the process configuration, with `SEED` installed
/// ahead of the first read.
pub fn sim_options(model: Model, http_port: u16, apdu_port: u16) -> anyhow::Result<SimOptions> {
    let mut opts = SimOptions {
        model,
        driver: driver_mode()?,
        http_port,
        apdu_port,
        root: std::env::var("SPECULOS_ROOT").ok(),
        ..Default::default()
    };
    configuration_from_env().apply(&mut opts);

    Ok(opts)
}

/// App binary from `NANOAPP`, or under `NANOAPP_ROOT` for the model
pub fn app_path(model: Model) -> PathBuf {
    if let Ok(p) = std::env::var("NANOAPP") {
        return PathBuf::from(p);
    }

    let root = std::env::var("NANOAPP_ROOT")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("../app"));

    root.join(format!("bin/{model}/app.elf"))
}

/// Running emulator instance
pub struct Harness {
    driver: SimDriver,
    handle: SimHandle,
    backend: Arc<SpeculosBackend>,
    golden_run: bool,
}

/// Launch the emulator with the process configuration and connect to it
pub async fn setup() -> anyhow::Result<Harness> {
    init_logging();

    let model = model()?;
    let app = app_path(model);
    if !app.is_file() {
        anyhow::bail!("Could not load app: {}", app.display());
    }

    // Find open ports
    let http_port = pick_unused_port().context("no free http port")?;
    let apdu_port = pick_unused_port().context("no free apdu port")?;

    let opts = sim_options(model, http_port, apdu_port)?;

    info!(
        "Launching {} for {model} (driver: {} http port: {http_port} apdu port: {apdu_port})",
        app.display(),
        opts.driver,
    );

    let driver = SimDriver::new(opts.driver, model)?;
    let handle = driver.run(&app.to_string_lossy(), opts.speculos()).await?;

    let backend = match SpeculosBackend::connect(&opts, CONNECT_TIMEOUT).await {
        Ok(b) => b,
        Err(e) => {
            let _ = driver.exit(handle).await;
            return Err(e.into());
        }
    };

    debug!("Emulator ready");

    Ok(Harness {
        driver,
        handle,
        backend: Arc::new(backend),
        golden_run: golden_run(),
    })
}

impl Harness {
    pub fn backend(&self) -> &Arc<SpeculosBackend> {
        &self.backend
    }

    pub fn golden_run(&self) -> bool {
        self.golden_run
    }

    /// Base fixture values for a test
    pub fn base(&self, test_name: &str) -> Fixtures {
        base(self.backend.clone(), self.golden_run, test_name)
    }

    /// Resolve fixtures for a test
    pub fn fixtures(&self, test_name: &str, targets: &[&str]) -> Result<Fixtures, FixtureError> {
        standard::<SpeculosBackend>().resolve(targets, self.base(test_name))
    }

    /// Resolve the app navigator for a test
    pub fn navigator(&self, test_name: &str) -> Result<Arc<MavrykNavigator<SpeculosBackend>>, FixtureError> {
        self.fixtures(test_name, &["mavryk_navigator"])?
            .get::<MavrykNavigator<SpeculosBackend>>("mavryk_navigator")
    }

    /// Stop the emulator
    pub async fn exit(self) -> anyhow::Result<()> {
        // Close the APDU socket before stopping the simulator
        drop(self.backend);

        self.driver.exit(self.handle).await?;

        Ok(())
    }
}
