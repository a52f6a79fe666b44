// Copyright (c) 2022-2023 The MobileCoin Foundation

use ledger_sim::{Display, DriverMode, Options};

use crate::Model;

/// Simulator options
///
/// Wraps the speculos driver [Options] with a [Model] covering touch
/// devices and the driver selection.
#[derive(Clone, Debug, PartialEq, clap::Parser)]
pub struct SimOptions {
    /// Model to simulate
    #[clap(long, value_enum, default_value_t = Model::NanoSP, env = "MODEL")]
    pub model: Model,

    /// Driver mode
    #[clap(long, value_enum, default_value_t = DriverMode::Local, env = "DRIVER_MODE")]
    pub driver: DriverMode,

    /// Display mode
    #[clap(long, value_enum, default_value_t = Display::Headless)]
    pub display: Display,

    /// BIP39 seed for the simulated device
    #[clap(long, env = "SEED")]
    pub seed: Option<String>,

    /// Port for the APDU socket
    #[clap(long, default_value_t = 9999)]
    pub apdu_port: u16,

    /// Port for the HTTP automation API
    #[clap(long, default_value_t = 5000)]
    pub http_port: u16,

    /// Speculos root, added to the PATH when set
    #[clap(long, env = "SPECULOS_ROOT")]
    pub root: Option<String>,
}

impl Default for SimOptions {
    fn default() -> Self {
        Self {
            model: Model::NanoSP,
            driver: DriverMode::Local,
            display: Display::Headless,
            seed: None,
            apdu_port: 9999,
            http_port: 5000,
            root: None,
        }
    }
}

impl SimOptions {
    /// Build speculos driver options
    ///
    /// Touch models have no driver model, these are launched with the
    /// default driver model and the `--model` argument replaced by
    /// [TouchDriver](crate::TouchDriver).
    pub fn speculos(&self) -> Options {
        Options {
            model: self.model.sim_model().unwrap_or(Options::default().model),
            display: self.display,
            api_level: self.model.api_level().map(|l| l.to_string()),
            seed: self.seed.clone(),
            http_port: self.http_port,
            apdu_port: Some(self.apdu_port),
            root: self.root.clone(),
            ..Default::default()
        }
    }
}
