// Copyright (c) 2022-2023 The MobileCoin Foundation

use strum::{Display, EnumString};

/// Device model for simulation
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Display, EnumString, clap::ValueEnum)]
#[strum(serialize_all = "lowercase")]
#[value(rename_all = "lower")]
pub enum Model {
    NanoS,
    NanoSP,
    NanoX,
    Stax,
    Flex,
}

/// Screen coordinate for touch devices
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Position {
    pub x: u32,
    pub y: u32,
}

impl Position {
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }
}

impl Model {
    /// Nano devices are navigated with buttons, others by touch
    pub fn is_nano(&self) -> bool {
        matches!(self, Model::NanoS | Model::NanoSP | Model::NanoX)
    }

    /// Screen size in pixels (width, height)
    pub fn screen_size(&self) -> (u32, u32) {
        match self {
            Model::NanoS => (128, 32),
            Model::NanoSP | Model::NanoX => (128, 64),
            Model::Stax => (400, 672),
            Model::Flex => (480, 600),
        }
    }

    /// Speculos driver model, touch models are not enumerated by the driver
    pub fn sim_model(&self) -> Option<ledger_sim::Model> {
        match self {
            Model::NanoS => Some(ledger_sim::Model::NanoS),
            Model::NanoSP => Some(ledger_sim::Model::NanoSP),
            Model::NanoX => Some(ledger_sim::Model::NanoX),
            Model::Stax | Model::Flex => None,
        }
    }

    /// Speculos target name, as passed with `--model`
    pub fn target(&self) -> &'static str {
        match self.sim_model() {
            Some(m) => m.target(),
            None if *self == Model::Stax => "stax",
            None => "flex",
        }
    }

    /// SDK API level passed to speculos, if required for the model
    pub fn api_level(&self) -> Option<u32> {
        match self {
            Model::NanoS => None,
            Model::NanoSP | Model::NanoX => Some(5),
            Model::Stax | Model::Flex => Some(22),
        }
    }

    /// Screen centre, used as the start of swipes and to dismiss status pages
    pub fn center(&self) -> Position {
        let (w, h) = self.screen_size();
        Position::new(w / 2, h / 2)
    }

    /// Confirm button of a choice page
    pub fn choice_confirm(&self) -> Option<Position> {
        match self {
            Model::Stax => Some(Position::new(200, 515)),
            Model::Flex => Some(Position::new(240, 435)),
            _ => None,
        }
    }

    /// Exit button of the address QR code page
    pub fn qr_exit(&self) -> Option<Position> {
        match self {
            Model::Stax => Some(Position::new(200, 606)),
            Model::Flex => Some(Position::new(240, 550)),
            _ => None,
        }
    }

    /// Button showing the address QR code
    pub fn qr_show(&self) -> Option<Position> {
        match self {
            Model::Stax => Some(Position::new(36, 515)),
            Model::Flex => Some(Position::new(56, 435)),
            _ => None,
        }
    }

    /// Settings button on the home page
    pub fn home_settings(&self) -> Option<Position> {
        match self {
            Model::Stax => Some(Position::new(342, 55)),
            Model::Flex => Some(Position::new(405, 75)),
            _ => None,
        }
    }

    /// Exit button of the settings page
    pub fn settings_exit(&self) -> Option<Position> {
        match self {
            Model::Stax => Some(Position::new(36, 606)),
            Model::Flex => Some(Position::new(56, 545)),
            _ => None,
        }
    }

    /// Toggle for the setting at `index` on a settings page
    pub fn settings_toggle(&self, index: u32) -> Option<Position> {
        let (top, step, x) = match self {
            Model::Stax => (130, 88, 350),
            Model::Flex => (145, 96, 420),
            _ => return None,
        };

        Some(Position::new(x, top + index.saturating_sub(1) * step))
    }
}

impl From<ledger_sim::Model> for Model {
    fn from(m: ledger_sim::Model) -> Self {
        match m {
            ledger_sim::Model::NanoS => Model::NanoS,
            ledger_sim::Model::NanoSP => Model::NanoSP,
            ledger_sim::Model::NanoX => Model::NanoX,
        }
    }
}

/// Descriptor for the simulated device
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Device {
    pub model: Model,
}

impl Device {
    pub fn new(model: Model) -> Self {
        Self { model }
    }

    /// Device name, used for snapshot directories
    pub fn name(&self) -> String {
        self.model.to_string()
    }

    pub fn is_nano(&self) -> bool {
        self.model.is_nano()
    }
}

impl From<Model> for Device {
    fn from(model: Model) -> Self {
        Self::new(model)
    }
}
