// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Speculos emulator wrapper for exercising the Mavryk baking app
//!
//! This launches speculos through the [ledger_sim] drivers ([SimDriver]
//! adds touch models), connects to its APDU socket and HTTP automation API
//! ([SpeculosBackend]) and provides screen navigation helpers ([Navigator])
//! for tests.

use std::path::PathBuf;

mod model;
pub use model::{Device, Model, Position};

pub use ledger_sim::{
    Action, Button, Display, DockerDriver, Driver, DriverMode, GenericDriver, GenericHandle,
    Handle, LocalDriver, LocalHandle, Options,
};

mod options;
pub use options::SimOptions;

mod driver;
pub use driver::{SimDriver, SimHandle, TouchDriver, TouchHandle};

mod backend;
pub use backend::{compare_images, Backend, Event};

mod speculos;
pub use speculos::SpeculosBackend;

mod navigator;
pub use navigator::{NavIns, Navigator};

/// Simulator errors
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Transport error: {0}")]
    Transport(#[from] ledger_mavryk::Error),

    #[error("Timeout")]
    Timeout,

    #[error("Simulator failed to launch: {0}")]
    Launch(String),

    #[error("Text '{0}' not found on screen")]
    TextNotFound(String),

    #[error("Screen does not match snapshot {}", .0.display())]
    SnapshotMismatch(PathBuf),

    #[error("Instruction {0:?} is not supported on this device")]
    Unsupported(NavIns),

    #[error("Simulator error: {0}")]
    Sim(Box<dyn std::error::Error + Send + Sync>),
}

impl From<anyhow::Error> for Error {
    fn from(e: anyhow::Error) -> Self {
        Self::Sim(e.into())
    }
}

impl From<tokio::time::error::Elapsed> for Error {
    fn from(_: tokio::time::error::Elapsed) -> Self {
        Self::Timeout
    }
}

/// Allows [ledger_mavryk::MavrykClient] over simulator backends
impl From<Error> for ledger_mavryk::Error {
    fn from(e: Error) -> Self {
        match e {
            Error::Transport(e) => e,
            Error::Io(e) => ledger_mavryk::Error::Io(e),
            Error::Timeout => ledger_mavryk::Error::RequestTimeout,
            e => ledger_mavryk::Error::Transport(e.to_string()),
        }
    }
}
