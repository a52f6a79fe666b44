// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Drivers for launching speculos
//!
//! Nano models run through the speculos [GenericDriver]. Touch models
//! (Stax, Flex) are not enumerated by the driver options, so these are
//! launched from a local speculos install by [TouchDriver].

use std::{
    net::{IpAddr, Ipv4Addr, SocketAddr},
    process::Stdio,
};

use async_trait::async_trait;
use ledger_sim::{Driver, DriverMode, GenericDriver, GenericHandle, Handle, Options};
use log::debug;
use tokio::process::{Child, Command};

use crate::{Error, Model};

/// Local speculos driver for touch models
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct TouchDriver {
    model: Model,
}

/// Handle to a touch model speculos process
#[derive(Debug)]
pub struct TouchHandle {
    /// HTTP API socket address
    addr: SocketAddr,
    child: Child,
}

impl TouchDriver {
    pub fn new(model: Model) -> Self {
        Self { model }
    }

    /// Speculos arguments for `opts`, with the model replaced
    pub fn args(&self, opts: &Options) -> Vec<String> {
        opts.args()
            .into_iter()
            .map(|a| match a.starts_with("--model=") {
                true => format!("--model={}", self.model.target()),
                false => a,
            })
            .collect()
    }
}

#[async_trait]
impl Driver for TouchDriver {
    type Handle = TouchHandle;

    async fn run(&self, app: &str, opts: Options) -> anyhow::Result<Self::Handle> {
        let mut cmd = Command::new("speculos.py");

        cmd.kill_on_drop(true)
            .stdin(Stdio::null())
            .args(self.args(&opts));

        if let Some(root) = &opts.root {
            let path = std::env::var("PATH").unwrap_or_default();
            cmd.env("PATH", format!("{path}:{root}"));
        }

        cmd.arg(app);

        debug!("Command: {:?}", cmd);

        let child = cmd.spawn()?;

        let addr = SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), opts.http_port);
        Ok(TouchHandle { addr, child })
    }

    async fn wait(&self, handle: &mut Self::Handle) -> anyhow::Result<()> {
        let s = handle.child.wait().await?;

        debug!("Simulator exited with {s}");

        Ok(())
    }

    async fn exit(&self, mut handle: Self::Handle) -> anyhow::Result<()> {
        handle.child.kill().await?;
        Ok(())
    }
}

impl Handle for TouchHandle {
    fn addr(&self) -> SocketAddr {
        self.addr
    }
}

/// Driver selected by model and [DriverMode]
pub enum SimDriver {
    Generic(GenericDriver),
    Touch(TouchDriver),
}

/// Handle for use with [SimDriver]
#[derive(Debug)]
pub enum SimHandle {
    Generic(GenericHandle),
    Touch(TouchHandle),
}

impl SimDriver {
    /// Select a driver for `model`
    ///
    /// Touch models are only available with [DriverMode::Local].
    pub fn new(mode: DriverMode, model: Model) -> Result<Self, Error> {
        match (model.sim_model(), mode) {
            (Some(_), _) => Ok(Self::Generic(GenericDriver::new(mode)?)),
            (None, DriverMode::Local) => Ok(Self::Touch(TouchDriver::new(model))),
            (None, _) => Err(Error::Launch(format!("{model} requires the local driver"))),
        }
    }
}

#[async_trait]
impl Driver for SimDriver {
    type Handle = SimHandle;

    async fn run(&self, app: &str, opts: Options) -> anyhow::Result<Self::Handle> {
        let h = match self {
            SimDriver::Generic(d) => d.run(app, opts).await.map(SimHandle::Generic)?,
            SimDriver::Touch(d) => d.run(app, opts).await.map(SimHandle::Touch)?,
        };

        Ok(h)
    }

    async fn wait(&self, handle: &mut Self::Handle) -> anyhow::Result<()> {
        match (self, handle) {
            (SimDriver::Generic(d), SimHandle::Generic(h)) => d.wait(h).await,
            (SimDriver::Touch(d), SimHandle::Touch(h)) => d.wait(h).await,
            _ => Err(anyhow::anyhow!("driver / handle mismatch")),
        }
    }

    async fn exit(&self, handle: Self::Handle) -> anyhow::Result<()> {
        match (self, handle) {
            (SimDriver::Generic(d), SimHandle::Generic(h)) => d.exit(h).await,
            (SimDriver::Touch(d), SimHandle::Touch(h)) => d.exit(h).await,
            _ => Err(anyhow::anyhow!("driver / handle mismatch")),
        }
    }
}

impl Handle for SimHandle {
    fn addr(&self) -> SocketAddr {
        match self {
            SimHandle::Generic(h) => h.addr(),
            SimHandle::Touch(h) => h.addr(),
        }
    }
}
