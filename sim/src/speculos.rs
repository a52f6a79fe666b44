// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Backend for a running speculos instance
//!
//! APDUs are exchanged over the speculos TCP socket, buttons / touches
//! and screen capture use the HTTP automation API.

use std::{net::SocketAddr, ops::Deref, time::Duration};

use async_trait::async_trait;
use image::RgbaImage;
use ledger_apdu::{APDUAnswer, APDUCommand};
use ledger_mavryk::{TcpOptions, TransportTcp};
use ledger_sim::{Action, Button, Handle};
use ledger_transport::Exchange;
use log::{debug, trace};
use serde::Deserialize;
use serde_json::json;

use crate::{Backend, Error, Event, Model, Position, SimOptions};

/// Delay between touch press and release
const TOUCH_DELAY: f32 = 0.1;

#[derive(Deserialize)]
struct Events {
    events: Vec<Event>,
}

/// Speculos backend, combining the APDU and HTTP interfaces
///
/// Buttons and screenshots use the speculos [Handle] calls, touches and
/// screen events are issued here.
pub struct SpeculosBackend {
    transport: TransportTcp,
    client: reqwest::Client,
    addr: SocketAddr,
    model: Model,
    home: Option<RgbaImage>,
}

impl SpeculosBackend {
    /// Connect to a speculos instance launched with `opts`
    ///
    /// This retries until the simulator is reachable or `timeout` elapses,
    /// then records the app home screen.
    pub async fn connect(opts: &SimOptions, timeout: Duration) -> Result<Self, Error> {
        let addr = SocketAddr::from(([127, 0, 0, 1], opts.http_port));

        debug!("Connecting to speculos (apdu: {}, http: {addr})", opts.apdu_port);

        let transport = TransportTcp::connect_timeout(TcpOptions::new(opts.apdu_port), timeout).await?;

        let mut s = Self {
            transport,
            client: reqwest::Client::new(),
            addr,
            model: opts.model,
            home: None,
        };

        // Await HTTP API availability
        let home = tokio::time::timeout(timeout, async {
            loop {
                match Backend::screenshot(&s).await {
                    Ok(i) => return i,
                    Err(e) => trace!("Screenshot failed: {e}"),
                }
                tokio::time::sleep(Duration::from_millis(200)).await;
            }
        })
        .await?;

        s.home = Some(home);

        Ok(s)
    }

    fn url(&self, path: &str) -> String {
        format!("http://{}/{path}", self.addr)
    }

    /// Discard recorded screen events
    pub async fn clear_events(&self) -> Result<(), Error> {
        self.client
            .delete(self.url("events"))
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

impl Handle for SpeculosBackend {
    fn addr(&self) -> SocketAddr {
        self.addr
    }
}

#[async_trait]
impl Exchange for SpeculosBackend {
    type Error = Error;
    type AnswerType = Vec<u8>;

    async fn exchange<I>(&self, command: &APDUCommand<I>) -> Result<APDUAnswer<Vec<u8>>, Error>
    where
        I: Deref<Target = [u8]> + Send + Sync,
    {
        Ok(self.transport.exchange(command).await?)
    }
}

#[async_trait]
impl Backend for SpeculosBackend {
    fn model(&self) -> Model {
        self.model
    }

    fn home_screen(&self) -> Option<&RgbaImage> {
        self.home.as_ref()
    }

    async fn button(&self, button: Button, action: Action) -> Result<(), Error> {
        trace!("Button {button} {action}");

        Ok(Handle::button(self, button, action).await?)
    }

    async fn finger_touch(&self, pos: Position) -> Result<(), Error> {
        trace!("Touch at {pos:?}");

        self.client
            .post(self.url("finger"))
            .json(&json!({
                "action": Action::PressAndRelease,
                "x": pos.x,
                "y": pos.y,
                "delay": TOUCH_DELAY,
            }))
            .send()
            .await?
            .error_for_status()?;

        Ok(())
    }

    async fn finger_swipe(&self, from: Position, to: Position) -> Result<(), Error> {
        trace!("Swipe from {from:?} to {to:?}");

        self.client
            .post(self.url("finger"))
            .json(&json!({
                "action": Action::PressAndRelease,
                "x": from.x,
                "y": from.y,
                "x1": to.x,
                "y1": to.y,
                "delay": TOUCH_DELAY,
            }))
            .send()
            .await?
            .error_for_status()?;

        Ok(())
    }

    async fn screenshot(&self) -> Result<RgbaImage, Error> {
        Ok(Handle::screenshot(self).await?.to_rgba8())
    }

    async fn events(&self) -> Result<Vec<Event>, Error> {
        let e: Events = self
            .client
            .get(self.url("events?currentscreenonly=true"))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(e.events)
    }
}
