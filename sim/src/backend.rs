// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Backend abstraction over emulated (or physical) devices
//!
//! A [Backend] exchanges APDUs (via [Exchange]) and exposes the input
//! and screen primitives used to navigate the app UI.

use std::{path::Path, time::Duration};

use async_trait::async_trait;
use image::RgbaImage;
use ledger_sim::{Action, Button};
use ledger_transport::Exchange;
use log::{debug, trace};
use serde::Deserialize;

use crate::{Error, Model, Position};

/// Screen polling interval
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Text event reported for the current screen
#[derive(Clone, Debug, PartialEq, Eq, Default, Deserialize)]
pub struct Event {
    pub text: String,
    #[serde(default)]
    pub x: u32,
    #[serde(default)]
    pub y: u32,
    #[serde(default)]
    pub w: u32,
    #[serde(default)]
    pub h: u32,
    #[serde(default)]
    pub clear: bool,
}

/// Compare two screens pixel by pixel
pub fn compare_images(a: &RgbaImage, b: &RgbaImage) -> bool {
    a.dimensions() == b.dimensions() && a.as_raw() == b.as_raw()
}

#[async_trait]
pub trait Backend: Exchange<Error = Error, AnswerType = Vec<u8>> + Send + Sync {
    /// Device model behind this backend
    fn model(&self) -> Model;

    /// Screen shown once the app has started, if known
    fn home_screen(&self) -> Option<&RgbaImage>;

    /// Press / release a button
    async fn button(&self, button: Button, action: Action) -> Result<(), Error>;

    /// Tap the screen
    async fn finger_touch(&self, pos: Position) -> Result<(), Error>;

    /// Swipe across the screen
    async fn finger_swipe(&self, from: Position, to: Position) -> Result<(), Error>;

    /// Capture the current screen
    async fn screenshot(&self) -> Result<RgbaImage, Error>;

    /// Fetch text events for the current screen
    async fn events(&self) -> Result<Vec<Event>, Error>;

    async fn right_click(&self) -> Result<(), Error> {
        self.button(Button::Right, Action::PressAndRelease).await
    }

    async fn left_click(&self) -> Result<(), Error> {
        self.button(Button::Left, Action::PressAndRelease).await
    }

    async fn both_click(&self) -> Result<(), Error> {
        self.button(Button::Both, Action::PressAndRelease).await
    }

    /// Wait for the screen to differ from `from`, returning the new screen
    async fn wait_for_screen_change(
        &self,
        from: &RgbaImage,
        timeout: Duration,
    ) -> Result<RgbaImage, Error> {
        tokio::time::timeout(timeout, async {
            loop {
                let s = self.screenshot().await?;
                if !compare_images(from, &s) {
                    return Ok::<_, Error>(s);
                }
                tokio::time::sleep(POLL_INTERVAL).await;
            }
        })
        .await?
    }

    /// Check whether the current screen contains `text`
    async fn text_on_screen(&self, text: &str) -> Result<bool, Error> {
        let events = self.events().await?;
        trace!("Screen events: {events:?}");

        Ok(events.iter().any(|e| e.text.contains(text)))
    }

    /// Wait for `text` to be shown on the screen
    async fn wait_for_text_on_screen(&self, text: &str, timeout: Duration) -> Result<(), Error> {
        let r = tokio::time::timeout(timeout, async {
            loop {
                if self.text_on_screen(text).await? {
                    return Ok::<_, Error>(());
                }
                tokio::time::sleep(POLL_INTERVAL).await;
            }
        })
        .await;

        match r {
            Ok(r) => r,
            Err(_) => Err(Error::TextNotFound(text.to_string())),
        }
    }

    /// Wait for the app home screen
    async fn wait_for_home_screen(&self, timeout: Duration) -> Result<(), Error> {
        let home = match self.home_screen() {
            Some(h) => h,
            None => return Ok(()),
        };

        tokio::time::timeout(timeout, async {
            loop {
                if compare_images(home, &self.screenshot().await?) {
                    return Ok::<_, Error>(());
                }
                tokio::time::sleep(POLL_INTERVAL).await;
            }
        })
        .await?
    }

    /// Compare the current screen with the `golden` snapshot
    ///
    /// The screen is written to `tmp` when provided, and replaces the
    /// golden snapshot on golden runs.
    async fn compare_screen_with_snapshot(
        &self,
        golden: &Path,
        tmp: Option<&Path>,
        golden_run: bool,
    ) -> Result<bool, Error> {
        let s = self.screenshot().await?;

        if let Some(t) = tmp {
            s.save(t)?;
        }

        if golden_run {
            debug!("Saving golden snapshot {}", golden.display());
            s.save(golden)?;
            return Ok(true);
        }

        let g = image::open(golden)?.to_rgba8();
        let m = compare_images(&g, &s);

        if !m {
            debug!("Screen does not match {}", golden.display());
        }

        Ok(m)
    }
}
