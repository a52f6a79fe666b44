// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Generic on-screen navigation
//!
//! Instructions ([NavIns]) are mapped to button presses or touches for the
//! simulated model, with optional comparison of each resulting screen
//! against golden snapshots stored at
//! `<root>/snapshots/<device>/<test case>/<index>.png`.

use std::{
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use log::debug;

use crate::{Backend, Device, Error, Position};

/// Navigation instructions
#[derive(Clone, Debug, PartialEq)]
pub enum NavIns {
    /// Pause without input
    Wait(Duration),
    RightClick,
    LeftClick,
    BothClick,
    /// Tap at a position
    Touch(Position),
    /// Swipe from the centre of the screen to the left (next page)
    SwipeCenterToLeft,
    /// Swipe from the centre of the screen to the right (previous page)
    SwipeCenterToRight,
    /// Confirm a choice page
    ChoiceConfirm,
    /// Dismiss a status page
    StatusDismiss,
    /// Show the address QR code
    AddressConfirmationShowQr,
    /// Exit the address QR code page
    AddressConfirmationExitQr,
}

/// Generic navigator for a simulated device
pub struct Navigator<B> {
    backend: Arc<B>,
    device: Device,
    golden_run: bool,
    timeout: Duration,
}

impl<B> Clone for Navigator<B> {
    fn clone(&self) -> Self {
        Self {
            backend: self.backend.clone(),
            device: self.device,
            golden_run: self.golden_run,
            timeout: self.timeout,
        }
    }
}

impl<B: Backend> Navigator<B> {
    pub fn new(backend: Arc<B>, device: Device, golden_run: bool) -> Self {
        Self {
            backend,
            device,
            golden_run,
            timeout: Duration::from_secs(10),
        }
    }

    /// Set the timeout for screen changes and text searches
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn backend(&self) -> &Arc<B> {
        &self.backend
    }

    pub fn device(&self) -> &Device {
        &self.device
    }

    pub fn golden_run(&self) -> bool {
        self.golden_run
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Resolve the touch position for an instruction
    fn position(&self, ins: &NavIns, p: Option<Position>) -> Result<Position, Error> {
        p.ok_or_else(|| Error::Unsupported(ins.clone()))
    }

    /// Execute a single instruction
    pub async fn execute(&self, ins: &NavIns) -> Result<(), Error> {
        debug!("Navigate: {ins:?}");

        let m = self.device.model;
        let b = &self.backend;

        // Button instructions are only valid on nano devices and touches on others
        match (ins, m.is_nano()) {
            (NavIns::Wait(d), _) => tokio::time::sleep(*d).await,
            (NavIns::RightClick, true) => b.right_click().await?,
            (NavIns::LeftClick, true) => b.left_click().await?,
            (NavIns::BothClick, true) => b.both_click().await?,
            (NavIns::Touch(p), false) => b.finger_touch(*p).await?,
            (NavIns::SwipeCenterToLeft, false) => {
                let c = m.center();
                b.finger_swipe(c, Position::new(0, c.y)).await?
            }
            (NavIns::SwipeCenterToRight, false) => {
                let c = m.center();
                b.finger_swipe(c, Position::new(m.screen_size().0 - 1, c.y))
                    .await?
            }
            (NavIns::ChoiceConfirm, false) => {
                b.finger_touch(self.position(ins, m.choice_confirm())?)
                    .await?
            }
            (NavIns::StatusDismiss, false) => b.finger_touch(m.center()).await?,
            (NavIns::AddressConfirmationShowQr, false) => {
                b.finger_touch(self.position(ins, m.qr_show())?).await?
            }
            (NavIns::AddressConfirmationExitQr, false) => {
                b.finger_touch(self.position(ins, m.qr_exit())?).await?
            }
            _ => return Err(Error::Unsupported(ins.clone())),
        }

        Ok(())
    }

    /// Execute an instruction and wait for the resulting screen change
    async fn execute_and_wait(&self, ins: &NavIns) -> Result<(), Error> {
        if let NavIns::Wait(_) = ins {
            return self.execute(ins).await;
        }

        let before = self.backend.screenshot().await?;
        self.execute(ins).await?;
        self.backend
            .wait_for_screen_change(&before, self.timeout)
            .await?;

        Ok(())
    }

    /// Wait for the screen to leave the home page
    async fn wait_for_prompt(&self) -> Result<(), Error> {
        if let Some(h) = self.backend.home_screen() {
            self.backend.wait_for_screen_change(h, self.timeout).await?;
        }
        Ok(())
    }

    /// Execute instructions in order, waiting for screen changes
    pub async fn navigate(&self, instructions: &[NavIns]) -> Result<(), Error> {
        for i in instructions {
            self.execute_and_wait(i).await?;
        }
        Ok(())
    }

    /// Golden and temporary snapshot paths for `name` under `test_case`
    pub fn snapshot_paths(&self, root: &Path, test_case: &Path, name: &str) -> (PathBuf, PathBuf) {
        let d = self.device.name();

        (
            root.join("snapshots").join(&d).join(test_case).join(name),
            root.join("snapshots-tmp").join(&d).join(test_case).join(name),
        )
    }

    /// Compare the current screen with snapshot `idx` of a test case
    pub async fn compare_snapshot(&self, root: &Path, test_case: &Path, idx: usize) -> Result<(), Error> {
        let (golden, tmp) = self.snapshot_paths(root, test_case, &format!("{idx:05}.png"));

        self.compare(&golden, &tmp).await
    }

    /// Compare the current screen with a golden snapshot, creating directories as required
    pub async fn compare(&self, golden: &Path, tmp: &Path) -> Result<(), Error> {
        if self.golden_run {
            if let Some(p) = golden.parent() {
                tokio::fs::create_dir_all(p).await?;
            }
        }
        if let Some(p) = tmp.parent() {
            tokio::fs::create_dir_all(p).await?;
        }

        match self
            .backend
            .compare_screen_with_snapshot(golden, Some(tmp), self.golden_run)
            .await?
        {
            true => Ok(()),
            false => Err(Error::SnapshotMismatch(golden.to_path_buf())),
        }
    }

    /// Execute instructions, comparing each screen with snapshots
    ///
    /// Snapshots are numbered from `start_idx`, returning the next index.
    pub async fn navigate_and_compare(
        &self,
        root: &Path,
        test_case: Option<&Path>,
        instructions: &[NavIns],
        screen_change_before_first: bool,
        start_idx: usize,
    ) -> Result<usize, Error> {
        let mut idx = start_idx;

        if screen_change_before_first {
            self.wait_for_prompt().await?;
        }

        if let Some(t) = test_case {
            self.compare_snapshot(root, t, idx).await?;
        }

        for i in instructions {
            self.execute_and_wait(i).await?;

            idx += 1;
            if let Some(t) = test_case {
                self.compare_snapshot(root, t, idx).await?;
            }
        }

        Ok(idx + 1)
    }

    /// Repeat `navigate_ins` until `text` is on screen, then execute `validation`
    ///
    /// Each screen is compared with snapshots when a test case is provided.
    pub async fn navigate_until_text_and_compare(
        &self,
        navigate_ins: &NavIns,
        validation: &[NavIns],
        text: &str,
        root: &Path,
        test_case: Option<&Path>,
        screen_change_before_first: bool,
    ) -> Result<(), Error> {
        let mut idx = 0;

        if screen_change_before_first {
            self.wait_for_prompt().await?;
        }

        let deadline = tokio::time::Instant::now() + self.timeout * 4;

        loop {
            if let Some(t) = test_case {
                self.compare_snapshot(root, t, idx).await?;
            }

            if self.backend.text_on_screen(text).await? {
                debug!("Found '{text}' on screen");
                break;
            }

            if tokio::time::Instant::now() > deadline {
                return Err(Error::TextNotFound(text.to_string()));
            }

            self.execute_and_wait(navigate_ins).await?;
            idx += 1;
        }

        for i in validation {
            self.execute_and_wait(i).await?;

            idx += 1;
            if let Some(t) = test_case {
                self.compare_snapshot(root, t, idx).await?;
            }
        }

        Ok(())
    }
}
