// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Baking app navigator
//!
//! Composes a [MavrykClient] with a generic [Navigator] to drive app flows
//! requiring on-screen approval, and to check screens and app context
//! against expected values.

use std::{
    future::Future,
    path::{Path, PathBuf},
    sync::Arc,
};

use log::debug;
use strum::Display;

use ledger_mavryk::{apdu::hwm::Hwm, keys::PublicKey, DeviceKey, MavrykClient};
use mavryk_sim::{Backend, Device, Model, NavIns, Navigator, Position};

use crate::{
    common::{tests_root_dir, EMPTY_PATH},
    message::Message,
    Account,
};

/// Navigator errors
#[derive(Debug, thiserror::Error)]
pub enum NavigatorError {
    #[error("simulator error: {0}")]
    Sim(#[from] mavryk_sim::Error),

    #[error("client error: {0}")]
    Client(#[from] ledger_mavryk::Error),

    #[error("message error: {0}")]
    Message(#[from] ledger_mavryk::keys::KeyError),

    #[error("screen does not match golden {0}")]
    Screen(PathBuf),

    #[error("expected {field} {expected} but got {actual}")]
    Context {
        field: &'static str,
        expected: String,
        actual: String,
    },

    #[error("no touch position for {0} on this device")]
    Position(&'static str),
}

/// Fixed screens on nano devices
#[derive(Copy, Clone, Debug, PartialEq, Eq, Display)]
pub enum NanoFixedScreen {
    #[strum(serialize = "welcome")]
    HomeWelcome,
    #[strum(serialize = "version")]
    HomeVersion,
    #[strum(serialize = "settings")]
    HomeSettings,
    #[strum(serialize = "exit")]
    HomeQuit,
    #[strum(serialize = "black_screen")]
    HomeBlack,
    #[strum(serialize = "hwm_status_disabled")]
    SettingsHwmDisabled,
    #[strum(serialize = "hwm_status_enabled")]
    SettingsHwmEnabled,
    #[strum(serialize = "back")]
    SettingsBack,
}

/// Fixed screens on touch devices
#[derive(Copy, Clone, Debug, PartialEq, Eq, Display)]
pub enum TouchFixedScreen {
    #[strum(serialize = "home")]
    Home,
    #[strum(serialize = "hwm_status_disabled")]
    SettingsHwmDisabled,
    #[strum(serialize = "hwm_status_enabled")]
    SettingsHwmEnabled,
    #[strum(serialize = "description")]
    SettingsDescription,
    #[strum(serialize = "description_2")]
    SettingsDescription2,
}

/// Screen to assert
///
/// Fixed screens have the same display in every test and are stored at
/// the root of the device snapshots, named screens belong to a test.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Screen {
    Fixed(String),
    Named(String),
}

impl From<NanoFixedScreen> for Screen {
    fn from(s: NanoFixedScreen) -> Self {
        Screen::Fixed(s.to_string())
    }
}

impl From<TouchFixedScreen> for Screen {
    fn from(s: TouchFixedScreen) -> Self {
        Screen::Fixed(s.to_string())
    }
}

impl From<&str> for Screen {
    fn from(s: &str) -> Self {
        Screen::Named(s.to_string())
    }
}

/// Snapshot options for approval flows
#[derive(Clone, Debug)]
pub struct NavOptions {
    /// Snapshot directory within the test, screens are not compared if unset
    pub snap_path: Option<PathBuf>,
    /// Wait for the prompt to replace the home screen before navigating
    pub screen_change_before_first: bool,
}

impl Default for NavOptions {
    fn default() -> Self {
        Self {
            snap_path: None,
            screen_change_before_first: true,
        }
    }
}

impl NavOptions {
    /// Compare screens with snapshots under `snap_path`
    pub fn snap(snap_path: impl Into<PathBuf>) -> Self {
        Self {
            snap_path: Some(snap_path.into()),
            ..Default::default()
        }
    }
}

/// Prompt kinds, selecting the approval navigation
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Prompt {
    /// Key authorization or public key display
    Key,
    /// App context reset
    Reset,
    /// App context setup
    Setup,
    /// Operation signing
    Sign,
}

/// Send a request while navigating, returning the request result
///
/// Both run concurrently. The first failure cancels the other.
pub async fn send_and_navigate<R, S, N, E1, E2>(send: S, navigate: N) -> Result<R, NavigatorError>
where
    S: Future<Output = Result<R, E1>>,
    N: Future<Output = Result<(), E2>>,
    E1: Into<NavigatorError>,
    E2: Into<NavigatorError>,
{
    let send = async { send.await.map_err(Into::<NavigatorError>::into) };
    let navigate = async { navigate.await.map_err(Into::<NavigatorError>::into) };

    let (r, _) = tokio::try_join!(send, navigate)?;

    Ok(r)
}

/// Baking app navigator
pub struct MavrykNavigator<B> {
    backend: Arc<B>,
    device: Device,
    client: MavrykClient<B>,
    navigator: Navigator<B>,
    golden_run: bool,
    root_dir: PathBuf,
    test_name: String,
}

impl<B: Backend> MavrykNavigator<B> {
    pub fn new(
        backend: Arc<B>,
        device: Device,
        client: MavrykClient<B>,
        navigator: Navigator<B>,
        golden_run: bool,
        test_name: &str,
    ) -> Self {
        Self {
            backend,
            device,
            client,
            navigator,
            golden_run,
            root_dir: tests_root_dir(),
            test_name: test_name.to_string(),
        }
    }

    /// Override the snapshot root directory
    pub fn with_root_dir(mut self, root_dir: impl Into<PathBuf>) -> Self {
        self.root_dir = root_dir.into();
        self
    }

    pub fn backend(&self) -> &Arc<B> {
        &self.backend
    }

    pub fn device(&self) -> &Device {
        &self.device
    }

    pub fn client(&self) -> &MavrykClient<B> {
        &self.client
    }

    pub fn navigator(&self) -> &Navigator<B> {
        &self.navigator
    }

    pub fn golden_run(&self) -> bool {
        self.golden_run
    }

    pub fn test_name(&self) -> &str {
        &self.test_name
    }

    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    fn snapshots_dir(&self) -> PathBuf {
        self.root_dir.join("snapshots").join(self.device.name())
    }

    fn tmp_snapshots_dir(&self) -> PathBuf {
        self.root_dir.join("snapshots-tmp").join(self.device.name())
    }

    fn test_case(&self, snap_path: Option<&Path>) -> Option<PathBuf> {
        snap_path.map(|p| Path::new(&self.test_name).join(p))
    }

    /// Execute instructions, comparing screens under `snap_path` within the test
    pub async fn navigate_and_compare(
        &self,
        snap_path: Option<&Path>,
        instructions: &[NavIns],
        screen_change_before_first: bool,
    ) -> Result<(), NavigatorError> {
        let t = self.test_case(snap_path);

        self.navigator
            .navigate_and_compare(
                &self.root_dir,
                t.as_deref(),
                instructions,
                screen_change_before_first,
                0,
            )
            .await?;

        Ok(())
    }

    /// Repeat `navigate_ins` until `text` is shown then execute `validation`,
    /// comparing screens under `snap_path` within the test
    pub async fn navigate_until_text_and_compare(
        &self,
        navigate_ins: &NavIns,
        validation: &[NavIns],
        text: &str,
        opts: &NavOptions,
    ) -> Result<(), NavigatorError> {
        let t = self.test_case(opts.snap_path.as_deref());

        self.navigator
            .navigate_until_text_and_compare(
                navigate_ins,
                validation,
                text,
                &self.root_dir,
                t.as_deref(),
                opts.screen_change_before_first,
            )
            .await?;

        Ok(())
    }

    /// Assert the current screen matches its golden snapshot
    ///
    /// Fixed screens are stored at the root of the device snapshots,
    /// others under `snap_path` within the test.
    pub async fn assert_screen(
        &self,
        screen: impl Into<Screen>,
        snap_path: Option<&Path>,
    ) -> Result<(), NavigatorError> {
        let p = match screen.into() {
            Screen::Fixed(s) => PathBuf::from(format!("{s}.png")),
            Screen::Named(s) => Path::new(&self.test_name)
                .join(snap_path.unwrap_or_else(|| Path::new("")))
                .join(format!("{s}.png")),
        };

        let golden = self.snapshots_dir().join(&p);
        let tmp = self.tmp_snapshots_dir().join(&p);

        debug!("Asserting screen {}", p.display());

        match self.navigator.compare(&golden, &tmp).await {
            Ok(()) => Ok(()),
            Err(mavryk_sim::Error::SnapshotMismatch(_)) => Err(NavigatorError::Screen(p)),
            Err(e) => Err(e.into()),
        }
    }

    /// Check the chain id, watermarks and authorized key held by the app
    ///
    /// With no account the app must report no authorized key.
    pub async fn check_app_context(
        &self,
        account: Option<&Account>,
        chain_id: &str,
        main_hwm: &Hwm,
        test_hwm: &Hwm,
    ) -> Result<(), NavigatorError> {
        let (c, m, t) = self.client.get_all_hwm().await?;

        check("main chain id", chain_id, c.as_str())?;
        check("main hwm", main_hwm, &m)?;
        check("test hwm", test_hwm, &t)?;

        match account {
            // Requesting the curve fails when no key is authorized
            None => {
                let p = self.client.get_auth_key().await?;
                check("empty path", &*EMPTY_PATH, &p)?;
            }
            Some(a) => {
                let (s, p) = self.client.get_auth_key_with_curve().await?;
                check("path", a.path(), &p)?;
                check("signature scheme", &a.sig_scheme(), &s)?;
            }
        }

        Ok(())
    }

    /// Navigate through a prompt and approve it
    pub async fn accept(&self, prompt: Prompt, opts: &NavOptions) -> Result<(), NavigatorError> {
        if self.device.is_nano() {
            return self
                .navigate_until_text_and_compare(
                    &NavIns::RightClick,
                    &[NavIns::BothClick],
                    "Accept",
                    opts,
                )
                .await;
        }

        match prompt {
            Prompt::Key => {
                let qr = self
                    .device
                    .model
                    .qr_show()
                    .ok_or(NavigatorError::Position("qr code"))?;

                self.navigate_until_text_and_compare(
                    &NavIns::SwipeCenterToLeft,
                    &[
                        NavIns::Touch(qr),
                        NavIns::AddressConfirmationExitQr,
                        NavIns::ChoiceConfirm,
                        NavIns::StatusDismiss,
                    ],
                    "Confirm",
                    opts,
                )
                .await
            }
            Prompt::Reset | Prompt::Setup | Prompt::Sign => {
                self.navigate_until_text_and_compare(
                    &NavIns::SwipeCenterToLeft,
                    &[NavIns::ChoiceConfirm, NavIns::StatusDismiss],
                    "Approve",
                    opts,
                )
                .await
            }
        }
    }

    /// Authorize baking with `account`, approving on screen
    pub async fn authorize_baking(
        &self,
        account: Option<&Account>,
        opts: &NavOptions,
    ) -> Result<Vec<u8>, NavigatorError> {
        send_and_navigate(
            self.client
                .authorize_baking(account.map(|a| a as &dyn DeviceKey)),
            self.accept(Prompt::Key, opts),
        )
        .await
    }

    /// Request the public key for `account`, approving on screen
    pub async fn get_public_key_prompt(
        &self,
        account: &Account,
        opts: &NavOptions,
    ) -> Result<PublicKey, NavigatorError> {
        send_and_navigate(
            self.client.get_public_key_prompt(account),
            self.accept(Prompt::Key, opts),
        )
        .await
    }

    /// Reset watermarks to `level`, approving on screen
    pub async fn reset_app_context(&self, level: u32, opts: &NavOptions) -> Result<(), NavigatorError> {
        send_and_navigate(
            self.client.reset_app_context(level),
            self.accept(Prompt::Reset, opts),
        )
        .await
    }

    /// Setup the app context, approving on screen
    pub async fn setup_app_context(
        &self,
        account: &Account,
        main_chain_id: &str,
        main_hwm: &Hwm,
        test_hwm: &Hwm,
        opts: &NavOptions,
    ) -> Result<PublicKey, NavigatorError> {
        send_and_navigate(
            self.client
                .setup_app_context(account, main_chain_id, main_hwm, test_hwm),
            self.accept(Prompt::Setup, opts),
        )
        .await
    }

    /// Sign a delegation (or other manager operation), approving on screen
    pub async fn sign_delegation(
        &self,
        account: &Account,
        delegation: &dyn Message,
        opts: &NavOptions,
    ) -> Result<Vec<u8>, NavigatorError> {
        let m = delegation.to_bytes()?;

        send_and_navigate(
            self.client.sign_message(account, &m),
            self.accept(Prompt::Sign, opts),
        )
        .await
    }

    /// Sign a delegation returning the message hash, approving on screen
    pub async fn sign_delegation_with_hash(
        &self,
        account: &Account,
        delegation: &dyn Message,
        opts: &NavOptions,
    ) -> Result<([u8; 32], Vec<u8>), NavigatorError> {
        let m = delegation.to_bytes()?;

        send_and_navigate(
            self.client.sign_message_with_hash(account, &m),
            self.accept(Prompt::Sign, opts),
        )
        .await
    }

    /// Perform an input then wait for the screen to change
    async fn step(&self, ins: NavIns) -> Result<(), NavigatorError> {
        let before = self.backend.screenshot().await?;
        self.navigator.execute(&ins).await?;
        self.backend
            .wait_for_screen_change(&before, self.navigator.timeout())
            .await?;
        Ok(())
    }

    /// Move to the right screen
    pub async fn right(&self) -> Result<(), NavigatorError> {
        self.step(NavIns::RightClick).await
    }

    /// Move to the left screen
    pub async fn left(&self) -> Result<(), NavigatorError> {
        self.step(NavIns::LeftClick).await
    }

    /// Press both buttons on nano devices
    pub async fn press_both_buttons(&self) -> Result<(), NavigatorError> {
        self.step(NavIns::BothClick).await
    }

    async fn touch(&self, name: &'static str, p: Option<Position>) -> Result<(), NavigatorError> {
        let p = p.ok_or(NavigatorError::Position(name))?;
        self.step(NavIns::Touch(p)).await
    }

    /// Disable the high watermark setting, starting from the home screen
    pub async fn disable_hwm(&self) -> Result<(), NavigatorError> {
        use NanoFixedScreen as N;
        use TouchFixedScreen as T;

        if self.device.is_nano() {
            self.assert_screen(N::HomeWelcome, None).await?;
            self.left().await?;
            self.assert_screen(N::HomeQuit, None).await?;
            self.left().await?;
            self.assert_screen(N::HomeSettings, None).await?;
            self.press_both_buttons().await?;
            self.assert_screen(N::SettingsHwmEnabled, None).await?;
            self.press_both_buttons().await?;
            self.assert_screen(N::SettingsHwmDisabled, None).await?;
            self.right().await?;
            self.assert_screen(N::SettingsBack, None).await?;
            self.press_both_buttons().await?;
            self.assert_screen(N::HomeWelcome, None).await?;
        } else {
            let m = self.device.model;

            self.backend
                .wait_for_home_screen(self.navigator.timeout())
                .await?;
            self.touch("settings", m.home_settings()).await?;
            self.assert_screen(T::SettingsHwmEnabled, None).await?;
            self.touch("hwm toggle", m.settings_toggle(1)).await?;
            self.assert_screen(T::SettingsHwmDisabled, None).await?;
            self.touch("settings exit", m.settings_exit()).await?;
            self.assert_screen(T::Home, None).await?;
        }

        Ok(())
    }

    /// Run `f` on the settings pages showing the authorized key, starting
    /// from and returning to the home screen
    ///
    /// Stax shows the chain id, key and watermarks on this page, Flex the
    /// chain id and key.
    pub async fn goto_home_public_key<F, Fut, R>(&self, f: F) -> Result<R, NavigatorError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<R, NavigatorError>>,
    {
        use NanoFixedScreen as N;
        use TouchFixedScreen as T;

        let m = self.device.model;

        if self.device.is_nano() {
            self.backend
                .wait_for_home_screen(self.navigator.timeout())
                .await?;
            self.right().await?;
            self.assert_screen(N::HomeVersion, None).await?;
            self.right().await?;
            // Chain id
            self.right().await?;
        } else {
            self.assert_screen(T::Home, None).await?;
            self.touch("settings", m.home_settings()).await?;
            // HWM status
            self.step(NavIns::SwipeCenterToLeft).await?;
        }

        let r = f().await?;

        if self.device.is_nano() {
            self.left().await?;
            // Chain id
            self.left().await?;
            self.assert_screen(N::HomeVersion, None).await?;
            self.left().await?;
            self.assert_screen(N::HomeWelcome, None).await?;
        } else {
            self.touch("settings exit", m.settings_exit()).await?;
            self.assert_screen(T::Home, None).await?;
        }

        Ok(r)
    }

    /// Run `f` on the settings pages showing the high watermarks, starting
    /// from and returning to the home screen
    ///
    /// Nano devices reach these through the settings entry left of the home
    /// screen. Flex shows them on the page after the authorized key.
    pub async fn goto_home_hwm<F, Fut, R>(&self, f: F) -> Result<R, NavigatorError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<R, NavigatorError>>,
    {
        use NanoFixedScreen as N;
        use TouchFixedScreen as T;

        let m = self.device.model;

        if self.device.is_nano() {
            self.backend
                .wait_for_home_screen(self.navigator.timeout())
                .await?;
            self.left().await?;
            self.assert_screen(N::HomeQuit, None).await?;
            self.left().await?;
            self.assert_screen(N::HomeSettings, None).await?;
            self.left().await?;
        } else {
            self.assert_screen(T::Home, None).await?;
            self.touch("settings", m.home_settings()).await?;
            // HWM status
            self.step(NavIns::SwipeCenterToLeft).await?;
            if m == Model::Flex {
                // Chain id and key
                self.step(NavIns::SwipeCenterToLeft).await?;
            }
        }

        let r = f().await?;

        if self.device.is_nano() {
            self.right().await?;
            self.assert_screen(N::HomeSettings, None).await?;
            self.right().await?;
            self.assert_screen(N::HomeQuit, None).await?;
            self.right().await?;
            self.assert_screen(N::HomeWelcome, None).await?;
        } else {
            self.touch("settings exit", m.settings_exit()).await?;
            self.assert_screen(T::Home, None).await?;
        }

        Ok(r)
    }
}

fn check<T: PartialEq + std::fmt::Debug + ?Sized>(
    field: &'static str,
    expected: &T,
    actual: &T,
) -> Result<(), NavigatorError> {
    match expected == actual {
        true => Ok(()),
        false => Err(NavigatorError::Context {
            field,
            expected: format!("{expected:?}"),
            actual: format!("{actual:?}"),
        }),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn fixed_screen_names() {
        assert_eq!(NanoFixedScreen::HomeQuit.to_string(), "exit");
        assert_eq!(NanoFixedScreen::SettingsHwmEnabled.to_string(), "hwm_status_enabled");
        assert_eq!(TouchFixedScreen::SettingsDescription2.to_string(), "description_2");
    }

    #[test]
    fn context_check() {
        assert!(check("level", &1u32, &1u32).is_ok());

        let e = check("main hwm", &Hwm::new(1, 0), &Hwm::new(2, 0)).unwrap_err();
        assert!(e.to_string().starts_with("expected main hwm"));
    }

    #[test]
    fn screen_kinds() {
        assert_eq!(Screen::from(NanoFixedScreen::HomeWelcome), Screen::Fixed("welcome".to_string()));
        assert_eq!(Screen::from("delegation"), Screen::Named("delegation".to_string()));
    }

    #[test]
    fn default_options() {
        let o = NavOptions::default();
        assert!(o.snap_path.is_none());
        assert!(o.screen_change_before_first);

        let o = NavOptions::snap("authorize");
        assert_eq!(o.snap_path.as_deref(), Some(Path::new("authorize")));
    }
}
