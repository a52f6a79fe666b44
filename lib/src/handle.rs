// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Client for connected baking app instances
//!
//! This provides methods for interacting with the app
//! and is generic over [Exchange] transports

use std::{sync::Arc, time::Duration};

use byteorder::{BigEndian, ByteOrder};
use ledger_transport::Exchange;
use log::debug;

use mavryk_apdu::{
    command, decode_exact,
    prelude::{
        AllHwm, AllHwmReq, AuthKeyReq, AuthKeyWithCurveReq, AuthKeyWithCurveResp, AuthorizeReq,
        BipPath, DeauthorizeReq, GitReq, GitResp, Hwm, MainHwmReq, PublicKeyReq, PublicKeyResp,
        ResetReq, SetupReq, SigScheme, SignReq, SignResp, SignWithHashResp, Version, VersionReq,
    },
    ApduError, ApduReq, DecodeOwned,
};

use crate::{
    keys::{Prefix, PublicKey},
    Error,
};

/// Reference to a device key, a derivation path and signature scheme
pub trait DeviceKey: Send + Sync {
    fn path(&self) -> &BipPath;
    fn sig_scheme(&self) -> SigScheme;
}

impl DeviceKey for (BipPath, SigScheme) {
    fn path(&self) -> &BipPath {
        &self.0
    }

    fn sig_scheme(&self) -> SigScheme {
        self.1
    }
}

/// Baking app client for a connected device or emulator
///
/// Cloning the client shares the underlying transport.
pub struct MavrykClient<T> {
    t: Arc<T>,
    /// Timeout for requests requiring user interaction
    user_timeout: Duration,
    /// Timeout for plain requests
    request_timeout: Duration,
}

impl<T> Clone for MavrykClient<T> {
    fn clone(&self) -> Self {
        Self {
            t: self.t.clone(),
            user_timeout: self.user_timeout,
            request_timeout: self.request_timeout,
        }
    }
}

impl<T> From<T> for MavrykClient<T> {
    fn from(t: T) -> Self {
        Self::from(Arc::new(t))
    }
}

impl<T> From<Arc<T>> for MavrykClient<T> {
    fn from(t: Arc<T>) -> Self {
        Self {
            t,
            user_timeout: Duration::from_secs(60),
            request_timeout: Duration::from_secs(5),
        }
    }
}

impl<T> MavrykClient<T>
where
    T: Exchange<AnswerType = Vec<u8>> + Send + Sync,
    T::Error: Into<Error>,
{
    /// Set the timeout used for requests requiring user interaction
    pub fn with_user_timeout(mut self, timeout: Duration) -> Self {
        self.user_timeout = timeout;
        self
    }

    /// Access the underlying transport
    pub fn transport(&self) -> &Arc<T> {
        &self.t
    }

    /// Fetch the app version
    pub async fn version(&self) -> Result<Version, Error> {
        debug!("Requesting version");

        self.request_decode(&VersionReq {}, false).await
    }

    /// Fetch the git commit the app was built from
    pub async fn git(&self) -> Result<String, Error> {
        debug!("Requesting git commit");

        let r: GitResp = self.request_decode(&GitReq {}, false).await?;
        Ok(r.commit)
    }

    /// Authorize a key for baking, returning the raw response
    ///
    /// With no key an empty body is sent with the default scheme.
    pub async fn authorize_baking(&self, key: Option<&dyn DeviceKey>) -> Result<Vec<u8>, Error> {
        let req = match key {
            Some(k) => AuthorizeReq::new(k.sig_scheme(), Some(k.path().clone())),
            None => AuthorizeReq::default(),
        };

        debug!("Authorizing baking key ({req:?})");

        self.request(&req, true).await
    }

    /// Remove the authorized baking key
    pub async fn deauthorize(&self) -> Result<(), Error> {
        debug!("Deauthorizing baking key");

        self.request(&DeauthorizeReq {}, false).await?;
        Ok(())
    }

    /// Fetch the authorized key path
    pub async fn get_auth_key(&self) -> Result<BipPath, Error> {
        debug!("Requesting authorized key");

        self.request_decode(&AuthKeyReq {}, false).await
    }

    /// Fetch the authorized key path and curve
    pub async fn get_auth_key_with_curve(&self) -> Result<(SigScheme, BipPath), Error> {
        debug!("Requesting authorized key with curve");

        let r: AuthKeyWithCurveResp = self.request_decode(&AuthKeyWithCurveReq {}, false).await?;
        Ok((r.scheme, r.path))
    }

    /// Fetch the main chain high watermark
    pub async fn get_main_hwm(&self) -> Result<Hwm, Error> {
        debug!("Requesting main HWM");

        self.request_decode(&MainHwmReq {}, false).await
    }

    /// Fetch main chain id (Base58 `Net...`) and main / test watermarks
    pub async fn get_all_hwm(&self) -> Result<(String, Hwm, Hwm), Error> {
        debug!("Requesting all HWMs");

        let h: AllHwm = self.request_decode(&AllHwmReq {}, false).await?;

        let chain_id = Prefix::ChainId.encode(&h.chain_id.to_be_bytes());

        Ok((chain_id, h.main, h.test))
    }

    /// Fetch a public key without prompting
    pub async fn get_public_key_silent(&self, key: &dyn DeviceKey) -> Result<PublicKey, Error> {
        debug!("Requesting public key for {}", key.path());

        self.public_key(false, key).await
    }

    /// Fetch a public key, displaying it for approval
    pub async fn get_public_key_prompt(&self, key: &dyn DeviceKey) -> Result<PublicKey, Error> {
        debug!("Requesting public key (prompt) for {}", key.path());

        self.public_key(true, key).await
    }

    /// Setup chain id, watermarks and baking key, returning the key
    pub async fn setup_app_context(
        &self,
        key: &dyn DeviceKey,
        main_chain_id: &str,
        main_hwm: &Hwm,
        test_hwm: &Hwm,
    ) -> Result<PublicKey, Error> {
        debug!("Setting up app context (chain: {main_chain_id}, main: {main_hwm:?}, test: {test_hwm:?})");

        let chain_id = Prefix::ChainId.decode(main_chain_id)?;
        let req = SetupReq::new(
            BigEndian::read_u32(&chain_id),
            *main_hwm,
            *test_hwm,
            key.path().clone(),
            key.sig_scheme(),
        )?;

        let r: PublicKeyResp = self.request_decode(&req, true).await?;

        Ok(PublicKey::from_bytes(&r.key, key.sig_scheme())?)
    }

    /// Reset watermarks to the provided level
    pub async fn reset_app_context(&self, level: u32) -> Result<(), Error> {
        debug!("Resetting app context to level {level}");

        self.request(&ResetReq::new(level)?, true).await?;
        Ok(())
    }

    /// Sign a message, returning raw signature bytes
    pub async fn sign_message(&self, key: &dyn DeviceKey, message: &[u8]) -> Result<Vec<u8>, Error> {
        debug!("Signing {} byte message with {}", message.len(), key.path());

        let r = self.sign(false, key, message).await?;
        let s: SignResp = decode_exact(&r)?;

        Ok(s.signature)
    }

    /// Sign a message, returning the message hash and raw signature bytes
    pub async fn sign_message_with_hash(
        &self,
        key: &dyn DeviceKey,
        message: &[u8],
    ) -> Result<([u8; 32], Vec<u8>), Error> {
        debug!("Signing {} byte message (with hash) with {}", message.len(), key.path());

        let r = self.sign(true, key, message).await?;
        let s: SignWithHashResp = decode_exact(&r)?;

        Ok((s.hash, s.signature))
    }

    async fn public_key(&self, prompt: bool, key: &dyn DeviceKey) -> Result<PublicKey, Error> {
        let req = PublicKeyReq::new(prompt, key.sig_scheme(), key.path().clone());

        let r: PublicKeyResp = self.request_decode(&req, prompt).await?;

        Ok(PublicKey::from_bytes(&r.key, key.sig_scheme())?)
    }

    /// Send the signing path then the message in chunks, returning the
    /// response to the final chunk
    async fn sign(&self, with_hash: bool, key: &dyn DeviceKey, message: &[u8]) -> Result<Vec<u8>, Error> {
        let mut resp = vec![];

        for req in SignReq::sequence(with_hash, key.sig_scheme(), key.path(), message) {
            // Only message chunks may wait on the user
            let user = req.p1 != mavryk_apdu::P1_FIRST;
            resp = self.request(&req, user).await?;
        }

        Ok(resp)
    }

    /// Issue a request and decode the response payload
    async fn request_decode<'a, R, A>(&self, req: &R, user: bool) -> Result<A, Error>
    where
        R: ApduReq<'a> + Sync,
        A: DecodeOwned<Output = A, Error = ApduError>,
    {
        let r = self.request(req, user).await?;
        Ok(decode_exact(&r)?)
    }

    /// Issue a request, mapping non-success status words to errors
    async fn request<'a, R>(&self, req: &R, user: bool) -> Result<Vec<u8>, Error>
    where
        R: ApduReq<'a> + Sync,
    {
        let cmd = command(req)?;
        let ins = cmd.ins;

        let timeout = match user {
            true => self.user_timeout,
            false => self.request_timeout,
        };

        let a = tokio::time::timeout(timeout, self.t.exchange(&cmd))
            .await?
            .map_err(Into::<Error>::into)?;

        match a.retcode() {
            0x9000 => Ok(a.data().to_vec()),
            c => {
                debug!("Instruction {ins:#04x} failed with status {c:#06x}");
                Err(Error::from_status(c))
            }
        }
    }
}
