// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Protocol / APDU definitions for Mavryk baking app communication
//!
//! This module provides the instruction set, status words and payload
//! encodings used to talk to the baking application running on a Ledger
//! device or under the Speculos emulator.
//!
//! Unlike most Ledger protocols all integer fields are big-endian, matching
//! the encoding of the Mavryk (Tezos) operations the app parses.
//!

use ledger_apdu::APDUCommand;
use num_enum::TryFromPrimitive;
use strum::{Display, EnumIter, EnumString};

pub use ledger_proto::{ApduError, ApduHeader, ApduReq, ApduStatic, Decode, DecodeOwned, Encode};

pub mod auth;
pub mod hwm;
pub mod path;
pub mod public_key;
pub mod scheme;
pub mod sign;
pub mod version;

mod helpers;

pub mod prelude;

/// Baking app APDU Class
pub const MAV_APDU_CLA: u8 = 0x80;

/// Maximum payload carried by a single APDU
pub const MAX_APDU_PAYLOAD: usize = 235;

/// P1 value for the first chunk of a multi-APDU request
pub const P1_FIRST: u8 = 0x00;

/// P1 value for following chunks of a multi-APDU request
pub const P1_NEXT: u8 = 0x01;

/// P1 flag marking the last chunk of a multi-APDU request
pub const P1_LAST: u8 = 0x80;

/// Baking app APDU instruction codes
#[derive(Copy, Clone, Debug, PartialEq, Eq, Display, EnumIter, TryFromPrimitive)]
#[repr(u8)]
pub enum Instruction {
    /// Fetch application version
    Version = 0x00,

    /// Authorize a key for baking (prompts the user)
    AuthorizeBaking = 0x01,

    /// Fetch a public key without user interaction
    GetPublicKey = 0x02,

    /// Fetch a public key, displaying it for confirmation
    PromptPublicKey = 0x03,

    /// Sign a message
    Sign = 0x04,

    /// Reset high watermarks
    Reset = 0x06,

    /// Fetch the authorized key path
    QueryAuthKey = 0x07,

    /// Fetch the main chain high watermark
    QueryMainHwm = 0x08,

    /// Fetch the git commit the app was built from
    Git = 0x09,

    /// Setup chain, watermarks and baking key in one request
    Setup = 0x0A,

    /// Fetch main and test high watermarks and main chain id
    QueryAllHwm = 0x0B,

    /// Remove the authorized baking key
    Deauthorize = 0x0C,

    /// Fetch the authorized key path and its curve
    QueryAuthKeyWithCurve = 0x0D,

    /// Compute a HMAC with a device key
    Hmac = 0x0E,

    /// Sign a message, returning the message hash alongside the signature
    SignWithHash = 0x0F,
}

/// Status words returned by the baking app
#[derive(Copy, Clone, Debug, PartialEq, Eq, Display, EnumString, TryFromPrimitive)]
#[repr(u16)]
pub enum StatusWord {
    Ok = 0x9000,
    WrongParam = 0x6B00,
    WrongLength = 0x6C00,
    InvalidIns = 0x6D00,
    WrongLengthForIns = 0x917E,
    Reject = 0x6985,
    ParseError = 0x9405,
    ReferencedDataNotFound = 0x6A88,
    WrongValues = 0x6A80,
    Security = 0x6982,
    Class = 0x6E00,
    MemoryError = 0x9200,
    UnknownCxErr = 0x9001,
}

impl StatusWord {
    /// Map a raw status word, returning the raw value when unknown
    pub fn from_code(code: u16) -> Result<Self, u16> {
        Self::try_from(code).map_err(|_| code)
    }
}

/// Request parameter errors
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ParamError {
    /// Unknown curve code
    #[error("unknown curve code {0:#04x}")]
    UnknownCurve(u8),

    /// Derivation path exceeds the device limit
    #[error("derivation path too long ({0} components)")]
    PathTooLong(usize),

    /// Derivation path string could not be parsed
    #[error("invalid derivation path '{0}'")]
    InvalidPath(String),

    /// Level outside the valid range
    #[error("invalid level {0}")]
    InvalidLevel(u32),
}

/// Check that a buffer holds at least `n` bytes
pub(crate) fn check_len(buff: &[u8], n: usize) -> Result<(), ApduError> {
    if buff.len() < n {
        return Err(ApduError::InvalidLength);
    }
    Ok(())
}

/// Check that a level is valid for the app (top two bits clear)
pub fn is_valid_level(level: u32) -> bool {
    level & 0xC000_0000 == 0
}

/// Build a command APDU from a request object
pub fn command<'a, R: ApduReq<'a>>(req: &R) -> Result<APDUCommand<Vec<u8>>, ApduError> {
    let h = req.header();

    let mut data = vec![0u8; req.encode_len()?];
    let n = req.encode(&mut data)?;
    data.truncate(n);

    Ok(APDUCommand {
        cla: h.cla,
        ins: h.ins,
        p1: h.p1,
        p2: h.p2,
        data,
    })
}

/// Decode a response object that must span the whole buffer
pub fn decode_exact<T>(buff: &[u8]) -> Result<T, ApduError>
where
    T: DecodeOwned<Output = T, Error = ApduError>,
{
    let (v, n) = T::decode_owned(buff)?;
    if n != buff.len() {
        return Err(ApduError::InvalidLength);
    }
    Ok(v)
}

/// Split a message into APDU-sized chunks, returning the P1 value for each
///
/// An empty message still produces a single (empty, last) chunk.
pub fn chunks(message: &[u8]) -> Vec<(u8, &[u8])> {
    if message.is_empty() {
        return vec![(P1_NEXT | P1_LAST, message)];
    }

    let n = (message.len() + MAX_APDU_PAYLOAD - 1) / MAX_APDU_PAYLOAD;

    message
        .chunks(MAX_APDU_PAYLOAD)
        .enumerate()
        .map(|(i, c)| {
            let p1 = if i + 1 == n { P1_NEXT | P1_LAST } else { P1_NEXT };
            (p1, c)
        })
        .collect()
}
