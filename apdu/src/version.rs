// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Application version and build APDUs

use std::fmt::Display;

use encdec::{Decode, DecodeOwned, Encode};
use num_enum::TryFromPrimitive;

use crate::{ApduError, ApduStatic, Instruction, MAV_APDU_CLA};

/// Application class reported in the version response
#[derive(Copy, Clone, Debug, PartialEq, Eq, strum::Display, TryFromPrimitive)]
#[repr(u8)]
pub enum AppClass {
    Wallet = 0,
    Baking = 1,
}

/// Fetch application version APDU
#[derive(Copy, Clone, PartialEq, Debug, Default, Encode, DecodeOwned)]
#[encdec(error = "ApduError")]
pub struct VersionReq {}

impl ApduStatic for VersionReq {
    const CLA: u8 = MAV_APDU_CLA;
    const INS: u8 = Instruction::Version as u8;
}

/// Application version response APDU
///
/// ## Encoding
/// ```text
///  0                   1                   2                   3
///  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |     CLASS     |     MAJOR     |     MINOR     |     PATCH     |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// ```
#[derive(Copy, Clone, Debug, PartialEq, Eq, Encode, DecodeOwned)]
#[encdec(error = "ApduError")]
pub struct Version {
    /// Raw class byte, see [`AppClass`]
    pub class: u8,
    pub major: u8,
    pub minor: u8,
    pub patch: u8,
}

impl Version {
    pub const fn new(class: AppClass, major: u8, minor: u8, patch: u8) -> Self {
        Self {
            class: class as u8,
            major,
            minor,
            patch,
        }
    }

    pub fn app_class(&self) -> Option<AppClass> {
        AppClass::try_from(self.class).ok()
    }
}

impl Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Fetch application build commit APDU
#[derive(Copy, Clone, PartialEq, Debug, Default, Encode, DecodeOwned)]
#[encdec(error = "ApduError")]
pub struct GitReq {}

impl ApduStatic for GitReq {
    const CLA: u8 = MAV_APDU_CLA;
    const INS: u8 = Instruction::Git as u8;
}

/// Build commit response APDU, a NUL terminated string spanning the payload
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GitResp {
    pub commit: String,
}

impl Encode for GitResp {
    type Error = ApduError;

    fn encode_len(&self) -> Result<usize, Self::Error> {
        Ok(self.commit.len() + 1)
    }

    fn encode(&self, buff: &mut [u8]) -> Result<usize, Self::Error> {
        let b = self.commit.as_bytes();
        if buff.len() < b.len() + 1 {
            return Err(ApduError::InvalidLength);
        }

        buff[..b.len()].copy_from_slice(b);
        buff[b.len()] = 0;

        Ok(b.len() + 1)
    }
}

impl DecodeOwned for GitResp {
    type Output = Self;

    type Error = ApduError;

    fn decode_owned(buff: &[u8]) -> Result<(Self::Output, usize), Self::Error> {
        let s = std::str::from_utf8(buff).map_err(|_| ApduError::InvalidUtf8)?;

        Ok((
            Self {
                commit: s.trim_end_matches('\0').to_string(),
            },
            buff.len(),
        ))
    }
}
