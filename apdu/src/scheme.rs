// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Signature schemes and their wire curve codes

use encdec::{DecodeOwned, Encode};
use num_enum::TryFromPrimitive;
use strum::{Display, EnumIter, EnumString};

use crate::{check_len, ApduError, ParamError};

/// Signature scheme used by an account, encoded on the wire as the
/// curve code in P2 / response payloads.
#[derive(
    Copy, Clone, Debug, PartialEq, Eq, Hash, Display, EnumString, EnumIter, TryFromPrimitive,
)]
#[repr(u8)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum SigScheme {
    Ed25519 = 0x00,
    Secp256k1 = 0x01,
    Secp256r1 = 0x02,
    Bip32Ed25519 = 0x03,
}

impl SigScheme {
    /// Scheme used when none is specified
    pub const DEFAULT: SigScheme = SigScheme::Ed25519;

    /// Decode a curve code
    pub fn from_code(code: u8) -> Result<Self, ParamError> {
        Self::try_from(code).map_err(|_| ParamError::UnknownCurve(code))
    }

    /// Wire curve code for this scheme
    pub fn code(&self) -> u8 {
        *self as u8
    }

    /// Whether keys for this scheme are ed25519 keys
    pub fn is_ed25519(&self) -> bool {
        matches!(self, SigScheme::Ed25519 | SigScheme::Bip32Ed25519)
    }

    /// Signing family, collapsing the ed25519 derivation variants
    pub fn family(&self) -> SigScheme {
        match self {
            SigScheme::Bip32Ed25519 => SigScheme::Ed25519,
            s => *s,
        }
    }
}

impl Default for SigScheme {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Single byte curve code
impl Encode for SigScheme {
    type Error = ApduError;

    fn encode_len(&self) -> Result<usize, Self::Error> {
        Ok(1)
    }

    fn encode(&self, buff: &mut [u8]) -> Result<usize, Self::Error> {
        check_len(buff, 1)?;
        buff[0] = self.code();
        Ok(1)
    }
}

impl DecodeOwned for SigScheme {
    type Output = Self;

    type Error = ApduError;

    fn decode_owned(buff: &[u8]) -> Result<(Self::Output, usize), Self::Error> {
        check_len(buff, 1)?;

        match Self::from_code(buff[0]) {
            Ok(s) => Ok((s, 1)),
            Err(_) => Err(ApduError::InvalidEncoding),
        }
    }
}
