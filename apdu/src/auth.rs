// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Baking key authorization APDUs

use encdec::{Decode, DecodeOwned, Encode};

use crate::{path::BipPath, scheme::SigScheme, ApduError, ApduStatic, Instruction, MAV_APDU_CLA};

/// Authorize a baking key APDU, prompts the user
///
/// The key's curve code is carried in P2. With no path the request has an
/// empty body and the app uses its default key. Decoding yields
/// [SigScheme::DEFAULT] as P2 is not part of the payload.
#[derive(Clone, PartialEq, Debug, Default)]
pub struct AuthorizeReq {
    pub scheme: SigScheme,
    pub path: Option<BipPath>,
}

impl AuthorizeReq {
    pub fn new(scheme: SigScheme, path: Option<BipPath>) -> Self {
        Self { scheme, path }
    }
}

impl ApduStatic for AuthorizeReq {
    const CLA: u8 = MAV_APDU_CLA;
    const INS: u8 = Instruction::AuthorizeBaking as u8;

    fn p2(&self) -> u8 {
        self.scheme.code()
    }
}

impl Encode for AuthorizeReq {
    type Error = ApduError;

    fn encode_len(&self) -> Result<usize, Self::Error> {
        match &self.path {
            Some(p) => p.encode_len(),
            None => Ok(0),
        }
    }

    fn encode(&self, buff: &mut [u8]) -> Result<usize, Self::Error> {
        match &self.path {
            Some(p) => p.encode(buff),
            None => Ok(0),
        }
    }
}

impl DecodeOwned for AuthorizeReq {
    type Output = Self;

    type Error = ApduError;

    fn decode_owned(buff: &[u8]) -> Result<(Self::Output, usize), Self::Error> {
        if buff.is_empty() {
            return Ok((Self::default(), 0));
        }

        let (p, n) = BipPath::decode(buff)?;

        Ok((Self::new(SigScheme::DEFAULT, Some(p)), n))
    }
}

/// Remove the authorized baking key APDU
#[derive(Copy, Clone, PartialEq, Debug, Default, Encode, DecodeOwned)]
#[encdec(error = "ApduError")]
pub struct DeauthorizeReq {}

impl ApduStatic for DeauthorizeReq {
    const CLA: u8 = MAV_APDU_CLA;
    const INS: u8 = Instruction::Deauthorize as u8;
}

/// Fetch the authorized key path APDU, answered with a [BipPath]
#[derive(Copy, Clone, PartialEq, Debug, Default, Encode, DecodeOwned)]
#[encdec(error = "ApduError")]
pub struct AuthKeyReq {}

impl ApduStatic for AuthKeyReq {
    const CLA: u8 = MAV_APDU_CLA;
    const INS: u8 = Instruction::QueryAuthKey as u8;
}

/// Fetch the authorized key path and curve APDU
#[derive(Copy, Clone, PartialEq, Debug, Default, Encode, DecodeOwned)]
#[encdec(error = "ApduError")]
pub struct AuthKeyWithCurveReq {}

impl ApduStatic for AuthKeyWithCurveReq {
    const CLA: u8 = MAV_APDU_CLA;
    const INS: u8 = Instruction::QueryAuthKeyWithCurve as u8;
}

/// Authorized key response APDU
///
/// ## Encoding
/// ```text
/// curve code (1) || path
/// ```
#[derive(Clone, PartialEq, Debug, Encode, DecodeOwned)]
#[encdec(error = "ApduError")]
pub struct AuthKeyWithCurveResp {
    pub scheme: SigScheme,
    pub path: BipPath,
}
