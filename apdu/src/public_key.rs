// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Public key APDUs

use encdec::{Decode, DecodeOwned, Encode};

use crate::{
    check_len, path::BipPath, scheme::SigScheme, ApduError, ApduHeader, ApduReq, Instruction,
    MAV_APDU_CLA,
};

/// Fetch public key APDU
///
/// Uses [Instruction::PromptPublicKey] when `prompt` is set, displaying the
/// key for approval, otherwise [Instruction::GetPublicKey]. P2 carries the
/// curve code, decoding yields [SigScheme::DEFAULT] and no prompt.
#[derive(Clone, PartialEq, Debug)]
pub struct PublicKeyReq {
    pub prompt: bool,
    pub scheme: SigScheme,
    pub path: BipPath,
}

impl PublicKeyReq {
    pub fn new(prompt: bool, scheme: SigScheme, path: BipPath) -> Self {
        Self {
            prompt,
            scheme,
            path,
        }
    }
}

impl<'a> ApduReq<'a> for PublicKeyReq {
    fn header(&self) -> ApduHeader {
        let ins = match self.prompt {
            true => Instruction::PromptPublicKey,
            false => Instruction::GetPublicKey,
        };

        ApduHeader {
            cla: MAV_APDU_CLA,
            ins: ins as u8,
            p1: 0,
            p2: self.scheme.code(),
        }
    }
}

impl Encode for PublicKeyReq {
    type Error = ApduError;

    fn encode_len(&self) -> Result<usize, Self::Error> {
        self.path.encode_len()
    }

    fn encode(&self, buff: &mut [u8]) -> Result<usize, Self::Error> {
        self.path.encode(buff)
    }
}

impl DecodeOwned for PublicKeyReq {
    type Output = Self;

    type Error = ApduError;

    fn decode_owned(buff: &[u8]) -> Result<(Self::Output, usize), Self::Error> {
        let (path, n) = BipPath::decode(buff)?;
        Ok((Self::new(false, SigScheme::DEFAULT, path), n))
    }
}

/// Public key response APDU, also returned by setup
///
/// ## Encoding
/// ```text
/// len (1) || key (len bytes)
/// ```
///
/// The key bytes are the app's raw point encoding, a leading kind byte
/// then the key data.
#[derive(Clone, PartialEq, Debug)]
pub struct PublicKeyResp {
    pub key: Vec<u8>,
}

impl Encode for PublicKeyResp {
    type Error = ApduError;

    fn encode_len(&self) -> Result<usize, Self::Error> {
        Ok(1 + self.key.len())
    }

    fn encode(&self, buff: &mut [u8]) -> Result<usize, Self::Error> {
        if self.key.len() > u8::MAX as usize {
            return Err(ApduError::InvalidLength);
        }
        check_len(buff, 1 + self.key.len())?;

        buff[0] = self.key.len() as u8;
        buff[1..][..self.key.len()].copy_from_slice(&self.key);

        Ok(1 + self.key.len())
    }
}

impl DecodeOwned for PublicKeyResp {
    type Output = Self;

    type Error = ApduError;

    fn decode_owned(buff: &[u8]) -> Result<(Self::Output, usize), Self::Error> {
        check_len(buff, 1)?;

        let n = buff[0] as usize;
        check_len(buff, 1 + n)?;

        Ok((
            Self {
                key: buff[1..][..n].to_vec(),
            },
            1 + n,
        ))
    }
}
