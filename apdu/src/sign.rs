// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Signing APDUs
//!
//! Signing is a multi-APDU exchange: the derivation path is sent with
//! [P1_FIRST], followed by the message split into [MAX_APDU_PAYLOAD] byte
//! chunks, the final chunk flagged with [P1_LAST]. The response to the final
//! chunk carries the signature.

use encdec::{DecodeOwned, Encode};

use crate::{
    check_len, chunks, path::BipPath, scheme::SigScheme, ApduError, ApduHeader, ApduReq,
    Instruction, MAV_APDU_CLA, MAX_APDU_PAYLOAD, P1_FIRST, P1_LAST,
};

/// Sign request APDU, one chunk of a signing exchange
///
/// Uses [Instruction::SignWithHash] when `with_hash` is set. P1 and P2 (the
/// curve code) are carried in the header, decoding yields a first chunk
/// with [SigScheme::DEFAULT].
#[derive(Clone, PartialEq, Debug)]
pub struct SignReq {
    pub with_hash: bool,
    pub p1: u8,
    pub scheme: SigScheme,
    pub data: Vec<u8>,
}

impl SignReq {
    /// Build the request sequence for signing `message` with the key at `path`
    pub fn sequence(with_hash: bool, scheme: SigScheme, path: &BipPath, message: &[u8]) -> Vec<Self> {
        let mut r = vec![Self {
            with_hash,
            p1: P1_FIRST,
            scheme,
            data: path.to_bytes(),
        }];

        r.extend(chunks(message).into_iter().map(|(p1, c)| Self {
            with_hash,
            p1,
            scheme,
            data: c.to_vec(),
        }));

        r
    }

    /// Check whether this is the final chunk of the exchange
    pub fn is_last(&self) -> bool {
        self.p1 & P1_LAST != 0
    }
}

impl<'a> ApduReq<'a> for SignReq {
    fn header(&self) -> ApduHeader {
        let ins = match self.with_hash {
            true => Instruction::SignWithHash,
            false => Instruction::Sign,
        };

        ApduHeader {
            cla: MAV_APDU_CLA,
            ins: ins as u8,
            p1: self.p1,
            p2: self.scheme.code(),
        }
    }
}

impl Encode for SignReq {
    type Error = ApduError;

    fn encode_len(&self) -> Result<usize, Self::Error> {
        Ok(self.data.len())
    }

    fn encode(&self, buff: &mut [u8]) -> Result<usize, Self::Error> {
        if self.data.len() > MAX_APDU_PAYLOAD {
            return Err(ApduError::InvalidLength);
        }
        check_len(buff, self.data.len())?;

        buff[..self.data.len()].copy_from_slice(&self.data);

        Ok(self.data.len())
    }
}

impl DecodeOwned for SignReq {
    type Output = Self;

    type Error = ApduError;

    fn decode_owned(buff: &[u8]) -> Result<(Self::Output, usize), Self::Error> {
        Ok((
            Self {
                with_hash: false,
                p1: P1_FIRST,
                scheme: SigScheme::DEFAULT,
                data: buff.to_vec(),
            },
            buff.len(),
        ))
    }
}

/// Signature response APDU, raw signature bytes spanning the payload
#[derive(Clone, PartialEq, Debug)]
pub struct SignResp {
    pub signature: Vec<u8>,
}

impl Encode for SignResp {
    type Error = ApduError;

    fn encode_len(&self) -> Result<usize, Self::Error> {
        Ok(self.signature.len())
    }

    fn encode(&self, buff: &mut [u8]) -> Result<usize, Self::Error> {
        check_len(buff, self.signature.len())?;
        buff[..self.signature.len()].copy_from_slice(&self.signature);
        Ok(self.signature.len())
    }
}

impl DecodeOwned for SignResp {
    type Output = Self;

    type Error = ApduError;

    fn decode_owned(buff: &[u8]) -> Result<(Self::Output, usize), Self::Error> {
        Ok((
            Self {
                signature: buff.to_vec(),
            },
            buff.len(),
        ))
    }
}

/// Signature with message hash response APDU
///
/// ## Encoding
/// ```text
/// blake2b hash (32) || signature
/// ```
#[derive(Clone, PartialEq, Debug)]
pub struct SignWithHashResp {
    pub hash: [u8; 32],
    pub signature: Vec<u8>,
}

impl Encode for SignWithHashResp {
    type Error = ApduError;

    fn encode_len(&self) -> Result<usize, Self::Error> {
        Ok(32 + self.signature.len())
    }

    fn encode(&self, buff: &mut [u8]) -> Result<usize, Self::Error> {
        check_len(buff, 32 + self.signature.len())?;

        buff[..32].copy_from_slice(&self.hash);
        buff[32..][..self.signature.len()].copy_from_slice(&self.signature);

        Ok(32 + self.signature.len())
    }
}

impl DecodeOwned for SignWithHashResp {
    type Output = Self;

    type Error = ApduError;

    fn decode_owned(buff: &[u8]) -> Result<(Self::Output, usize), Self::Error> {
        check_len(buff, 32)?;

        let mut hash = [0u8; 32];
        hash.copy_from_slice(&buff[..32]);

        Ok((
            Self {
                hash,
                signature: buff[32..].to_vec(),
            },
            buff.len(),
        ))
    }
}
