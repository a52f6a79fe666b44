// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Base58Check encodings for keys, addresses, signatures and hashes
//!
//! Each encoded object is `base58check(prefix || payload)` where the prefix
//! bytes select the human-readable leading characters.

use strum::{Display, EnumIter, IntoEnumIterator};

use super::KeyError;

/// Base58Check prefixes for supported objects
#[derive(Copy, Clone, Debug, PartialEq, Eq, Display, EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum Prefix {
    /// Ed25519 secret key seed
    Edsk,
    /// Secp256k1 secret key
    Spsk,
    /// P256 secret key
    P2sk,
    /// Ed25519 public key
    Edpk,
    /// Secp256k1 compressed public key
    Sppk,
    /// P256 compressed public key
    P2pk,
    /// Ed25519 public key hash
    Mv1,
    /// Secp256k1 public key hash
    Mv2,
    /// P256 public key hash
    Mv3,
    /// Originated contract hash
    #[strum(serialize = "KT1")]
    Kt1,
    /// Ed25519 signature
    Edsig,
    /// Secp256k1 signature
    Spsig1,
    /// P256 signature
    P2sig,
    /// Curve-less signature
    Sig,
    /// Block hash
    #[strum(serialize = "B")]
    BlockHash,
    /// Chain identifier
    #[strum(serialize = "Net")]
    ChainId,
    /// Block payload hash
    #[strum(serialize = "vh")]
    PayloadHash,
    /// Context hash
    #[strum(serialize = "Co")]
    ContextHash,
    /// Operation list list hash
    #[strum(serialize = "LLo")]
    OperationsHash,
}

impl Prefix {
    /// Prefix bytes prepended to the payload before encoding
    pub const fn bytes(&self) -> &'static [u8] {
        match self {
            Prefix::Edsk => &[13, 15, 58, 7],
            Prefix::Spsk => &[17, 162, 224, 201],
            Prefix::P2sk => &[16, 81, 238, 189],
            Prefix::Edpk => &[13, 15, 37, 217],
            Prefix::Sppk => &[3, 254, 226, 86],
            Prefix::P2pk => &[3, 178, 139, 127],
            Prefix::Mv1 => &[5, 186, 196],
            Prefix::Mv2 => &[5, 186, 199],
            Prefix::Mv3 => &[5, 186, 201],
            Prefix::Kt1 => &[2, 90, 121],
            Prefix::Edsig => &[9, 245, 205, 134, 18],
            Prefix::Spsig1 => &[13, 115, 101, 19, 63],
            Prefix::P2sig => &[54, 240, 44, 52],
            Prefix::Sig => &[4, 130, 43],
            Prefix::BlockHash => &[1, 52],
            Prefix::ChainId => &[87, 82, 0],
            Prefix::PayloadHash => &[1, 106, 242],
            Prefix::ContextHash => &[79, 199],
            Prefix::OperationsHash => &[29, 159, 109],
        }
    }

    /// Expected payload length
    pub const fn payload_len(&self) -> usize {
        match self {
            Prefix::Edsk | Prefix::Spsk | Prefix::P2sk | Prefix::Edpk => 32,
            Prefix::Sppk | Prefix::P2pk => 33,
            Prefix::Mv1 | Prefix::Mv2 | Prefix::Mv3 | Prefix::Kt1 => 20,
            Prefix::Edsig | Prefix::Spsig1 | Prefix::P2sig | Prefix::Sig => 64,
            Prefix::ChainId => 4,
            Prefix::BlockHash
            | Prefix::PayloadHash
            | Prefix::ContextHash
            | Prefix::OperationsHash => 32,
        }
    }

    /// Encode a payload with this prefix
    pub fn encode(&self, payload: &[u8]) -> String {
        let mut b = Vec::with_capacity(self.bytes().len() + payload.len());
        b.extend_from_slice(self.bytes());
        b.extend_from_slice(payload);

        bs58::encode(b).with_check().into_string()
    }

    /// Decode a string that must carry this prefix
    pub fn decode(&self, s: &str) -> Result<Vec<u8>, KeyError> {
        let (p, payload) = decode(s)?;
        if p != *self {
            return Err(KeyError::UnexpectedPrefix {
                expected: *self,
                actual: p,
            });
        }
        Ok(payload)
    }
}

/// Decode a Base58Check string, detecting the prefix from the decoded bytes
pub fn decode(s: &str) -> Result<(Prefix, Vec<u8>), KeyError> {
    let b = bs58::decode(s).with_check(None).into_vec()?;

    for p in Prefix::iter() {
        let pb = p.bytes();
        if b.len() == pb.len() + p.payload_len() && b.starts_with(pb) {
            return Ok((p, b[pb.len()..].to_vec()));
        }
    }

    Err(KeyError::UnknownPrefix(s.chars().take(5).collect()))
}
