// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Signatures and conversion from device signature formats

use std::{fmt::Display, str::FromStr};

use mavryk_apdu::scheme::SigScheme;

use super::{b58_decode, to_array, KeyError, Prefix};

/// 64 byte signature, optionally bound to a curve
///
/// Generic (`sig`) signatures carry no curve information.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Signature {
    curve: Option<SigScheme>,
    bytes: [u8; 64],
}

impl Signature {
    pub fn new(curve: Option<SigScheme>, bytes: [u8; 64]) -> Self {
        Self {
            curve: curve.map(|c| c.family()),
            bytes,
        }
    }

    pub fn curve(&self) -> Option<SigScheme> {
        self.curve
    }

    pub fn as_bytes(&self) -> &[u8; 64] {
        &self.bytes
    }

    /// Encode with the curve specific prefix, falling back to the generic
    /// prefix for curve-less signatures
    pub fn to_b58(&self) -> String {
        let p = match self.curve {
            Some(SigScheme::Secp256k1) => Prefix::Spsig1,
            Some(SigScheme::Secp256r1) => Prefix::P2sig,
            Some(_) => Prefix::Edsig,
            None => Prefix::Sig,
        };
        p.encode(&self.bytes)
    }

    /// Encode with the generic `sig` prefix
    pub fn to_generic_b58(&self) -> String {
        Prefix::Sig.encode(&self.bytes)
    }

    /// Extract `r || s` from a DER encoded ECDSA signature
    ///
    /// ```text
    /// 30 || L || 02 || Lr || r || 02 || Ls || s
    /// ```
    ///
    /// The device sets the key parity in the low bit of the first byte,
    /// this is cleared before decoding. Components are left padded or
    /// stripped of leading zero bytes to 32 bytes.
    pub fn from_secp256_tlv(tlv: &[u8]) -> Result<[u8; 64], KeyError> {
        if tlv.len() < 2 {
            return Err(KeyError::InvalidTlv("truncated header"));
        }
        if tlv[0] & !0x01 != 0x30 {
            return Err(KeyError::InvalidTlv("invalid header tag"));
        }
        if tlv[1] as usize != tlv.len() - 2 {
            return Err(KeyError::InvalidTlv("invalid length"));
        }

        let (r, rest) = read_integer(&tlv[2..])?;
        let (s, rest) = read_integer(rest)?;
        if !rest.is_empty() {
            return Err(KeyError::InvalidTlv("trailing bytes"));
        }

        let mut out = [0u8; 64];
        out[..32].copy_from_slice(&fit_32(r)?);
        out[32..].copy_from_slice(&fit_32(s)?);

        Ok(out)
    }

    /// Convert device signature bytes for the provided scheme
    ///
    /// Ed25519 signatures are used as-is, secp256 signatures are TLV encoded.
    pub fn from_bytes(data: &[u8], scheme: SigScheme) -> Result<Self, KeyError> {
        let bytes = match scheme.is_ed25519() {
            true => to_array(data)?,
            false => Self::from_secp256_tlv(data)?,
        };
        Ok(Self::new(Some(scheme), bytes))
    }
}

/// Read a DER integer, returning the value and remaining bytes
fn read_integer(d: &[u8]) -> Result<(&[u8], &[u8]), KeyError> {
    if d.len() < 2 || d[0] != 0x02 {
        return Err(KeyError::InvalidTlv("invalid integer tag"));
    }
    let n = d[1] as usize;
    if d.len() < 2 + n {
        return Err(KeyError::InvalidTlv("truncated integer"));
    }
    Ok((&d[2..2 + n], &d[2 + n..]))
}

fn fit_32(v: &[u8]) -> Result<[u8; 32], KeyError> {
    let v = match v.len() > 32 {
        true => {
            let (pad, v) = v.split_at(v.len() - 32);
            if pad.iter().any(|b| *b != 0) {
                return Err(KeyError::InvalidTlv("integer overflow"));
            }
            v
        }
        false => v,
    };

    let mut out = [0u8; 32];
    out[32 - v.len()..].copy_from_slice(v);
    Ok(out)
}

impl FromStr for Signature {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (p, d) = b58_decode(s)?;
        let curve = match p {
            Prefix::Edsig => Some(SigScheme::Ed25519),
            Prefix::Spsig1 => Some(SigScheme::Secp256k1),
            Prefix::P2sig => Some(SigScheme::Secp256r1),
            Prefix::Sig => None,
            _ => return Err(KeyError::UnknownPrefix(p.to_string())),
        };
        Ok(Self::new(curve, to_array(&d)?))
    }
}

impl Display for Signature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_b58())
    }
}
