// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Key material for the supported signature schemes
//!
//! Provides Base58Check parsing / encoding of secret keys, public keys,
//! addresses and signatures, along with signing and verification using
//! `blake2b-256` message digests as expected by the baking app.

use std::{fmt::Display, str::FromStr};

use blake2::{
    digest::consts::{U20, U32},
    Blake2b, Digest,
};
use ed25519_dalek::{Signer, Verifier};
use k256::ecdsa::signature::hazmat::{PrehashSigner, PrehashVerifier};

use mavryk_apdu::scheme::SigScheme;

mod encoding;
pub use encoding::{decode as b58_decode, Prefix};

mod signature;
pub use signature::Signature;

/// Key parsing and signing errors
#[derive(Debug, thiserror::Error)]
pub enum KeyError {
    #[error("base58 decoding failed: {0}")]
    Base58(#[from] bs58::decode::Error),

    #[error("unknown encoding prefix '{0}'")]
    UnknownPrefix(String),

    #[error("unexpected prefix (expected: {expected}, actual: {actual})")]
    UnexpectedPrefix { expected: Prefix, actual: Prefix },

    #[error("{prefix} key does not match scheme {scheme}")]
    SchemeMismatch { scheme: SigScheme, prefix: Prefix },

    #[error("invalid length (expected: {expected}, actual: {actual})")]
    InvalidLength { expected: usize, actual: usize },

    #[error("invalid key")]
    InvalidKey,

    #[error("invalid public key kind {0:#04x}")]
    InvalidKind(u8),

    #[error("invalid signature")]
    InvalidSignature,

    #[error("invalid signature TLV: {0}")]
    InvalidTlv(&'static str),

    #[error("signature verification failed")]
    Verification,
}

/// Hash a message with blake2b-256
pub fn blake2b_256(message: &[u8]) -> [u8; 32] {
    Blake2b::<U32>::digest(message).into()
}

/// Hash a message with blake2b-160
pub fn blake2b_160(message: &[u8]) -> [u8; 20] {
    Blake2b::<U20>::digest(message).into()
}

/// Secret key for one of the supported curves
#[derive(Clone)]
pub enum SecretKey {
    Ed25519(ed25519_dalek::SigningKey),
    Secp256k1(k256::ecdsa::SigningKey),
    Secp256r1(p256::ecdsa::SigningKey),
}

/// Public key for one of the supported curves
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PublicKey {
    Ed25519(ed25519_dalek::VerifyingKey),
    Secp256k1(k256::ecdsa::VerifyingKey),
    Secp256r1(p256::ecdsa::VerifyingKey),
}

/// Key material held by an account
///
/// Some accounts only expose their public key, the secret being derived
/// on-device (BIP32-Ed25519).
#[derive(Clone, Debug)]
pub enum AccountKey {
    Secret(SecretKey),
    Public(PublicKey),
}

impl std::fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SecretKey({})", self.public_key())
    }
}

impl SecretKey {
    /// Curve family of this key
    pub fn curve(&self) -> SigScheme {
        match self {
            SecretKey::Ed25519(_) => SigScheme::Ed25519,
            SecretKey::Secp256k1(_) => SigScheme::Secp256k1,
            SecretKey::Secp256r1(_) => SigScheme::Secp256r1,
        }
    }

    /// Fetch the matching public key
    pub fn public_key(&self) -> PublicKey {
        match self {
            SecretKey::Ed25519(k) => PublicKey::Ed25519(k.verifying_key()),
            SecretKey::Secp256k1(k) => PublicKey::Secp256k1(*k.verifying_key()),
            SecretKey::Secp256r1(k) => PublicKey::Secp256r1(*k.verifying_key()),
        }
    }

    /// Encode as Base58Check (`edsk`, `spsk`, `p2sk`)
    pub fn to_b58(&self) -> String {
        match self {
            SecretKey::Ed25519(k) => Prefix::Edsk.encode(&k.to_bytes()),
            SecretKey::Secp256k1(k) => Prefix::Spsk.encode(&k.to_bytes()),
            SecretKey::Secp256r1(k) => Prefix::P2sk.encode(&k.to_bytes()),
        }
    }

    /// Sign an already hashed message, returning the raw 64 byte signature
    ///
    /// ECDSA signatures are `r || s` with a low `s` component.
    pub fn sign_prehashed(&self, digest: &[u8]) -> Result<[u8; 64], KeyError> {
        let b = match self {
            SecretKey::Ed25519(k) => k.sign(digest).to_bytes(),
            SecretKey::Secp256k1(k) => {
                let s: k256::ecdsa::Signature =
                    k.sign_prehash(digest).map_err(|_| KeyError::InvalidSignature)?;
                let s = s.normalize_s().unwrap_or(s);
                to_array(&s.to_bytes())?
            }
            SecretKey::Secp256r1(k) => {
                let s: p256::ecdsa::Signature =
                    k.sign_prehash(digest).map_err(|_| KeyError::InvalidSignature)?;
                let s = s.normalize_s().unwrap_or(s);
                to_array(&s.to_bytes())?
            }
        };

        Ok(b)
    }

    /// Hash and sign a message
    pub fn sign(&self, message: &[u8]) -> Result<Signature, KeyError> {
        let b = self.sign_prehashed(&blake2b_256(message))?;
        Ok(Signature::new(Some(self.curve()), b))
    }
}

impl FromStr for SecretKey {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (p, d) = b58_decode(s)?;

        let k = match p {
            Prefix::Edsk => SecretKey::Ed25519(ed25519_dalek::SigningKey::from_bytes(
                &to_array(&d)?,
            )),
            Prefix::Spsk => SecretKey::Secp256k1(
                k256::ecdsa::SigningKey::from_slice(&d).map_err(|_| KeyError::InvalidKey)?,
            ),
            Prefix::P2sk => SecretKey::Secp256r1(
                p256::ecdsa::SigningKey::from_slice(&d).map_err(|_| KeyError::InvalidKey)?,
            ),
            _ => return Err(KeyError::UnknownPrefix(p.to_string())),
        };

        Ok(k)
    }
}

impl PublicKey {
    /// Curve family of this key
    pub fn curve(&self) -> SigScheme {
        match self {
            PublicKey::Ed25519(_) => SigScheme::Ed25519,
            PublicKey::Secp256k1(_) => SigScheme::Secp256k1,
            PublicKey::Secp256r1(_) => SigScheme::Secp256r1,
        }
    }

    /// Raw key bytes (32 byte ed25519 key or 33 byte compressed point)
    pub fn to_raw(&self) -> Vec<u8> {
        match self {
            PublicKey::Ed25519(k) => k.to_bytes().to_vec(),
            PublicKey::Secp256k1(k) => k.to_encoded_point(true).as_bytes().to_vec(),
            PublicKey::Secp256r1(k) => k.to_encoded_point(true).as_bytes().to_vec(),
        }
    }

    /// Parse a public key from raw bytes for the provided curve family
    pub fn from_raw(scheme: SigScheme, raw: &[u8]) -> Result<Self, KeyError> {
        let k = match scheme.family() {
            SigScheme::Secp256k1 => PublicKey::Secp256k1(
                k256::ecdsa::VerifyingKey::from_sec1_bytes(raw)
                    .map_err(|_| KeyError::InvalidKey)?,
            ),
            SigScheme::Secp256r1 => PublicKey::Secp256r1(
                p256::ecdsa::VerifyingKey::from_sec1_bytes(raw)
                    .map_err(|_| KeyError::InvalidKey)?,
            ),
            _ => PublicKey::Ed25519(
                ed25519_dalek::VerifyingKey::from_bytes(&to_array(raw)?)
                    .map_err(|_| KeyError::InvalidKey)?,
            ),
        };
        Ok(k)
    }

    /// Parse a public key returned by the device (`kind || pk`)
    ///
    /// Ed25519 keys use kind `0x02` with a 32 byte key, secp256 keys are
    /// uncompressed (`0x04 || x || y`) and are compressed here.
    pub fn from_bytes(data: &[u8], scheme: SigScheme) -> Result<Self, KeyError> {
        let (kind, pk) = match data.split_first() {
            Some((k, pk)) => (*k, pk),
            None => {
                return Err(KeyError::InvalidLength {
                    expected: 1,
                    actual: 0,
                })
            }
        };

        if scheme.is_ed25519() {
            if kind != 0x02 {
                return Err(KeyError::InvalidKind(kind));
            }
            return Self::from_raw(scheme, pk);
        }

        if kind != 0x04 {
            return Err(KeyError::InvalidKind(kind));
        }
        if pk.len() != 64 {
            return Err(KeyError::InvalidLength {
                expected: 64,
                actual: pk.len(),
            });
        }

        let mut compressed = [0u8; 33];
        compressed[0] = if pk[63] & 1 == 1 { 0x03 } else { 0x02 };
        compressed[1..].copy_from_slice(&pk[..32]);

        Self::from_raw(scheme, &compressed)
    }

    /// Public key hash (blake2b-160 of the raw key)
    pub fn hash(&self) -> [u8; 20] {
        blake2b_160(&self.to_raw())
    }

    /// Address for this key (`mv1`, `mv2`, `mv3`)
    pub fn address(&self) -> String {
        let p = match self {
            PublicKey::Ed25519(_) => Prefix::Mv1,
            PublicKey::Secp256k1(_) => Prefix::Mv2,
            PublicKey::Secp256r1(_) => Prefix::Mv3,
        };
        p.encode(&self.hash())
    }

    /// Encode as Base58Check (`edpk`, `sppk`, `p2pk`)
    pub fn to_b58(&self) -> String {
        let p = match self {
            PublicKey::Ed25519(_) => Prefix::Edpk,
            PublicKey::Secp256k1(_) => Prefix::Sppk,
            PublicKey::Secp256r1(_) => Prefix::P2pk,
        };
        p.encode(&self.to_raw())
    }

    /// Verify a raw signature over an already hashed message
    pub fn verify_prehashed(&self, digest: &[u8], sig: &[u8; 64]) -> Result<(), KeyError> {
        match self {
            PublicKey::Ed25519(k) => {
                let s = ed25519_dalek::Signature::from_bytes(sig);
                k.verify(digest, &s).map_err(|_| KeyError::Verification)
            }
            PublicKey::Secp256k1(k) => {
                let s = k256::ecdsa::Signature::from_slice(sig)
                    .map_err(|_| KeyError::InvalidSignature)?;
                let s = s.normalize_s().unwrap_or(s);
                k.verify_prehash(digest, &s)
                    .map_err(|_| KeyError::Verification)
            }
            PublicKey::Secp256r1(k) => {
                let s = p256::ecdsa::Signature::from_slice(sig)
                    .map_err(|_| KeyError::InvalidSignature)?;
                k.verify_prehash(digest, &s)
                    .map_err(|_| KeyError::Verification)
            }
        }
    }

    /// Verify a signature over a message
    pub fn verify(&self, message: &[u8], sig: &Signature) -> Result<(), KeyError> {
        if let Some(c) = sig.curve() {
            if c != self.curve() {
                return Err(KeyError::Verification);
            }
        }
        self.verify_prehashed(&blake2b_256(message), sig.as_bytes())
    }
}

impl FromStr for PublicKey {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (p, d) = b58_decode(s)?;

        match p {
            Prefix::Edpk => Self::from_raw(SigScheme::Ed25519, &d),
            Prefix::Sppk => Self::from_raw(SigScheme::Secp256k1, &d),
            Prefix::P2pk => Self::from_raw(SigScheme::Secp256r1, &d),
            _ => Err(KeyError::UnknownPrefix(p.to_string())),
        }
    }
}

impl Display for PublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_b58())
    }
}

impl AccountKey {
    /// Parse Base58Check key material, secret or public
    pub fn parse(s: &str) -> Result<Self, KeyError> {
        let (p, _) = b58_decode(s)?;
        match p {
            Prefix::Edsk | Prefix::Spsk | Prefix::P2sk => Ok(Self::Secret(s.parse()?)),
            Prefix::Edpk | Prefix::Sppk | Prefix::P2pk => Ok(Self::Public(s.parse()?)),
            _ => Err(KeyError::UnknownPrefix(p.to_string())),
        }
    }

    /// Encoding prefix of this key material
    pub fn prefix(&self) -> Prefix {
        match self {
            AccountKey::Secret(SecretKey::Ed25519(_)) => Prefix::Edsk,
            AccountKey::Secret(SecretKey::Secp256k1(_)) => Prefix::Spsk,
            AccountKey::Secret(SecretKey::Secp256r1(_)) => Prefix::P2sk,
            AccountKey::Public(PublicKey::Ed25519(_)) => Prefix::Edpk,
            AccountKey::Public(PublicKey::Secp256k1(_)) => Prefix::Sppk,
            AccountKey::Public(PublicKey::Secp256r1(_)) => Prefix::P2pk,
        }
    }

    /// Curve family of this key material
    pub fn curve(&self) -> SigScheme {
        match self {
            AccountKey::Secret(k) => k.curve(),
            AccountKey::Public(k) => k.curve(),
        }
    }

    pub fn public_key(&self) -> PublicKey {
        match self {
            AccountKey::Secret(k) => k.public_key(),
            AccountKey::Public(k) => k.clone(),
        }
    }

    pub fn secret_key(&self) -> Option<&SecretKey> {
        match self {
            AccountKey::Secret(k) => Some(k),
            AccountKey::Public(_) => None,
        }
    }
}

/// Key material is equal when of the same kind and for the same public key
impl PartialEq for AccountKey {
    fn eq(&self, other: &Self) -> bool {
        self.prefix() == other.prefix() && self.public_key() == other.public_key()
    }
}

impl FromStr for AccountKey {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Copy a slice into a fixed size array, checking the length
pub(crate) fn to_array<const N: usize>(d: &[u8]) -> Result<[u8; N], KeyError> {
    d.try_into().map_err(|_| KeyError::InvalidLength {
        expected: N,
        actual: d.len(),
    })
}
