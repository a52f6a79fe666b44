// Copyright (c) 2022-2023 The MobileCoin Foundation

//! BIP32 derivation paths
//!
//! Paths are encoded on the wire as a component count followed by the
//! big-endian path components.
//!
//! ```text
//!  0                   1                   2                   3
//!  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |      LEN      |            COMPONENT 0 (u32, big endian)      /
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! /               |                     ...                       /
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! ```

use std::{fmt::Display, str::FromStr};

use byteorder::{BigEndian, ByteOrder};
use encdec::{DecodeOwned, Encode};

use crate::{check_len, decode_exact, ApduError, ParamError};

/// Hardened component flag
pub const HARDENED: u32 = 0x8000_0000;

/// Maximum number of path components accepted by the device
pub const MAX_PATH_LEN: usize = 10;

/// Parsed BIP32 derivation path, `m` being the empty (root) path
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct BipPath(Vec<u32>);

impl BipPath {
    /// Create a path from raw components
    pub fn new(components: Vec<u32>) -> Result<Self, ParamError> {
        if components.len() > MAX_PATH_LEN {
            return Err(ParamError::PathTooLong(components.len()));
        }
        Ok(Self(components))
    }

    /// Empty (`m`) path
    pub fn empty() -> Self {
        Self(vec![])
    }

    /// Path components, hardened bit included
    pub fn components(&self) -> &[u32] {
        &self.0
    }

    /// Check whether this is the empty path
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Encode path into the device wire format
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buff = vec![0u8; 1 + self.0.len() * 4];

        buff[0] = self.0.len() as u8;
        for (i, c) in self.0.iter().enumerate() {
            BigEndian::write_u32(&mut buff[1 + i * 4..], *c);
        }

        buff
    }

    /// Decode a path that must span the whole buffer
    pub fn from_bytes(buff: &[u8]) -> Result<Self, ApduError> {
        decode_exact(buff)
    }
}

impl Encode for BipPath {
    type Error = ApduError;

    fn encode_len(&self) -> Result<usize, Self::Error> {
        Ok(1 + self.0.len() * 4)
    }

    fn encode(&self, buff: &mut [u8]) -> Result<usize, Self::Error> {
        let b = self.to_bytes();
        check_len(buff, b.len())?;

        buff[..b.len()].copy_from_slice(&b);

        Ok(b.len())
    }
}

impl DecodeOwned for BipPath {
    type Output = Self;

    type Error = ApduError;

    fn decode_owned(buff: &[u8]) -> Result<(Self::Output, usize), Self::Error> {
        check_len(buff, 1)?;

        let n = buff[0] as usize;
        if n > MAX_PATH_LEN {
            return Err(ApduError::InvalidEncoding);
        }

        let len = 1 + n * 4;
        check_len(buff, len)?;

        let components = (0..n)
            .map(|i| BigEndian::read_u32(&buff[1 + i * 4..]))
            .collect();

        Ok((Self(components), len))
    }
}

impl FromStr for BipPath {
    type Err = ParamError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ParamError::InvalidPath(s.to_string());

        let mut parts = s.trim().split('/');

        // Paths must be rooted
        if parts.next() != Some("m") {
            return Err(invalid());
        }

        let mut components = vec![];
        for p in parts {
            let (n, hardened) = match p.strip_suffix(['\'', 'h']) {
                Some(n) => (n, true),
                None => (p, false),
            };

            let v = n.parse::<u32>().map_err(|_| invalid())?;
            if v & HARDENED != 0 {
                return Err(invalid());
            }

            components.push(if hardened { v | HARDENED } else { v });
        }

        Self::new(components)
    }
}

impl Display for BipPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "m")?;
        for c in &self.0 {
            match c & HARDENED != 0 {
                true => write!(f, "/{}'", c & !HARDENED)?,
                false => write!(f, "/{c}")?,
            }
        }
        Ok(())
    }
}
