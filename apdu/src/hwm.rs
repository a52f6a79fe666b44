// Copyright (c) 2022-2023 The MobileCoin Foundation

//! High watermark (HWM) payloads
//!
//! The app tracks the highest signed level and round for the main chain
//! and the test chain.
//!
//! ## Main HWM response
//! ```text
//!  0                   1                   2                   3
//!  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                         HIGHEST LEVEL                         |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                         HIGHEST ROUND                         |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! ```
//!
//! ## All HWM response
//! ```text
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                    MAIN HWM (8 bytes)                         |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                    TEST HWM (8 bytes)                         |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                         MAIN CHAIN ID                         |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! ```

use encdec::{Decode, DecodeOwned, Encode};

use crate::{
    helpers::*, is_valid_level, path::BipPath, scheme::SigScheme, ApduError, ApduStatic,
    Instruction, ParamError, MAV_APDU_CLA,
};

/// High watermark for a single chain
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Encode, DecodeOwned)]
#[encdec(error = "ApduError")]
pub struct Hwm {
    #[encdec(with = "be_u32")]
    pub highest_level: u32,
    #[encdec(with = "be_u32")]
    pub highest_round: u32,
}

impl Hwm {
    pub const LEN: usize = 8;

    pub fn new(highest_level: u32, highest_round: u32) -> Self {
        Self {
            highest_level,
            highest_round,
        }
    }
}

/// Main and test chain watermarks with the main chain id
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Encode, DecodeOwned)]
#[encdec(error = "ApduError")]
pub struct AllHwm {
    pub main: Hwm,
    pub test: Hwm,
    #[encdec(with = "be_u32")]
    pub chain_id: u32,
}

impl AllHwm {
    pub const LEN: usize = Hwm::LEN * 2 + 4;
}

/// Fetch main chain watermark APDU, answered with a [Hwm]
#[derive(Copy, Clone, PartialEq, Debug, Default, Encode, DecodeOwned)]
#[encdec(error = "ApduError")]
pub struct MainHwmReq {}

impl ApduStatic for MainHwmReq {
    const CLA: u8 = MAV_APDU_CLA;
    const INS: u8 = Instruction::QueryMainHwm as u8;
}

/// Fetch all watermarks APDU, answered with an [AllHwm]
#[derive(Copy, Clone, PartialEq, Debug, Default, Encode, DecodeOwned)]
#[encdec(error = "ApduError")]
pub struct AllHwmReq {}

impl ApduStatic for AllHwmReq {
    const CLA: u8 = MAV_APDU_CLA;
    const INS: u8 = Instruction::QueryAllHwm as u8;
}

/// Reset watermarks APDU, prompts the user
///
/// ## Encoding
/// ```text
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                          LEVEL (BE)                           |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// ```
#[derive(Copy, Clone, PartialEq, Debug, Encode, DecodeOwned)]
#[encdec(error = "ApduError")]
pub struct ResetReq {
    #[encdec(with = "be_u32")]
    pub level: u32,
}

impl ResetReq {
    /// Create a reset request, rejecting invalid levels
    pub fn new(level: u32) -> Result<Self, ParamError> {
        if !is_valid_level(level) {
            return Err(ParamError::InvalidLevel(level));
        }
        Ok(Self { level })
    }
}

impl ApduStatic for ResetReq {
    const CLA: u8 = MAV_APDU_CLA;
    const INS: u8 = Instruction::Reset as u8;
}

/// Setup APDU, sets the main chain, both watermarks and the baking key
///
/// P2 carries the key's curve code, decoding yields [SigScheme::DEFAULT].
///
/// ## Encoding
/// ```text
/// chain_id (4) || main hwm (8) || test hwm (8) || path
/// ```
#[derive(Clone, PartialEq, Debug)]
pub struct SetupReq {
    pub chain_id: u32,
    pub main: Hwm,
    pub test: Hwm,
    pub path: BipPath,
    pub scheme: SigScheme,
}

impl SetupReq {
    /// Create a setup request, rejecting invalid watermark levels
    pub fn new(
        chain_id: u32,
        main: Hwm,
        test: Hwm,
        path: BipPath,
        scheme: SigScheme,
    ) -> Result<Self, ParamError> {
        for l in [main.highest_level, test.highest_level] {
            if !is_valid_level(l) {
                return Err(ParamError::InvalidLevel(l));
            }
        }

        Ok(Self {
            chain_id,
            main,
            test,
            path,
            scheme,
        })
    }
}

impl ApduStatic for SetupReq {
    const CLA: u8 = MAV_APDU_CLA;
    const INS: u8 = Instruction::Setup as u8;

    fn p2(&self) -> u8 {
        self.scheme.code()
    }
}

impl Encode for SetupReq {
    type Error = ApduError;

    fn encode_len(&self) -> Result<usize, Self::Error> {
        Ok(4 + Hwm::LEN * 2 + self.path.encode_len()?)
    }

    fn encode(&self, buff: &mut [u8]) -> Result<usize, Self::Error> {
        let mut index = 0;

        index += be_u32::enc(&self.chain_id, &mut buff[index..])?;
        index += self.main.encode(&mut buff[index..])?;
        index += self.test.encode(&mut buff[index..])?;
        index += self.path.encode(&mut buff[index..])?;

        Ok(index)
    }
}

impl DecodeOwned for SetupReq {
    type Output = Self;

    type Error = ApduError;

    fn decode_owned(buff: &[u8]) -> Result<(Self::Output, usize), Self::Error> {
        let mut index = 0;

        let (chain_id, n) = be_u32::dec(&buff[index..])?;
        index += n;
        let (main, n) = Hwm::decode(&buff[index..])?;
        index += n;
        let (test, n) = Hwm::decode(&buff[index..])?;
        index += n;
        let (path, n) = BipPath::decode(&buff[index..])?;
        index += n;

        Ok((
            Self {
                chain_id,
                main,
                test,
                path,
                scheme: SigScheme::DEFAULT,
            },
            index,
        ))
    }
}
