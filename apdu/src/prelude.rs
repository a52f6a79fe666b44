// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Prelude to simplify downstream use of APDU objects
//!

pub use crate::{
    auth::{AuthKeyReq, AuthKeyWithCurveReq, AuthKeyWithCurveResp, AuthorizeReq, DeauthorizeReq},
    chunks, command, decode_exact,
    hwm::{AllHwm, AllHwmReq, Hwm, MainHwmReq, ResetReq, SetupReq},
    is_valid_level,
    path::BipPath,
    public_key::{PublicKeyReq, PublicKeyResp},
    scheme::SigScheme,
    sign::{SignReq, SignResp, SignWithHashResp},
    version::{AppClass, GitReq, GitResp, Version, VersionReq},
    ApduError, ApduHeader, ApduReq, ApduStatic, Instruction, ParamError, StatusWord,
    MAV_APDU_CLA, MAX_APDU_PAYLOAD, P1_FIRST, P1_LAST, P1_NEXT,
};
