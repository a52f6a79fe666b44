// Copyright (c) 2022-2023 The MobileCoin Foundation

use ledger_apdu::APDUAnswerError;
use mavryk_apdu::{ApduError, ParamError, StatusWord};
use tokio::time::error::Elapsed;

use crate::keys::KeyError;

/// Ledger Mavryk API Error Type
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Transport error
    #[error("Transport error: {0}")]
    Transport(String),

    /// Invalid length in transport framing
    #[error("Invalid frame length {0}")]
    InvalidLength(usize),

    /// Responses to abandoned requests did not arrive in time
    #[error("Transport desynchronised, {0} stale responses outstanding")]
    Desynchronised(usize),

    /// Unexpected APDU response
    #[error("Unexpected APDU response")]
    UnexpectedResponse,

    /// Request timeout
    #[error("Timeout waiting for device response")]
    RequestTimeout,

    /// Known non-success status word
    #[error("Device returned status {0}")]
    Status(StatusWord),

    /// Unknown status word
    #[error("Device returned unknown status {0:#06x}")]
    UnknownStatus(u16),

    /// Payload encoding / decoding error
    #[error("APDU error: {0}")]
    Apdu(#[from] ApduError),

    /// Invalid request parameter
    #[error("Invalid parameter: {0}")]
    Param(#[from] ParamError),

    /// Key or signature error
    #[error("Key error: {0}")]
    Key(#[from] KeyError),

    /// Non UTF-8 string in response
    #[error("Invalid UTF-8 in response")]
    Utf8,
}

impl Error {
    /// Map a raw status word to an error
    pub fn from_status(code: u16) -> Self {
        match StatusWord::from_code(code) {
            Ok(s) => Error::Status(s),
            Err(c) => Error::UnknownStatus(c),
        }
    }

    /// Fetch the status word for device errors
    pub fn status(&self) -> Option<StatusWord> {
        match self {
            Error::Status(s) => Some(*s),
            _ => None,
        }
    }
}

impl From<Elapsed> for Error {
    fn from(_: Elapsed) -> Self {
        Error::RequestTimeout
    }
}

impl From<APDUAnswerError> for Error {
    fn from(_: APDUAnswerError) -> Self {
        Error::UnexpectedResponse
    }
}
