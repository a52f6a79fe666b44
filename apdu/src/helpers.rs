// Copyright (c) 2022-2023 The MobileCoin Foundation

/// encdec helper module for big-endian u32 fields
pub(crate) mod be_u32 {
    use byteorder::{BigEndian, ByteOrder};
    use ledger_proto::ApduError;

    pub fn enc(v: &u32, buff: &mut [u8]) -> Result<usize, ApduError> {
        if buff.len() < 4 {
            return Err(ApduError::InvalidLength);
        }

        BigEndian::write_u32(buff, *v);

        Ok(4)
    }

    pub fn enc_len(_v: &u32) -> Result<usize, ApduError> {
        Ok(4)
    }

    pub fn dec(buff: &[u8]) -> Result<(u32, usize), ApduError> {
        if buff.len() < 4 {
            return Err(ApduError::InvalidLength);
        }

        Ok((BigEndian::read_u32(buff), 4))
    }
}
