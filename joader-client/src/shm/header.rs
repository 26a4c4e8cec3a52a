//! Record header codec
//!
//! Layout of one header slot (all integers big-endian):
//!
//! ```text
//! |--len--|----off----|read|*8
//! |   4   |     8     | 1  |*8
//! ```

use std::ops::Range;

use bytes::{Buf, BufMut};

use crate::error::{LoaderError, Result};

/// Size of one header slot in bytes
pub const HEADER_SIZE: u64 = 20;
/// Offset of the payload length field
pub const LEN_OFFSET: usize = 0;
/// Width of the payload length field
pub const LEN_WIDTH: usize = 4;
/// Offset of the payload offset field
pub const PAYLOAD_OFFSET: usize = 4;
/// Width of the payload offset field
pub const PAYLOAD_WIDTH: usize = 8;
/// Offset of the first read flag
pub const READ_FLAG_OFFSET: u64 = FIELDS_END as u64;
/// One read flag per reader partition
pub const READ_FLAG_COUNT: u32 = 8;

const FIELDS_END: usize = PAYLOAD_OFFSET + PAYLOAD_WIDTH;

fn check_len(len: usize) -> Result<()> {
    if len < FIELDS_END {
        return Err(LoaderError::protocol(format!(
            "header needs {} bytes, got {}",
            FIELDS_END, len
        )));
    }
    Ok(())
}

/// Decoded header of one record slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordHeader {
    /// Payload length in bytes
    pub length: u32,
    /// Absolute payload offset within the region
    pub payload_offset: u64,
}

impl RecordHeader {
    pub fn new(length: u32, payload_offset: u64) -> Self {
        Self {
            length,
            payload_offset,
        }
    }

    /// Decode from the first 12 bytes of a header slot
    pub fn decode(buf: &[u8]) -> Result<Self> {
        check_len(buf.len())?;
        let length = (&buf[LEN_OFFSET..LEN_OFFSET + LEN_WIDTH]).get_u32();
        let payload_offset = (&buf[PAYLOAD_OFFSET..PAYLOAD_OFFSET + PAYLOAD_WIDTH]).get_u64();
        Ok(Self {
            length,
            payload_offset,
        })
    }

    /// Write the length and offset fields, leaving the read flags untouched
    pub fn encode(&self, buf: &mut [u8]) -> Result<()> {
        check_len(buf.len())?;
        (&mut buf[LEN_OFFSET..LEN_OFFSET + LEN_WIDTH]).put_u32(self.length);
        (&mut buf[PAYLOAD_OFFSET..PAYLOAD_OFFSET + PAYLOAD_WIDTH]).put_u64(self.payload_offset);
        Ok(())
    }

    /// Byte range of the payload, rejecting ranges that overflow `u64`
    pub fn payload_range(&self) -> Result<Range<u64>> {
        let end = self
            .payload_offset
            .checked_add(u64::from(self.length))
            .ok_or_else(|| {
                LoaderError::protocol(format!(
                    "payload offset {} + length {} overflows",
                    self.payload_offset, self.length
                ))
            })?;
        Ok(self.payload_offset..end)
    }
}

/// Location of one record as delivered by `Next`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SlotRef {
    /// Header slot index (not a byte offset)
    pub address: u64,
    /// Index of this reader's flag within the slot
    pub read_offset: u32,
}

impl SlotRef {
    pub fn new(address: u64, read_offset: u32) -> Self {
        Self {
            address,
            read_offset,
        }
    }

    /// Absolute byte offset of the header slot
    pub fn header_offset(&self) -> Result<u64> {
        self.address.checked_mul(HEADER_SIZE).ok_or_else(|| {
            LoaderError::protocol(format!("slot index {} overflows", self.address))
        })
    }

    /// Absolute byte offset of this reader's flag
    pub fn read_flag_offset(&self) -> Result<u64> {
        if self.read_offset >= READ_FLAG_COUNT {
            return Err(LoaderError::protocol(format!(
                "read offset {} outside the {} flag slots",
                self.read_offset, READ_FLAG_COUNT
            )));
        }
        self.header_offset()?
            .checked_add(READ_FLAG_OFFSET + u64::from(self.read_offset))
            .ok_or_else(|| {
                LoaderError::protocol(format!("read flag of slot {} overflows", self.address))
            })
    }
}
