//! Typed values carried by the job service
//!
//! The wire `Data` message is a byte string plus a type tag; it is resolved
//! once into [`Value`], rejecting tags this client does not know.

use bytes::Bytes;

use crate::error::{LoaderError, Result};
use crate::protocol::job::data::DataType;
use crate::protocol::job::Data;

/// Side length of the images the server decodes
pub const IMAGE_SIDE: usize = 224;

/// An HWC image of `u8` samples
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    pub data: Bytes,
    pub height: usize,
    pub width: usize,
    pub channels: usize,
}

impl Image {
    /// Interpret `data` as a `IMAGE_SIDE x IMAGE_SIDE` image, channels implied
    pub fn from_bytes(data: Bytes) -> Result<Self> {
        let plane = IMAGE_SIDE * IMAGE_SIDE;
        if data.is_empty() || data.len() % plane != 0 {
            return Err(LoaderError::protocol(format!(
                "image of {} bytes is not a multiple of {}x{}",
                data.len(),
                IMAGE_SIDE,
                IMAGE_SIDE
            )));
        }
        Ok(Self {
            channels: data.len() / plane,
            height: IMAGE_SIDE,
            width: IMAGE_SIDE,
            data,
        })
    }

    /// Sample at row `y`, column `x`, channel `c`
    pub fn get(&self, y: usize, x: usize, c: usize) -> Option<u8> {
        if y >= self.height || x >= self.width || c >= self.channels {
            return None;
        }
        self.data
            .get((y * self.width + x) * self.channels + c)
            .copied()
    }
}

/// Decoded job value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Uint(u64),
    Int(i64),
    Image(Image),
}

impl TryFrom<Data> for Value {
    type Error = LoaderError;

    fn try_from(data: Data) -> Result<Self> {
        let ty = DataType::try_from(data.ty)
            .map_err(|_| LoaderError::protocol(format!("unknown data type tag {}", data.ty)))?;
        match ty {
            DataType::Uint => decode_uint(&data.bs).map(Value::Uint),
            DataType::Int => decode_int(&data.bs).map(Value::Int),
            DataType::Image => Image::from_bytes(Bytes::from(data.bs)).map(Value::Image),
        }
    }
}

/// Big-endian unsigned integer of 0..=8 bytes
fn decode_uint(bs: &[u8]) -> Result<u64> {
    if bs.len() > 8 {
        return Err(LoaderError::protocol(format!(
            "integer of {} bytes does not fit in 64 bits",
            bs.len()
        )));
    }
    Ok(bs.iter().fold(0u64, |acc, &b| (acc << 8) | u64::from(b)))
}

/// Big-endian two's complement integer of 0..=8 bytes
fn decode_int(bs: &[u8]) -> Result<i64> {
    let raw = decode_uint(bs)?;
    if bs.is_empty() {
        return Ok(0);
    }
    let shift = 64 - 8 * bs.len() as u32;
    Ok(((raw << shift) as i64) >> shift)
}
