use std::fmt;

use crate::error::{Result, WireError};

/// Flag OR-ed into the payload type tag when a 6-byte timestamp precedes the payload.
pub const TIMESTAMP_FLAG: u8 = 0x10;

/// Payload element types on the Harp wire.
///
/// The tag encodes the element width in its low nibble, signedness in bit 7,
/// and floating point in bit 6.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[repr(u8)]
pub enum PayloadType {
    U8 = 0x01,
    S8 = 0x81,
    U16 = 0x02,
    S16 = 0x82,
    U32 = 0x04,
    S32 = 0x84,
    U64 = 0x08,
    S64 = 0x88,
    Float = 0x44,
}

impl PayloadType {
    /// Decode a tag with the timestamp flag already stripped.
    pub fn from_byte(b: u8) -> Result<Self> {
        match b {
            0x01 => Ok(Self::U8),
            0x81 => Ok(Self::S8),
            0x02 => Ok(Self::U16),
            0x82 => Ok(Self::S16),
            0x04 => Ok(Self::U32),
            0x84 => Ok(Self::S32),
            0x08 => Ok(Self::U64),
            0x88 => Ok(Self::S64),
            0x44 => Ok(Self::Float),
            _ => Err(WireError::UnknownPayloadType { tag: b }),
        }
    }

    /// Split a raw wire tag into the element type and the timestamp flag.
    pub fn from_wire(tag: u8) -> Result<(Self, bool)> {
        let timestamped = tag & TIMESTAMP_FLAG != 0;
        let ty = Self::from_byte(tag & !TIMESTAMP_FLAG)
            .map_err(|_| WireError::UnknownPayloadType { tag })?;
        Ok((ty, timestamped))
    }

    pub fn as_byte(self) -> u8 {
        self as u8
    }

    /// Wire tag including the timestamp flag when requested.
    pub fn to_wire(self, timestamped: bool) -> u8 {
        if timestamped {
            self.as_byte() | TIMESTAMP_FLAG
        } else {
            self.as_byte()
        }
    }

    /// Width of one payload element in bytes.
    pub fn element_size(self) -> usize {
        match self {
            Self::U8 | Self::S8 => 1,
            Self::U16 | Self::S16 => 2,
            Self::U32 | Self::S32 | Self::Float => 4,
            Self::U64 | Self::S64 => 8,
        }
    }

    pub fn is_signed(self) -> bool {
        self.as_byte() & 0x80 != 0
    }
}

impl fmt::Display for PayloadType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::U8 => write!(f, "U8"),
            Self::S8 => write!(f, "S8"),
            Self::U16 => write!(f, "U16"),
            Self::S16 => write!(f, "S16"),
            Self::U32 => write!(f, "U32"),
            Self::S32 => write!(f, "S32"),
            Self::U64 => write!(f, "U64"),
            Self::S64 => write!(f, "S64"),
            Self::Float => write!(f, "Float"),
        }
    }
}
