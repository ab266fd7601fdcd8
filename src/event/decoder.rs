//! Table-driven register decoders.
//!
//! A [`DecoderSpec`] is static data: register address, an [`Extract`] shape,
//! an optional [`Guard`], and whether repeated values are suppressed. A
//! [`Decoder`] owns the running state for one subscription.

use tracing::debug;

use crate::codec;
use crate::error::Result;
use crate::frame::Message;

use super::distinct::DistinctUntilChanged;
use super::filter::{decode_timestamped, extract_bit, is_register_event};
use super::threshold::threshold_level;
use super::{EventValue, RegisterValue, Timestamped};

/// Integer field widths that decoders read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scalar {
    U8,
    U16,
    S16,
}

impl Scalar {
    fn read(self, msg: &Message, offset: usize) -> Result<i64> {
        let payload = msg.payload();
        let v = match self {
            Self::U8 => i64::from(codec::read::<u8>(payload, offset)?),
            Self::U16 => i64::from(codec::read::<u16>(payload, offset)?),
            Self::S16 => i64::from(codec::read::<i16>(payload, offset)?),
        };
        Ok(v)
    }

    fn size(self) -> usize {
        match self {
            Self::U8 => 1,
            Self::U16 | Self::S16 => 2,
        }
    }

    fn is_signed(self) -> bool {
        matches!(self, Self::S16)
    }

    fn timestamped(self, msg: &Message, offset: usize) -> Result<Timestamped<RegisterValue>> {
        Ok(match self {
            Self::U8 => decode_timestamped::<u8>(msg, offset)?.map(RegisterValue::U8),
            Self::U16 => decode_timestamped::<u16>(msg, offset)?.map(RegisterValue::U16),
            Self::S16 => decode_timestamped::<i16>(msg, offset)?.map(RegisterValue::S16),
        })
    }
}

/// How a value is pulled out of a matching frame. Offsets are payload byte
/// offsets, after any timestamp.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Extract {
    /// `Bool((payload[byte] >> bit) & 1 == 1)`.
    Bit { byte: usize, bit: u8 },
    /// Inverse of `Bit`.
    NotBit { byte: usize, bit: u8 },
    /// `Bool(payload[byte] == value)`.
    ByteIs { byte: usize, value: u8 },
    /// `Bool(payload[byte] != 0)`.
    NonZero { byte: usize },
    /// `Bool(true)` for every matching frame.
    Constant,
    /// Integer field.
    Int { scalar: Scalar, offset: usize },
    /// `Float((raw & mask) * scale + bias)`. The mask applies to unsigned fields only.
    Scaled {
        scalar: Scalar,
        offset: usize,
        mask: u16,
        scale: f64,
        bias: f64,
    },
    /// `Int((payload[byte] >> shift) & mask)`.
    Field { byte: usize, shift: u8, mask: u8 },
    /// `count` consecutive bits of an integer field as a 0/1 array.
    Bits {
        scalar: Scalar,
        offset: usize,
        first: u8,
        count: u8,
    },
    /// `count` consecutive elements.
    Array {
        scalar: Scalar,
        offset: usize,
        count: usize,
    },
    /// Threshold byte mapped through the level table.
    Threshold { byte: usize },
    /// Index of the single set bit, or -1.
    OneHot { scalar: Scalar, offset: usize, width: u8 },
    /// `Text(labels[(payload[byte] & mask)])`, empty when out of range.
    Label {
        byte: usize,
        mask: u8,
        labels: &'static [&'static str],
    },
    /// Raw register value with its timestamp.
    Raw { scalar: Scalar, offset: usize },
    /// `payload[byte] == value` with its timestamp.
    StampedIs { byte: usize, value: u8 },
}

impl Extract {
    pub const fn bit(byte: usize, bit: u8) -> Self {
        Self::Bit { byte, bit }
    }

    pub const fn scaled(scalar: Scalar, offset: usize, scale: f64) -> Self {
        Self::Scaled {
            scalar,
            offset,
            mask: u16::MAX,
            scale,
            bias: 0.0,
        }
    }

    pub const fn raw(scalar: Scalar) -> Self {
        Self::Raw { scalar, offset: 0 }
    }

    fn apply(&self, msg: &Message) -> Result<EventValue> {
        let payload = msg.payload();
        let value = match *self {
            Self::Bit { byte, bit } => EventValue::Bool(extract_bit(msg, byte, bit)?),
            Self::NotBit { byte, bit } => EventValue::Bool(!extract_bit(msg, byte, bit)?),
            Self::ByteIs { byte, value } => EventValue::Bool(codec::read::<u8>(payload, byte)? == value),
            Self::NonZero { byte } => EventValue::Bool(codec::read::<u8>(payload, byte)? != 0),
            Self::Constant => EventValue::Bool(true),
            Self::Int { scalar, offset } => EventValue::Int(scalar.read(msg, offset)?),
            Self::Scaled {
                scalar,
                offset,
                mask,
                scale,
                bias,
            } => {
                let mut raw = scalar.read(msg, offset)?;
                if !scalar.is_signed() {
                    raw &= i64::from(mask);
                }
                EventValue::Float(raw as f64 * scale + bias)
            }
            Self::Field { byte, shift, mask } => {
                let b = codec::read::<u8>(payload, byte)?;
                EventValue::Int(i64::from((b >> shift) & mask))
            }
            Self::Bits {
                scalar,
                offset,
                first,
                count,
            } => {
                let raw = scalar.read(msg, offset)?;
                let bits = (0..count)
                    .map(|i| ((raw >> (first + i)) & 1) as i32)
                    .collect();
                EventValue::Array(bits)
            }
            Self::Array {
                scalar,
                offset,
                count,
            } => {
                let values = (0..count)
                    .map(|i| scalar.read(msg, offset + i * scalar.size()).map(|v| v as i32))
                    .collect::<Result<Vec<_>>>()?;
                EventValue::Array(values)
            }
            Self::Threshold { byte } => {
                EventValue::Int(i64::from(threshold_level(codec::read::<u8>(payload, byte)?)))
            }
            Self::OneHot {
                scalar,
                offset,
                width,
            } => {
                let raw = scalar.read(msg, offset)?;
                let index = (0..width)
                    .find(|&i| raw == 1 << i)
                    .map_or(-1, i64::from);
                EventValue::Int(index)
            }
            Self::Label { byte, mask, labels } => {
                let b = codec::read::<u8>(payload, byte)? & mask;
                let text = labels.get(usize::from(b)).copied().unwrap_or_default();
                EventValue::Text(text.to_owned())
            }
            Self::Raw { scalar, offset } => EventValue::Register(scalar.timestamped(msg, offset)?),
            Self::StampedIs { byte, value } => {
                EventValue::Flag(decode_timestamped::<u8>(msg, byte)?.map(|b| b == value))
            }
        };
        Ok(value)
    }
}

/// Extra condition a matching frame must pass before extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Guard {
    Always,
    /// `payload[byte] == value`.
    ByteIs { byte: usize, value: u8 },
    /// `payload[byte] > value`.
    ByteAbove { byte: usize, value: u8 },
    /// Closed until a non-error frame at `address` has been observed.
    AfterSeen { address: u8 },
}

/// Static description of one decoder.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecoderSpec {
    pub address: u8,
    pub extract: Extract,
    pub guard: Guard,
    /// Suppress repeats of the last emitted value.
    pub distinct: bool,
}

impl DecoderSpec {
    pub const fn new(address: u8, extract: Extract) -> Self {
        Self {
            address,
            extract,
            guard: Guard::Always,
            distinct: false,
        }
    }

    pub const fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    pub const fn guard(mut self, guard: Guard) -> Self {
        self.guard = guard;
        self
    }
}

/// Running state for one decoder subscription.
///
/// Per frame: predicate, guard, extract, then compare with the last emitted
/// value when `distinct` is set.
#[derive(Debug, Clone)]
pub struct Decoder {
    spec: DecoderSpec,
    last: DistinctUntilChanged<EventValue>,
    gate_open: bool,
}

impl Decoder {
    pub fn new(spec: DecoderSpec) -> Self {
        Self {
            spec,
            last: DistinctUntilChanged::new(),
            gate_open: false,
        }
    }

    pub fn spec(&self) -> &DecoderSpec {
        &self.spec
    }

    pub fn observe(&mut self, msg: &Message) -> Option<EventValue> {
        if let Guard::AfterSeen { address } = self.spec.guard
            && msg.address() == address
            && !msg.is_error()
        {
            self.gate_open = true;
        }
        if !is_register_event(msg, self.spec.address) {
            return None;
        }
        let value = match self.decode(msg) {
            Ok(Some(v)) => v,
            Ok(None) => return None,
            Err(e) => {
                debug!(address = self.spec.address, error = %e, "frame skipped by decoder");
                return None;
            }
        };
        if self.spec.distinct {
            self.last.observe(value)
        } else {
            Some(value)
        }
    }

    fn decode(&self, msg: &Message) -> Result<Option<EventValue>> {
        let pass = match self.spec.guard {
            Guard::Always => true,
            Guard::ByteIs { byte, value } => codec::read::<u8>(msg.payload(), byte)? == value,
            Guard::ByteAbove { byte, value } => codec::read::<u8>(msg.payload(), byte)? > value,
            Guard::AfterSeen { .. } => self.gate_open,
        };
        if !pass {
            return Ok(None);
        }
        self.spec.extract.apply(msg).map(Some)
    }
}
