//! Command encoder primitives.
//!
//! Every device command is expressed in terms of these: a fixed-width write,
//! a set/clear register pair, a selector-scoped write (single target or fan-out),
//! and a zero-filled composite payload. All functions are pure; errors are
//! raised before any [`Message`] exists.

use std::iter::FusedIterator;

use tracing::debug;

use crate::codec::{self, PayloadElement};
use crate::error::CommandError;
use crate::frame::{self, Message};
use crate::mask::SelectorTable;
use crate::payload::PayloadType;

// ---------------------------------------------------------------------------
// Scalar writes
// ---------------------------------------------------------------------------

/// Write one element to a register.
pub fn write<T: PayloadElement>(address: u8, value: T) -> Message {
    Message::write_unchecked(address, T::PAYLOAD_TYPE, codec::to_payload(value))
}

pub fn write_u8(address: u8, value: u8) -> Message {
    write(address, value)
}

pub fn write_u16(address: u8, value: u16) -> Message {
    write(address, value)
}

pub fn write_s16(address: u8, value: i16) -> Message {
    write(address, value)
}

pub fn write_f32(address: u8, value: f32) -> Message {
    write(address, value)
}

/// Write a byte array verbatim.
pub fn write_bytes(address: u8, bytes: &[u8]) -> Result<Message, CommandError> {
    Ok(Message::write(address, PayloadType::U8, bytes.to_vec())?)
}

/// Write a fixed-size byte array.
///
/// Input longer than `len` is truncated; shorter input is padded with zeros.
pub fn zero_filled(address: u8, input: &[u8], len: usize) -> Result<Message, CommandError> {
    if input.len() != len {
        debug!(address, given = input.len(), expected = len, "composite payload zero-filled");
    }
    let mut payload = vec![0u8; len];
    let n = input.len().min(len);
    payload[..n].copy_from_slice(&input[..n]);
    Ok(Message::write(address, PayloadType::U8, payload)?)
}

// ---------------------------------------------------------------------------
// Domain checks
// ---------------------------------------------------------------------------

/// What happens to a value outside a register's legal range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutOfRange {
    /// Raise `CommandError::Domain`.
    Reject,
    /// Clamp into range.
    Clamp,
    /// Clamp values above the range, reject values below it.
    ClampAbove,
}

/// Legal range for one register value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Range {
    pub register: &'static str,
    pub min: f64,
    pub max: f64,
    pub policy: OutOfRange,
}

impl Range {
    pub const fn reject(register: &'static str, min: f64, max: f64) -> Self {
        Self { register, min, max, policy: OutOfRange::Reject }
    }

    pub const fn clamp(register: &'static str, min: f64, max: f64) -> Self {
        Self { register, min, max, policy: OutOfRange::Clamp }
    }

    pub const fn clamp_above(register: &'static str, min: f64, max: f64) -> Self {
        Self { register, min, max, policy: OutOfRange::ClampAbove }
    }

    /// Apply this range's policy. NaN is always rejected.
    pub fn apply(&self, value: f64) -> Result<f64, CommandError> {
        if value.is_nan() {
            return Err(self.domain(value));
        }
        if value >= self.min && value <= self.max {
            return Ok(value);
        }
        let clamped = match self.policy {
            OutOfRange::Reject => return Err(self.domain(value)),
            OutOfRange::Clamp => value.clamp(self.min, self.max),
            OutOfRange::ClampAbove if value > self.max => self.max,
            OutOfRange::ClampAbove => return Err(self.domain(value)),
        };
        debug!(register = self.register, value, clamped, "value clamped");
        Ok(clamped)
    }

    fn domain(&self, value: f64) -> CommandError {
        CommandError::Domain {
            register: self.register,
            value,
            min: self.min,
            max: self.max,
        }
    }
}

// ---------------------------------------------------------------------------
// Set / clear pairs
// ---------------------------------------------------------------------------

/// A boolean toggling bits of a shared register through two write-only
/// registers. The device ORs (set) or ANDs-out (clear) the written mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetClear {
    pub set: u8,
    pub clear: u8,
}

impl SetClear {
    pub const fn new(set: u8, clear: u8) -> Self {
        Self { set, clear }
    }

    pub fn encode<T: PayloadElement>(&self, on: bool, bits: T) -> Message {
        let address = if on { self.set } else { self.clear };
        write(address, bits)
    }
}

// ---------------------------------------------------------------------------
// Selector-scoped writes
// ---------------------------------------------------------------------------

/// A family of registers indexed by the physical bit of a selector.
///
/// Target address is `base + (bit - first_bit) * stride`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scoped {
    pub base: u8,
    pub first_bit: u8,
    pub stride: u8,
    /// Selector bits this register family accepts.
    pub allowed: u32,
    pub description: &'static str,
}

impl Scoped {
    pub const fn new(base: u8, first_bit: u8, stride: u8, allowed: u32, description: &'static str) -> Self {
        Self {
            base,
            first_bit,
            stride,
            allowed,
            description,
        }
    }

    /// Single target; exactly one allowed selector bit.
    pub fn target(&self, table: &SelectorTable, selector: u32) -> Result<u8, CommandError> {
        let row = table.single(selector, self.allowed, self.description)?;
        Ok(self.address_of(row.bit))
    }

    /// Every target selected; any non-empty set of allowed bits.
    ///
    /// Selectors sharing a physical bit collapse to one target.
    pub fn targets(&self, table: &SelectorTable, selector: u32) -> Result<Vec<u8>, CommandError> {
        table.subset(selector, self.allowed, self.description)?;
        let mut out: Vec<u8> = Vec::new();
        for row in table.bits(selector) {
            let address = self.address_of(row.bit);
            if !out.contains(&address) {
                out.push(address);
            }
        }
        Ok(out)
    }

    fn address_of(&self, bit: u8) -> u8 {
        self.base
            .wrapping_add(bit.wrapping_sub(self.first_bit).wrapping_mul(self.stride))
    }
}

/// Lazily built writes of one payload to several registers.
///
/// Targets are resolved and validated up front; each message is built on
/// demand. Consumed once.
#[must_use = "iterators are lazy and do nothing unless consumed"]
#[derive(Debug)]
pub struct Frames {
    payload_type: PayloadType,
    payload: Vec<u8>,
    targets: std::vec::IntoIter<u8>,
}

impl Frames {
    pub fn new(
        targets: Vec<u8>,
        payload_type: PayloadType,
        payload: Vec<u8>,
    ) -> Result<Self, CommandError> {
        frame::check_payload(payload_type, &payload, false)?;
        Ok(Self {
            payload_type,
            payload,
            targets: targets.into_iter(),
        })
    }

    /// One element written to every target.
    pub fn of<T: PayloadElement>(targets: Vec<u8>, value: T) -> Self {
        Self {
            payload_type: T::PAYLOAD_TYPE,
            payload: codec::to_payload(value),
            targets: targets.into_iter(),
        }
    }

    /// A single already-built write.
    pub fn single(msg: Message) -> Self {
        Self {
            payload_type: msg.payload_type(),
            payload: msg.payload().to_vec(),
            targets: vec![msg.address()].into_iter(),
        }
    }
}

impl Iterator for Frames {
    type Item = Message;

    fn next(&mut self) -> Option<Message> {
        let address = self.targets.next()?;
        Some(Message::write_unchecked(
            address,
            self.payload_type,
            self.payload.clone(),
        ))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.targets.size_hint()
    }
}

impl ExactSizeIterator for Frames {}
impl FusedIterator for Frames {}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
