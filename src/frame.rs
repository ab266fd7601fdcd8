//! Frame construction, parsing, encoding, and checksum.
//!
//! Wire format:
//! ```text
//! [KIND|ERR] [LENGTH] [ADDRESS] [PORT] [TYPE|TS] [SECONDS:4 TICKS:2]? [PAYLOAD...] [CHECKSUM]
//! ```
//!
//! `LENGTH` counts every byte after itself, checksum included. The checksum is
//! the sum of all preceding bytes modulo 256. Multi-byte fields are little-endian.

use std::fmt;

use crate::error::{Result, WireError};
use crate::payload::PayloadType;

/// Bit set in the kind byte when the device reports a failed register access.
pub const ERROR_FLAG: u8 = 0x08;

/// Port used by hosts when addressing the device itself.
pub const DEFAULT_PORT: u8 = 255;

/// Kind, length, address, port, type.
const HEADER_LEN: usize = 5;
const TIMESTAMP_LEN: usize = 6;
/// Smallest well-formed frame: header plus checksum, empty payload.
const MIN_FRAME_LEN: usize = HEADER_LEN + 1;

/// Microseconds per timestamp tick.
const TICK_MICROS: f64 = 32.0;

/// Message kind carried in the low bits of the first frame byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[repr(u8)]
pub enum MessageKind {
    Read = 1,
    Write = 2,
    Event = 3,
}

impl MessageKind {
    pub fn from_byte(b: u8) -> Result<Self> {
        match b {
            1 => Ok(Self::Read),
            2 => Ok(Self::Write),
            3 => Ok(Self::Event),
            _ => Err(WireError::UnknownMessageKind { tag: b }),
        }
    }

    pub fn as_byte(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read => write!(f, "Read"),
            Self::Write => write!(f, "Write"),
            Self::Event => write!(f, "Event"),
        }
    }
}

/// Device clock reading: whole seconds plus 32 µs ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Timestamp {
    pub seconds: u32,
    pub ticks: u16,
}

impl Timestamp {
    pub fn new(seconds: u32, ticks: u16) -> Self {
        Self { seconds, ticks }
    }

    /// Seconds as a float: `seconds + ticks * 32e-6`.
    pub fn as_secs_f64(&self) -> f64 {
        f64::from(self.seconds) + f64::from(self.ticks) * TICK_MICROS / 1_000_000.0
    }

    fn read(bytes: &[u8]) -> Self {
        Self {
            seconds: u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
            ticks: u16::from_le_bytes([bytes[4], bytes[5]]),
        }
    }

    fn write(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(&self.seconds.to_le_bytes());
        buf.extend_from_slice(&self.ticks.to_le_bytes());
    }
}

/// A single Harp message. Immutable once built or parsed.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Message {
    kind: MessageKind,
    error: bool,
    address: u8,
    port: u8,
    payload_type: PayloadType,
    timestamp: Option<Timestamp>,
    payload: Vec<u8>,
}

impl Message {
    /// Build a message, validating that the payload holds whole elements of
    /// `payload_type` and that the frame length fits the one-byte length field.
    pub fn build(
        kind: MessageKind,
        port: u8,
        address: u8,
        payload_type: PayloadType,
        payload: Vec<u8>,
    ) -> Result<Self> {
        check_payload(payload_type, &payload, false)?;
        Ok(Self {
            kind,
            error: false,
            address,
            port,
            payload_type,
            timestamp: None,
            payload,
        })
    }

    /// Build a write to the device's own port.
    pub fn write(address: u8, payload_type: PayloadType, payload: Vec<u8>) -> Result<Self> {
        Self::build(MessageKind::Write, DEFAULT_PORT, address, payload_type, payload)
    }

    /// Build a read request for the device's own port. Carries no payload.
    pub fn read(address: u8, payload_type: PayloadType) -> Result<Self> {
        Self::build(MessageKind::Read, DEFAULT_PORT, address, payload_type, Vec::new())
    }

    /// Build a timestamped event, as a device would report it.
    pub fn event(
        address: u8,
        payload_type: PayloadType,
        timestamp: Timestamp,
        payload: Vec<u8>,
    ) -> Result<Self> {
        check_payload(payload_type, &payload, true)?;
        Ok(Self {
            kind: MessageKind::Event,
            error: false,
            address,
            port: DEFAULT_PORT,
            payload_type,
            timestamp: Some(timestamp),
            payload,
        })
    }

    /// Same message with the device error flag set.
    pub fn with_error(mut self) -> Self {
        self.error = true;
        self
    }

    /// Same message addressed to another port.
    pub fn with_port(mut self, port: u8) -> Self {
        self.port = port;
        self
    }

    /// Internal constructor for payloads already validated by the caller.
    pub(crate) fn write_unchecked(address: u8, payload_type: PayloadType, payload: Vec<u8>) -> Self {
        Self {
            kind: MessageKind::Write,
            error: false,
            address,
            port: DEFAULT_PORT,
            payload_type,
            timestamp: None,
            payload,
        }
    }

    pub fn kind(&self) -> MessageKind {
        self.kind
    }

    pub fn is_error(&self) -> bool {
        self.error
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    pub fn port(&self) -> u8 {
        self.port
    }

    pub fn payload_type(&self) -> PayloadType {
        self.payload_type
    }

    pub fn timestamp(&self) -> Option<Timestamp> {
        self.timestamp
    }

    /// Payload bytes, excluding any timestamp prefix.
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Number of payload elements of `payload_type`.
    pub fn element_count(&self) -> usize {
        self.payload.len() / self.payload_type.element_size()
    }

    /// Parse a single complete frame.
    pub fn parse(raw: &[u8]) -> Result<Self> {
        if raw.len() < MIN_FRAME_LEN {
            return Err(WireError::TruncatedFrame {
                len: raw.len(),
                need: MIN_FRAME_LEN,
            });
        }

        // Checksum first: any corrupted byte, length field included, lands here.
        let last = raw.len() - 1;
        let computed = checksum(&raw[..last]);
        if raw[last] != computed {
            return Err(WireError::Checksum {
                expected: raw[last],
                computed,
            });
        }

        let declared = raw[1] as usize + 2;
        if declared > raw.len() {
            return Err(WireError::TruncatedFrame {
                len: raw.len(),
                need: declared,
            });
        }
        if declared != raw.len() {
            return Err(WireError::LengthMismatch {
                declared,
                actual: raw.len(),
            });
        }

        let error = raw[0] & ERROR_FLAG != 0;
        let kind = MessageKind::from_byte(raw[0] & !ERROR_FLAG)?;
        let address = raw[2];
        let port = raw[3];
        let (payload_type, timestamped) = PayloadType::from_wire(raw[4])?;

        let mut body = &raw[HEADER_LEN..last];
        let timestamp = if timestamped {
            if body.len() < TIMESTAMP_LEN {
                return Err(WireError::TruncatedFrame {
                    len: raw.len(),
                    need: MIN_FRAME_LEN + TIMESTAMP_LEN,
                });
            }
            let ts = Timestamp::read(&body[..TIMESTAMP_LEN]);
            body = &body[TIMESTAMP_LEN..];
            Some(ts)
        } else {
            None
        };

        if body.len() % payload_type.element_size() != 0 {
            return Err(WireError::PayloadLength {
                payload_type,
                len: body.len(),
            });
        }

        Ok(Self {
            kind,
            error,
            address,
            port,
            payload_type,
            timestamp,
            payload: body.to_vec(),
        })
    }

    /// Encode into a complete frame with length field and checksum.
    pub fn encode(&self) -> Vec<u8> {
        let ts_len = if self.timestamp.is_some() { TIMESTAMP_LEN } else { 0 };
        let total = HEADER_LEN + ts_len + self.payload.len() + 1;

        let mut wire = Vec::with_capacity(total);
        let kind = self.kind.as_byte() | if self.error { ERROR_FLAG } else { 0 };
        wire.push(kind);
        // Bounded by check_payload at construction.
        wire.push((total - 2) as u8);
        wire.push(self.address);
        wire.push(self.port);
        wire.push(self.payload_type.to_wire(self.timestamp.is_some()));
        if let Some(ts) = &self.timestamp {
            ts.write(&mut wire);
        }
        wire.extend_from_slice(&self.payload);
        wire.push(checksum(&wire));
        wire
    }
}

impl fmt::Display for Message {
    /// `"Event 32 U8 | 05 [101.000000s]"`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        if self.error {
            write!(f, "!")?;
        }
        write!(f, " {} {}", self.address, self.payload_type)?;
        if !self.payload.is_empty() {
            write!(f, " |")?;
            for b in &self.payload {
                write!(f, " {b:02X}")?;
            }
        }
        if let Some(ts) = &self.timestamp {
            write!(f, " [{:.6}s]", ts.as_secs_f64())?;
        }
        Ok(())
    }
}

/// Sum of all bytes modulo 256.
pub fn checksum(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0u8, |acc, &b| acc.wrapping_add(b))
}

pub(crate) fn check_payload(payload_type: PayloadType, payload: &[u8], timestamped: bool) -> Result<()> {
    let ts_len = if timestamped { TIMESTAMP_LEN } else { 0 };
    // Length byte counts address, port, type, timestamp, payload and checksum.
    let length_field = 3 + ts_len + payload.len() + 1;
    if payload.len() % payload_type.element_size() != 0 || length_field > u8::MAX as usize {
        return Err(WireError::PayloadLength {
            payload_type,
            len: payload.len(),
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_u8_write() {
        // Write 0x01 to register 32 on port 255.
        let msg = Message::write(32, PayloadType::U8, vec![0x01]).unwrap();
        let wire = msg.encode();
        assert_eq!(wire, vec![0x02, 0x05, 0x20, 0xFF, 0x01, 0x01, 0x28]);
    }

    #[test]
    fn encode_u16_write() {
        let msg = Message::write(45, PayloadType::U16, vec![0x34, 0x12]).unwrap();
        let wire = msg.encode();
        assert_eq!(wire.len(), 8);
        assert_eq!(wire[1], 6);
        assert_eq!(wire[7], checksum(&wire[..7]));
    }

    #[test]
    fn parse_timestamped_event() {
        let ts = Timestamp::new(100, 31250);
        let msg = Message::event(32, PayloadType::U8, ts, vec![0x05]).unwrap();
        let wire = msg.encode();
        assert_eq!(wire.len(), 13);
        assert_eq!(wire[4], 0x11);

        let parsed = Message::parse(&wire).unwrap();
        assert_eq!(parsed.kind(), MessageKind::Event);
        assert_eq!(parsed.timestamp(), Some(ts));
        assert_eq!(parsed.payload(), &[0x05]);
        assert!(!parsed.is_error());
    }

    #[test]
    fn timestamp_seconds() {
        assert_eq!(Timestamp::new(100, 31250).as_secs_f64(), 101.0);
        assert_eq!(Timestamp::new(0, 1).as_secs_f64(), 32e-6);
    }

    #[test]
    fn round_trip() {
        let original =
            Message::build(MessageKind::Read, 3, 200, PayloadType::S16, vec![0xFF, 0x7F, 0x00, 0x80])
                .unwrap();
        let parsed = Message::parse(&original.encode()).unwrap();
        assert_eq!(parsed, original);
        assert_eq!(parsed.element_count(), 2);
    }

    #[test]
    fn error_flag_round_trip() {
        let msg = Message::event(35, PayloadType::U8, Timestamp::default(), vec![1])
            .unwrap()
            .with_error();
        let wire = msg.encode();
        assert_eq!(wire[0], 0x0B);
        assert!(Message::parse(&wire).unwrap().is_error());
    }

    #[test]
    fn bad_checksum() {
        let mut wire = Message::write(32, PayloadType::U8, vec![1]).unwrap().encode();
        let last = wire.len() - 1;
        wire[last] = wire[last].wrapping_add(1);
        assert!(matches!(Message::parse(&wire), Err(WireError::Checksum { .. })));
    }

    #[test]
    fn too_short() {
        assert!(matches!(
            Message::parse(&[0x02, 0x05, 0x20]),
            Err(WireError::TruncatedFrame { len: 3, .. })
        ));
    }

    #[test]
    fn declared_length_longer_than_buffer() {
        // Declares 9 bytes after the length field but only carries 5.
        let mut wire = vec![0x02, 0x09, 0x20, 0xFF, 0x01, 0x01];
        wire.push(checksum(&wire));
        assert!(matches!(
            Message::parse(&wire),
            Err(WireError::TruncatedFrame { need: 11, .. })
        ));
    }

    #[test]
    fn declared_length_shorter_than_buffer() {
        let mut wire = vec![0x02, 0x04, 0x20, 0xFF, 0x01, 0x01, 0x01];
        wire.push(checksum(&wire));
        assert!(matches!(
            Message::parse(&wire),
            Err(WireError::LengthMismatch { declared: 6, actual: 8 })
        ));
    }

    #[test]
    fn unknown_payload_type() {
        let mut wire = vec![0x03, 0x05, 0x20, 0xFF, 0x03, 0x01];
        wire.push(checksum(&wire));
        assert!(matches!(
            Message::parse(&wire),
            Err(WireError::UnknownPayloadType { tag: 0x03 })
        ));
    }

    #[test]
    fn unknown_kind() {
        let mut wire = vec![0x05, 0x05, 0x20, 0xFF, 0x01, 0x01];
        wire.push(checksum(&wire));
        assert!(matches!(
            Message::parse(&wire),
            Err(WireError::UnknownMessageKind { tag: 0x05 })
        ));
    }

    #[test]
    fn odd_payload_for_u16_rejected() {
        assert!(matches!(
            Message::write(45, PayloadType::U16, vec![0x01]),
            Err(WireError::PayloadLength { len: 1, .. })
        ));
    }

    #[test]
    fn read_request_has_no_payload() {
        let msg = Message::read(45, PayloadType::U16).unwrap();
        let wire = msg.encode();
        assert_eq!(wire, vec![0x01, 0x04, 0x2D, 0xFF, 0x02, 0x33]);
        assert_eq!(Message::parse(&wire).unwrap().element_count(), 0);
    }

    #[test]
    fn oversized_payload_rejected() {
        assert!(Message::write(34, PayloadType::U8, vec![0; 251]).is_ok());
        assert!(Message::write(34, PayloadType::U8, vec![0; 252]).is_err());
        assert!(Message::event(34, PayloadType::U8, Timestamp::default(), vec![0; 246]).is_err());
    }

    #[test]
    fn timestamp_flag_without_room_for_timestamp() {
        let mut wire = vec![0x03, 0x06, 0x20, 0xFF, 0x11, 0x00, 0x00];
        wire.push(checksum(&wire));
        assert!(matches!(
            Message::parse(&wire),
            Err(WireError::TruncatedFrame { .. })
        ));
    }

    #[test]
    fn display_is_compact() {
        let msg = Message::event(32, PayloadType::U8, Timestamp::new(1, 0), vec![0x05]).unwrap();
        assert_eq!(msg.to_string(), "Event 32 U8 | 05 [1.000000s]");
    }
}
