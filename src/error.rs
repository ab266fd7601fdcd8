use thiserror::Error;

use crate::frame::MessageKind;
use crate::payload::PayloadType;

/// Errors arising from frame parsing, construction, and payload access.
///
/// All of these are recoverable per frame: a pipeline logs and drops the
/// offending frame and keeps going.
#[derive(Debug, Error)]
pub enum WireError {
    #[error("checksum mismatch (frame carries 0x{expected:02X}, computed 0x{computed:02X})")]
    Checksum { expected: u8, computed: u8 },

    #[error("truncated frame ({len} bytes, need at least {need})")]
    TruncatedFrame { len: usize, need: usize },

    #[error("length field mismatch (declared {declared}, buffer carries {actual})")]
    LengthMismatch { declared: usize, actual: usize },

    #[error("unknown payload type tag 0x{tag:02X}")]
    UnknownPayloadType { tag: u8 },

    #[error("unknown message kind tag 0x{tag:02X}")]
    UnknownMessageKind { tag: u8 },

    #[error("payload of {len} bytes does not fit a {payload_type} frame")]
    PayloadLength { payload_type: PayloadType, len: usize },

    #[error("payload type mismatch: requested {expected}, frame carries {actual}")]
    TypeMismatch {
        expected: PayloadType,
        actual: PayloadType,
    },

    #[error("payload too short for {element}: need {need} bytes, got {got}{}", format_raw_suffix(raw))]
    PayloadTooShort {
        /// Element type being read; `need` counts bytes up to the end of the read.
        element: PayloadType,
        need: usize,
        got: usize,
        /// Raw payload bytes for debug context.
        raw: Vec<u8>,
    },

    #[error("register {address} expects {expected_type} x{expected_count}, got {actual_type} ({actual_len} bytes)")]
    RegisterShape {
        address: u8,
        expected_type: PayloadType,
        expected_count: usize,
        actual_type: PayloadType,
        actual_len: usize,
    },

    #[error("frame carries no timestamp")]
    MissingTimestamp,

    #[error("register {address} does not accept {kind} messages")]
    AccessDenied { address: u8, kind: MessageKind },
}

impl WireError {
    /// Create a `PayloadTooShort` error (raw bytes filled in later via `with_raw`).
    pub(crate) fn payload_too_short(element: PayloadType, need: usize, got: usize) -> Self {
        Self::PayloadTooShort { element, need, got, raw: Vec::new() }
    }

    /// Attach raw payload bytes to decode-phase errors for diagnostics.
    pub fn with_raw(self, payload: &[u8]) -> Self {
        match self {
            Self::PayloadTooShort { element, need, got, .. } => {
                Self::PayloadTooShort { element, need, got, raw: payload.to_vec() }
            }
            other => other,
        }
    }
}

/// Errors raised synchronously by command encoders, before any frame exists.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("{register}: value {value} outside valid range [{min}, {max}]")]
    Domain {
        register: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("invalid selector 0x{selector:08X}: {allowed}")]
    InvalidSelector {
        selector: u32,
        /// Human-readable description of the legal selections.
        allowed: &'static str,
    },

    #[error(transparent)]
    Wire(#[from] WireError),
}

/// Format raw bytes as a suffix like " | 0A 00 03 ..." (empty if no bytes).
fn format_raw_suffix(raw: &[u8]) -> String {
    if raw.is_empty() {
        return String::new();
    }
    let limit = 16;
    let hex: Vec<String> = raw.iter().take(limit).map(|b| format!("{b:02X}")).collect();
    let ellipsis = if raw.len() > limit { " ..." } else { "" };
    format!(" | {}{ellipsis}", hex.join(" "))
}

pub type Result<T> = std::result::Result<T, WireError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_suffix_is_attached() {
        let err = WireError::payload_too_short(PayloadType::U16, 2, 1).with_raw(&[0xAB]);
        assert_eq!(err.to_string(), "payload too short for U16: need 2 bytes, got 1 | AB");
    }

    #[test]
    fn raw_suffix_truncates_long_payloads() {
        let raw = vec![0u8; 20];
        let err = WireError::payload_too_short(PayloadType::U8, 32, 20).with_raw(&raw);
        assert!(err.to_string().ends_with(" ..."));
    }

    #[test]
    fn domain_error_names_the_range() {
        let err = CommandError::Domain {
            register: "ProtocolVolume",
            value: 0.3,
            min: 0.5,
            max: 2000.0,
        };
        assert_eq!(
            err.to_string(),
            "ProtocolVolume: value 0.3 outside valid range [0.5, 2000]"
        );
    }
}
