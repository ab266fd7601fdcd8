//! Field codecs for Harp payloads.
//!
//! All multi-byte numbers are little-endian. Each numeric type implements
//! [`PayloadElement`], which ties it to its wire tag so narrow accessors can
//! refuse to reinterpret a payload of a different type.

use crate::error::{Result, WireError};
use crate::frame::Message;
use crate::payload::PayloadType;

/// A fixed-width numeric type that can appear as a payload element.
pub trait PayloadElement: Copy + Sized {
    /// Wire tag for payloads made of this element.
    const PAYLOAD_TYPE: PayloadType;
    /// Width in bytes.
    const SIZE: usize;

    /// Decode from exactly `SIZE` little-endian bytes.
    fn from_le_slice(bytes: &[u8]) -> Self;

    fn write_le(self, buf: &mut Vec<u8>);
}

macro_rules! payload_element {
    ($ty:ty, $tag:ident) => {
        impl PayloadElement for $ty {
            const PAYLOAD_TYPE: PayloadType = PayloadType::$tag;
            const SIZE: usize = std::mem::size_of::<$ty>();

            fn from_le_slice(bytes: &[u8]) -> Self {
                let mut arr = [0u8; std::mem::size_of::<$ty>()];
                arr.copy_from_slice(&bytes[..Self::SIZE]);
                <$ty>::from_le_bytes(arr)
            }

            fn write_le(self, buf: &mut Vec<u8>) {
                buf.extend_from_slice(&self.to_le_bytes());
            }
        }
    };
}

payload_element!(u8, U8);
payload_element!(i8, S8);
payload_element!(u16, U16);
payload_element!(i16, S16);
payload_element!(u32, U32);
payload_element!(i32, S32);
payload_element!(u64, U64);
payload_element!(i64, S64);
payload_element!(f32, Float);

// ---------------------------------------------------------------------------
// Read helpers
// ---------------------------------------------------------------------------

/// Read one element at a byte offset, regardless of the frame's tag.
pub fn read<T: PayloadElement>(data: &[u8], offset: usize) -> Result<T> {
    check_len(data, offset, T::SIZE, T::PAYLOAD_TYPE)?;
    Ok(T::from_le_slice(&data[offset..offset + T::SIZE]))
}

/// Read `count` consecutive elements starting at a byte offset.
pub fn read_array<T: PayloadElement>(data: &[u8], offset: usize, count: usize) -> Result<Vec<T>> {
    check_len(data, offset, T::SIZE * count, T::PAYLOAD_TYPE)?;
    Ok(data[offset..offset + T::SIZE * count]
        .chunks_exact(T::SIZE)
        .map(T::from_le_slice)
        .collect())
}

// ---------------------------------------------------------------------------
// Write helpers
// ---------------------------------------------------------------------------

pub fn write<T: PayloadElement>(buf: &mut Vec<u8>, val: T) {
    val.write_le(buf);
}

/// Encode a single value as a complete payload.
pub fn to_payload<T: PayloadElement>(val: T) -> Vec<u8> {
    let mut buf = Vec::with_capacity(T::SIZE);
    val.write_le(&mut buf);
    buf
}

// ---------------------------------------------------------------------------
// Narrow accessors
// ---------------------------------------------------------------------------

/// First payload element, after checking the frame carries `T`.
pub fn payload_as<T: PayloadElement>(msg: &Message) -> Result<T> {
    check_type::<T>(msg)?;
    read(msg.payload(), 0).map_err(|e| e.with_raw(msg.payload()))
}

/// All payload elements, after checking the frame carries `T`.
pub fn payload_array<T: PayloadElement>(msg: &Message) -> Result<Vec<T>> {
    check_type::<T>(msg)?;
    Ok(msg.payload().chunks_exact(T::SIZE).map(T::from_le_slice).collect())
}

pub fn payload_as_u8(msg: &Message) -> Result<u8> {
    payload_as(msg)
}

pub fn payload_as_s16(msg: &Message) -> Result<i16> {
    payload_as(msg)
}

pub fn payload_as_u16(msg: &Message) -> Result<u16> {
    payload_as(msg)
}

pub fn payload_as_float(msg: &Message) -> Result<f32> {
    payload_as(msg)
}

/// Raw payload bytes of a U8 frame.
pub fn payload_as_bytes(msg: &Message) -> Result<&[u8]> {
    check_type::<u8>(msg)?;
    Ok(msg.payload())
}

// ---------------------------------------------------------------------------
// Internal
// ---------------------------------------------------------------------------

fn check_type<T: PayloadElement>(msg: &Message) -> Result<()> {
    if msg.payload_type() != T::PAYLOAD_TYPE {
        return Err(WireError::TypeMismatch {
            expected: T::PAYLOAD_TYPE,
            actual: msg.payload_type(),
        });
    }
    Ok(())
}

fn check_len(data: &[u8], offset: usize, need: usize, element: PayloadType) -> Result<()> {
    if data.len() < offset + need {
        Err(WireError::payload_too_short(element, offset + need, data.len()))
    } else {
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::Timestamp;

    #[test]
    fn little_endian_layout() {
        assert_eq!(to_payload(0x1234u16), vec![0x34, 0x12]);
        assert_eq!(to_payload(-2i16), vec![0xFE, 0xFF]);
        assert_eq!(to_payload(1.0f32), vec![0x00, 0x00, 0x80, 0x3F]);
    }

    #[test]
    fn read_at_offset() {
        let data = [0xAA, 0xBB, 0x34, 0x12];
        assert_eq!(read::<u16>(&data, 2).unwrap(), 0x1234);
        assert_eq!(read::<i16>(&data, 0).unwrap(), 0xBBAAu16 as i16);
    }

    #[test]
    fn read_past_end() {
        let err = read::<u16>(&[0x01, 0x02, 0x03], 2).unwrap_err();
        assert!(matches!(
            err,
            WireError::PayloadTooShort { element: PayloadType::U16, need: 4, got: 3, .. }
        ));
    }

    #[test]
    fn short_array_names_its_element() {
        let err = read_array::<f32>(&[0; 6], 0, 2).unwrap_err();
        assert!(matches!(
            err,
            WireError::PayloadTooShort { element: PayloadType::Float, need: 8, got: 6, .. }
        ));
        assert!(err.to_string().starts_with("payload too short for Float"));
    }

    #[test]
    fn read_array_of_s16() {
        let mut buf = Vec::new();
        for v in [1i16, -1, 300] {
            write(&mut buf, v);
        }
        assert_eq!(read_array::<i16>(&buf, 0, 3).unwrap(), vec![1, -1, 300]);
        assert_eq!(read_array::<i16>(&buf, 2, 2).unwrap(), vec![-1, 300]);
        assert!(read_array::<i16>(&buf, 2, 3).is_err());
    }

    #[test]
    fn accessor_checks_type() {
        let msg = Message::write(45, PayloadType::U16, vec![0x10, 0x00]).unwrap();
        assert_eq!(payload_as_u16(&msg).unwrap(), 16);
        assert!(matches!(
            payload_as_s16(&msg),
            Err(WireError::TypeMismatch {
                expected: PayloadType::S16,
                actual: PayloadType::U16
            })
        ));
        assert!(payload_as_bytes(&msg).is_err());
    }

    #[test]
    fn float_accessor() {
        let msg = Message::write(48, PayloadType::Float, to_payload(12.5f32)).unwrap();
        assert_eq!(payload_as_float(&msg).unwrap(), 12.5);
    }

    #[test]
    fn accessors_skip_timestamp() {
        let msg =
            Message::event(33, PayloadType::U8, Timestamp::new(7, 0), vec![0x09, 0x01]).unwrap();
        assert_eq!(payload_as_u8(&msg).unwrap(), 0x09);
        assert_eq!(payload_as_bytes(&msg).unwrap(), &[0x09, 0x01]);
        assert_eq!(payload_array::<u8>(&msg).unwrap(), vec![0x09, 0x01]);
    }
}
