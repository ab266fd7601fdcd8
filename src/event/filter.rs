use std::borrow::Borrow;

use crate::codec::{self, PayloadElement};
use crate::error::{Result, WireError};
use crate::frame::{Message, MessageKind};

use super::Timestamped;

/// The one predicate every decoder applies: right register, event kind, no
/// device error.
pub fn is_register_event(msg: &Message, address: u8) -> bool {
    msg.address() == address && msg.kind() == MessageKind::Event && !msg.is_error()
}

/// Lazily keep only events from one register.
pub fn filter_register<I>(stream: I, address: u8) -> impl Iterator<Item = I::Item>
where
    I: IntoIterator,
    I::Item: Borrow<Message>,
{
    stream
        .into_iter()
        .filter(move |m| is_register_event(m.borrow(), address))
}

/// `(payload[byte] >> bit) & 1`.
pub fn extract_bit(msg: &Message, byte: usize, bit: u8) -> Result<bool> {
    let b: u8 = codec::read(msg.payload(), byte).map_err(|e| e.with_raw(msg.payload()))?;
    Ok((b >> bit) & 1 == 1)
}

/// Little-endian element at a payload byte offset. The frame's own tag is
/// not consulted; multi-field registers pack mixed types.
pub fn extract_scalar<T: PayloadElement>(msg: &Message, offset: usize) -> Result<T> {
    codec::read(msg.payload(), offset).map_err(|e| e.with_raw(msg.payload()))
}

/// Scalar paired with the frame's device time in seconds.
pub fn decode_timestamped<T: PayloadElement>(msg: &Message, offset: usize) -> Result<Timestamped<T>> {
    let ts = msg.timestamp().ok_or(WireError::MissingTimestamp)?;
    let value = extract_scalar(msg, offset)?;
    Ok(Timestamped::new(value, ts.as_secs_f64()))
}
