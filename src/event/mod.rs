//! Inbound event demultiplexing.
//!
//! Every decoder applies the same predicate (register address, event kind,
//! error flag clear) before extracting anything. State lives in per-subscription
//! values owned by the caller; nothing here is shared.

use std::borrow::Borrow;
use std::fmt;

mod correlate;
mod decoder;
mod distinct;
mod filter;
mod threshold;

pub use correlate::{CorrelationGroup, Correlator, correlate};
pub use decoder::{Decoder, DecoderSpec, Extract, Guard, Scalar};
pub use distinct::{Distinct, DistinctExt, DistinctUntilChanged};
pub use filter::{decode_timestamped, extract_bit, extract_scalar, filter_register, is_register_event};
pub use threshold::{UNMAPPED, threshold_level};

use crate::frame::Message;

/// A value paired with device time in seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Timestamped<T> {
    pub value: T,
    pub seconds: f64,
}

impl<T> Timestamped<T> {
    pub fn new(value: T, seconds: f64) -> Self {
        Self { value, seconds }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Timestamped<U> {
        Timestamped {
            value: f(self.value),
            seconds: self.seconds,
        }
    }
}

/// Raw register contents as reported on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum RegisterValue {
    U8(u8),
    U16(u16),
    S16(i16),
}

/// A decoded event.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum EventValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Array(Vec<i32>),
    Text(String),
    Register(Timestamped<RegisterValue>),
    Flag(Timestamped<bool>),
}

impl fmt::Display for RegisterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::U8(v) => write!(f, "{v}"),
            Self::U16(v) => write!(f, "{v}"),
            Self::S16(v) => write!(f, "{v}"),
        }
    }
}

impl fmt::Display for EventValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v:.4}"),
            Self::Array(v) => write!(f, "{v:?}"),
            Self::Text(v) => write!(f, "{v:?}"),
            Self::Register(t) => write!(f, "{} @ {:.6}s", t.value, t.seconds),
            Self::Flag(t) => write!(f, "{} @ {:.6}s", t.value, t.seconds),
        }
    }
}

/// What a subscriber wants decoded. Static data.
#[derive(Debug, Clone, Copy)]
pub enum Subscription {
    Decode(DecoderSpec),
    Correlate(&'static [CorrelationGroup]),
}

/// Running state for one subscription.
#[derive(Debug, Clone)]
pub enum Demux {
    Decode(Decoder),
    Correlate(Correlator),
}

impl Demux {
    pub fn new(sub: Subscription) -> Self {
        match sub {
            Subscription::Decode(spec) => Self::Decode(Decoder::new(spec)),
            Subscription::Correlate(groups) => Self::Correlate(Correlator::new(groups)),
        }
    }

    pub fn observe(&mut self, msg: &Message) -> Option<EventValue> {
        match self {
            Self::Decode(d) => d.observe(msg),
            Self::Correlate(c) => c.observe(msg).map(EventValue::Text),
        }
    }
}

/// Lazily decode one subscription over a message stream.
pub fn demux<I>(stream: I, sub: Subscription) -> impl Iterator<Item = EventValue>
where
    I: IntoIterator,
    I::Item: Borrow<Message>,
{
    let mut state = Demux::new(sub);
    stream.into_iter().filter_map(move |m| state.observe(m.borrow()))
}
