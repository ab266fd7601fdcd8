//! Harp binary protocol: message codec, per-device command encoders, and a
//! register event demultiplexer.
//!
//! Outbound, a [`Command`] encodes into one or more write [`Message`]s.
//! Inbound, raw frames go through [`Message::parse`] and then a [`Pipeline`]
//! (or a bare [`event::demux`]) turns them into typed [`EventValue`]s.

pub mod codec;
pub mod command;
pub mod device;
pub mod error;
pub mod event;
pub mod frame;
pub mod mask;
pub mod payload;
pub mod pipeline;
pub mod register;

pub use command::Frames;
pub use device::{Command, Device, Event};
pub use error::{CommandError, WireError};
pub use event::{EventValue, RegisterValue, Subscription, Timestamped};
pub use frame::{DEFAULT_PORT, Message, MessageKind, Timestamp};
pub use mask::{RegisterGroup, SelectorTable};
pub use payload::PayloadType;
pub use pipeline::{Emission, Pipeline, PipelineOptions, SubscriptionId};
pub use register::{Access, RegisterMap, RegisterSpec};
