//! Single-consumer push pipeline for one device stream.
//!
//! Raw buffers go in, get parsed, and are offered to every live subscription
//! in subscription order. Corrupt frames are logged and dropped; the stream
//! keeps going. No I/O happens here: callers own the transport and drive
//! timing.

use std::fmt;

use tracing::{trace, warn};

use crate::device::Command;
use crate::error::CommandError;
use crate::event::{Demux, EventValue, Subscription};
use crate::frame::{DEFAULT_PORT, Message};
use crate::register::RegisterMap;

/// Pipeline settings.
#[derive(Debug, Clone, Copy)]
pub struct PipelineOptions {
    /// Port stamped on outbound writes.
    pub port: u8,
    /// Keep a running count of dropped frames.
    pub count_dropped: bool,
    /// Reject inbound frames whose shape disagrees with this table.
    pub registers: Option<&'static RegisterMap>,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            count_dropped: true,
            registers: None,
        }
    }
}

/// Handle returned by [`Pipeline::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A decoded value and the subscription that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct Emission {
    pub id: SubscriptionId,
    pub value: EventValue,
}

/// Demux pipeline for one device stream.
///
/// Synchronous and single-threaded. Run one pipeline per device; pipelines
/// share nothing.
///
/// # Example
///
/// ```
/// use harpwire::device::{SyringePumpEvent, Event};
/// use harpwire::{Message, PayloadType, Pipeline, Timestamp};
///
/// let mut pipe = Pipeline::new();
/// let step = pipe.subscribe(Event::SyringePump(SyringePumpEvent::Step).subscription()?);
///
/// let frame = Message::event(34, PayloadType::U8, Timestamp::new(1, 0), vec![1])?.encode();
/// let out = pipe.push_raw(&frame);
/// assert_eq!(out.len(), 1);
/// assert_eq!(out[0].id, step);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct Pipeline {
    options: PipelineOptions,
    subscriptions: Vec<(SubscriptionId, Demux)>,
    next_id: u64,
    dropped: u64,
    /// Called for every emission, before it is returned.
    on_emit: Option<Box<dyn FnMut(&Emission)>>,
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("options", &self.options)
            .field("subscriptions", &self.subscriptions.len())
            .field("dropped", &self.dropped)
            .finish()
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl Pipeline {
    pub fn new() -> Self {
        Self::with_options(PipelineOptions::default())
    }

    pub fn with_options(options: PipelineOptions) -> Self {
        Self {
            options,
            subscriptions: Vec::new(),
            next_id: 0,
            dropped: 0,
            on_emit: None,
        }
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    /// Start decoding a subscription. State begins empty.
    pub fn subscribe(&mut self, sub: Subscription) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        self.subscriptions.push((id, Demux::new(sub)));
        id
    }

    /// Stop a subscription and discard its state. Returns `false` if the id
    /// was not live.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscriptions.len();
        self.subscriptions.retain(|(sid, _)| *sid != id);
        self.subscriptions.len() != before
    }

    pub fn subscription_count(&self) -> usize {
        self.subscriptions.len()
    }

    /// Register a callback invoked for every emission.
    pub fn set_on_emit(&mut self, f: impl FnMut(&Emission) + 'static) {
        self.on_emit = Some(Box::new(f));
    }

    /// Frames dropped so far. Stays at zero when counting is off.
    pub fn dropped_frames(&self) -> u64 {
        self.dropped
    }

    /// Parse one raw frame and feed it through every subscription.
    ///
    /// A frame that fails to parse or validate is logged and dropped; the
    /// result is then empty.
    pub fn push_raw(&mut self, raw: &[u8]) -> Vec<Emission> {
        let msg = match Message::parse(raw) {
            Ok(msg) => msg,
            Err(error) => {
                warn!(%error, len = raw.len(), "dropping frame");
                self.note_drop();
                return Vec::new();
            }
        };
        self.push(&msg)
    }

    /// Feed an already-parsed message through every subscription.
    pub fn push(&mut self, msg: &Message) -> Vec<Emission> {
        if let Some(table) = self.options.registers
            && let Err(error) = table.validate(msg)
        {
            warn!(%error, device = table.device, address = msg.address(), "dropping frame");
            self.note_drop();
            return Vec::new();
        }

        let mut out = Vec::new();
        for (id, state) in self.subscriptions.iter_mut() {
            if let Some(value) = state.observe(msg) {
                trace!(subscription = %id, address = msg.address(), %value, "emit");
                let emission = Emission { id: *id, value };
                if let Some(cb) = self.on_emit.as_mut() {
                    cb(&emission);
                }
                out.push(emission);
            }
        }
        out
    }

    /// Feed a batch of raw frames in order.
    pub fn push_all<'a, I>(&mut self, frames: I) -> Vec<Emission>
    where
        I: IntoIterator<Item = &'a [u8]>,
    {
        frames.into_iter().flat_map(|raw| self.push_raw(raw)).collect()
    }

    /// Encode a command to wire bytes on this pipeline's port.
    pub fn encode(&self, cmd: &Command) -> Result<Vec<Vec<u8>>, CommandError> {
        let port = self.options.port;
        Ok(cmd.encode()?.map(|m| m.with_port(port).encode()).collect())
    }

    fn note_drop(&mut self) {
        if self.options.count_dropped {
            self.dropped += 1;
        }
    }
}
