use std::borrow::Borrow;

use tracing::debug;

use crate::frame::{Message, MessageKind};

/// One group of single-byte registers reassembled into a composite value.
/// Slot `i` is filled by events at `addresses[i]`.
#[derive(Debug, Clone, Copy)]
pub struct CorrelationGroup {
    pub name: &'static str,
    pub addresses: &'static [u8],
    pub format: fn(&[u8]) -> String,
}

/// Accumulates bytes for several groups at once and emits each group when
/// all of its slots are filled. A group's slots are cleared on emission.
#[derive(Debug, Clone)]
pub struct Correlator {
    groups: &'static [CorrelationGroup],
    slots: Vec<Vec<Option<u8>>>,
}

impl Correlator {
    pub fn new(groups: &'static [CorrelationGroup]) -> Self {
        let slots = groups.iter().map(|g| vec![None; g.addresses.len()]).collect();
        Self { groups, slots }
    }

    /// Feed one message; returns a composite when it completes a group.
    pub fn observe(&mut self, msg: &Message) -> Option<String> {
        if msg.kind() != MessageKind::Event || msg.is_error() {
            return None;
        }
        let (group, slot) = self.locate(msg.address())?;
        let Some(&byte) = msg.payload().first() else {
            debug!(address = msg.address(), "empty payload, correlation slot not filled");
            return None;
        };

        let slots = &mut self.slots[group];
        slots[slot] = Some(byte);
        if slots.iter().any(Option::is_none) {
            return None;
        }
        let bytes: Vec<u8> = slots.iter().flatten().copied().collect();
        slots.iter_mut().for_each(|s| *s = None);
        Some((self.groups[group].format)(&bytes))
    }

    /// Number of filled slots in a group.
    pub fn filled(&self, group: usize) -> usize {
        self.slots
            .get(group)
            .map_or(0, |s| s.iter().filter(|v| v.is_some()).count())
    }

    fn locate(&self, address: u8) -> Option<(usize, usize)> {
        self.groups.iter().enumerate().find_map(|(g, group)| {
            group
                .addresses
                .iter()
                .position(|&a| a == address)
                .map(|slot| (g, slot))
        })
    }
}

/// Lazily reassemble composites from a message stream.
pub fn correlate<I>(stream: I, groups: &'static [CorrelationGroup]) -> impl Iterator<Item = String>
where
    I: IntoIterator,
    I::Item: Borrow<Message>,
{
    let mut state = Correlator::new(groups);
    stream.into_iter().filter_map(move |m| state.observe(m.borrow()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::Timestamp;
    use crate::payload::PayloadType;

    fn pair(b: &[u8]) -> String {
        format!("{}-{}", b[0], b[1])
    }

    const GROUPS: &[CorrelationGroup] = &[
        CorrelationGroup { name: "a", addresses: &[10, 11], format: pair },
        CorrelationGroup { name: "b", addresses: &[20, 21], format: pair },
    ];

    fn ev(address: u8, v: u8) -> Message {
        Message::event(address, PayloadType::U8, Timestamp::default(), vec![v]).unwrap()
    }

    #[test]
    fn emits_when_group_complete() {
        let mut c = Correlator::new(GROUPS);
        assert_eq!(c.observe(&ev(10, 1)), None);
        assert_eq!(c.observe(&ev(20, 5)), None);
        assert_eq!(c.observe(&ev(11, 2)).as_deref(), Some("1-2"));
        assert_eq!(c.filled(0), 0);
        assert_eq!(c.filled(1), 1);
        assert_eq!(c.observe(&ev(21, 6)).as_deref(), Some("5-6"));
    }

    #[test]
    fn later_value_overwrites_slot() {
        let mut c = Correlator::new(GROUPS);
        c.observe(&ev(10, 1));
        c.observe(&ev(10, 9));
        assert_eq!(c.observe(&ev(11, 2)).as_deref(), Some("9-2"));
    }

    #[test]
    fn error_and_unrelated_frames_ignored() {
        let mut c = Correlator::new(GROUPS);
        c.observe(&ev(10, 1));
        assert_eq!(c.observe(&ev(11, 2).with_error()), None);
        assert_eq!(c.observe(&ev(99, 2)), None);
        assert_eq!(c.filled(0), 1);
    }

    #[test]
    fn stream_adapter() {
        let stream = vec![ev(10, 1), ev(11, 2), ev(10, 3), ev(11, 4)];
        let out: Vec<String> = correlate(stream, GROUPS).collect();
        assert_eq!(out, vec!["1-2", "3-4"]);
    }
}
