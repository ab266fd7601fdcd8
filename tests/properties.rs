//! Codec and demux properties over generated inputs.

use harpwire::device::{LedArrayCommand, LedArrayEvent, SyringePumpCommand, behavior, led_array};
use harpwire::device::BehaviorCommand;
use harpwire::event::{DistinctUntilChanged, demux};
use harpwire::{CommandError, EventValue, Message, MessageKind, PayloadType, Timestamp, WireError};
use proptest::prelude::*;

const PAYLOAD_TYPES: [PayloadType; 9] = [
    PayloadType::U8,
    PayloadType::S8,
    PayloadType::U16,
    PayloadType::S16,
    PayloadType::U32,
    PayloadType::S32,
    PayloadType::U64,
    PayloadType::S64,
    PayloadType::Float,
];

fn payload_type() -> impl Strategy<Value = PayloadType> {
    prop::sample::select(PAYLOAD_TYPES.to_vec())
}

/// A payload type with a whole number of elements, small enough for one frame.
fn typed_payload() -> impl Strategy<Value = (PayloadType, Vec<u8>)> {
    (payload_type(), 0usize..=12).prop_flat_map(|(ty, count)| {
        prop::collection::vec(any::<u8>(), count * ty.element_size()).prop_map(move |p| (ty, p))
    })
}

fn outbound_kind() -> impl Strategy<Value = MessageKind> {
    prop_oneof![Just(MessageKind::Read), Just(MessageKind::Write)]
}

/// Any valid frame, outbound or event.
fn any_frame() -> impl Strategy<Value = Message> {
    prop_oneof![
        (outbound_kind(), any::<u8>(), any::<u8>(), typed_payload()).prop_map(
            |(kind, port, address, (ty, payload))| {
                Message::build(kind, port, address, ty, payload).unwrap()
            }
        ),
        (any::<u8>(), any::<u32>(), any::<u16>(), typed_payload()).prop_map(
            |(address, secs, ticks, (ty, payload))| {
                Message::event(address, ty, Timestamp::new(secs, ticks), payload).unwrap()
            }
        ),
    ]
}

proptest! {
    #[test]
    fn build_then_parse_preserves_fields(msg in any_frame()) {
        let wire = msg.encode();
        let parsed = Message::parse(&wire).unwrap();
        prop_assert_eq!(parsed.address(), msg.address());
        prop_assert_eq!(parsed.port(), msg.port());
        prop_assert_eq!(parsed.payload_type(), msg.payload_type());
        prop_assert_eq!(parsed.payload(), msg.payload());
        prop_assert_eq!(parsed.timestamp(), msg.timestamp());
        prop_assert_eq!(parsed.encode(), wire);
    }

    #[test]
    fn single_byte_corruption_fails_checksum(
        msg in any_frame(),
        index in any::<prop::sample::Index>(),
        delta in 1u8..=255,
    ) {
        let mut wire = msg.encode();
        let i = index.index(wire.len());
        wire[i] = wire[i].wrapping_add(delta);
        let result = Message::parse(&wire);
        prop_assert!(matches!(result, Err(WireError::Checksum { .. })), "{:?}", result);
    }

    #[test]
    fn repeated_value_passes_once(value in any::<i64>(), n in 1usize..64) {
        let mut filter = DistinctUntilChanged::new();
        let passed = (0..n).filter_map(|_| filter.observe(value)).count();
        prop_assert_eq!(passed, 1);
    }

    #[test]
    fn repeated_input_frame_emits_once(byte in any::<u8>(), n in 1usize..32) {
        let frame = Message::event(led_array::REG_INPUTS, PayloadType::U8, Timestamp::new(0, 0), vec![byte]).unwrap();
        let stream = vec![frame; n];
        let got: Vec<_> = demux(&stream, LedArrayEvent::Input0.subscription()).collect();
        prop_assert_eq!(got, vec![EventValue::Bool(byte & 1 != 0)]);
    }

    #[test]
    fn intensity_accepts_exactly_one_index(selector in any::<u32>(), value in 1i32..=120) {
        let result = LedArrayCommand::Intensity { selector, value }.encode();
        let single = selector == led_array::INDEX0 || selector == led_array::INDEX1;
        if single {
            prop_assert!(result.is_ok());
        } else {
            let invalid_selector = matches!(result, Err(CommandError::InvalidSelector { .. }));
            prop_assert!(invalid_selector);
        }
    }

    #[test]
    fn led_current_rejects_anything_but_one_led(selector in any::<u32>()) {
        let result = BehaviorCommand::LedCurrent { selector, milliamps: 10 }.encode();
        let single = selector == behavior::LED0 || selector == behavior::LED1;
        prop_assert_eq!(result.is_ok(), single);
        if !single {
            let invalid_selector = matches!(result, Err(CommandError::InvalidSelector { .. }));
            prop_assert!(invalid_selector);
        }
    }

    #[test]
    fn intensity_is_clamped_never_rejected(value in any::<i32>()) {
        let mut frames = LedArrayCommand::Intensity { selector: led_array::INDEX0, value }.encode().unwrap();
        let msg = frames.next().unwrap();
        let written = msg.payload()[0];
        prop_assert!((1..=120).contains(&written));
        if (1..=120).contains(&value) {
            prop_assert_eq!(i32::from(written), value);
        }
    }

    #[test]
    fn volume_outside_range_is_rejected(
        volume in prop_oneof![-1.0e6f32..0.5f32, 2000.001f32..1.0e6f32],
    ) {
        let result = SyringePumpCommand::ProtocolVolume(volume).encode();
        prop_assert!(
            matches!(result, Err(CommandError::Domain { register: "ProtocolVolume", .. })),
            "{:?}", result
        );
    }
}

#[test]
fn timestamp_ticks_are_32_microseconds() {
    assert_eq!(Timestamp::new(100, 31250).as_secs_f64(), 101.0);
}
