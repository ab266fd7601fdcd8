//! Archimedes lever and load motor. Also shipped under the name Arquimedes;
//! both names share these tables.

use crate::command::{self, Frames, Range, SetClear};
use crate::error::CommandError;
use crate::event::{DecoderSpec, Extract, Guard, Scalar, Subscription};
use crate::payload::PayloadType;
use crate::register::{Access, RegisterMap, RegisterSpec};

pub const REG_THRESHOLDS: u8 = 32;
pub const REG_DATA: u8 = 33;
pub const REG_INPUTS: u8 = 34;
pub const REG_RESET_LEVER_ANGLE: u8 = 39;
pub const REG_RESET_LOAD_POSITION: u8 = 40;
pub const REG_HIDE_LEVER: u8 = 41;
pub const REG_OUTPUTS_SET: u8 = 42;
pub const REG_OUTPUTS_CLEAR: u8 = 43;
pub const REG_LEDS_SET: u8 = 44;
pub const REG_LEDS_CLEAR: u8 = 45;
pub const REG_LED_COLORS: u8 = 46;
pub const REG_POS_CURRENT: u8 = 55;
pub const REG_POS_TARGET: u8 = 56;
pub const REG_MOTOR_MAXIMUM: u8 = 60;

/// Degrees per lever count.
pub const LEVER_DEGREES_PER_COUNT: f64 = 0.0219;
/// Volts per analog count.
pub const ANALOG_VOLTS_PER_COUNT: f64 = (3.3 / 1.6) / 2048.0;

pub const DIGITAL_OUTPUT_COUNT: u8 = 6;
pub const LED_COUNT: u8 = 8;
/// Three LEDs, GRB each.
pub const LED_COLORS_LEN: usize = 9;

pub const REGISTERS: RegisterMap = RegisterMap::new(
    "Archimedes",
    &[
        RegisterSpec::new(REG_THRESHOLDS, PayloadType::U8, 1, Access::READ_EVENT),
        RegisterSpec::new(REG_DATA, PayloadType::S16, 2, Access::READ_EVENT),
        RegisterSpec::new(REG_INPUTS, PayloadType::U8, 1, Access::READ_EVENT),
        RegisterSpec::new(REG_RESET_LEVER_ANGLE, PayloadType::U8, 1, Access::READ_WRITE),
        RegisterSpec::new(REG_RESET_LOAD_POSITION, PayloadType::U8, 1, Access::READ_WRITE),
        RegisterSpec::new(REG_HIDE_LEVER, PayloadType::U8, 1, Access::READ_WRITE),
        RegisterSpec::new(REG_OUTPUTS_SET, PayloadType::U8, 1, Access::READ_WRITE),
        RegisterSpec::new(REG_OUTPUTS_CLEAR, PayloadType::U8, 1, Access::READ_WRITE),
        RegisterSpec::new(REG_LEDS_SET, PayloadType::U8, 1, Access::READ_WRITE),
        RegisterSpec::new(REG_LEDS_CLEAR, PayloadType::U8, 1, Access::READ_WRITE),
        RegisterSpec::new(REG_LED_COLORS, PayloadType::U8, LED_COLORS_LEN, Access::READ_WRITE),
        RegisterSpec::new(REG_POS_CURRENT, PayloadType::U16, 1, Access::READ_EVENT),
        RegisterSpec::new(REG_POS_TARGET, PayloadType::U16, 1, Access::READ_WRITE),
        RegisterSpec::new(REG_MOTOR_MAXIMUM, PayloadType::U16, 1, Access::ALL),
    ],
);

const OUTPUT_PAIR: SetClear = SetClear::new(REG_OUTPUTS_SET, REG_OUTPUTS_CLEAR);
const LED_PAIR: SetClear = SetClear::new(REG_LEDS_SET, REG_LEDS_CLEAR);
const OUTPUT_INDEX: Range = Range::reject("DigitalOutput", 0.0, (DIGITAL_OUTPUT_COUNT - 1) as f64);
const LED_INDEX: Range = Range::reject("LedConfig", 0.0, (LED_COUNT - 1) as f64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchimedesCommand {
    LoadPosition(u16),
    ResetLeverAngle,
    ResetLoadPosition,
    HideLever,
    UnhideLever,
    /// Drive one digital output high (set) or low (clear).
    DigitalOutput { index: u8, on: bool },
    DigitalOutputsSet(u8),
    DigitalOutputsClear(u8),
    LedConfig { index: u8, on: bool },
    LedConfigsSet(u8),
    LedConfigsClear(u8),
    /// GRB for three LEDs.
    ColorsOfLeds([u8; LED_COLORS_LEN]),
}

impl ArchimedesCommand {
    pub fn encode(&self) -> Result<Frames, CommandError> {
        use ArchimedesCommand::*;
        let msg = match *self {
            LoadPosition(pos) => command::write_u16(REG_POS_TARGET, pos),
            ResetLeverAngle => command::write_u8(REG_RESET_LEVER_ANGLE, 1),
            ResetLoadPosition => command::write_u8(REG_RESET_LOAD_POSITION, 1),
            HideLever => command::write_u8(REG_HIDE_LEVER, 1),
            UnhideLever => command::write_u8(REG_HIDE_LEVER, 0),
            DigitalOutput { index, on } => {
                OUTPUT_INDEX.apply(f64::from(index))?;
                OUTPUT_PAIR.encode(on, 1u8 << index)
            }
            DigitalOutputsSet(bits) => command::write_u8(REG_OUTPUTS_SET, bits),
            DigitalOutputsClear(bits) => command::write_u8(REG_OUTPUTS_CLEAR, bits),
            LedConfig { index, on } => {
                LED_INDEX.apply(f64::from(index))?;
                LED_PAIR.encode(on, 1u8 << index)
            }
            LedConfigsSet(bits) => command::write_u8(REG_LEDS_SET, bits),
            LedConfigsClear(bits) => command::write_u8(REG_LEDS_CLEAR, bits),
            ColorsOfLeds(grb) => command::write_bytes(REG_LED_COLORS, &grb)?,
        };
        Ok(Frames::single(msg))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchimedesEvent {
    /// Lever angle in degrees.
    Lever,
    /// Analog input in volts.
    AnalogInput,
    RegisterLever,
    RegisterAnalogInput,
    LeverIsQuiet,
    /// Highest threshold crossed, or -1. Only reported while the lever moves.
    Thresholds,
    Threshold(u8),
    RegisterThresholds,
    Inputs,
    Input(u8),
    RegisterInputs,
    /// Current motor position. Silent until the motor maximum has been reported.
    RegisterLoadPosition,
}

impl ArchimedesEvent {
    pub fn subscription(self) -> Result<Subscription, CommandError> {
        use ArchimedesEvent::*;
        let spec = match self {
            Lever => DecoderSpec::new(REG_DATA, Extract::scaled(Scalar::S16, 0, LEVER_DEGREES_PER_COUNT)),
            AnalogInput => DecoderSpec::new(REG_DATA, Extract::scaled(Scalar::U16, 2, ANALOG_VOLTS_PER_COUNT)),
            RegisterLever => DecoderSpec::new(REG_DATA, Extract::raw(Scalar::S16)),
            RegisterAnalogInput => DecoderSpec::new(
                REG_DATA,
                Extract::Raw {
                    scalar: Scalar::S16,
                    offset: 2,
                },
            ),
            LeverIsQuiet => DecoderSpec::new(REG_THRESHOLDS, Extract::NotBit { byte: 0, bit: 0 }).distinct(),
            Thresholds => DecoderSpec::new(REG_THRESHOLDS, Extract::Threshold { byte: 0 })
                .guard(Guard::ByteAbove { byte: 0, value: 1 })
                .distinct(),
            Threshold(n) => {
                Range::reject("Threshold", 0.0, 3.0).apply(f64::from(n))?;
                DecoderSpec::new(REG_THRESHOLDS, Extract::bit(0, n + 1)).distinct()
            }
            RegisterThresholds => DecoderSpec::new(REG_THRESHOLDS, Extract::raw(Scalar::U8)),
            Inputs => DecoderSpec::new(
                REG_INPUTS,
                Extract::Bits {
                    scalar: Scalar::U8,
                    offset: 0,
                    first: 0,
                    count: 4,
                },
            ),
            Input(n) => {
                Range::reject("Input", 0.0, 3.0).apply(f64::from(n))?;
                DecoderSpec::new(REG_INPUTS, Extract::bit(0, n)).distinct()
            }
            RegisterInputs => DecoderSpec::new(REG_INPUTS, Extract::raw(Scalar::U8)),
            RegisterLoadPosition => DecoderSpec::new(REG_POS_CURRENT, Extract::raw(Scalar::U16))
                .guard(Guard::AfterSeen {
                    address: REG_MOTOR_MAXIMUM,
                }),
        };
        Ok(Subscription::Decode(spec))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{EventValue, RegisterValue, demux};
    use crate::frame::{Message, MessageKind, Timestamp};

    fn ev(address: u8, payload_type: PayloadType, payload: Vec<u8>) -> Message {
        Message::event(address, payload_type, Timestamp::new(10, 0), payload).unwrap()
    }

    fn decode(event: ArchimedesEvent, frames: &[Message]) -> Vec<EventValue> {
        demux(frames, event.subscription().unwrap()).collect()
    }

    #[test]
    fn digital_output_set_and_clear() {
        let on = ArchimedesCommand::DigitalOutput { index: 5, on: true }.encode().unwrap().next().unwrap();
        assert_eq!((on.address(), on.payload()), (REG_OUTPUTS_SET, &[32u8][..]));
        let off = ArchimedesCommand::LedConfig { index: 7, on: false }.encode().unwrap().next().unwrap();
        assert_eq!((off.address(), off.payload()), (REG_LEDS_CLEAR, &[128u8][..]));
        assert!(ArchimedesCommand::DigitalOutput { index: 6, on: true }.encode().is_err());
    }

    #[test]
    fn colors_are_nine_bytes() {
        let msg = ArchimedesCommand::ColorsOfLeds([1, 2, 3, 4, 5, 6, 7, 8, 9])
            .encode()
            .unwrap()
            .next()
            .unwrap();
        assert_eq!(msg.encode().len(), 9 + 6);
    }

    #[test]
    fn lever_and_analog_share_register() {
        // lever = -100, analog = 2048
        let frames = [ev(REG_DATA, PayloadType::S16, vec![0x9C, 0xFF, 0x00, 0x08])];
        let lever = decode(ArchimedesEvent::Lever, &frames);
        let EventValue::Float(deg) = lever[0] else { panic!("expected float") };
        assert!((deg - (-2.19)).abs() < 1e-9);
        let analog = decode(ArchimedesEvent::AnalogInput, &frames);
        let EventValue::Float(v) = analog[0] else { panic!("expected float") };
        assert!((v - 3.3 / 1.6).abs() < 1e-9);
    }

    #[test]
    fn thresholds_ignore_quiet_lever() {
        let frames = [
            ev(REG_THRESHOLDS, PayloadType::U8, vec![1]),
            ev(REG_THRESHOLDS, PayloadType::U8, vec![3]),
            ev(REG_THRESHOLDS, PayloadType::U8, vec![7]),
            ev(REG_THRESHOLDS, PayloadType::U8, vec![7]),
            ev(REG_THRESHOLDS, PayloadType::U8, vec![0]),
        ];
        assert_eq!(
            decode(ArchimedesEvent::Thresholds, &frames),
            vec![EventValue::Int(0), EventValue::Int(1)]
        );
        assert_eq!(
            decode(ArchimedesEvent::LeverIsQuiet, &frames),
            vec![EventValue::Bool(false), EventValue::Bool(true)]
        );
        assert_eq!(
            decode(ArchimedesEvent::Threshold(1), &frames),
            vec![EventValue::Bool(false), EventValue::Bool(true), EventValue::Bool(false)]
        );
    }

    #[test]
    fn load_position_waits_for_motor_maximum() {
        let position = ev(REG_POS_CURRENT, PayloadType::U16, vec![0x10, 0x00]);
        let maximum = Message::build(MessageKind::Read, 255, REG_MOTOR_MAXIMUM, PayloadType::U16, vec![0, 4]).unwrap();
        let frames = [position.clone(), maximum, position];
        let got = decode(ArchimedesEvent::RegisterLoadPosition, &frames);
        assert_eq!(got.len(), 1);
        assert!(matches!(&got[0], EventValue::Register(t) if t.value == RegisterValue::U16(16)));
    }

    #[test]
    fn inputs_as_bits() {
        let frames = [ev(REG_INPUTS, PayloadType::U8, vec![0b1010])];
        assert_eq!(
            decode(ArchimedesEvent::Inputs, &frames),
            vec![EventValue::Array(vec![0, 1, 0, 1])]
        );
        assert!(ArchimedesEvent::Input(4).subscription().is_err());
    }
}
