//! RGB LED array controller: two buses of 32 LEDs, three bytes (GRB) each.

use crate::command::{self, Frames, Range, SetClear};
use crate::error::CommandError;
use crate::event::{DecoderSpec, Extract, Guard, Subscription};
use crate::payload::PayloadType;
use crate::register::{Access, RegisterMap, RegisterSpec};

pub const REG_ENABLE: u8 = 32;
pub const REG_UPDATE64: u8 = 34;
pub const REG_UPDATE32_BUS0: u8 = 35;
pub const REG_UPDATE32_BUS1: u8 = 36;
pub const REG_LATCH_NEXT_UPDATE: u8 = 43;
pub const REG_INPUTS: u8 = 44;
pub const REG_SET_OUTPUTS: u8 = 45;
pub const REG_CLEAR_OUTPUTS: u8 = 46;
pub const REG_TOGGLE_OUTPUTS: u8 = 47;
pub const REG_OUTPUTS: u8 = 48;
pub const REG_PULSE_PERIOD: u8 = 49;
pub const REG_PULSE_REPETITIONS: u8 = 50;

/// Bytes in one full-array update (64 LEDs × GRB).
pub const UPDATE64_LEN: usize = 192;
/// Bytes in one single-bus update.
pub const UPDATE32_LEN: usize = UPDATE64_LEN / 2;

pub const OUTPUT_COUNT: u8 = 5;

pub const REGISTERS: RegisterMap = RegisterMap::new(
    "RgbArray",
    &[
        RegisterSpec::new(REG_ENABLE, PayloadType::U8, 1, Access::ALL),
        RegisterSpec::new(REG_UPDATE64, PayloadType::U8, UPDATE64_LEN, Access::READ_WRITE),
        RegisterSpec::new(REG_UPDATE32_BUS0, PayloadType::U8, UPDATE32_LEN, Access::READ_WRITE),
        RegisterSpec::new(REG_UPDATE32_BUS1, PayloadType::U8, UPDATE32_LEN, Access::READ_WRITE),
        RegisterSpec::new(REG_LATCH_NEXT_UPDATE, PayloadType::U8, 1, Access::READ_WRITE),
        RegisterSpec::new(REG_INPUTS, PayloadType::U8, 1, Access::READ_EVENT),
        RegisterSpec::new(REG_SET_OUTPUTS, PayloadType::U8, 1, Access::READ_WRITE),
        RegisterSpec::new(REG_CLEAR_OUTPUTS, PayloadType::U8, 1, Access::READ_WRITE),
        RegisterSpec::new(REG_TOGGLE_OUTPUTS, PayloadType::U8, 1, Access::READ_WRITE),
        RegisterSpec::new(REG_OUTPUTS, PayloadType::U8, 1, Access::READ_WRITE),
        RegisterSpec::new(REG_PULSE_PERIOD, PayloadType::U16, 1, Access::READ_WRITE),
        RegisterSpec::new(REG_PULSE_REPETITIONS, PayloadType::U8, 1, Access::READ_WRITE),
    ],
);

const OUTPUT_PAIR: SetClear = SetClear::new(REG_SET_OUTPUTS, REG_CLEAR_OUTPUTS);
const OUTPUT_INDEX: Range = Range::reject("Output", 0.0, (OUTPUT_COUNT - 1) as f64);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RgbArrayCommand {
    Enable,
    Disable,
    LatchNextUpdate,
    /// GRB bytes for both buses. Zero-filled or truncated to 192 bytes.
    Update64(Vec<u8>),
    Update32Bus0(Vec<u8>),
    Update32Bus1(Vec<u8>),
    SetOutput(u8),
    ClearOutput(u8),
    ToggleOutput(u8),
    RegisterSetOutputs(u8),
    RegisterClearOutputs(u8),
    RegisterToggleOutputs(u8),
    RegisterOutputs(u8),
    PulsePeriod(u16),
    PulseRepetitions(u8),
}

impl RgbArrayCommand {
    /// Full-array update from per-LED GRB triples.
    pub fn update64_leds(leds: &[[u8; 3]]) -> Self {
        Self::Update64(leds.concat())
    }

    pub fn encode(&self) -> Result<Frames, CommandError> {
        use RgbArrayCommand::*;
        let msg = match self {
            Enable => command::write_u8(REG_ENABLE, 1 << 0),
            Disable => command::write_u8(REG_ENABLE, 1 << 1),
            LatchNextUpdate => command::write_u8(REG_LATCH_NEXT_UPDATE, 1),
            Update64(bytes) => command::zero_filled(REG_UPDATE64, bytes, UPDATE64_LEN)?,
            Update32Bus0(bytes) => command::zero_filled(REG_UPDATE32_BUS0, bytes, UPDATE32_LEN)?,
            Update32Bus1(bytes) => command::zero_filled(REG_UPDATE32_BUS1, bytes, UPDATE32_LEN)?,
            SetOutput(n) => OUTPUT_PAIR.encode(true, output_bit(*n)?),
            ClearOutput(n) => OUTPUT_PAIR.encode(false, output_bit(*n)?),
            ToggleOutput(n) => command::write_u8(REG_TOGGLE_OUTPUTS, output_bit(*n)?),
            RegisterSetOutputs(v) => command::write_u8(REG_SET_OUTPUTS, *v),
            RegisterClearOutputs(v) => command::write_u8(REG_CLEAR_OUTPUTS, *v),
            RegisterToggleOutputs(v) => command::write_u8(REG_TOGGLE_OUTPUTS, *v),
            RegisterOutputs(v) => command::write_u8(REG_OUTPUTS, *v),
            PulsePeriod(ms) => command::write_u16(REG_PULSE_PERIOD, *ms),
            PulseRepetitions(n) => command::write_u8(REG_PULSE_REPETITIONS, *n),
        };
        Ok(Frames::single(msg))
    }
}

fn output_bit(n: u8) -> Result<u8, CommandError> {
    OUTPUT_INDEX.apply(f64::from(n))?;
    Ok(1 << n)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RgbArrayEvent {
    /// The enable register reported 1.
    Updated,
    /// The enable register reported 2.
    Disabled,
    Input0,
}

impl RgbArrayEvent {
    pub fn subscription(self) -> Subscription {
        let spec = match self {
            Self::Updated => DecoderSpec::new(REG_ENABLE, Extract::Constant)
                .guard(Guard::ByteIs { byte: 0, value: 1 }),
            Self::Disabled => DecoderSpec::new(REG_ENABLE, Extract::Constant)
                .guard(Guard::ByteIs { byte: 0, value: 2 }),
            Self::Input0 => DecoderSpec::new(REG_INPUTS, Extract::bit(0, 0)).distinct(),
        };
        Subscription::Decode(spec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{EventValue, demux};
    use crate::frame::{Message, Timestamp};

    fn one(cmd: RgbArrayCommand) -> Message {
        cmd.encode().unwrap().next().unwrap()
    }

    #[test]
    fn update64_zero_fills_short_input() {
        let msg = one(RgbArrayCommand::update64_leds(&[[1, 2, 3]]));
        assert_eq!(msg.address(), REG_UPDATE64);
        assert_eq!(msg.payload().len(), 192);
        assert_eq!(&msg.payload()[..4], &[1, 2, 3, 0]);
        // 192 + 6 bytes; length field counts everything after itself
        assert_eq!(msg.encode()[1], 196);
    }

    #[test]
    fn update32_truncates_long_input() {
        let msg = one(RgbArrayCommand::Update32Bus1(vec![7; 200]));
        assert_eq!(msg.address(), REG_UPDATE32_BUS1);
        assert_eq!(msg.payload(), &[7; 96][..]);
    }

    #[test]
    fn outputs_by_index() {
        assert_eq!(one(RgbArrayCommand::SetOutput(4)).payload(), &[16]);
        assert_eq!(one(RgbArrayCommand::ClearOutput(0)).address(), REG_CLEAR_OUTPUTS);
        assert_eq!(one(RgbArrayCommand::ToggleOutput(2)).payload(), &[4]);
        assert!(RgbArrayCommand::SetOutput(5).encode().is_err());
    }

    #[test]
    fn enable_disable_values() {
        assert_eq!(one(RgbArrayCommand::Enable).payload(), &[1]);
        assert_eq!(one(RgbArrayCommand::Disable).payload(), &[2]);
        assert_eq!(one(RgbArrayCommand::PulsePeriod(500)).payload(), &[0xF4, 0x01]);
    }

    #[test]
    fn updated_and_disabled_split_one_register() {
        let ts = Timestamp::new(1, 0);
        let frames = [
            Message::event(REG_ENABLE, PayloadType::U8, ts, vec![1]).unwrap(),
            Message::event(REG_ENABLE, PayloadType::U8, ts, vec![2]).unwrap(),
            Message::event(REG_ENABLE, PayloadType::U8, ts, vec![1]).unwrap(),
        ];
        let updated: Vec<_> = demux(&frames, RgbArrayEvent::Updated.subscription()).collect();
        let disabled: Vec<_> = demux(&frames, RgbArrayEvent::Disabled.subscription()).collect();
        assert_eq!(updated, vec![EventValue::Bool(true); 2]);
        assert_eq!(disabled, vec![EventValue::Bool(true)]);
    }

    #[test]
    fn input0_suppresses_repeats() {
        let frames: Vec<Message> = [0b01u8, 0b11, 0b01, 0b00]
            .into_iter()
            .map(|b| Message::event(REG_INPUTS, PayloadType::U8, Timestamp::new(2, 0), vec![b]).unwrap())
            .collect();
        let got: Vec<_> = demux(&frames, RgbArrayEvent::Input0.subscription()).collect();
        assert_eq!(got, vec![EventValue::Bool(true), EventValue::Bool(false)]);
    }
}
