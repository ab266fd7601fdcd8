//! Load cell amplifier: eight force channels on two ports, nine digital outputs.

use crate::command::{self, Frames, Range, SetClear};
use crate::error::CommandError;
use crate::event::{DecoderSpec, Extract, Scalar, Subscription};
use crate::payload::PayloadType;
use crate::register::{Access, RegisterMap, RegisterSpec};

pub const REG_ACQUISITION: u8 = 32;
pub const REG_FORCES: u8 = 33;
pub const REG_INPUT: u8 = 34;
pub const REG_OUTPUT_PERIODIC_TOGGLE: u8 = 35;
pub const REG_SET_OUTPUTS: u8 = 42;
pub const REG_CLEAR_OUTPUTS: u8 = 43;
pub const REG_TOGGLE_OUTPUTS: u8 = 44;
pub const REG_OUTPUTS: u8 = 45;
/// Channel offsets occupy 48..=55, port 0 first.
pub const REG_OFFSET_BASE: u8 = 48;

pub const CHANNEL_COUNT: usize = 8;
pub const OUTPUT_COUNT: u8 = 9;

pub const REGISTERS: RegisterMap = RegisterMap::new(
    "LoadCells",
    &[
        RegisterSpec::new(REG_ACQUISITION, PayloadType::U8, 1, Access::READ_WRITE),
        RegisterSpec::new(REG_FORCES, PayloadType::S16, CHANNEL_COUNT, Access::READ_EVENT),
        RegisterSpec::new(REG_INPUT, PayloadType::U8, 1, Access::READ_EVENT),
        RegisterSpec::new(REG_OUTPUT_PERIODIC_TOGGLE, PayloadType::U8, 1, Access::READ_EVENT),
        RegisterSpec::new(REG_SET_OUTPUTS, PayloadType::U16, 1, Access::READ_WRITE),
        RegisterSpec::new(REG_CLEAR_OUTPUTS, PayloadType::U16, 1, Access::READ_WRITE),
        RegisterSpec::new(REG_TOGGLE_OUTPUTS, PayloadType::U16, 1, Access::READ_WRITE),
        RegisterSpec::new(REG_OUTPUTS, PayloadType::U16, 1, Access::ALL),
        RegisterSpec::new(REG_OFFSET_BASE, PayloadType::S16, 1, Access::READ_WRITE),
        RegisterSpec::new(REG_OFFSET_BASE + 1, PayloadType::S16, 1, Access::READ_WRITE),
        RegisterSpec::new(REG_OFFSET_BASE + 2, PayloadType::S16, 1, Access::READ_WRITE),
        RegisterSpec::new(REG_OFFSET_BASE + 3, PayloadType::S16, 1, Access::READ_WRITE),
        RegisterSpec::new(REG_OFFSET_BASE + 4, PayloadType::S16, 1, Access::READ_WRITE),
        RegisterSpec::new(REG_OFFSET_BASE + 5, PayloadType::S16, 1, Access::READ_WRITE),
        RegisterSpec::new(REG_OFFSET_BASE + 6, PayloadType::S16, 1, Access::READ_WRITE),
        RegisterSpec::new(REG_OFFSET_BASE + 7, PayloadType::S16, 1, Access::READ_WRITE),
    ],
);

const OUTPUT_PAIR: SetClear = SetClear::new(REG_SET_OUTPUTS, REG_CLEAR_OUTPUTS);
const OUTPUT_INDEX: Range = Range::reject("Output", 0.0, (OUTPUT_COUNT - 1) as f64);
const CHANNEL_INDEX: Range = Range::reject("Offset", 0.0, (CHANNEL_COUNT - 1) as f64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadCellsCommand {
    StartAcquisition,
    StopAcquisition,
    /// Zero offset for one channel; channels 0..4 are port 0, 4..8 port 1.
    Offset { channel: u8, value: i16 },
    SetOutput(u8),
    ClearOutput(u8),
    ToggleOutput(u8),
    RegisterSetOutputs(u16),
    RegisterClearOutputs(u16),
    RegisterToggleOutputs(u16),
    RegisterOutputs(u16),
}

impl LoadCellsCommand {
    pub fn encode(&self) -> Result<Frames, CommandError> {
        use LoadCellsCommand::*;
        let msg = match *self {
            StartAcquisition => command::write_u8(REG_ACQUISITION, 1),
            StopAcquisition => command::write_u8(REG_ACQUISITION, 0),
            Offset { channel, value } => {
                CHANNEL_INDEX.apply(f64::from(channel))?;
                command::write_s16(REG_OFFSET_BASE + channel, value)
            }
            SetOutput(n) => OUTPUT_PAIR.encode(true, output_bit(n)?),
            ClearOutput(n) => OUTPUT_PAIR.encode(false, output_bit(n)?),
            ToggleOutput(n) => command::write_u16(REG_TOGGLE_OUTPUTS, output_bit(n)?),
            RegisterSetOutputs(v) => command::write_u16(REG_SET_OUTPUTS, v),
            RegisterClearOutputs(v) => command::write_u16(REG_CLEAR_OUTPUTS, v),
            RegisterToggleOutputs(v) => command::write_u16(REG_TOGGLE_OUTPUTS, v),
            RegisterOutputs(v) => command::write_u16(REG_OUTPUTS, v),
        };
        Ok(Frames::single(msg))
    }
}

fn output_bit(n: u8) -> Result<u16, CommandError> {
    OUTPUT_INDEX.apply(f64::from(n))?;
    Ok(1 << n)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadCellsEvent {
    /// All eight channels as signed counts.
    Forces,
    Input,
    OutputPeriodicToggle,
    /// Output line 1..=8 of the outputs register.
    Output(u8),
    RegisterOutputs,
}

impl LoadCellsEvent {
    pub fn subscription(self) -> Result<Subscription, CommandError> {
        let spec = match self {
            Self::Forces => DecoderSpec::new(
                REG_FORCES,
                Extract::Array {
                    scalar: Scalar::S16,
                    offset: 0,
                    count: CHANNEL_COUNT,
                },
            ),
            Self::Input => DecoderSpec::new(REG_INPUT, Extract::StampedIs { byte: 0, value: 1 }),
            Self::OutputPeriodicToggle => DecoderSpec::new(
                REG_OUTPUT_PERIODIC_TOGGLE,
                Extract::StampedIs { byte: 0, value: 1 },
            ),
            Self::Output(n) => {
                Range::reject("Output", 1.0, 8.0).apply(f64::from(n))?;
                DecoderSpec::new(REG_OUTPUTS, Extract::bit(usize::from(n / 8), n % 8)).distinct()
            }
            // The device reports the outputs mirror on the input register.
            Self::RegisterOutputs => DecoderSpec::new(REG_INPUT, Extract::raw(Scalar::U16)),
        };
        Ok(Subscription::Decode(spec))
    }
}
