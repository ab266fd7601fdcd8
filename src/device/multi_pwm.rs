//! Four-channel PWM generator.

use crate::command::{self, Frames, Range, SetClear};
use crate::error::CommandError;
use crate::event::{DecoderSpec, Extract, Scalar, Subscription};
use crate::payload::PayloadType;
use crate::register::{Access, RegisterMap, RegisterSpec};

pub const REG_TRIGGER_SET: u8 = 60;
pub const REG_TRIGGER_CLEAR: u8 = 61;
pub const REG_ENABLE_OUTPUTS: u8 = 69;
pub const REG_EXEC_STATE: u8 = 73;

pub const CHANNEL_COUNT: u8 = 4;
const CHANNEL_MASK: u8 = 0x0F;

pub const REGISTERS: RegisterMap = RegisterMap::new(
    "MultiPwm",
    &[
        RegisterSpec::new(REG_TRIGGER_SET, PayloadType::U8, 1, Access::READ_WRITE),
        RegisterSpec::new(REG_TRIGGER_CLEAR, PayloadType::U8, 1, Access::READ_WRITE),
        RegisterSpec::new(REG_ENABLE_OUTPUTS, PayloadType::U8, 1, Access::READ_WRITE),
        RegisterSpec::new(REG_EXEC_STATE, PayloadType::U8, 1, Access::READ_EVENT),
    ],
);

const TRIGGER_PAIR: SetClear = SetClear::new(REG_TRIGGER_SET, REG_TRIGGER_CLEAR);
const CHANNEL_INDEX: Range = Range::reject("Trigger", 0.0, (CHANNEL_COUNT - 1) as f64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MultiPwmCommand {
    SetTrigger(u8),
    ClearTrigger(u8),
    /// Bits above the four channels are dropped.
    SetTriggers(u8),
    ClearTriggers(u8),
    EnableOutputs(u8),
}

impl MultiPwmCommand {
    pub fn encode(&self) -> Result<Frames, CommandError> {
        use MultiPwmCommand::*;
        let msg = match *self {
            SetTrigger(n) => TRIGGER_PAIR.encode(true, channel_bit(n)?),
            ClearTrigger(n) => TRIGGER_PAIR.encode(false, channel_bit(n)?),
            SetTriggers(bits) => TRIGGER_PAIR.encode(true, bits & CHANNEL_MASK),
            ClearTriggers(bits) => TRIGGER_PAIR.encode(false, bits & CHANNEL_MASK),
            EnableOutputs(bits) => command::write_u8(REG_ENABLE_OUTPUTS, bits & CHANNEL_MASK),
        };
        Ok(Frames::single(msg))
    }
}

fn channel_bit(n: u8) -> Result<u8, CommandError> {
    CHANNEL_INDEX.apply(f64::from(n))?;
    Ok(1 << n)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MultiPwmEvent {
    /// Running state of one channel.
    Output(u8),
    RegisterOutputs,
}

impl MultiPwmEvent {
    pub fn subscription(self) -> Result<Subscription, CommandError> {
        let spec = match self {
            Self::Output(n) => {
                CHANNEL_INDEX.apply(f64::from(n))?;
                DecoderSpec::new(REG_EXEC_STATE, Extract::bit(0, n)).distinct()
            }
            Self::RegisterOutputs => DecoderSpec::new(REG_EXEC_STATE, Extract::raw(Scalar::U8)),
        };
        Ok(Subscription::Decode(spec))
    }
}
