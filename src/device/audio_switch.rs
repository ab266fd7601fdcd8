//! Sixteen-channel audio router. Exactly one channel is active at a time.

use crate::command::{self, Frames, Range};
use crate::error::CommandError;
use crate::event::{DecoderSpec, Extract, Scalar, Subscription};
use crate::payload::PayloadType;
use crate::register::{Access, RegisterMap, RegisterSpec};

pub const REG_CHANNELS: u8 = 33;
pub const REG_INPUTS: u8 = 34;
pub const REG_OUTPUT0: u8 = 35;

pub const CHANNEL_COUNT: u8 = 16;
pub const INPUT_COUNT: u8 = 5;

pub const REGISTERS: RegisterMap = RegisterMap::new(
    "AudioSwitch",
    &[
        RegisterSpec::new(REG_CHANNELS, PayloadType::U16, 1, Access::ALL),
        RegisterSpec::new(REG_INPUTS, PayloadType::U8, 1, Access::READ_EVENT),
        RegisterSpec::new(REG_OUTPUT0, PayloadType::U8, 1, Access::READ_WRITE),
    ],
);

const CHANNEL: Range = Range::reject("Channel", 0.0, (CHANNEL_COUNT - 1) as f64);
const INPUT: Range = Range::reject("Input", 0.0, (INPUT_COUNT - 1) as f64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioSwitchCommand {
    /// Route to one channel.
    Channel(u8),
    DisableChannels,
    SetOutput0,
    ClearOutput0,
    RegisterChannels(u16),
}

impl AudioSwitchCommand {
    pub fn encode(&self) -> Result<Frames, CommandError> {
        use AudioSwitchCommand::*;
        let msg = match *self {
            Channel(n) => {
                CHANNEL.apply(f64::from(n))?;
                command::write_u16(REG_CHANNELS, 1 << n)
            }
            DisableChannels => command::write_u16(REG_CHANNELS, 0),
            SetOutput0 => command::write_u8(REG_OUTPUT0, 1),
            ClearOutput0 => command::write_u8(REG_OUTPUT0, 0),
            RegisterChannels(bits) => command::write_u16(REG_CHANNELS, bits),
        };
        Ok(Frames::single(msg))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioSwitchEvent {
    /// Active channel index, or -1 when none or several are set.
    Channel,
    Input(u8),
    RegisterChannels,
    RegisterInputs,
}

impl AudioSwitchEvent {
    pub fn subscription(self) -> Result<Subscription, CommandError> {
        let spec = match self {
            Self::Channel => DecoderSpec::new(
                REG_CHANNELS,
                Extract::OneHot {
                    scalar: Scalar::U16,
                    offset: 0,
                    width: CHANNEL_COUNT,
                },
            ),
            Self::Input(n) => {
                INPUT.apply(f64::from(n))?;
                DecoderSpec::new(REG_INPUTS, Extract::bit(0, n)).distinct()
            }
            Self::RegisterChannels => DecoderSpec::new(REG_CHANNELS, Extract::raw(Scalar::U16)),
            Self::RegisterInputs => DecoderSpec::new(REG_INPUTS, Extract::raw(Scalar::U8)),
        };
        Ok(Subscription::Decode(spec))
    }
}
