//! Synchronizer: nine digital inputs and a two-bit device address.

use crate::command::{self, Frames, Range};
use crate::error::CommandError;
use crate::event::{DecoderSpec, Extract, Scalar, Subscription};
use crate::payload::PayloadType;
use crate::register::{Access, RegisterMap, RegisterSpec};

pub const REG_INPUTS: u8 = 32;
pub const REG_OUTPUTS: u8 = 33;

pub const INPUT_COUNT: u8 = 9;

pub const REGISTERS: RegisterMap = RegisterMap::new(
    "Synchronizer",
    &[
        RegisterSpec::new(REG_INPUTS, PayloadType::U16, 1, Access::READ_EVENT),
        RegisterSpec::new(REG_OUTPUTS, PayloadType::U8, 1, Access::READ_WRITE),
    ],
);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SynchronizerCommand {
    Outputs(u8),
}

impl SynchronizerCommand {
    pub fn encode(&self) -> Result<Frames, CommandError> {
        let Self::Outputs(bits) = *self;
        Ok(Frames::single(command::write_u8(REG_OUTPUTS, bits)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SynchronizerEvent {
    Inputs,
    Input(u8),
    /// Address switches: `(inputs >> 14) & 0b11`, so bits 14 and 15 of the
    /// U16 inputs register.
    Address,
    RegisterInputs,
}

impl SynchronizerEvent {
    pub fn subscription(self) -> Result<Subscription, CommandError> {
        let spec = match self {
            Self::Inputs => DecoderSpec::new(
                REG_INPUTS,
                Extract::Bits {
                    scalar: Scalar::U16,
                    offset: 0,
                    first: 0,
                    count: INPUT_COUNT,
                },
            ),
            Self::Input(n) => {
                Range::reject("Input", 0.0, f64::from(INPUT_COUNT - 1)).apply(f64::from(n))?;
                DecoderSpec::new(REG_INPUTS, Extract::bit(usize::from(n / 8), n % 8)).distinct()
            }
            Self::Address => DecoderSpec::new(
                REG_INPUTS,
                Extract::Field {
                    byte: 1,
                    shift: 6,
                    mask: 3,
                },
            ),
            Self::RegisterInputs => DecoderSpec::new(REG_INPUTS, Extract::raw(Scalar::U16)),
        };
        Ok(Subscription::Decode(spec))
    }
}
