//! LED array driver with two independently powered LED banks.
//!
//! Enable/disable pairs share one register: the low two bits enable an
//! index, the next two disable it.

use crate::command::{self, Frames, Range, Scoped};
use crate::error::CommandError;
use crate::event::{DecoderSpec, Extract, Scalar, Subscription};
use crate::mask::{RegisterGroup, SelectorBit, SelectorTable};
use crate::payload::PayloadType;
use crate::register::{Access, RegisterMap, RegisterSpec};

pub const REG_SUPPLY: u8 = 32;
pub const REG_BEHAVIOR: u8 = 33;
pub const REG_ARRAY: u8 = 34;
pub const REG_INPUTS: u8 = 35;
pub const REG_INTENSITY_BASE: u8 = 39;
pub const REG_PWM_FREQUENCY_BASE: u8 = 41;
pub const REG_PWM_DUTY_CYCLE_BASE: u8 = 42;
pub const REG_AUX_OUTPUT: u8 = 61;
pub const REG_AUX_INTENSITY: u8 = 62;
pub const REG_OUTPUT: u8 = 63;

pub const REGISTERS: RegisterMap = RegisterMap::new(
    "LedArray",
    &[
        RegisterSpec::new(REG_SUPPLY, PayloadType::U8, 1, Access::READ_WRITE),
        RegisterSpec::new(REG_BEHAVIOR, PayloadType::U8, 1, Access::READ_WRITE),
        RegisterSpec::new(REG_ARRAY, PayloadType::U8, 1, Access::READ_WRITE),
        RegisterSpec::new(REG_INPUTS, PayloadType::U8, 1, Access::READ_EVENT),
        RegisterSpec::new(REG_INTENSITY_BASE, PayloadType::U8, 1, Access::READ_WRITE),
        RegisterSpec::new(REG_INTENSITY_BASE + 1, PayloadType::U8, 1, Access::READ_WRITE),
        RegisterSpec::new(REG_PWM_FREQUENCY_BASE, PayloadType::Float, 1, Access::READ_WRITE),
        RegisterSpec::new(REG_PWM_FREQUENCY_BASE + 8, PayloadType::Float, 1, Access::READ_WRITE),
        RegisterSpec::new(REG_PWM_DUTY_CYCLE_BASE, PayloadType::Float, 1, Access::READ_WRITE),
        RegisterSpec::new(REG_PWM_DUTY_CYCLE_BASE + 8, PayloadType::Float, 1, Access::READ_WRITE),
        RegisterSpec::new(REG_AUX_OUTPUT, PayloadType::U8, 1, Access::READ_WRITE),
        RegisterSpec::new(REG_AUX_INTENSITY, PayloadType::U8, 1, Access::READ_WRITE),
        RegisterSpec::new(REG_OUTPUT, PayloadType::U8, 1, Access::READ_WRITE),
    ],
);

pub const INDEX0: u32 = 1 << 0;
pub const INDEX1: u32 = 1 << 1;
const INDEXES: u32 = INDEX0 | INDEX1;

pub const SELECTORS: SelectorTable = SelectorTable::new(&[
    SelectorBit::new("Index0", INDEX0, RegisterGroup::Leds, 0),
    SelectorBit::new("Index1", INDEX1, RegisterGroup::Leds, 1),
]);

const ONE_INDEX: &str = "only one of Index0, Index1";
const INTENSITY_TARGET: Scoped = Scoped::new(REG_INTENSITY_BASE, 0, 1, INDEXES, ONE_INDEX);
// Index1 registers sit 8 above Index0's.
const PWM_FREQUENCY_TARGET: Scoped = Scoped::new(REG_PWM_FREQUENCY_BASE, 0, 8, INDEXES, ONE_INDEX);
const PWM_DUTY_CYCLE_TARGET: Scoped = Scoped::new(REG_PWM_DUTY_CYCLE_BASE, 0, 8, INDEXES, ONE_INDEX);

const INTENSITY: Range = Range::clamp("Intensity", 1.0, 120.0);
const AUX_INTENSITY: Range = Range::clamp("AuxiliaryIntensity", 1.0, 120.0);
const PWM_FREQUENCY: Range = Range::reject("PwmFrequency", f64::MIN_POSITIVE, f64::INFINITY);
const PWM_DUTY_CYCLE: Range = Range::reject("PwmDutyCycle", 0.0, 100.0);
const PWM_PULSES: Range = Range::clamp_above("PwmNumberOfPulses", 1.0, 65535.0);

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LedArrayCommand {
    EnableSupply(u32),
    DisableSupply(u32),
    StartBehavior(u32),
    StopBehavior(u32),
    EnableArray(u32),
    DisableArray(u32),
    SetOutput(u32),
    ClearOutput(u32),
    SetAuxiliaryOutput(u32),
    ClearAuxiliaryOutput(u32),
    Intensity { selector: u32, value: i32 },
    AuxiliaryIntensity(i32),
    PwmFrequency { selector: u32, hertz: f32 },
    PwmDutyCycle { selector: u32, percent: f32 },
    PwmNumberOfPulses { selector: u32, pulses: i32 },
}

impl LedArrayCommand {
    pub fn encode(&self) -> Result<Frames, CommandError> {
        use LedArrayCommand::*;
        let msg = match *self {
            EnableSupply(sel) => command::write_u8(REG_SUPPLY, indexes(sel)?),
            DisableSupply(sel) => command::write_u8(REG_SUPPLY, indexes(sel)? << 2),
            StartBehavior(sel) => command::write_u8(REG_BEHAVIOR, indexes(sel)?),
            StopBehavior(sel) => command::write_u8(REG_BEHAVIOR, indexes(sel)? << 2),
            EnableArray(sel) => command::write_u8(REG_ARRAY, indexes(sel)?),
            DisableArray(sel) => command::write_u8(REG_ARRAY, indexes(sel)? << 2),
            SetOutput(sel) => command::write_u8(REG_OUTPUT, indexes(sel)?),
            ClearOutput(sel) => command::write_u8(REG_OUTPUT, indexes(sel)? << 2),
            SetAuxiliaryOutput(sel) => command::write_u8(REG_AUX_OUTPUT, indexes(sel)?),
            ClearAuxiliaryOutput(sel) => command::write_u8(REG_AUX_OUTPUT, indexes(sel)? << 2),
            Intensity { selector, value } => {
                let value = INTENSITY.apply(f64::from(value))? as u8;
                command::write_u8(INTENSITY_TARGET.target(&SELECTORS, selector)?, value)
            }
            AuxiliaryIntensity(value) => {
                let value = AUX_INTENSITY.apply(f64::from(value))? as u8;
                command::write_u8(REG_AUX_INTENSITY, value)
            }
            PwmFrequency { selector, hertz } => {
                PWM_FREQUENCY.apply(f64::from(hertz))?;
                command::write_f32(PWM_FREQUENCY_TARGET.target(&SELECTORS, selector)?, hertz)
            }
            PwmDutyCycle { selector, percent } => {
                PWM_DUTY_CYCLE.apply(f64::from(percent))?;
                command::write_f32(PWM_DUTY_CYCLE_TARGET.target(&SELECTORS, selector)?, percent)
            }
            PwmNumberOfPulses { selector, pulses } => {
                // Firmware takes the pulse count as U16 at the frequency register.
                let pulses = PWM_PULSES.apply(f64::from(pulses))? as u16;
                command::write_u16(PWM_FREQUENCY_TARGET.target(&SELECTORS, selector)?, pulses)
            }
        };
        Ok(Frames::single(msg))
    }
}

fn indexes(selector: u32) -> Result<u8, CommandError> {
    let phys = SELECTORS.subset(selector, INDEXES, "Index0 and/or Index1")?;
    Ok(phys.value as u8)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedArrayEvent {
    Input0,
    Input1,
    RegisterInputs,
}

impl LedArrayEvent {
    pub fn subscription(self) -> Subscription {
        let spec = match self {
            Self::Input0 => DecoderSpec::new(REG_INPUTS, Extract::bit(0, 0)).distinct(),
            Self::Input1 => DecoderSpec::new(REG_INPUTS, Extract::bit(0, 1)).distinct(),
            Self::RegisterInputs => DecoderSpec::new(REG_INPUTS, Extract::raw(Scalar::U8)),
        };
        Subscription::Decode(spec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::Message;

    fn one(cmd: LedArrayCommand) -> Message {
        cmd.encode().unwrap().next().unwrap()
    }

    #[test]
    fn intensity_is_clamped_not_rejected() {
        let msg = one(LedArrayCommand::Intensity { selector: INDEX0, value: 200 });
        assert_eq!(msg.address(), 39);
        assert_eq!(msg.payload(), &[120]);
        let msg = one(LedArrayCommand::Intensity { selector: INDEX1, value: -4 });
        assert_eq!(msg.address(), 40);
        assert_eq!(msg.payload(), &[1]);
    }

    #[test]
    fn intensity_needs_exactly_one_index() {
        assert!(matches!(
            LedArrayCommand::Intensity { selector: INDEX0 | INDEX1, value: 10 }.encode(),
            Err(CommandError::InvalidSelector { .. })
        ));
        assert!(LedArrayCommand::Intensity { selector: 0, value: 10 }.encode().is_err());
    }

    #[test]
    fn disable_shifts_mask() {
        assert_eq!(one(LedArrayCommand::EnableSupply(INDEX0 | INDEX1)).payload(), &[0b0011]);
        assert_eq!(one(LedArrayCommand::DisableSupply(INDEX1)).payload(), &[0b1000]);
        assert_eq!(one(LedArrayCommand::ClearAuxiliaryOutput(INDEX0)).address(), REG_AUX_OUTPUT);
        assert!(LedArrayCommand::EnableArray(0).encode().is_err());
    }

    #[test]
    fn pwm_targets() {
        assert_eq!(one(LedArrayCommand::PwmFrequency { selector: INDEX1, hertz: 10.0 }).address(), 49);
        assert_eq!(one(LedArrayCommand::PwmDutyCycle { selector: INDEX1, percent: 50.0 }).address(), 50);
        assert!(LedArrayCommand::PwmFrequency { selector: INDEX0, hertz: 0.0 }.encode().is_err());
        assert!(LedArrayCommand::PwmDutyCycle { selector: INDEX0, percent: 100.5 }.encode().is_err());
    }

    #[test]
    fn pulses_clamp_above_reject_below() {
        let msg = one(LedArrayCommand::PwmNumberOfPulses { selector: INDEX0, pulses: 100_000 });
        assert_eq!(msg.payload(), &[0xFF, 0xFF]);
        assert!(LedArrayCommand::PwmNumberOfPulses { selector: INDEX0, pulses: 0 }.encode().is_err());
    }
}
