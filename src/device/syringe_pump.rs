//! Syringe pump: stepper motor driver and a configurable dispense protocol.

use crate::command::{self, Frames, Range};
use crate::error::CommandError;
use crate::event::{DecoderSpec, Extract, Subscription};
use crate::payload::PayloadType;
use crate::register::{Access, RegisterMap, RegisterSpec};

pub const REG_ENABLE_MOTOR_DRIVER: u8 = 32;
pub const REG_START_PROTOCOL: u8 = 33;
pub const REG_STEP_STATE: u8 = 34;
pub const REG_DIR_STATE: u8 = 35;
pub const REG_SW_FORWARD_STATE: u8 = 36;
pub const REG_SW_REVERSE_STATE: u8 = 37;
pub const REG_INPUT_STATE: u8 = 38;
pub const REG_SET_DIGITAL_OUTPUTS: u8 = 39;
pub const REG_CLEAR_DIGITAL_OUTPUTS: u8 = 40;
pub const REG_PROTOCOL_NUMBER_OF_STEPS: u8 = 45;
pub const REG_PROTOCOL_FLOW_RATE: u8 = 46;
pub const REG_PROTOCOL_PERIOD: u8 = 47;
pub const REG_PROTOCOL_VOLUME: u8 = 48;

pub const REGISTERS: RegisterMap = RegisterMap::new(
    "SyringePump",
    &[
        RegisterSpec::new(REG_ENABLE_MOTOR_DRIVER, PayloadType::U8, 1, Access::READ_WRITE),
        RegisterSpec::new(REG_START_PROTOCOL, PayloadType::U8, 1, Access::ALL),
        RegisterSpec::new(REG_STEP_STATE, PayloadType::U8, 1, Access::ALL),
        RegisterSpec::new(REG_DIR_STATE, PayloadType::U8, 1, Access::ALL),
        RegisterSpec::new(REG_SW_FORWARD_STATE, PayloadType::U8, 1, Access::READ_EVENT),
        RegisterSpec::new(REG_SW_REVERSE_STATE, PayloadType::U8, 1, Access::READ_EVENT),
        RegisterSpec::new(REG_INPUT_STATE, PayloadType::U8, 1, Access::READ_EVENT),
        RegisterSpec::new(REG_SET_DIGITAL_OUTPUTS, PayloadType::U8, 1, Access::READ_WRITE),
        RegisterSpec::new(REG_CLEAR_DIGITAL_OUTPUTS, PayloadType::U8, 1, Access::READ_WRITE),
        RegisterSpec::new(REG_PROTOCOL_NUMBER_OF_STEPS, PayloadType::U16, 1, Access::READ_WRITE),
        RegisterSpec::new(REG_PROTOCOL_FLOW_RATE, PayloadType::Float, 1, Access::READ_WRITE),
        RegisterSpec::new(REG_PROTOCOL_PERIOD, PayloadType::U16, 1, Access::READ_WRITE),
        RegisterSpec::new(REG_PROTOCOL_VOLUME, PayloadType::Float, 1, Access::READ_WRITE),
    ],
);

const NUMBER_OF_STEPS: Range = Range::reject("ProtocolNumberOfSteps", 1.0, 65535.0);
const STEPS_PERIOD: Range = Range::reject("ProtocolStepsPeriod", 1.0, 65535.0);
const FLOW_RATE: Range = Range::reject("ProtocolFlowRate", 0.5, 2000.0);
const VOLUME: Range = Range::reject("ProtocolVolume", 0.5, 2000.0);

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SyringePumpCommand {
    EnableMotorDriver,
    DisableMotorDriver,
    StartProtocol,
    StopProtocol,
    SetDigitalOutputs(u8),
    ClearDigitalOutputs(u8),
    ProtocolNumberOfSteps(u16),
    /// Milliseconds between steps.
    ProtocolStepsPeriod(u16),
    ProtocolFlowRate(f32),
    ProtocolVolume(f32),
}

impl SyringePumpCommand {
    pub fn encode(&self) -> Result<Frames, CommandError> {
        use SyringePumpCommand::*;
        let msg = match *self {
            EnableMotorDriver => command::write_u8(REG_ENABLE_MOTOR_DRIVER, 1),
            DisableMotorDriver => command::write_u8(REG_ENABLE_MOTOR_DRIVER, 0),
            StartProtocol => command::write_u8(REG_START_PROTOCOL, 1),
            StopProtocol => command::write_u8(REG_START_PROTOCOL, 0),
            SetDigitalOutputs(v) => command::write_u8(REG_SET_DIGITAL_OUTPUTS, v),
            ClearDigitalOutputs(v) => command::write_u8(REG_CLEAR_DIGITAL_OUTPUTS, v),
            ProtocolNumberOfSteps(n) => {
                NUMBER_OF_STEPS.apply(f64::from(n))?;
                command::write_u16(REG_PROTOCOL_NUMBER_OF_STEPS, n)
            }
            ProtocolStepsPeriod(ms) => {
                STEPS_PERIOD.apply(f64::from(ms))?;
                command::write_u16(REG_PROTOCOL_PERIOD, ms)
            }
            ProtocolFlowRate(v) => {
                FLOW_RATE.apply(f64::from(v))?;
                command::write_f32(REG_PROTOCOL_FLOW_RATE, v)
            }
            ProtocolVolume(v) => {
                VOLUME.apply(f64::from(v))?;
                command::write_f32(REG_PROTOCOL_VOLUME, v)
            }
        };
        Ok(Frames::single(msg))
    }
}

/// Pin and switch states; each reports `payload != 0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyringePumpEvent {
    Step,
    Direction,
    SwitchForward,
    SwitchReverse,
    Input,
}

impl SyringePumpEvent {
    pub fn subscription(self) -> Subscription {
        let address = match self {
            Self::Step => REG_STEP_STATE,
            Self::Direction => REG_DIR_STATE,
            Self::SwitchForward => REG_SW_FORWARD_STATE,
            Self::SwitchReverse => REG_SW_REVERSE_STATE,
            Self::Input => REG_INPUT_STATE,
        };
        Subscription::Decode(DecoderSpec::new(address, Extract::NonZero { byte: 0 }).distinct())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec;
    use crate::frame::Message;

    fn one(cmd: SyringePumpCommand) -> Message {
        cmd.encode().unwrap().next().unwrap()
    }

    #[test]
    fn volume_below_minimum_rejected() {
        let err = SyringePumpCommand::ProtocolVolume(0.3).encode().unwrap_err();
        assert!(matches!(
            err,
            CommandError::Domain { register: "ProtocolVolume", min, max, .. } if min == 0.5 && max == 2000.0
        ));
    }

    #[test]
    fn volume_in_range_is_float() {
        let msg = one(SyringePumpCommand::ProtocolVolume(12.5));
        assert_eq!(msg.address(), REG_PROTOCOL_VOLUME);
        assert_eq!(codec::payload_as_float(&msg).unwrap(), 12.5);
    }

    #[test]
    fn flow_rate_bounds() {
        assert!(SyringePumpCommand::ProtocolFlowRate(0.5).encode().is_ok());
        assert!(SyringePumpCommand::ProtocolFlowRate(2000.0).encode().is_ok());
        assert!(SyringePumpCommand::ProtocolFlowRate(2000.5).encode().is_err());
        assert!(SyringePumpCommand::ProtocolFlowRate(f32::NAN).encode().is_err());
    }

    #[test]
    fn steps_must_be_positive() {
        assert!(SyringePumpCommand::ProtocolNumberOfSteps(0).encode().is_err());
        assert!(SyringePumpCommand::ProtocolStepsPeriod(0).encode().is_err());
        let msg = one(SyringePumpCommand::ProtocolNumberOfSteps(200));
        assert_eq!(msg.address(), 45);
        assert_eq!(msg.payload(), &[200, 0]);
    }

    #[test]
    fn protocol_start_stop() {
        assert_eq!(one(SyringePumpCommand::StartProtocol).payload(), &[1]);
        assert_eq!(one(SyringePumpCommand::StopProtocol).payload(), &[0]);
        assert_eq!(one(SyringePumpCommand::DisableMotorDriver).address(), 32);
    }

    #[test]
    fn switch_events_are_non_zero_tests() {
        let Subscription::Decode(spec) = SyringePumpEvent::SwitchReverse.subscription() else {
            panic!("expected decoder");
        };
        assert_eq!(spec.address, 37);
        assert_eq!(spec.extract, Extract::NonZero { byte: 0 });
    }

    #[test]
    fn line_states_report_changes_only() {
        use crate::event::{EventValue, demux};
        use crate::frame::Timestamp;

        for event in [
            SyringePumpEvent::Step,
            SyringePumpEvent::Direction,
            SyringePumpEvent::SwitchForward,
            SyringePumpEvent::SwitchReverse,
            SyringePumpEvent::Input,
        ] {
            let Subscription::Decode(spec) = event.subscription() else {
                panic!("expected decoder");
            };
            assert!(spec.distinct, "{event:?}");
        }

        let frames: Vec<Message> = [1u8, 1, 1, 0, 0, 1]
            .into_iter()
            .enumerate()
            .map(|(i, v)| {
                Message::event(REG_STEP_STATE, PayloadType::U8, Timestamp::new(i as u32, 0), vec![v]).unwrap()
            })
            .collect();
        let got: Vec<_> = demux(&frames, SyringePumpEvent::Step.subscription()).collect();
        assert_eq!(
            got,
            vec![EventValue::Bool(true), EventValue::Bool(false), EventValue::Bool(true)]
        );
    }
}
