//! Dual camera trigger controller with two positioning motors.

use crate::command::{self, Frames, SetClear};
use crate::error::CommandError;
use crate::event::{DecoderSpec, Extract, Subscription};
use crate::mask::{RegisterGroup, SelectorBit, SelectorTable};
use crate::payload::PayloadType;
use crate::register::{Access, RegisterMap, RegisterSpec};

pub const REG_START_CAMERAS: u8 = 32;
pub const REG_STOP_CAMERAS: u8 = 33;
pub const REG_ENABLE_MOTORS: u8 = 34;
pub const REG_DISABLE_MOTORS: u8 = 35;
pub const REG_OUTPUTS_SET: u8 = 36;
pub const REG_OUTPUTS_CLEAR: u8 = 37;
pub const REG_OUTPUTS: u8 = 38;
pub const REG_INPUT0: u8 = 39;
pub const REG_CAM0_TRIG: u8 = 40;
pub const REG_CAM1_TRIG: u8 = 41;
pub const REG_CAM0_SYNC: u8 = 42;
pub const REG_CAM1_SYNC: u8 = 43;
pub const REG_MOTOR0_POSITION: u8 = 52;
pub const REG_MOTOR1_POSITION: u8 = 56;

pub const REGISTERS: RegisterMap = RegisterMap::new(
    "Camera",
    &[
        RegisterSpec::new(REG_START_CAMERAS, PayloadType::U8, 1, Access::READ_WRITE),
        RegisterSpec::new(REG_STOP_CAMERAS, PayloadType::U8, 1, Access::READ_WRITE),
        RegisterSpec::new(REG_ENABLE_MOTORS, PayloadType::U8, 1, Access::READ_WRITE),
        RegisterSpec::new(REG_DISABLE_MOTORS, PayloadType::U8, 1, Access::READ_WRITE),
        RegisterSpec::new(REG_OUTPUTS_SET, PayloadType::U8, 1, Access::READ_WRITE),
        RegisterSpec::new(REG_OUTPUTS_CLEAR, PayloadType::U8, 1, Access::READ_WRITE),
        RegisterSpec::new(REG_OUTPUTS, PayloadType::U8, 1, Access::READ_WRITE),
        RegisterSpec::new(REG_INPUT0, PayloadType::U8, 1, Access::READ_EVENT),
        RegisterSpec::new(REG_CAM0_TRIG, PayloadType::U8, 1, Access::READ_EVENT),
        RegisterSpec::new(REG_CAM1_TRIG, PayloadType::U8, 1, Access::READ_EVENT),
        RegisterSpec::new(REG_CAM0_SYNC, PayloadType::U8, 1, Access::READ_EVENT),
        RegisterSpec::new(REG_CAM1_SYNC, PayloadType::U8, 1, Access::READ_EVENT),
        RegisterSpec::new(REG_MOTOR0_POSITION, PayloadType::U16, 1, Access::READ_WRITE),
        RegisterSpec::new(REG_MOTOR1_POSITION, PayloadType::U16, 1, Access::READ_WRITE),
    ],
);

pub const CAMERA0: u32 = 1 << 0;
pub const CAMERA1: u32 = 1 << 1;
pub const MOTOR0: u32 = 1 << 2;
pub const MOTOR1: u32 = 1 << 3;

pub const OUT_TRIG0: u32 = 1 << 8;
pub const OUT_SYNC0: u32 = 1 << 9;
pub const OUT_TRIG1: u32 = 1 << 10;
pub const OUT_SYNC1: u32 = 1 << 11;

pub const SELECTORS: SelectorTable = SelectorTable::new(&[
    SelectorBit::new("Camera0", CAMERA0, RegisterGroup::Ports, 0),
    SelectorBit::new("Camera1", CAMERA1, RegisterGroup::Ports, 1),
    SelectorBit::new("Motor0", MOTOR0, RegisterGroup::Ports, 0),
    SelectorBit::new("Motor1", MOTOR1, RegisterGroup::Ports, 1),
    SelectorBit::new("OutTrig0", OUT_TRIG0, RegisterGroup::Outputs, 0),
    SelectorBit::new("OutSync0", OUT_SYNC0, RegisterGroup::Outputs, 1),
    SelectorBit::new("OutTrig1", OUT_TRIG1, RegisterGroup::Outputs, 2),
    SelectorBit::new("OutSync1", OUT_SYNC1, RegisterGroup::Outputs, 3),
]);

const CAMERAS: u32 = CAMERA0 | CAMERA1;
const MOTORS: u32 = MOTOR0 | MOTOR1;
const OUTPUT_LINES: u32 = OUT_TRIG0 | OUT_SYNC0 | OUT_TRIG1 | OUT_SYNC1;

const OUTPUT_PAIR: SetClear = SetClear::new(REG_OUTPUTS_SET, REG_OUTPUTS_CLEAR);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraCommand {
    /// Any combination of `CAMERA0`, `CAMERA1`.
    StartCameras(u32),
    StopCameras(u32),
    /// Any combination of `MOTOR0`, `MOTOR1`.
    EnableMotors(u32),
    DisableMotors(u32),
    PositionMotor0(u16),
    PositionMotor1(u16),
    /// Drive trigger/sync output lines high or low.
    Output { selector: u32, on: bool },
    Outputs(u8),
}

impl CameraCommand {
    pub fn encode(&self) -> Result<Frames, CommandError> {
        use CameraCommand::*;
        let msg = match *self {
            StartCameras(sel) => command::write_u8(REG_START_CAMERAS, select(sel, CAMERAS, "Camera0 and/or Camera1")?),
            StopCameras(sel) => command::write_u8(REG_STOP_CAMERAS, select(sel, CAMERAS, "Camera0 and/or Camera1")?),
            EnableMotors(sel) => command::write_u8(REG_ENABLE_MOTORS, select(sel, MOTORS, "Motor0 and/or Motor1")?),
            DisableMotors(sel) => command::write_u8(REG_DISABLE_MOTORS, select(sel, MOTORS, "Motor0 and/or Motor1")?),
            PositionMotor0(pos) => command::write_u16(REG_MOTOR0_POSITION, pos),
            PositionMotor1(pos) => command::write_u16(REG_MOTOR1_POSITION, pos),
            Output { selector, on } => {
                OUTPUT_PAIR.encode(on, select(selector, OUTPUT_LINES, "trigger and sync outputs")?)
            }
            Outputs(bits) => command::write_u8(REG_OUTPUTS, bits),
        };
        Ok(Frames::single(msg))
    }
}

fn select(selector: u32, allowed: u32, description: &'static str) -> Result<u8, CommandError> {
    Ok(SELECTORS.subset(selector, allowed, description)?.value as u8)
}

/// Line states; each reports bit 0 of its register when it changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraEvent {
    Input0,
    Camera0Trig,
    Camera1Trig,
    Camera0Sync,
    Camera1Sync,
}

impl CameraEvent {
    pub fn subscription(self) -> Subscription {
        let address = match self {
            Self::Input0 => REG_INPUT0,
            Self::Camera0Trig => REG_CAM0_TRIG,
            Self::Camera1Trig => REG_CAM1_TRIG,
            Self::Camera0Sync => REG_CAM0_SYNC,
            Self::Camera1Sync => REG_CAM1_SYNC,
        };
        Subscription::Decode(DecoderSpec::new(address, Extract::bit(0, 0)).distinct())
    }
}
