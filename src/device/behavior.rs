//! Behavior board: pokes, valves, LEDs, RGBs, digital outputs, PWM, cameras,
//! servos and a quadrature counter.
//!
//! Outputs register bit layout:
//! ```text
//!  0  1  2  3   4   5   6    7    8    9    10   11   12   13
//!  P0 P1 P2 V0  V1  V2  Led0 Led1 Rgb0 Rgb1 Dig0 Dig1 Dig2 Dig3
//! ```
//! Port n and poke n LED share bit n.

use crate::command::{self, Frames, Scoped};
use crate::error::CommandError;
use crate::event::{DecoderSpec, Extract, Scalar, Subscription};
use crate::mask::{RegisterGroup, SelectorBit, SelectorTable};
use crate::payload::PayloadType;
use crate::register::{Access, RegisterMap, RegisterSpec};

// ---------------------------------------------------------------------------
// Registers
// ---------------------------------------------------------------------------

pub const REG_INPUTS: u8 = 32;
pub const REG_OUTPUT_SET: u8 = 34;
pub const REG_OUTPUT_CLEAR: u8 = 35;
pub const REG_OUTPUT_TOGGLE: u8 = 36;
pub const REG_ANALOG: u8 = 44;
pub const REG_PULSE_PERIOD_BASE: u8 = 46;
pub const REG_PWM_FREQUENCY_BASE: u8 = 60;
pub const REG_PWM_DUTY_CYCLE_BASE: u8 = 64;
pub const REG_PWM_START: u8 = 68;
pub const REG_PWM_STOP: u8 = 69;
pub const REG_RGBS: u8 = 70;
pub const REG_RGB_BASE: u8 = 71;
pub const REG_LED_CURRENT_BASE: u8 = 73;
pub const REG_CAMERA_START: u8 = 78;
pub const REG_CAMERA_STOP: u8 = 79;
pub const REG_SERVO_ENABLE: u8 = 80;
pub const REG_SERVO_DISABLE: u8 = 81;
pub const REG_CAMERA0_FRAME: u8 = 92;
pub const REG_CAMERA1_FRAME: u8 = 94;
pub const REG_SERVO_POSITION_BASE: u8 = 101;
pub const REG_ENCODER_RESET: u8 = 108;

pub const REGISTERS: RegisterMap = RegisterMap::new(
    "Behavior",
    &[
        RegisterSpec::new(REG_INPUTS, PayloadType::U8, 1, Access::READ_EVENT),
        RegisterSpec::new(REG_OUTPUT_SET, PayloadType::U16, 1, Access::READ_WRITE),
        RegisterSpec::new(REG_OUTPUT_CLEAR, PayloadType::U16, 1, Access::READ_WRITE),
        RegisterSpec::new(REG_OUTPUT_TOGGLE, PayloadType::U16, 1, Access::READ_WRITE),
        RegisterSpec::new(REG_PWM_START, PayloadType::U8, 1, Access::READ_WRITE),
        RegisterSpec::new(REG_PWM_STOP, PayloadType::U8, 1, Access::READ_WRITE),
        RegisterSpec::new(REG_RGBS, PayloadType::U8, 6, Access::READ_WRITE),
        RegisterSpec::new(REG_RGB_BASE, PayloadType::U8, 3, Access::READ_WRITE),
        RegisterSpec::new(REG_RGB_BASE + 1, PayloadType::U8, 3, Access::READ_WRITE),
        RegisterSpec::new(REG_CAMERA_START, PayloadType::U8, 1, Access::READ_WRITE),
        RegisterSpec::new(REG_CAMERA_STOP, PayloadType::U8, 1, Access::READ_WRITE),
        RegisterSpec::new(REG_SERVO_ENABLE, PayloadType::U8, 1, Access::READ_WRITE),
        RegisterSpec::new(REG_SERVO_DISABLE, PayloadType::U8, 1, Access::READ_WRITE),
        RegisterSpec::new(REG_CAMERA0_FRAME, PayloadType::U8, 1, Access::ALL),
        RegisterSpec::new(REG_CAMERA1_FRAME, PayloadType::U8, 1, Access::ALL),
        RegisterSpec::new(REG_ENCODER_RESET, PayloadType::U8, 1, Access::READ_WRITE),
    ],
);

// ---------------------------------------------------------------------------
// Output selectors
// ---------------------------------------------------------------------------

pub const PORT0: u32 = 1 << 0;
pub const POKE0_LED: u32 = 1 << 1;
pub const POKE0_VALVE: u32 = 1 << 2;
pub const PORT1: u32 = 1 << 3;
pub const POKE1_LED: u32 = 1 << 4;
pub const POKE1_VALVE: u32 = 1 << 5;
pub const PORT2: u32 = 1 << 6;
pub const POKE2_LED: u32 = 1 << 7;
pub const POKE2_VALVE: u32 = 1 << 8;
pub const LED0: u32 = 1 << 22;
pub const LED1: u32 = 1 << 23;
pub const RGB0: u32 = 1 << 24;
pub const RGB1: u32 = 1 << 25;
pub const DIGITAL0: u32 = 1 << 26;
pub const DIGITAL1: u32 = 1 << 27;
pub const DIGITAL2: u32 = 1 << 28;
pub const DIGITAL3: u32 = 1 << 29;

const DIGITALS: u32 = DIGITAL0 | DIGITAL1 | DIGITAL2 | DIGITAL3;
/// Bit of `DIGITAL0` in the outputs register.
const DIGITAL_SHIFT: u8 = 10;

pub const OUTPUTS: SelectorTable = SelectorTable::new(&[
    SelectorBit::new("Port0", PORT0, RegisterGroup::Outputs, 0),
    SelectorBit::new("Poke0Led", POKE0_LED, RegisterGroup::Outputs, 0),
    SelectorBit::new("Poke0Valve", POKE0_VALVE, RegisterGroup::Outputs, 3),
    SelectorBit::new("Port1", PORT1, RegisterGroup::Outputs, 1),
    SelectorBit::new("Poke1Led", POKE1_LED, RegisterGroup::Outputs, 1),
    SelectorBit::new("Poke1Valve", POKE1_VALVE, RegisterGroup::Outputs, 4),
    SelectorBit::new("Port2", PORT2, RegisterGroup::Outputs, 2),
    SelectorBit::new("Poke2Led", POKE2_LED, RegisterGroup::Outputs, 2),
    SelectorBit::new("Poke2Valve", POKE2_VALVE, RegisterGroup::Outputs, 5),
    SelectorBit::new("Led0", LED0, RegisterGroup::Outputs, 6),
    SelectorBit::new("Led1", LED1, RegisterGroup::Outputs, 7),
    SelectorBit::new("Rgb0", RGB0, RegisterGroup::Outputs, 8),
    SelectorBit::new("Rgb1", RGB1, RegisterGroup::Outputs, 9),
    SelectorBit::new("Digital0", DIGITAL0, RegisterGroup::Outputs, 10),
    SelectorBit::new("Digital1", DIGITAL1, RegisterGroup::Outputs, 11),
    SelectorBit::new("Digital2", DIGITAL2, RegisterGroup::Outputs, 12),
    SelectorBit::new("Digital3", DIGITAL3, RegisterGroup::Outputs, 13),
]);

const PULSE_PERIOD: Scoped =
    Scoped::new(REG_PULSE_PERIOD_BASE, 0, 1, OUTPUTS_ALL, "only one output can be selected");
const PWM_FREQUENCY: Scoped = Scoped::new(
    REG_PWM_FREQUENCY_BASE,
    DIGITAL_SHIFT,
    1,
    DIGITALS,
    "only one of Digital0, Digital1, Digital2, Digital3",
);
const PWM_DUTY_CYCLE: Scoped = Scoped::new(
    REG_PWM_DUTY_CYCLE_BASE,
    DIGITAL_SHIFT,
    1,
    DIGITALS,
    "only one of Digital0, Digital1, Digital2, Digital3",
);
const LED_CURRENT: Scoped =
    Scoped::new(REG_LED_CURRENT_BASE, 6, 1, LED0 | LED1, "only one of Led0, Led1");
const COLORS_RGB: Scoped = Scoped::new(REG_RGB_BASE, 8, 1, RGB0 | RGB1, "only one of Rgb0, Rgb1");
const SERVO_POSITION: Scoped = Scoped::new(
    REG_SERVO_POSITION_BASE,
    12,
    2,
    DIGITAL2 | DIGITAL3,
    "only one of Digital2, Digital3",
);
const QUADRATURE: Scoped = Scoped::new(REG_ANALOG, 2, 1, PORT2, "only Port2");

const OUTPUTS_ALL: u32 = PORT0
    | POKE0_LED
    | POKE0_VALVE
    | PORT1
    | POKE1_LED
    | POKE1_VALVE
    | PORT2
    | POKE2_LED
    | POKE2_VALVE
    | LED0
    | LED1
    | RGB0
    | RGB1
    | DIGITALS;

// ---------------------------------------------------------------------------
// Input selectors
// ---------------------------------------------------------------------------

pub const POKE0_IR: u32 = 1 << 1;
pub const POKE1_IR: u32 = 1 << 4;
pub const POKE2_IR: u32 = 1 << 7;

pub const INPUTS: SelectorTable = SelectorTable::new(&[
    SelectorBit::new("Port0", PORT0, RegisterGroup::Ports, 0),
    SelectorBit::new("Poke0InfraRedBeam", POKE0_IR, RegisterGroup::Ports, 0),
    SelectorBit::new("Port1", PORT1, RegisterGroup::Ports, 1),
    SelectorBit::new("Poke1InfraRedBeam", POKE1_IR, RegisterGroup::Ports, 1),
    SelectorBit::new("Port2", PORT2, RegisterGroup::Ports, 2),
    SelectorBit::new("Poke2InfraRedBeam", POKE2_IR, RegisterGroup::Ports, 2),
    SelectorBit::new("Digital0", DIGITAL0, RegisterGroup::Outputs, 10),
    SelectorBit::new("Digital1", DIGITAL1, RegisterGroup::Outputs, 11),
    SelectorBit::new("Digital2", DIGITAL2, RegisterGroup::Outputs, 12),
    SelectorBit::new("Digital3", DIGITAL3, RegisterGroup::Outputs, 13),
]);

const INPUT_PORTS: u32 = PORT0 | PORT1 | PORT2 | POKE0_IR | POKE1_IR | POKE2_IR;
const CAMERA_FRAME: Scoped =
    Scoped::new(REG_CAMERA0_FRAME, 10, 2, DIGITAL0 | DIGITAL1, "only one of Digital0, Digital1");

/// ADC counts to volts at the board input (~3972 counts for 5 V).
const ANALOG_VOLTS_PER_COUNT: f64 = 5.0 / 3972.0;

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

/// How selector-scoped writes treat a selector with several bits set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BehaviorRevision {
    /// Exactly one selector bit; one frame.
    #[default]
    Exclusive,
    /// Any allowed bits; one frame per selected register.
    FanOut,
}

#[derive(Debug, Clone, PartialEq)]
pub enum BehaviorCommand {
    SetOutput(u32),
    ClearOutput(u32),
    ToggleOutput(u32),
    RegisterSetOutputs(u16),
    RegisterClearOutputs(u16),
    RegisterToggleOutputs(u16),
    /// Pulse length in ms.
    PulsePeriod { selector: u32, millis: u16 },
    StartPwm(u32),
    StopPwm(u32),
    PwmFrequency { selector: u32, hertz: u16 },
    PwmDutyCycle { selector: u32, percent: u8 },
    RegisterStartPwm(u8),
    RegisterStopPwm(u8),
    LedCurrent { selector: u32, milliamps: u8 },
    /// One RGB triple.
    ColorsRgb { selector: u32, rgb: Vec<u8> },
    /// Both RGB LEDs, six bytes.
    ColorsRgbs(Vec<u8>),
    StartCamera(u32),
    StopCamera(u32),
    EnableServo(u32),
    DisableServo(u32),
    ServoPosition { selector: u32, position: u16 },
    UpdateQuadratureCounter { selector: u32, value: i16 },
    ResetQuadratureCounter(u32),
}

impl BehaviorCommand {
    pub fn encode(&self) -> Result<Frames, CommandError> {
        self.encode_with(BehaviorRevision::default())
    }

    pub fn encode_with(&self, revision: BehaviorRevision) -> Result<Frames, CommandError> {
        use BehaviorCommand::*;
        let frames = match self {
            SetOutput(sel) => Frames::single(command::write_u16(REG_OUTPUT_SET, outputs(*sel)?)),
            ClearOutput(sel) => Frames::single(command::write_u16(REG_OUTPUT_CLEAR, outputs(*sel)?)),
            ToggleOutput(sel) => Frames::single(command::write_u16(REG_OUTPUT_TOGGLE, outputs(*sel)?)),
            RegisterSetOutputs(v) => Frames::single(command::write_u16(REG_OUTPUT_SET, *v)),
            RegisterClearOutputs(v) => Frames::single(command::write_u16(REG_OUTPUT_CLEAR, *v)),
            RegisterToggleOutputs(v) => Frames::single(command::write_u16(REG_OUTPUT_TOGGLE, *v)),
            PulsePeriod { selector, millis } => {
                Frames::of(scoped(&PULSE_PERIOD, *selector, revision)?, *millis)
            }
            StartPwm(sel) => Frames::single(command::write_u8(REG_PWM_START, digitals(*sel, DIGITALS, PWM_SET)?)),
            StopPwm(sel) => Frames::single(command::write_u8(REG_PWM_STOP, digitals(*sel, DIGITALS, PWM_SET)?)),
            PwmFrequency { selector, hertz } => {
                Frames::of(scoped(&PWM_FREQUENCY, *selector, revision)?, *hertz)
            }
            PwmDutyCycle { selector, percent } => {
                Frames::of(scoped(&PWM_DUTY_CYCLE, *selector, revision)?, *percent)
            }
            RegisterStartPwm(v) => Frames::single(command::write_u8(REG_PWM_START, *v)),
            RegisterStopPwm(v) => Frames::single(command::write_u8(REG_PWM_STOP, *v)),
            LedCurrent { selector, milliamps } => {
                Frames::of(scoped(&LED_CURRENT, *selector, revision)?, *milliamps)
            }
            ColorsRgb { selector, rgb } => {
                let payload = command::zero_filled(REG_RGB_BASE, rgb, 3)?.payload().to_vec();
                Frames::new(scoped(&COLORS_RGB, *selector, revision)?, PayloadType::U8, payload)?
            }
            ColorsRgbs(rgbs) => Frames::single(command::zero_filled(REG_RGBS, rgbs, 6)?),
            StartCamera(sel) => Frames::single(command::write_u8(
                REG_CAMERA_START,
                digitals(*sel, DIGITAL0 | DIGITAL1, CAMERA_SET)?,
            )),
            StopCamera(sel) => Frames::single(command::write_u8(
                REG_CAMERA_STOP,
                digitals(*sel, DIGITAL0 | DIGITAL1, CAMERA_SET)?,
            )),
            EnableServo(sel) => Frames::single(command::write_u8(
                REG_SERVO_ENABLE,
                digitals(*sel, DIGITAL2 | DIGITAL3, SERVO_SET)?,
            )),
            DisableServo(sel) => Frames::single(command::write_u8(
                REG_SERVO_DISABLE,
                digitals(*sel, DIGITAL2 | DIGITAL3, SERVO_SET)?,
            )),
            ServoPosition { selector, position } => {
                Frames::of(scoped(&SERVO_POSITION, *selector, revision)?, *position)
            }
            UpdateQuadratureCounter { selector, value } => {
                let address = QUADRATURE.target(&OUTPUTS, *selector)?;
                Frames::single(command::write_s16(address, *value))
            }
            ResetQuadratureCounter(sel) => {
                OUTPUTS.single(*sel, PORT2, "only Port2")?;
                Frames::single(command::write_u8(REG_ENCODER_RESET, 1 << 2))
            }
        };
        Ok(frames)
    }
}

const PWM_SET: &str = "any combination of Digital0, Digital1, Digital2, Digital3";
const CAMERA_SET: &str = "any combination of Digital0, Digital1";
const SERVO_SET: &str = "any combination of Digital2, Digital3";

fn outputs(selector: u32) -> Result<u16, CommandError> {
    Ok(OUTPUTS.decompose(selector)?.value as u16)
}

/// Digital outputs as a nibble, bit 0 = Digital0.
fn digitals(selector: u32, allowed: u32, description: &'static str) -> Result<u8, CommandError> {
    let phys = OUTPUTS.subset(selector, allowed, description)?;
    Ok((phys.value >> DIGITAL_SHIFT) as u8)
}

fn scoped(family: &Scoped, selector: u32, revision: BehaviorRevision) -> Result<Vec<u8>, CommandError> {
    match revision {
        BehaviorRevision::Exclusive => Ok(vec![family.target(&OUTPUTS, selector)?]),
        BehaviorRevision::FanOut => family.targets(&OUTPUTS, selector),
    }
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BehaviorEvent {
    /// One port or poke beam, distinct.
    Input(u32),
    /// Volts.
    AnalogInput,
    QuadratureCounter(u32),
    /// Frame acquired on Digital0 or Digital1.
    Camera(u32),
    RegisterInputs,
    RegisterAnalogInput,
    RegisterCamera(u32),
}

impl BehaviorEvent {
    pub fn subscription(self) -> Result<Subscription, CommandError> {
        use BehaviorEvent::*;
        let spec = match self {
            Input(sel) => {
                let row = INPUTS.single(sel, INPUT_PORTS, "only one port or poke beam")?;
                DecoderSpec::new(REG_INPUTS, Extract::bit(0, row.bit)).distinct()
            }
            AnalogInput => DecoderSpec::new(
                REG_ANALOG,
                Extract::scaled(Scalar::U16, 0, ANALOG_VOLTS_PER_COUNT),
            ),
            QuadratureCounter(sel) => {
                INPUTS.single(sel, PORT2, "only Port2")?;
                DecoderSpec::new(REG_ANALOG, Extract::Int { scalar: Scalar::S16, offset: 2 })
            }
            Camera(sel) => DecoderSpec::new(CAMERA_FRAME.target(&INPUTS, sel)?, Extract::Constant),
            RegisterInputs => DecoderSpec::new(REG_INPUTS, Extract::raw(Scalar::U8)),
            RegisterAnalogInput => DecoderSpec::new(REG_ANALOG, Extract::raw(Scalar::U16)),
            RegisterCamera(sel) => {
                DecoderSpec::new(CAMERA_FRAME.target(&INPUTS, sel)?, Extract::raw(Scalar::U8))
            }
        };
        Ok(Subscription::Decode(spec))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
