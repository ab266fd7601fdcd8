//! WEAR wireless sensor and its basestation.
//!
//! Motion data arrives as nine signed words (accelerometer, gyroscope,
//! magnetometer, three axes each). Version registers are spread over eight
//! addresses and only make sense once a full group has been seen, so they
//! are reassembled with a [`Correlator`](crate::event::Correlator).

use crate::command::{self, Frames};
use crate::error::CommandError;
use crate::event::{CorrelationGroup, DecoderSpec, Extract, Scalar, Subscription};
use crate::payload::PayloadType;
use crate::register::{Access, RegisterMap, RegisterSpec};

pub const REG_ACQUISITION: u8 = 32;
pub const REG_STIMULATION_START: u8 = 33;
pub const REG_MOTION: u8 = 34;
pub const REG_MISC: u8 = 35;
pub const REG_CAMERA0: u8 = 36;
pub const REG_CAMERA1: u8 = 37;
pub const REG_DIGITAL_OUTPUT0: u8 = 38;
pub const REG_DIGITAL_OUTPUT1: u8 = 39;
pub const REG_ACQUISITION_STATUS: u8 = 40;
pub const REG_DEVICE_SELECTED: u8 = 42;
pub const REG_SENSOR_TEMPERATURE: u8 = 43;
pub const REG_TX_RETRIES: u8 = 44;
pub const REG_BATTERY: u8 = 45;
pub const REG_RX_GOOD: u8 = 55;
pub const REG_CAMERA0_START: u8 = 77;
pub const REG_MOTOR0_POSITION: u8 = 80;
pub const REG_CAMERA1_START: u8 = 82;
pub const REG_MOTOR1_POSITION: u8 = 85;

pub const ANALOG_VOLTS_PER_COUNT: f64 = (3.3 / 1.6) / 4096.0;
const ANALOG_MASK: u16 = 0x0FFF;

pub const REGISTERS: RegisterMap = RegisterMap::new(
    "Wear",
    &[
        RegisterSpec::new(REG_ACQUISITION, PayloadType::U8, 1, Access::READ_WRITE),
        RegisterSpec::new(REG_STIMULATION_START, PayloadType::U8, 1, Access::ALL),
        RegisterSpec::new(REG_MOTION, PayloadType::S16, 9, Access::READ_EVENT),
        RegisterSpec::new(REG_MISC, PayloadType::U16, 1, Access::READ_EVENT),
        RegisterSpec::new(REG_CAMERA0, PayloadType::U8, 1, Access::ALL),
        RegisterSpec::new(REG_CAMERA1, PayloadType::U8, 1, Access::ALL),
        RegisterSpec::new(REG_DIGITAL_OUTPUT0, PayloadType::U8, 1, Access::READ_WRITE),
        RegisterSpec::new(REG_DIGITAL_OUTPUT1, PayloadType::U8, 1, Access::READ_WRITE),
        RegisterSpec::new(REG_ACQUISITION_STATUS, PayloadType::U8, 1, Access::READ_EVENT),
        RegisterSpec::new(REG_DEVICE_SELECTED, PayloadType::U8, 1, Access::ALL),
        RegisterSpec::new(REG_SENSOR_TEMPERATURE, PayloadType::U8, 1, Access::READ_EVENT),
        RegisterSpec::new(REG_TX_RETRIES, PayloadType::U16, 1, Access::READ_EVENT),
        RegisterSpec::new(REG_BATTERY, PayloadType::U8, 1, Access::READ_EVENT),
        RegisterSpec::new(REG_RX_GOOD, PayloadType::U8, 1, Access::READ_EVENT),
        RegisterSpec::new(REG_CAMERA0_START, PayloadType::U8, 1, Access::READ_WRITE),
        RegisterSpec::new(REG_MOTOR0_POSITION, PayloadType::U16, 1, Access::READ_WRITE),
        RegisterSpec::new(REG_CAMERA1_START, PayloadType::U8, 1, Access::READ_WRITE),
        RegisterSpec::new(REG_MOTOR1_POSITION, PayloadType::U16, 1, Access::READ_WRITE),
    ],
);

pub const DEVICE_LABELS: &[&str] = &["(0) Wired", "(1) Wireless RF1", "(2) Wireless RF2"];

pub const VERSION_GROUPS: &[CorrelationGroup] = &[
    CorrelationGroup {
        name: "Sensor",
        addresses: &[47, 48, 49, 50],
        format: sensor_versions,
    },
    CorrelationGroup {
        name: "Receiver",
        addresses: &[51, 52, 53, 54],
        format: receiver_versions,
    },
];

fn sensor_versions(v: &[u8]) -> String {
    versions("Sensor", v)
}

fn receiver_versions(v: &[u8]) -> String {
    versions("Sensor Receiver", v)
}

// [fw major, fw minor, hw major, hw minor]
fn versions(who: &str, v: &[u8]) -> String {
    match v {
        [fw_major, fw_minor, hw_major, hw_minor] => format!(
            "{who}: Firmware {fw_major}.{fw_minor}\n{who}: Hardware {hw_major}.{hw_minor}"
        ),
        _ => String::new(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WearCommand {
    StartAcquisition,
    StopAcquisition,
    StartStimulation,
    PositionMotor0(u16),
    PositionMotor1(u16),
    DigitalOutput0(bool),
    DigitalOutput1(bool),
    StartCamera0,
    StopCamera0,
    StartCamera1,
    StopCamera1,
    CameraOutput0(bool),
    CameraOutput1(bool),
}

impl WearCommand {
    pub fn encode(&self) -> Result<Frames, CommandError> {
        use WearCommand::*;
        let msg = match *self {
            StartAcquisition => command::write_u8(REG_ACQUISITION, 1),
            StopAcquisition => command::write_u8(REG_ACQUISITION, 0),
            StartStimulation => command::write_u8(REG_STIMULATION_START, 1),
            PositionMotor0(pos) => command::write_u16(REG_MOTOR0_POSITION, pos),
            PositionMotor1(pos) => command::write_u16(REG_MOTOR1_POSITION, pos),
            DigitalOutput0(on) => command::write_u8(REG_DIGITAL_OUTPUT0, u8::from(on)),
            DigitalOutput1(on) => command::write_u8(REG_DIGITAL_OUTPUT1, u8::from(on)),
            StartCamera0 => command::write_u8(REG_CAMERA0_START, 1),
            StopCamera0 => command::write_u8(REG_CAMERA0_START, 0),
            StartCamera1 => command::write_u8(REG_CAMERA1_START, 1),
            StopCamera1 => command::write_u8(REG_CAMERA1_START, 0),
            CameraOutput0(on) => command::write_u8(REG_CAMERA0, u8::from(on)),
            CameraOutput1(on) => command::write_u8(REG_CAMERA1, u8::from(on)),
        };
        Ok(Frames::single(msg))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WearEvent {
    Motion,
    Accelerometer,
    Gyroscope,
    Magnetometer,
    /// Basestation auxiliary analog input in volts.
    AnalogInput,
    DigitalInput0,
    DigitalInput1,
    DigitalInputs,
    Acquiring,
    DeviceSelected,
    /// Degrees Celsius.
    SensorTemperature,
    /// Retransmissions in the last second.
    TxRetries,
    /// Battery percentage.
    Battery,
    /// Receiver power above -64 dBm.
    RxGood,
    SensorVersions,
    RegisterStimulationStart,
    RegisterMisc,
    RegisterCamera0,
    RegisterCamera1,
    RegisterAcquisitionStatus,
    RegisterDeviceSelected,
    RegisterSensorTemperature,
    RegisterTxRetries,
    RegisterBattery,
    RegisterRxGood,
}

const fn axes(offset: usize) -> Extract {
    Extract::Array {
        scalar: Scalar::S16,
        offset,
        count: 3,
    }
}

impl WearEvent {
    pub fn subscription(self) -> Subscription {
        use WearEvent::*;
        let spec = match self {
            Motion => DecoderSpec::new(
                REG_MOTION,
                Extract::Array {
                    scalar: Scalar::S16,
                    offset: 0,
                    count: 9,
                },
            ),
            Accelerometer => DecoderSpec::new(REG_MOTION, axes(0)),
            Gyroscope => DecoderSpec::new(REG_MOTION, axes(6)),
            Magnetometer => DecoderSpec::new(REG_MOTION, axes(12)),
            AnalogInput => DecoderSpec::new(
                REG_MISC,
                Extract::Scaled {
                    scalar: Scalar::U16,
                    offset: 0,
                    mask: ANALOG_MASK,
                    scale: ANALOG_VOLTS_PER_COUNT,
                    bias: 0.0,
                },
            ),
            DigitalInput0 => DecoderSpec::new(REG_MISC, Extract::bit(1, 6)).distinct(),
            DigitalInput1 => DecoderSpec::new(REG_MISC, Extract::bit(1, 7)).distinct(),
            DigitalInputs => DecoderSpec::new(
                REG_MISC,
                Extract::Bits {
                    scalar: Scalar::U8,
                    offset: 1,
                    first: 0,
                    count: 2,
                },
            ),
            Acquiring => DecoderSpec::new(REG_ACQUISITION_STATUS, Extract::ByteIs { byte: 0, value: 1 })
                .distinct(),
            DeviceSelected => DecoderSpec::new(
                REG_DEVICE_SELECTED,
                Extract::Label {
                    byte: 0,
                    mask: 3,
                    labels: DEVICE_LABELS,
                },
            ),
            SensorTemperature => DecoderSpec::new(
                REG_SENSOR_TEMPERATURE,
                Extract::Scaled {
                    scalar: Scalar::U8,
                    offset: 0,
                    mask: u16::MAX,
                    scale: 256.0 / 340.0,
                    bias: 35.0,
                },
            ),
            TxRetries => DecoderSpec::new(REG_TX_RETRIES, Extract::Int { scalar: Scalar::U16, offset: 0 }),
            Battery => DecoderSpec::new(REG_BATTERY, Extract::Int { scalar: Scalar::U8, offset: 0 }),
            RxGood => DecoderSpec::new(REG_RX_GOOD, Extract::ByteIs { byte: 0, value: 1 }).distinct(),
            SensorVersions => return Subscription::Correlate(VERSION_GROUPS),
            RegisterStimulationStart => DecoderSpec::new(REG_STIMULATION_START, Extract::raw(Scalar::U8)),
            RegisterMisc => DecoderSpec::new(REG_MISC, Extract::raw(Scalar::U16)),
            RegisterCamera0 => DecoderSpec::new(REG_CAMERA0, Extract::raw(Scalar::U8)),
            RegisterCamera1 => DecoderSpec::new(REG_CAMERA1, Extract::raw(Scalar::U8)),
            RegisterAcquisitionStatus => DecoderSpec::new(REG_ACQUISITION_STATUS, Extract::raw(Scalar::U8)),
            RegisterDeviceSelected => DecoderSpec::new(REG_DEVICE_SELECTED, Extract::raw(Scalar::U8)),
            RegisterSensorTemperature => DecoderSpec::new(REG_SENSOR_TEMPERATURE, Extract::raw(Scalar::U8)),
            RegisterTxRetries => DecoderSpec::new(REG_TX_RETRIES, Extract::raw(Scalar::U16)),
            RegisterBattery => DecoderSpec::new(REG_BATTERY, Extract::raw(Scalar::U8)),
            RegisterRxGood => DecoderSpec::new(REG_RX_GOOD, Extract::raw(Scalar::U8)),
        };
        Subscription::Decode(spec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{EventValue, demux};
    use crate::frame::{Message, Timestamp};

    fn ev(address: u8, payload_type: PayloadType, payload: Vec<u8>) -> Message {
        Message::event(address, payload_type, Timestamp::new(5, 0), payload).unwrap()
    }

    fn decode(event: WearEvent, frames: &[Message]) -> Vec<EventValue> {
        demux(frames, event.subscription()).collect()
    }

    #[test]
    fn motion_slices() {
        let mut payload = Vec::new();
        for v in 1i16..=9 {
            payload.extend_from_slice(&v.to_le_bytes());
        }
        let frames = [ev(REG_MOTION, PayloadType::S16, payload)];
        assert_eq!(decode(WearEvent::Gyroscope, &frames), vec![EventValue::Array(vec![4, 5, 6])]);
        assert_eq!(decode(WearEvent::Magnetometer, &frames), vec![EventValue::Array(vec![7, 8, 9])]);
        assert_eq!(decode(WearEvent::Motion, &frames).len(), 1);
    }

    #[test]
    fn misc_register_splits() {
        // analog 0x123, digital input 1 high
        let frames = [ev(REG_MISC, PayloadType::U16, vec![0x23, 0x81])];
        let EventValue::Float(volts) = decode(WearEvent::AnalogInput, &frames)[0] else {
            panic!("expected float")
        };
        assert!((volts - 0x123 as f64 * ANALOG_VOLTS_PER_COUNT).abs() < 1e-12);
        assert_eq!(decode(WearEvent::DigitalInput1, &frames), vec![EventValue::Bool(true)]);
        assert_eq!(decode(WearEvent::DigitalInput0, &frames), vec![EventValue::Bool(false)]);
        assert_eq!(decode(WearEvent::DigitalInputs, &frames), vec![EventValue::Array(vec![1, 0])]);
    }

    #[test]
    fn temperature_formula() {
        let frames = [ev(REG_SENSOR_TEMPERATURE, PayloadType::U8, vec![85])];
        let EventValue::Float(t) = decode(WearEvent::SensorTemperature, &frames)[0] else {
            panic!("expected float")
        };
        assert!((t - (85.0 * 256.0 / 340.0 + 35.0)).abs() < 1e-9);
    }

    #[test]
    fn versions_need_full_group() {
        let frames = [
            ev(47, PayloadType::U8, vec![1]),
            ev(48, PayloadType::U8, vec![2]),
            ev(51, PayloadType::U8, vec![9]),
            ev(49, PayloadType::U8, vec![3]),
            ev(50, PayloadType::U8, vec![4]),
        ];
        assert_eq!(
            decode(WearEvent::SensorVersions, &frames),
            vec![EventValue::Text("Sensor: Firmware 1.2\nSensor: Hardware 3.4".into())]
        );
    }

    #[test]
    fn acquisition_status_changes_only() {
        let frames: Vec<Message> = [1u8, 1, 0, 0, 1]
            .into_iter()
            .map(|b| ev(REG_ACQUISITION_STATUS, PayloadType::U8, vec![b]))
            .collect();
        assert_eq!(
            decode(WearEvent::Acquiring, &frames),
            vec![EventValue::Bool(true), EventValue::Bool(false), EventValue::Bool(true)]
        );
    }

    #[test]
    fn device_selected_label() {
        let frames = [ev(REG_DEVICE_SELECTED, PayloadType::U8, vec![0x06])];
        assert_eq!(
            decode(WearEvent::DeviceSelected, &frames),
            vec![EventValue::Text("(2) Wireless RF2".into())]
        );
    }

    #[test]
    fn digital_outputs_from_bool() {
        let msg = WearCommand::DigitalOutput1(true).encode().unwrap().next().unwrap();
        assert_eq!((msg.address(), msg.payload()), (REG_DIGITAL_OUTPUT1, &[1u8][..]));
        let msg = WearCommand::StopCamera1.encode().unwrap().next().unwrap();
        assert_eq!((msg.address(), msg.payload()), (REG_CAMERA1_START, &[0u8][..]));
    }
}
