//! Per-device command and event tables.
//!
//! - [`Command`]: writes we send to a device
//! - [`Event`]: decoded values a device reports back
//!
//! Each device module owns its register addresses, a [`RegisterMap`], any
//! selector tables, a `*Command` enum with `encode()`, and a `*Event` enum
//! with `subscription()`. Everything is static data over the engines in
//! [`crate::command`] and [`crate::event`]; no device module touches bytes
//! directly.
//!
//! ## Revisions
//!
//! Devices whose register layout changed between firmware generations carry
//! a revision enum (see [`BehaviorRevision`]). The top-level [`Command`]
//! encodes with the default revision; call the device enum's `encode_with`
//! to pick another.
//!
//! [`RegisterMap`]: crate::register::RegisterMap

pub mod archimedes;
pub mod audio_switch;
pub mod behavior;
pub mod camera;
pub mod led_array;
pub mod load_cells;
pub mod multi_pwm;
pub mod py_control;
pub mod rgb_array;
pub mod synchronizer;
pub mod syringe_pump;
pub mod wear;

pub use archimedes::{ArchimedesCommand, ArchimedesEvent};
pub use audio_switch::{AudioSwitchCommand, AudioSwitchEvent};
pub use behavior::{BehaviorCommand, BehaviorEvent, BehaviorRevision};
pub use camera::{CameraCommand, CameraEvent};
pub use led_array::{LedArrayCommand, LedArrayEvent};
pub use load_cells::{LoadCellsCommand, LoadCellsEvent};
pub use multi_pwm::{MultiPwmCommand, MultiPwmEvent};
pub use py_control::PyControlCommand;
pub use rgb_array::{RgbArrayCommand, RgbArrayEvent};
pub use synchronizer::{SynchronizerCommand, SynchronizerEvent};
pub use syringe_pump::{SyringePumpCommand, SyringePumpEvent};
pub use wear::{WearCommand, WearEvent};

/// Archimedes under its other published name.
pub use archimedes as arquimedes;
pub type ArquimedesCommand = ArchimedesCommand;
pub type ArquimedesEvent = ArchimedesEvent;

use crate::command::Frames;
use crate::error::CommandError;
use crate::event::Subscription;
use crate::frame::Message;
use crate::register::RegisterMap;

/// Which device family a register table belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Device {
    Behavior,
    SyringePump,
    LedArray,
    RgbArray,
    LoadCells,
    Archimedes,
    Camera,
    MultiPwm,
    AudioSwitch,
    Synchronizer,
    PyControl,
    Wear,
}

impl Device {
    pub const ALL: [Device; 12] = [
        Device::Behavior,
        Device::SyringePump,
        Device::LedArray,
        Device::RgbArray,
        Device::LoadCells,
        Device::Archimedes,
        Device::Camera,
        Device::MultiPwm,
        Device::AudioSwitch,
        Device::Synchronizer,
        Device::PyControl,
        Device::Wear,
    ];

    pub fn registers(self) -> &'static RegisterMap {
        match self {
            Device::Behavior => &behavior::REGISTERS,
            Device::SyringePump => &syringe_pump::REGISTERS,
            Device::LedArray => &led_array::REGISTERS,
            Device::RgbArray => &rgb_array::REGISTERS,
            Device::LoadCells => &load_cells::REGISTERS,
            Device::Archimedes => &archimedes::REGISTERS,
            Device::Camera => &camera::REGISTERS,
            Device::MultiPwm => &multi_pwm::REGISTERS,
            Device::AudioSwitch => &audio_switch::REGISTERS,
            Device::Synchronizer => &synchronizer::REGISTERS,
            Device::PyControl => &py_control::REGISTERS,
            Device::Wear => &wear::REGISTERS,
        }
    }
}

// ---------------------------------------------------------------------------
// Command: writes we send to a device
// ---------------------------------------------------------------------------

/// A command for any supported device.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Behavior(BehaviorCommand),
    SyringePump(SyringePumpCommand),
    LedArray(LedArrayCommand),
    RgbArray(RgbArrayCommand),
    LoadCells(LoadCellsCommand),
    Archimedes(ArchimedesCommand),
    Camera(CameraCommand),
    MultiPwm(MultiPwmCommand),
    AudioSwitch(AudioSwitchCommand),
    Synchronizer(SynchronizerCommand),
    PyControl(PyControlCommand),
    Wear(WearCommand),
}

impl Command {
    pub fn device(&self) -> Device {
        match self {
            Command::Behavior(_) => Device::Behavior,
            Command::SyringePump(_) => Device::SyringePump,
            Command::LedArray(_) => Device::LedArray,
            Command::RgbArray(_) => Device::RgbArray,
            Command::LoadCells(_) => Device::LoadCells,
            Command::Archimedes(_) => Device::Archimedes,
            Command::Camera(_) => Device::Camera,
            Command::MultiPwm(_) => Device::MultiPwm,
            Command::AudioSwitch(_) => Device::AudioSwitch,
            Command::Synchronizer(_) => Device::Synchronizer,
            Command::PyControl(_) => Device::PyControl,
            Command::Wear(_) => Device::Wear,
        }
    }

    /// Encode into the write frames for this command. Validation happens
    /// before any frame is produced.
    pub fn encode(&self) -> Result<Frames, CommandError> {
        match self {
            Command::Behavior(c) => c.encode(),
            Command::SyringePump(c) => c.encode(),
            Command::LedArray(c) => c.encode(),
            Command::RgbArray(c) => c.encode(),
            Command::LoadCells(c) => c.encode(),
            Command::Archimedes(c) => c.encode(),
            Command::Camera(c) => c.encode(),
            Command::MultiPwm(c) => c.encode(),
            Command::AudioSwitch(c) => c.encode(),
            Command::Synchronizer(c) => c.encode(),
            Command::PyControl(c) => c.encode(),
            Command::Wear(c) => c.encode(),
        }
    }

    /// Encode straight to wire bytes, one buffer per frame.
    pub fn to_bytes(&self) -> Result<Vec<Vec<u8>>, CommandError> {
        Ok(self.encode()?.map(|m| m.encode()).collect())
    }

    /// Format as a hex debug line: `"Behavior W 45 U16 | 2C 01"`.
    pub fn debug_hex(&self) -> Result<String, CommandError> {
        let lines: Vec<String> = self
            .encode()?
            .map(|m| format!("{:?} {}", self.device(), hex_line(&m)))
            .collect();
        Ok(lines.join("\n"))
    }
}

fn hex_line(msg: &Message) -> String {
    let mut s = format!("W {} {}", msg.address(), msg.payload_type());
    if !msg.payload().is_empty() {
        s.push_str(" |");
        let limit = 20;
        for b in msg.payload().iter().take(limit) {
            s.push_str(&format!(" {b:02X}"));
        }
        if msg.payload().len() > limit {
            s.push_str(" ...");
        }
    }
    s
}

// ---------------------------------------------------------------------------
// Event: values a device reports back
// ---------------------------------------------------------------------------

/// A decodable event for any supported device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    Behavior(BehaviorEvent),
    SyringePump(SyringePumpEvent),
    LedArray(LedArrayEvent),
    RgbArray(RgbArrayEvent),
    LoadCells(LoadCellsEvent),
    Archimedes(ArchimedesEvent),
    Camera(CameraEvent),
    MultiPwm(MultiPwmEvent),
    AudioSwitch(AudioSwitchEvent),
    Synchronizer(SynchronizerEvent),
    Wear(WearEvent),
}

impl Event {
    /// The decoder description for this event. Fails only for indexed
    /// events whose index is out of range.
    pub fn subscription(self) -> Result<Subscription, CommandError> {
        match self {
            Event::Behavior(e) => e.subscription(),
            Event::SyringePump(e) => Ok(e.subscription()),
            Event::LedArray(e) => Ok(e.subscription()),
            Event::RgbArray(e) => Ok(e.subscription()),
            Event::LoadCells(e) => e.subscription(),
            Event::Archimedes(e) => e.subscription(),
            Event::Camera(e) => Ok(e.subscription()),
            Event::MultiPwm(e) => e.subscription(),
            Event::AudioSwitch(e) => e.subscription(),
            Event::Synchronizer(e) => e.subscription(),
            Event::Wear(e) => Ok(e.subscription()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_table_passes_its_own_writes() {
        let cmds = [
            Command::SyringePump(SyringePumpCommand::ProtocolVolume(10.0)),
            Command::LedArray(LedArrayCommand::Intensity {
                selector: led_array::INDEX1,
                value: 50,
            }),
            Command::LoadCells(LoadCellsCommand::Offset { channel: 3, value: 7 }),
            Command::Archimedes(ArchimedesCommand::LoadPosition(100)),
            Command::Wear(WearCommand::PositionMotor1(10)),
        ];
        for cmd in cmds {
            let table = cmd.device().registers();
            for msg in cmd.encode().unwrap() {
                table.validate(&msg).unwrap();
            }
        }
    }

    #[test]
    fn arquimedes_is_archimedes() {
        let a = Command::Archimedes(ArquimedesCommand::HideLever).to_bytes().unwrap();
        assert_eq!(a, vec![vec![0x02, 0x05, 41, 0xFF, 0x01, 0x01, 0x31]]);
        assert_eq!(arquimedes::REG_POS_TARGET, 56);
    }

    #[test]
    fn debug_hex_line() {
        let cmd = Command::SyringePump(SyringePumpCommand::ProtocolNumberOfSteps(300));
        assert_eq!(cmd.debug_hex().unwrap(), "SyringePump W 45 U16 | 2C 01");
    }

    #[test]
    fn invalid_index_fails_subscription() {
        assert!(Event::MultiPwm(MultiPwmEvent::Output(4)).subscription().is_err());
        assert!(Event::Wear(WearEvent::SensorVersions).subscription().is_ok());
    }

    #[test]
    fn line_state_events_are_distinct() {
        let events = [
            Event::Behavior(BehaviorEvent::Input(behavior::PORT0)),
            Event::SyringePump(SyringePumpEvent::Step),
            Event::SyringePump(SyringePumpEvent::Direction),
            Event::SyringePump(SyringePumpEvent::SwitchForward),
            Event::SyringePump(SyringePumpEvent::SwitchReverse),
            Event::SyringePump(SyringePumpEvent::Input),
            Event::LedArray(LedArrayEvent::Input0),
            Event::LedArray(LedArrayEvent::Input1),
            Event::RgbArray(RgbArrayEvent::Input0),
            Event::LoadCells(LoadCellsEvent::Output(3)),
            Event::Archimedes(ArchimedesEvent::LeverIsQuiet),
            Event::Archimedes(ArchimedesEvent::Thresholds),
            Event::Archimedes(ArchimedesEvent::Threshold(2)),
            Event::Archimedes(ArchimedesEvent::Input(1)),
            Event::Camera(CameraEvent::Input0),
            Event::Camera(CameraEvent::Camera0Trig),
            Event::Camera(CameraEvent::Camera1Trig),
            Event::Camera(CameraEvent::Camera0Sync),
            Event::Camera(CameraEvent::Camera1Sync),
            Event::MultiPwm(MultiPwmEvent::Output(2)),
            Event::AudioSwitch(AudioSwitchEvent::Input(0)),
            Event::Synchronizer(SynchronizerEvent::Input(5)),
            Event::Wear(WearEvent::DigitalInput0),
            Event::Wear(WearEvent::DigitalInput1),
            Event::Wear(WearEvent::Acquiring),
            Event::Wear(WearEvent::RxGood),
        ];
        for event in events {
            match event.subscription().unwrap() {
                Subscription::Decode(spec) => assert!(spec.distinct, "{event:?}"),
                Subscription::Correlate(_) => panic!("{event:?} is not a line state"),
            }
        }
    }

    #[test]
    fn tables_have_unique_addresses() {
        for device in Device::ALL {
            let addrs: Vec<u8> = device.registers().iter().map(|r| r.address).collect();
            let mut sorted = addrs.clone();
            sorted.sort_unstable();
            sorted.dedup();
            assert_eq!(sorted.len(), addrs.len(), "{device:?}");
        }
    }
}
