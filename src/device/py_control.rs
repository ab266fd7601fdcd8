//! pyControl breakout: selects what drives the shared BNC2/DIO6B pin.

use crate::command::{self, Frames};
use crate::error::CommandError;
use crate::payload::PayloadType;
use crate::register::{Access, RegisterMap, RegisterSpec};

pub const REG_PIN_SELECT: u8 = 42;

pub const REGISTERS: RegisterMap = RegisterMap::new(
    "PyControl",
    &[RegisterSpec::new(REG_PIN_SELECT, PayloadType::U8, 1, Access::READ_WRITE)],
);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PyControlCommand {
    UseBnc2,
    UseDio6B,
}

impl PyControlCommand {
    pub fn encode(&self) -> Result<Frames, CommandError> {
        let value = match self {
            Self::UseBnc2 => 1,
            Self::UseDio6B => 0,
        };
        Ok(Frames::single(command::write_u8(REG_PIN_SELECT, value)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pin_select() {
        let bnc = PyControlCommand::UseBnc2.encode().unwrap().next().unwrap();
        assert_eq!(bnc.encode(), vec![0x02, 0x05, 42, 0xFF, 0x01, 0x01, 0x32]);
        let dio = PyControlCommand::UseDio6B.encode().unwrap().next().unwrap();
        assert_eq!(dio.payload(), &[0]);
    }
}
