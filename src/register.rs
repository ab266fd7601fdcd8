//! Static per-register metadata and shape validation.

use crate::error::{Result, WireError};
use crate::frame::{Message, MessageKind};
use crate::payload::PayloadType;

/// Which message kinds a register takes part in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Access(u8);

impl Access {
    pub const READ: Self = Self(1 << 0);
    pub const WRITE: Self = Self(1 << 1);
    pub const EVENT: Self = Self(1 << 2);
    pub const READ_WRITE: Self = Self::READ.union(Self::WRITE);
    pub const READ_EVENT: Self = Self::READ.union(Self::EVENT);
    pub const ALL: Self = Self::READ_WRITE.union(Self::EVENT);

    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    pub fn allows(self, kind: MessageKind) -> bool {
        let bit = match kind {
            MessageKind::Read => Self::READ,
            MessageKind::Write => Self::WRITE,
            MessageKind::Event => Self::EVENT,
        };
        self.0 & bit.0 != 0
    }
}

/// Expected shape of one register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegisterSpec {
    pub address: u8,
    pub payload_type: PayloadType,
    pub element_count: usize,
    pub access: Access,
}

impl RegisterSpec {
    pub const fn new(
        address: u8,
        payload_type: PayloadType,
        element_count: usize,
        access: Access,
    ) -> Self {
        Self {
            address,
            payload_type,
            element_count,
            access,
        }
    }

    /// Payload length in bytes of a full register value.
    pub fn payload_len(&self) -> usize {
        self.payload_type.element_size() * self.element_count
    }

    /// Check a message against this register's direction and shape.
    ///
    /// Read requests and error replies may carry an empty payload.
    pub fn validate(&self, msg: &Message) -> Result<()> {
        if !self.access.allows(msg.kind()) {
            return Err(WireError::AccessDenied {
                address: self.address,
                kind: msg.kind(),
            });
        }
        let empty_ok = msg.kind() == MessageKind::Read || msg.is_error();
        if msg.payload().is_empty() && empty_ok {
            return Ok(());
        }
        if msg.payload_type() != self.payload_type || msg.payload().len() != self.payload_len() {
            return Err(WireError::RegisterShape {
                address: self.address,
                expected_type: self.payload_type,
                expected_count: self.element_count,
                actual_type: msg.payload_type(),
                actual_len: msg.payload().len(),
            });
        }
        Ok(())
    }
}

/// Read-only register table for one device generation.
#[derive(Debug, Clone, Copy)]
pub struct RegisterMap {
    pub device: &'static str,
    registers: &'static [RegisterSpec],
}

impl RegisterMap {
    pub const fn new(device: &'static str, registers: &'static [RegisterSpec]) -> Self {
        Self { device, registers }
    }

    pub fn get(&self, address: u8) -> Option<&RegisterSpec> {
        self.registers.iter().find(|r| r.address == address)
    }

    pub fn iter(&self) -> impl Iterator<Item = &RegisterSpec> {
        self.registers.iter()
    }

    /// Validate a message against its register, if the table knows it.
    ///
    /// Addresses outside the table pass through unchecked; the core registers
    /// shared by every device are not listed per device.
    pub fn validate(&self, msg: &Message) -> Result<()> {
        match self.get(msg.address()) {
            Some(spec) => spec.validate(msg),
            None => Ok(()),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
