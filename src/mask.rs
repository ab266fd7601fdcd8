//! Logical selector to physical register bit decomposition.
//!
//! Callers pick resources with a logical selector bitmask (`PORT0 | LED1`).
//! Each device family owns a [`SelectorTable`] that maps every selector bit to
//! a physical register group and bit position; every command that takes a
//! selector resolves it here.

use crate::error::CommandError;

/// Physical register a selector bit lands in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegisterGroup {
    Outputs,
    Leds,
    Ports,
}

/// One row of a selector table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectorBit {
    pub name: &'static str,
    /// Logical selector bit (a single set bit).
    pub selector: u32,
    pub group: RegisterGroup,
    /// Bit position inside the physical register.
    pub bit: u8,
}

impl SelectorBit {
    pub const fn new(name: &'static str, selector: u32, group: RegisterGroup, bit: u8) -> Self {
        Self {
            name,
            selector,
            group,
            bit,
        }
    }

    /// Physical register value with only this bit set.
    pub fn physical(&self) -> u32 {
        1 << self.bit
    }
}

/// Validated physical register value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Physical {
    pub group: RegisterGroup,
    pub value: u32,
}

/// Static selector table for one device family.
#[derive(Debug, Clone, Copy)]
pub struct SelectorTable {
    entries: &'static [SelectorBit],
}

impl SelectorTable {
    pub const fn new(entries: &'static [SelectorBit]) -> Self {
        Self { entries }
    }

    /// Union of every selector bit this table knows.
    pub fn known(&self) -> u32 {
        self.entries.iter().fold(0, |acc, e| acc | e.selector)
    }

    pub fn lookup(&self, selector: u32) -> Option<&SelectorBit> {
        self.entries.iter().find(|e| e.selector == selector)
    }

    /// Rows for every bit set in `selector`, in table order.
    pub fn bits(&self, selector: u32) -> impl Iterator<Item = &SelectorBit> + '_ {
        self.entries.iter().filter(move |e| selector & e.selector != 0)
    }

    /// Resolve a selector into one physical register value.
    ///
    /// Fails when no bit is set, when a bit is not in the table, or when the
    /// selected bits span more than one physical register.
    pub fn decompose(&self, selector: u32) -> Result<Physical, CommandError> {
        self.subset(selector, self.known(), "any combination of known selectors in one register")
    }

    /// Exactly one bit, drawn from `allowed`.
    pub fn single(
        &self,
        selector: u32,
        allowed: u32,
        description: &'static str,
    ) -> Result<&SelectorBit, CommandError> {
        let invalid = CommandError::InvalidSelector {
            selector,
            allowed: description,
        };
        if selector.count_ones() != 1 || selector & !allowed != 0 {
            return Err(invalid);
        }
        self.lookup(selector).ok_or(invalid)
    }

    /// Any non-empty combination of bits drawn from `allowed`, all in one register.
    pub fn subset(
        &self,
        selector: u32,
        allowed: u32,
        description: &'static str,
    ) -> Result<Physical, CommandError> {
        let invalid = || CommandError::InvalidSelector {
            selector,
            allowed: description,
        };
        if selector == 0 || selector & !(allowed & self.known()) != 0 {
            return Err(invalid());
        }
        let mut group = None;
        let mut value = 0u32;
        for row in self.bits(selector) {
            match group {
                None => group = Some(row.group),
                Some(g) if g != row.group => return Err(invalid()),
                Some(_) => {}
            }
            value |= row.physical();
        }
        let group = group.ok_or_else(invalid)?;
        Ok(Physical { group, value })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const A: u32 = 1 << 0;
    const B: u32 = 1 << 1;
    const C: u32 = 1 << 5;
    const L: u32 = 1 << 9;

    const TABLE: SelectorTable = SelectorTable::new(&[
        SelectorBit::new("A", A, RegisterGroup::Outputs, 0),
        SelectorBit::new("B", B, RegisterGroup::Outputs, 3),
        SelectorBit::new("C", C, RegisterGroup::Outputs, 10),
        SelectorBit::new("L", L, RegisterGroup::Leds, 1),
    ]);

    #[test]
    fn decompose_maps_to_physical_bits() {
        let phys = TABLE.decompose(A | C).unwrap();
        assert_eq!(phys.group, RegisterGroup::Outputs);
        assert_eq!(phys.value, (1 << 0) | (1 << 10));
    }

    #[test]
    fn decompose_rejects_zero_and_unknown() {
        assert!(matches!(
            TABLE.decompose(0),
            Err(CommandError::InvalidSelector { selector: 0, .. })
        ));
        assert!(TABLE.decompose(1 << 30).is_err());
        assert!(TABLE.decompose(A | (1 << 30)).is_err());
    }

    #[test]
    fn decompose_rejects_mixed_groups() {
        assert!(TABLE.decompose(A | L).is_err());
        assert_eq!(TABLE.decompose(L).unwrap().group, RegisterGroup::Leds);
    }

    #[test]
    fn single_requires_exactly_one_allowed_bit() {
        assert_eq!(TABLE.single(B, A | B, "A or B").unwrap().bit, 3);
        assert!(TABLE.single(A | B, A | B, "A or B").is_err());
        assert!(TABLE.single(C, A | B, "A or B").is_err());
        assert!(TABLE.single(0, A | B, "A or B").is_err());
    }

    #[test]
    fn subset_limits_to_allowed() {
        assert_eq!(TABLE.subset(A | B, A | B, "A, B").unwrap().value, 0b1001);
        assert!(TABLE.subset(A | C, A | B, "A, B").is_err());
    }

    #[test]
    fn bits_iterates_in_table_order() {
        let names: Vec<_> = TABLE.bits(C | A).map(|b| b.name).collect();
        assert_eq!(names, vec!["A", "C"]);
    }
}
