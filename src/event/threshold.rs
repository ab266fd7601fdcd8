/// Threshold byte patterns and the number of crossed levels they encode.
const LEVELS: [(u8, i32); 4] = [(3, 0), (7, 1), (15, 2), (31, 3)];

/// Returned for any pattern not in the table.
pub const UNMAPPED: i32 = -1;

/// Map a thresholds register byte to its level.
pub fn threshold_level(byte: u8) -> i32 {
    LEVELS
        .iter()
        .find(|(pattern, _)| *pattern == byte)
        .map_or(UNMAPPED, |(_, level)| *level)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table() {
        assert_eq!(threshold_level(3), 0);
        assert_eq!(threshold_level(7), 1);
        assert_eq!(threshold_level(15), 2);
        assert_eq!(threshold_level(31), 3);
    }

    #[test]
    fn everything_else_is_unmapped() {
        for b in [0u8, 1, 2, 4, 5, 6, 8, 16, 30, 63, 255] {
            assert_eq!(threshold_level(b), UNMAPPED, "byte {b}");
        }
    }
}
