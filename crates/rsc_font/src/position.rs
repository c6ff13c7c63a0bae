//! 12 bit atlas coordinates packed into three bytes.
//!
//! | Byte | Bits 7..4  | Bits 3..0  |
//! |------|------------|------------|
//! | 0    | x 7..4     | x 3..0     |
//! | 1    | y 3..0     | x 11..8    |
//! | 2    | y 11..8    | y 7..4     |

/// Largest representable coordinate
pub const MAX_POSITION: u16 = 0x0FFF;

/// Pack `x` and `y`, bits above the low 12 are dropped
pub fn pack_position(x: u16, y: u16) -> [u8; 3] {
    [
        (x & 0xFF) as u8,
        (((y & 0xF) << 4) | ((x >> 8) & 0xF)) as u8,
        ((y >> 4) & 0xFF) as u8,
    ]
}

pub fn unpack_position(bytes: [u8; 3]) -> (u16, u16) {
    let x = u16::from(bytes[0]) | (u16::from(bytes[1] & 0xF) << 8);
    let y = u16::from(bytes[1] >> 4) | (u16::from(bytes[2]) << 4);
    (x, y)
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    use crate::position::{pack_position, unpack_position, MAX_POSITION};

    #[test]
    fn pack_known_values() {
        assert_eq!(pack_position(0x123, 0x456), [0x23, 0x61, 0x45]);
        assert_eq!(pack_position(MAX_POSITION, MAX_POSITION), [0xFF, 0xFF, 0xFF]);
        assert_eq!(unpack_position([0x23, 0x61, 0x45]), (0x123, 0x456));
    }

    proptest! {
        #[test]
        fn unpack_inverts_pack(x in 0..=MAX_POSITION, y in 0..=MAX_POSITION) {
            prop_assert_eq!(unpack_position(pack_position(x, y)), (x, y));
        }
    }
}
