//! Host byte order detection and packed 24-bit PCM helpers.
//!
//! Every byte-order dependent operation in the crate goes through this module.
//! The host order is probed once at runtime, never assumed at compile time.

use std::sync::LazyLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endianness {
    Little,
    Big,
}

static HOST: LazyLock<Endianness> = LazyLock::new(|| {
    let probe = 0x0102_0304u32.to_ne_bytes();
    let order = if probe[0] == 0x01 {
        Endianness::Big
    } else {
        Endianness::Little
    };
    tracing::debug!("Host byte order: {:?}", order);
    order
});

impl Endianness {
    pub fn host() -> Self {
        *HOST
    }

    pub fn is_big(self) -> bool {
        self == Endianness::Big
    }

    /// Offset of the three most significant bytes inside a native `i32`.
    fn int24_offset(self) -> usize {
        usize::from(!self.is_big())
    }
}

/// Writes the three most significant bytes of `value` in host order.
pub fn pack_int24(value: i32, out: &mut [u8]) {
    let offset = Endianness::host().int24_offset();
    let bytes = value.to_ne_bytes();
    out[..3].copy_from_slice(&bytes[offset..offset + 3]);
}

/// Reads a host-order packed 24-bit value, sign-extended.
pub fn unpack_int24(bytes: &[u8]) -> i32 {
    let offset = Endianness::host().int24_offset();
    let mut wide = [0u8; 4];
    wide[offset..offset + 3].copy_from_slice(&bytes[..3]);
    i32::from_ne_bytes(wide) >> 8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_probe_matches_target() {
        let expected = if cfg!(target_endian = "big") {
            Endianness::Big
        } else {
            Endianness::Little
        };
        assert_eq!(Endianness::host(), expected);
    }

    #[test]
    fn test_pack_takes_most_significant_bytes() {
        let mut out = [0u8; 3];
        pack_int24(0x1234_5600, &mut out);
        match Endianness::host() {
            Endianness::Little => assert_eq!(out, [0x56, 0x34, 0x12]),
            Endianness::Big => assert_eq!(out, [0x12, 0x34, 0x56]),
        }
    }

    #[test]
    fn test_unpack_sign_extends() {
        let mut out = [0u8; 3];
        pack_int24(-256, &mut out);
        assert_eq!(unpack_int24(&out), -1);

        pack_int24(0x7FFF_FF00, &mut out);
        assert_eq!(unpack_int24(&out), 0x7F_FFFF);
    }
}
