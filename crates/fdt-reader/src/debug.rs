use core::fmt;

/// Formats byte slices as a bounded list of hex octets.
pub(crate) trait HexDebug {
    fn hex_debug(&self, max_len: usize) -> DebugHex<'_>;
}

impl HexDebug for [u8] {
    fn hex_debug(&self, max_len: usize) -> DebugHex<'_> {
        DebugHex {
            bytes: self,
            max_len,
        }
    }
}

pub(crate) struct DebugHex<'a> {
    bytes: &'a [u8],
    max_len: usize,
}

impl fmt::Debug for DebugHex<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, byte) in self.bytes.iter().take(self.max_len).enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{byte:02x}")?;
        }
        if self.bytes.len() > self.max_len {
            write!(f, " ...({} more)", self.bytes.len() - self.max_len)?;
        }
        f.write_str("]")
    }
}

#[cfg_attr(coverage_nightly, coverage(off))]
#[cfg(test)]
mod tests {
    use alloc::format;

    use super::*;

    #[test]
    fn test_hex_debug() {
        let bytes = [0xd0_u8, 0x0d, 0xfe, 0xed];
        assert_eq!(format!("{:?}", bytes.hex_debug(8)), "[d0 0d fe ed]");
        assert_eq!(format!("{:?}", bytes.hex_debug(2)), "[d0 0d ...(2 more)]");
        assert_eq!(format!("{:?}", [].hex_debug(2)), "[]");
    }
}
