use core::str::FromStr;

bitflags::bitflags! {
    /// Validation steps the reader is allowed to skip.
    ///
    /// Every assumption trades robustness against hostile or damaged input
    /// for speed. Reads stay memory safe regardless; what is skipped is the
    /// detection of malformed blobs, which then yield unspecified (but
    /// in-bounds) results instead of errors.
    ///
    /// Assumptions compiled in through the `assume-*` cargo features are
    /// always in effect, see [`Assumptions::COMPILED`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Assumptions: u8 {
        /// The blob is known to have a sane header and block layout.
        const VALID_DTB = 1 << 0;
        /// Offsets and other arguments passed by the caller are valid.
        const VALID_INPUT = 1 << 1;
        /// The blob uses the latest format version (`0x11`) only.
        const LATEST = 1 << 2;
        /// All of the above.
        const PERFECT = Self::VALID_DTB.bits() | Self::VALID_INPUT.bits() | Self::LATEST.bits();
    }
}

impl Assumptions {
    /// The assumptions selected at build time.
    pub const COMPILED: Self = Self::from_bits_truncate(
        if cfg!(feature = "assume-valid-dtb") {
            Self::VALID_DTB.bits()
        } else {
            0
        } | if cfg!(feature = "assume-valid-input") {
            Self::VALID_INPUT.bits()
        } else {
            0
        } | if cfg!(feature = "assume-latest") {
            Self::LATEST.bits()
        } else {
            0
        },
    );
}

impl Default for Assumptions {
    fn default() -> Self {
        Self::COMPILED
    }
}

/// An unknown name was given while parsing [`Assumptions`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display, derive_more::Error)]
#[display("unknown assumption (expected none, valid-dtb, valid-input, latest or perfect)")]
pub struct ParseAssumptionsError;

impl FromStr for Assumptions {
    type Err = ParseAssumptionsError;

    /// Parses a comma separated list such as `valid-dtb,latest`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .try_fold(Self::empty(), |acc, name| {
                let flag = match name {
                    "none" => Self::empty(),
                    "valid-dtb" => Self::VALID_DTB,
                    "valid-input" => Self::VALID_INPUT,
                    "latest" => Self::LATEST,
                    "perfect" => Self::PERFECT,
                    _ => return Err(ParseAssumptionsError),
                };
                Ok(acc | flag)
            })
    }
}

#[cfg_attr(coverage_nightly, coverage(off))]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        assert_eq!("".parse(), Ok(Assumptions::empty()));
        assert_eq!("none".parse(), Ok(Assumptions::empty()));
        assert_eq!(
            "valid-dtb, latest".parse(),
            Ok(Assumptions::VALID_DTB | Assumptions::LATEST)
        );
        assert_eq!("perfect".parse(), Ok(Assumptions::PERFECT));
        assert_eq!(
            "valid-input,bogus".parse::<Assumptions>(),
            Err(ParseAssumptionsError)
        );
    }

    #[test]
    fn test_perfect_contains_all() {
        assert!(Assumptions::PERFECT.contains(Assumptions::VALID_DTB));
        assert!(Assumptions::PERFECT.contains(Assumptions::VALID_INPUT));
        assert!(Assumptions::PERFECT.contains(Assumptions::LATEST));
    }

    #[cfg(not(any(
        feature = "assume-valid-dtb",
        feature = "assume-valid-input",
        feature = "assume-latest"
    )))]
    #[test]
    fn test_nothing_compiled() {
        assert_eq!(Assumptions::default(), Assumptions::empty());
    }
}
