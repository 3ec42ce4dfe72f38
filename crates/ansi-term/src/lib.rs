//! ANSI escape sequences for colored terminal output.

#![no_std]

use core::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Color {
    DarkGray,
    Red,
    Green,
    Yellow,
    Blue,
    Magenta,
    Cyan,
    Default,
}

impl Color {
    fn fg(self) -> u8 {
        match self {
            Self::DarkGray => 90,
            Self::Red => 31,
            Self::Green => 32,
            Self::Yellow => 33,
            Self::Blue => 34,
            Self::Magenta => 35,
            Self::Cyan => 36,
            Self::Default => 39,
        }
    }

    /// Wraps `value` so that it is displayed in this color.
    pub fn paint<T>(self, value: T) -> WithFg<T> {
        WithFg::new(self, value)
    }
}

/// A value displayed with a bold foreground color.
///
/// Coloring can be turned off per value with [`WithFg::enabled`], in which
/// case the value is displayed as-is.
pub struct WithFg<T> {
    color: Color,
    enabled: bool,
    value: T,
}

impl<T> WithFg<T> {
    pub fn new(color: Color, value: T) -> Self {
        Self {
            color,
            enabled: true,
            value,
        }
    }

    #[must_use]
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}

impl<T> fmt::Display for WithFg<T>
where
    T: fmt::Display,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = &self.value;
        if !self.enabled {
            return write!(f, "{value}");
        }
        let fg = self.color.fg();
        write!(f, "\x1B[{fg};1m{value}\x1B[0m")
    }
}

#[cfg(test)]
mod tests {
    extern crate alloc;

    use alloc::format;

    use super::*;

    #[test]
    fn test_paint() {
        assert_eq!(format!("{}", Color::Red.paint("x")), "\x1B[31;1mx\x1B[0m");
        assert_eq!(
            format!("{}", Color::DarkGray.paint(42)),
            "\x1B[90;1m42\x1B[0m"
        );
    }

    #[test]
    fn test_disabled() {
        assert_eq!(format!("{}", Color::Green.paint("ok").enabled(false)), "ok");
    }
}
