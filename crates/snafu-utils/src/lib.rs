//! Error plumbing shared by the command-line tools.
//!
//! [`GenericError`] is a `whatever`-style error for application code, and
//! [`Report`] renders any error with its chain of causes.

#![cfg_attr(
    feature = "unstable-provider-api",
    feature(error_generic_member_access)
)]
#![no_std]

extern crate alloc;

use alloc::{boxed::Box, string::String};
use core::{error::Error, fmt};

use ansi_term::Color;
use snafu::{GenerateImplicitData, Snafu};

/// The source location where an error was constructed.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Location(&'static core::panic::Location<'static>);

impl Default for Location {
    #[track_caller]
    fn default() -> Self {
        Self(core::panic::Location::caller())
    }
}

impl GenerateImplicitData for Location {
    #[track_caller]
    fn generate() -> Self {
        Self::default()
    }
}

impl fmt::Debug for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

#[derive(Debug, Snafu)]
#[snafu(whatever, display("{message}"))]
#[cfg_attr(
    feature = "unstable-provider-api",
    snafu(provide(ref, priority, Location => location))
)]
pub struct GenericError {
    message: String,
    #[snafu(implicit)]
    location: Location,
    #[snafu(source(from(Box<dyn Error>, Some)))]
    #[cfg_attr(feature = "unstable-provider-api", snafu(provide(false)))]
    source: Option<Box<dyn Error>>,
}

impl GenericError {
    #[must_use]
    pub fn location(&self) -> Location {
        self.location
    }
}

/// Renders an error and its sources, one per line.
pub struct Report<E> {
    error: E,
    color: bool,
}

impl<E> Report<E> {
    pub fn new(error: E) -> Self {
        Self { error, color: true }
    }

    #[must_use]
    pub fn color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }
}

impl<E> fmt::Debug for Report<E>
where
    E: Error,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl<E> fmt::Display for Report<E>
where
    E: Error,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Error: {}", self.paint(Color::Red, &self.error))?;
        #[cfg(feature = "unstable-provider-api")]
        self.write_location(f, &self.error, "  ")?;

        let mut source = self.error.source();
        if source.is_some() {
            writeln!(f)?;
            writeln!(f, "Caused by:")?;
        }
        let mut index = 0;
        while let Some(s) = source {
            writeln!(f, "{index:4}: {}", self.paint(Color::Red, s))?;
            #[cfg(feature = "unstable-provider-api")]
            self.write_location(f, s, "      ")?;
            source = s.source();
            index += 1;
        }
        Ok(())
    }
}

impl<E> Report<E> {
    fn paint<T>(&self, color: Color, value: T) -> ansi_term::WithFg<T> {
        color.paint(value).enabled(self.color)
    }

    #[cfg(feature = "unstable-provider-api")]
    fn write_location(
        &self,
        f: &mut fmt::Formatter<'_>,
        error: &(dyn Error + '_),
        indent: &str,
    ) -> fmt::Result {
        if let Some(loc) = core::error::request_ref::<Location>(error) {
            writeln!(f, "{indent}at {}", self.paint(Color::DarkGray, loc))?;
        }
        Ok(())
    }
}
