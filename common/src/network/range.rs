//! # Port Range Model
//!
//! An inclusive range of TCP ports, `[start, end]`.
//!
//! Accepted textual forms:
//! * A single port (e.g., `8025`).
//! * A dash-separated range (e.g., `1024-10000`).

use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

use serde::Serialize;

use crate::error::RangeError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct PortRange {
    start: u16,
    end: u16,
}

impl PortRange {
    /// Builds a range, rejecting port 0 and reversed bounds.
    pub fn new(start: u16, end: u16) -> Result<Self, RangeError> {
        if start == 0 || end == 0 {
            return Err(RangeError::ZeroPort);
        }
        if start > end {
            return Err(RangeError::Reversed { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn single(port: u16) -> Result<Self, RangeError> {
        Self::new(port, port)
    }

    pub fn start(&self) -> u16 {
        self.start
    }

    pub fn end(&self) -> u16 {
        self.end
    }

    pub fn to_iter(&self) -> RangeInclusive<u16> {
        self.start..=self.end
    }

    pub fn len(&self) -> usize {
        self.end
            .checked_sub(self.start)
            .map_or(0, |span| usize::from(span) + 1)
    }

    pub fn is_empty(&self) -> bool {
        self.start > self.end
    }

    pub fn contains(&self, port: u16) -> bool {
        self.to_iter().contains(&port)
    }
}

impl Default for PortRange {
    fn default() -> Self {
        Self {
            start: 1024,
            end: 10_000,
        }
    }
}

impl fmt::Display for PortRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.start == self.end {
            write!(f, "{}", self.start)
        } else {
            write!(f, "{}-{}", self.start, self.end)
        }
    }
}

impl FromStr for PortRange {
    type Err = RangeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(RangeError::Empty);
        }

        let Some((start_str, end_str)) = s.split_once('-') else {
            return Self::single(parse_port(s)?);
        };

        Self::new(parse_port(start_str)?, parse_port(end_str)?)
    }
}

fn parse_port(s: &str) -> Result<u16, RangeError> {
    let s = s.trim();
    if s.is_empty() {
        return Err(RangeError::Empty);
    }
    s.parse::<u16>()
        .map_err(|_| RangeError::InvalidPort(s.to_string()))
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
