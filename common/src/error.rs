use thiserror::Error;

/// Reasons a port range can be rejected.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RangeError {
    #[error("port range cannot be empty")]
    Empty,
    #[error("invalid port '{0}'")]
    InvalidPort(String),
    #[error("port 0 is not a scannable port")]
    ZeroPort,
    #[error("range start {start} is greater than range end {end}")]
    Reversed { start: u16, end: u16 },
}
