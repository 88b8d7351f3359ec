//! # Shared building blocks
//!
//! Types used by every other crate of the workspace:
//!
//! * [`service`]: the scan data model (candidates, instances, verification results).
//! * [`network::range`]: inclusive TCP port ranges.
//! * [`config`]: presentation options and engine tunables.
//! * [`observer`]: the progress callback interface the engine reports through.

pub mod config;
pub mod error;
pub mod network;
pub mod observer;
pub mod service;

#[doc(hidden)]
pub mod __private {
    pub use tracing;
}

/// Logs an informational line.
#[macro_export]
macro_rules! info {
    ($($arg:tt)*) => {
        $crate::__private::tracing::info!($($arg)*)
    };
}

/// Logs a positive outcome (something was found or passed).
#[macro_export]
macro_rules! success {
    ($($arg:tt)*) => {
        $crate::__private::tracing::info!(target: "mailscout::success", $($arg)*)
    };
}

#[macro_export]
macro_rules! warn {
    ($($arg:tt)*) => {
        $crate::__private::tracing::warn!($($arg)*)
    };
}
