//! # Mailscout Core
//!
//! The scanning engine. It finds mail catcher deployments on a host, tells their SMTP
//! and HTTP sides apart, pairs them up and checks that mail actually flows through.
//!
//! ## Layout
//! * **[`network`]**: TCP reachability and the shared HTTP client.
//! * **[`classifier`]**: protocol sniffing on already-open ports.
//! * **[`scanner`]**: the scan coordinator and its bounded worker pool.
//! * **[`correlator`]**: pairing of SMTP and API candidates into instances.
//! * **[`verification`]**: the end-to-end message round-trip.
//! * **[`discovery`]**: the use case gluing all of the above together.
//!
//! Nothing here prints. Progress leaves the engine through
//! [`ScanObserver`](mailscout_common::observer::ScanObserver) and logs through `tracing`.

pub mod classifier;
pub mod correlator;
pub mod discovery;
pub mod network;
pub mod scanner;
pub mod verification;
