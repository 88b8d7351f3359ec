use std::time::Duration;

use crate::network::range::PortRange;

pub const DEFAULT_SMTP_PORT: u16 = 1025;
pub const DEFAULT_API_PORT: u16 = 8025;
pub const DEFAULT_CONCURRENCY: usize = 50;

/// Presentation options for the command line front end.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Skips the banner line printed on start up.
    pub no_banner: bool,
    /// 0 prints everything, 1 drops headers and trees, 2 only prints the summary.
    pub quiet: u8,
    /// Writes results as JSON to stdout instead of the decorated output.
    pub json: bool,
}

/// How far the API classification pass goes once both service kinds are known.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ApiSearch {
    /// Stop at the first API candidate once an SMTP candidate exists.
    #[default]
    FirstMatch,
    /// Classify every open port.
    Exhaustive,
}

/// Tunables of a single scan.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    pub host: String,
    pub ports: PortRange,
    /// Goes straight to the sweep without looking at the default ports first.
    pub skip_default_check: bool,
    /// Upper bound of probes in flight at once.
    pub concurrency: usize,
    /// Timeout of a single reachability probe.
    pub connect_timeout: Duration,
    /// Timeout for connecting and reading an SMTP greeting.
    pub banner_timeout: Duration,
    /// Timeout of every HTTP request made while classifying.
    pub http_timeout: Duration,
    pub default_smtp_port: u16,
    pub default_api_port: u16,
    pub api_search: ApiSearch,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            host: String::from("localhost"),
            ports: PortRange::default(),
            skip_default_check: false,
            concurrency: DEFAULT_CONCURRENCY,
            connect_timeout: Duration::from_secs(1),
            banner_timeout: Duration::from_secs(2),
            http_timeout: Duration::from_secs(2),
            default_smtp_port: DEFAULT_SMTP_PORT,
            default_api_port: DEFAULT_API_PORT,
            api_search: ApiSearch::FirstMatch,
        }
    }
}

/// Tunables of the end-to-end check run against a discovered instance.
#[derive(Debug, Clone)]
pub struct VerifyConfig {
    /// Wait between submitting the test message and counting again.
    pub settle_delay: Duration,
    /// Upper bound for the whole SMTP session.
    pub smtp_timeout: Duration,
    pub http_timeout: Duration,
    pub sender: String,
    pub recipient: String,
}

impl Default for VerifyConfig {
    fn default() -> Self {
        Self {
            settle_delay: Duration::from_secs(1),
            smtp_timeout: Duration::from_secs(5),
            http_timeout: Duration::from_secs(2),
            sender: String::from("test@example.com"),
            recipient: String::from("recipient@example.com"),
        }
    }
}
