pub mod scan;
pub mod verify;

use std::time::Duration;

use clap::{ArgAction, Args, Parser, Subcommand};
use mailscout_common::config::{
    ApiSearch, DEFAULT_API_PORT, DEFAULT_CONCURRENCY, DEFAULT_SMTP_PORT, ScanConfig, VerifyConfig,
};
use mailscout_common::network::range::PortRange;

#[derive(Parser)]
#[command(name = "mailscout")]
#[command(about = "Finds local mail catchers and checks that mail flows through them.")]
#[command(version)]
pub struct CommandLine {
    #[command(subcommand)]
    pub command: Commands,

    /// Write results as JSON to stdout
    #[arg(long, global = true)]
    pub json: bool,

    /// Less output, repeat for even less
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub quiet: u8,

    /// Skip the banner
    #[arg(long, global = true)]
    pub no_banner: bool,

    /// Show engine debug logs
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Scan a host for mail catcher instances
    #[command(alias = "s")]
    Scan(ScanArgs),
    /// Check a known SMTP and API port pair end to end
    #[command(alias = "v")]
    Verify(VerifyArgs),
}

#[derive(Args)]
pub struct ScanArgs {
    /// Host to scan
    #[arg(long, default_value = "localhost")]
    pub host: String,

    /// Inclusive port range, `LO-HI` or a single port
    #[arg(short, long, default_value_t = PortRange::default())]
    pub ports: PortRange,

    /// Go straight to the sweep without trying the default ports first
    #[arg(long)]
    pub skip_default_check: bool,

    /// Probes in flight at once
    #[arg(short, long, default_value_t = DEFAULT_CONCURRENCY)]
    pub concurrency: usize,

    /// Per-probe connect timeout in milliseconds
    #[arg(long, default_value_t = 1000)]
    pub timeout_ms: u64,

    /// Keep looking for APIs after the first one pairs with an SMTP port
    #[arg(long)]
    pub exhaustive: bool,

    /// Do not send a test message through found instances
    #[arg(long)]
    pub no_verify: bool,

    /// Do not check the individual API endpoints of found instances
    #[arg(long)]
    pub no_endpoints: bool,
}

impl ScanArgs {
    pub fn scan_config(&self) -> ScanConfig {
        ScanConfig {
            host: self.host.clone(),
            ports: self.ports,
            skip_default_check: self.skip_default_check,
            concurrency: self.concurrency,
            connect_timeout: Duration::from_millis(self.timeout_ms),
            api_search: if self.exhaustive {
                ApiSearch::Exhaustive
            } else {
                ApiSearch::FirstMatch
            },
            ..ScanConfig::default()
        }
    }
}

#[derive(Args)]
pub struct VerifyArgs {
    /// Host running the mail catcher
    #[arg(long, default_value = "localhost")]
    pub host: String,

    #[arg(long, default_value_t = DEFAULT_SMTP_PORT)]
    pub smtp_port: u16,

    #[arg(long, default_value_t = DEFAULT_API_PORT)]
    pub api_port: u16,

    /// Address the test message is sent to
    #[arg(long, default_value = "recipient@example.com")]
    pub recipient: String,

    /// Do not check the individual API endpoints
    #[arg(long)]
    pub no_endpoints: bool,
}

impl VerifyArgs {
    pub fn scan_config(&self) -> ScanConfig {
        ScanConfig {
            host: self.host.clone(),
            default_smtp_port: self.smtp_port,
            default_api_port: self.api_port,
            ..ScanConfig::default()
        }
    }

    pub fn verify_config(&self) -> VerifyConfig {
        VerifyConfig {
            recipient: self.recipient.clone(),
            ..VerifyConfig::default()
        }
    }
}

impl CommandLine {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
