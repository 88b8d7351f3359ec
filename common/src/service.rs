//! # Scan Data Model
//!
//! Everything here lives for a single scan invocation only. A scan starts from an
//! empty candidate universe and nothing is carried over to the next one.

use std::collections::BTreeSet;
use std::fmt;

use serde::Serialize;

use crate::network::range::PortRange;

/// Outcome of probing one port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct PortCandidate {
    pub port: u16,
    pub open: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceKind {
    Smtp,
    HttpApi,
    WebUi,
    Unknown,
}

/// Which flavour of the mail catcher HTTP interface answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiVersion {
    /// `/api/v2/messages` answered with an object holding `items`.
    V2,
    /// `/api/v1/messages` answered with JSON.
    V1,
    /// Only the bare `/api` root answered.
    Unknown,
    /// No API path matched but the root page looks like the web interface.
    WebInterface,
}

impl ApiVersion {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApiVersion::V2 => "v2",
            ApiVersion::V1 => "v1",
            ApiVersion::Unknown => "unknown",
            ApiVersion::WebInterface => "web_interface",
        }
    }

    pub fn kind(&self) -> ServiceKind {
        match self {
            ApiVersion::WebInterface => ServiceKind::WebUi,
            _ => ServiceKind::HttpApi,
        }
    }
}

impl fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A classified open port. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ServiceCandidate {
    pub port: u16,
    pub kind: ServiceKind,
    pub api_version: Option<ApiVersion>,
    pub api_path: Option<String>,
}

impl ServiceCandidate {
    pub fn smtp(port: u16) -> Self {
        Self {
            port,
            kind: ServiceKind::Smtp,
            api_version: None,
            api_path: None,
        }
    }

    pub fn api(port: u16, version: ApiVersion, path: impl Into<String>) -> Self {
        Self {
            port,
            kind: version.kind(),
            api_version: Some(version),
            api_path: Some(path.into()),
        }
    }

    pub fn is_smtp(&self) -> bool {
        self.kind == ServiceKind::Smtp
    }

    /// Web-interface hits count as API candidates, same as versioned endpoints.
    pub fn is_api(&self) -> bool {
        matches!(self.kind, ServiceKind::HttpApi | ServiceKind::WebUi)
            && self.api_version.is_some()
    }
}

/// One SMTP endpoint paired with one HTTP endpoint of the same scan.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ServiceInstance {
    pub host: String,
    pub smtp_port: u16,
    pub api_port: u16,
    pub api_version: ApiVersion,
    pub api_url: String,
    pub web_ui_url: String,
}

impl ServiceInstance {
    pub fn new(
        host: &str,
        smtp_port: u16,
        api_port: u16,
        api_version: ApiVersion,
        api_path: &str,
    ) -> Self {
        let web_ui_url = base_url(host, api_port);
        let api_url = format!("{web_ui_url}{api_path}");
        Self {
            host: host.to_string(),
            smtp_port,
            api_port,
            api_version,
            api_url,
            web_ui_url,
        }
    }
}

/// `http://host:port`, bracketing IPv6 literals.
pub fn base_url(host: &str, port: u16) -> String {
    if host.contains(':') && !host.starts_with('[') {
        format!("http://[{host}]:{port}")
    } else {
        format!("http://{host}:{port}")
    }
}

/// Size of the message listing, when the listing shape allows counting it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageCount {
    Known(usize),
    Unknown,
}

impl fmt::Display for MessageCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageCount::Known(count) => write!(f, "{count}"),
            MessageCount::Unknown => f.write_str("unknown"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VerificationResult {
    pub smtp_test: bool,
    pub api_test: bool,
    pub message_count_baseline: Option<MessageCount>,
    /// `None` when the round-trip could not be evaluated.
    pub message_received: Option<bool>,
}

/// Reachability of one named HTTP endpoint of an instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EndpointCheck {
    pub name: String,
    pub url: String,
    pub status: Option<u16>,
    pub working: bool,
    pub error: Option<String>,
}

/// Everything a single scan produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanReport {
    pub host: String,
    pub range: PortRange,
    pub open_ports: BTreeSet<u16>,
    pub smtp_candidates: Vec<ServiceCandidate>,
    pub api_candidates: Vec<ServiceCandidate>,
    pub instances: Vec<ServiceInstance>,
    /// The default-port shortcut resolved the scan and the sweep never ran.
    pub used_default_ports: bool,
}

impl ScanReport {
    pub fn empty(host: &str, range: PortRange) -> Self {
        Self {
            host: host.to_string(),
            range,
            open_ports: BTreeSet::new(),
            smtp_candidates: Vec::new(),
            api_candidates: Vec::new(),
            instances: Vec::new(),
            used_default_ports: false,
        }
    }
}

/// Verification and survey outcome for one instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstanceAssessment {
    pub instance: ServiceInstance,
    /// `None` when verification was not requested.
    pub verification: Option<VerificationResult>,
    pub endpoints: Vec<EndpointCheck>,
}

/// A scan report together with the assessment of every instance it found.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Discovery {
    pub report: ScanReport,
    pub assessments: Vec<InstanceAssessment>,
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
