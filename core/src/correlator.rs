//! Pairs SMTP candidates with API candidates.
//!
//! Pairing is a plain cross product: every SMTP port is combined with every API port
//! found in the same scan, whether or not they belong to the same deployment. With `m`
//! SMTP and `n` API candidates the result always holds `m * n` instances.

use mailscout_common::service::{ApiVersion, ServiceCandidate, ServiceInstance};

/// Builds one instance per (SMTP, API) pair, SMTP-major.
///
/// Candidates of the wrong kind on either side are skipped.
pub fn correlate(
    host: &str,
    smtp: &[ServiceCandidate],
    api: &[ServiceCandidate],
) -> Vec<ServiceInstance> {
    let apis: Vec<(&ServiceCandidate, ApiVersion, &str)> = api
        .iter()
        .filter(|c| c.is_api())
        .filter_map(|c| {
            let version = c.api_version?;
            Some((c, version, c.api_path.as_deref().unwrap_or_default()))
        })
        .collect();

    smtp.iter()
        .filter(|c| c.is_smtp())
        .flat_map(|s| {
            apis.iter().map(move |(a, version, path)| {
                ServiceInstance::new(host, s.port, a.port, *version, path)
            })
        })
        .collect()
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
