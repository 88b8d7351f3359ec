use std::time::Duration;

use async_trait::async_trait;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::trace;

/// Single reachability check against one port.
///
/// Implementations must collapse every failure (refused, unreachable, unresolvable,
/// timed out) into `false`. Callers cannot tell a refused port from a filtered one.
#[async_trait]
pub trait PortProbe: Send + Sync {
    async fn check_port(&self, host: &str, port: u16, probe_timeout: Duration) -> bool;
}

/// Plain TCP connect probe.
#[derive(Debug, Default, Clone, Copy)]
pub struct TcpProbe;

#[async_trait]
impl PortProbe for TcpProbe {
    async fn check_port(&self, host: &str, port: u16, probe_timeout: Duration) -> bool {
        match timeout(probe_timeout, TcpStream::connect((unbracket(host), port))).await {
            Ok(Ok(_)) => true,
            Ok(Err(e)) => {
                trace!("{host}:{port} closed: {e}");
                false
            }
            Err(_elapsed) => {
                trace!("{host}:{port} timed out");
                false
            }
        }
    }
}

/// Connects to `host:port`, treating `[::1]` the same as `::1`.
pub async fn connect(host: &str, port: u16) -> std::io::Result<TcpStream> {
    TcpStream::connect((unbracket(host), port)).await
}

fn unbracket(host: &str) -> &str {
    host.strip_prefix('[')
        .and_then(|h| h.strip_suffix(']'))
        .unwrap_or(host)
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
