//! Progress reporting for scans.
//!
//! The engine never prints. Whoever drives a scan passes a [`ScanObserver`] and decides
//! how (and whether) to render the events.

use crate::network::range::PortRange;
use crate::service::{ServiceCandidate, ServiceInstance};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanPhase {
    DefaultPorts,
    Sweep,
    SmtpPass,
    ApiPass,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanEvent {
    PhaseStarted(ScanPhase),
    /// Neither default port accepted a connection.
    DefaultPortsClosed,
    /// A default port is open but did not classify as the expected service.
    DefaultPortUnrecognised { port: u16 },
    /// Exactly one of the two default services was recognised.
    PartialDefaults { smtp_port: Option<u16>, api_port: Option<u16> },
    SweepStarted { range: PortRange, total: usize },
    PortProbed { port: u16, open: bool },
    SweepFinished { open: usize },
    ServiceFound(ServiceCandidate),
    /// The API pass stopped early after this port.
    ApiSearchStopped { port: u16 },
    InstanceFound(ServiceInstance),
}

pub trait ScanObserver: Send + Sync {
    fn on_event(&self, event: &ScanEvent);
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentObserver;

impl ScanObserver for SilentObserver {
    fn on_event(&self, _event: &ScanEvent) {}
}

impl<F> ScanObserver for F
where
    F: Fn(&ScanEvent) + Send + Sync,
{
    fn on_event(&self, event: &ScanEvent) {
        self(event)
    }
}
