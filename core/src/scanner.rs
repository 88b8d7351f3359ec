//! Drives a complete scan of one host.
//!
//! The coordinator owns the three moving parts of a scan and only talks to them through
//! their traits, so tests can swap any of them out:
//!
//! - a [`PortProbe`] for reachability,
//! - a [`ServiceClassifier`] for protocol sniffing,
//! - a [`ScanObserver`] that receives progress events.
//!
//! A scan runs in up to four phases. The two well-known default ports are checked first
//! and, when both answer as expected, the scan ends there. Otherwise the whole range is
//! swept through a [`BoundedPool`], the open ports are sniffed for SMTP, then for the
//! HTTP API, and finally the two candidate lists are paired up.

use std::collections::BTreeSet;
use std::sync::Arc;

use mailscout_common::config::{ApiSearch, ScanConfig};
use mailscout_common::observer::{ScanEvent, ScanObserver, ScanPhase, SilentObserver};
use mailscout_common::service::{
    PortCandidate, ScanReport, ServiceCandidate, ServiceInstance, base_url,
};
use tracing::{debug, info};

use crate::classifier::{ProtocolSniffer, ServiceClassifier};
use crate::correlator;
use crate::network::tcp::{PortProbe, TcpProbe};

pub mod pool;

use pool::BoundedPool;

pub struct ScanCoordinator {
    config: ScanConfig,
    probe: Arc<dyn PortProbe>,
    classifier: Arc<dyn ServiceClassifier>,
    observer: Arc<dyn ScanObserver>,
}

impl ScanCoordinator {
    /// A coordinator with the real TCP probe and protocol sniffer and no observer.
    pub fn new(config: ScanConfig) -> anyhow::Result<Self> {
        let classifier = ProtocolSniffer::new(config.http_timeout)?;
        Ok(Self {
            config,
            probe: Arc::new(TcpProbe),
            classifier: Arc::new(classifier),
            observer: Arc::new(SilentObserver),
        })
    }

    pub fn with_probe(mut self, probe: Arc<dyn PortProbe>) -> Self {
        self.probe = probe;
        self
    }

    pub fn with_classifier(mut self, classifier: Arc<dyn ServiceClassifier>) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn ScanObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Runs the scan to completion. Individual port failures never abort it; an empty
    /// report is the only "nothing found" signal.
    pub async fn scan(&self) -> ScanReport {
        if !self.config.skip_default_check {
            if let Some(report) = self.check_default_ports().await {
                return report;
            }
        } else {
            debug!("Default port check skipped");
        }

        let mut report = ScanReport::empty(&self.config.host, self.config.ports);

        report.open_ports = self.sweep().await;
        report.smtp_candidates = self.smtp_pass(&report.open_ports).await;
        report.api_candidates = self
            .api_pass(&report.open_ports, !report.smtp_candidates.is_empty())
            .await;
        report.instances = correlator::correlate(
            &self.config.host,
            &report.smtp_candidates,
            &report.api_candidates,
        );

        for instance in &report.instances {
            self.emit(ScanEvent::InstanceFound(instance.clone()));
        }
        info!(
            "Scan of {} finished: {} open, {} instance(s)",
            self.config.host,
            report.open_ports.len(),
            report.instances.len()
        );

        report
    }

    /// Builds the instance for a known port pair without scanning.
    ///
    /// Only the API side is sniffed, to learn its version and path. The SMTP side is
    /// left to whoever uses the instance.
    pub async fn resolve_instance(&self, smtp_port: u16, api_port: u16) -> Option<ServiceInstance> {
        let api = self.classify_api_port(api_port).await?;
        correlator::correlate(
            &self.config.host,
            &[ServiceCandidate::smtp(smtp_port)],
            &[api],
        )
        .pop()
    }

    fn emit(&self, event: ScanEvent) {
        self.observer.on_event(&event);
    }

    /// Probes and classifies the default SMTP and API ports.
    ///
    /// Returns a finished report only when both ports classify as expected. Every other
    /// outcome is reported to the observer and the caller goes on with the sweep.
    async fn check_default_ports(&self) -> Option<ScanReport> {
        self.emit(ScanEvent::PhaseStarted(ScanPhase::DefaultPorts));

        let host = self.config.host.as_str();
        let smtp_port = self.config.default_smtp_port;
        let api_port = self.config.default_api_port;
        let connect_timeout = self.config.connect_timeout;

        let (smtp_open, api_open) = tokio::join!(
            self.probe.check_port(host, smtp_port, connect_timeout),
            self.probe.check_port(host, api_port, connect_timeout),
        );
        self.emit(ScanEvent::PortProbed { port: smtp_port, open: smtp_open });
        self.emit(ScanEvent::PortProbed { port: api_port, open: api_open });

        if !smtp_open && !api_open {
            debug!("Default ports {smtp_port} and {api_port} are closed on {host}");
            self.emit(ScanEvent::DefaultPortsClosed);
            return None;
        }

        let smtp = if smtp_open {
            self.classify_smtp_port(smtp_port).await
        } else {
            None
        };
        if smtp_open && smtp.is_none() {
            self.emit(ScanEvent::DefaultPortUnrecognised { port: smtp_port });
        }

        let api = if api_open {
            self.classify_api_port(api_port).await
        } else {
            None
        };
        if api_open && api.is_none() {
            self.emit(ScanEvent::DefaultPortUnrecognised { port: api_port });
        }

        match (smtp, api) {
            (Some(smtp), Some(api)) => {
                let mut report = ScanReport::empty(host, self.config.ports);
                report.open_ports = BTreeSet::from([smtp_port, api_port]);
                report.instances = correlator::correlate(
                    host,
                    std::slice::from_ref(&smtp),
                    std::slice::from_ref(&api),
                );
                report.smtp_candidates = vec![smtp];
                report.api_candidates = vec![api];
                report.used_default_ports = true;

                for instance in &report.instances {
                    self.emit(ScanEvent::InstanceFound(instance.clone()));
                }
                info!("Complete instance found on the default ports of {host}");
                Some(report)
            }
            (None, None) => None,
            (smtp, api) => {
                self.emit(ScanEvent::PartialDefaults {
                    smtp_port: smtp.map(|c| c.port),
                    api_port: api.map(|c| c.port),
                });
                None
            }
        }
    }

    /// One reachability probe per port of the range, at most `concurrency` in flight.
    async fn sweep(&self) -> BTreeSet<u16> {
        self.emit(ScanEvent::PhaseStarted(ScanPhase::Sweep));
        let range = self.config.ports;
        self.emit(ScanEvent::SweepStarted { range, total: range.len() });

        let pool = BoundedPool::new(self.config.concurrency);
        let host: Arc<str> = Arc::from(self.config.host.as_str());
        let connect_timeout = self.config.connect_timeout;

        let outcomes = pool
            .run(range.to_iter(), |port| {
                let probe = Arc::clone(&self.probe);
                let observer = Arc::clone(&self.observer);
                let host = Arc::clone(&host);
                async move {
                    let open = probe.check_port(&host, port, connect_timeout).await;
                    observer.on_event(&ScanEvent::PortProbed { port, open });
                    PortCandidate { port, open }
                }
            })
            .await;

        let open: BTreeSet<u16> = outcomes
            .into_iter()
            .filter_map(|candidate| candidate.open.then_some(candidate.port))
            .collect();

        debug!("Sweep of {range} found {} open port(s)", open.len());
        self.emit(ScanEvent::SweepFinished { open: open.len() });
        open
    }

    async fn smtp_pass(&self, open_ports: &BTreeSet<u16>) -> Vec<ServiceCandidate> {
        self.emit(ScanEvent::PhaseStarted(ScanPhase::SmtpPass));

        let pool = BoundedPool::new(self.config.concurrency);
        let host: Arc<str> = Arc::from(self.config.host.as_str());
        let banner_timeout = self.config.banner_timeout;

        let mut found: Vec<u16> = pool
            .run(open_ports.iter().copied(), |port| {
                let classifier = Arc::clone(&self.classifier);
                let host = Arc::clone(&host);
                async move {
                    classifier
                        .classify_smtp(&host, port, banner_timeout)
                        .await
                        .then_some(port)
                }
            })
            .await
            .into_iter()
            .flatten()
            .collect();
        found.sort_unstable();

        found
            .into_iter()
            .map(|port| {
                let candidate = ServiceCandidate::smtp(port);
                self.emit(ScanEvent::ServiceFound(candidate.clone()));
                candidate
            })
            .collect()
    }

    /// Sniffs open ports for the HTTP API in ascending order.
    ///
    /// With [`ApiSearch::FirstMatch`] the pass ends at the first API candidate once an
    /// SMTP candidate exists, so further API services on the same host can be missed.
    async fn api_pass(&self, open_ports: &BTreeSet<u16>, have_smtp: bool) -> Vec<ServiceCandidate> {
        self.emit(ScanEvent::PhaseStarted(ScanPhase::ApiPass));

        let mut candidates = Vec::new();
        for &port in open_ports {
            let Some(candidate) = self.classify_api_port(port).await else {
                continue;
            };
            candidates.push(candidate);

            if have_smtp && self.config.api_search == ApiSearch::FirstMatch {
                debug!("API found on {port} with SMTP already known, stopping API search");
                self.emit(ScanEvent::ApiSearchStopped { port });
                break;
            }
        }
        candidates
    }

    async fn classify_smtp_port(&self, port: u16) -> Option<ServiceCandidate> {
        let is_smtp = self
            .classifier
            .classify_smtp(&self.config.host, port, self.config.banner_timeout)
            .await;
        is_smtp.then(|| {
            let candidate = ServiceCandidate::smtp(port);
            self.emit(ScanEvent::ServiceFound(candidate.clone()));
            candidate
        })
    }

    async fn classify_api_port(&self, port: u16) -> Option<ServiceCandidate> {
        let url = base_url(&self.config.host, port);
        let found = self.classifier.classify_http_api(&url).await?;
        let candidate = ServiceCandidate::api(port, found.version, found.path);
        self.emit(ScanEvent::ServiceFound(candidate.clone()));
        Some(candidate)
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
