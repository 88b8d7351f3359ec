//! # Mail Catcher Discovery Service
//!
//! Implements the core "find and check" use case.
//!
//! This service is responsible for finding mail catcher instances on a host and
//! enriching each of them with the outcome of an end-to-end check.

use mailscout_common::service::{Discovery, InstanceAssessment, ServiceInstance};
use tracing::info;

use crate::scanner::ScanCoordinator;
use crate::verification::VerificationEngine;

/// Application Service for Discovery.
///
/// Orchestrates the process by:
/// 1. delegating the scan to the [`ScanCoordinator`].
/// 2. enriching every found instance through the [`VerificationEngine`].
pub struct DiscoveryService {
    scanner: ScanCoordinator,
    verifier: Option<VerificationEngine>,
    survey: bool,
}

impl DiscoveryService {
    pub fn new(scanner: ScanCoordinator) -> Self {
        Self {
            scanner,
            verifier: None,
            survey: false,
        }
    }

    /// Round-trips a test message through every instance found.
    pub fn with_verifier(mut self, verifier: VerificationEngine) -> Self {
        self.verifier = Some(verifier);
        self
    }

    /// Also requests the named API endpoints of every instance. Needs a verifier.
    pub fn with_endpoint_survey(mut self, survey: bool) -> Self {
        self.survey = survey;
        self
    }

    /// Verifies (and optionally surveys) a single instance.
    pub async fn assess(&self, instance: &ServiceInstance) -> InstanceAssessment {
        let mut assessment = InstanceAssessment {
            instance: instance.clone(),
            verification: None,
            endpoints: Vec::new(),
        };

        if let Some(verifier) = &self.verifier {
            info!(
                "Verifying instance smtp:{} api:{}",
                instance.smtp_port, instance.api_port
            );
            assessment.verification = Some(verifier.verify(instance).await);
            if self.survey {
                assessment.endpoints = verifier.survey_endpoints(instance).await;
            }
        }

        assessment
    }

    pub fn scanner(&self) -> &ScanCoordinator {
        &self.scanner
    }

    pub async fn perform_discovery(&self) -> Discovery {
        // 1. Scan
        let report = self.scanner.scan().await;

        // 2. Enrich
        let mut assessments = Vec::with_capacity(report.instances.len());
        for instance in &report.instances {
            assessments.push(self.assess(instance).await);
        }

        Discovery {
            report,
            assessments,
        }
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
