use std::sync::{Arc, Mutex};
use std::time::Duration;

use mailscout_common::config::{ScanConfig, VerifyConfig};
use mailscout_common::network::range::PortRange;
use mailscout_common::observer::ScanEvent;
use mailscout_common::service::{ApiVersion, MessageCount};
use mailscout_core::discovery::DiscoveryService;
use mailscout_core::scanner::ScanCoordinator;
use mailscout_core::verification::VerificationEngine;

use crate::support::{CountingProbe, FakeMailCatcher, closed_port};

fn fast_verify() -> VerifyConfig {
    VerifyConfig {
        settle_delay: Duration::from_millis(50),
        ..VerifyConfig::default()
    }
}

/// With both default ports answering, the scan ends after exactly two probes.
#[tokio::test]
async fn default_ports_short_circuit_the_sweep() {
    let catcher = FakeMailCatcher::start().await;
    let probe = CountingProbe::new();
    let config = ScanConfig {
        host: String::from("localhost"),
        ports: PortRange::new(1024, 10000).unwrap(),
        default_smtp_port: catcher.smtp_port,
        default_api_port: catcher.api_port,
        ..ScanConfig::default()
    };

    let report = ScanCoordinator::new(config)
        .unwrap()
        .with_probe(probe.clone())
        .scan()
        .await;

    assert!(report.used_default_ports);
    assert_eq!(report.instances.len(), 1);
    assert_eq!(report.instances[0].api_version, ApiVersion::V2);
    assert_eq!(report.instances[0].smtp_port, catcher.smtp_port);
    assert_eq!(probe.calls(), 2);
}

#[tokio::test]
async fn unreachable_range_is_empty_every_time() {
    let config = ScanConfig {
        host: String::from("host.invalid"),
        ports: PortRange::new(2000, 2099).unwrap(),
        connect_timeout: Duration::from_millis(200),
        ..ScanConfig::default()
    };
    let coordinator = ScanCoordinator::new(config).unwrap();

    for _ in 0..2 {
        let report = coordinator.scan().await;
        assert!(report.open_ports.is_empty());
        assert!(report.smtp_candidates.is_empty());
        assert!(report.api_candidates.is_empty());
        assert!(report.instances.is_empty());
    }
}

#[tokio::test]
async fn sweep_finds_instance_off_the_default_ports() {
    let catcher = FakeMailCatcher::start_adjacent().await;
    let probe = CountingProbe::new();
    let config = ScanConfig {
        host: String::from("127.0.0.1"),
        ports: PortRange::new(catcher.smtp_port, catcher.api_port).unwrap(),
        skip_default_check: true,
        ..ScanConfig::default()
    };

    let report = ScanCoordinator::new(config)
        .unwrap()
        .with_probe(probe.clone())
        .scan()
        .await;

    assert!(!report.used_default_ports);
    assert_eq!(probe.ports(), vec![catcher.smtp_port, catcher.api_port]);
    assert_eq!(report.smtp_candidates.len(), 1);
    assert_eq!(report.api_candidates.len(), 1);
    assert_eq!(report.instances.len(), 1);
    assert_eq!(report.instances[0].api_port, catcher.api_port);
}

#[tokio::test]
async fn partial_defaults_are_reported_and_swept() {
    let catcher = FakeMailCatcher::start_adjacent().await;
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&events);
    let config = ScanConfig {
        host: String::from("127.0.0.1"),
        ports: PortRange::new(catcher.smtp_port, catcher.api_port).unwrap(),
        default_smtp_port: catcher.smtp_port,
        default_api_port: closed_port().await,
        ..ScanConfig::default()
    };

    let report = ScanCoordinator::new(config)
        .unwrap()
        .with_observer(Arc::new(move |event: &ScanEvent| {
            sink.lock().unwrap().push(event.clone());
        }))
        .scan()
        .await;

    assert!(events.lock().unwrap().contains(&ScanEvent::PartialDefaults {
        smtp_port: Some(catcher.smtp_port),
        api_port: None,
    }));
    assert!(!report.used_default_ports);
    assert_eq!(report.instances.len(), 1);
}

#[tokio::test]
async fn discovery_verifies_and_surveys_found_instances() {
    let catcher = FakeMailCatcher::start().await;
    let config = ScanConfig {
        host: String::from("127.0.0.1"),
        default_smtp_port: catcher.smtp_port,
        default_api_port: catcher.api_port,
        ..ScanConfig::default()
    };
    let service = DiscoveryService::new(ScanCoordinator::new(config).unwrap())
        .with_verifier(VerificationEngine::new(fast_verify()).unwrap())
        .with_endpoint_survey(true);

    let discovery = service.perform_discovery().await;

    assert_eq!(discovery.assessments.len(), 1);
    let assessment = &discovery.assessments[0];
    let verification = assessment.verification.as_ref().unwrap();
    assert!(verification.smtp_test);
    assert!(verification.api_test);
    assert_eq!(verification.message_count_baseline, Some(MessageCount::Known(0)));
    assert_eq!(verification.message_received, Some(true));
    assert_eq!(catcher.received(), 1);

    let working: Vec<&str> = assessment
        .endpoints
        .iter()
        .filter(|check| check.working)
        .map(|check| check.name.as_str())
        .collect();
    assert_eq!(working, vec!["List Messages (v2)", "List Messages (v1)", "Search (v2)"]);
}

#[tokio::test]
async fn discovery_without_verifier_only_lists_instances() {
    let catcher = FakeMailCatcher::start().await;
    let config = ScanConfig {
        host: String::from("127.0.0.1"),
        default_smtp_port: catcher.smtp_port,
        default_api_port: catcher.api_port,
        ..ScanConfig::default()
    };

    let discovery = DiscoveryService::new(ScanCoordinator::new(config).unwrap())
        .perform_discovery()
        .await;

    assert_eq!(discovery.assessments.len(), 1);
    assert!(discovery.assessments[0].verification.is_none());
    assert!(discovery.assessments[0].endpoints.is_empty());
    assert_eq!(catcher.received(), 0);
}
