use std::time::Duration;

use httpmock::prelude::*;
use mailscout_common::config::VerifyConfig;
use mailscout_common::service::{ApiVersion, MessageCount, ServiceInstance};
use mailscout_core::verification::VerificationEngine;

use crate::support::{FakeMailCatcher, closed_port};

fn engine() -> VerificationEngine {
    VerificationEngine::new(VerifyConfig {
        settle_delay: Duration::from_millis(50),
        smtp_timeout: Duration::from_secs(2),
        ..VerifyConfig::default()
    })
    .unwrap()
}

#[tokio::test]
async fn delivered_message_raises_the_count() {
    let catcher = FakeMailCatcher::start().await;
    let instance = ServiceInstance::new(
        "127.0.0.1",
        catcher.smtp_port,
        catcher.api_port,
        ApiVersion::V2,
        "/api/v2/messages",
    );

    let result = engine().verify(&instance).await;

    assert!(result.api_test);
    assert!(result.smtp_test);
    assert_eq!(result.message_count_baseline, Some(MessageCount::Known(0)));
    assert_eq!(result.message_received, Some(true));
    assert_eq!(catcher.received(), 1);
}

#[tokio::test]
async fn v1_listing_is_counted_too() {
    let catcher = FakeMailCatcher::start().await;
    let instance = ServiceInstance::new(
        "127.0.0.1",
        catcher.smtp_port,
        catcher.api_port,
        ApiVersion::V1,
        "/api/v1/messages",
    );

    let first = engine().verify(&instance).await;
    let second = engine().verify(&instance).await;

    assert_eq!(first.message_count_baseline, Some(MessageCount::Known(0)));
    assert_eq!(second.message_count_baseline, Some(MessageCount::Known(1)));
    assert_eq!(second.message_received, Some(true));
}

#[tokio::test]
async fn unknown_baseline_falls_back_to_received() {
    let catcher = FakeMailCatcher::start().await;
    let instance = ServiceInstance::new(
        "127.0.0.1",
        catcher.smtp_port,
        catcher.api_port,
        ApiVersion::WebInterface,
        "/",
    );

    let result = engine().verify(&instance).await;

    assert_eq!(result.message_count_baseline, Some(MessageCount::Unknown));
    assert_eq!(result.message_received, Some(true));
}

#[tokio::test]
async fn broken_smtp_leg_keeps_the_api_result() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/v2/messages");
            then.status(200)
                .header("Content-Type", "application/json")
                .body(r#"{"total":4,"count":4,"start":0,"items":[{},{},{},{}]}"#);
        })
        .await;
    let instance = ServiceInstance::new(
        "127.0.0.1",
        closed_port().await,
        server.port(),
        ApiVersion::V2,
        "/api/v2/messages",
    );

    let result = engine().verify(&instance).await;

    assert!(!result.smtp_test);
    assert!(result.api_test);
    assert_eq!(result.message_count_baseline, Some(MessageCount::Known(4)));
    assert_eq!(result.message_received, None);
}

#[tokio::test]
async fn broken_api_leg_keeps_the_smtp_result() {
    let catcher = FakeMailCatcher::start().await;
    let instance = ServiceInstance::new(
        "127.0.0.1",
        catcher.smtp_port,
        catcher.api_port,
        ApiVersion::V2,
        "/api/v3/messages",
    );

    let result = engine().verify(&instance).await;

    assert!(result.smtp_test);
    assert!(!result.api_test);
    assert_eq!(result.message_count_baseline, None);
    assert_eq!(result.message_received, None);
    assert_eq!(catcher.received(), 1);
}
