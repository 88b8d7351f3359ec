//! End-to-end check of a discovered instance.
//!
//! Verification pushes one real message through the SMTP side and looks for it on the
//! HTTP side. Every stage records its own outcome and a failing stage never stops the
//! others, so a broken SMTP leg still leaves the API result in place.

use anyhow::{Context, anyhow, ensure};
use mailscout_common::config::VerifyConfig;
use mailscout_common::service::{EndpointCheck, MessageCount, ServiceInstance, VerificationResult};
use mailscout_protocols::api;
use mailscout_protocols::smtp::{Message, SmtpSession};
use reqwest::{Client, StatusCode};
use tokio::time::{sleep, timeout};
use tracing::{debug, warn};

use crate::network::{http, tcp};

/// Name announced in EHLO/HELO.
const CLIENT_NAME: &str = "mailscout.local";

pub struct VerificationEngine {
    config: VerifyConfig,
    client: Client,
}

impl VerificationEngine {
    pub fn new(config: VerifyConfig) -> anyhow::Result<Self> {
        let client = http::client(config.http_timeout)?;
        Ok(Self { config, client })
    }

    pub fn config(&self) -> &VerifyConfig {
        &self.config
    }

    pub async fn verify(&self, instance: &ServiceInstance) -> VerificationResult {
        let mut result = VerificationResult::default();

        let baseline = match self.fetch_count(instance).await {
            Ok(count) => {
                debug!("{} lists {count} message(s)", instance.api_url);
                result.api_test = true;
                result.message_count_baseline = Some(count);
                Some(count)
            }
            Err(e) => {
                warn!("API check of {} failed: {e:#}", instance.api_url);
                None
            }
        };

        match self.send_probe(instance).await {
            Ok(()) => result.smtp_test = true,
            Err(e) => warn!(
                "SMTP check of {}:{} failed: {e:#}",
                instance.host, instance.smtp_port
            ),
        }

        if let (Some(baseline), true) = (baseline, result.smtp_test) {
            sleep(self.config.settle_delay).await;
            let after = match self.fetch_count(instance).await {
                Ok(count) => Some(count),
                Err(e) => {
                    warn!("Re-reading {} failed: {e:#}", instance.api_url);
                    None
                }
            };
            result.message_received = Some(message_received(baseline, after));
        }

        result
    }

    /// Requests the named API endpoints of `instance` one after another.
    pub async fn survey_endpoints(&self, instance: &ServiceInstance) -> Vec<EndpointCheck> {
        let mut checks = Vec::new();
        for endpoint in api::survey_endpoints(&instance.web_ui_url, &self.config.recipient) {
            let mut request = self.client.get(&endpoint.url);
            if let Some(params) = &endpoint.query {
                request = request.query(params.as_slice());
            }

            let name = endpoint.name.to_string();
            let check = match request.send().await {
                Ok(response) => EndpointCheck {
                    name,
                    url: response.url().to_string(),
                    status: Some(response.status().as_u16()),
                    working: response.status() == StatusCode::OK,
                    error: None,
                },
                Err(e) => EndpointCheck {
                    name,
                    url: e.url().map_or(endpoint.url, |url| url.to_string()),
                    status: None,
                    working: false,
                    error: Some(e.to_string()),
                },
            };
            checks.push(check);
        }
        checks
    }

    async fn fetch_count(&self, instance: &ServiceInstance) -> anyhow::Result<MessageCount> {
        let url = &instance.api_url;
        let response = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("requesting {url}"))?;

        let status = response.status();
        ensure!(status == StatusCode::OK, "{url} answered {status}");

        let body = response.bytes().await.context("reading message listing")?;
        Ok(api::count_raw(instance.api_version, &body))
    }

    async fn send_probe(&self, instance: &ServiceInstance) -> anyhow::Result<()> {
        let message = Message::probe(&self.config.sender, &self.config.recipient);

        let dialogue = async {
            let stream = tcp::connect(&instance.host, instance.smtp_port).await?;
            let mut session = SmtpSession::open(stream, CLIENT_NAME).await?;
            session.send(&message).await?;
            session.quit().await;
            anyhow::Ok(())
        };

        timeout(self.config.smtp_timeout, dialogue)
            .await
            .map_err(|_| anyhow!("no answer within {:?}", self.config.smtp_timeout))?
    }
}

/// Decides whether the test message showed up.
///
/// An unknown baseline counts as received as long as the listing could be read again.
/// A known baseline needs a strictly larger, countable listing.
pub fn message_received(baseline: MessageCount, after: Option<MessageCount>) -> bool {
    match (baseline, after) {
        (_, None) => false,
        (MessageCount::Unknown, Some(_)) => true,
        (MessageCount::Known(before), Some(MessageCount::Known(now))) => now > before,
        (MessageCount::Known(_), Some(MessageCount::Unknown)) => false,
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
