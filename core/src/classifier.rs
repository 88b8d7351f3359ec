//! Protocol sniffing for already-open ports.
//!
//! Both heuristics are deliberately shallow. The SMTP check trusts the first bytes
//! a listener sends, and the API check trusts status codes and JSON shape. Any
//! transport or parse failure simply means "no match".

use std::time::Duration;

use async_trait::async_trait;
use mailscout_common::service::ApiVersion;
use mailscout_protocols::{api, smtp};
use reqwest::{Client, StatusCode};
use serde_json::Value;
use tokio::io::AsyncReadExt;
use tokio::time::timeout;
use tracing::{debug, trace};

use crate::network::{http, tcp};

/// The API flavour and path that answered first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiMatch {
    pub version: ApiVersion,
    pub path: String,
}

#[async_trait]
pub trait ServiceClassifier: Send + Sync {
    /// Whether the greeting sent by `host:port` looks like an SMTP banner.
    async fn classify_smtp(&self, host: &str, port: u16, banner_timeout: Duration) -> bool;

    /// Probes the known API paths below `base_url` (`http://host:port`).
    async fn classify_http_api(&self, base_url: &str) -> Option<ApiMatch>;
}

pub struct ProtocolSniffer {
    client: Client,
}

impl ProtocolSniffer {
    pub fn new(http_timeout: Duration) -> anyhow::Result<Self> {
        Ok(Self {
            client: http::client(http_timeout)?,
        })
    }

    async fn read_greeting(host: &str, port: u16) -> std::io::Result<String> {
        let mut stream = tcp::connect(host, port).await?;
        let mut buffer = [0u8; smtp::BANNER_BUFFER_SIZE];
        let n = stream.read(&mut buffer).await?;
        Ok(String::from_utf8_lossy(&buffer[..n]).into_owned())
    }

    async fn matches_path(&self, base_url: &str, path: &str, version: ApiVersion) -> bool {
        let url = format!("{base_url}{path}");
        let response = match self.client.get(&url).send().await {
            Ok(response) => response,
            Err(e) => {
                trace!("{url}: {e}");
                return false;
            }
        };

        if response.status() != StatusCode::OK {
            trace!("{url}: status {}", response.status());
            return false;
        }

        let body: Option<Value> = if api::needs_json(version) {
            response.json::<Value>().await.ok()
        } else {
            None
        };

        api::accepts(version, body.as_ref())
    }

    async fn looks_like_web_ui(&self, base_url: &str) -> bool {
        let url = format!("{base_url}{}", api::WEB_ROOT_PATH);
        match self.client.get(&url).send().await {
            Ok(response) => match response.text().await {
                Ok(page) => api::looks_like_web_ui(&page),
                Err(_) => false,
            },
            Err(e) => {
                trace!("{url}: {e}");
                false
            }
        }
    }
}

#[async_trait]
impl ServiceClassifier for ProtocolSniffer {
    async fn classify_smtp(&self, host: &str, port: u16, banner_timeout: Duration) -> bool {
        match timeout(banner_timeout, Self::read_greeting(host, port)).await {
            Ok(Ok(greeting)) => {
                let is_smtp = smtp::looks_like_smtp_banner(&greeting);
                debug!("{host}:{port} greeted with {:?} (smtp: {is_smtp})", greeting.trim_end());
                is_smtp
            }
            Ok(Err(e)) => {
                trace!("{host}:{port} greeting failed: {e}");
                false
            }
            Err(_elapsed) => {
                trace!("{host}:{port} sent no greeting in time");
                false
            }
        }
    }

    async fn classify_http_api(&self, base_url: &str) -> Option<ApiMatch> {
        for (path, version) in api::PROBE_ORDER {
            if self.matches_path(base_url, path, version).await {
                debug!("{base_url}{path} answered as {version} API");
                return Some(ApiMatch {
                    version,
                    path: path.to_string(),
                });
            }
        }

        if self.looks_like_web_ui(base_url).await {
            debug!("{base_url} serves the web interface");
            return Some(ApiMatch {
                version: ApiVersion::WebInterface,
                path: api::WEB_ROOT_PATH.to_string(),
            });
        }

        None
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
