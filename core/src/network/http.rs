use std::time::Duration;

use anyhow::Context;
use reqwest::Client;

const USER_AGENT: &str = concat!("mailscout/", env!("CARGO_PKG_VERSION"));

/// HTTP client shared by the classifier and the verification engine.
///
/// `request_timeout` bounds each request as a whole, body included.
pub fn client(request_timeout: Duration) -> anyhow::Result<Client> {
    Client::builder()
        .timeout(request_timeout)
        .connect_timeout(request_timeout)
        .user_agent(USER_AGENT)
        .build()
        .context("building HTTP client")
}
