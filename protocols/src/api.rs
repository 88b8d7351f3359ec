//! Shape rules for the mail catcher HTTP API.

use mailscout_common::service::{ApiVersion, MessageCount};
use serde_json::Value;

pub const V2_MESSAGES_PATH: &str = "/api/v2/messages";
pub const V1_MESSAGES_PATH: &str = "/api/v1/messages";
pub const API_ROOT_PATH: &str = "/api";
pub const WEB_ROOT_PATH: &str = "/";

/// Substring of the root page that identifies the web interface.
pub const WEB_UI_MARKER: &str = "MailHog";

/// Probe order for API detection. The first path that matches wins.
pub const PROBE_ORDER: [(&str, ApiVersion); 3] = [
    (V2_MESSAGES_PATH, ApiVersion::V2),
    (V1_MESSAGES_PATH, ApiVersion::V1),
    (API_ROOT_PATH, ApiVersion::Unknown),
];

/// Whether a `200 OK` body satisfies the expectations for `version`.
///
/// `body` is `None` when the response was not valid JSON.
pub fn accepts(version: ApiVersion, body: Option<&Value>) -> bool {
    match version {
        ApiVersion::V2 => body
            .and_then(Value::as_object)
            .is_some_and(|obj| obj.contains_key("items")),
        ApiVersion::V1 => body.is_some(),
        ApiVersion::Unknown => true,
        ApiVersion::WebInterface => false,
    }
}

/// Only the versioned listings need their body parsed.
pub fn needs_json(version: ApiVersion) -> bool {
    matches!(version, ApiVersion::V2 | ApiVersion::V1)
}

pub fn looks_like_web_ui(page: &str) -> bool {
    page.contains(WEB_UI_MARKER)
}

/// Counts the messages of a listing body.
///
/// v2 objects report `total` when present and the length of `items` otherwise. A
/// bare JSON array counts its elements. Anything else cannot be counted.
pub fn count_messages(version: ApiVersion, body: &Value) -> MessageCount {
    if version == ApiVersion::V2 {
        if let Some(obj) = body.as_object() {
            if let Some(total) = obj.get("total").and_then(Value::as_u64) {
                return MessageCount::Known(total as usize);
            }
            if let Some(items) = obj.get("items").and_then(Value::as_array) {
                return MessageCount::Known(items.len());
            }
        }
    }

    match body.as_array() {
        Some(list) => MessageCount::Known(list.len()),
        None => MessageCount::Unknown,
    }
}

/// Same as [`count_messages`] for a raw body, which may not be JSON at all.
pub fn count_raw(version: ApiVersion, raw: &[u8]) -> MessageCount {
    match serde_json::from_slice::<Value>(raw) {
        Ok(body) => count_messages(version, &body),
        Err(_) => MessageCount::Unknown,
    }
}

/// A named endpoint checked after an instance was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SurveyEndpoint<'a> {
    pub name: &'static str,
    pub url: String,
    /// Query parameters, left for the HTTP client to encode.
    pub query: Option<[(&'static str, &'a str); 2]>,
}

pub fn survey_endpoints<'a>(web_ui_url: &str, address: &'a str) -> Vec<SurveyEndpoint<'a>> {
    let plain = |name, path: &str| SurveyEndpoint {
        name,
        url: format!("{web_ui_url}{path}"),
        query: None,
    };
    let search = |name, path: &str| SurveyEndpoint {
        name,
        url: format!("{web_ui_url}{path}"),
        query: Some([("kind", "to"), ("query", address)]),
    };

    vec![
        plain("List Messages (v2)", V2_MESSAGES_PATH),
        plain("List Messages (v1)", V1_MESSAGES_PATH),
        plain("Events Stream", "/api/v1/events"),
        search("Search (v2)", "/api/v2/search"),
        search("Search (v1)", "/api/v1/search"),
    ]
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
