use colored::*;
use mailscout_common::service::{EndpointCheck, MessageCount, ServiceInstance, VerificationResult};

use crate::terminal::colors;

pub type Detail = (String, ColoredString);

fn pass_fail(ok: bool) -> ColoredString {
    if ok {
        "passed".color(colors::PASS).bold()
    } else {
        "failed".color(colors::FAIL).bold()
    }
}

pub fn instance_to_details(instance: &ServiceInstance) -> Vec<Detail> {
    vec![
        (
            String::from("SMTP"),
            format!("{}:{}", instance.host, instance.smtp_port).color(colors::PORT),
        ),
        (
            String::from("API"),
            instance.api_url.color(colors::URL),
        ),
        (
            String::from("Version"),
            instance.api_version.to_string().color(colors::ACCENT),
        ),
        (
            String::from("Web UI"),
            instance.web_ui_url.color(colors::URL),
        ),
    ]
}

pub fn verification_to_details(result: &VerificationResult) -> Vec<Detail> {
    let baseline: ColoredString = match result.message_count_baseline {
        Some(MessageCount::Known(count)) => count.to_string().color(colors::TEXT_DEFAULT),
        Some(MessageCount::Unknown) => "unknown".color(colors::UNKNOWN),
        None => "-".color(colors::SEPARATOR),
    };
    let received: ColoredString = match result.message_received {
        Some(true) => "yes".color(colors::PASS).bold(),
        Some(false) => "no".color(colors::FAIL).bold(),
        None => "indeterminate".color(colors::UNKNOWN),
    };

    vec![
        (String::from("API test"), pass_fail(result.api_test)),
        (String::from("SMTP test"), pass_fail(result.smtp_test)),
        (String::from("Messages"), baseline),
        (String::from("Received"), received),
    ]
}

pub fn endpoints_to_details(checks: &[EndpointCheck]) -> Vec<Detail> {
    checks
        .iter()
        .map(|check| {
            let value: ColoredString = match (check.status, &check.error) {
                (Some(status), _) if check.working => status.to_string().color(colors::PASS),
                (Some(status), _) => status.to_string().color(colors::FAIL),
                (None, Some(error)) => error.color(colors::FAIL),
                (None, None) => "error".color(colors::FAIL),
            };
            (check.name.clone(), value)
        })
        .collect()
}

/// One-line verdict for the quiet output level.
pub fn verdict(result: Option<&VerificationResult>) -> ColoredString {
    match result {
        None => "not verified".color(colors::SEPARATOR),
        Some(result) if result.message_received == Some(true) => "working".color(colors::PASS).bold(),
        Some(result) if result.api_test && result.smtp_test => "message missing".color(colors::UNKNOWN),
        Some(_) => "broken".color(colors::FAIL).bold(),
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
