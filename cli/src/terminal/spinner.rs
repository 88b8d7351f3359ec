use std::sync::atomic::{AtomicBool, Ordering};

use colored::*;
use indicatif::ProgressStyle;
use mailscout_common::observer::{ScanEvent, ScanObserver, ScanPhase};
use mailscout_common::service::ServiceKind;
use mailscout_common::{info, success, warn};
use tracing::Span;
use tracing_indicatif::span_ext::IndicatifSpanExt;

use crate::terminal::colors;

const TICKS: &[&str] = &[
    "▁▁▁▁▁",
    "▁▂▂▂▁",
    "▁▄▂▄▁",
    "▂▄▆▄▂",
    "▄▆█▆▄",
    "▂▄▆▄▂",
    "▁▄▂▄▁",
    "▁▂▂▂▁",
];

pub fn spinner_style() -> ProgressStyle {
    ProgressStyle::with_template("{spinner:.blue} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_strings(TICKS)
}

fn sweep_style() -> ProgressStyle {
    ProgressStyle::with_template("{spinner:.blue} {msg} {wide_bar:.green/black} {pos}/{len}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .tick_strings(TICKS)
        .progress_chars("━╸ ")
}

/// Renders scan events on the progress bar attached to `span` and logs findings.
pub struct SpinnerObserver {
    span: Span,
    sweeping: AtomicBool,
}

impl SpinnerObserver {
    pub fn new(span: Span) -> Self {
        span.pb_set_style(&spinner_style());
        Self {
            span,
            sweeping: AtomicBool::new(false),
        }
    }

    fn set_message(&self, msg: &str) {
        self.span
            .pb_set_message(&msg.color(colors::TEXT_DEFAULT).to_string());
    }
}

impl ScanObserver for SpinnerObserver {
    fn on_event(&self, event: &ScanEvent) {
        match event {
            ScanEvent::PhaseStarted(phase) => {
                let msg = match phase {
                    ScanPhase::DefaultPorts => "Checking the default ports...",
                    ScanPhase::Sweep => "Looking for open ports...",
                    ScanPhase::SmtpPass => "Looking for SMTP greetings...",
                    ScanPhase::ApiPass => "Looking for mail catcher APIs...",
                };
                if *phase != ScanPhase::Sweep && self.sweeping.swap(false, Ordering::Relaxed) {
                    self.span.pb_set_style(&spinner_style());
                }
                self.set_message(msg);
            }
            ScanEvent::DefaultPortsClosed => info!("Nothing listens on the default ports"),
            ScanEvent::DefaultPortUnrecognised { port } => {
                warn!("Port {port} is open but does not look like a mail catcher")
            }
            ScanEvent::PartialDefaults {
                smtp_port,
                api_port,
            } => {
                let found = match (smtp_port, api_port) {
                    (Some(port), _) => format!("SMTP on {port}"),
                    (_, Some(port)) => format!("API on {port}"),
                    (None, None) => String::from("nothing"),
                };
                warn!("Only part of a mail catcher on the default ports ({found}), sweeping")
            }
            ScanEvent::SweepStarted { range, total } => {
                self.sweeping.store(true, Ordering::Relaxed);
                self.span.pb_set_style(&sweep_style());
                self.span.pb_set_length(*total as u64);
                self.span.pb_set_position(0);
                self.set_message(&format!("Sweeping {range}"));
            }
            ScanEvent::PortProbed { port, open } => {
                if self.sweeping.load(Ordering::Relaxed) {
                    self.span.pb_inc(1);
                }
                if *open {
                    info!("Port {} is open", port.to_string().color(colors::PORT));
                }
            }
            ScanEvent::SweepFinished { open } => {
                info!("{} open port(s) in range", open.to_string().bold())
            }
            ScanEvent::ServiceFound(candidate) => match (candidate.kind, candidate.api_version) {
                (ServiceKind::Smtp, _) => success!(
                    "SMTP service on port {}",
                    candidate.port.to_string().color(colors::PORT)
                ),
                (_, Some(version)) => success!(
                    "Mail catcher API ({}) on port {}{}",
                    version.to_string().color(colors::ACCENT),
                    candidate.port.to_string().color(colors::PORT),
                    candidate.api_path.as_deref().unwrap_or_default()
                ),
                _ => {}
            },
            ScanEvent::ApiSearchStopped { port } => {
                info!("API found on {port} next to an SMTP service, not looking further")
            }
            ScanEvent::InstanceFound(instance) => success!(
                "Instance smtp:{} api:{}",
                instance.smtp_port.to_string().color(colors::PORT),
                instance.api_port.to_string().color(colors::PORT)
            ),
        }
    }
}
