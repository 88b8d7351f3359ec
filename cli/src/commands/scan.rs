use std::sync::Arc;
use std::time::{Duration, Instant};

use colored::*;
use tracing::{Instrument, info_span};

use crate::commands::ScanArgs;
use crate::{mprint, terminal::{colors, format, print, spinner::SpinnerObserver}};
use mailscout_common::config::{Config, VerifyConfig};
use mailscout_common::service::{Discovery, InstanceAssessment};
use mailscout_common::success;
use mailscout_core::discovery::DiscoveryService;
use mailscout_core::scanner::ScanCoordinator;
use mailscout_core::verification::VerificationEngine;

pub async fn scan(args: ScanArgs, cfg: &Config) -> anyhow::Result<()> {
    let scan_config = args.scan_config();
    print_parameters(&args, cfg);

    let span = info_span!("scan", indicatif.pb_show = true);
    let observer = Arc::new(SpinnerObserver::new(span.clone()));

    let coordinator = ScanCoordinator::new(scan_config)?.with_observer(observer);
    let mut service = DiscoveryService::new(coordinator).with_endpoint_survey(!args.no_endpoints);
    if !args.no_verify {
        service = service.with_verifier(VerificationEngine::new(VerifyConfig::default())?);
    }

    let start_time: Instant = Instant::now();
    let discovery: Discovery = service.perform_discovery().instrument(span).await;

    if cfg.json {
        println!("{}", serde_json::to_string_pretty(&discovery)?);
        return Ok(());
    }

    scan_ends(&discovery, start_time.elapsed(), cfg);
    Ok(())
}

fn print_parameters(args: &ScanArgs, cfg: &Config) {
    if cfg.quiet > 0 || cfg.json {
        return;
    }

    let width: usize = 11;
    print::aligned_line("Host", args.host.as_str(), width);
    print::aligned_line("Ports", args.ports.to_string(), width);
    print::aligned_line("Concurrency", args.concurrency.to_string(), width);
    if args.skip_default_check {
        print::aligned_line("Defaults", "skipped", width);
    }
}

fn scan_ends(discovery: &Discovery, total_time: Duration, cfg: &Config) {
    if discovery.assessments.is_empty() {
        no_instances_found(discovery, cfg);
        return;
    }

    if cfg.quiet > 0 {
        mprint!();
    }

    print::header("Mail Catchers", cfg.quiet);
    print_assessments(&discovery.assessments, cfg);
    print_summary(discovery, total_time, cfg);
}

fn no_instances_found(discovery: &Discovery, cfg: &Config) {
    print::header("ZERO INSTANCES DETECTED", cfg.quiet);
    let report = &discovery.report;
    print::no_results(report.open_ports.len());

    if !report.smtp_candidates.is_empty() || !report.api_candidates.is_empty() {
        mprint!(&format!(
            "{} SMTP and {} API candidate(s) found, but none could be paired",
            report.smtp_candidates.len(),
            report.api_candidates.len()
        ));
    }
}

pub fn print_assessments(assessments: &[InstanceAssessment], cfg: &Config) {
    for (idx, assessment) in assessments.iter().enumerate() {
        match cfg.quiet {
            2 => {}
            1 => print_verdict(idx, assessment),
            _ => print_assessment_tree(idx, assessment),
        }
        if cfg.quiet == 0 && idx + 1 != assessments.len() {
            mprint!();
        }
    }
}

fn print_verdict(idx: usize, assessment: &InstanceAssessment) {
    let instance = &assessment.instance;
    print::tree_head(
        idx,
        &format!(
            "smtp:{} api:{} {}",
            instance.smtp_port,
            instance.api_port,
            format::verdict(assessment.verification.as_ref())
        ),
    );
}

fn print_assessment_tree(idx: usize, assessment: &InstanceAssessment) {
    let instance = &assessment.instance;
    print::tree_head(idx, &format!("{}:{}", instance.host, instance.api_port));

    let mut details = format::instance_to_details(instance);
    if let Some(verification) = &assessment.verification {
        details.extend(format::verification_to_details(verification));
    }
    print::as_tree_one_level(details);

    if !assessment.endpoints.is_empty() {
        print::print_status("Endpoints".color(colors::SECONDARY).to_string());
        print::as_tree_one_level(format::endpoints_to_details(&assessment.endpoints));
    }
}

fn print_summary(discovery: &Discovery, total_time: Duration, cfg: &Config) {
    let count: usize = discovery.assessments.len();
    let instances: ColoredString = format!("{count} instance(s)").bold().green();
    let total_time: ColoredString = format!("{:.2}s", total_time.as_secs_f64()).bold().yellow();
    let shortcut: &str = if discovery.report.used_default_ports {
        " on the default ports"
    } else {
        ""
    };
    let output: ColoredString =
        format!("Scan Complete: {instances} found{shortcut} in {total_time}").color(colors::TEXT_DEFAULT);

    match cfg.quiet {
        0 => {
            print::fat_separator();
            print::centerln(&output.to_string());
        }
        _ => {
            mprint!();
            success!("{}", output)
        }
    }
}
