use std::sync::Arc;

use anyhow::bail;
use tracing::{Instrument, info_span};

use crate::commands::VerifyArgs;
use crate::commands::scan::print_assessments;
use crate::terminal::{print, spinner::SpinnerObserver};
use mailscout_common::config::Config;
use mailscout_core::discovery::DiscoveryService;
use mailscout_core::scanner::ScanCoordinator;
use mailscout_core::verification::VerificationEngine;

pub async fn verify(args: VerifyArgs, cfg: &Config) -> anyhow::Result<()> {
    let span = info_span!("verify", indicatif.pb_show = true);
    let observer = Arc::new(SpinnerObserver::new(span.clone()));

    let coordinator = ScanCoordinator::new(args.scan_config())?.with_observer(observer);
    let service = DiscoveryService::new(coordinator)
        .with_verifier(VerificationEngine::new(args.verify_config())?)
        .with_endpoint_survey(!args.no_endpoints);

    let assessment = async {
        let instance = service
            .scanner()
            .resolve_instance(args.smtp_port, args.api_port)
            .await?;
        Some(service.assess(&instance).await)
    }
    .instrument(span)
    .await;

    let Some(assessment) = assessment else {
        bail!(
            "{}:{} does not serve a mail catcher API",
            args.host,
            args.api_port
        );
    };

    if cfg.json {
        println!("{}", serde_json::to_string_pretty(&assessment)?);
        return Ok(());
    }

    print::header("Verification", cfg.quiet);
    print_assessments(std::slice::from_ref(&assessment), cfg);
    Ok(())
}
