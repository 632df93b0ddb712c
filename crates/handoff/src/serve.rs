// SPDX-FileCopyrightText: 2026 Handoff Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `handoff serve` command implementation.
//!
//! Wires the configured adapters into the delivery orchestrator, then runs
//! the HTTP gateway and the retry runner until SIGINT or SIGTERM.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use handoff_attachments::HttpAttachmentFetcher;
use handoff_config::HandoffConfig;
use handoff_conversation::ChatKitClient;
use handoff_core::{
    AdapterType, AttachmentFetcher, AttributionLog, Clock, HandoffError, MailTransport,
    PluginAdapter, RecordStore, ScheduleStore, Summarizer, SystemClock,
};
use handoff_email::SmtpMailTransport;
use handoff_gateway::{GatewayState, HealthState, RetryAuth, ServerConfig, start_server};
use handoff_pipeline::{DeliveryOrchestrator, PipelineDeps, RetryRunner};
use handoff_security::{redactor_for, ssrf_policy_for};
use handoff_storage::{SqliteRecordStore, SqliteScheduleStore};
use handoff_summarizer::OpenAiSummarizer;

/// Everything `serve` runs, built from configuration.
struct Services {
    orchestrator: Arc<DeliveryOrchestrator>,
    runner: RetryRunner,
    health: HealthState,
}

/// Runs the `handoff serve` command.
pub async fn run_serve(config: HandoffConfig) -> Result<(), HandoffError> {
    init_tracing(&config.service.log_level);

    info!(service = %config.service.name, "starting handoff serve");

    let services = build_services(&config).await?;
    let adapters = services.health.adapters.clone();

    let cancel = install_signal_handler();

    let runner = tokio::spawn(services.runner.run(cancel.clone()));

    let state = GatewayState {
        orchestrator: services.orchestrator,
        auth: RetryAuth::new(config.server.retry_token.clone()),
        redactor: redactor_for(&config),
        health: services.health,
    };
    let server_config = ServerConfig {
        host: config.server.host.clone(),
        port: config.server.port,
        max_body_bytes: config.server.max_body_bytes,
    };

    let served = start_server(&server_config, state, cancel.clone()).await;

    // A bind failure returns before any signal; stop the runner either way.
    cancel.cancel();
    if let Err(e) = runner.await {
        warn!(error = %e, "retry runner task ended abnormally");
    }

    for adapter in &adapters {
        if let Err(e) = adapter.shutdown().await {
            warn!(adapter = adapter.name(), error = %e, "adapter shutdown failed");
        }
    }

    info!("handoff serve stopped");
    served
}

async fn build_services(config: &HandoffConfig) -> Result<Services, HandoffError> {
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let mut adapters: Vec<Arc<dyn PluginAdapter>> = Vec::new();
    let mut not_configured = Vec::new();

    let records = Arc::new(SqliteRecordStore::open(&config.storage).await?);
    let schedules = Arc::new(SqliteScheduleStore::with_clock(
        records.database().clone(),
        clock.clone(),
    ));
    adapters.push(records.clone());
    adapters.push(schedules.clone());
    info!(path = %config.storage.database_path, "storage initialized");

    let conversation = Arc::new(ChatKitClient::new(&config.conversation)?);
    adapters.push(conversation.clone());

    let summarizer: Option<Arc<dyn Summarizer>> = if config.summarizer.enabled {
        let client = Arc::new(OpenAiSummarizer::new(&config.summarizer)?);
        adapters.push(client.clone());
        info!(model = %config.summarizer.model, "summarizer initialized");
        Some(client as Arc<dyn Summarizer>)
    } else {
        not_configured.push(AdapterType::Summarizer);
        warn!("summarizer disabled, every trigger will report not_ready");
        None
    };

    let transport: Option<Arc<dyn MailTransport>> = if config.mail.enabled {
        let smtp = Arc::new(SmtpMailTransport::new(&config.mail)?);
        adapters.push(smtp.clone());
        info!(
            host = %config.mail.smtp_host,
            recipients = config.mail.to.len(),
            "mail transport initialized"
        );
        Some(smtp as Arc<dyn MailTransport>)
    } else {
        not_configured.push(AdapterType::MailTransport);
        warn!("mail disabled, ready leads will be rejected with transport_not_configured");
        None
    };

    let fetcher: Option<Arc<dyn AttachmentFetcher>> = if config.attachments.inline_enabled {
        let http = Arc::new(HttpAttachmentFetcher::new(
            ssrf_policy_for(config),
            Duration::from_secs(config.attachments.fetch_timeout_secs),
        )?);
        adapters.push(http.clone());
        Some(http as Arc<dyn AttachmentFetcher>)
    } else {
        not_configured.push(AdapterType::AttachmentFetcher);
        debug!("attachment inlining disabled");
        None
    };

    let orchestrator = Arc::new(DeliveryOrchestrator::new(
        config,
        PipelineDeps {
            conversation,
            summarizer,
            records: Some(records.clone() as Arc<dyn RecordStore>),
            attribution: Some(records.clone() as Arc<dyn AttributionLog>),
            schedules: Some(schedules.clone() as Arc<dyn ScheduleStore>),
            transport,
            fetcher,
            clock: clock.clone(),
        },
    ));

    let runner = RetryRunner::new(
        orchestrator.clone(),
        schedules,
        Some(records as Arc<dyn RecordStore>),
        clock,
        Duration::from_secs(config.pipeline.retry_poll_interval_secs),
        Duration::from_secs(config.pipeline.purge_interval_secs),
    );

    info!(
        adapters = adapters.len(),
        not_configured = not_configured.len(),
        "pipeline wired"
    );

    Ok(Services {
        orchestrator,
        runner,
        health: HealthState {
            start_time: Instant::now(),
            service_name: config.service.name.clone(),
            adapters,
            not_configured,
        },
    })
}

/// Cancels the returned token on SIGINT or SIGTERM.
fn install_signal_handler() -> CancellationToken {
    let token = CancellationToken::new();
    let trigger = token.clone();

    tokio::spawn(async move {
        wait_for_signal().await;
        trigger.cancel();
        debug!("shutdown signal handler completed");
    });

    token
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    match signal(SignalKind::terminate()) {
        Ok(mut sigterm) => {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    info!("received SIGINT (Ctrl+C), initiating shutdown");
                }
                _ = sigterm.recv() => {
                    info!("received SIGTERM, initiating shutdown");
                }
            }
        }
        Err(e) => {
            warn!(error = %e, "SIGTERM handler unavailable, listening for Ctrl+C only");
            let _ = tokio::signal::ctrl_c().await;
            info!("received SIGINT (Ctrl+C), initiating shutdown");
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("received Ctrl+C, initiating shutdown");
}

/// Initializes the tracing subscriber; `RUST_LOG` wins over `log_level`.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("handoff={log_level},tower_http={log_level},warn"))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
