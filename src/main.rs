use std::sync::Arc;

use lead_assist::campaigns::Campaigns;
use lead_assist::channels::chat_routes;
use lead_assist::config::AppConfig;
use lead_assist::error::{ChannelError, Result};
use lead_assist::leads::{LeadSink, LeadWriter, LibSqlLeadStore, SheetsConfig, SheetsLeadSink};
use lead_assist::notify::{AgentNotifier, NoopNotifier, SmtpConfig, SmtpNotifier};
use lead_assist::orchestrator::{Orchestrator, spawn_idle_sweeper};

#[tokio::main]
async fn main() -> Result<()> {
    // Install rustls crypto provider before any TLS usage
    rustls::crypto::ring::default_provider()
        .install_default()
        .expect("Failed to install rustls crypto provider");

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = AppConfig::from_env()?;

    // ── Lead sink ────────────────────────────────────────────────────────
    let (sink, sink_name): (Arc<dyn LeadSink>, String) = match SheetsConfig::from_env() {
        Some(sheets) => {
            let name = format!("Google Sheet {} ({})", sheets.spreadsheet_id, sheets.sheet_name);
            (Arc::new(SheetsLeadSink::new(sheets)) as Arc<dyn LeadSink>, name)
        }
        None => {
            let store = LibSqlLeadStore::new_local(&config.db_path).await?;
            (Arc::new(store) as Arc<dyn LeadSink>, config.db_path.display().to_string())
        }
    };
    let (leads, _writer_handle) = LeadWriter::spawn(sink);

    // ── Agent notifications ──────────────────────────────────────────────
    let (notifier, notifier_name): (Arc<dyn AgentNotifier>, &str) = match SmtpConfig::from_env()? {
        Some(smtp) => (Arc::new(SmtpNotifier::new(smtp)) as Arc<dyn AgentNotifier>, "smtp"),
        None => (Arc::new(NoopNotifier) as Arc<dyn AgentNotifier>, "disabled"),
    };

    // ── Conversation ─────────────────────────────────────────────────────
    let campaigns = Arc::new(Campaigns::new(leads, notifier));
    let orchestrator = Arc::new(Orchestrator::new(campaigns, config.dedup_window));
    let _sweeper = spawn_idle_sweeper(
        Arc::clone(&orchestrator),
        config.sweep_interval,
        config.session_idle_timeout,
    );

    eprintln!("🛡️  Lead Assist v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Chat WS: ws://0.0.0.0:{}/ws", config.port);
    eprintln!("   Sessions API: http://0.0.0.0:{}/api/sessions", config.port);
    eprintln!("   Leads: {}", sink_name);
    eprintln!("   Agent email: {}\n", notifier_name);

    let app = chat_routes(orchestrator);
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| ChannelError::Bind {
            addr: addr.clone(),
            reason: e.to_string(),
        })?;
    tracing::info!("Chat server listening on {}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
