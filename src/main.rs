use std::sync::Arc;

use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

use intake_assist::cli;
use intake_assist::config::AppConfig;
use intake_assist::error::Result;
use intake_assist::intake::{
    FlowDefinition, FlowEngine, IntakeRouteState, ModeKeywords, ModeRouter, SessionStore,
    intake_routes,
};
use intake_assist::llm::create_provider;
use intake_assist::qa::{HttpRetriever, HybridAnswerer};

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env is fine; real env vars still apply.
    dotenvy::dotenv().ok();

    let config = AppConfig::from_env()?;

    // Initialize tracing: stderr always, plus a daily file when INTAKE_LOG_DIR is set.
    let (file_layer, _log_guard) = match &config.log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "intake-assist.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .with(file_layer)
        .init();

    let addr = config.bind_addr()?;

    eprintln!("📝 Intake Assist v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Model: {} (groq)", config.qa_model);
    eprintln!("   Submit: POST http://{addr}/flow/submit");
    eprintln!("   Reset:  POST http://{addr}/flow/reset?session_id=...");
    eprintln!("   Session: GET http://{addr}/flow/session/{{id}}");

    // ── Q&A collaborator ────────────────────────────────────────────────
    let llm = match config.llm_config() {
        Some(llm_config) => Some(create_provider(&llm_config)?),
        None => {
            tracing::warn!("GROQ_API_KEY not set; Q&A questions will fail until it is configured");
            None
        }
    };

    let mut answerer = HybridAnswerer::new(llm, config.qa_topic.clone());
    match &config.retriever_url {
        Some(url) => {
            let retriever = HttpRetriever::new(url.clone())?;
            answerer = answerer.with_retriever(Arc::new(retriever), config.retriever_top_k);
            eprintln!("   Retriever: {url} (top {})", config.retriever_top_k);
        }
        None => eprintln!("   Retriever: none (questions answered directly)"),
    }

    // ── Intake flow ─────────────────────────────────────────────────────
    let flow = Arc::new(FlowDefinition::project_intake());
    let router = Arc::new(ModeRouter::new(
        SessionStore::new(),
        FlowEngine::new(flow),
        Arc::new(answerer),
        ModeKeywords::new(&config.flow_keyword, &config.qa_keyword),
    ));

    // ── REST server ─────────────────────────────────────────────────────
    let app = intake_routes(IntakeRouteState {
        router: Arc::clone(&router),
    });
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "Intake server started");

    if !config.cli_enabled {
        eprintln!();
        axum::serve(listener, app).await?;
        return Ok(());
    }

    let server = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!(error = %e, "Intake server stopped");
        }
    });

    eprintln!("   Type a message and press Enter. /reset to start over, /quit to exit.");
    cli::run_stdio(router).await?;
    server.abort();

    Ok(())
}
