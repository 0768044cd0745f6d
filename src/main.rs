use anyhow::Context;
use course_rag::{
    api::routes::build_app,
    cli::{commands, output::Output, Cli, Commands},
    utils::toml_config::ServerConfig,
    AppConfig, AppState, RagSystem,
};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse_args();
    let output = if cli.no_color {
        Output::no_color()
    } else {
        Output::new()
    };

    if !cli.config.exists() {
        output.warning(&format!(
            "{} not found, using built-in defaults",
            cli.config.display()
        ));
        output.hint("Copy course-rag.toml from the repository to change ports, models or the vector store");
    }
    let config = match AppConfig::load_or_default(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            output.error(&e.to_string());
            std::process::exit(1);
        }
    };

    init_tracing(&config.server);

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Config { validate } => {
            commands::show_config(&config, &cli.config, validate, &output)
        }
        Commands::Ingest { path, clear } => {
            let system = RagSystem::from_config(&config).await?;
            commands::ingest(&system, &path, clear, &output).await?;
            Ok(())
        }
        Commands::Serve => serve(config, &output).await,
    }
}

fn init_tracing(server: &ServerConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("course_rag={0},tower_http={0}", server.log_level)));

    let registry = tracing_subscriber::registry().with(filter);
    if server.log_format == "json" {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

async fn serve(config: AppConfig, output: &Output) -> anyhow::Result<()> {
    output.banner();

    let system = Arc::new(
        RagSystem::from_config(&config)
            .await
            .context("failed to initialise the RAG system")?,
    );

    let docs = Path::new(&config.rag.docs_path);
    match system.add_course_folder(docs, false).await {
        Ok(summary) => info!(
            courses = summary.courses,
            chunks = summary.chunks,
            "Startup ingestion finished"
        ),
        Err(e) => warn!(error = %e, "Startup ingestion failed"),
    }

    let addr = config.bind_address();
    let state = AppState {
        system,
        config: Arc::new(config),
    };
    let app = build_app(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    output.success(&format!("Listening on http://{}", addr));
    info!(address = %addr, "Server started");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
    }
}
