use anyhow::Result;
use clap::Parser;
use grubot_core::{AppConfig, AppState};
use grubot_messenger::{GraphClient, Messenger};
use tracing_subscriber::EnvFilter;

mod cli;
mod config;

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Args::parse();
    let mut config = config::Config::load(&args.config)?;
    if let Some(bind) = args.bind {
        config.server.bind_address = bind;
    }

    init_tracing(config.logging.json);

    let required = match config.required() {
        Ok(required) => required,
        Err(e) => {
            tracing::error!(error = %e, "refusing to start");
            return Err(e.into());
        }
    };

    let db = grubot_db::create_pool(&config.database.url, config.database.max_connections).await?;
    grubot_db::run_migrations(&db).await?;

    let client = GraphClient::new(&config.messenger.graph_api_url, &required.page_access_token)?;
    let state = AppState::new(
        db,
        Messenger::Graph(client),
        AppConfig {
            app_secret: required.app_secret,
            validation_token: required.validation_token,
            server_url: required.server_url,
        },
    );

    let subscribers = grubot_core::directory::count(&state.db).await?;
    let app = grubot_api::build_router().with_state(state);

    let listener = tokio::net::TcpListener::bind(&config.server.bind_address).await?;
    tracing::info!(
        bind_address = %config.server.bind_address,
        graph_api_url = %config.messenger.graph_api_url,
        subscribers,
        "grubot listening"
    );

    let shutdown_signal = async {
        let _ = tokio::signal::ctrl_c().await;
        tracing::info!("Shutting down...");
    };

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal)
        .await?;

    Ok(())
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("grubot=info,tower_http=debug"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}
