mod api;
mod middleware;
mod scheduler;

use std::sync::Arc;

use postplan_core::Environment;
use postplan_pipeline::Pipeline;
use tokio::sync::Mutex;
use tracing_subscriber::EnvFilter;

use crate::{
    api::{build_app, default_rate_limit_state, AppState},
    middleware::AuthState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = postplan_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let pipeline = Arc::new(Mutex::new(Pipeline::from_config(&config)?));

    let _scheduler =
        scheduler::build_scheduler(Arc::clone(&pipeline), &config.queue_poll_cron).await?;

    let auth = AuthState::from_env(config.env == Environment::Development)?;
    let app = build_app(
        AppState {
            pipeline,
            default_results_limit: config.default_results_limit,
        },
        auth,
        default_rate_limit_state(),
    );

    tracing::info!(addr = %config.bind_addr, "postplan-server listening");
    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to listen for ctrl-c");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
