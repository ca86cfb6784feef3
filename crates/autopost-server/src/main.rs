mod api;
mod middleware;
mod scheduler;

use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::EnvFilter;

use crate::{
    api::{build_app, default_rate_limit_state, AppState},
    middleware::{AuthState, CronAuthState},
    scheduler::SchedulerDeps,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Arc::new(autopost_core::load_app_config()?);
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let pool_config = autopost_db::PoolConfig::from_app_config(&config);
    let pool = autopost_db::connect_pool(&config.database_url, pool_config).await?;
    autopost_db::run_migrations(&pool).await?;

    let ai = Arc::new(autopost_ai::AiClient::new(
        &config.ai_base_url,
        config.ai_api_key.as_deref(),
        config.ai_request_timeout_secs,
        config.ai_generation_timeout_secs,
        config.ai_max_retries,
        config.ai_retry_backoff_base_ms,
    )?);

    if config.linkedin_client_id.is_none() || config.linkedin_client_secret.is_none() {
        tracing::warn!(
            "LinkedIn client credentials not set; token refresh will fail until \
             AUTOPOST_LINKEDIN_CLIENT_ID and AUTOPOST_LINKEDIN_CLIENT_SECRET are provided"
        );
    }
    let linkedin = Arc::new(autopost_linkedin::LinkedinClient::with_base_url(
        config.linkedin_client_id.as_deref().unwrap_or_default(),
        config.linkedin_client_secret.as_deref().unwrap_or_default(),
        config.publish_request_timeout_secs,
        &config.linkedin_base_url,
    )?);

    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.media_download_timeout_secs))
        .build()?;

    let default_provider: Arc<str> = config.default_provider.clone().into();
    let default_model: Arc<str> = config.default_model.clone().into();

    let _scheduler = scheduler::build_scheduler(SchedulerDeps {
        pool: pool.clone(),
        ai: Arc::clone(&ai),
        linkedin: Arc::clone(&linkedin),
        http: http.clone(),
        default_provider: Arc::clone(&default_provider),
        default_model: Arc::clone(&default_model),
    })
    .await?;

    let auth = AuthState::from_env(matches!(
        config.env,
        autopost_core::Environment::Development
    ))?;
    let cron_auth = CronAuthState::new(config.cron_secret.clone());
    let app = build_app(
        AppState {
            pool,
            ai,
            linkedin,
            http,
            default_provider,
            default_model,
        },
        auth,
        cron_auth,
        default_rate_limit_state(),
    );

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
