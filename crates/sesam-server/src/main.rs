//! Application entry point.

use anyhow::Context;
use sesam_auth::{AuthService, SessionService};
use sesam_server::config::{AppConfig, Environment};
use sesam_server::routes::router;
use sesam_server::seed;
use sesam_server::state::AppState;
use sesam_store::{
    KvSessionStore, PgUserStore, RedisKv, connect_kv, connect_postgres, run_migrations,
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("sesam=info".parse()?))
        .json()
        .init();

    let config = AppConfig::from_env();
    tracing::info!(
        addr = %config.listen_addr,
        env = ?config.environment,
        "starting sesam server"
    );

    let pool = connect_postgres(&config.pg)
        .await
        .context("PostgreSQL connection failed")?;
    run_migrations(&pool).await.context("migrations failed")?;
    let manager = connect_kv(&config.kv)
        .await
        .context("session store connection failed")?;

    let users = PgUserStore::new(pool);
    let sessions = SessionService::new(KvSessionStore::new(RedisKv::new(manager)));
    let auth = AuthService::new(users, sessions, config.auth.clone());

    if config.environment == Environment::Development {
        seed::ensure_admin(&auth).await.context("seeding failed")?;
    }

    let app = router(AppState::new(auth));

    let listener = tokio::net::TcpListener::bind(&config.listen_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.listen_addr))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("sesam server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
    }
}
