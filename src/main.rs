use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use dotenv::dotenv;
use time::OffsetDateTime;
use tracing::{error, info, warn};
use uuid::Uuid;

use styliste_backend::{
    app::create_router,
    app_state::AppState,
    clock::{Clock, SystemClock},
    config,
    db::{self, MemoryStore, Repositories, User, UserRole},
    notifications::LogMailer,
    services::AvailabilityService,
    telemetry,
};

const PURGE_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let telemetry = telemetry::init_telemetry(None)
        .await
        .context("Failed to initialize telemetry")?;

    let env = config::init().context("Failed to load configuration")?;

    let repos = if env.database.is_memory() {
        warn!("DATABASE_URL=memory, data will not survive a restart");
        memory_repositories()?
    } else {
        let pool = db::init_pool(&env.database)
            .await
            .context("Failed to initialize database")?;
        Repositories::postgres(pool)
    };

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let state = AppState::new(env.clone(), repos, Arc::new(LogMailer::new()), Arc::clone(&clock));

    tokio::spawn(purge_expired_blocks(Arc::clone(&state.availability), clock));

    let app = create_router(state);

    let addr = env.server_addr();
    info!("{} ({:?}) listening on {}", env.app.name, env.app.environment, addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Failed to serve application")?;

    telemetry.shutdown().await?;
    Ok(())
}

/// In-memory repositories with one admin account, so the admin routes are usable.
fn memory_repositories() -> anyhow::Result<Repositories> {
    let store = MemoryStore::new();
    let admin = User {
        id: Uuid::now_v7(),
        name: "Salon Admin".to_string(),
        email: "admin@styliste.local".to_string(),
        phone: None,
        role: UserRole::Admin,
        created_at: OffsetDateTime::now_utc(),
    };
    info!(admin_id = %admin.id, "Seeded admin user for the in-memory store");
    store
        .insert_user(admin)
        .context("Failed to seed the in-memory store")?;
    Ok(Repositories::memory(store))
}

async fn purge_expired_blocks(service: Arc<AvailabilityService>, clock: Arc<dyn Clock>) {
    let mut interval = tokio::time::interval(PURGE_INTERVAL);
    loop {
        interval.tick().await;
        if let Err(e) = service.purge_expired(clock.today()).await {
            error!(error = %e, "Failed to purge expired unavailability blocks");
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
