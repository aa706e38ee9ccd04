use std::sync::Arc;

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;

use bizgrid_audit::{AuditStore, PgAuditStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    bizgrid_observability::init();

    let database_url =
        std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
    let pool = PgPoolOptions::new()
        .max_connections(16)
        .connect(&database_url)
        .await
        .context("failed to connect to postgres")?;

    let store: Arc<dyn AuditStore> = Arc::new(PgAuditStore::new(pool));
    let app = bizgrid_api::app::build_app(store);

    let listener = tokio::net::TcpListener::bind("0.0.0.0:8080")
        .await
        .context("failed to bind 0.0.0.0:8080")?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
