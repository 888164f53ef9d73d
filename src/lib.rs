//! Bookstore application library
//!
//! Wires the book module onto the database and HTTP server.

pub mod modules;

use anyhow::Context;
use bookstore_kernel::{settings::Settings, InitCtx, ModuleRegistry};
use sea_orm::DatabaseConnection;

/// A connected, migrated and initialized application, ready to serve.
pub struct App {
    pub registry: ModuleRegistry,
    pub db: DatabaseConnection,
}

/// Connect to the database, register modules, create missing tables and run
/// module initialization.
pub async fn bootstrap(settings: &Settings) -> anyhow::Result<App> {
    let db = bookstore_db::connect(&settings.database).await?;

    let mut registry = ModuleRegistry::new();
    modules::register_all(&mut registry, &db);

    apply_migrations(&registry, &db).await?;

    let ctx = InitCtx { settings };
    registry
        .init_modules(&ctx)
        .await
        .context("module initialization failed")?;

    Ok(App { registry, db })
}

/// Run the service until a shutdown signal arrives.
pub async fn run(settings: &Settings) -> anyhow::Result<()> {
    let app = bootstrap(settings).await?;
    let ctx = InitCtx { settings };

    app.registry.start_modules(&ctx).await?;
    let served = bookstore_http::start_server(&app.registry, settings, app.db.clone()).await;
    app.registry.stop_modules().await?;

    if let Err(e) = app.db.close().await {
        tracing::warn!(error = %e, "closing database pool failed");
    }

    served
}

/// Create missing tables and exit.
pub async fn migrate(settings: &Settings) -> anyhow::Result<()> {
    let db = bookstore_db::connect(&settings.database).await?;

    let mut registry = ModuleRegistry::new();
    modules::register_all(&mut registry, &db);

    apply_migrations(&registry, &db).await
}

async fn apply_migrations(registry: &ModuleRegistry, db: &DatabaseConnection) -> anyhow::Result<()> {
    let schema = bookstore_db::schema_for(db);
    let migrations = registry.collect_migrations(&schema);
    tracing::info!(count = migrations.len(), "running schema auto-migration");

    bookstore_db::auto_migrate(db, &migrations)
        .await
        .context("schema auto-migration failed")
}
