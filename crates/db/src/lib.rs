//! Database crate: SeaORM connection factory and additive schema migration.

use std::time::Duration;

use anyhow::Context;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Schema};

use bookstore_kernel::{settings::DatabaseSettings, Migration};

/// Open the connection pool described by `settings`.
///
/// The returned handle is cheap to clone and is meant to be created once at
/// startup and handed to whatever needs it.
pub async fn connect(settings: &DatabaseSettings) -> anyhow::Result<DatabaseConnection> {
    tracing::info!(
        target: "bookstore-db",
        url = %redact(&settings.url),
        max_connections = settings.max_connections,
        "connecting to database"
    );

    let mut options = ConnectOptions::new(settings.url.clone());
    options
        .max_connections(settings.max_connections)
        .min_connections(settings.min_connections)
        .connect_timeout(Duration::from_secs(settings.connect_timeout_secs))
        .sqlx_logging(settings.sqlx_logging);

    let db = Database::connect(options)
        .await
        .with_context(|| format!("failed to connect to database at {}", redact(&settings.url)))?;

    tracing::info!(
        target: "bookstore-db",
        backend = ?db.get_database_backend(),
        "database connection established"
    );

    Ok(db)
}

/// Schema builder for the backend `db` is connected to.
pub fn schema_for(db: &DatabaseConnection) -> Schema {
    Schema::new(db.get_database_backend())
}

/// Apply collected migrations. Tables are only ever created, never dropped or
/// altered, so this is safe to run on every start.
pub async fn auto_migrate(
    db: &DatabaseConnection,
    migrations: &[(String, Migration)],
) -> anyhow::Result<()> {
    let backend = db.get_database_backend();

    for (module, migration) in migrations {
        tracing::info!(
            target: "bookstore-db",
            module = %module,
            migration = migration.id,
            "applying migration"
        );

        db.execute(backend.build(&migration.table))
            .await
            .with_context(|| {
                format!(
                    "failed to apply migration '{}' for module '{}'",
                    migration.id, module
                )
            })?;
    }

    Ok(())
}

/// Round-trip a trivial statement to check the database is reachable.
pub async fn ping(db: &DatabaseConnection) -> anyhow::Result<()> {
    db.execute_unprepared("SELECT 1")
        .await
        .context("database ping failed")?;
    Ok(())
}

/// Strip credentials from a connection string before logging it.
pub fn redact(url: &str) -> String {
    match (url.find("://"), url.rfind('@')) {
        (Some(scheme_end), Some(at)) if at > scheme_end => {
            format!("{}://***{}", &url[..scheme_end], &url[at..])
        }
        _ => url.to_string(),
    }
}
