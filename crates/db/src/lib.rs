//! Database connection factory and migration runner.

use std::time::Duration;

use anyhow::Context;
use bookshelf_kernel::{settings::DatabaseSettings, Migration};
use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement, TransactionTrait,
};

const LEDGER_DDL: &str = r#"
    CREATE TABLE IF NOT EXISTS _migrations (
        module     TEXT NOT NULL,
        id         TEXT NOT NULL,
        applied_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
        PRIMARY KEY (module, id)
    )
"#;

// An in-memory SQLite database lives only as long as its connections.
const IN_MEMORY_CONNECTION_LIFETIME: Duration = Duration::from_secs(60 * 60 * 24 * 365);

/// Open a connection pool for the configured database.
pub async fn connect(settings: &DatabaseSettings) -> anyhow::Result<DatabaseConnection> {
    let mut options = ConnectOptions::new(settings.url.clone());
    options
        .min_connections(1)
        .sqlx_logging(settings.sqlx_logging);

    if settings.is_in_memory() {
        options
            .max_connections(1)
            .idle_timeout(IN_MEMORY_CONNECTION_LIFETIME)
            .max_lifetime(IN_MEMORY_CONNECTION_LIFETIME);
    } else {
        options.max_connections(settings.max_connections.max(1));
    }

    let db = Database::connect(options)
        .await
        .with_context(|| format!("failed to connect to database '{}'", settings.url))?;

    tracing::info!(
        target: "bookshelf-db",
        url = %settings.url,
        backend = ?db.get_database_backend(),
        "database connected"
    );

    Ok(db)
}

/// Apply every migration not yet recorded in the `_migrations` ledger.
///
/// Each migration runs in its own transaction together with its ledger
/// record. Returns the number of migrations applied by this call.
pub async fn run_migrations(
    db: &DatabaseConnection,
    migrations: &[(String, Migration)],
) -> anyhow::Result<usize> {
    db.execute_unprepared(LEDGER_DDL)
        .await
        .context("failed to create migration ledger")?;

    let backend = db.get_database_backend();
    let mut applied = 0;

    for (module, migration) in migrations {
        let recorded = db
            .query_one(Statement::from_sql_and_values(
                backend,
                "SELECT 1 FROM _migrations WHERE module = ? AND id = ?",
                [module.as_str().into(), migration.id.into()],
            ))
            .await
            .with_context(|| format!("failed to read ledger for {}/{}", module, migration.id))?;

        if recorded.is_some() {
            tracing::debug!(target: "bookshelf-db", %module, id = migration.id, "migration already applied");
            continue;
        }

        let txn = db.begin().await.context("failed to begin migration transaction")?;
        txn.execute_unprepared(migration.up)
            .await
            .with_context(|| format!("migration {}/{} failed", module, migration.id))?;
        txn.execute(Statement::from_sql_and_values(
            backend,
            "INSERT INTO _migrations (module, id) VALUES (?, ?)",
            [module.as_str().into(), migration.id.into()],
        ))
        .await
        .with_context(|| format!("failed to record migration {}/{}", module, migration.id))?;
        txn.commit()
            .await
            .with_context(|| format!("failed to commit migration {}/{}", module, migration.id))?;

        tracing::info!(target: "bookshelf-db", %module, id = migration.id, "migration applied");
        applied += 1;
    }

    Ok(applied)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn migrations() -> Vec<(String, Migration)> {
        vec![(
            "shelf".to_string(),
            Migration {
                id: "001_init",
                up: "CREATE TABLE shelf (id INTEGER PRIMARY KEY AUTOINCREMENT, name TEXT NOT NULL);",
            },
        )]
    }

    async fn count(db: &DatabaseConnection, sql: &str) -> i64 {
        let row = db
            .query_one(Statement::from_string(db.get_database_backend(), sql))
            .await
            .unwrap()
            .unwrap();
        row.try_get_by_index::<i64>(0).unwrap()
    }

    #[tokio::test]
    async fn migrations_apply_once() {
        let db = connect(&DatabaseSettings::in_memory()).await.unwrap();

        assert_eq!(run_migrations(&db, &migrations()).await.unwrap(), 1);
        assert_eq!(run_migrations(&db, &migrations()).await.unwrap(), 0);

        assert_eq!(count(&db, "SELECT COUNT(*) FROM _migrations").await, 1);
        assert_eq!(count(&db, "SELECT COUNT(*) FROM shelf").await, 0);
    }

    #[tokio::test]
    async fn failed_migration_is_not_recorded() {
        let db = connect(&DatabaseSettings::in_memory()).await.unwrap();
        let broken = vec![(
            "shelf".to_string(),
            Migration {
                id: "001_broken",
                up: "CREATE TABLE shelf (",
            },
        )];

        let err = run_migrations(&db, &broken).await.unwrap_err();
        assert!(err.to_string().contains("migration shelf/001_broken failed"));
        assert_eq!(count(&db, "SELECT COUNT(*) FROM _migrations").await, 0);
    }
}
