//! Application bootstrap: database, module lifecycle and HTTP server.

use anyhow::Context;
use axum::Router;
use bookshelf_kernel::{settings::Settings, InitCtx, ModuleRegistry};
use sea_orm::DatabaseConnection;

use crate::modules;

/// A connected database with every module registered, initialized and migrated.
pub struct App {
    pub settings: Settings,
    pub db: DatabaseConnection,
    pub registry: ModuleRegistry,
}

impl App {
    /// Connect, register modules, run their `init` hooks and apply migrations.
    pub async fn prepare(settings: Settings) -> anyhow::Result<Self> {
        let db = bookshelf_db::connect(&settings.database).await?;

        let mut registry = ModuleRegistry::new();
        modules::register_all(&mut registry, &db);

        let app = Self {
            settings,
            db,
            registry,
        };

        app.registry
            .init_modules(&app.ctx())
            .await
            .context("module initialization failed")?;

        let applied = bookshelf_db::run_migrations(&app.db, &app.registry.collect_migrations())
            .await
            .context("database migration failed")?;
        tracing::info!(applied, "migrations complete");

        Ok(app)
    }

    pub fn ctx(&self) -> InitCtx<'_> {
        InitCtx {
            settings: &self.settings,
            db: &self.db,
        }
    }

    /// The full HTTP router with every module mounted.
    pub fn router(&self) -> Router {
        bookshelf_http::build_router(&self.registry, &self.settings)
    }
}

/// Apply pending migrations and exit.
pub async fn migrate(settings: Settings) -> anyhow::Result<()> {
    let app = App::prepare(settings).await?;
    app.db
        .close()
        .await
        .context("failed to close database connection")?;
    Ok(())
}

/// Serve HTTP until Ctrl-C or SIGTERM, then stop modules in reverse order.
pub async fn run(settings: Settings) -> anyhow::Result<()> {
    let app = App::prepare(settings).await?;

    app.registry
        .start_modules(&app.ctx())
        .await
        .context("module start failed")?;

    let served =
        bookshelf_http::start_server(&app.registry, &app.settings, shutdown_signal()).await;

    app.registry
        .stop_modules()
        .await
        .context("module stop failed")?;

    served?;
    tracing::info!("bookshelf shut down cleanly");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("shutdown signal received");
}
