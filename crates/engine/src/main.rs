//! Skyhold Engine - Main entry point.

use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use skyhold_engine::entities::IslandConfig;
use skyhold_engine::infrastructure::template::DEFAULT_TEMPLATE_RADIUS;
use skyhold_engine::use_cases::DEFAULT_SWEEP_INTERVAL;
use skyhold_engine::{App, AppConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment from repo root (the engine may be launched from `crates/engine`).
    load_dotenv_from_repo_root();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "skyhold_engine=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Skyhold Engine");

    // Load configuration
    let db_path = std::env::var("SKYHOLD_DB").unwrap_or_else(|_| "skyhold.db".into());
    let template_path =
        std::env::var("ISLAND_TEMPLATE").unwrap_or_else(|_| "island_template.cbor".into());
    let template_radius: i32 = std::env::var("TEMPLATE_RADIUS")
        .unwrap_or_else(|_| DEFAULT_TEMPLATE_RADIUS.to_string())
        .parse()
        .unwrap_or(DEFAULT_TEMPLATE_RADIUS);
    let sweep_interval = std::env::var("SWEEP_INTERVAL_MS")
        .ok()
        .and_then(|ms| ms.parse().ok())
        .map(Duration::from_millis)
        .unwrap_or(DEFAULT_SWEEP_INTERVAL);

    let config = AppConfig {
        db_path,
        template_path: template_path.into(),
        template_radius,
        sweep_interval,
        island: IslandConfig::default(),
    };

    tracing::info!(
        db = %config.db_path,
        template = %config.template_path.display(),
        "Opening island store"
    );
    let app = Arc::new(App::new(config).await?);

    let tasks = app.spawn_background_tasks();

    // Run until interrupted, then save every loaded island before exit.
    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutdown signal received, saving all islands");

    let report = app.force_save_all().await;
    tracing::info!(
        saved = report.saved,
        failed = report.failed,
        "Shutdown save complete"
    );

    for task in tasks {
        task.abort();
    }

    Ok(())
}

fn load_dotenv_from_repo_root() {
    let repo_root = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..");

    // Prefer local overrides.
    for filename in [".env.local", ".env"] {
        let path = repo_root.join(filename);
        if path.exists() {
            let _ = dotenvy::from_path(path);
        }
    }
}
