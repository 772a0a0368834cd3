use actix_web::{middleware, web, App, HttpServer};
use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

mod handlers;

use handlers::{analyze, health, stats};
use kyotei::audit::AuditLog;
use kyotei::config::AppConfig;
use kyotei::pipeline::Pipeline;

/// Application state shared across handlers
pub struct AppState {
    pub pipeline: Pipeline,
    pub history: Mutex<AuditLog>,
}

impl AppState {
    pub fn new(pipeline: Pipeline, history_capacity: usize) -> Self {
        Self {
            pipeline,
            history: Mutex::new(AuditLog::new(history_capacity)),
        }
    }

    /// Lock the history; a poisoned lock still holds a usable log
    pub fn history(&self) -> MutexGuard<'_, AuditLog> {
        self.history.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health::health_check))
        .route("/api/analyze", web::post().to(analyze::analyze_race))
        .route("/api/stats", web::get().to(stats::get_stats));
}

#[actix_web::main]
async fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("Failed to set subscriber")?;

    let config_path = std::env::var("KYOTEI_CONFIG").ok().map(PathBuf::from);
    let config = AppConfig::load(config_path.as_deref())?;
    let addr = config.bind_addr();

    let pipeline = Pipeline::from_config(&config);
    let app_state = Arc::new(AppState::new(pipeline, config.history.capacity));

    info!("Starting kyotei API server at http://{}", addr);

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .wrap(middleware::Logger::default())
            .configure(configure)
    })
    .bind(&addr)
    .with_context(|| format!("Failed to bind {}", addr))?
    .run()
    .await?;

    Ok(())
}
