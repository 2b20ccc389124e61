//! Test-set file tools: CSV export, CSV/JSON upload checks and downloads,
//! served over HTTP.

pub mod config;
pub mod error;
pub mod evaluators;
pub mod files;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod session;

pub use config::AppConfig;
pub use error::{AppError, Result};
pub use evaluators::{EvaluatorConfig, EvaluatorConfigStore};
pub use files::{
    convert_to_csv, download_csv, escape_newlines, validate_csv, validate_json, DirectoryHost,
    DownloadHost, FileSource, FileValidator, TestsetFormat, ValidationResult,
};
pub use handlers::routes::create_routes;
pub use session::{SessionProvider, SessionState, StaticSession, TokenSession};

use axum::{extract::DefaultBodyLimit, Router};
use std::{net::SocketAddr, sync::Arc};
use tokio::signal;
use tracing::info;

#[derive(Clone)]
pub struct AppState {
    pub app_name: String,
    pub version: String,
    pub validator: FileValidator,
    pub evaluator_configs: EvaluatorConfigStore,
    pub session: Arc<dyn SessionProvider>,
    pub download_host: Option<Arc<dyn DownloadHost>>,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            app_name: "Testset File Service".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            validator: FileValidator::with_default_config(),
            evaluator_configs: EvaluatorConfigStore::new(),
            session: Arc::new(StaticSession),
            download_host: None,
        }
    }
}

impl AppState {
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let session = session::provider_from_config(&config.session)?;

        Ok(Self {
            validator: FileValidator::new(config.files.validation_config()),
            session,
            download_host: Some(Arc::new(DirectoryHost::new(&config.files.download_dir))),
            ..Self::default()
        })
    }

    pub fn with_session(mut self, session: Arc<dyn SessionProvider>) -> Self {
        self.session = session;
        self
    }

    pub fn with_download_host(mut self, host: Arc<dyn DownloadHost>) -> Self {
        self.download_host = Some(host);
        self
    }

    pub fn with_validator(mut self, validator: FileValidator) -> Self {
        self.validator = validator;
        self
    }
}

pub fn create_app(state: AppState) -> Router {
    create_app_with_config(state, &AppConfig::default())
}

pub fn create_app_with_config(state: AppState, config: &AppConfig) -> Router {
    let router: Router<AppState> = Router::new()
        .merge(create_routes())
        .layer(DefaultBodyLimit::max(config.body_limit_bytes()))
        .layer(middleware::cors::cors_layer_from_config(&config.cors));

    middleware::logging::with_request_logging(router).with_state(state)
}

pub async fn run_server(app: Router, addr: SocketAddr) -> Result<()> {
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown");
        },
        _ = terminate => {
            info!("Received SIGTERM, starting graceful shutdown");
        },
    }
}
