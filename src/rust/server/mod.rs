//! HTTP surface of the prediction service.

use std::io;
use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use log::{error, info, warn};
use tower_http::cors::CorsLayer;

use crate::artifact_manager::{ArtifactError, ArtifactManager};
use crate::classifier::ClassifierBundle;
use crate::config::ServiceConfig;
use crate::history::{HistoryError, HistoryStore, InMemoryHistoryStore, JsonFileHistoryStore};
use crate::llm::{GeminiClient, TextGenerator};

mod error;
pub mod handlers;

pub use error::ApiError;

/// State shared by every request handler.
///
/// The bundle is loaded once before the server starts and never changes, so
/// handlers read it without locking.
#[derive(Clone)]
pub struct AppState {
    pub bundle: Option<Arc<ClassifierBundle>>,
    pub llm: Option<Arc<dyn TextGenerator>>,
    pub history: Arc<dyn HistoryStore>,
}

impl AppState {
    pub fn new(history: Arc<dyn HistoryStore>) -> Self {
        Self {
            bundle: None,
            llm: None,
            history,
        }
    }

    pub fn with_bundle(mut self, bundle: ClassifierBundle) -> Self {
        self.bundle = Some(Arc::new(bundle));
        self
    }

    pub fn with_llm(mut self, llm: Arc<dyn TextGenerator>) -> Self {
        self.llm = Some(llm);
        self
    }

    pub fn bundle(&self) -> Result<&Arc<ClassifierBundle>, ApiError> {
        self.bundle.as_ref().ok_or(ApiError::ModelUnavailable)
    }

    pub fn llm(&self) -> Result<&Arc<dyn TextGenerator>, ApiError> {
        self.llm.as_ref().ok_or(ApiError::LlmUnavailable)
    }

    /// Builds the state for `config`.
    ///
    /// A bundle that fails to load or an LLM client that fails to build is
    /// logged and left out; the affected endpoints then answer with
    /// `model_unavailable` or `llm_unavailable`.
    pub fn from_config(config: &ServiceConfig) -> Result<Self, HistoryError> {
        let history: Arc<dyn HistoryStore> = match &config.history_path {
            Some(path) => {
                info!("Prediction history stored in {:?}", path);
                Arc::new(JsonFileHistoryStore::new(path)?)
            }
            None => {
                info!("Prediction history kept in memory");
                Arc::new(InMemoryHistoryStore::new())
            }
        };
        let mut state = Self::new(history);

        let loaded = ArtifactManager::new(&config.artifacts_dir)
            .map_err(ArtifactError::from)
            .and_then(|manager| manager.load_bundle());
        match loaded {
            Ok(bundle) => state = state.with_bundle(bundle),
            Err(e) => error!(
                "Failed to load classifier bundle from {:?}: {}. Prediction endpoints are disabled",
                config.artifacts_dir, e
            ),
        }

        match config.llm() {
            Some(llm_config) => match GeminiClient::new(llm_config) {
                Ok(client) => state = state.with_llm(Arc::new(client)),
                Err(e) => error!("Failed to create language model client: {}", e),
            },
            None => warn!("GEMINI_API_KEY is not set; details and chat endpoints are disabled"),
        }

        Ok(state)
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/api/health", get(handlers::health))
        .route("/api/get_symptoms", get(handlers::get_symptoms))
        .route("/api/predict", post(handlers::predict))
        .route("/api/details", post(handlers::details))
        .route("/api/chat", post(handlers::chat))
        .route("/api/history", get(handlers::history))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Binds `address` and serves until the process is stopped.
pub async fn serve(state: AppState, address: &str) -> io::Result<()> {
    let listener = tokio::net::TcpListener::bind(address).await?;
    info!("Lifeline listening on http://{}", listener.local_addr()?);
    axum::serve(listener, router(state)).await
}
