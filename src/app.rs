use crate::config::{Config, SubmitMode};
use crate::dispatch::{MovieDispatch, MutationQueue};
use crate::form::{FormProps, FormView, MovieFormController};
use crate::graphql::{MovieApi, MoviesClient};
use crate::models::{FieldEdit, MovieId, MovieRecord};
use crate::validation::current_year;
use anyhow::Result;
use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, patch, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::{sync::Arc, time::Duration};
use tokio::sync::Mutex;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info, warn};

const MAX_BODY_BYTES: usize = 64 * 1024;
const DRAIN_TIMEOUT_SECS: u64 = 10;

#[derive(Clone)]
pub struct AppState {
    pub api: Arc<dyn MovieApi>,
    pub dispatch: Arc<dyn MovieDispatch>,
    pub submit_mode: SubmitMode,
    pub form: Arc<Mutex<MovieFormController>>,
}

impl AppState {
    pub fn new(
        api: Arc<dyn MovieApi>,
        dispatch: Arc<dyn MovieDispatch>,
        submit_mode: SubmitMode,
    ) -> Self {
        Self {
            api,
            dispatch,
            submit_mode,
            form: Arc::new(Mutex::new(MovieFormController::new())),
        }
    }
}

type ApiError = (StatusCode, Json<Value>);

fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(json!({ "status": "error", "message": message.into() })),
    )
}

pub async fn run_server() -> Result<()> {
    let config = Config::from_env()?;
    info!(
        "Using GraphQL endpoint {} (submit mode {:?})",
        config.graphql_url, config.submit_mode
    );

    let api: Arc<dyn MovieApi> =
        Arc::new(MoviesClient::new(config.graphql_url.clone(), config.http_timeout)?);
    let (queue, worker) = MutationQueue::spawn(api.clone());
    let state = AppState::new(api, Arc::new(queue), config.submit_mode);

    let app = build_router(state);

    info!("Listening on {}", config.bind);
    let listener = tokio::net::TcpListener::bind(config.bind).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // The router (and with it the last queue handle) is gone; let queued
    // mutations finish.
    match tokio::time::timeout(Duration::from_secs(DRAIN_TIMEOUT_SECS), worker).await {
        Ok(Ok(())) => info!("Mutation queue drained"),
        Ok(Err(e)) => error!("Mutation worker panicked: {}", e),
        Err(_) => warn!("Gave up waiting for queued mutations after {}s", DRAIN_TIMEOUT_SECS),
    }
    Ok(())
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/movies", get(list_movies))
        .route("/form", get(show_form))
        .route("/form/open", post(open_form))
        .route("/form/fields", patch(edit_field))
        .route("/form/submit", post(submit_form))
        .route("/form/close", post(close_form))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> &'static str {
    "OK"
}

async fn list_movies(State(state): State<AppState>) -> Result<Json<Vec<MovieRecord>>, ApiError> {
    state.api.all_movies().await.map(Json).map_err(|e| {
        error!("Failed to load movies: {:#}", e);
        api_error(StatusCode::BAD_GATEWAY, format!("Failed to load movies: {}", e))
    })
}

async fn show_form(State(state): State<AppState>) -> Json<FormView> {
    let form = state.form.lock().await;
    Json(form.view(current_year()))
}

#[derive(Debug, Deserialize)]
struct OpenRequest {
    #[serde(default)]
    movie_id: Option<String>,
}

async fn open_form(
    State(state): State<AppState>,
    Json(req): Json<OpenRequest>,
) -> Result<Json<FormView>, ApiError> {
    let movie = match req.movie_id.as_deref().and_then(MovieId::parse) {
        Some(id) => match state.api.fetch_movie(&id).await {
            Ok(Some(record)) => Some(record),
            Ok(None) => {
                warn!("Cannot edit unknown movie {}", id);
                return Err(api_error(
                    StatusCode::NOT_FOUND,
                    format!("No movie with id {}", id),
                ));
            }
            Err(e) => {
                error!("Failed to load movie {}: {:#}", id, e);
                return Err(api_error(
                    StatusCode::BAD_GATEWAY,
                    format!("Failed to load movie {}: {}", id, e),
                ));
            }
        },
        None => None,
    };

    debug!("Opening form (editing: {})", movie.is_some());
    let mut form = state.form.lock().await;
    form.receive_props(FormProps { show: true, movie });
    Ok(Json(form.view(current_year())))
}

#[derive(Debug, Deserialize)]
struct FieldChange {
    field: String,
    value: String,
}

async fn edit_field(
    State(state): State<AppState>,
    Json(change): Json<FieldChange>,
) -> Result<Json<FormView>, ApiError> {
    let edit = FieldEdit::from_input(&change.field, &change.value).map_err(|e| {
        warn!("Rejecting field change: {}", e);
        api_error(StatusCode::BAD_REQUEST, e.to_string())
    })?;
    let mut form = state.form.lock().await;
    form.edit_field(edit);
    Ok(Json(form.view(current_year())))
}

async fn submit_form(State(state): State<AppState>) -> Result<Json<FormView>, ApiError> {
    let mut form = state.form.lock().await;
    match state.submit_mode {
        SubmitMode::FireAndForget => {
            form.submit(state.dispatch.as_ref(), || debug!("Form closed after submit"));
        }
        SubmitMode::Confirmed => {
            if let Err(e) = form
                .submit_confirmed(state.api.as_ref(), || debug!("Form closed after save"))
                .await
            {
                error!("Saving movie failed: {:#}", e);
                return Err(api_error(
                    StatusCode::BAD_GATEWAY,
                    format!("Saving movie failed: {}", e),
                ));
            }
        }
    }
    Ok(Json(form.view(current_year())))
}

async fn close_form(State(state): State<AppState>) -> Json<FormView> {
    let mut form = state.form.lock().await;
    form.close();
    Json(form.view(current_year()))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        let mut term = signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
        term.recv().await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Shutdown signal received (Ctrl+C)");
        }
        _ = terminate => {
            info!("Shutdown signal received (SIGTERM)");
        }
    }
}
