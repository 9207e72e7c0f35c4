//! REST front-end for the VNF manager.
//!
//! Routes map one-to-one onto [`VnfMgr`] calls. Handlers wait on the returned
//! [`crate::VnfFuture`] and translate [`VnfError`] into HTTP status codes.

pub mod config;
pub mod handlers;
pub mod models;

use crate::core::VnfError;
use crate::manager::VnfMgr;
use axum::Json;
use axum::Router;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use http::StatusCode;
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tower_http::trace::TraceLayer;

pub use config::ServerConfig;

/// Shared handler state; the manager is injected by the entry point.
#[derive(Clone)]
pub struct AppState {
    pub mgr: Arc<VnfMgr>,
}

impl AppState {
    pub fn new(mgr: Arc<VnfMgr>) -> Self {
        Self { mgr }
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::healthcheck))
        .route(
            "/vnf/:id",
            get(handlers::get_vnf)
                .post(handlers::create_vnf)
                .delete(handlers::delete_vnf),
        )
        .route("/vnf/update/:id", post(handlers::update_vnf))
        .route("/vnfs", get(handlers::list_vnfs))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

#[derive(Debug, Error)]
pub enum WebError {
    #[error(transparent)]
    Vnf(#[from] VnfError),
    #[error("{0}")]
    Input(String),
}

impl WebError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            WebError::Vnf(VnfError::NotFound { .. }) => (StatusCode::NOT_FOUND, "not_found"),
            WebError::Vnf(VnfError::AlreadyExists { .. }) => (StatusCode::CONFLICT, "already_exists"),
            WebError::Vnf(VnfError::InvalidTransition { .. }) => {
                (StatusCode::CONFLICT, "invalid_transition")
            }
            WebError::Vnf(VnfError::EntityClosed { .. }) => (StatusCode::CONFLICT, "entity_closed"),
            WebError::Vnf(VnfError::CallbackFailed { .. }) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "callback_failed")
            }
            WebError::Vnf(
                VnfError::ResultDropped { .. } | VnfError::Lock(_) | VnfError::Config(_),
            ) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
            WebError::Input(_) => (StatusCode::UNPROCESSABLE_ENTITY, "input_error"),
        }
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        let body = Json(ErrorResponse {
            error: self.to_string(),
            code: code.to_string(),
        });
        (status, body).into_response()
    }
}

pub type WebResult<T> = std::result::Result<T, WebError>;
