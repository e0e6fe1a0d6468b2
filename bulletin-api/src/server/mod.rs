use crate::service::{PostService, ServiceError};
use axum::{
    Router,
    extract::{
        FromRef, Request,
        rejection::{JsonRejection, PathRejection},
    },
    http::{StatusCode, Uri},
    middleware,
    response::{IntoResponse, Response},
};
use bulletin_common::{
    context::Context,
    error::{ErrorKind, find_domain_error},
};
use json::Json;
use serde::Serialize;
use std::{collections::BTreeMap, sync::Arc, time::Duration};
use thiserror::Error;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};
use tracing::{error, info};
use utoipa::ToSchema;
use validation::ValidationErrors;

mod context;
mod cors;
mod decorator;
mod docs;
mod json;
mod routes;
mod validation;

pub const API_PREFIX: &str = "/api/v1";

pub type ServerRouter = Router<ServerState>;

#[derive(Clone, FromRef)]
pub struct ServerState {
    pub post_service: Arc<dyn PostService>,
    /// Parent of every request's [`Context`]. Cancelling it aborts in-flight storage calls.
    pub root_context: Context,
}

/// Wires every route and layer of the service.
pub fn router(state: ServerState, request_timeout: Duration) -> Router {
    Router::new()
        .nest(API_PREFIX, routes::routes())
        .merge(docs::routes())
        .fallback(fallback)
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            request_timeout,
        ))
        .layer(middleware::from_fn(cors::cors))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn fallback(request: Request) -> ServerError {
    ServerError::UnknownRoute(request.into_parts().0.uri)
}

pub type Result<T, E = ServerError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Unknown route requested: {0}")]
    UnknownRoute(Uri),
    #[error("Path rejected: {0}")]
    PathRejection(#[from] PathRejection),
    #[error("Incoming JSON rejected: {0}")]
    JsonRejection(#[from] JsonRejection),
    #[error("Request failed validation: {0}")]
    Validation(#[from] ValidationErrors),
    #[error("JSON response could not be serialized: {0}")]
    JsonResponse(#[from] serde_json::Error),
    #[error(transparent)]
    Service(#[from] ServiceError),
    #[error("Handler panicked: {0}")]
    Panic(String),
}

impl ServerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ServerError::UnknownRoute(_)
            | ServerError::PathRejection(_)
            | ServerError::JsonRejection(_)
            | ServerError::Validation(_) => ErrorKind::Client,
            ServerError::JsonResponse(_) | ServerError::Panic(_) => ErrorKind::Server,
            ServerError::Service(err) => err.kind(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match (self, self.kind()) {
            (ServerError::UnknownRoute(_), _) => StatusCode::NOT_FOUND,
            (_, ErrorKind::Client) => StatusCode::UNPROCESSABLE_ENTITY,
            (_, ErrorKind::Server) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The body sent to the client. Server-caused errors never reveal their details.
    pub fn error_response(&self, operation: Option<&str>) -> ErrorResponse {
        match self {
            ServerError::UnknownRoute(_) => ErrorResponse::message("route not found"),
            ServerError::PathRejection(rejection) => ErrorResponse {
                details: Some(rejection.body_text()),
                ..ErrorResponse::message("invalid path params")
            },
            ServerError::JsonRejection(rejection) => ErrorResponse {
                details: Some(rejection.body_text()),
                ..ErrorResponse::message("invalid request body")
            },
            ServerError::Validation(errors) => ErrorResponse {
                validation_errors: Some(errors.field_messages()),
                ..ErrorResponse::message(errors.message())
            },
            ServerError::Service(_) | ServerError::JsonResponse(_) | ServerError::Panic(_) => {
                match (self.kind(), find_domain_error(self)) {
                    (ErrorKind::Client, Some(domain)) => ErrorResponse {
                        code: domain.code().filter(|code| !code.is_empty()),
                        ..ErrorResponse::message(domain.message())
                    },
                    _ => ErrorResponse::message(
                        operation.map_or_else(
                            || "internal server error".to_owned(),
                            |operation| format!("failed to {operation}"),
                        ),
                    ),
                }
            }
        }
    }

    pub fn into_response_for(self, operation: Option<&'static str>) -> Response {
        let status = self.status();

        match self.kind() {
            ErrorKind::Client => {
                info!(operation, error = %self, %status, "Replying with client error");
            }
            ErrorKind::Server => {
                error!(operation, error = ?self, %status, "Replying with server error");
            }
        }

        Json(self.error_response(operation)).with_status(status)
    }
}

#[derive(Clone, Eq, PartialEq, Debug, Default, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    /// Only set for errors with a well-known code, like `post_not_found`.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub code: Option<&'static str>,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    /// Field name to the reason it was rejected.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<BTreeMap<String, String>>)]
    pub validation_errors: Option<BTreeMap<&'static str, &'static str>>,
}

impl ErrorResponse {
    fn message(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Self::default()
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        self.into_response_for(None)
    }
}
