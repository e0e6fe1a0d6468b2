use crate::server::ServerError;
use axum::{
    Json as AxumJson,
    extract::FromRequest,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::TypedHeader;
use headers::ContentType;
use serde::Serialize;

/// JSON body extractor and response whose failures are [`ServerError`]s.
#[derive(FromRequest, Debug, Clone, Copy, Default)]
#[from_request(via(AxumJson), rejection(ServerError))]
pub struct Json<T>(pub T);

impl<T: Serialize> Json<T> {
    pub fn with_status(self, status: StatusCode) -> Response {
        match serde_json::to_vec(&self.0) {
            Ok(json) => (status, TypedHeader(ContentType::json()), json).into_response(),
            Err(err) => ServerError::JsonResponse(err).into_response(),
        }
    }
}

impl<T: Serialize> IntoResponse for Json<T> {
    fn into_response(self) -> Response {
        self.with_status(StatusCode::OK)
    }
}
