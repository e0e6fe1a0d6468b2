//! Turns the outcome of a handler into an HTTP response.
//!
//! | Outcome                  | Status | Body                                   |
//! |--------------------------|--------|----------------------------------------|
//! | `Ok(payload)`            | 200    | `payload`                              |
//! | client-caused error      | 422    | `{code?, message, details?, validationErrors?}` |
//! | server-caused error      | 500    | `{message: "failed to <operation>"}`   |
//! | panic                    | 500    | as for server-caused errors            |

use crate::server::{Result, ServerError, json::Json};
use axum::response::{IntoResponse, Response};
use futures::FutureExt;
use serde::Serialize;
use std::{any::Any, future::Future, panic::AssertUnwindSafe};
use tracing::info;

pub async fn decorate<T, F>(operation: &'static str, handler: F) -> Response
where
    F: Future<Output = Result<T>>,
    T: Serialize,
{
    let result = AssertUnwindSafe(handler)
        .catch_unwind()
        .await
        .unwrap_or_else(|panic| Err(ServerError::Panic(panic_message(&*panic))));

    match result {
        Ok(payload) => {
            info!(operation, "Successfully handled request");
            Json(payload).into_response()
        }
        Err(err) => err.into_response_for(Some(operation)),
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_owned()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "opaque panic payload".to_owned()
    }
}
