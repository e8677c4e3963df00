use std::any::Any;

use axum::response::{IntoResponse, Response};

use crate::handler::ErrorKind;
use crate::middleware::TRACING_TARGET_MIDDLEWARE;

type Panic = Box<dyn Any + Send + 'static>;

/// Logs a handler panic and answers with `500`.
pub fn catch_panic(err: Panic) -> Response {
    if let Some(panic) = err.downcast_ref::<String>() {
        tracing::error!(target: TRACING_TARGET_MIDDLEWARE, "service panic: {}", panic);
    } else if let Some(panic) = err.downcast_ref::<&str>() {
        tracing::error!(target: TRACING_TARGET_MIDDLEWARE, "service panic: {}", panic);
    } else {
        tracing::error!(target: TRACING_TARGET_MIDDLEWARE, "service panic: unknown panic type");
    }

    ErrorKind::InternalServerError.into_response()
}
