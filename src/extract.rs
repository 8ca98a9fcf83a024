use axum::extract::FromRequest;

use crate::error::AppError;

/// JSON body extractor that reports malformed payloads as `AppError` (400)
/// instead of axum's plain-text rejection.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);
