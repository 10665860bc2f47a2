// In crates/web-server/src/error.rs

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// The quote provider returned no data or the call itself failed.
    /// Surfaced to the client as a 400 carrying the provider's message.
    #[error("{0}")]
    QuoteLookup(#[from] quote_client::Error),
    #[error("Failed to bind server address: {0}")]
    ServerBindError(std::io::Error),
    #[error("Server error: {0}")]
    ServerError(std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, detail) = match &self {
            Error::QuoteLookup(err) => (StatusCode::BAD_REQUEST, err.to_string()),
            Error::ServerBindError(err) | Error::ServerError(err) => {
                (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
            }
        };
        (status, Json(serde_json::json!({ "detail": detail }))).into_response()
    }
}
