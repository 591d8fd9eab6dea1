/*
 * Responsibility
 * - Gateway-level AppError (anything that is not a credential decision)
 * - IntoResponse: same JSON envelope the authentication filter writes
 */
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::middleware::gateway::responder::{ResponseBuffer, write_envelope};

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(&'static str),
    #[error("no route for path")]
    NotFound,
    #[error("request body too large")]
    PayloadTooLarge,
    #[error("bad gateway")]
    BadGateway,
    #[error("gateway timeout")]
    Timeout,
    #[error("internal server error")]
    Internal,
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::BadGateway => StatusCode::BAD_GATEWAY,
            AppError::Timeout => StatusCode::GATEWAY_TIMEOUT,
            AppError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let mut buf = ResponseBuffer::new();

        // The buffer only fails on writes after close, which cannot happen here.
        if write_envelope(&mut buf, status, status.as_u16(), &self.to_string()).is_err() {
            return status.into_response();
        }
        buf.into_response()
    }
}
