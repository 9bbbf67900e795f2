use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use thiserror::Error;

use super::engine::NegotiationError;

#[derive(Debug, Error)]
pub enum SignalingError {
    #[error("Method Not Allowed")]
    MethodNotAllowed,
    #[error("Failed to read request body")]
    BodyRead(#[source] axum::Error),
    #[error("Failed to parse SDP offer")]
    InvalidOffer(#[from] serde_json::Error),
    #[error("PeerConnection engine not initialized")]
    EngineUnavailable,
    #[error("Session not found")]
    SessionNotFound,
    #[error(transparent)]
    Negotiation(#[from] NegotiationError),
}

impl SignalingError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            SignalingError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            SignalingError::BodyRead(_) | SignalingError::InvalidOffer(_) => {
                StatusCode::BAD_REQUEST
            }
            SignalingError::EngineUnavailable => StatusCode::INTERNAL_SERVER_ERROR,
            SignalingError::SessionNotFound => StatusCode::NOT_FOUND,
            SignalingError::Negotiation(NegotiationError::SessionLimit(_)) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            SignalingError::Negotiation(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for SignalingError {
    fn into_response(self) -> Response {
        let mut response = (self.status_code(), self.to_string()).into_response();
        if matches!(self, SignalingError::MethodNotAllowed) {
            response
                .headers_mut()
                .insert(header::ALLOW, HeaderValue::from_static("POST"));
        }
        response
    }
}
