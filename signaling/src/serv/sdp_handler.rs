use axum::{
    body,
    extract::{Path, Request, State},
    http::{header, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use log::{debug, error, info};

use super::error::SignalingError;
use super::msgs::SessionDescription;
use crate::app::AppState;

/// `/sdp`: takes a non-trickle offer and answers once ICE gathering is done.
pub async fn sdp_handler(State(state): State<AppState>, req: Request) -> Response {
    let mut response = match exchange(&state, req).await {
        Ok(response) => response,
        Err(e) => {
            error!("sdp exchange failed: {}", e);
            e.into_response()
        }
    };

    if state.cors_allow_any {
        response.headers_mut().insert(
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static("*"),
        );
    }
    response
}

async fn exchange(state: &AppState, req: Request) -> Result<Response, SignalingError> {
    if req.method() != Method::POST {
        return Err(SignalingError::MethodNotAllowed);
    }

    let bytes = body::to_bytes(req.into_body(), state.max_body_bytes)
        .await
        .map_err(SignalingError::BodyRead)?;
    info!("sdp offer received:\n{}", String::from_utf8_lossy(&bytes));

    let engine = state
        .engine
        .as_ref()
        .ok_or(SignalingError::EngineUnavailable)?;

    let offer: SessionDescription = serde_json::from_slice(&bytes)?;

    let negotiated = engine.answer(offer).await?;
    info!("sdp answer sent for session {}", negotiated.session_id);

    let location = format!("/sdp/{}", negotiated.session_id);
    Ok((
        StatusCode::OK,
        [(header::LOCATION, location)],
        Json(negotiated.answer),
    )
        .into_response())
}

/// `DELETE /sdp/:session_id`
pub async fn close_session_handler(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<StatusCode, SignalingError> {
    let engine = state
        .engine
        .as_ref()
        .ok_or(SignalingError::EngineUnavailable)?;

    if engine.close_session(&session_id).await {
        debug!("session {} closed by client", session_id);
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(SignalingError::SessionNotFound)
    }
}

/// `GET /health`
pub async fn health_handler(State(state): State<AppState>) -> Response {
    let Some(engine) = state.engine.as_ref() else {
        return (StatusCode::SERVICE_UNAVAILABLE, "engine not initialized").into_response();
    };

    let status = engine.status().await;
    let code = if status.is_healthy() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (code, Json(status)).into_response()
}
