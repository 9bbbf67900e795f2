use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use super::msgs::{EngineStatus, SessionDescription};

/// Answer produced for one accepted offer.
#[derive(Debug, Clone)]
pub struct Negotiated {
    pub session_id: String,
    pub answer: SessionDescription,
}

#[derive(Debug, Error)]
pub enum NegotiationError {
    #[error("failed to create peer connection: {0}")]
    PeerConnection(String),
    #[error("failed to set remote description: {0}")]
    RemoteDescription(String),
    #[error("failed to create SDP answer: {0}")]
    CreateAnswer(String),
    #[error("failed to set local description: {0}")]
    LocalDescription(String),
    #[error("ICE gathering did not complete within {0:?}")]
    GatheringTimeout(Duration),
    #[error("session limit of {0} reached")]
    SessionLimit(usize),
}

/// The WebRTC engine behind the signaling routes.
#[async_trait]
pub trait OfferHandler: Send + Sync {
    /// Runs remote description, answer creation, local description and the
    /// wait for ICE gathering on a fresh session.
    async fn answer(&self, offer: SessionDescription) -> Result<Negotiated, NegotiationError>;

    /// Closes and forgets a session. Returns false for unknown ids.
    async fn close_session(&self, session_id: &str) -> bool;

    async fn status(&self) -> EngineStatus;
}
