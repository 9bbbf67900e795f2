use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use signaling::{EngineStatus, Negotiated, NegotiationError, OfferHandler, SessionDescription};
use tokio::sync::mpsc;
use webrtc::api::API;
use webrtc::track::track_local::track_local_static_rtp::TrackLocalStaticRTP;

use super::peer_session::PeerSession;
use super::session_mngr::SessionMngr;
use super::{
    build_api, from_rtc_description, peer_configuration, screen_video_track, to_rtc_description,
};
use crate::config::RtcConfig;
use crate::server::ingest::IngestStats;
use crate::{debug, info, warn};

const CLOSED_CHANNEL_SIZE: usize = 100;

/// Answers offers on per-session peer connections that all carry the same
/// screen track.
pub struct RelayEngine {
    api: API,
    config: RtcConfig,
    video_track: Arc<TrackLocalStaticRTP>,
    sessions: Arc<SessionMngr>,
    closed_tx: mpsc::Sender<String>,
    ingest_stats: Option<Arc<IngestStats>>,
}

impl RelayEngine {
    pub fn new(config: RtcConfig, ingest_stats: Option<Arc<IngestStats>>) -> Result<Arc<Self>> {
        let api = build_api(&config)?;
        let sessions = Arc::new(SessionMngr::new());
        let (closed_tx, closed_rx) = mpsc::channel(CLOSED_CHANNEL_SIZE);
        tokio::spawn(Self::reap_closed(Arc::clone(&sessions), closed_rx));

        Ok(Arc::new(Self {
            api,
            config,
            video_track: screen_video_track(),
            sessions,
            closed_tx,
            ingest_stats,
        }))
    }

    pub fn video_track(&self) -> Arc<TrackLocalStaticRTP> {
        Arc::clone(&self.video_track)
    }

    pub fn sessions(&self) -> Arc<SessionMngr> {
        Arc::clone(&self.sessions)
    }

    pub async fn shutdown(&self) {
        let sessions = self.sessions.drain().await;
        info!("closing {} sessions", sessions.len());
        for session in sessions {
            session.close().await;
        }
    }

    async fn reap_closed(sessions: Arc<SessionMngr>, mut closed_rx: mpsc::Receiver<String>) {
        while let Some(session_id) = closed_rx.recv().await {
            if let Some(session) = sessions.remove(&session_id).await {
                info!("disposing session {}", &session_id);
                session.close().await;
            }
        }
    }

    async fn negotiate(&self, offer: SessionDescription) -> Result<Negotiated, NegotiationError> {
        let remote = to_rtc_description(&offer)
            .map_err(|e| NegotiationError::RemoteDescription(e.to_string()))?;

        let session_id = xid::new().to_string();
        let session = PeerSession::new(
            session_id.clone(),
            &self.api,
            peer_configuration(&self.config),
            self.video_track(),
            self.closed_tx.clone(),
        )
        .await
        .map_err(|e| NegotiationError::PeerConnection(e.to_string()))?;
        let session = Arc::new(session);

        if !self
            .sessions
            .try_insert(Arc::clone(&session), self.config.max_sessions)
            .await
        {
            session.close().await;
            return Err(NegotiationError::SessionLimit(self.config.max_sessions));
        }

        let local = match session.negotiate(remote, self.config.gather_timeout()).await {
            Ok(local) => local,
            Err(e) => {
                self.sessions.remove(&session_id).await;
                session.close().await;
                return Err(e);
            }
        };

        let answer = match from_rtc_description(&local) {
            Ok(answer) => answer,
            Err(e) => {
                self.sessions.remove(&session_id).await;
                session.close().await;
                return Err(NegotiationError::LocalDescription(e.to_string()));
            }
        };

        session.spawn_connect_watchdog(self.config.connect_timeout(), self.closed_tx.clone());
        Ok(Negotiated { session_id, answer })
    }
}

#[async_trait]
impl OfferHandler for RelayEngine {
    async fn answer(&self, offer: SessionDescription) -> Result<Negotiated, NegotiationError> {
        let result = self.negotiate(offer).await;
        match &result {
            Ok(negotiated) => debug!("session {} negotiated", &negotiated.session_id),
            Err(e) => warn!("negotiation failed: {}", e),
        }
        result
    }

    async fn close_session(&self, session_id: &str) -> bool {
        match self.sessions.remove(session_id).await {
            Some(session) => {
                session.close().await;
                true
            }
            None => false,
        }
    }

    async fn status(&self) -> EngineStatus {
        EngineStatus {
            sessions: self.sessions.len().await,
            ingest: self.ingest_stats.as_ref().map(|stats| stats.snapshot()),
        }
    }
}
