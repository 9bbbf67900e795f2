use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use signaling::NegotiationError;
use tokio::sync::mpsc;
use webrtc::api::API;
use webrtc::ice_transport::ice_candidate::RTCIceCandidate;
use webrtc::ice_transport::ice_connection_state::RTCIceConnectionState;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::rtp_transceiver::rtp_sender::RTCRtpSender;
use webrtc::rtp_transceiver::rtp_transceiver_direction::RTCRtpTransceiverDirection;
use webrtc::rtp_transceiver::RTCRtpTransceiverInit;
use webrtc::track::track_local::track_local_static_rtp::TrackLocalStaticRTP;
use webrtc::track::track_local::TrackLocal;

use crate::{debug, error, info, warn};

/// One browser viewer: a peer connection sending the shared screen track.
pub struct PeerSession {
    pub session_id: String,
    peer_connection: Arc<RTCPeerConnection>,
}

impl PeerSession {
    /// `closed_tx` receives the session id once the connection fails or closes.
    pub async fn new(
        session_id: String,
        api: &API,
        config: RTCConfiguration,
        video_track: Arc<TrackLocalStaticRTP>,
        closed_tx: mpsc::Sender<String>,
    ) -> Result<Self> {
        let peer_connection = Arc::new(api.new_peer_connection(config).await?);

        let transceiver = peer_connection
            .add_transceiver_from_track(
                video_track as Arc<dyn TrackLocal + Send + Sync>,
                Some(RTCRtpTransceiverInit {
                    direction: RTCRtpTransceiverDirection::Sendonly,
                    send_encodings: vec![],
                }),
            )
            .await?;
        tokio::spawn(Self::rtcp_handler(transceiver.sender().await));

        let session = Self {
            session_id,
            peer_connection,
        };
        session.setup_pc_handlers(closed_tx);
        debug!("peer session {} created", &session.session_id);
        Ok(session)
    }

    fn setup_pc_handlers(&self, closed_tx: mpsc::Sender<String>) {
        let session_id = self.session_id.clone();
        self.peer_connection
            .on_ice_candidate(Box::new(move |c: Option<RTCIceCandidate>| {
                if let Some(candidate) = c {
                    debug!("session {} gathered ice candidate: {}", &session_id, candidate);
                }
                Box::pin(async {})
            }));

        let session_id = self.session_id.clone();
        self.peer_connection
            .on_ice_connection_state_change(Box::new(move |state: RTCIceConnectionState| {
                info!("session {} ice connection state: {}", &session_id, state);
                Box::pin(async {})
            }));

        let session_id = self.session_id.clone();
        self.peer_connection
            .on_peer_connection_state_change(Box::new(move |state: RTCPeerConnectionState| {
                info!("session {} peer connection state: {}", &session_id, state);
                let closed_tx = closed_tx.clone();
                let session_id = session_id.clone();
                Box::pin(async move {
                    if matches!(
                        state,
                        RTCPeerConnectionState::Failed | RTCPeerConnectionState::Closed
                    ) {
                        // the reaper may already be gone during shutdown
                        let _ = closed_tx.send(session_id).await;
                    }
                })
            }));
    }

    /// Remote description, answer, local description, then the bounded wait
    /// for ICE gathering. The returned answer embeds every gathered candidate.
    pub async fn negotiate(
        &self,
        offer: RTCSessionDescription,
        gather_timeout: Duration,
    ) -> Result<RTCSessionDescription, NegotiationError> {
        self.peer_connection
            .set_remote_description(offer)
            .await
            .map_err(|e| NegotiationError::RemoteDescription(e.to_string()))?;
        debug!("session {} remote description set", &self.session_id);

        let answer = self
            .peer_connection
            .create_answer(None)
            .await
            .map_err(|e| NegotiationError::CreateAnswer(e.to_string()))?;

        let mut gather_complete = self.peer_connection.gathering_complete_promise().await;
        self.peer_connection
            .set_local_description(answer)
            .await
            .map_err(|e| NegotiationError::LocalDescription(e.to_string()))?;

        if let Err(e) = wait_for_gathering(&mut gather_complete, gather_timeout).await {
            warn!("session {} {}", &self.session_id, e);
            return Err(e);
        }

        self.peer_connection
            .local_description()
            .await
            .ok_or_else(|| NegotiationError::LocalDescription("no local description".into()))
    }

    /// Reports the session as closed if it has not connected within `timeout`.
    pub fn spawn_connect_watchdog(&self, timeout: Duration, closed_tx: mpsc::Sender<String>) {
        let peer_connection = Arc::downgrade(&self.peer_connection);
        let session_id = self.session_id.clone();
        tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            let Some(peer_connection) = peer_connection.upgrade() else {
                return;
            };
            if peer_connection.connection_state() != RTCPeerConnectionState::Connected {
                warn!("session {} not connected after {:?}", &session_id, timeout);
                let _ = closed_tx.send(session_id).await;
            }
        });
    }

    pub async fn close(&self) {
        if let Err(e) = self.peer_connection.close().await {
            error!("session {} close error: {}", &self.session_id, e);
        }
    }

    // Interceptors (NACK, reports) only run while RTCP is being read.
    async fn rtcp_handler(sender: Arc<RTCRtpSender>) {
        let mut buff = vec![0u8; 1500];
        while sender.read(&mut buff).await.is_ok() {}
    }
}

/// Host candidates usually finish inside `set_local_description`; STUN and
/// TURN lookups are what can run past `timeout`.
async fn wait_for_gathering(
    gather_complete: &mut mpsc::Receiver<()>,
    timeout: Duration,
) -> Result<(), NegotiationError> {
    tokio::time::timeout(timeout, gather_complete.recv())
        .await
        .map(|_| ())
        .map_err(|_| NegotiationError::GatheringTimeout(timeout))
}
