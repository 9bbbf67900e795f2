pub mod peer_session;
pub mod relay_engine;
pub mod session_mngr;

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use signaling::{SdpType, SessionDescription};
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::{MediaEngine, MIME_TYPE_H264};
use webrtc::api::setting_engine::SettingEngine;
use webrtc::api::{APIBuilder, API};
use webrtc::ice_transport::ice_server::RTCIceServer;
use webrtc::interceptor::registry::Registry;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::sdp::sdp_type::RTCSdpType;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;
use webrtc::rtp_transceiver::rtp_codec::RTCRtpCodecCapability;
use webrtc::track::track_local::track_local_static_rtp::TrackLocalStaticRTP;
use webrtc::track::track_local::TrackLocalWriter;

use crate::config::RtcConfig;
use crate::server::ingest::PacketSink;

pub const VIDEO_CLOCK_RATE: u32 = 90000;
pub const VIDEO_FMTP_LINE: &str = "packetization-mode=1";

pub fn build_api(config: &RtcConfig) -> Result<API> {
    let mut media_engine = MediaEngine::default();
    media_engine.register_default_codecs()?;
    let registry = register_default_interceptors(Registry::new(), &mut media_engine)?;

    let mut settings = SettingEngine::default();
    if config.include_loopback {
        settings.set_include_loopback_candidate(true);
    }

    Ok(APIBuilder::new()
        .with_media_engine(media_engine)
        .with_interceptor_registry(registry)
        .with_setting_engine(settings)
        .build())
}

pub fn peer_configuration(config: &RtcConfig) -> RTCConfiguration {
    let ice_servers = if config.ice_servers.is_empty() {
        Vec::new()
    } else {
        vec![RTCIceServer {
            urls: config.ice_servers.clone(),
            ..Default::default()
        }]
    };

    RTCConfiguration {
        ice_servers,
        ..Default::default()
    }
}

/// The track every session sends and the UDP ingest writes into.
pub fn screen_video_track() -> Arc<TrackLocalStaticRTP> {
    Arc::new(TrackLocalStaticRTP::new(
        RTCRtpCodecCapability {
            mime_type: MIME_TYPE_H264.to_owned(),
            clock_rate: VIDEO_CLOCK_RATE,
            sdp_fmtp_line: VIDEO_FMTP_LINE.to_owned(),
            ..Default::default()
        },
        "video".to_owned(),
        "screen".to_owned(),
    ))
}

pub fn to_rtc_description(desc: &SessionDescription) -> Result<RTCSessionDescription> {
    let sdp = desc.sdp.clone();
    let rtc = match desc.sdp_type {
        SdpType::Offer => RTCSessionDescription::offer(sdp)?,
        SdpType::Answer => RTCSessionDescription::answer(sdp)?,
        SdpType::Pranswer => RTCSessionDescription::pranswer(sdp)?,
        SdpType::Rollback => anyhow::bail!("rollback is not supported"),
    };
    Ok(rtc)
}

pub fn from_rtc_description(desc: &RTCSessionDescription) -> Result<SessionDescription> {
    let sdp_type = match desc.sdp_type {
        RTCSdpType::Offer => SdpType::Offer,
        RTCSdpType::Answer => SdpType::Answer,
        RTCSdpType::Pranswer => SdpType::Pranswer,
        RTCSdpType::Rollback => SdpType::Rollback,
        RTCSdpType::Unspecified => anyhow::bail!("local description has no type"),
    };
    Ok(SessionDescription {
        sdp_type,
        sdp: desc.sdp.clone(),
    })
}

#[async_trait]
impl PacketSink for TrackLocalStaticRTP {
    async fn write_packet(&self, packet: &[u8]) -> Result<usize> {
        Ok(TrackLocalWriter::write(self, packet).await?)
    }
}
