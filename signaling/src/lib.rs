//! HTTP signaling surface for the screen relay.
//!
//! Serves the viewer page, accepts non-trickle SDP offers on `/sdp` and hands
//! them to whatever [`OfferHandler`] the process installs.

pub mod app;
pub mod serv;

pub use app::AppState;
pub use serv::engine::{Negotiated, NegotiationError, OfferHandler};
pub use serv::error::SignalingError;
pub use serv::msgs::{EngineStatus, IngestStatus, SdpType, SessionDescription};
pub use serv::router;
