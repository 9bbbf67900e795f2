use std::sync::Arc;

use crate::serv::engine::OfferHandler;

pub const DEFAULT_MAX_BODY_BYTES: usize = 64 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub engine: Option<Arc<dyn OfferHandler>>,
    /// Adds `Access-Control-Allow-Origin: *` to every `/sdp` response.
    pub cors_allow_any: bool,
    pub max_body_bytes: usize,
}

impl AppState {
    pub fn new(engine: Arc<dyn OfferHandler>) -> Self {
        Self {
            engine: Some(engine),
            cors_allow_any: false,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }

    /// State with no engine behind it; signaling requests fail with 500.
    pub fn uninitialized() -> Self {
        Self {
            engine: None,
            cors_allow_any: false,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }

    pub fn with_cors_allow_any(mut self, enabled: bool) -> Self {
        self.cors_allow_any = enabled;
        self
    }

    pub fn with_max_body_bytes(mut self, limit: usize) -> Self {
        self.max_body_bytes = limit;
        self
    }
}
