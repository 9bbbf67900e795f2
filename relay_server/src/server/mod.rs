pub mod ingest;
pub mod rtc;

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
use signaling::AppState;
use tokio::net::TcpListener;

use crate::config::AppConfig;
use crate::{info, warn};
use ingest::{PacketSink, UdpIngest};
use rtc::relay_engine::RelayEngine;

/// Ingest socket, engine and HTTP listener, all bound before anything is served.
pub struct RelayServer {
    engine: Arc<RelayEngine>,
    listener: TcpListener,
    ingest_addr: Option<SocketAddr>,
    app: Router,
}

impl RelayServer {
    /// Any bind failure, UDP or TCP, fails the whole startup.
    pub async fn bind(config: &AppConfig) -> Result<Self> {
        let ingest = if config.ingest.enabled {
            Some(UdpIngest::bind(&config.ingest.udp_addr).await?)
        } else {
            warn!("rtp ingest disabled");
            None
        };

        let engine = RelayEngine::new(config.rtc.clone(), ingest.as_ref().map(|i| i.stats()))?;

        let listener = TcpListener::bind(&config.server.http_addr)
            .await
            .with_context(|| format!("failed to bind http listener on {}", config.server.http_addr))?;

        let ingest_addr = match ingest {
            Some(ingest) => {
                let addr = ingest.local_addr()?;
                let sink: Arc<dyn PacketSink> = engine.video_track();
                tokio::spawn(ingest.run(sink));
                Some(addr)
            }
            None => None,
        };

        let state = AppState::new(engine.clone())
            .with_cors_allow_any(config.server.cors_allow_any)
            .with_max_body_bytes(config.server.max_body_bytes);
        let app = signaling::router(state, &config.server.static_dir);

        Ok(Self {
            engine,
            listener,
            ingest_addr,
            app,
        })
    }

    pub fn http_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    pub fn ingest_addr(&self) -> Option<SocketAddr> {
        self.ingest_addr
    }

    pub fn engine(&self) -> Arc<RelayEngine> {
        Arc::clone(&self.engine)
    }

    pub async fn serve<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        info!("screen relay listening on http://{}", self.http_addr()?);
        axum::serve(self.listener, self.app)
            .with_graceful_shutdown(shutdown)
            .await?;
        self.engine.shutdown().await;
        Ok(())
    }
}

pub async fn run(config: AppConfig) -> Result<()> {
    let server = RelayServer::bind(&config).await?;
    server.serve(shutdown_signal()).await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("failed to listen for ctrl-c: {}", e);
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}
