//! UDP ingest: raw RTP datagrams from a local encoder, copied unchanged into
//! the outbound video track.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use signaling::IngestStatus;
use tokio::net::UdpSocket;

use crate::{error, info, warn};

/// Typical MTU; larger datagrams are truncated by the socket.
pub const MAX_DATAGRAM_SIZE: usize = 1500;

#[async_trait]
pub trait PacketSink: Send + Sync {
    async fn write_packet(&self, packet: &[u8]) -> Result<usize>;
}

#[derive(Debug, Default)]
pub struct IngestStats {
    running: AtomicBool,
    packets: AtomicU64,
    bytes: AtomicU64,
    dropped: AtomicU64,
}

impl IngestStats {
    pub fn snapshot(&self) -> IngestStatus {
        IngestStatus {
            running: self.running.load(Ordering::Relaxed),
            packets: self.packets.load(Ordering::Relaxed),
            bytes: self.bytes.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
        }
    }
}

pub struct UdpIngest {
    socket: UdpSocket,
    stats: Arc<IngestStats>,
}

impl UdpIngest {
    pub async fn bind(addr: &str) -> Result<Self> {
        let socket = UdpSocket::bind(addr)
            .await
            .with_context(|| format!("failed to bind rtp ingest socket on {}", addr))?;
        Ok(Self {
            socket,
            stats: Arc::new(IngestStats::default()),
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.socket.local_addr()?)
    }

    pub fn stats(&self) -> Arc<IngestStats> {
        Arc::clone(&self.stats)
    }

    /// Runs until the socket fails to read. A failed write drops that packet only.
    pub async fn run(self, sink: Arc<dyn PacketSink>) {
        self.stats.running.store(true, Ordering::Relaxed);
        info!(
            "waiting for rtp packets on udp {}",
            self.local_addr()
                .map(|addr| addr.to_string())
                .unwrap_or_default()
        );

        let mut buffer = vec![0u8; MAX_DATAGRAM_SIZE];
        loop {
            let n = match self.socket.recv_from(&mut buffer).await {
                Ok((n, _)) => n,
                Err(e) => {
                    error!("error reading udp packet: {}", e);
                    break;
                }
            };
            self.stats.packets.fetch_add(1, Ordering::Relaxed);
            self.stats.bytes.fetch_add(n as u64, Ordering::Relaxed);

            if let Err(e) = sink.write_packet(&buffer[..n]).await {
                self.stats.dropped.fetch_add(1, Ordering::Relaxed);
                warn!("error writing to video track: {}", e);
            }
        }

        self.stats.running.store(false, Ordering::Relaxed);
        error!("rtp ingest stopped");
    }
}
