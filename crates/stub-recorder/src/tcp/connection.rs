//! Per-connection serving loop for the TCP recorder.

use super::frame::FrameReader;
use super::writer::TcpResponseWriter;
use crate::config::RecorderConfig;
use crate::recorder::{Dispatch, RecordedRequest, RecorderError, RecordingEngine};
use bytes::Bytes;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tracing::{debug, warn};

/// Connection settings derived once from the recorder config.
#[derive(Debug, Clone)]
pub(crate) struct ConnectionSettings {
    pub(crate) greeting: Option<Bytes>,
    pub(crate) default_response: Bytes,
    pub(crate) read_timeout: Duration,
    pub(crate) frame_gap: Duration,
    pub(crate) max_frame_bytes: usize,
}

impl From<&RecorderConfig> for ConnectionSettings {
    fn from(config: &RecorderConfig) -> Self {
        Self {
            greeting: config.greeting.clone().map(Bytes::from),
            default_response: config
                .default_response
                .clone()
                .map(Bytes::from)
                .unwrap_or_default(),
            read_timeout: config.read_timeout(),
            frame_gap: config.frame_gap(),
            max_frame_bytes: config.max_frame_bytes,
        }
    }
}

/// Serve one accepted connection until the peer closes it or it fails.
///
/// Failures are logged here and never reach the accept loop.
pub(crate) async fn serve_connection(
    stream: TcpStream,
    peer: SocketAddr,
    engine: &RecordingEngine<TcpResponseWriter>,
    settings: &ConnectionSettings,
) {
    match run_connection(stream, peer, engine, settings).await {
        Ok(()) => debug!("Client {} closed the connection", peer),
        Err(e) => warn!("Dropping connection from {}: {}", peer, e),
    }
}

async fn run_connection(
    stream: TcpStream,
    peer: SocketAddr,
    engine: &RecordingEngine<TcpResponseWriter>,
    settings: &ConnectionSettings,
) -> Result<(), RecorderError> {
    let (read_half, mut write_half) = stream.into_split();

    if let Some(greeting) = &settings.greeting {
        write_half.write_all(greeting).await?;
    }

    let mut frames = FrameReader::new(read_half, settings.max_frame_bytes, settings.frame_gap);
    loop {
        let frame = tokio::time::timeout(settings.read_timeout, frames.next_frame())
            .await
            .map_err(|_| RecorderError::ReadTimeout(settings.read_timeout))??;
        let Some(payload) = frame else {
            return Ok(());
        };
        debug!("Frame of {} bytes from {}", payload.len(), peer);

        let mut writer = TcpResponseWriter::new();
        let recorded = RecordedRequest::frame(peer, payload);
        let reply = match engine.record_and_dispatch(recorded, &mut writer) {
            Dispatch::Matched { rule_index } => {
                debug!("Frame from {} answered by rule {}", peer, rule_index);
                writer.into_bytes()
            }
            Dispatch::Fallback => settings.default_response.clone(),
        };

        if !reply.is_empty() {
            write_half.write_all(&reply).await?;
        }
    }
}
