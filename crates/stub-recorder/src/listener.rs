//! Listener lifecycle shared by the HTTP and TCP recorders.
//!
//! `start` binds the socket and hands it to a background accept task; `stop`
//! signals that task over a broadcast channel and waits for it to exit. The
//! accept loop owns the listener, so once `stop` returns the port is free.
//! Connections that were already accepted keep running until they finish.

use crate::recorder::RecorderError;
use parking_lot::Mutex;
use std::net::SocketAddr;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

struct Running {
    local_addr: SocketAddr,
    shutdown_tx: broadcast::Sender<()>,
    accept_task: JoinHandle<()>,
}

/// Owns the running state of one listening socket.
#[derive(Default)]
pub(crate) struct ListenerHandle {
    running: Mutex<Option<Running>>,
}

impl ListenerHandle {
    /// Bind `addr` and spawn the accept loop.
    ///
    /// `on_connection` is called on the accept task for every accepted socket
    /// and is expected to spawn its own task for serving it.
    pub(crate) async fn start<F>(
        &self,
        addr: &str,
        on_connection: F,
    ) -> Result<SocketAddr, RecorderError>
    where
        F: Fn(TcpStream, SocketAddr) + Send + 'static,
    {
        if let Some(local_addr) = self.local_addr() {
            return Err(RecorderError::AlreadyRunning(local_addr));
        }

        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| RecorderError::Bind {
                addr: addr.to_string(),
                source,
            })?;
        let local_addr = listener.local_addr()?;

        let (shutdown_tx, mut shutdown_rx) = broadcast::channel(1);

        let accept_task = tokio::spawn(async move {
            loop {
                tokio::select! {
                    result = listener.accept() => {
                        match result {
                            Ok((stream, peer)) => {
                                debug!("Accepted connection from {} on {}", peer, local_addr);
                                on_connection(stream, peer);
                            }
                            Err(e) => {
                                error!("Accept error on {}: {}", local_addr, e);
                            }
                        }
                    }
                    _ = shutdown_rx.recv() => {
                        info!("Recorder on {} shutting down", local_addr);
                        break;
                    }
                }
            }
        });

        self.register(Running {
            local_addr,
            shutdown_tx,
            accept_task,
        })?;
        info!("Recorder listening on {}", local_addr);

        Ok(local_addr)
    }

    fn register(&self, new: Running) -> Result<(), RecorderError> {
        let mut running = self.running.lock();
        // a concurrent start may have won the race while we were binding
        if let Some(existing) = running.as_ref() {
            let _ = new.shutdown_tx.send(());
            return Err(RecorderError::AlreadyRunning(existing.local_addr));
        }
        *running = Some(new);
        Ok(())
    }

    /// Stop accepting connections and wait until the listening socket is
    /// closed. Calling this when not running does nothing.
    pub(crate) async fn stop(&self) {
        let Some(running) = self.running.lock().take() else {
            return;
        };
        // the receiver is gone if the accept loop already exited
        let _ = running.shutdown_tx.send(());
        if let Err(e) = running.accept_task.await {
            error!("Accept loop on {} ended abnormally: {}", running.local_addr, e);
        }
    }

    /// Signal the accept loop without waiting for it to exit.
    fn signal_stop(&self) {
        if let Some(running) = self.running.lock().take() {
            let _ = running.shutdown_tx.send(());
        }
    }

    pub(crate) fn local_addr(&self) -> Option<SocketAddr> {
        self.running.lock().as_ref().map(|running| running.local_addr)
    }
}

impl Drop for ListenerHandle {
    fn drop(&mut self) {
        self.signal_stop();
    }
}
