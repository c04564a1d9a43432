//! TcpRecorder - the public raw TCP record-and-stub server.

use super::connection::{serve_connection, ConnectionSettings};
use super::writer::{stub_factory, TcpResponseWriter};
use crate::config::RecorderConfig;
use crate::listener::ListenerHandle;
use crate::predicate::RequestPredicate;
use crate::recorder::{RecordedRequest, RecorderError, RecordingEngine, RuleHandle};
use std::net::SocketAddr;
use std::sync::Arc;

/// Records every inbound TCP frame and answers it from an ordered rule table.
///
/// Recorded requests have an empty method, path and query; the frame is the
/// body. See the `frame` module for what counts as one frame.
pub struct TcpRecorder {
    config: RecorderConfig,
    settings: Arc<ConnectionSettings>,
    engine: Arc<RecordingEngine<TcpResponseWriter>>,
    listener: ListenerHandle,
}

impl TcpRecorder {
    /// Create a recorder. Stubs from the config are installed as the first rules.
    pub fn new(config: RecorderConfig) -> Self {
        let engine = Arc::new(RecordingEngine::new());
        for stub in &config.stubs {
            engine
                .push_rule(stub_factory(&stub.response))
                .for_requests(stub.predicates.iter().cloned());
        }

        Self {
            settings: Arc::new(ConnectionSettings::from(&config)),
            config,
            engine,
            listener: ListenerHandle::default(),
        }
    }

    /// Bind the configured address and serve in the background.
    pub async fn start(&self) -> Result<SocketAddr, RecorderError> {
        let engine = Arc::clone(&self.engine);
        let settings = Arc::clone(&self.settings);

        self.listener
            .start(&self.config.bind_addr(), move |stream, peer| {
                let engine = Arc::clone(&engine);
                let settings = Arc::clone(&settings);
                tokio::spawn(async move {
                    serve_connection(stream, peer, &engine, &settings).await;
                });
            })
            .await
    }

    /// Stop accepting connections and release the port. Open connections
    /// keep being served.
    pub async fn stop(&self) {
        self.listener.stop().await;
    }

    pub fn clear(&self) {
        self.engine.clear();
    }

    pub fn use_response<F>(&self, factory: F) -> RuleHandle<'_, TcpResponseWriter>
    where
        F: Fn(&RecordedRequest, &mut TcpResponseWriter) + Send + Sync + 'static,
    {
        self.engine.use_response(factory)
    }

    pub fn add_rule<F>(
        &self,
        factory: F,
        predicates: impl IntoIterator<Item = RequestPredicate>,
    ) -> RuleHandle<'_, TcpResponseWriter>
    where
        F: Fn(&RecordedRequest, &mut TcpResponseWriter) + Send + Sync + 'static,
    {
        self.engine.add_rule(factory, predicates)
    }

    pub fn find(&self, predicates: &[RequestPredicate]) -> bool {
        self.engine.find(predicates)
    }

    pub fn unmatched(&self, predicates: &[RequestPredicate]) -> Vec<String> {
        self.engine.unmatched(predicates)
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.engine.requests()
    }

    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.listener.local_addr()
    }
}
