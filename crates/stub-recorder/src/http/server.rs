//! HttpRecorder - the public HTTP record-and-stub server.

use super::handler::handle_recorder_request;
use super::writer::{stub_factory, HttpResponseWriter};
use crate::config::RecorderConfig;
use crate::listener::ListenerHandle;
use crate::predicate::RequestPredicate;
use crate::recorder::{RecordedRequest, RecorderError, RecordingEngine, RuleHandle};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::{TokioIo, TokioTimer};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::debug;

/// Records every inbound HTTP request and answers it from an ordered rule table.
///
/// ```no_run
/// # async fn demo() -> Result<(), stub_recorder::RecorderError> {
/// use stub_recorder::{HttpRecorder, RecorderConfig, RequestPredicate};
///
/// let recorder = HttpRecorder::new(RecorderConfig::default());
/// recorder.start().await?;
/// recorder
///     .use_response(|_, w| {
///         w.write("Hello World");
///     })
///     .for_requests([RequestPredicate::method("POST")]);
/// // ... exercise the code under test against recorder.url("/") ...
/// assert!(recorder.find(&[RequestPredicate::path("/talula")]));
/// recorder.stop().await;
/// # Ok(())
/// # }
/// ```
pub struct HttpRecorder {
    config: RecorderConfig,
    engine: Arc<RecordingEngine<HttpResponseWriter>>,
    listener: ListenerHandle,
}

impl HttpRecorder {
    /// Create a recorder. Stubs from the config are installed as the first rules.
    pub fn new(config: RecorderConfig) -> Self {
        let engine = Arc::new(RecordingEngine::new());
        for stub in &config.stubs {
            engine
                .push_rule(stub_factory(&stub.response))
                .for_requests(stub.predicates.iter().cloned());
        }

        Self {
            config,
            engine,
            listener: ListenerHandle::default(),
        }
    }

    /// Bind the configured address and serve in the background.
    ///
    /// Returns the bound address, which carries the real port when the
    /// config asked for port 0.
    pub async fn start(&self) -> Result<SocketAddr, RecorderError> {
        let engine = Arc::clone(&self.engine);
        let read_timeout = self.config.read_timeout();

        self.listener
            .start(&self.config.bind_addr(), move |stream, client_addr| {
                let engine = Arc::clone(&engine);
                tokio::spawn(async move {
                    let io = TokioIo::new(stream);
                    let service = service_fn(move |req| {
                        handle_recorder_request(req, Arc::clone(&engine), client_addr, read_timeout)
                    });
                    if let Err(e) = http1::Builder::new()
                        .timer(TokioTimer::new())
                        .header_read_timeout(read_timeout)
                        .serve_connection(io, service)
                        .await
                    {
                        debug!("Connection error from {}: {}", client_addr, e);
                    }
                });
            })
            .await
    }

    /// Stop accepting connections. The port is released when this returns;
    /// in-flight connections drain on their own.
    pub async fn stop(&self) {
        self.listener.stop().await;
    }

    /// Discard recorded requests and registered rules, including config stubs.
    pub fn clear(&self) {
        self.engine.clear();
    }

    /// Register a response rule. Without `for_requests` it matches everything.
    pub fn use_response<F>(&self, factory: F) -> RuleHandle<'_, HttpResponseWriter>
    where
        F: Fn(&RecordedRequest, &mut HttpResponseWriter) + Send + Sync + 'static,
    {
        self.engine.use_response(factory)
    }

    pub fn add_rule<F>(
        &self,
        factory: F,
        predicates: impl IntoIterator<Item = RequestPredicate>,
    ) -> RuleHandle<'_, HttpResponseWriter>
    where
        F: Fn(&RecordedRequest, &mut HttpResponseWriter) + Send + Sync + 'static,
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

    /// Bound address while running.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.listener.local_addr()
    }

    /// Absolute URL for `path` on this recorder.
    ///
    /// Uses the bound address while running and the configured host and port
    /// otherwise.
    pub fn url(&self, path: &str) -> String {
        match self.local_addr() {
            Some(addr) => format!("http://{addr}{path}"),
            None => format!("http://{}{path}", self.config.bind_addr()),
        }
    }
}
