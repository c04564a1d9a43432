//! Record-and-stub servers for tests.
//!
//! A recorder listens on a port, records every inbound request verbatim and
//! answers each one from an ordered, predicate-gated rule table. The first
//! rule whose predicates all hold writes the response; with no match the
//! recorder sends its default response.
//!
//! Two transports share the same engine:
//! - [`HttpRecorder`] for HTTP/1.1 requests
//! - [`TcpRecorder`] for raw byte streams, one frame per read burst

pub mod config;
pub mod http;
pub mod predicate;
pub mod recorder;
pub mod tcp;

mod listener;

pub use config::{Protocol, RecorderConfig, StubConfig, StubResponse};
pub use http::{HttpRecorder, HttpResponseWriter};
pub use predicate::RequestPredicate;
pub use recorder::{Dispatch, RecordedRequest, RecorderError, RecordingEngine, RuleHandle};
pub use tcp::{TcpRecorder, TcpResponseWriter};
