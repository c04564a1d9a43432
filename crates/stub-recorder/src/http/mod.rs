//! HTTP transport for the recorder.
//!
//! Each accepted socket is served by hyper's HTTP/1 connection driver on its
//! own task. Requests are fully read, recorded and answered by the shared
//! recording engine.

mod handler;
mod server;
mod writer;

pub use server::HttpRecorder;
pub use writer::{stub_factory, HttpResponseWriter};
