//! Response writer handed to TCP response factories.

use crate::config::StubResponse;
use crate::recorder::{RecordedRequest, ResponseFactory};
use bytes::{Bytes, BytesMut};
use std::sync::Arc;

/// Buffers raw bytes to send back on the connection the frame came from.
///
/// Bytes are flushed to the socket after the rule table lock is released.
#[derive(Debug, Clone, Default)]
pub struct TcpResponseWriter {
    buf: BytesMut,
}

impl TcpResponseWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn send(&mut self, message: &str) -> &mut Self {
        self.send_bytes(message.as_bytes())
    }

    pub fn send_bytes(&mut self, bytes: &[u8]) -> &mut Self {
        self.buf.extend_from_slice(bytes);
        self
    }

    pub fn into_bytes(self) -> Bytes {
        self.buf.freeze()
    }
}

/// Factory that always sends the stub body.
pub fn stub_factory(stub: &StubResponse) -> ResponseFactory<TcpResponseWriter> {
    let body = Bytes::from(stub.body.clone());
    Arc::new(move |_: &RecordedRequest, writer: &mut TcpResponseWriter| {
        writer.send_bytes(&body);
    })
}
