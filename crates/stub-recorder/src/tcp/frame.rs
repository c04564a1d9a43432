//! Frame reader for raw TCP connections.
//!
//! TCP carries no message boundaries. A frame here is one burst of bytes: the
//! first read after an idle period plus everything that follows until the
//! socket has been quiet for the frame gap. A large client write split into
//! many segments therefore arrives as one frame. Several logical messages
//! pipelined back to back also arrive as one frame, and are recorded as a
//! single request.

use crate::recorder::RecorderError;
use bytes::{Bytes, BytesMut};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};

const READ_CHUNK: usize = 4096;

pub struct FrameReader<R> {
    inner: R,
    max_frame_bytes: usize,
    frame_gap: Duration,
}

impl<R: AsyncRead + Unpin> FrameReader<R> {
    pub fn new(inner: R, max_frame_bytes: usize, frame_gap: Duration) -> Self {
        Self {
            inner,
            max_frame_bytes,
            frame_gap,
        }
    }

    /// Wait for the next frame. Returns `Ok(None)` once the peer has closed
    /// its side and every frame before that was returned.
    pub async fn next_frame(&mut self) -> Result<Option<Bytes>, RecorderError> {
        let mut buf = BytesMut::with_capacity(READ_CHUNK);
        if self.inner.read_buf(&mut buf).await? == 0 {
            return Ok(None);
        }

        loop {
            if buf.len() > self.max_frame_bytes {
                return Err(RecorderError::FrameTooLarge {
                    limit: self.max_frame_bytes,
                });
            }
            buf.reserve(READ_CHUNK);
            match tokio::time::timeout(self.frame_gap, self.inner.read_buf(&mut buf)).await {
                // quiet for a whole gap, or the peer half-closed: frame complete
                Err(_) | Ok(Ok(0)) => break,
                Ok(Ok(_)) => continue,
                Ok(Err(e)) => return Err(e.into()),
            }
        }

        Ok(Some(buf.freeze()))
    }
}
