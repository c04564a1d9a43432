//! Raw TCP transport for the recorder.
//!
//! ## Module Structure
//!
//! - `frame`: Splits a byte stream into frames (one read burst each)
//! - `writer`: Byte buffer handed to response factories
//! - `connection`: Per-connection greet/read/record/reply loop
//! - `server`: `TcpRecorder`, the public entry point

mod connection;
mod frame;
mod server;
mod writer;

pub use frame::FrameReader;
pub use server::TcpRecorder;
pub use writer::{stub_factory, TcpResponseWriter};
