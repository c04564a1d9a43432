//! Transport-agnostic recording and rule-matching engine.
//!
//! This module provides:
//! - `RecordedRequest`: immutable capture of one inbound message
//! - `RecordingEngine`: the request log and rule table under one lock
//! - `RuleHandle`: builder handle for restricting a freshly registered rule
//!
//! ## Module Structure
//!
//! - `types`: Recorded request and error types
//! - `rules`: Rule table entries and the rule handle
//! - `core`: The engine itself (record, dispatch, clear, find)

mod core;
mod rules;
mod types;

pub use core::{Dispatch, RecordingEngine};
pub use rules::{ResponseFactory, RuleHandle};
pub use types::{RecordedRequest, RecorderError};
