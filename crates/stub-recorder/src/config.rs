//! Recorder configuration.

use crate::predicate::RequestPredicate;
use crate::recorder::RecorderError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::time::Duration;

/// Transport a recorder listens with.
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    #[default]
    Http,
    Tcp,
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Protocol::Http => write!(f, "http"),
            Protocol::Tcp => write!(f, "tcp"),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RecorderConfig {
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to bind (0 = let the OS pick an ephemeral port)
    #[serde(default)]
    pub port: u16,
    #[serde(default)]
    pub protocol: Protocol,
    /// Per-connection idle/read deadline
    #[serde(default = "default_read_timeout_ms")]
    pub read_timeout_ms: u64,
    /// Silence on a TCP connection that ends the current frame. Segments of
    /// one client write arrive closer together than this.
    #[serde(default = "default_frame_gap_ms")]
    pub frame_gap_ms: u64,
    /// Largest TCP frame accepted before the connection is dropped
    #[serde(default = "default_max_frame_bytes")]
    pub max_frame_bytes: usize,
    /// Bytes written to every new TCP connection
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub greeting: Option<String>,
    /// Bytes written for a TCP frame no rule matched (nothing when unset)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_response: Option<String>,
    /// Static rules installed when the recorder is created
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stubs: Vec<StubConfig>,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_read_timeout_ms() -> u64 {
    30_000
}

fn default_frame_gap_ms() -> u64 {
    20
}

fn default_max_frame_bytes() -> usize {
    1024 * 1024
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: 0,
            protocol: Protocol::default(),
            read_timeout_ms: default_read_timeout_ms(),
            frame_gap_ms: default_frame_gap_ms(),
            max_frame_bytes: default_max_frame_bytes(),
            greeting: None,
            default_response: None,
            stubs: Vec::new(),
        }
    }
}

impl RecorderConfig {
    /// Config bound to a specific port with every other field defaulted.
    pub fn with_port(port: u16) -> Self {
        Self {
            port,
            ..Self::default()
        }
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self, RecorderError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, RecorderError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&contents)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    pub fn frame_gap(&self) -> Duration {
        Duration::from_millis(self.frame_gap_ms)
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// A rule whose response is fixed at configuration time.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct StubConfig {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub predicates: Vec<RequestPredicate>,
    pub response: StubResponse,
}

/// Fixed response. TCP recorders only use `body`.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct StubResponse {
    #[serde(default = "default_status_code")]
    pub status_code: u16,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
    #[serde(default)]
    pub body: String,
}

fn default_status_code() -> u16 {
    200
}
