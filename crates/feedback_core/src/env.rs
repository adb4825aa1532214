//! Environment detection: local (mock data) versus remote (document store).
//!
//! # Invariants
//! - Probes are consulted on every store call; nothing caches the answer.
//! - Host classification is a pure function of the host name.

use log::warn;
use serde::{Deserialize, Serialize};

/// Data source the store talks to for one call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// Mock data only; no repository access.
    Local,
    /// Real repository calls.
    Remote,
}

impl Mode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Remote => "remote",
        }
    }
}

/// Configured mode selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModeSetting {
    Local,
    Remote,
    /// Classify the machine host name on every call.
    ///
    /// Only loopback names (`localhost`, `127.0.0.1`, `::1`, `*.localhost`)
    /// select local mode, and a machine's own host name rarely is one, so in
    /// practice this resolves to remote. Set `local` explicitly to work
    /// against the mock datasets.
    #[default]
    Auto,
}

/// Decides the mode for the next store call.
pub trait EnvironmentProbe: Send + Sync {
    fn mode(&self) -> Mode;
}

impl EnvironmentProbe for Mode {
    fn mode(&self) -> Mode {
        *self
    }
}

impl EnvironmentProbe for ModeSetting {
    fn mode(&self) -> Mode {
        match self {
            Self::Local => Mode::Local,
            Self::Remote => Mode::Remote,
            Self::Auto => current_host_mode(),
        }
    }
}

impl<F> EnvironmentProbe for F
where
    F: Fn() -> Mode + Send + Sync,
{
    fn mode(&self) -> Mode {
        self()
    }
}

/// Classifies a host name: loopback and development hosts are local.
pub fn classify_host(host: &str) -> Mode {
    let host = host.trim().to_ascii_lowercase();
    let is_local = matches!(host.as_str(), "localhost" | "127.0.0.1" | "::1" | "[::1]")
        || host.ends_with(".localhost");
    if is_local {
        Mode::Local
    } else {
        Mode::Remote
    }
}

fn current_host_mode() -> Mode {
    match hostname::get() {
        Ok(name) => classify_host(&name.to_string_lossy()),
        Err(err) => {
            warn!("event=env_detect module=env status=error fallback=remote error={err}");
            Mode::Remote
        }
    }
}
