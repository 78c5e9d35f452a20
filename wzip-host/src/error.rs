//! Bridge error types
//!
//! Every failure is local to one invocation. The bridge never retries; each
//! host adapter maps these to its own visible behavior.

use crate::invocation::Phase;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while bridging one invocation
#[derive(Debug, Error)]
pub enum BridgeError {
    /// The host could not supply the input bytes
    #[error("Input unavailable: {reason}")]
    InputUnavailable {
        reason: String,
        #[source]
        source: Option<std::io::Error>,
    },

    /// The module trapped or exited non-zero; no output is valid
    #[error("Sandbox failed: {message}")]
    SandboxTrap {
        /// Exit status when the module called `proc_exit` with a non-zero code
        exit_code: Option<i32>,
        message: String,
        /// Whatever the module wrote to stderr before failing
        stderr: String,
    },

    /// The module reported success but stdout was never produced
    #[error("Sandbox produced no output")]
    OutputMissing,

    /// The runtime refused a path outside the granted directories
    #[error("Capability denied: {detail}")]
    CapabilityDenied { detail: String },

    #[error("Engine creation failed: {0}")]
    EngineCreation(#[source] anyhow::Error),

    /// Compilation failed; `origin` is the file path or `<bytes>`
    #[error("Failed to load module from {origin}: {source}")]
    ModuleLoad {
        origin: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Instantiation failed: {0}")]
    Instantiation(#[source] anyhow::Error),

    #[error("Entry point not found: {0}")]
    EntryPointMissing(String),

    /// A granted directory could not be opened
    #[error("Failed to preopen directory '{}': {source}", .path.display())]
    PreopenFailed {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error("Invalid invocation transition: {from:?} -> {to:?}")]
    InvalidTransition { from: Phase, to: Phase },

    /// The host received a kind of output it cannot deliver
    #[error("Unexpected output for {host} host")]
    UnexpectedOutput { host: &'static str },

    /// The host could not hand a successful result to its caller
    #[error("Failed to deliver output to {host}: {source}")]
    DeliveryFailed {
        host: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("Sandbox task failed: {0}")]
    TaskJoin(String),
}

impl BridgeError {
    /// Create an input-unavailable error
    pub fn input_unavailable(reason: impl Into<String>, source: Option<std::io::Error>) -> Self {
        Self::InputUnavailable {
            reason: reason.into(),
            source,
        }
    }

    /// Check if the module itself failed (as opposed to setup)
    pub fn is_sandbox_failure(&self) -> bool {
        matches!(
            self,
            Self::SandboxTrap { .. } | Self::OutputMissing | Self::CapabilityDenied { .. }
        )
    }

    /// Check if the caller can fix this by changing its input or arguments
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            Self::InputUnavailable { .. }
                | Self::CapabilityDenied { .. }
                | Self::PreopenFailed { .. }
        )
    }
}
