//! The unit of work and its lifecycle
//!
//! ```text
//! Idle ──► AwaitingInput ──► Bridging ──► Complete
//!               │                │
//!               └────────────────┴──────► Failed
//! ```
//!
//! `Bridging` covers grant resolution, mount setup, the sandbox run and
//! output extraction. Hosts never observe anything in between.

use crate::error::BridgeError;
use crate::grant::requested_mode;
use wzip_format::Mode;

/// Where an invocation is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    AwaitingInput,
    Bridging,
    Complete,
    Failed,
}

impl Phase {
    /// Whether the invocation can no longer change
    pub fn is_terminal(self) -> bool {
        matches!(self, Phase::Complete | Phase::Failed)
    }

    fn can_advance_to(self, next: Phase) -> bool {
        matches!(
            (self, next),
            (Phase::Idle, Phase::AwaitingInput)
                | (Phase::AwaitingInput, Phase::Bridging)
                | (Phase::AwaitingInput, Phase::Failed)
                | (Phase::Bridging, Phase::Complete)
                | (Phase::Bridging, Phase::Failed)
        )
    }
}

/// Tracks one invocation's phase and rejects out-of-order transitions
#[derive(Debug)]
pub struct Lifecycle {
    phase: Phase,
}

impl Lifecycle {
    pub fn new() -> Self {
        Self { phase: Phase::Idle }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Move to `next`, failing if the transition is not allowed
    pub fn advance(&mut self, next: Phase) -> Result<(), BridgeError> {
        if !self.phase.can_advance_to(next) {
            return Err(BridgeError::InvalidTransition {
                from: self.phase,
                to: next,
            });
        }
        tracing::trace!(from = ?self.phase, to = ?next, "Invocation transition");
        self.phase = next;
        Ok(())
    }

    /// Mark the invocation failed; terminal phases are left alone
    pub fn fail(&mut self, error: &BridgeError) {
        if self.phase.is_terminal() {
            return;
        }
        tracing::warn!(from = ?self.phase, error = %error, "Invocation failed");
        self.phase = Phase::Failed;
    }
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}

/// Where the module reads its input from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    /// Bytes delivered through the virtual stdin
    Stdin(Vec<u8>),

    /// Real files named by `-i`/`-o` (or the host's own stdio)
    HostPaths,
}

/// One request, drop or command-line run
#[derive(Debug, Clone)]
pub struct Invocation {
    mode: Mode,
    args: Vec<String>,
    source: Source,
}

impl Invocation {
    /// An invocation over in-memory bytes; the mode becomes the only argument
    pub fn from_bytes(mode: Mode, bytes: Vec<u8>) -> Self {
        Self {
            mode,
            args: mode.flag().map(str::to_string).into_iter().collect(),
            source: Source::Stdin(bytes),
        }
    }

    /// An invocation forwarding `args` verbatim, with real paths
    pub fn from_args(args: Vec<String>) -> Self {
        let mode = requested_mode(&args);
        Self {
            mode,
            args,
            source: Source::HostPaths,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Arguments after the program name
    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn source(&self) -> &Source {
        &self.source
    }

    /// Full argument vector with `program` as `argv[0]`
    pub fn argv(&self, program: &str) -> Vec<String> {
        std::iter::once(program.to_string())
            .chain(self.args.iter().cloned())
            .collect()
    }

    pub(crate) fn into_parts(self) -> (Vec<String>, Source) {
        (self.args, self.source)
    }
}

/// What the bridge hands back to a host
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Output {
    /// Contents of the virtual stdout
    Bytes(Vec<u8>),

    /// The module worked on real paths; holds what it printed to stdout
    Written(Vec<u8>),
}
