//! Virtual stdin/stdout for hosts that do not deal in real paths
//!
//! A [`StdioMount`] holds at most two entries: the input waiting to be read
//! as stdin, and the stdout the module writes. It belongs to exactly one
//! invocation.
//!
//! ```text
//! write_input(bytes)     stdin  = bytes
//! attach(builder)        stdin  → MemoryInputPipe   (entry removed)
//!                        stdout ← MemoryOutputPipe
//! <module runs>
//! mark_complete()
//! read_output()          stdout contents
//! release() / drop       stdin  = none
//! ```
//!
//! Command-line runs keep the process stdin and only capture stdout through
//! [`StdioMount::attach_stdout`], so nothing reaches the terminal until the
//! module has succeeded.

use crate::error::BridgeError;
use wasmtime_wasi::pipe::{MemoryInputPipe, MemoryOutputPipe};
use wasmtime_wasi::WasiCtxBuilder;

/// Default upper bound on what a module may write to the virtual stdout
pub const DEFAULT_STDOUT_CAPACITY: usize = 64 * 1024 * 1024;

/// Ephemeral stdin/stdout pair for a single invocation
pub struct StdioMount {
    stdin: Option<Vec<u8>>,
    stdout: Option<MemoryOutputPipe>,
    completed: bool,
    capacity: usize,
}

impl StdioMount {
    /// Create an empty mount whose stdout accepts at most `capacity` bytes
    pub fn new(capacity: usize) -> Self {
        Self {
            stdin: None,
            stdout: None,
            completed: false,
            capacity,
        }
    }

    /// Store `bytes` as the virtual stdin, replacing anything already there
    pub fn write_input(&mut self, bytes: impl Into<Vec<u8>>) {
        let bytes = bytes.into();
        if self.stdin.is_some() {
            tracing::debug!("Replacing pending virtual stdin");
        }
        tracing::trace!(len = bytes.len(), "Virtual stdin written");
        self.stdin = Some(bytes);
    }

    /// Whether input is waiting to be consumed
    pub fn has_input(&self) -> bool {
        self.stdin.is_some()
    }

    /// Contents of the virtual stdout
    ///
    /// # Errors
    ///
    /// [`BridgeError::OutputMissing`] until a module has run to completion
    /// against this mount.
    pub fn read_output(&self) -> Result<Vec<u8>, BridgeError> {
        match (&self.stdout, self.completed) {
            (Some(pipe), true) => Ok(pipe.contents().to_vec()),
            _ => Err(BridgeError::OutputMissing),
        }
    }

    /// Drop any unconsumed stdin. Safe to call more than once.
    pub fn release(&mut self) {
        if self.stdin.take().is_some() {
            tracing::trace!("Released unconsumed virtual stdin");
        }
    }

    /// Wire the mount into a WASI context, consuming the pending stdin
    pub(crate) fn attach(&mut self, builder: &mut WasiCtxBuilder) -> Result<(), BridgeError> {
        let input = self.stdin.take().ok_or_else(|| {
            BridgeError::input_unavailable("virtual stdin was not written before start", None)
        })?;

        builder.stdin(MemoryInputPipe::new(input));
        self.attach_stdout(builder);
        Ok(())
    }

    /// Capture stdout only; stdin is left to the caller
    pub(crate) fn attach_stdout(&mut self, builder: &mut WasiCtxBuilder) {
        let stdout = MemoryOutputPipe::new(self.capacity);
        builder.stdout(stdout.clone());

        self.stdout = Some(stdout);
        self.completed = false;
    }

    /// Record that the module attached to this mount terminated successfully
    pub(crate) fn mark_complete(&mut self) {
        self.completed = self.stdout.is_some();
    }
}

impl std::fmt::Debug for StdioMount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StdioMount")
            .field("stdin_len", &self.stdin.as_ref().map(Vec::len))
            .field("stdout_attached", &self.stdout.is_some())
            .field("completed", &self.completed)
            .field("capacity", &self.capacity)
            .finish()
    }
}

impl Default for StdioMount {
    fn default() -> Self {
        Self::new(DEFAULT_STDOUT_CAPACITY)
    }
}

impl Drop for StdioMount {
    fn drop(&mut self) {
        self.release();
    }
}
