//! Sandbox invoker
//!
//! Runs the module once, to completion. Every call builds a fresh WASI
//! context, store, linker and instance; only the compiled module is reused.
//!
//! # Bindings
//!
//! | Binding | stdin | stdout | Filesystem |
//! |---------|-------|--------|------------|
//! | `Virtual` | [`StdioMount`] pipe | [`StdioMount`] pipe | none |
//! | `Host` | inherited from the process | [`StdioMount`] pipe | granted directories only |
//!
//! stdout is never inherited: a module that fails halfway must not have
//! streamed anything yet. The host delivers the captured bytes on success.
//!
//! stderr is always captured. Host runs forward it to the process stderr
//! afterwards; virtual runs log it.
//!
//! # Exit Status
//!
//! Returning from `_start` and `proc_exit(0)` are success. A non-zero exit,
//! a trap or exhausted fuel fails the invocation and invalidates any output.

use crate::error::BridgeError;
use crate::grant::CapabilityGrant;
use crate::module::SandboxModule;
use crate::mount::StdioMount;
use std::io::Write;
use wasmtime::{Linker, Store, Trap};
use wasmtime_wasi::pipe::MemoryOutputPipe;
use wasmtime_wasi::preview1::WasiP1Ctx;
use wasmtime_wasi::{I32Exit, WasiCtxBuilder};

/// What the runtime prints when a path lies outside every preopen
const DENIAL_MARKERS: &[&str] = &["pre-opened file descriptor", "Capabilities insufficient"];

/// How the sandbox sees the outside world for one run
#[derive(Debug)]
pub enum Binding<'a> {
    /// stdin/stdout live in memory
    Virtual(&'a mut StdioMount),

    /// Real stdin and the granted directories; stdout is held in `stdout`
    Host {
        grant: &'a CapabilityGrant,
        stdout: &'a mut StdioMount,
    },
}

/// How a successful run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitSignal {
    /// `_start` returned
    Returned,

    /// The module called `proc_exit` with this (zero) status
    Exited(i32),
}

/// State held by each store
pub struct SandboxState {
    wasi: WasiP1Ctx,
}

/// Executes a module against a binding
#[derive(Debug, Clone)]
pub struct SandboxInvoker {
    stderr_capacity: usize,
}

impl SandboxInvoker {
    pub fn new(stderr_capacity: usize) -> Self {
        Self { stderr_capacity }
    }

    /// Run `module` with `argv` (`argv[0]` is the program name)
    pub fn run(
        &self,
        module: &SandboxModule,
        argv: &[String],
        binding: Binding<'_>,
    ) -> Result<ExitSignal, BridgeError> {
        let mut builder = WasiCtxBuilder::new();
        builder.args(argv);

        let stderr = MemoryOutputPipe::new(self.stderr_capacity);
        builder.stderr(stderr.clone());

        let (mount, forward) = match binding {
            Binding::Virtual(mount) => {
                mount.attach(&mut builder)?;
                (mount, false)
            }
            Binding::Host { grant, stdout } => {
                builder.inherit_stdin();
                stdout.attach_stdout(&mut builder);
                grant.apply(&mut builder)?;
                (stdout, true)
            }
        };

        let state = SandboxState {
            wasi: builder.build_p1(),
        };
        let mut store = Store::new(module.engine(), state);
        if let Some(fuel) = module.fuel_limit() {
            store.set_fuel(fuel).map_err(BridgeError::Instantiation)?;
        }

        // wzip may import either WASI namespace depending on its toolchain
        let mut linker: Linker<SandboxState> = Linker::new(module.engine());
        wasmtime_wasi::preview1::add_to_linker_sync(&mut linker, |state| &mut state.wasi)
            .map_err(BridgeError::Instantiation)?;
        wasmtime_wasi::preview0::add_to_linker_sync(&mut linker, |state| &mut state.wasi)
            .map_err(BridgeError::Instantiation)?;

        let instance = linker
            .instantiate(&mut store, module.module())
            .map_err(BridgeError::Instantiation)?;

        let start = instance
            .get_typed_func::<(), ()>(&mut store, "_start")
            .map_err(|_| BridgeError::EntryPointMissing("_start".to_string()))?;

        tracing::debug!(argv = ?argv, "Starting module");
        let outcome = start.call(&mut store, ());

        let captured = String::from_utf8_lossy(&stderr.contents()).into_owned();
        if !captured.is_empty() {
            if forward {
                forward_stderr(captured.as_bytes());
            } else {
                tracing::debug!(stderr = %captured.trim_end(), "Module stderr");
            }
        }

        let signal = classify(outcome, captured)?;
        mount.mark_complete();
        tracing::debug!(?signal, "Module finished");
        Ok(signal)
    }
}

impl Default for SandboxInvoker {
    fn default() -> Self {
        Self::new(64 * 1024)
    }
}

fn forward_stderr(bytes: &[u8]) {
    let mut stderr = std::io::stderr().lock();
    if let Err(e) = stderr.write_all(bytes).and_then(|_| stderr.flush()) {
        tracing::warn!(error = %e, "Failed to forward module stderr");
    }
}

/// Turn the result of `_start` into an exit signal or a failure
fn classify(outcome: anyhow::Result<()>, stderr: String) -> Result<ExitSignal, BridgeError> {
    let error = match outcome {
        Ok(()) => return Ok(ExitSignal::Returned),
        Err(e) => e,
    };

    let exit_code = error.downcast_ref::<I32Exit>().map(|exit| exit.0);
    if exit_code == Some(0) {
        return Ok(ExitSignal::Exited(0));
    }

    if let Some(detail) = denial(&stderr) {
        return Err(BridgeError::CapabilityDenied { detail });
    }

    let message = match (exit_code, error.downcast_ref::<Trap>()) {
        (Some(code), _) => format!("exit status {}", code),
        (None, Some(Trap::OutOfFuel)) => "fuel exhausted".to_string(),
        (None, Some(trap)) => format!("trap: {}", trap),
        (None, None) => format!("{:#}", error),
    };

    Err(BridgeError::SandboxTrap {
        exit_code,
        message,
        stderr,
    })
}

/// The stderr line reporting a refused path, if any
fn denial(stderr: &str) -> Option<String> {
    stderr
        .lines()
        .find(|line| DENIAL_MARKERS.iter().any(|marker| line.contains(marker)))
        .map(|line| line.trim().to_string())
}
