//! The execution bridge
//!
//! A [`Host`] turns its native input into an [`Invocation`] and the bridge's
//! [`Output`] back into its native result. [`Bridge`] drives one invocation
//! through its lifecycle:
//!
//! ```text
//! host.collect()                                    AwaitingInput
//!   ├─ Source::Stdin     → StdioMount → invoker     Bridging
//!   └─ Source::HostPaths → CapabilityGrant → invoker
//! host.deliver(output)                              Complete | Failed
//! ```
//!
//! A failed run delivers nothing. For real paths that also means removing
//! any `-o` file the module created before it failed; files that existed
//! beforehand are left alone.

use crate::config::BridgeConfig;
use crate::error::BridgeError;
use crate::grant::{path_arguments, CapabilityGrant, PathRole};
use crate::invocation::{Invocation, Lifecycle, Output, Phase, Source};
use crate::invoker::{Binding, SandboxInvoker};
use crate::module::SandboxModule;
use crate::mount::StdioMount;
use std::path::PathBuf;

/// One host environment
pub trait Host {
    /// What the host hands back to its caller
    type Delivery;

    /// Name used in logs and errors
    const NAME: &'static str;

    /// Produce the invocation from host input
    fn collect(&mut self) -> Result<Invocation, BridgeError>;

    /// Convert bridge output into the host's result
    fn deliver(self, output: Output) -> Result<Self::Delivery, BridgeError>;
}

/// Runs invocations against a compiled module
#[derive(Debug, Clone)]
pub struct Bridge {
    module: SandboxModule,
    invoker: SandboxInvoker,
    program: String,
    stdout_capacity: usize,
}

impl Bridge {
    pub fn new(module: SandboxModule, config: &BridgeConfig) -> Self {
        Self {
            module,
            invoker: SandboxInvoker::new(config.stderr_capacity),
            program: config.program_name.clone(),
            stdout_capacity: config.stdout_capacity,
        }
    }

    /// Run one invocation for `host` on the current thread
    pub fn execute<H: Host>(&self, mut host: H) -> Result<H::Delivery, BridgeError> {
        let span = tracing::info_span!("invocation", host = H::NAME);
        let _enter = span.enter();

        let mut lifecycle = Lifecycle::new();
        lifecycle.advance(Phase::AwaitingInput)?;

        let invocation = match host.collect() {
            Ok(invocation) => invocation,
            Err(e) => {
                lifecycle.fail(&e);
                return Err(e);
            }
        };

        lifecycle.advance(Phase::Bridging)?;
        match self.bridge(invocation).and_then(|output| host.deliver(output)) {
            Ok(delivery) => {
                lifecycle.advance(Phase::Complete)?;
                tracing::debug!("Invocation complete");
                Ok(delivery)
            }
            Err(e) => {
                lifecycle.fail(&e);
                Err(e)
            }
        }
    }

    /// Run one invocation on the blocking pool
    pub async fn dispatch<H>(&self, host: H) -> Result<H::Delivery, BridgeError>
    where
        H: Host + Send + 'static,
        H::Delivery: Send + 'static,
    {
        let bridge = self.clone();
        tokio::task::spawn_blocking(move || bridge.execute(host))
            .await
            .map_err(|e| BridgeError::TaskJoin(e.to_string()))?
    }

    fn bridge(&self, invocation: Invocation) -> Result<Output, BridgeError> {
        let argv = invocation.argv(&self.program);
        tracing::debug!(mode = %invocation.mode(), args = ?invocation.args(), "Bridging invocation");

        let (args, source) = invocation.into_parts();
        match source {
            Source::Stdin(bytes) => {
                let mut mount = StdioMount::new(self.stdout_capacity);
                mount.write_input(bytes);
                let result = self
                    .invoker
                    .run(&self.module, &argv, Binding::Virtual(&mut mount));
                mount.release();
                result?;
                mount.read_output().map(Output::Bytes)
            }
            Source::HostPaths => {
                let grant = CapabilityGrant::resolve(&args);
                tracing::debug!(grant = %grant.summary(), "Resolved capability grant");

                let fresh = absent_outputs(&args);
                let mut stdout = StdioMount::new(self.stdout_capacity);
                let result = self.invoker.run(
                    &self.module,
                    &argv,
                    Binding::Host {
                        grant: &grant,
                        stdout: &mut stdout,
                    },
                );
                if result.is_err() {
                    discard_outputs(&fresh);
                }
                result?;
                stdout.read_output().map(Output::Written)
            }
        }
    }
}

/// `-o` targets that do not exist yet
fn absent_outputs(args: &[String]) -> Vec<PathBuf> {
    path_arguments(args)
        .into_iter()
        .filter(|(role, _)| *role == PathRole::Output)
        .map(|(_, path)| PathBuf::from(path))
        .filter(|path| path.symlink_metadata().is_err())
        .collect()
}

/// Remove whatever a failed run left at `paths`
fn discard_outputs(paths: &[PathBuf]) {
    for path in paths.iter().map(PathBuf::as_path).filter(|p| p.exists()) {
        match std::fs::remove_file(path) {
            Ok(()) => tracing::debug!(path = %path.display(), "Removed partial output"),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Failed to remove partial output")
            }
        }
    }
}
