//! Command-line host
//!
//! The arguments after the program name reach the module untouched. The
//! module reads and writes the real files named by `-i`/`-o`, or the
//! process's own stdin when `-i` is absent. What it prints to stdout is held
//! back and written out only once the run has succeeded.

use crate::bridge::{Bridge, Host};
use crate::error::BridgeError;
use crate::invocation::{Invocation, Output};
use std::io::{Stdout, Write};

/// Exit code for failures the user can fix (bad input, denied path)
pub const EXIT_USER_ERROR: u8 = 1;

/// Exit code for failures of the bridge itself
pub const EXIT_SYSTEM_ERROR: u8 = 101;

/// [`Host`] for one command line
#[derive(Debug)]
pub struct CliHost<W = Stdout> {
    args: Option<Vec<String>>,
    stdout: W,
}

impl CliHost {
    /// `args` excludes the program name
    pub fn new(args: Vec<String>) -> Self {
        Self::with_stdout(args, std::io::stdout())
    }
}

impl<W: Write> CliHost<W> {
    /// Deliver the module's stdout to `stdout` instead of the process's
    pub fn with_stdout(args: Vec<String>, stdout: W) -> Self {
        Self {
            args: Some(args),
            stdout,
        }
    }
}

impl<W: Write> Host for CliHost<W> {
    type Delivery = ();
    const NAME: &'static str = "cli";

    fn collect(&mut self) -> Result<Invocation, BridgeError> {
        let args = self
            .args
            .take()
            .ok_or_else(|| BridgeError::input_unavailable("command line already consumed", None))?;
        Ok(Invocation::from_args(args))
    }

    fn deliver(mut self, output: Output) -> Result<(), BridgeError> {
        let Output::Written(bytes) = output else {
            return Err(BridgeError::UnexpectedOutput { host: Self::NAME });
        };
        if bytes.is_empty() {
            return Ok(());
        }
        self.stdout
            .write_all(&bytes)
            .and_then(|_| self.stdout.flush())
            .map_err(|source| BridgeError::DeliveryFailed {
                host: Self::NAME,
                source,
            })
    }
}

/// Run `args` through `bridge` on the current thread
pub fn run(bridge: &Bridge, args: Vec<String>) -> Result<(), BridgeError> {
    bridge.execute(CliHost::new(args))
}

/// Process exit code for a failed invocation
///
/// A module that exited non-zero passes its own status through.
pub fn exit_code(error: &BridgeError) -> u8 {
    match error {
        BridgeError::SandboxTrap {
            exit_code: Some(code),
            ..
        } => u8::try_from(*code)
            .ok()
            .filter(|c| *c != 0)
            .unwrap_or(EXIT_SYSTEM_ERROR),
        e if e.is_user_error() => EXIT_USER_ERROR,
        _ => EXIT_SYSTEM_ERROR,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trap(exit_code: Option<i32>) -> BridgeError {
        BridgeError::SandboxTrap {
            exit_code,
            message: String::new(),
            stderr: String::new(),
        }
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(exit_code(&trap(Some(1))), 1);
        assert_eq!(exit_code(&trap(Some(3))), 3);
        assert_eq!(exit_code(&trap(Some(300))), EXIT_SYSTEM_ERROR);
        assert_eq!(exit_code(&trap(None)), EXIT_SYSTEM_ERROR);
        assert_eq!(
            exit_code(&BridgeError::CapabilityDenied { detail: String::new() }),
            EXIT_USER_ERROR
        );
        assert_eq!(exit_code(&BridgeError::OutputMissing), EXIT_SYSTEM_ERROR);
    }

    #[test]
    fn test_collect_forwards_args() {
        let args = vec!["-d".to_string(), "-i".to_string(), "a.gz".to_string()];
        let mut host = CliHost::new(args.clone());
        let invocation = host.collect().unwrap();
        assert_eq!(invocation.args(), args.as_slice());
        assert!(host.collect().is_err());
        assert!(host.deliver(Output::Written(Vec::new())).is_ok());
    }

    #[test]
    fn test_deliver_writes_captured_stdout() {
        let mut out = Vec::new();
        let host = CliHost::with_stdout(vec![], &mut out);
        host.deliver(Output::Written(b"decoded".to_vec())).unwrap();
        assert_eq!(out, b"decoded");

        let host = CliHost::with_stdout(vec![], Vec::new());
        assert!(matches!(
            host.deliver(Output::Bytes(vec![1])),
            Err(BridgeError::UnexpectedOutput { host: "cli" })
        ));
    }
}
