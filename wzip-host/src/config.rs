//! Bridge configuration
//!
//! [`BridgeConfig`] is what the library consumes. The binaries fill it from
//! command-line flags with environment fallbacks ([`RuntimeArgs`]).

use crate::mount::DEFAULT_STDOUT_CAPACITY;
use crate::tracing_support::{TracingConfig, TracingFormat};
use std::path::PathBuf;

/// `argv[0]` handed to the module
pub const DEFAULT_PROGRAM_NAME: &str = "wzip";

/// Where `cargo build -p wzip --target wasm32-wasip1 --release` puts the module
pub const DEFAULT_MODULE_PATH: &str = "target/wasm32-wasip1/release/wzip.wasm";

/// Configuration shared by every invocation of one bridge
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// Program name (argv[0])
    pub program_name: String,

    /// Fuel per invocation (CPU limit); `None` runs to completion
    pub fuel_limit: Option<u64>,

    /// Maximum WASM stack size in bytes
    pub max_wasm_stack: usize,

    /// Upper bound on virtual stdout
    pub stdout_capacity: usize,

    /// Upper bound on captured stderr
    pub stderr_capacity: usize,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            program_name: DEFAULT_PROGRAM_NAME.to_string(),
            fuel_limit: None,
            max_wasm_stack: 1024 * 1024, // 1MB
            stdout_capacity: DEFAULT_STDOUT_CAPACITY,
            stderr_capacity: 64 * 1024,
        }
    }
}

/// Runtime flags shared by `wzip-run` and `wzip-serve`
#[derive(Debug, Clone, clap::Args)]
pub struct RuntimeArgs {
    /// Compiled wzip module (.wasm)
    #[arg(long, env = "WZIP_MODULE", default_value = DEFAULT_MODULE_PATH)]
    pub module: PathBuf,

    /// Fuel per invocation; unlimited when unset
    #[arg(long, env = "WZIP_FUEL")]
    pub fuel: Option<u64>,

    /// Maximum bytes a module may write to the virtual stdout
    #[arg(long, env = "WZIP_MAX_OUTPUT", default_value_t = DEFAULT_STDOUT_CAPACITY)]
    pub max_output: usize,

    /// Log output format
    #[arg(long, env = "WZIP_LOG_FORMAT", value_enum, default_value_t = TracingFormat::Compact)]
    pub log_format: TracingFormat,

    /// Log level (error, warn, info, debug, trace); overrides RUST_LOG
    #[arg(long, env = "WZIP_LOG_LEVEL")]
    pub log_level: Option<tracing::Level>,
}

impl RuntimeArgs {
    pub fn bridge_config(&self) -> BridgeConfig {
        BridgeConfig {
            fuel_limit: self.fuel,
            stdout_capacity: self.max_output,
            ..Default::default()
        }
    }

    pub fn tracing_config(&self) -> TracingConfig {
        TracingConfig {
            level: self.log_level,
            format: self.log_format,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        runtime: RuntimeArgs,
    }

    #[test]
    fn test_default_config() {
        let config = BridgeConfig::default();
        assert_eq!(config.program_name, "wzip");
        assert!(config.fuel_limit.is_none());
        assert_eq!(config.stdout_capacity, DEFAULT_STDOUT_CAPACITY);
    }

    #[test]
    fn test_runtime_args_into_config() {
        let cli = TestCli::parse_from([
            "test",
            "--module",
            "/opt/wzip.wasm",
            "--fuel",
            "5000",
            "--max-output",
            "1024",
            "--log-format",
            "json",
            "--log-level",
            "debug",
        ]);
        assert_eq!(cli.runtime.module, PathBuf::from("/opt/wzip.wasm"));

        let config = cli.runtime.bridge_config();
        assert_eq!(config.fuel_limit, Some(5000));
        assert_eq!(config.stdout_capacity, 1024);

        let logging = cli.runtime.tracing_config();
        assert_eq!(logging.format, TracingFormat::Json);
        assert_eq!(logging.level, Some(tracing::Level::DEBUG));
    }

    #[test]
    fn test_log_level_defers_to_rust_log() {
        let cli = TestCli::parse_from(["test"]);
        assert!(cli.runtime.tracing_config().level.is_none());
        assert!(TestCli::try_parse_from(["test", "--log-level", "loud"]).is_err());
    }
}
