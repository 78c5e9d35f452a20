//! Run wzip in the sandbox against real files
//!
//! # Usage
//!
//! ```bash
//! wzip-run -- -c -i notes.txt -o notes.txt.gz
//! wzip-run -- -d < notes.txt.gz > notes.txt
//! ```

use clap::Parser;
use std::process::ExitCode;
use wzip_host::adapter::cli;
use wzip_host::tracing_support::init_subscriber;
use wzip_host::{Bridge, RuntimeArgs, SandboxModule};

#[derive(Parser, Debug)]
#[command(name = "wzip-run")]
#[command(about = "Run the wzip module with access to the files it names")]
#[command(version)]
struct Args {
    #[command(flatten)]
    runtime: RuntimeArgs,

    /// Arguments for wzip (-c, -d, -i FILE, -o FILE)
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    args: Vec<String>,
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_subscriber(args.runtime.tracing_config());

    let config = args.runtime.bridge_config();
    let module = match SandboxModule::from_file(&args.runtime.module, &config) {
        Ok(module) => module,
        Err(e) => {
            eprintln!("wzip-run: {}", e);
            return ExitCode::from(cli::EXIT_SYSTEM_ERROR);
        }
    };

    let bridge = Bridge::new(module, &config);
    match cli::run(&bridge, args.args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            // The module already printed its own diagnostics
            if !e.is_sandbox_failure() {
                eprintln!("wzip-run: {}", e);
            }
            ExitCode::from(cli::exit_code(&e))
        }
    }
}
