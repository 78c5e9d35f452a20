//! wzip command-line entry point
//!
//! Runs unchanged as a native binary or as a `wasm32-wasip1` module. Inside a
//! sandbox, `-i`/`-o` paths must live in a preopened directory.

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use wzip::{Mode, Options};

/// gzip implemented in Rust, able to be utilized in various environments
///
/// If neither -d nor -c is set, wzip inspects the input: gzip data is
/// decompressed, anything else is compressed.
#[derive(Parser, Debug)]
#[command(name = "wzip", version)]
struct Cli {
    /// Decompress
    #[arg(short, long, conflicts_with = "compress")]
    decompress: bool,

    /// Compress
    #[arg(short, long)]
    compress: bool,

    /// Input file. Default stdin.
    #[arg(short, long, value_name = "FILE")]
    input: Option<PathBuf>,

    /// Output file. Default stdout.
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,
}

impl Cli {
    fn mode(&self) -> Mode {
        if self.decompress {
            Mode::Decompress
        } else if self.compress {
            Mode::Compress
        } else {
            Mode::Unspecified
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let options = Options {
        mode: cli.mode(),
        input: cli.input,
        output: cli.output,
        ..Default::default()
    };

    match wzip::run(&options) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("wzip: {}", e);
            ExitCode::FAILURE
        }
    }
}
