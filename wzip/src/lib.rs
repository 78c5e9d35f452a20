//! wzip: gzip over stdin/stdout
//!
//! The library half of the `wzip` tool. It is small on purpose: hosts run the
//! binary inside a WASI sandbox and only ever talk to it through argv, stdin,
//! stdout and (optionally) files inside preopened directories.

use flate2::read::{GzDecoder, GzEncoder};
use flate2::Compression;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Read, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub use wzip_format::Mode;

/// Errors reported by the tool
#[derive(Debug, Error)]
pub enum WzipError {
    #[error("cannot open input '{}': {source}", .path.display())]
    OpenInput {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot create output '{}': {source}", .path.display())]
    CreateOutput {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("compression failed: {0}")]
    Compress(#[source] io::Error),

    #[error("decompression failed: {0}")]
    Decompress(#[source] io::Error),

    #[error("cannot inspect input: {0}")]
    Inspect(#[source] io::Error),
}

/// What a single run should do
#[derive(Debug, Clone)]
pub struct Options {
    /// Direction; `Unspecified` inspects the input's magic bytes
    pub mode: Mode,

    /// Input file, stdin when absent
    pub input: Option<PathBuf>,

    /// Output file, stdout when absent
    pub output: Option<PathBuf>,

    /// Compression level
    pub level: Compression,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            mode: Mode::Unspecified,
            input: None,
            output: None,
            level: Compression::default(),
        }
    }
}

/// Run one invocation, returning the number of bytes written
///
/// A failed run removes the output file it created, so callers never see a
/// truncated result.
pub fn run(options: &Options) -> Result<u64, WzipError> {
    let input: Box<dyn Read> = match &options.input {
        Some(path) => Box::new(File::open(path).map_err(|source| WzipError::OpenInput {
            path: path.clone(),
            source,
        })?),
        None => Box::new(io::stdin().lock()),
    };

    match &options.output {
        Some(path) => {
            let file = File::create(path).map_err(|source| WzipError::CreateOutput {
                path: path.clone(),
                source,
            })?;
            let result = transcode(options.mode, BufReader::new(input), file, options.level);
            if result.is_err() {
                discard(path);
            }
            result
        }
        None => transcode(
            options.mode,
            BufReader::new(input),
            io::stdout().lock(),
            options.level,
        ),
    }
}

/// Encode or decode `input` into `output` according to `mode`
pub fn transcode<R: BufRead, W: Write>(
    mode: Mode,
    mut input: R,
    output: W,
    level: Compression,
) -> Result<u64, WzipError> {
    let mode = match mode {
        Mode::Unspecified => wzip_format::infer_mode(input.fill_buf().map_err(WzipError::Inspect)?),
        explicit => explicit,
    };

    match mode {
        Mode::Decompress => decompress(input, output).map_err(WzipError::Decompress),
        _ => compress(input, output, level).map_err(WzipError::Compress),
    }
}

/// Gzip-encode everything from `input` into `output`
pub fn compress<R: Read, W: Write>(input: R, mut output: W, level: Compression) -> io::Result<u64> {
    let mut encoder = GzEncoder::new(input, level);
    let written = io::copy(&mut encoder, &mut output)?;
    output.flush()?;
    Ok(written)
}

/// Decode a gzip stream from `input` into `output`
pub fn decompress<R: Read, W: Write>(input: R, mut output: W) -> io::Result<u64> {
    let mut decoder = GzDecoder::new(input);
    let written = io::copy(&mut decoder, &mut output)?;
    output.flush()?;
    Ok(written)
}

fn discard(path: &Path) {
    // the transcode error is reported instead of this one
    let _ = std::fs::remove_file(path);
}
