//! wzip-format: format inference shared by the wzip guest and its hosts
//!
//! This crate decides, from magic bytes and file names, which direction an
//! operation goes and what the default output should be called. It has no
//! dependencies so the guest can link it when compiled for `wasm32-wasip1`.
//!
//! The magic number is only ever used for naming and mode inference. The
//! codec itself validates the stream.

use std::fmt;
use std::str::FromStr;

/// First three bytes of a gzip member (ID1, ID2, CM = deflate)
pub const GZIP_MAGIC: [u8; 3] = [0x1F, 0x8B, 0x08];

/// Conventional suffix of gzip files
pub const GZIP_SUFFIX: &str = ".gz";

/// Direction of a wzip operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Mode {
    /// Encode the input as gzip (`-c`)
    Compress,

    /// Decode a gzip input (`-d`)
    Decompress,

    /// Let the tool decide from the input's magic bytes
    #[default]
    Unspecified,
}

impl Mode {
    /// Command-line flag selecting this mode, if any
    pub fn flag(self) -> Option<&'static str> {
        match self {
            Mode::Compress => Some("-c"),
            Mode::Decompress => Some("-d"),
            Mode::Unspecified => None,
        }
    }

    /// Parse a single mode flag (`-c`, `--compress`, `-d`, `--decompress`)
    pub fn from_flag(flag: &str) -> Option<Self> {
        match flag {
            "-c" | "--compress" => Some(Mode::Compress),
            "-d" | "--decompress" => Some(Mode::Decompress),
            _ => None,
        }
    }

    /// Resolve `Unspecified` against the payload; explicit modes are kept
    pub fn resolve(self, bytes: &[u8]) -> Self {
        match self {
            Mode::Unspecified => infer_mode(bytes),
            explicit => explicit,
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Mode::Compress => "compress",
            Mode::Decompress => "decompress",
            Mode::Unspecified => "unspecified",
        };
        f.write_str(name)
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "compress" | "c" => Ok(Mode::Compress),
            "decompress" | "d" => Ok(Mode::Decompress),
            "unspecified" | "auto" => Ok(Mode::Unspecified),
            other => Err(format!("unknown mode '{}'", other)),
        }
    }
}

/// Whether the payload starts with the gzip magic number
pub fn is_compressed(bytes: &[u8]) -> bool {
    bytes.starts_with(&GZIP_MAGIC)
}

/// Infer the operation from content: gzip input is decompressed,
/// anything else is compressed
pub fn infer_mode(bytes: &[u8]) -> Mode {
    if is_compressed(bytes) {
        Mode::Decompress
    } else {
        Mode::Compress
    }
}

/// Default output name for `input_name` under `mode`
///
/// ```text
/// Compress     report.txt     → report.txt.gz
/// Decompress   report.txt.gz  → report.txt
/// Decompress   report         → report        (unchanged, may collide)
/// ```
pub fn output_name(mode: Mode, input_name: &str) -> String {
    match mode {
        Mode::Compress => format!("{}{}", input_name, GZIP_SUFFIX),
        Mode::Decompress => {
            if input_name.len() > GZIP_SUFFIX.len() {
                if let Some(stem) = input_name.strip_suffix(GZIP_SUFFIX) {
                    return stem.to_string();
                }
            }
            input_name.to_string()
        }
        Mode::Unspecified => input_name.to_string(),
    }
}

/// Decide the output name from the input's name and content
///
/// Gzip content never gets the suffix appended. When gzip content arrives
/// under a name without the suffix the name is returned unchanged; callers
/// should check [`name_collides`] before writing next to the input.
pub fn decide_output_name(input_name: &str, input_bytes: &[u8]) -> String {
    output_name(infer_mode(input_bytes), input_name)
}

/// Whether writing `output_name` would overwrite `input_name`
pub fn name_collides(input_name: &str, output_name: &str) -> bool {
    input_name == output_name
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_input_gets_suffix() {
        assert_eq!(decide_output_name("report.txt", b"AB"), "report.txt.gz");
        assert_eq!(decide_output_name("report.txt", &[]), "report.txt.gz");
        // two of three magic bytes are not enough
        assert_eq!(decide_output_name("x", &[0x1F, 0x8B]), "x.gz");
        assert_eq!(decide_output_name("x", &[0x1F, 0x8B, 0x09]), "x.gz");
    }

    #[test]
    fn test_compressed_input_strips_suffix() {
        let bytes = [0x1F, 0x8B, 0x08, 0x00, 0x00];
        assert_eq!(decide_output_name("report.txt.gz", &bytes), "report.txt");
        assert_eq!(decide_output_name("a.gz.gz", &bytes), "a.gz");
    }

    #[test]
    fn test_compressed_input_without_suffix_is_unchanged() {
        let bytes = [0x1F, 0x8B, 0x08];
        let name = decide_output_name("archive", &bytes);
        assert_eq!(name, "archive");
        assert!(name_collides("archive", &name));

        // a bare ".gz" has no stem to keep
        assert_eq!(decide_output_name(".gz", &bytes), ".gz");
    }

    #[test]
    fn test_compressed_input_never_appends_suffix() {
        let names = ["a", "a.gz", "a.tar", ".gz", "", "gz", "x.GZ"];
        for name in names {
            let out = decide_output_name(name, &GZIP_MAGIC);
            assert!(out.len() <= name.len(), "{} -> {}", name, out);
        }
    }

    #[test]
    fn test_mode_flags() {
        assert_eq!(Mode::Compress.flag(), Some("-c"));
        assert_eq!(Mode::Decompress.flag(), Some("-d"));
        assert_eq!(Mode::Unspecified.flag(), None);
        assert_eq!(Mode::from_flag("--decompress"), Some(Mode::Decompress));
        assert_eq!(Mode::from_flag("-i"), None);
    }

    #[test]
    fn test_mode_resolve_and_parse() {
        assert_eq!(Mode::Unspecified.resolve(&GZIP_MAGIC), Mode::Decompress);
        assert_eq!(Mode::Unspecified.resolve(b"plain"), Mode::Compress);
        assert_eq!(Mode::Compress.resolve(&GZIP_MAGIC), Mode::Compress);
        assert_eq!("Compress".parse::<Mode>(), Ok(Mode::Compress));
        assert!("zip".parse::<Mode>().is_err());
    }
}
