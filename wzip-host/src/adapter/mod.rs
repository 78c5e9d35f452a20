//! Host adapters
//!
//! - [`browser`]: drag-and-drop of a single file, result offered as a download
//! - [`server`]: HTTP `POST /`, body in, body out
//! - [`cli`]: command line forwarded to the module, real files
//!
//! Adapters decide the operation through a [`ModePolicy`].

pub mod browser;
pub mod cli;
pub mod server;

use std::fmt;
use std::str::FromStr;
use wzip_format::{infer_mode, Mode};

/// How an adapter chooses the operation for in-memory input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModePolicy {
    /// Always the same operation
    Fixed(Mode),

    /// Decompress gzip content, compress everything else
    Infer,

    /// Pass no mode flag; the module decides
    Passthrough,
}

impl ModePolicy {
    /// The mode to request for `bytes`
    pub fn resolve(self, bytes: &[u8]) -> Mode {
        match self {
            ModePolicy::Fixed(mode) => mode,
            ModePolicy::Infer => infer_mode(bytes),
            ModePolicy::Passthrough => Mode::Unspecified,
        }
    }
}

impl fmt::Display for ModePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModePolicy::Fixed(mode) => write!(f, "{}", mode),
            ModePolicy::Infer => f.write_str("infer"),
            ModePolicy::Passthrough => f.write_str("passthrough"),
        }
    }
}

impl FromStr for ModePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "infer" => Ok(ModePolicy::Infer),
            "passthrough" => Ok(ModePolicy::Passthrough),
            other => match other.parse::<Mode>()? {
                Mode::Unspecified => Ok(ModePolicy::Passthrough),
                mode => Ok(ModePolicy::Fixed(mode)),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        assert_eq!("compress".parse(), Ok(ModePolicy::Fixed(Mode::Compress)));
        assert_eq!("D".parse(), Ok(ModePolicy::Fixed(Mode::Decompress)));
        assert_eq!("infer".parse(), Ok(ModePolicy::Infer));
        assert_eq!("auto".parse(), Ok(ModePolicy::Passthrough));
        assert!("zip".parse::<ModePolicy>().is_err());
    }

    #[test]
    fn test_resolve() {
        let gz = [0x1F, 0x8B, 0x08, 0x00];
        assert_eq!(ModePolicy::Infer.resolve(&gz), Mode::Decompress);
        assert_eq!(ModePolicy::Infer.resolve(b"AB"), Mode::Compress);
        assert_eq!(ModePolicy::Fixed(Mode::Compress).resolve(&gz), Mode::Compress);
        assert_eq!(ModePolicy::Passthrough.resolve(&gz), Mode::Unspecified);
    }

    #[test]
    fn test_display_round_trips() {
        for policy in [
            ModePolicy::Fixed(Mode::Compress),
            ModePolicy::Fixed(Mode::Decompress),
            ModePolicy::Infer,
            ModePolicy::Passthrough,
        ] {
            assert_eq!(policy.to_string().parse(), Ok(policy));
        }
    }
}
