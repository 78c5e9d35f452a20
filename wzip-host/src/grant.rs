//! Capability resolution for real-path invocations
//!
//! The module gets no ambient filesystem access. When the command line names
//! files with `-i`/`-o`, the directory containing each one is preopened, and
//! nothing else is.
//!
//! # Path Mapping
//!
//! A grant maps a guest-visible directory to a host directory. Both sides are
//! the same string, so the paths in argv resolve unchanged inside the sandbox:
//!
//! ```text
//! argv:     -c -i /tmp/a.txt -o /tmp/a.txt.gz
//! grant:    { "/tmp" → "/tmp" }
//!
//! argv:     -i data/in.txt -o out.gz
//! grant:    { "." → ".", "data" → "data" }
//! ```
//!
//! Directories rather than files are granted so the module can create the
//! output file.

use crate::error::BridgeError;
use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};
use wasmtime_wasi::{DirPerms, FilePerms, WasiCtxBuilder};
use wzip_format::Mode;

/// Which path option an argument belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathRole {
    Input,
    Output,
}

impl PathRole {
    fn from_short(c: char) -> Option<Self> {
        match c {
            'i' => Some(PathRole::Input),
            'o' => Some(PathRole::Output),
            _ => None,
        }
    }

    fn from_long(name: &str) -> Option<Self> {
        match name {
            "input" => Some(PathRole::Input),
            "output" => Some(PathRole::Output),
            _ => None,
        }
    }
}

/// Directories the sandbox may see, keyed by guest path
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapabilityGrant {
    dirs: BTreeMap<String, PathBuf>,
}

impl CapabilityGrant {
    /// A grant with no directories; content flows through stdio only
    pub fn empty() -> Self {
        Self::default()
    }

    /// Compute the minimal grant for an argument vector (without `argv[0]`)
    pub fn resolve(args: &[String]) -> Self {
        let mut grant = Self::empty();
        for (_, path) in path_arguments(args) {
            let dir = containing_dir(path);
            grant.insert(dir.clone(), PathBuf::from(dir));
        }
        grant
    }

    /// Grant `host_path` under `guest_path`, replacing any previous mapping
    pub fn insert(&mut self, guest_path: impl Into<String>, host_path: impl Into<PathBuf>) {
        self.dirs.insert(guest_path.into(), host_path.into());
    }

    pub fn is_empty(&self) -> bool {
        self.dirs.is_empty()
    }

    pub fn len(&self) -> usize {
        self.dirs.len()
    }

    pub fn contains(&self, guest_path: &str) -> bool {
        self.dirs.contains_key(guest_path)
    }

    /// Iterate `(guest path, host path)` pairs in guest-path order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Path)> {
        self.dirs.iter().map(|(g, h)| (g.as_str(), h.as_path()))
    }

    /// Preopen every granted directory read/write
    pub(crate) fn apply(&self, builder: &mut WasiCtxBuilder) -> Result<(), BridgeError> {
        for (guest_path, host_path) in self.iter() {
            builder
                .preopened_dir(host_path, guest_path, DirPerms::all(), FilePerms::all())
                .map_err(|source| BridgeError::PreopenFailed {
                    path: host_path.to_path_buf(),
                    source,
                })?;
        }
        Ok(())
    }

    /// Summary for logging
    pub fn summary(&self) -> String {
        if self.dirs.is_empty() {
            return "none".to_string();
        }
        let dirs: Vec<_> = self
            .dirs
            .iter()
            .map(|(g, h)| {
                if Path::new(g) == h.as_path() {
                    g.clone()
                } else {
                    format!("{}={}", g, h.display())
                }
            })
            .collect();
        format!("fs: [{}]", dirs.join(", "))
    }
}

/// An option of the module's command line that the host cares about
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionArg<'a> {
    /// `-c`/`--compress` or `-d`/`--decompress`
    Mode(Mode),

    /// `-i`/`-o` and its value
    Path(PathRole, &'a str),
}

/// Scan `args` the way the module's own parser reads them
///
/// Accepts `-i X`, `-iX`, `--input X`, `--input=X`, and short clusters such
/// as `-dc` or `-ci X`. In a cluster, `i` or `o` takes the rest of the
/// cluster (or the next argument) as its value. Scanning stops at `--`. A
/// trailing option without a value is ignored.
pub fn scan_options(args: &[String]) -> Vec<OptionArg<'_>> {
    let mut found = Vec::new();
    let mut iter = args.iter();

    while let Some(arg) = iter.next() {
        if arg == "--" {
            break;
        }

        if let Some(long) = arg.strip_prefix("--") {
            let (name, inline) = match long.split_once('=') {
                Some((name, value)) => (name, Some(value)),
                None => (long, None),
            };
            if let Some(role) = PathRole::from_long(name) {
                if let Some(value) = inline.or_else(|| iter.next().map(String::as_str)) {
                    found.push(OptionArg::Path(role, value));
                }
            } else if let Some(mode) = Mode::from_flag(arg) {
                found.push(OptionArg::Mode(mode));
            }
            continue;
        }

        let Some(cluster) = arg.strip_prefix('-') else {
            continue;
        };
        for (idx, c) in cluster.char_indices() {
            match c {
                'c' => found.push(OptionArg::Mode(Mode::Compress)),
                'd' => found.push(OptionArg::Mode(Mode::Decompress)),
                _ => {
                    let Some(role) = PathRole::from_short(c) else {
                        continue;
                    };
                    let rest = &cluster[idx + c.len_utf8()..];
                    let value = if rest.is_empty() {
                        iter.next().map(String::as_str)
                    } else {
                        Some(rest)
                    };
                    if let Some(value) = value {
                        found.push(OptionArg::Path(role, value));
                    }
                    break;
                }
            }
        }
    }

    found
}

/// Values of every `-i`/`-o` option in `args`
pub fn path_arguments(args: &[String]) -> Vec<(PathRole, &str)> {
    scan_options(args)
        .into_iter()
        .filter_map(|option| match option {
            OptionArg::Path(role, value) => Some((role, value)),
            OptionArg::Mode(_) => None,
        })
        .collect()
}

/// The mode `args` ask for; the last flag wins
pub fn requested_mode(args: &[String]) -> Mode {
    scan_options(args)
        .into_iter()
        .filter_map(|option| match option {
            OptionArg::Mode(mode) => Some(mode),
            OptionArg::Path(..) => None,
        })
        .last()
        .unwrap_or_default()
}

/// Directory containing `path`, lexically normalized
///
/// ```text
/// /tmp/a.txt       → /tmp
/// /tmp/x/../a.txt  → /tmp
/// a.txt            → .
/// ./data/in.txt    → data
/// ```
pub fn containing_dir(path: &str) -> String {
    let parent = Path::new(path).parent().unwrap_or_else(|| Path::new(path));
    let normalized = normalize_path(parent);
    if normalized.as_os_str().is_empty() {
        ".".to_string()
    } else {
        normalized.to_string_lossy().into_owned()
    }
}

/// Remove `.` and resolve `..` against preceding normal components, without
/// touching the filesystem
fn normalize_path(path: &Path) -> PathBuf {
    let mut components = Vec::new();

    for component in path.components() {
        match component {
            Component::ParentDir => {
                if matches!(components.last(), Some(Component::Normal(_))) {
                    components.pop();
                } else {
                    components.push(component);
                }
            }
            Component::CurDir => {}
            _ => components.push(component),
        }
    }

    components.iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_input_and_output_in_same_dir_collapse() {
        let grant = CapabilityGrant::resolve(&args(&["-c", "-i", "/tmp/a.txt", "-o", "/tmp/a.txt.gz"]));
        assert_eq!(grant.len(), 1);
        assert!(grant.contains("/tmp"));
        assert_eq!(grant.iter().next(), Some(("/tmp", Path::new("/tmp"))));
    }

    #[test]
    fn test_no_path_options_yields_empty_grant() {
        assert!(CapabilityGrant::resolve(&args(&[])).is_empty());
        assert!(CapabilityGrant::resolve(&args(&["-c"])).is_empty());
        assert!(CapabilityGrant::resolve(&args(&["-d", "/etc/passwd"])).is_empty());
        assert_eq!(CapabilityGrant::empty().summary(), "none");
    }

    #[test]
    fn test_distinct_dirs() {
        let grant = CapabilityGrant::resolve(&args(&["--input", "/data/in.txt", "--output=/out/x.gz"]));
        let dirs: Vec<_> = grant.iter().map(|(g, _)| g).collect();
        assert_eq!(dirs, ["/data", "/out"]);
        assert_eq!(grant.summary(), "fs: [/data, /out]");
    }

    #[test]
    fn test_argument_forms() {
        let list = args(&["-ci", "/a/in", "-o/b/out", "--", "-i", "/c/ignored"]);
        assert_eq!(
            path_arguments(&list),
            [(PathRole::Input, "/a/in"), (PathRole::Output, "/b/out")]
        );

        // a dangling option grants nothing
        assert!(path_arguments(&args(&["-c", "-i"])).is_empty());
    }

    #[test]
    fn test_mode_in_clusters() {
        assert_eq!(requested_mode(&args(&["-dc"])), Mode::Compress);
        assert_eq!(requested_mode(&args(&["-cd"])), Mode::Decompress);
        assert_eq!(requested_mode(&args(&["-ci", "in.txt"])), Mode::Compress);
        assert_eq!(requested_mode(&args(&["--decompress", "-o", "a"])), Mode::Decompress);
        assert_eq!(requested_mode(&args(&["-i", "x"])), Mode::Unspecified);
    }

    #[test]
    fn test_option_values_are_not_flags() {
        // `-d` is the value of `-i`, and `c` in `-odc` is part of the path
        assert_eq!(requested_mode(&args(&["-i", "-d"])), Mode::Unspecified);
        assert_eq!(requested_mode(&args(&["-d", "-odc"])), Mode::Decompress);
        assert_eq!(requested_mode(&args(&["-c", "--", "-d"])), Mode::Compress);
        assert_eq!(
            scan_options(&args(&["-ci", "in.txt"])),
            [
                OptionArg::Mode(Mode::Compress),
                OptionArg::Path(PathRole::Input, "in.txt")
            ]
        );
    }

    #[test]
    fn test_containing_dir() {
        assert_eq!(containing_dir("/tmp/a.txt"), "/tmp");
        assert_eq!(containing_dir("/tmp/x/../a.txt"), "/tmp");
        assert_eq!(containing_dir("/a.txt"), "/");
        assert_eq!(containing_dir("a.txt"), ".");
        assert_eq!(containing_dir("./data/in.txt"), "data");
        assert_eq!(containing_dir("../up/in.txt"), "../up");
    }

    #[test]
    fn test_relative_and_absolute_grants_are_separate() {
        let grant = CapabilityGrant::resolve(&args(&["-i", "in.txt", "-o", "/tmp/out.gz"]));
        assert!(grant.contains("."));
        assert!(grant.contains("/tmp"));
    }
}
