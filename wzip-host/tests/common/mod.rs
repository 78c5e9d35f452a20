//! Shared helpers for integration tests

#![allow(dead_code)]

use std::path::PathBuf;
use wzip_host::{Bridge, BridgeConfig, SandboxModule};

pub const CAT_WAT: &str = include_str!("../fixtures/cat.wat");
pub const ARGS_WAT: &str = include_str!("../fixtures/args.wat");
pub const DENY_WAT: &str = include_str!("../fixtures/deny.wat");
pub const WRITER_WAT: &str = include_str!("../fixtures/writer.wat");
pub const PARTIAL_WAT: &str = include_str!("../fixtures/partial.wat");
pub const ABANDON_WAT: &str = include_str!("../fixtures/abandon.wat");

pub const TRAP_WAT: &str = r#"(module (func (export "_start") unreachable))"#;
pub const SILENT_WAT: &str = r#"(module (memory (export "memory") 1) (func (export "_start")))"#;

pub fn exit_wat(code: i32) -> String {
    format!(
        r#"(module
             (import "wasi_snapshot_preview1" "proc_exit" (func $exit (param i32)))
             (memory (export "memory") 1)
             (func (export "_start") (call $exit (i32.const {}))))"#,
        code
    )
}

pub fn compile(wat: &str) -> SandboxModule {
    compile_with(wat, &BridgeConfig::default())
}

pub fn compile_with(wat: &str, config: &BridgeConfig) -> SandboxModule {
    SandboxModule::compile(wat, config).expect("fixture should compile")
}

pub fn bridge(wat: &str) -> Bridge {
    Bridge::new(compile(wat), &BridgeConfig::default())
}

/// The compiled guest
///
/// Looks at `WZIP_WASM`, then the workspace target directory.
pub fn wzip_wasm() -> PathBuf {
    let path = std::env::var_os("WZIP_WASM")
        .map(PathBuf::from)
        .unwrap_or_else(|| {
            PathBuf::from(env!("CARGO_MANIFEST_DIR"))
                .join("..")
                .join(wzip_host::config::DEFAULT_MODULE_PATH)
        });
    assert!(
        path.exists(),
        "{} not found; build it with `cargo build -p wzip --target wasm32-wasip1 --release` or set WZIP_WASM",
        path.display()
    );
    path
}

pub fn args(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}
