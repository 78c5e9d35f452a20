//! # wzip-host
//!
//! Runs the `wzip` gzip tool, compiled to WASI, inside three hosts: a
//! drag-and-drop page, an HTTP endpoint and the command line.
//!
//! Every host goes through the same bridge. In-memory hosts hand over bytes
//! which reach the module as a virtual stdin; the command line hands over
//! its arguments, and the module sees only the directories of the files
//! they name.
//!
//! # Example
//!
//! ```rust,ignore
//! use wzip_host::adapter::server::{router, ServerConfig};
//! use wzip_host::{Bridge, BridgeConfig, SandboxModule};
//!
//! let config = BridgeConfig::default();
//! let module = SandboxModule::shared("wzip.wasm", &config)?;
//! let app = router(Bridge::new(module.clone(), &config), ServerConfig::default());
//! ```

pub mod adapter;
pub mod bridge;
pub mod config;
pub mod error;
pub mod grant;
pub mod invocation;
pub mod invoker;
pub mod module;
pub mod mount;
pub mod tracing_support;

pub use adapter::ModePolicy;
pub use bridge::{Bridge, Host};
pub use config::{BridgeConfig, RuntimeArgs};
pub use error::BridgeError;
pub use grant::CapabilityGrant;
pub use invocation::{Invocation, Output, Phase};
pub use invoker::{Binding, ExitSignal, SandboxInvoker};
pub use module::SandboxModule;
pub use mount::StdioMount;
pub use wzip_format::Mode;
