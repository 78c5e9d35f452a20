//! Compiled module and engine
//!
//! Compilation is the expensive part of a run, so it happens once. A
//! [`SandboxModule`] is immutable afterwards and is shared across every
//! invocation and thread; each invocation still gets its own store and
//! instance.

use crate::config::BridgeConfig;
use crate::error::BridgeError;
use std::path::Path;
use std::sync::OnceLock;
use wasmtime::{Config, Engine, Module};

static SHARED: OnceLock<SandboxModule> = OnceLock::new();

/// Engine plus compiled wzip module. Cloning is cheap.
#[derive(Clone)]
pub struct SandboxModule {
    engine: Engine,
    module: Module,
    fuel_limit: Option<u64>,
}

impl SandboxModule {
    /// Compile from binary WASM or WAT text
    pub fn compile(bytes: impl AsRef<[u8]>, config: &BridgeConfig) -> Result<Self, BridgeError> {
        let engine = create_engine(config)?;
        let module = Module::new(&engine, bytes).map_err(|source| BridgeError::ModuleLoad {
            origin: "<bytes>".to_string(),
            source,
        })?;

        Ok(Self {
            engine,
            module,
            fuel_limit: config.fuel_limit,
        })
    }

    /// Compile the module at `path`
    pub fn from_file(path: impl AsRef<Path>, config: &BridgeConfig) -> Result<Self, BridgeError> {
        let path = path.as_ref();
        let engine = create_engine(config)?;
        let module = Module::from_file(&engine, path).map_err(|source| BridgeError::ModuleLoad {
            origin: path.display().to_string(),
            source,
        })?;

        tracing::debug!(path = %path.display(), "Module compiled");

        Ok(Self {
            engine,
            module,
            fuel_limit: config.fuel_limit,
        })
    }

    /// Process-wide module, compiled on first use
    ///
    /// The first successful call decides the module; later calls return it
    /// regardless of `path` and `config`. A failed compilation leaves the
    /// cache empty so the next call tries again.
    pub fn shared(path: impl AsRef<Path>, config: &BridgeConfig) -> Result<&'static Self, BridgeError> {
        if let Some(module) = SHARED.get() {
            return Ok(module);
        }
        let compiled = Self::from_file(path, config)?;
        Ok(SHARED.get_or_init(|| compiled))
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn module(&self) -> &Module {
        &self.module
    }

    pub fn fuel_limit(&self) -> Option<u64> {
        self.fuel_limit
    }
}

impl std::fmt::Debug for SandboxModule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SandboxModule")
            .field("name", &self.module.name())
            .field("fuel_limit", &self.fuel_limit)
            .finish_non_exhaustive()
    }
}

fn create_engine(config: &BridgeConfig) -> Result<Engine, BridgeError> {
    let mut engine_config = Config::new();

    // Fuel is only metered when a limit is configured
    engine_config.consume_fuel(config.fuel_limit.is_some());

    engine_config.max_wasm_stack(config.max_wasm_stack);

    // Disable memory64 for wasm32 compatibility
    engine_config.wasm_memory64(false);

    Engine::new(&engine_config).map_err(BridgeError::EngineCreation)
}
