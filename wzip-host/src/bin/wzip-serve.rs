//! Serve wzip over HTTP
//!
//! ```bash
//! wzip-serve --listen 127.0.0.1:3000
//! curl --data-binary @notes.txt http://127.0.0.1:3000/ > notes.txt.gz
//! ```

use clap::Parser;
use std::net::SocketAddr;
use wzip_host::adapter::server::{router, ServerConfig, DEFAULT_BODY_LIMIT};
use wzip_host::tracing_support::init_subscriber;
use wzip_host::{Bridge, ModePolicy, RuntimeArgs, SandboxModule};

#[derive(Parser, Debug)]
#[command(name = "wzip-serve")]
#[command(about = "Compress or decompress request bodies with the wzip module")]
#[command(version)]
struct Args {
    #[command(flatten)]
    runtime: RuntimeArgs,

    /// Address to listen on
    #[arg(long, env = "WZIP_LISTEN", default_value = "127.0.0.1:3000")]
    listen: SocketAddr,

    /// Operation: compress, decompress, infer or passthrough
    #[arg(long, env = "WZIP_MODE", default_value = "compress")]
    mode: ModePolicy,

    /// Maximum request body size in bytes
    #[arg(long, env = "WZIP_BODY_LIMIT", default_value_t = DEFAULT_BODY_LIMIT)]
    body_limit: usize,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_subscriber(args.runtime.tracing_config());

    let config = args.runtime.bridge_config();
    let module = SandboxModule::shared(&args.runtime.module, &config)?;
    let bridge = Bridge::new(module.clone(), &config);

    let app = router(
        bridge,
        ServerConfig {
            policy: args.mode,
            body_limit: args.body_limit,
        },
    );

    let listener = tokio::net::TcpListener::bind(args.listen).await?;
    tracing::info!(addr = %args.listen, mode = %args.mode, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to listen for shutdown signal");
    }
}
