//! Calculator RPC server over WebSocket.
//!
//! Serves `Calculator.Service` (add, sub, mul, div) on `ws://HOST:PORT`.
//! Division by zero is reported to the caller as a remote error.
//!
//! Run with:
//!
//! ```bash
//! RUST_LOG=info cargo run --example calculator_server -- 8088
//! ```

mod common;

use clap::Parser;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(about = "Calculator RPC server", version)]
struct Args {
    /// Port to listen on
    #[arg(default_value_t = 8088)]
    port: u16,

    /// Interface to bind
    #[arg(default_value = "0.0.0.0")]
    host: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ---
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .init();

    let args = Args::parse();

    let server = common::server()?;
    let listener = TcpListener::bind((args.host.as_str(), args.port)).await?;
    println!("calculator listening on ws://{}", listener.local_addr()?);

    tokio::select! {
        result = server.serve_websocket(listener) => result?,
        _ = tokio::signal::ctrl_c() => println!("Received Ctrl+C, shutting down..."),
    }

    Ok(())
}
