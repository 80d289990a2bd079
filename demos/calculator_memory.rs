//! Calculator round trip without a network.
//!
//! Wires a `ServiceProxy` to an in-process `RpcServer` through the memory
//! transport and runs each operation once, including a division by zero.
//!
//! Run with: cargo run --example calculator_memory

mod common;

use protobuf_rpc::{memory_transport, RpcError, ServiceProxyBuilder};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ---
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .init();

    let proxy = ServiceProxyBuilder::new(common::service()?)
        .address("memory://calculator")
        .transport(memory_transport(common::server()?))
        .build()
        .await?;

    for (op, lhs, rhs) in [("add", 2, 3), ("sub", 2, 3), ("mul", 6, 7), ("div", 7, 2)] {
        let method = proxy.method(op)?;
        let result = method.invoke(&common::request(&method, lhs, rhs)).await?;
        println!("{op}({lhs}, {rhs}) = {}", common::value(&result)?);
    }

    // Callback form: the completion runs once the reply is dispatched.
    let div = proxy.method("div")?;
    let (tx, rx) = tokio::sync::oneshot::channel();
    div.call(&common::request(&div, 5, 0), move |outcome| {
        let _ = tx.send(outcome);
    })
    .await;

    match rx.await? {
        Err(RpcError::Remote(message)) => println!("div(5, 0) failed remotely: {message}"),
        other => anyhow::bail!("expected a remote error, got {other:?}"),
    }

    proxy.close().await?;
    Ok(())
}
