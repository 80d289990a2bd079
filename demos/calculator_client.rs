//! Calculator RPC load client.
//!
//! Spawns a number of workers per operation; each worker calls its
//! operation back to back with random operands, checks the result, and logs
//! the round-trip time. Stops after `--duration` seconds and prints totals.
//!
//! Run with (server first):
//!
//! ```bash
//! cargo run --example calculator_server -- 8088
//! cargo run --example calculator_client -- 8088 localhost --n-add 2 --n-div 4
//! ```

mod common;

use clap::Parser;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

use protobuf_rpc::{RemoteMethod, ServiceProxyBuilder};

#[derive(Parser, Debug)]
#[command(about = "Calculator RPC client", version)]
struct Args {
    /// Server port
    #[arg(default_value_t = 8088)]
    port: u16,

    /// Server host
    #[arg(default_value = "localhost")]
    host: String,

    /// ADD workers
    #[arg(short = 'a', long, default_value_t = 1)]
    n_add: usize,

    /// SUB workers
    #[arg(short = 's', long, default_value_t = 1)]
    n_sub: usize,

    /// MUL workers
    #[arg(short = 'm', long, default_value_t = 1)]
    n_mul: usize,

    /// DIV workers
    #[arg(short = 'd', long, default_value_t = 1)]
    n_div: usize,

    /// Seconds to run
    #[arg(long, default_value_t = 10)]
    duration: u64,
}

#[derive(Default)]
struct Totals {
    // ---
    calls: AtomicU64,
    failures: AtomicU64,
}

async fn worker(method: RemoteMethod, index: usize, deadline: Instant, totals: Arc<Totals>) {
    // ---
    let op = method.name().to_string();

    while Instant::now() < deadline {
        let lhs = rand::random_range(0..=255);
        let rhs = if op == "div" {
            rand::random_range(1..=256)
        } else {
            rand::random_range(0..=255)
        };

        let started = Instant::now();
        let outcome = method.invoke(&common::request(&method, lhs, rhs)).await;
        let elapsed = started.elapsed();

        totals.calls.fetch_add(1, Ordering::Relaxed);

        let checked = outcome
            .map_err(anyhow::Error::from)
            .and_then(|result| common::value(&result))
            .and_then(|value| {
                let expected = common::evaluate(&op, lhs, rhs)?;
                anyhow::ensure!(value == expected, "{op}({lhs}, {rhs}) = {value}, expected {expected}");
                Ok(())
            });

        match checked {
            Ok(()) => tracing::info!("dT[{op}]@{index}: {:.3}ms", elapsed.as_secs_f64() * 1e3),
            Err(e) => {
                totals.failures.fetch_add(1, Ordering::Relaxed);
                tracing::error!("{op}@{index} failed: {e}");
            }
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ---
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .init();

    let args = Args::parse();
    let url = format!("ws://{}:{}", args.host, args.port);

    let proxy = ServiceProxyBuilder::new(common::service()?)
        .address(url.as_str())
        .build()
        .await?;

    println!("= connected to {url}");

    let deadline = Instant::now() + Duration::from_secs(args.duration);
    let totals = Arc::new(Totals::default());
    let mut workers = Vec::new();

    for (op, count) in [
        ("add", args.n_add),
        ("sub", args.n_sub),
        ("mul", args.n_mul),
        ("div", args.n_div),
    ] {
        let method = proxy.method(op)?;
        for index in 0..count {
            workers.push(tokio::spawn(worker(
                method.clone(),
                index,
                deadline,
                totals.clone(),
            )));
        }
    }

    for handle in workers {
        handle.await?;
    }

    proxy.close().await?;

    let calls = totals.calls.load(Ordering::Relaxed);
    let failures = totals.failures.load(Ordering::Relaxed);
    println!("= {calls} calls, {failures} failures in {}s", args.duration);

    anyhow::ensure!(failures == 0, "{failures} calls failed");
    Ok(())
}
