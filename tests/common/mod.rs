#![allow(dead_code)]

#[path = "../../demos/common/calculator.rs"]
mod calculator;
#[path = "../../demos/common/calculator_proto.rs"]
mod calculator_proto;

pub use calculator::*;

use tracing_subscriber::EnvFilter;

pub fn init_logging() {
    // ---
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
