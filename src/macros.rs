// src/macros.rs

//
// Logging macros
//
// Every event is emitted under the `protobuf_rpc` target so applications
// can filter the runtime with `RUST_LOG=protobuf_rpc=debug`.
//
// logging feature enabled → tracing
// logging feature disabled → only errors reach stderr, prefixed with the crate name
//

#![allow(unused_macros)]

#[cfg(feature = "logging")]
macro_rules! rpc_event {
    ($level:ident, $($arg:tt)*) => {
        tracing::event!(target: "protobuf_rpc", tracing::Level::$level, $($arg)*)
    };
}

#[cfg(not(feature = "logging"))]
macro_rules! rpc_event {
    (ERROR, $($arg:tt)*) => {
        eprintln!("protobuf_rpc: {}", format_args!($($arg)*))
    };
    ($level:ident, $($arg:tt)*) => {{
        let _ = format_args!($($arg)*);
    }};
}

// --------------------
// Levels
// --------------------

macro_rules! log_error {
    ($($arg:tt)*) => { $crate::rpc_event!(ERROR, $($arg)*) };
}

macro_rules! log_warn {
    ($($arg:tt)*) => { $crate::rpc_event!(WARN, $($arg)*) };
}

macro_rules! log_info {
    ($($arg:tt)*) => { $crate::rpc_event!(INFO, $($arg)*) };
}

/// Per-call tracing: correlation ids, dropped replies, handler swaps.
macro_rules! log_debug {
    ($($arg:tt)*) => { $crate::rpc_event!(DEBUG, $($arg)*) };
}

pub(crate) use log_debug;
pub(crate) use log_error;
pub(crate) use log_info;
pub(crate) use log_warn;
pub(crate) use rpc_event;
