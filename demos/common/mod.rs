//! Shared demo code.
//!
//! Client and server both depend on the same service descriptor, the way a
//! real deployment shares one compiled `.proto` between both sides.
mod calculator;
mod calculator_proto;

#[allow(unused_imports)]
pub use calculator::*;
