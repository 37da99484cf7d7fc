// LETSCHED LIBRARY
// REAL-TIME THREAD BURST SIMULATOR: CALIBRATE, BIND, RUN, AGGREGATE
//
// PURE-RUST CORE SHARED BETWEEN THE BINARY CRATE (main.rs, cli/) AND THE
// INTEGRATION TESTS. NOTHING IN HERE CALLS process::exit.

pub mod binder;
pub mod calibrate;
pub mod clock;
pub mod config;
pub mod error;
pub mod policy;
pub mod report;
pub mod sim;
pub mod stats;
pub mod worker;

pub use error::SimError;
