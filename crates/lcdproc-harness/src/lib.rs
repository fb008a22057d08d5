//! Deterministic simulation harness for LCDproc server testing.
//!
//! Turmoil-based implementations of the environment, network and display
//! for deterministic, reproducible tests of the whole server: real protocol
//! bytes over simulated TCP, a virtual clock pacing the render loop, and a
//! display that records every frame.
//!
//! # Invariant Testing
//!
//! The `invariants` module lists what must hold in every reachable server
//! state. [`check_invariants`] runs all of them against a [`ServerSnapshot`].

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod invariants;
pub mod sim_display;
pub mod sim_env;
pub mod sim_server;

pub use invariants::{
    ScreenSnapshot, ServerInvariant, ServerSnapshot, Violation, assert_invariants, check_invariants,
};
pub use sim_display::{DisplayProbe, SimDisplay};
pub use sim_env::SimEnv;
pub use sim_server::{SIM_DISPLAY_SIZE, SimServer};
