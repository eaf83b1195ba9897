#![no_std]

#[cfg(feature = "alloc")]
extern crate alloc;

// Autonomous-period engine for the competition robot.
//
// Everything here is `no_std` so the same timer/action tables run on the
// controller firmware and inside the host emulator. Hardware is reached only
// through the traits in `io`.

pub mod actions;
pub mod controller;
pub mod devices;
pub mod drive;
pub mod io;
pub mod orchestrator;
pub mod repl;
pub mod routines;
pub mod sequence;
pub mod telemetry;
pub mod timers;
