//! Soartrace - glider flight path recording core
//!
//! This library records a glider's flight path for two purposes:
//! bounded, queryable in-memory reduction of the trajectory for live
//! contest scoring and display (`trace`), and durable, tamper-evident
//! persistence of the flight to an IGC log file (`igc`).
//!
//! The GPS acquisition pipeline, the task/scoring domain model and all
//! presentation are external: they feed and consume this core through
//! `aircraft::AircraftState` samples and trace snapshots.

pub mod aircraft;
pub mod coord;
pub mod igc;
pub mod trace;

pub use aircraft::{AircraftState, TraceSettings};
pub use coord::GeoPoint;
pub use igc::{HeaderData, IgcError, IgcFix, IgcWriter, SignOutcome};
pub use trace::{TraceComputer, TraceConfig, TraceError, TracePoint, TraceStore};
