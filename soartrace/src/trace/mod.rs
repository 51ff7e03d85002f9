//! Bounded flight path retention.
//!
//! `TraceStore` keeps a fixed-size, decimated subset of an unbounded
//! sample stream; `TraceComputer` routes incoming aircraft state into
//! three independently configured stores and guards them for concurrent
//! access by the sampling thread and snapshot readers.

mod computer;
mod store;

pub use computer::TraceComputer;
pub use store::{TraceConfig, TraceError, TracePoint, TraceStore};
