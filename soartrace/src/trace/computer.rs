//! Routes aircraft state samples into the trace stores.
//!
//! The `TraceComputer` owns three independently configured stores: the
//! full-fidelity trace read by display and scoring, the contest trace
//! with its longer-horizon retention, and the short-horizon sprint
//! trace. One sampling thread feeds `update` while reader threads pull
//! snapshots through the locked copy methods; each lock is held for
//! exactly one store operation.

use parking_lot::Mutex;
use tracing::debug;

use crate::aircraft::{AircraftState, TraceSettings};
use crate::coord::GeoPoint;
use crate::trace::store::{TraceConfig, TracePoint, TraceStore};

/// Full-fidelity trace capacity.
const FULL_TRACE_SIZE: usize = 1024;
/// Contest trace capacity.
const CONTEST_TRACE_SIZE: usize = 512;
/// Sprint trace capacity.
const SPRINT_TRACE_SIZE: usize = 128;
/// Recent points in the full trace exempt from thinning (seconds).
const FULL_NO_THIN_WINDOW: f64 = 60.0;
/// Sprint trace retention horizon (seconds).
const SPRINT_HORIZON: f64 = 9000.0;

/// Watermark value meaning "no sample seen yet".
const NULL_TIME: f64 = -1.0;

/// Owns the flight's trace stores and guards them against concurrent
/// read/write access. Reset at flight start, mutated once per sample,
/// read concurrently by any number of snapshot queries.
pub struct TraceComputer {
    full: Mutex<TraceStore>,
    contest: Mutex<TraceStore>,
    sprint: Mutex<TraceStore>,
    last_time: Mutex<f64>,
}

impl TraceComputer {
    /// Create a trace computer with the standard store configuration.
    pub fn new() -> Self {
        let full = TraceStore::new(
            TraceConfig::new(FULL_TRACE_SIZE).no_thin_window(FULL_NO_THIN_WINDOW),
        )
        .expect("full trace capacity is non-zero");
        let contest = TraceStore::new(TraceConfig::new(CONTEST_TRACE_SIZE))
            .expect("contest trace capacity is non-zero");
        let sprint = TraceStore::new(
            TraceConfig::new(SPRINT_TRACE_SIZE).max_age(SPRINT_HORIZON),
        )
        .expect("sprint trace capacity is non-zero");

        Self {
            full: Mutex::new(full),
            contest: Mutex::new(contest),
            sprint: Mutex::new(sprint),
            last_time: Mutex::new(NULL_TIME),
        }
    }

    /// Route one sample into the stores enabled by `settings`.
    ///
    /// A timestamp behind the watermark means a new flight: the full and
    /// sprint stores are cleared and the sample itself is discarded. The
    /// contest store is deliberately left to its own capacity-driven
    /// lifecycle, preserving its longer retention across a restart. A
    /// timestamp equal to the watermark, or a sample on the ground, is a
    /// no-op.
    pub fn update(&self, settings: &TraceSettings, state: &AircraftState) {
        {
            let mut last_time = self.last_time.lock();
            if state.time < *last_time {
                debug!(
                    time = state.time,
                    watermark = *last_time,
                    "time regression, starting a new trace"
                );
                drop(last_time);
                self.reset();
                return;
            }
            if state.time <= *last_time {
                return;
            }
            *last_time = state.time;
        }

        if !state.flying {
            return;
        }

        let Some(point) = TracePoint::from_state(state) else {
            return;
        };

        // Either the display trace or contest scoring needs the full store
        if settings.needs_full_trace() {
            self.full.lock().append(point);
        }

        // Only contest scoring needs the sprint store
        if settings.enable_contest {
            self.sprint.lock().append(point);
        }
    }

    /// Clear the full and sprint stores and reset the watermark.
    pub fn reset(&self) {
        self.full.lock().clear();
        self.sprint.lock().clear();
        *self.last_time.lock() = NULL_TIME;
    }

    /// Copy the full trace, in time order, into `out`.
    pub fn locked_copy(&self, out: &mut Vec<TracePoint>) {
        self.full.lock().snapshot(out);
    }

    /// Copy the full trace filtered to `min_time` and decimated to
    /// `resolution` metres around `origin` into `out`.
    pub fn locked_copy_filtered(
        &self,
        out: &mut Vec<TracePoint>,
        min_time: f64,
        origin: &GeoPoint,
        resolution: f64,
    ) {
        self.full
            .lock()
            .snapshot_filtered(out, min_time, origin, resolution);
    }

    /// Copy the contest trace into `out`, for the contest solver.
    pub fn contest_snapshot(&self, out: &mut Vec<TracePoint>) {
        self.contest.lock().snapshot(out);
    }

    /// Copy the sprint trace into `out`, for the contest solver.
    pub fn sprint_snapshot(&self, out: &mut Vec<TracePoint>) {
        self.sprint.lock().snapshot(out);
    }
}

impl Default for TraceComputer {
    fn default() -> Self {
        Self::new()
    }
}
