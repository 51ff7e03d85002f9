//! Bounded, time-ordered trace store with density-based decimation.
//!
//! A `TraceStore` retains a representative subset of an unbounded stream
//! of flight path points under a fixed capacity. When full, each accepted
//! append evicts the interior point whose removal loses the least path
//! shape: the point sitting in the temporally and spatially densest
//! region. Density therefore self-adjusts, and old sparse history
//! outlives recent dense history.

use thiserror::Error;

use crate::aircraft::AircraftState;
use crate::coord::{distance_at, GeoPoint};

/// Weight converting metres of track detour into seconds of time gap when
/// scoring eviction candidates: 100 m weighs like one second.
const DISTANCE_WEIGHT_S_PER_M: f64 = 0.01;

/// Errors from trace store configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TraceError {
    /// A store must be able to hold at least one point.
    #[error("trace store capacity must be at least 1")]
    ZeroCapacity,
}

/// An immutable snapshot of aircraft position at one instant.
///
/// Owned by the store that retains it; never mutated after insertion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TracePoint {
    /// Monotonic flight time in seconds.
    pub time: f64,
    /// Position at `time`.
    pub location: GeoPoint,
    /// GPS altitude in metres.
    pub gps_altitude: f64,
    /// Barometric altitude in metres.
    pub baro_altitude: f64,
    /// Vertical speed in m/s, carried for downstream scoring.
    pub vario: f64,
}

impl TracePoint {
    /// Project an aircraft state sample into a trace point.
    ///
    /// Returns `None` when the sample has no position fix. Missing
    /// altitudes fall back to the other source, then to zero.
    pub fn from_state(state: &AircraftState) -> Option<Self> {
        let location = state.location?;
        Some(Self {
            time: state.time,
            location,
            gps_altitude: state
                .gps_altitude
                .or(state.baro_altitude)
                .unwrap_or(0.0),
            baro_altitude: state
                .baro_altitude
                .or(state.gps_altitude)
                .unwrap_or(0.0),
            vario: state.vario,
        })
    }
}

/// Configuration for a trace store. Fixed at construction.
#[derive(Debug, Clone)]
pub struct TraceConfig {
    /// Maximum number of retained points.
    pub capacity: usize,
    /// Points within this many seconds of the incoming point are exempt
    /// from eviction. Zero disables the exemption.
    pub no_thin_window: f64,
    /// Retention horizon in seconds: points older than the newest point
    /// minus this are discarded on append. `None` retains indefinitely.
    pub max_age: Option<f64>,
}

impl TraceConfig {
    /// Configuration with the given capacity, no thinning exemption and
    /// no retention horizon.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            no_thin_window: 0.0,
            max_age: None,
        }
    }

    /// Exempt points within `seconds` of the newest from eviction.
    pub fn no_thin_window(mut self, seconds: f64) -> Self {
        self.no_thin_window = seconds;
        self
    }

    /// Discard points older than `seconds` behind the newest.
    pub fn max_age(mut self, seconds: f64) -> Self {
        self.max_age = Some(seconds);
        self
    }
}

/// Bounded, strictly time-ordered container of trace points.
///
/// Not internally synchronized: callers that share a store across threads
/// lock around each operation (see `TraceComputer`).
#[derive(Debug)]
pub struct TraceStore {
    points: Vec<TracePoint>,
    config: TraceConfig,
}

impl TraceStore {
    /// Create an empty store. Rejects a zero capacity.
    pub fn new(config: TraceConfig) -> Result<Self, TraceError> {
        if config.capacity == 0 {
            return Err(TraceError::ZeroCapacity);
        }
        Ok(Self {
            points: Vec::with_capacity(config.capacity),
            config,
        })
    }

    /// Append a point, decimating if the store is at capacity.
    ///
    /// Returns `false` without touching the store when `point.time` is
    /// not strictly after the newest retained point. Callers treat that
    /// as the new-flight signal and `clear()` before retrying.
    pub fn append(&mut self, point: TracePoint) -> bool {
        if let Some(last) = self.points.last() {
            if point.time <= last.time {
                return false;
            }
        }

        if let Some(max_age) = self.config.max_age {
            let horizon = point.time - max_age;
            let keep_from = self.points.partition_point(|p| p.time < horizon);
            if keep_from > 0 {
                self.points.drain(..keep_from);
            }
        }

        self.points.push(point);
        if self.points.len() > self.config.capacity {
            let victim = self.select_victim();
            self.points.remove(victim);
        }

        debug_assert!(self.points.len() <= self.config.capacity);
        true
    }

    /// Pick the index to evict: the interior point with the smallest
    /// combined time/space gap between its neighbours. The first and last
    /// points are kept while any interior candidate exists; if every
    /// interior point falls inside the no-thin window, the oldest point
    /// is evicted instead, because an append must always be accepted.
    fn select_victim(&self) -> usize {
        let newest = self.points[self.points.len() - 1].time;
        let protect_after = newest - self.config.no_thin_window;

        let mut best: Option<(usize, f64)> = None;
        for i in 1..self.points.len() - 1 {
            let point = &self.points[i];
            if point.time > protect_after {
                // Points are time ordered, so the rest are newer still.
                break;
            }
            let prev = &self.points[i - 1];
            let next = &self.points[i + 1];
            let time_gap = next.time - prev.time;
            let space_gap = prev.location.distance_m(&point.location)
                + point.location.distance_m(&next.location);
            let score = time_gap + DISTANCE_WEIGHT_S_PER_M * space_gap;
            if best.map_or(true, |(_, s)| score < s) {
                best = Some((i, score));
            }
        }

        best.map_or(0, |(i, _)| i)
    }

    /// Copy the retained points, in time order, into `out`.
    pub fn snapshot(&self, out: &mut Vec<TracePoint>) {
        out.clear();
        out.extend_from_slice(&self.points);
    }

    /// Copy points at or after `min_time`, additionally suppressing any
    /// point closer than `resolution` metres to the previously selected
    /// one. Distances use a flat-earth projection fixed at the query
    /// `origin`. A resolution of zero (or less) disables suppression.
    pub fn snapshot_filtered(
        &self,
        out: &mut Vec<TracePoint>,
        min_time: f64,
        origin: &GeoPoint,
        resolution: f64,
    ) {
        out.clear();
        let start = self.points.partition_point(|p| p.time < min_time);
        for point in &self.points[start..] {
            if resolution > 0.0 {
                if let Some(last) = out.last() {
                    let d = distance_at(origin.latitude, &last.location, &point.location);
                    if d < resolution {
                        continue;
                    }
                }
            }
            out.push(*point);
        }
    }

    /// Empty the store and forget its time baseline.
    pub fn clear(&mut self) {
        self.points.clear();
    }

    /// Number of retained points.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// True if no points are retained.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Configured maximum number of points.
    pub fn capacity(&self) -> usize {
        self.config.capacity
    }
}
