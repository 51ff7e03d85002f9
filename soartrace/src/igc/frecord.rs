//! Satellite constellation (`F`) record scheduling.

use chrono::Timelike;

use crate::aircraft::AircraftState;

/// Minimum seconds between F records when the constellation changed.
const CHANGE_INTERVAL_S: f64 = 60.0;
/// Maximum seconds between F records regardless of change.
const REFRESH_INTERVAL_S: f64 = 270.0;

/// Decides when the satellite constellation record is due.
///
/// The record is pending until the constellation first becomes known,
/// then re-emitted when it changes (rate limited) or goes stale.
#[derive(Debug, Default)]
pub struct FRecord {
    last_ids: Vec<u8>,
    last_emit_time: Option<f64>,
}

impl FRecord {
    /// Create a scheduler with no constellation known yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget everything, as at the start of a new log.
    pub fn reset(&mut self) {
        self.last_ids.clear();
        self.last_emit_time = None;
    }

    /// Return the formatted F record if one is due for this sample.
    pub fn update(&mut self, state: &AircraftState) -> Option<String> {
        if state.satellite_ids.is_empty() {
            return None;
        }

        let due = match self.last_emit_time {
            None => true,
            Some(last) => {
                let elapsed = state.time - last;
                elapsed >= REFRESH_INTERVAL_S
                    || (state.satellite_ids != self.last_ids && elapsed >= CHANGE_INTERVAL_S)
            }
        };
        if !due {
            return None;
        }

        self.last_ids = state.satellite_ids.clone();
        self.last_emit_time = Some(state.time);

        let time = state.date_time_utc.time();
        let mut line = format!(
            "F{:02}{:02}{:02}",
            time.hour(),
            time.minute(),
            time.second()
        );
        for id in &state.satellite_ids {
            line.push_str(&format!("{:02}", id));
        }
        Some(line)
    }
}
