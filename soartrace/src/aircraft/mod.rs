//! Aircraft state samples and recording settings.
//!
//! `AircraftState` is the narrow interface between the GPS/NMEA
//! acquisition pipeline (out of scope here) and the recording core: the
//! trace computer routes samples into its stores, and the flight log
//! writer projects them into fix and event records.

use chrono::NaiveDateTime;

use crate::coord::GeoPoint;

/// One sample of aircraft state, as produced by the acquisition pipeline.
///
/// Optional fields model sensors that may drop out mid-flight: a sample
/// with `location == None` is a lost fix, not an invalid sample.
#[derive(Debug, Clone, PartialEq)]
pub struct AircraftState {
    /// Monotonic flight time in seconds. Strictly increases during one
    /// flight; a regression signals a new flight.
    pub time: f64,
    /// Wall-clock UTC date and time of the sample.
    pub date_time_utc: NaiveDateTime,
    /// True while the aircraft is airborne.
    pub flying: bool,
    /// True if the data source is delivering samples at all.
    pub alive: bool,
    /// True if the fix comes from a real GPS receiver rather than a
    /// simulator or replay source.
    pub real: bool,
    /// Current position, if the receiver has a fix.
    pub location: Option<GeoPoint>,
    /// GPS altitude in metres, if available.
    pub gps_altitude: Option<f64>,
    /// Barometric altitude in metres, if available.
    pub baro_altitude: Option<f64>,
    /// Vertical speed in m/s, carried opaquely into trace points.
    pub vario: f64,
    /// Number of satellites used in the fix.
    pub satellites: u8,
    /// Identifiers of the satellites in use, empty when unknown.
    pub satellite_ids: Vec<u8>,
    /// Estimated position error in metres.
    pub epe: f64,
}

impl Default for AircraftState {
    fn default() -> Self {
        Self {
            time: 0.0,
            date_time_utc: NaiveDateTime::default(),
            flying: false,
            alive: false,
            real: true,
            location: None,
            gps_altitude: None,
            baro_altitude: None,
            vario: 0.0,
            satellites: 0,
            satellite_ids: Vec::new(),
            epe: 0.0,
        }
    }
}

impl AircraftState {
    /// True if this sample marks the session as simulated: the source is
    /// alive but not a real receiver.
    pub fn is_simulated(&self) -> bool {
        self.alive && !self.real
    }
}

/// Feature flags deciding which trace stores receive samples.
///
/// These come from the enclosing application's settings object; the core
/// only reads them.
#[derive(Debug, Clone, Copy, Default)]
pub struct TraceSettings {
    /// Retain the full-fidelity trace for display.
    pub enable_trace: bool,
    /// Retain the traces used by contest scoring.
    pub enable_contest: bool,
}

impl TraceSettings {
    /// True if any consumer needs the full-fidelity store.
    pub fn needs_full_trace(&self) -> bool {
        self.enable_trace || self.enable_contest
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_state_is_grounded_and_fixless() {
        let state = AircraftState::default();
        assert!(!state.flying);
        assert!(state.location.is_none());
        assert!(!state.is_simulated());
    }

    #[test]
    fn test_simulated_requires_alive() {
        let mut state = AircraftState {
            real: false,
            ..Default::default()
        };
        assert!(!state.is_simulated(), "dead source is not a simulator");

        state.alive = true;
        assert!(state.is_simulated());
    }

    #[test]
    fn test_needs_full_trace() {
        assert!(!TraceSettings::default().needs_full_trace());
        assert!(TraceSettings {
            enable_trace: true,
            enable_contest: false
        }
        .needs_full_trace());
        assert!(TraceSettings {
            enable_trace: false,
            enable_contest: true
        }
        .needs_full_trace());
    }
}
