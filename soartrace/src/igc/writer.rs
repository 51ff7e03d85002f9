//! Buffered IGC flight log writer.
//!
//! Formats header, declaration, fix, event and note records into a
//! bounded line buffer, flushes them durably to the log file, and signs
//! the finished file. The writer is driven from a single logging thread;
//! callers needing concurrent access serialize externally.
//!
//! Records must be produced in the order the IGC format expects (header,
//! declaration, then fixes and events, then finish and sign). The writer
//! does not police that order at runtime; emitting a structurally valid
//! file is the caller's responsibility.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use tracing::{debug, warn};

use crate::aircraft::AircraftState;
use crate::coord::GeoPoint;

use super::frecord::FRecord;
use super::grecord::{GRecord, INVALID_DIGEST_RECORD};
use super::line_buffer::LineBuffer;
use super::IgcError;

/// Manufacturer code in the `A` record.
const MANUFACTURER_CODE: &str = "STR";

/// Earliest and latest plausible header years.
const PLAUSIBLE_YEARS: std::ops::RangeInclusive<i32> = 1980..=2100;

/// Pilot, aircraft and logger metadata for the header block.
#[derive(Debug, Clone)]
pub struct HeaderData<'a> {
    /// UTC date of the flight.
    pub date: NaiveDate,
    pub pilot_name: &'a str,
    pub aircraft_model: &'a str,
    pub aircraft_registration: &'a str,
    pub competition_id: &'a str,
    /// Logger serial, exactly three ASCII alphanumeric characters.
    pub logger_id: &'a str,
    /// Name of the GPS device driver.
    pub driver_name: &'a str,
}

/// A GPS fix projected into the fields of a `B` record.
#[derive(Debug, Clone, Copy)]
pub struct IgcFix {
    /// UTC time of day.
    pub time: NaiveTime,
    pub location: GeoPoint,
    /// True for a 3D fix (`A`), false when carried forward (`V`).
    pub gps_valid: bool,
    /// Pressure altitude in metres.
    pub pressure_altitude: i32,
    /// GPS altitude in metres.
    pub gps_altitude: i32,
}

/// Result of the signing protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignOutcome {
    /// Signing is disabled for simulated sessions; nothing was appended.
    Simulator,
    /// Expected and observed digests matched; a signature was appended.
    Valid,
    /// The file on disk does not match what was written; an
    /// invalid-marker record was appended instead of a signature.
    Tampered,
}

/// Buffered, self-signing flight log writer.
///
/// Created once per flight. `finish` and `sign` end the session.
pub struct IgcWriter {
    path: PathBuf,
    simulator: bool,
    buffer: LineBuffer,
    grecord: Option<GRecord>,
    frecord: FRecord,
    last_valid_fix: Option<IgcFix>,
}

impl IgcWriter {
    /// Create a writer for the log file at `path`.
    ///
    /// If the initial sample already identifies a simulated source, the
    /// session starts in simulator mode and no signature engine is
    /// constructed.
    pub fn new(path: impl Into<PathBuf>, state: &AircraftState) -> Self {
        let simulator = state.is_simulated();
        Self {
            path: path.into(),
            simulator,
            buffer: LineBuffer::new(),
            grecord: (!simulator).then(GRecord::new),
            frecord: FRecord::new(),
            last_valid_fix: None,
        }
    }

    /// The path of the log file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// True once the session is downgraded to simulator mode.
    pub fn is_simulator(&self) -> bool {
        self.simulator
    }

    /// Buffer one record, flushing first if the buffer is full.
    fn write_line(&mut self, line: &str) -> Result<(), IgcError> {
        if self.buffer.is_full() {
            self.flush()?;
        }
        self.buffer.push(line)
    }

    /// Emit the header block.
    ///
    /// The manufacturer record, date record, accuracy record (unless
    /// simulating), metadata records, firmware record, GPS driver record,
    /// datum record and extension declaration (unless simulating), in
    /// that order.
    pub fn write_header(&mut self, header: &HeaderData) -> Result<(), IgcError> {
        if header.logger_id.len() != 3
            || !header.logger_id.chars().all(|c| c.is_ascii_alphanumeric())
        {
            return Err(IgcError::InvalidLoggerId(header.logger_id.to_string()));
        }
        if !PLAUSIBLE_YEARS.contains(&header.date.year()) {
            return Err(IgcError::ImplausibleDate(header.date));
        }

        // The flight recorder id record must come first
        self.write_line(&format!("A{}{}", MANUFACTURER_CODE, header.logger_id))?;
        self.write_line(&format!(
            "HFDTE{:02}{:02}{:02}",
            header.date.day(),
            header.date.month(),
            header.date.year() % 100
        ))?;

        if !self.simulator {
            self.write_line("HFFXA100")?;
        }

        self.write_line(&format!("HFPLTPILOT:{}", header.pilot_name))?;
        self.write_line(&format!("HFGTYGLIDERTYPE:{}", header.aircraft_model))?;
        self.write_line(&format!("HFGIDGLIDERID:{}", header.aircraft_registration))?;
        self.write_line(&format!("HFCIDCOMPETITIONID:{}", header.competition_id))?;
        self.write_line(&format!(
            "HFFTYFRTYPE:SOARTRACE,SOARTRACE {}",
            env!("CARGO_PKG_VERSION")
        ))?;
        self.write_line(&format!("HFGPS:{}", header.driver_name))?;
        self.write_line("HFDTM100DATUM:WGS-84")?;

        if !self.simulator {
            // B record extensions: position error at 36-38, satellites at 39-40
            self.write_line("I023638FXA3940SIU")?;
        }

        Ok(())
    }

    /// Open the task declaration: the `C` header record encoding the
    /// number of intermediate turnpoints, followed by the takeoff marker.
    pub fn start_declaration(
        &mut self,
        date_time: NaiveDateTime,
        number_of_turnpoints: i32,
    ) -> Result<(), IgcError> {
        self.write_line(&format!(
            "C{:02}{:02}{:02}{:02}{:02}{:02}0000000000{:02}",
            date_time.day(),
            date_time.month(),
            date_time.year() % 100,
            date_time.hour(),
            date_time.minute(),
            date_time.second(),
            number_of_turnpoints - 2
        ))?;
        self.write_line("C0000000N00000000ETAKEOFF")
    }

    /// Declare one task point.
    pub fn add_declaration(&mut self, location: &GeoPoint, id: &str) -> Result<(), IgcError> {
        let mut line = String::from("C");
        line.push_str(&format_location(location));
        line.extend(id.chars().map(|c| c.to_ascii_uppercase()));
        self.write_line(&line)
    }

    /// Close the task declaration with the landing marker.
    pub fn end_declaration(&mut self) -> Result<(), IgcError> {
        self.write_line("C0000000N00000000ELANDING")
    }

    /// Append a free-text logger note. Notes never participate in the
    /// security digest.
    pub fn logger_note(&mut self, text: &str) -> Result<(), IgcError> {
        self.write_line(&format!("LPLT{}", text))
    }

    /// Emit one `B` record for an already-projected fix.
    pub fn log_fix(
        &mut self,
        fix: &IgcFix,
        estimated_error_m: f64,
        satellites: u8,
    ) -> Result<(), IgcError> {
        let line = format!(
            "B{:02}{:02}{:02}{}{}{:05}{:05}{:03}{:02}",
            fix.time.hour(),
            fix.time.minute(),
            fix.time.second(),
            format_location(&fix.location),
            if fix.gps_valid { 'A' } else { 'V' },
            normalize_altitude(fix.pressure_altitude),
            normalize_altitude(fix.gps_altitude),
            (estimated_error_m.round() as i32).clamp(0, 999),
            satellites.min(99),
        );
        self.write_line(&line)
    }

    /// Project a raw sample into a `B` record and emit it.
    ///
    /// A sample from a non-real source permanently downgrades the session
    /// to simulator mode. While the source has no fix, the last valid
    /// location and altitude are carried forward with the validity letter
    /// `V`; until a first valid fix exists there is nothing meaningful to
    /// log and the call is a no-op. Pressure altitude prefers the
    /// barometric source, falling back to GPS altitude.
    pub fn log_sample(&mut self, state: &AircraftState) -> Result<(), IgcError> {
        if state.is_simulated() {
            self.downgrade_to_simulator();
        }

        if !self.simulator {
            if let Some(frecord_line) = self.frecord.update(state) {
                self.write_line(&frecord_line)?;
            }
        }

        let fix = match state.location {
            Some(location) => {
                let gps_altitude = state.gps_altitude.unwrap_or(0.0).round() as i32;
                let fix = IgcFix {
                    time: state.date_time_utc.time(),
                    location,
                    gps_valid: true,
                    gps_altitude,
                    pressure_altitude: state
                        .baro_altitude
                        .map(|v| v.round() as i32)
                        .unwrap_or(gps_altitude),
                };
                self.last_valid_fix = Some(fix);
                fix
            }
            None => match self.last_valid_fix {
                Some(last) => IgcFix {
                    time: state.date_time_utc.time(),
                    gps_valid: false,
                    pressure_altitude: state
                        .baro_altitude
                        .map(|v| v.round() as i32)
                        .unwrap_or(last.gps_altitude),
                    ..last
                },
                // No fix has ever been seen this session
                None => return Ok(()),
            },
        };

        self.log_fix(&fix, state.epe, state.satellites)
    }

    /// Emit an `E` record, immediately followed by the `B` record the
    /// format requires after every event.
    pub fn log_event(&mut self, state: &AircraftState, code: &str) -> Result<(), IgcError> {
        let time = state.date_time_utc.time();
        self.write_line(&format!(
            "E{:02}{:02}{:02}{}",
            time.hour(),
            time.minute(),
            time.second(),
            code
        ))?;
        self.log_sample(state)
    }

    /// Durably append every buffered line to the log file, absorbing each
    /// into the signature engine as it is written.
    ///
    /// On failure the buffer is left intact so the caller can retry; on
    /// success it is cleared.
    pub fn flush(&mut self) -> Result<(), IgcError> {
        if self.buffer.is_empty() {
            return Ok(());
        }

        match self.append_buffer_to_file() {
            Ok(()) => {
                debug!(lines = self.buffer.len(), path = %self.path.display(), "flushed flight log");
                self.buffer.clear();
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, path = %self.path.display(), "flight log flush failed, keeping buffer");
                Err(e)
            }
        }
    }

    fn append_buffer_to_file(&mut self) -> Result<(), IgcError> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        for line in self.buffer.iter() {
            file.write_all(line.as_bytes())?;
            file.write_all(b"\r\n")?;
            // Absorb only what actually reached the file
            if let Some(grecord) = &mut self.grecord {
                grecord.absorb_record(line);
            }
        }

        file.flush()?;
        Ok(())
    }

    /// Re-check the simulator flag against the final sample, then flush.
    pub fn finish(&mut self, state: &AircraftState) -> Result<(), IgcError> {
        if state.is_simulated() {
            self.downgrade_to_simulator();
        }
        self.flush()
    }

    /// Run the two-phase signing protocol and append the final security
    /// record.
    ///
    /// Finalizes the digest accumulated while writing ("expected"), then
    /// independently re-derives a digest from the file on disk
    /// ("observed"). The appended `G` record carries the signature when
    /// they match and an explicit invalid marker when they do not, so a
    /// corrupted or externally modified file can never pass as signed. A
    /// failure to re-read the file counts as a mismatch. In simulator
    /// mode this is a guaranteed no-op.
    pub fn sign(&mut self) -> Result<SignOutcome, IgcError> {
        if self.simulator {
            return Ok(SignOutcome::Simulator);
        }
        let Some(engine) = self.grecord.take() else {
            // Already signed
            return Ok(SignOutcome::Simulator);
        };

        let expected = engine.finalize();
        let valid = match GRecord::digest_file(&self.path) {
            Ok(observed) => observed == expected,
            Err(e) => {
                warn!(error = %e, path = %self.path.display(), "could not re-read flight log for signing");
                false
            }
        };

        let record = if valid {
            format!("G{}", expected)
        } else {
            INVALID_DIGEST_RECORD.to_string()
        };

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(record.as_bytes())?;
        file.write_all(b"\r\n")?;
        file.flush()?;

        Ok(if valid {
            SignOutcome::Valid
        } else {
            warn!(path = %self.path.display(), "flight log digest mismatch, marked invalid");
            SignOutcome::Tampered
        })
    }

    fn downgrade_to_simulator(&mut self) {
        if !self.simulator {
            debug!("non-real fix source, disabling flight log signing");
            self.simulator = true;
            self.grecord = None;
        }
    }
}

/// Format a location as the 17-character IGC field: 2-digit degrees and
/// 5-digit minute-thousandths with hemisphere letter for latitude, then
/// the same with 3-digit degrees for longitude.
fn format_location(location: &GeoPoint) -> String {
    let lat_suffix = if location.latitude < 0.0 { 'S' } else { 'N' };
    let lat = (location.latitude.abs() * 60_000.0).round() as u32;
    let lon_suffix = if location.longitude < 0.0 { 'W' } else { 'E' };
    let lon = (location.longitude.abs() * 60_000.0).round() as u32;

    format!(
        "{:02}{:05}{}{:03}{:05}{}",
        lat / 60_000,
        lat % 60_000,
        lat_suffix,
        lon / 60_000,
        lon % 60_000,
        lon_suffix
    )
}

/// Range-check an altitude for its 5-character record field: the format
/// has four digits after the minus sign and five before overflow.
fn normalize_altitude(value: i32) -> i32 {
    value.clamp(-9_999, 99_999)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ground_state() -> AircraftState {
        AircraftState {
            alive: true,
            real: true,
            ..Default::default()
        }
    }

    fn fix_state(h: u32, m: u32, s: u32) -> AircraftState {
        AircraftState {
            time: (h * 3600 + m * 60 + s) as f64,
            date_time_utc: NaiveDate::from_ymd_opt(2024, 6, 1)
                .unwrap()
                .and_hms_opt(h, m, s)
                .unwrap(),
            flying: true,
            alive: true,
            real: true,
            location: Some(GeoPoint::new(47.123, 9.456)),
            gps_altitude: Some(1234.0),
            baro_altitude: Some(1200.0),
            satellites: 9,
            epe: 12.0,
            ..Default::default()
        }
    }

    fn header() -> HeaderData<'static> {
        HeaderData {
            date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            pilot_name: "JOHN WHARINGTON",
            aircraft_model: "LS 3",
            aircraft_registration: "VH-WUE",
            competition_id: "WUE",
            logger_id: "A7X",
            driver_name: "GENERIC NMEA",
        }
    }

    fn test_writer() -> IgcWriter {
        // Path is never touched unless a test flushes
        IgcWriter::new("unused.igc", &ground_state())
    }

    fn buffered(writer: &IgcWriter) -> Vec<String> {
        writer.buffer.iter().map(str::to_string).collect()
    }

    #[test]
    fn test_location_formatting() {
        let loc = GeoPoint::new(45.5, -8.25);
        assert_eq!(format_location(&loc), "4530000N00815000W");

        let loc = GeoPoint::new(-2.0, 120.5);
        assert_eq!(format_location(&loc), "0200000S12030000E");
    }

    #[test]
    fn test_altitude_clamping() {
        assert_eq!(normalize_altitude(-20_000), -9_999);
        assert_eq!(normalize_altitude(150_000), 99_999);
        assert_eq!(normalize_altitude(1_234), 1_234);
    }

    #[test]
    fn test_header_record_order() {
        let mut writer = test_writer();
        writer.write_header(&header()).unwrap();

        let lines = buffered(&writer);
        assert_eq!(lines[0], "ASTRA7X");
        assert_eq!(lines[1], "HFDTE010624");
        assert_eq!(lines[2], "HFFXA100");
        assert_eq!(lines[3], "HFPLTPILOT:JOHN WHARINGTON");
        assert_eq!(lines[4], "HFGTYGLIDERTYPE:LS 3");
        assert_eq!(lines[5], "HFGIDGLIDERID:VH-WUE");
        assert_eq!(lines[6], "HFCIDCOMPETITIONID:WUE");
        assert!(lines[7].starts_with("HFFTYFRTYPE:SOARTRACE,SOARTRACE "));
        assert_eq!(lines[8], "HFGPS:GENERIC NMEA");
        assert_eq!(lines[9], "HFDTM100DATUM:WGS-84");
        assert_eq!(lines[10], "I023638FXA3940SIU");
    }

    #[test]
    fn test_simulator_header_omits_security_records() {
        let sim = AircraftState {
            alive: true,
            real: false,
            ..Default::default()
        };
        let mut writer = IgcWriter::new("unused.igc", &sim);
        assert!(writer.is_simulator());
        writer.write_header(&header()).unwrap();

        let lines = buffered(&writer);
        assert!(!lines.iter().any(|l| l.starts_with("HFFXA")));
        assert!(!lines.iter().any(|l| l.starts_with('I')));
    }

    #[test]
    fn test_invalid_logger_id_rejected() {
        let mut writer = test_writer();
        for bad in ["AB", "ABCD", "A;X", ""] {
            let mut h = header();
            h.logger_id = bad;
            assert!(
                matches!(writer.write_header(&h), Err(IgcError::InvalidLoggerId(_))),
                "{:?} should be rejected",
                bad
            );
        }
        assert!(writer.buffer.is_empty(), "nothing buffered on rejection");
    }

    #[test]
    fn test_implausible_date_rejected() {
        let mut writer = test_writer();
        let mut h = header();
        h.date = NaiveDate::from_ymd_opt(1920, 1, 1).unwrap();
        assert!(matches!(
            writer.write_header(&h),
            Err(IgcError::ImplausibleDate(_))
        ));
    }

    #[test]
    fn test_declaration_block() {
        let mut writer = test_writer();
        let dt = NaiveDate::from_ymd_opt(2024, 6, 1)
            .unwrap()
            .and_hms_opt(9, 15, 30)
            .unwrap();
        writer.start_declaration(dt, 5).unwrap();
        writer
            .add_declaration(&GeoPoint::new(45.5, -8.25), "alpha 1")
            .unwrap();
        writer.end_declaration().unwrap();

        let lines = buffered(&writer);
        // 5 turnpoints minus the two endpoints
        assert_eq!(lines[0], "C010624091530000000000003");
        assert_eq!(lines[1], "C0000000N00000000ETAKEOFF");
        assert_eq!(lines[2], "C4530000N00815000WALPHA 1");
        assert_eq!(lines[3], "C0000000N00000000ELANDING");
    }

    #[test]
    fn test_fix_record_layout() {
        let mut writer = test_writer();
        let fix = IgcFix {
            time: NaiveTime::from_hms_opt(11, 1, 35).unwrap(),
            location: GeoPoint::new(45.5, -8.25),
            gps_valid: true,
            pressure_altitude: 1200,
            gps_altitude: 1234,
        };
        writer.log_fix(&fix, 7.0, 9).unwrap();

        let line = &buffered(&writer)[0];
        assert_eq!(line, "B1101354530000N00815000WA012000123400709");
        // Extension bytes line up with the I record: FXA at 36-38, SIU at 39-40
        assert_eq!(&line[35..38], "007");
        assert_eq!(&line[38..40], "09");
    }

    #[test]
    fn test_fix_record_clamps_altitudes() {
        let mut writer = test_writer();
        let fix = IgcFix {
            time: NaiveTime::from_hms_opt(0, 0, 1).unwrap(),
            location: GeoPoint::new(0.0, 0.0),
            gps_valid: false,
            pressure_altitude: -20_000,
            gps_altitude: 150_000,
        };
        writer.log_fix(&fix, 0.0, 0).unwrap();

        let line = &buffered(&writer)[0];
        assert!(line.contains("V-999999999"));
    }

    #[test]
    fn test_log_sample_noop_before_first_fix() {
        let mut writer = test_writer();
        let mut state = fix_state(10, 0, 0);
        state.location = None;
        writer.log_sample(&state).unwrap();
        assert!(writer.buffer.is_empty());
    }

    #[test]
    fn test_log_sample_carries_last_fix_forward() {
        let mut writer = test_writer();
        writer.log_sample(&fix_state(10, 0, 0)).unwrap();

        let mut lost = fix_state(10, 0, 1);
        lost.location = None;
        lost.gps_altitude = None;
        writer.log_sample(&lost).unwrap();

        let lines = buffered(&writer);
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("B100000"));
        assert!(lines[0].contains('A'), "first fix is valid");
        // Second record reuses the location but is marked invalid
        assert!(lines[1].starts_with("B100001"));
        assert_eq!(&lines[1][7..24], &lines[0][7..24]);
        assert_eq!(&lines[1][24..25], "V");
    }

    #[test]
    fn test_log_sample_prefers_baro_altitude() {
        let mut writer = test_writer();
        writer.log_sample(&fix_state(10, 0, 0)).unwrap();
        let line = &buffered(&writer)[0];
        // Pressure altitude field is the baro source (1200), GPS is 1234
        assert_eq!(&line[25..30], "01200");
        assert_eq!(&line[30..35], "01234");

        let mut no_baro = fix_state(10, 0, 1);
        no_baro.baro_altitude = None;
        writer.log_sample(&no_baro).unwrap();
        let line = &buffered(&writer)[1];
        assert_eq!(&line[25..30], "01234", "falls back to GPS altitude");
    }

    #[test]
    fn test_log_sample_emits_f_record_once_available() {
        let mut writer = test_writer();
        let mut state = fix_state(10, 0, 0);
        state.satellite_ids = vec![2, 5];
        writer.log_sample(&state).unwrap();

        let lines = buffered(&writer);
        assert_eq!(lines[0], "F1000000205");
        assert!(lines[1].starts_with('B'));
    }

    #[test]
    fn test_simulated_sample_latches_simulator_mode() {
        let mut writer = test_writer();
        assert!(!writer.is_simulator());

        let mut state = fix_state(10, 0, 0);
        state.real = false;
        state.satellite_ids = vec![1, 2];
        writer.log_sample(&state).unwrap();

        assert!(writer.is_simulator());
        assert!(writer.grecord.is_none());
        // No F record in simulator mode
        assert!(buffered(&writer)[0].starts_with('B'));

        // Once set, never unset
        writer.log_sample(&fix_state(10, 0, 1)).unwrap();
        assert!(writer.is_simulator());
    }

    #[test]
    fn test_event_followed_by_fix() {
        let mut writer = test_writer();
        writer.log_event(&fix_state(11, 30, 0), "PEV").unwrap();

        let lines = buffered(&writer);
        assert_eq!(lines[0], "E113000PEV");
        assert!(lines[1].starts_with("B113000"));
    }

    #[test]
    fn test_flush_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("flight.igc");
        let mut writer = IgcWriter::new(&path, &ground_state());

        writer.write_header(&header()).unwrap();
        writer.log_sample(&fix_state(10, 0, 0)).unwrap();
        let expected = buffered(&writer);
        writer.flush().unwrap();
        assert!(writer.buffer.is_empty());

        let content = std::fs::read_to_string(&path).unwrap();
        let on_disk: Vec<&str> = content.lines().collect();
        assert_eq!(on_disk, expected);
    }

    #[test]
    fn test_flush_failure_keeps_buffer() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("flight.igc");
        let mut writer = IgcWriter::new(&path, &ground_state());

        writer.logger_note("hello").unwrap();
        assert!(writer.flush().is_err());
        assert_eq!(writer.buffer.len(), 1, "buffer kept for retry");
    }

    #[test]
    fn test_empty_flush_is_ok() {
        let mut writer = test_writer();
        assert!(writer.flush().is_ok());
    }

    #[test]
    fn test_sign_fresh_file_is_valid() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("flight.igc");
        let mut writer = IgcWriter::new(&path, &ground_state());

        writer.write_header(&header()).unwrap();
        writer.log_sample(&fix_state(10, 0, 0)).unwrap();
        writer.finish(&fix_state(10, 0, 1)).unwrap();

        assert_eq!(writer.sign().unwrap(), SignOutcome::Valid);

        let content = std::fs::read_to_string(&path).unwrap();
        let last = content.lines().last().unwrap();
        assert!(last.starts_with('G'));
        assert_eq!(last.len(), 65, "G plus 64 hex digits");
    }

    #[test]
    fn test_sign_detects_corruption() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("flight.igc");
        let mut writer = IgcWriter::new(&path, &ground_state());

        writer.write_header(&header()).unwrap();
        writer.log_sample(&fix_state(10, 0, 0)).unwrap();
        writer.finish(&fix_state(10, 0, 1)).unwrap();

        // Corrupt one byte between flush and sign
        let mut bytes = std::fs::read(&path).unwrap();
        bytes[20] ^= 0x01;
        std::fs::write(&path, &bytes).unwrap();

        assert_eq!(writer.sign().unwrap(), SignOutcome::Tampered);

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().last().unwrap(), INVALID_DIGEST_RECORD);
    }

    #[test]
    fn test_sign_is_noop_in_simulator_mode() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("flight.igc");
        let sim = AircraftState {
            alive: true,
            real: false,
            ..Default::default()
        };
        let mut writer = IgcWriter::new(&path, &sim);

        writer.write_header(&header()).unwrap();
        writer.finish(&sim).unwrap();
        assert_eq!(writer.sign().unwrap(), SignOutcome::Simulator);

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(
            !content.lines().any(|l| l.starts_with('G')),
            "no security record in simulator mode"
        );
    }

    #[test]
    fn test_finish_latches_simulator_from_final_sample() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("flight.igc");
        let mut writer = IgcWriter::new(&path, &ground_state());

        writer.log_sample(&fix_state(10, 0, 0)).unwrap();
        let mut final_state = fix_state(10, 0, 1);
        final_state.real = false;
        writer.finish(&final_state).unwrap();

        assert_eq!(writer.sign().unwrap(), SignOutcome::Simulator);
    }

    #[test]
    fn test_write_line_flushes_full_buffer() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("flight.igc");
        let mut writer = IgcWriter::new(&path, &ground_state());

        // More notes than the buffer holds; the implicit flush must kick in
        for i in 0..100 {
            writer.logger_note(&format!("note {}", i)).unwrap();
        }
        writer.flush().unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 100);
    }
}
