//! # Run telemetry and events

// -----------------------------------------------------------------------------------------------
// IMPORTS
// -----------------------------------------------------------------------------------------------

use log::info;
use serde::{Deserialize, Serialize};
use std::fmt;

use util::{
    archive::{ArchiveError, Archiver},
    session::Session,
};

// -----------------------------------------------------------------------------------------------
// STRUCTS
// -----------------------------------------------------------------------------------------------

/// One telemetry sample. Flat so it can be written as a CSV row.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq)]
pub struct TmRecord {
    /// Time since the start of the run
    pub time_s: f64,

    pub x_mm: f64,
    pub y_mm: f64,
    pub heading_deg: f64,
    pub distance_mm: f64,

    pub speed_dem_mms: f64,
    pub heading_dem_deg: f64,
    pub curvature_dem_mm: f64,

    pub drift_rate_dps: f64,
    pub target_distance_mm: f64,
    pub bonus_gap_m: f64,
}

/// A run event with the time it happened.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct EventRecord {
    /// Time since the start of the run
    pub time_s: f64,
    pub event: RunEvent,
}

/// CSV archives for a run. Each archive is optional so a run can go without any.
#[derive(Default)]
pub struct RunArchive {
    tm: Option<Archiver>,
    events: Option<Archiver>,
}

// -----------------------------------------------------------------------------------------------
// ENUMS
// -----------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RunEvent {
    /// Controllers built, the vehicle is about to start
    Ready,

    /// Control loop started
    Start,

    StallDetected,

    TimeoutGuard,

    /// The run has ended, for any reason
    Complete,
}

// -----------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// -----------------------------------------------------------------------------------------------

impl fmt::Display for RunEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunEvent::Ready => "ready",
            RunEvent::Start => "start",
            RunEvent::StallDetected => "stall_detected",
            RunEvent::TimeoutGuard => "timeout_guard",
            RunEvent::Complete => "complete",
        };
        write!(f, "{}", name)
    }
}

impl RunArchive {
    /// Archive to `run_mgr/telemetry.csv` and `run_mgr/events.csv` in the session.
    pub fn new(session: &Session) -> Result<Self, ArchiveError> {
        Ok(Self {
            tm: Some(Archiver::from_path(session, "run_mgr/telemetry.csv")?),
            events: Some(Archiver::from_path(session, "run_mgr/events.csv")?),
        })
    }

    /// An archive which discards everything.
    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn write_tm(&mut self, record: &TmRecord) -> Result<(), ArchiveError> {
        match self.tm {
            Some(ref mut a) => a.serialise(record),
            None => Ok(()),
        }
    }

    pub fn write_event(&mut self, record: &EventRecord) -> Result<(), ArchiveError> {
        info!("Run event: {} at {:.3} s", record.event, record.time_s);

        match self.events {
            Some(ref mut a) => a.serialise(record),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_names() {
        assert_eq!(
            serde_json::to_string(&RunEvent::StallDetected).unwrap(),
            "\"stall_detected\""
        );
        assert_eq!(RunEvent::TimeoutGuard.to_string(), "timeout_guard");
    }

    #[test]
    fn test_disabled_archive() {
        let mut archive = RunArchive::disabled();
        assert!(archive.write_tm(&TmRecord::default()).is_ok());
        assert!(archive
            .write_event(&EventRecord {
                time_s: 0.0,
                event: RunEvent::Ready
            })
            .is_ok());
    }
}
