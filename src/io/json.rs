use std::io::Write;
use std::path::Path;

use serde::Serialize;

use crate::gnc::FlightMode;
use crate::history::FlightHistory;
use crate::runtime::RunSummary;

/// Summary statistics of a closed-loop run, computed from its history.
#[derive(Debug, Clone, Serialize)]
pub struct FlightSummary {
    pub ticks: u64,
    pub skipped_ticks: u64,
    pub final_mode: u8,
    pub samples: usize,
    pub max_altitude_ft: f64,
    pub max_airspeed_kt: f64,
    pub max_bank_deg: f64,
    /// RMS of altitude minus altitude setpoint over the retained samples.
    pub altitude_rms_error_ft: f64,
    pub final_altitude_ft: f64,
    pub final_heading_deg: f64,
}

impl FlightSummary {
    pub fn from_run(run: &RunSummary, history: &FlightHistory) -> Self {
        let samples: Vec<_> = history.iter().map(|(_, s)| *s).collect();
        let n = samples.len();

        let max_altitude_ft = samples.iter().map(|s| s.altitude).fold(f64::NEG_INFINITY, f64::max);
        let max_airspeed_kt = samples.iter().map(|s| s.airspeed).fold(f64::NEG_INFINITY, f64::max);
        let max_bank_deg = samples.iter().map(|s| s.roll.abs()).fold(0.0_f64, f64::max);
        let altitude_rms_error_ft = if n > 0 {
            (samples.iter().map(|s| (s.altitude - s.altitude_sp).powi(2)).sum::<f64>() / n as f64)
                .sqrt()
        } else {
            0.0
        };

        let last = history.latest().copied().unwrap_or_default();

        FlightSummary {
            ticks: run.ticks,
            skipped_ticks: run.skipped,
            final_mode: run.final_mode.number(),
            samples: n,
            max_altitude_ft: if n > 0 { max_altitude_ft } else { 0.0 },
            max_airspeed_kt: if n > 0 { max_airspeed_kt } else { 0.0 },
            max_bank_deg,
            altitude_rms_error_ft,
            final_altitude_ft: last.altitude,
            final_heading_deg: last.heading,
        }
    }

    pub fn final_mode(&self) -> Option<FlightMode> {
        FlightMode::from_number(self.final_mode)
    }
}

/// Write the summary as pretty JSON.
pub fn write_summary<W: Write>(writer: W, summary: &FlightSummary) -> serde_json::Result<()> {
    serde_json::to_writer_pretty(writer, summary)
}

pub fn write_summary_file(path: impl AsRef<Path>, summary: &FlightSummary) -> std::io::Result<()> {
    let file = std::fs::File::create(path)?;
    write_summary(file, summary).map_err(std::io::Error::from)
}
