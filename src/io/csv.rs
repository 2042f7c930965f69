use std::io::{self, Write};
use std::path::Path;

use crate::dynamics::state::{IDX_ALPHA, IDX_ELEVATOR, IDX_Q, IDX_THETA, IDX_THROTTLE, IDX_V};
use crate::history::FlightHistory;
use crate::sim::TrajectoryPoint;

/// Write the recorded control history as CSV.
///
/// Columns: index, roll, roll_sp, pitch, pitch_sp, heading, heading_sp,
///          altitude, altitude_sp, airspeed, airspeed_sp
pub fn write_history<W: Write>(writer: &mut W, history: &FlightHistory) -> io::Result<()> {
    writeln!(
        writer,
        "index,roll,roll_sp,pitch,pitch_sp,heading,heading_sp,\
         altitude,altitude_sp,airspeed,airspeed_sp"
    )?;

    for (i, s) in history.iter() {
        writeln!(
            writer,
            "{},{:.3},{:.3},{:.3},{:.3},{:.2},{:.2},{:.2},{:.2},{:.2},{:.2}",
            i,
            s.roll, s.roll_sp,
            s.pitch, s.pitch_sp,
            s.heading, s.heading_sp,
            s.altitude, s.altitude_sp,
            s.airspeed, s.airspeed_sp,
        )?;
    }

    Ok(())
}

/// Write a longitudinal model trajectory as CSV.
///
/// Columns: time, v_fps, alpha_deg, theta_deg, q_dps, throttle_hp,
///          elevator_deg, gamma_deg
pub fn write_trajectory<W: Write>(writer: &mut W, trajectory: &[TrajectoryPoint]) -> io::Result<()> {
    writeln!(
        writer,
        "time,v_fps,alpha_deg,theta_deg,q_dps,throttle_hp,elevator_deg,gamma_deg"
    )?;

    for p in trajectory {
        writeln!(
            writer,
            "{:.4},{:.4},{:.4},{:.4},{:.4},{:.3},{:.4},{:.4}",
            p.time,
            p.state[IDX_V],
            p.state[IDX_ALPHA].to_degrees(),
            p.state[IDX_THETA].to_degrees(),
            p.state[IDX_Q].to_degrees(),
            p.controls[IDX_THROTTLE],
            p.controls[IDX_ELEVATOR].to_degrees(),
            p.outputs[1].to_degrees(),
        )?;
    }

    Ok(())
}

pub fn write_history_file(path: impl AsRef<Path>, history: &FlightHistory) -> io::Result<()> {
    let mut file = std::fs::File::create(path)?;
    write_history(&mut file, history)
}

pub fn write_trajectory_file(path: impl AsRef<Path>, trajectory: &[TrajectoryPoint]) -> io::Result<()> {
    let mut file = std::fs::File::create(path)?;
    write_trajectory(&mut file, trajectory)
}
