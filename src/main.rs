use std::process;
use std::sync::atomic::AtomicBool;
use std::sync::mpsc;

use log::{error, info};

use tecs_autopilot::config::{AutopilotConfig, LongitudinalLaw};
use tecs_autopilot::gnc::FlightMode;
use tecs_autopilot::history::FlightHistory;
use tecs_autopilot::io::{csv, FlightSummary};
use tecs_autopilot::runtime::{spawn_console_input, ControlLoop};
use tecs_autopilot::sim::{ModelPlant, PlantConfig};

const USAGE: &str = "usage: tecs-autopilot [CONFIG.json] [--ticks N] [--tecs | --cascaded] [--csv PATH]";

struct Args {
    config: Option<String>,
    ticks: u64,
    law: Option<LongitudinalLaw>,
    csv: Option<String>,
}

fn parse_args() -> Result<Args, String> {
    let mut args = Args { config: None, ticks: 1200, law: None, csv: None };
    let mut it = std::env::args().skip(1);
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--ticks" => {
                let n = it.next().ok_or("--ticks needs a value")?;
                args.ticks = n.parse().map_err(|_| format!("bad tick count {n:?}"))?;
            }
            "--tecs" => args.law = Some(LongitudinalLaw::TotalEnergy),
            "--cascaded" => args.law = Some(LongitudinalLaw::Cascaded),
            "--csv" => args.csv = Some(it.next().ok_or("--csv needs a path")?),
            "-h" | "--help" => return Err(USAGE.to_string()),
            _ if arg.starts_with('-') => return Err(format!("unknown option {arg}\n{USAGE}")),
            _ => args.config = Some(arg),
        }
    }
    Ok(args)
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = match parse_args() {
        Ok(a) => a,
        Err(msg) => {
            eprintln!("{msg}");
            process::exit(2);
        }
    };

    let mut config = match &args.config {
        Some(path) => match AutopilotConfig::load(path) {
            Ok(c) => c,
            Err(e) => {
                error!("{}: {}", path, e);
                process::exit(1);
            }
        },
        // The energy law is the one that reaches the pattern altitudes
        None => AutopilotConfig {
            longitudinal_law: LongitudinalLaw::TotalEnergy,
            ..Default::default()
        },
    };
    if let Some(law) = args.law {
        config.longitudinal_law = law;
    }

    // -----------------------------------------------------------------------
    // Plant: trimmed just after liftoff, lined up with the runway
    // -----------------------------------------------------------------------
    let plant_config = PlantConfig { dt: config.loop_cfg.dt, ..Default::default() };
    let plant = match ModelPlant::trimmed(
        plant_config,
        config.modes.climb_speed_kt,
        400.0,
        config.modes.runway_heading_deg,
    ) {
        Ok(p) => p,
        Err(e) => {
            error!("cannot trim the plant: {}", e);
            process::exit(1);
        }
    };

    let history = FlightHistory::new(config.loop_cfg.history_len);
    let mut control = ControlLoop::new(&config, FlightMode::Climb, plant, history)
        .with_tick_limit(args.ticks);

    let (tx, rx) = mpsc::channel();
    let _console = spawn_console_input(tx);
    let shutdown = AtomicBool::new(false);

    info!(
        "running {} ticks at dt = {} s, longitudinal law {:?}",
        args.ticks, config.loop_cfg.dt, config.longitudinal_law
    );

    let run = match control.run(&shutdown, &rx) {
        Ok(r) => r,
        Err(e) => {
            error!("control loop aborted: {}", e);
            process::exit(1);
        }
    };

    let summary = FlightSummary::from_run(&run, control.sink());
    let plant = control.link().state();

    // -----------------------------------------------------------------------
    // Report
    // -----------------------------------------------------------------------
    println!();
    println!("====================================================================");
    println!("  Closed-loop pattern flight");
    println!("====================================================================");
    println!(
        "  Ticks:         {:>8}       Skipped:      {:>8}",
        summary.ticks, summary.skipped_ticks
    );
    println!("  Final mode:    {}", run.final_mode);
    println!(
        "  Altitude:      {:>8.1} ft    Heading:      {:>8.1} deg",
        plant.altitude_ft, plant.heading_deg
    );
    println!(
        "  Max altitude:  {:>8.1} ft    Max bank:     {:>8.1} deg",
        summary.max_altitude_ft, summary.max_bank_deg
    );
    println!("  Alt RMS error: {:>8.1} ft (last {} samples)", summary.altitude_rms_error_ft, summary.samples);
    println!();

    println!("  Recent history");
    println!("  ──────────────────────────────────────────────────────────────────");
    println!(
        "  {:>6}  {:>8}  {:>8}  {:>7}  {:>7}  {:>7}  {:>7}",
        "index", "alt", "alt_sp", "kt", "kt_sp", "hdg", "hdg_sp"
    );
    println!("  {}", "─".repeat(60));
    let every = (control.sink().len() / 15).max(1);
    for (i, s) in control.sink().iter().step_by(every) {
        println!(
            "  {:>6}  {:>8.1}  {:>8.1}  {:>7.1}  {:>7.1}  {:>7.1}  {:>7.1}",
            i, s.altitude, s.altitude_sp, s.airspeed, s.airspeed_sp, s.heading, s.heading_sp
        );
    }
    println!("====================================================================");

    if let Some(path) = args.csv {
        match csv::write_history_file(&path, control.sink()) {
            Ok(()) => info!("history written to {}", path),
            Err(e) => error!("cannot write {}: {}", path, e),
        }
    }
}
