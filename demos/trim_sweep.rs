use tecs_autopilot::dynamics::state::{IDX_ALPHA, IDX_ELEVATOR, IDX_THROTTLE};
use tecs_autopilot::dynamics::{linearize, trim_level_flight, AircraftParams};
use tecs_autopilot::io::csv;
use tecs_autopilot::sim::{simulate, SimConfig};

fn main() {
    let params = AircraftParams::cessna_172();

    println!("  Level-flight trim");
    println!("  ──────────────────────────────────────────────────────────────────");
    println!(
        "  {:>7}  {:>9}  {:>9}  {:>8}  {:>5}  {:>22}",
        "V(ft/s)", "alpha(deg)", "elev(deg)", "power(hp)", "iter", "short-period poles"
    );
    for v in [110.0, 130.0, 160.0, 190.0, 220.0] {
        let trim = match trim_level_flight(v, &params) {
            Ok(t) => t,
            Err(e) => {
                println!("  {:>7.0}  {}", v, e);
                continue;
            }
        };
        let poles = match linearize(&trim.state, &trim.controls, &params) {
            Ok((a, _)) => a.complex_eigenvalues(),
            Err(e) => {
                println!("  {:>7.0}  {}", v, e);
                continue;
            }
        };
        // Fastest pair is the short period
        let sp = poles.iter().max_by(|a, b| a.norm().total_cmp(&b.norm()));
        println!(
            "  {:>7.0}  {:>9.2}  {:>9.2}  {:>8.1}  {:>5}  {:>22}",
            v,
            trim.state[IDX_ALPHA].to_degrees(),
            trim.controls[IDX_ELEVATOR].to_degrees(),
            trim.controls[IDX_THROTTLE],
            trim.iterations,
            sp.map_or(String::from("-"), |p| format!("{:.2} ± {:.2}i", p.re, p.im.abs())),
        );
    }
    println!();

    // Elevator doublet from trim at 160 ft/s
    let trim = match trim_level_flight(160.0, &params) {
        Ok(t) => t,
        Err(e) => {
            eprintln!("trim failed: {e}");
            return;
        }
    };
    let config = SimConfig { dt: 0.01, max_time: 30.0 };
    let doublet = 2f64.to_radians();
    let trajectory = match simulate(trim.state, &params, &config, |t, _| {
        let mut u = trim.controls;
        if (1.0..2.0).contains(&t) {
            u[IDX_ELEVATOR] += doublet;
        } else if (2.0..3.0).contains(&t) {
            u[IDX_ELEVATOR] -= doublet;
        }
        u
    }) {
        Ok(t) => t,
        Err(e) => {
            eprintln!("simulation failed: {e}");
            return;
        }
    };

    let path = "doublet.csv";
    match csv::write_trajectory_file(path, &trajectory) {
        Ok(()) => println!("  Doublet response ({} points) written to {}", trajectory.len(), path),
        Err(e) => eprintln!("cannot write {path}: {e}"),
    }
}
