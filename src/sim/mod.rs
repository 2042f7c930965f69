pub mod integrator;
pub mod plant;
pub mod runner;

pub use integrator::{rk4, rk4_step};
pub use plant::{ModelPlant, PlantConfig, PlantState};
pub use runner::{simulate, SimConfig, TrajectoryPoint};
