pub mod config;
pub mod driver;
pub mod engine;
pub mod simulation;

pub use config::*;
pub use driver::{DriverSettings, SimulationDriver};
pub use engine::{Engine, TickEngine};
pub use simulation::*;
