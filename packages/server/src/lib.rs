// Channel Job Harvester - Server
//
// Wires the harvester core to environment configuration, a periodic
// scheduler and an HTTP control surface.

pub mod config;
pub mod kernel;
pub mod server;

pub use config::*;
