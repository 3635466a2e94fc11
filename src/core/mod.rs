pub mod buffer;
pub mod config;
pub mod errors;
pub mod event_scheduler;
pub mod inspector;
pub mod pool;
pub mod process;
pub mod report;
pub mod simulation_engine;
pub mod topology;
pub mod types;
pub mod workstation;
