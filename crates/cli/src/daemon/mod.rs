//! Daemon orchestration - wires all pipeline components together

mod orchestrator;

pub use orchestrator::run_daemon;
