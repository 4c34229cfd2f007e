pub mod agent;
pub mod algorithms;
pub mod batch_simulation;
pub mod config;
pub mod error;
pub mod grid;
pub mod navigation;
pub mod protocol;
pub mod simulation;
pub mod statistics;
