//! Error types for the navigation engine

use crate::grid::Cell;
use thiserror::Error;

/// Errors surfaced by the controller and its collaborators
#[derive(Error, Debug)]
pub enum NavError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Simulator closed the connection")]
    Disconnected,

    #[error("Invalid maze: {0}")]
    InvalidMaze(String),

    #[error("No known route from ({}, {})", .cell.x, .cell.y)]
    NoRoute { cell: Cell },

    #[error("Step limit of {0} reached before the run finished")]
    StepLimit(usize),
}

pub type Result<T> = std::result::Result<T, NavError>;
