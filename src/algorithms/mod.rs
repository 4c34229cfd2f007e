pub mod common;
pub mod flood_fill;
pub mod goals;
