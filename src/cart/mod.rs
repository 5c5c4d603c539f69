//! The cart engine: pure transitions plus snapshot encoding for persistence.

pub mod logic;
pub mod snapshot;

pub use logic::*;
