//! Pipeline module - verified reasoning-trace dataset generation.

mod generator;
mod sink;

pub use generator::*;
pub use sink::*;
