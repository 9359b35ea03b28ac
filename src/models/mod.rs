//! Core data models for cogsynth.

mod config;
mod error;
mod sample;

pub use config::*;
pub use error::*;
pub use sample::*;
