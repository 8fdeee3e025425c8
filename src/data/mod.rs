//! Data sources: the seeded synthetic dataset generator.

pub mod sample;

pub use sample::*;
