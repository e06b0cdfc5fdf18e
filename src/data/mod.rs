//! Static per-level parameter sets
//!
//! Loaded once per run by the asset collaborator. `LevelData` is copied into the
//! run and mutated in place through validated setters; style and music data stay
//! read-only during the loop.

pub mod level;
pub mod music;
pub mod style;

pub use level::{LevelData, LevelValueError};
pub use music::MusicData;
pub use style::{Color, StyleData};
