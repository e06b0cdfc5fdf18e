//! Deterministic simulation module
//!
//! All gameplay logic lives here. Given the same level, seed, script and input
//! sequence a run plays out identically:
//! - Fixed timestep only
//! - Seeded RNG only
//! - No rendering or platform dependencies

pub mod collision;
pub mod difficulty;
pub mod events;
pub mod message;
pub mod pulse;
pub mod state;
pub mod status;
pub mod tick;
pub mod timeline;
pub mod wall;

pub use collision::{CollisionCheck, CollisionResult, SectorCollision};
pub use difficulty::Effective;
pub use events::{LevelEvent, TimedEvent, ValueOp};
pub use message::MessageTimeline;
pub use state::RunState;
pub use status::HexagonGameStatus;
pub use tick::{TickContext, TickInput, TickOutcome, tick};
pub use timeline::{Timeline, TimelineAction, Timelines};
pub use wall::{Player, SideGeometry, Wall};
