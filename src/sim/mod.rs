//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only, carried inside the state
//! - Stable iteration order (pipes in spawn order)
//! - No rendering or platform dependencies

pub mod collision;
pub mod rect;
pub mod state;
pub mod tick;

pub use collision::{Threat, closest_threat, nearest_edge};
pub use rect::Rect;
pub use state::{Bird, GameState, PipePair};
pub use tick::{TickInput, advance, tick};
