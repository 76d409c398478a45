//! Flappy Lookahead - a side-scrolling bird game played by a lookahead search
//!
//! Core modules:
//! - `sim`: Deterministic simulation (physics, collisions, game state)
//! - `search`: Depth-first lookahead tree that picks the bird's next move
//! - `driver`: Frame loop that commits one searched frame at a time
//! - `config`: Data-driven game and search parameters

pub mod config;
pub mod driver;
pub mod error;
pub mod search;
pub mod sim;

pub use config::{Config, ScoringPolicy};
pub use error::ConfigError;
pub use search::{SearchOutcome, SearchTree};
pub use sim::{GameState, TickInput, advance, tick};

/// Default game constants
pub mod consts {
    /// Simulated frame duration used by the search (seconds)
    pub const SEARCH_DT: f32 = 0.06;
    /// Frames the search projects into the future
    pub const SEARCH_DEPTH: usize = 40;
    /// How often per second the lookahead preview samples the path
    pub const PREVIEW_RATE: f32 = 4.0;

    /// World dimensions
    pub const WORLD_WIDTH: f32 = 600.0;
    pub const WORLD_HEIGHT: f32 = 500.0;
    pub const FLOOR_Y: f32 = WORLD_HEIGHT - 50.0;

    /// Floor tile size (the floor scrolls by whole tiles)
    pub const FLOOR_TILE_WIDTH: f32 = 336.0;
    pub const FLOOR_TILE_HEIGHT: f32 = 112.0;

    /// Horizontal scroll speed of pipes and floor (pixels/s)
    pub const SCROLL_SPEED: f32 = 100.0;

    /// Pipe sprite size
    pub const PIPE_WIDTH: f32 = 52.0;
    pub const PIPE_HEIGHT: f32 = 320.0;
    /// Smallest distance from the top of the screen to the gap
    pub const PIPE_TOP_MARGIN: f32 = 25.0;
    /// Smallest distance from the bottom of the screen to the gap
    pub const PIPE_BOTTOM_MARGIN: f32 = 75.0;
    /// Gap height bounds
    pub const GAP_MIN: f32 = 125.0;
    pub const GAP_MAX: f32 = 250.0;
    /// Pipes that scroll past the trash line respawn here
    pub const PIPE_SPAWN_X: f32 = WORLD_WIDTH;
    pub const PIPE_TRASH_X: f32 = -PIPE_WIDTH;

    /// Bird sprite size and fixed horizontal position
    pub const BIRD_WIDTH: f32 = 32.0;
    pub const BIRD_HEIGHT: f32 = 24.0;
    pub const BIRD_X: f32 = 50.0;
    pub const BIRD_START_Y: f32 = BIRD_HEIGHT;
    /// Vertical bounds of the bird's top edge
    pub const BIRD_MIN_Y: f32 = 25.0;
    pub const BIRD_MAX_Y: f32 = FLOOR_Y;
    /// Distance from any obstacle at which the bird dies
    pub const BIRD_DEATH_DISTANCE: f32 = BIRD_WIDTH / 1.9;

    /// Bird physics (y grows downward)
    pub const GRAVITY: f32 = 1600.0;
    pub const JUMP_VELOCITY: f32 = -300.0;
    pub const MAX_VELOCITY: f32 = GRAVITY * 30.0;
    pub const MIN_VELOCITY: f32 = GRAVITY * -50.0;
}
