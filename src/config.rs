//! Game and search configuration
//!
//! Loaded once from JSON (or defaulted) and validated before any simulation
//! runs. The simulation and search assume a validated configuration.

use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::ConfigError;

/// How the search ranks two surviving branches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ScoringPolicy {
    /// Distance to the nearest obstacle edge
    ///
    /// Siblings always record the same threat, so ties fall.
    Threat,
    /// Threat distance minus the bird's distance from the vertical middle
    #[default]
    Center,
}

impl ScoringPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScoringPolicy::Threat => "threat",
            ScoringPolicy::Center => "center",
        }
    }
}

impl FromStr for ScoringPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "threat" | "distance" => Ok(ScoringPolicy::Threat),
            "center" | "centre" | "middle" => Ok(ScoringPolicy::Center),
            other => Err(ConfigError::invalid(format!(
                "unknown scoring policy '{other}' (expected threat or center)"
            ))),
        }
    }
}

/// Screen and scrolling parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    pub width: f32,
    pub height: f32,
    /// Top edge of the floor
    pub floor_y: f32,
    pub floor_tile_width: f32,
    pub floor_tile_height: f32,
    /// Horizontal speed of pipes and floor (pixels/s)
    pub scroll_speed: f32,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            width: WORLD_WIDTH,
            height: WORLD_HEIGHT,
            floor_y: FLOOR_Y,
            floor_tile_width: FLOOR_TILE_WIDTH,
            floor_tile_height: FLOOR_TILE_HEIGHT,
            scroll_speed: SCROLL_SPEED,
        }
    }
}

impl WorldConfig {
    /// Vertical middle of the screen
    pub fn middle_y(&self) -> f32 {
        self.height / 2.0
    }
}

/// Bird size, bounds and physics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BirdConfig {
    /// Fixed left edge
    pub x: f32,
    pub start_y: f32,
    pub width: f32,
    pub height: f32,
    pub min_y: f32,
    pub max_y: f32,
    pub gravity: f32,
    pub jump_velocity: f32,
    pub min_velocity: f32,
    pub max_velocity: f32,
    /// The bird dies when an obstacle edge is closer than this
    pub death_distance: f32,
}

impl Default for BirdConfig {
    fn default() -> Self {
        Self {
            x: BIRD_X,
            start_y: BIRD_START_Y,
            width: BIRD_WIDTH,
            height: BIRD_HEIGHT,
            min_y: BIRD_MIN_Y,
            max_y: BIRD_MAX_Y,
            gravity: GRAVITY,
            jump_velocity: JUMP_VELOCITY,
            min_velocity: MIN_VELOCITY,
            max_velocity: MAX_VELOCITY,
            death_distance: BIRD_DEATH_DISTANCE,
        }
    }
}

/// Pipe geometry, gap randomization and scrolling bounds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipeConfig {
    pub width: f32,
    pub height: f32,
    pub gap_min: f32,
    pub gap_max: f32,
    /// Smallest distance from the screen top to the gap
    pub top_margin: f32,
    /// Smallest distance from the screen bottom to the gap
    pub bottom_margin: f32,
    pub spawn_x: f32,
    pub trash_x: f32,
    /// Left edges of the pipe pairs at the start of a run
    pub initial_x: Vec<f32>,
}

impl Default for PipeConfig {
    fn default() -> Self {
        let first = PIPE_TRASH_X + WORLD_WIDTH;
        Self {
            width: PIPE_WIDTH,
            height: PIPE_HEIGHT,
            gap_min: GAP_MIN,
            gap_max: GAP_MAX,
            top_margin: PIPE_TOP_MARGIN,
            bottom_margin: PIPE_BOTTOM_MARGIN,
            spawn_x: PIPE_SPAWN_X,
            trash_x: PIPE_TRASH_X,
            initial_x: vec![first, first * 1.4, first * 1.8],
        }
    }
}

/// Lookahead search parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Fixed simulated frame duration (seconds)
    pub time_step: f32,
    /// Maximum path length, root included
    pub depth_limit: usize,
    pub scoring: ScoringPolicy,
    /// Preview samples per simulated second
    pub preview_rate: f32,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            time_step: SEARCH_DT,
            depth_limit: SEARCH_DEPTH,
            scoring: ScoringPolicy::default(),
            preview_rate: PREVIEW_RATE,
        }
    }
}

impl SearchConfig {
    /// Path stride between preview samples (at least 1)
    pub fn preview_step(&self) -> usize {
        ((1.0 / self.time_step) / self.preview_rate).max(1.0) as usize
    }
}

/// Complete configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub world: WorldConfig,
    pub bird: BirdConfig,
    pub pipes: PipeConfig,
    pub search: SearchConfig,
}

impl Config {
    /// Parse and validate a JSON configuration
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON configuration file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_json(&json)?;
        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Reject parameters that would make the simulation degenerate
    pub fn validate(&self) -> Result<(), ConfigError> {
        let Config {
            world,
            bird,
            pipes,
            search,
        } = self;

        if !(search.time_step > 0.0) {
            return Err(ConfigError::invalid(format!(
                "time_step must be positive, got {}",
                search.time_step
            )));
        }
        if search.depth_limit < 2 {
            return Err(ConfigError::invalid(format!(
                "depth_limit must be at least 2, got {}",
                search.depth_limit
            )));
        }
        if !(search.preview_rate > 0.0) {
            return Err(ConfigError::invalid("preview_rate must be positive"));
        }
        if !(world.scroll_speed > 0.0) {
            return Err(ConfigError::invalid("scroll_speed must be positive"));
        }
        if !(world.floor_tile_width > 0.0) || !(world.floor_tile_height > 0.0) {
            return Err(ConfigError::invalid("floor tile size must be positive"));
        }
        if !(pipes.width > 0.0) || !(pipes.height > 0.0) {
            return Err(ConfigError::invalid("pipe size must be positive"));
        }
        if pipes.gap_min >= pipes.gap_max {
            return Err(ConfigError::invalid(format!(
                "gap_min ({}) must be below gap_max ({})",
                pipes.gap_min, pipes.gap_max
            )));
        }
        // The tallest gap must still leave room to place it
        let lowest_gap_top = world.height - pipes.bottom_margin - pipes.gap_max;
        if pipes.top_margin >= lowest_gap_top {
            return Err(ConfigError::invalid(format!(
                "gap offset range is empty: top_margin {} >= {}",
                pipes.top_margin, lowest_gap_top
            )));
        }
        if pipes.spawn_x <= pipes.trash_x {
            return Err(ConfigError::invalid("spawn_x must lie right of trash_x"));
        }
        if pipes.initial_x.is_empty() {
            return Err(ConfigError::invalid("at least one pipe pair is required"));
        }
        if bird.min_y >= bird.max_y {
            return Err(ConfigError::invalid(format!(
                "bird min_y ({}) must be below max_y ({})",
                bird.min_y, bird.max_y
            )));
        }
        if bird.min_velocity > bird.max_velocity {
            return Err(ConfigError::invalid(
                "bird min_velocity must not exceed max_velocity",
            ));
        }
        if bird.death_distance < 0.0 {
            return Err(ConfigError::invalid("death_distance must not be negative"));
        }

        Ok(())
    }
}
