//! Game state and core simulation types
//!
//! A `GameState` is a plain value: the search clones it at every branch and
//! only ever mutates its own copy. The RNG lives inside the state so a clone
//! carries the exact same future gap draws.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::collision::Threat;
use super::rect::Rect;
use crate::config::{Config, PipeConfig, WorldConfig};

/// The controlled bird
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bird {
    /// Bounding box; x stays fixed, y moves
    pub body: Rect,
    /// Vertical velocity (positive is downward)
    pub velocity: f32,
    pub dead: bool,
    /// Nearest obstacle as of the last tick the bird survived
    pub threat: Threat,
}

impl Bird {
    pub fn new(config: &Config) -> Self {
        let bird = &config.bird;
        Self {
            body: Rect::new(bird.x, bird.start_y, bird.width, bird.height),
            velocity: 0.0,
            dead: false,
            threat: Threat::none(),
        }
    }

    /// Top edge
    #[inline]
    pub fn y(&self) -> f32 {
        self.body.pos.y
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        self.body.center()
    }

    /// Jump regardless of current velocity
    pub fn jump(&mut self, jump_velocity: f32) {
        self.velocity = jump_velocity;
    }
}

/// A top and bottom pipe sharing one x position, with a gap between them
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipePair {
    /// Left edge of both pipes
    pub x: f32,
    /// Bottom edge of the top pipe
    pub gap_top: f32,
    /// Top edge of the bottom pipe
    pub gap_bottom: f32,
    /// Whether the bird has cleared this pair since it last spawned
    pub passed: bool,
}

impl PipePair {
    /// Create a pair at `x` with a freshly drawn gap
    pub fn new(x: f32, rng: &mut Pcg32, world: &WorldConfig, pipes: &PipeConfig) -> Self {
        let mut pair = Self {
            x,
            gap_top: 0.0,
            gap_bottom: 0.0,
            passed: false,
        };
        pair.randomize_gap(rng, world, pipes);
        pair
    }

    /// Draw a new gap height and vertical offset
    pub fn randomize_gap(&mut self, rng: &mut Pcg32, world: &WorldConfig, pipes: &PipeConfig) {
        let gap = rng.random_range(pipes.gap_min..pipes.gap_max);
        // Lowest gap top that still shows the end of the bottom pipe
        let lowest = world.height - pipes.bottom_margin - gap;
        let top = rng.random_range(pipes.top_margin..lowest);
        self.gap_top = top;
        self.gap_bottom = top + gap;
    }

    /// Gap height
    #[inline]
    pub fn gap(&self) -> f32 {
        self.gap_bottom - self.gap_top
    }

    pub fn top_pipe(&self, pipes: &PipeConfig) -> Rect {
        Rect::new(self.x, self.gap_top - pipes.height, pipes.width, pipes.height)
    }

    pub fn bottom_pipe(&self, pipes: &PipeConfig) -> Rect {
        Rect::new(self.x, self.gap_bottom, pipes.width, pipes.height)
    }
}

/// Complete game state (deterministic, serializable)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    /// Run seed for reproducibility
    pub seed: u64,
    /// Gap randomization source, copied along with the state
    pub rng: Pcg32,
    /// Fixed simulated frame duration (seconds)
    pub time_step: f32,
    /// Simulation tick counter
    pub time_ticks: u64,
    pub bird: Bird,
    /// Pipe pairs, in spawn order
    pub pipes: Vec<PipePair>,
    /// Horizontal speed of pipes and floor (pixels/s)
    pub scroll_speed: f32,
    /// Pipe pairs cleared so far
    pub pass_count: u32,
    /// Floor scroll offset within one tile, in `(-tile_width, 0]`
    pub ground_offset: f32,
}

impl GameState {
    /// Create the initial state of a run with the given seed
    pub fn new(config: &Config, seed: u64) -> Self {
        let mut rng = Pcg32::seed_from_u64(seed);
        let pipes = config
            .pipes
            .initial_x
            .iter()
            .map(|&x| PipePair::new(x, &mut rng, &config.world, &config.pipes))
            .collect();

        Self {
            seed,
            rng,
            time_step: config.search.time_step,
            time_ticks: 0,
            bird: Bird::new(config),
            pipes,
            scroll_speed: config.world.scroll_speed,
            pass_count: 0,
            ground_offset: 0.0,
        }
    }

    /// The floor as a single obstacle wide enough to cover the screen
    pub fn floor(&self, world: &WorldConfig) -> Rect {
        Rect::new(
            self.ground_offset - world.floor_tile_width,
            world.floor_y,
            world.width + 2.0 * world.floor_tile_width,
            world.floor_tile_height,
        )
    }

    /// Every rectangle the bird can collide with
    pub fn obstacles<'a>(&'a self, config: &'a Config) -> impl Iterator<Item = Rect> + 'a {
        self.pipes
            .iter()
            .flat_map(move |p| [p.top_pipe(&config.pipes), p.bottom_pipe(&config.pipes)])
            .chain(std::iter::once(self.floor(&config.world)))
    }
}
