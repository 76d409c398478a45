//! Fixed timestep simulation tick
//!
//! Advances one game state by exactly one search frame. Only the gap
//! randomization draws from the state's RNG, so a tick is reproducible from
//! any cloned state.

use super::collision::closest_threat;
use super::state::GameState;
use crate::config::Config;

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickInput {
    /// Flap: replace the bird's velocity with the jump velocity
    pub ascend: bool,
}

impl TickInput {
    pub fn ascend() -> Self {
        Self { ascend: true }
    }
}

/// Advance the game state by one fixed timestep
///
/// A dead bird is final: ticking a state whose bird already died leaves it
/// untouched.
pub fn tick(state: &mut GameState, input: &TickInput, config: &Config) {
    if state.bird.dead {
        return;
    }

    state.time_ticks += 1;
    let dt = state.time_step;

    if input.ascend {
        state.bird.jump(config.bird.jump_velocity);
    }

    // Scroll the world left
    let dx = state.scroll_speed * dt;
    state.ground_offset = (state.ground_offset - dx) % config.world.floor_tile_width;
    scroll_pipes(state, dx, config);

    // Nearest obstacle decides life or death
    let threat = closest_threat(state.bird.center(), state.obstacles(config));
    if threat.distance < config.bird.death_distance {
        state.bird.dead = true;
        return;
    }
    state.bird.threat = threat;

    let limits = &config.bird;
    let bird = &mut state.bird;

    // Out of bounds: pin to the edge and stop
    if bird.y() < limits.min_y {
        bird.body.pos.y = limits.min_y;
        bird.velocity = 0.0;
        return;
    }
    if bird.y() > limits.max_y {
        bird.body.pos.y = limits.max_y;
        bird.velocity = 0.0;
        return;
    }

    bird.velocity =
        (bird.velocity + limits.gravity * dt).clamp(limits.min_velocity, limits.max_velocity);
    bird.body.pos.y += bird.velocity * dt;
}

/// Clone `state` and advance the copy, leaving the original untouched
pub fn advance(state: &GameState, ascend: bool, config: &Config) -> GameState {
    let mut next = state.clone();
    tick(&mut next, &TickInput { ascend }, config);
    next
}

/// Move pipes left, count passes, and respawn pipes that left the screen
fn scroll_pipes(state: &mut GameState, dx: f32, config: &Config) {
    let bird_x = state.bird.body.pos.x;
    let pipes = &config.pipes;

    for pair in &mut state.pipes {
        pair.x -= dx;

        // Trailing edge is behind the bird
        if pair.x + pipes.width < bird_x && !pair.passed {
            pair.passed = true;
            state.pass_count += 1;
        }

        if pair.x < pipes.trash_x {
            pair.x = pipes.spawn_x;
            pair.randomize_gap(&mut state.rng, &config.world, pipes);
            pair.passed = false;
        }
    }
}
