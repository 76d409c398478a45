//! Branch scoring
//!
//! Higher scores are better. The search only compares the two surviving
//! children of one node, so scores need no absolute meaning.

use crate::config::{Config, ScoringPolicy};
use crate::sim::GameState;

/// Ranks a simulated state for the search
pub trait Scorer {
    fn score(&self, state: &GameState, config: &Config) -> f32;
}

impl Scorer for ScoringPolicy {
    fn score(&self, state: &GameState, config: &Config) -> f32 {
        let threat = state.bird.threat.distance;
        match self {
            ScoringPolicy::Threat => threat,
            ScoringPolicy::Center => threat - (state.bird.y() - config.world.middle_y()).abs(),
        }
    }
}

/// Any plain function of the state, e.g. a learned decision model
impl<F> Scorer for F
where
    F: Fn(&GameState) -> f32,
{
    fn score(&self, state: &GameState, _config: &Config) -> f32 {
        self(state)
    }
}
