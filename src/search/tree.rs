//! Depth-first lookahead tree
//!
//! The tree keeps one path from the committed frame (`root`) down to the
//! deepest frame found so far (`tail`). `search` extends the path greedily by
//! best child and backs out of dead ends; `proceed` commits the first step of
//! the path and releases everything that step made unreachable. Because the
//! path survives between frames, a steady-state frame costs one expansion.

use std::collections::VecDeque;

use glam::Vec2;
use serde::Serialize;

use super::node::{NodeArena, NodeId, SearchNode, SearchStats};
use super::score::Scorer;
use crate::config::{Config, ScoringPolicy};
use crate::sim::GameState;

/// Result of extending the path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchOutcome {
    /// The path reaches the depth limit
    Found,
    /// Every branch from the root dies within the depth limit
    Exhausted,
}

/// Projected bird position along the searched path
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PreviewPoint {
    /// Frames ahead of the committed frame
    pub frames_ahead: usize,
    /// Bird top-left corner, shifted right by the distance scrolled meanwhile
    pub pos: Vec2,
}

pub struct SearchTree<S = ScoringPolicy> {
    config: Config,
    scorer: S,
    arena: NodeArena,
    root: NodeId,
    tail: NodeId,
    path: VecDeque<NodeId>,
}

impl SearchTree<ScoringPolicy> {
    /// Tree scored by the configured policy
    pub fn new(config: Config, state: GameState) -> Self {
        let scorer = config.search.scoring;
        Self::with_scorer(config, state, scorer)
    }
}

impl<S: Scorer> SearchTree<S> {
    /// Tree scored by a custom scorer
    ///
    /// The state's time step is replaced by the configured search step, and
    /// every simulated descendant inherits it.
    pub fn with_scorer(config: Config, mut state: GameState, scorer: S) -> Self {
        state.time_step = config.search.time_step;
        let mut arena = NodeArena::new();
        let root = arena.insert_root(state);
        Self {
            config,
            scorer,
            arena,
            root,
            tail: root,
            path: VecDeque::from([root]),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    #[inline]
    pub fn root(&self) -> NodeId {
        self.root
    }

    #[inline]
    pub fn tail(&self) -> NodeId {
        self.tail
    }

    /// Nodes from root to tail
    pub fn path(&self) -> impl ExactSizeIterator<Item = NodeId> + '_ {
        self.path.iter().copied()
    }

    /// Current path length, root included
    #[inline]
    pub fn depth(&self) -> usize {
        self.path.len()
    }

    #[inline]
    pub fn depth_limit(&self) -> usize {
        self.config.search.depth_limit
    }

    pub fn node(&self, id: NodeId) -> &SearchNode {
        self.arena.node(id)
    }

    /// Whether a node is still held by the tree
    pub fn contains(&self, id: NodeId) -> bool {
        self.arena.contains(id)
    }

    /// The committed frame
    pub fn root_state(&self) -> &GameState {
        self.arena.node(self.root).state()
    }

    /// Simulated frames along the path, committed frame first
    pub fn path_states(&self) -> impl Iterator<Item = &GameState> + '_ {
        self.path.iter().map(|&id| self.arena.node(id).state())
    }

    pub fn arena(&self) -> &NodeArena {
        &self.arena
    }

    pub fn live_nodes(&self) -> usize {
        self.arena.len()
    }

    pub fn stats(&self) -> SearchStats {
        self.arena.stats()
    }

    /// True once the root has been expanded and no surviving branch is left
    pub fn is_exhausted(&self) -> bool {
        self.arena.is_terminal(self.root)
    }

    /// Extend the path until it reaches the depth limit
    ///
    /// Dead ends are discarded by climbing back to the nearest ancestor that
    /// still has an untried branch. Returns `Exhausted` once the root itself
    /// has none; the path is then just the root.
    pub fn search(&mut self) -> SearchOutcome {
        let before = self.arena.stats();
        let limit = self.config.search.depth_limit;

        while self.path.len() < limit {
            match self.arena.best_child(self.tail, &self.config, &self.scorer) {
                Some(next) => {
                    self.path.push_back(next);
                    self.tail = next;
                }
                None if self.tail == self.root => {
                    log::warn!(
                        "No surviving path within {} frames at tick {}",
                        limit,
                        self.root_state().time_ticks
                    );
                    return SearchOutcome::Exhausted;
                }
                None => self.climb(),
            }
        }

        let after = self.arena.stats();
        log::debug!(
            "search: {} expansions, {} climbs, {} live nodes",
            after.expansions - before.expansions,
            after.climbs - before.climbs,
            self.arena.len()
        );
        SearchOutcome::Found
    }

    /// Back out of the terminal tail, repeating while the new tail is terminal
    ///
    /// Stops at the root even if the root is terminal; `search` reports that.
    fn climb(&mut self) {
        loop {
            assert!(
                self.arena.is_terminal(self.tail),
                "climbing from non-terminal node {:?}",
                self.tail
            );
            let dead_end = self.tail;
            let parent = match self.arena.node(dead_end).parent() {
                Some(parent) => parent,
                None => panic!("climbing above the root {dead_end:?}"),
            };

            self.arena.dispose(dead_end);
            self.path.pop_back();
            self.arena.detach(parent, dead_end);
            self.tail = parent;
            self.arena.record_climb();

            if parent == self.root || !self.arena.is_terminal(parent) {
                break;
            }
        }
    }

    /// Commit the first step of the path and return its state
    ///
    /// Everything except the subtree of the new root is released. Panics if
    /// the path holds no frame beyond the root.
    pub fn proceed(&mut self) -> &GameState {
        assert!(
            self.path.len() >= 2,
            "proceed needs a searched frame beyond the root (path length {})",
            self.path.len()
        );
        let new_root = self.path[1];

        self.arena.detach(self.root, new_root);
        self.arena.dispose(self.root);
        self.arena.orphan(new_root);
        self.path.pop_front();
        self.root = new_root;

        self.arena.node(new_root).state()
    }

    /// Sample the bird's future positions along the path
    ///
    /// Takes every `preview_step()`th frame plus the final one, so a dead end
    /// right at the horizon stays visible.
    pub fn preview(&self) -> Vec<PreviewPoint> {
        let step = self.config.search.preview_step();
        let last = self.path.len().saturating_sub(1);
        let mut frames: Vec<usize> = (step..self.path.len()).step_by(step).collect();
        if last > 0 && frames.last() != Some(&last) {
            frames.push(last);
        }

        frames
            .into_iter()
            .map(|i| {
                let state = self.arena.node(self.path[i]).state();
                let shift = state.scroll_speed * state.time_step * i as f32;
                PreviewPoint {
                    frames_ahead: i,
                    pos: state.bird.body.pos + Vec2::new(shift, 0.0),
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::PipePair;
    use proptest::prelude::*;

    fn tree_with_depth(depth: usize, seed: u64) -> SearchTree {
        let mut config = Config::default();
        config.search.depth_limit = depth;
        let state = GameState::new(&config, seed);
        SearchTree::new(config, state)
    }

    fn assert_path_invariant<S: Scorer>(tree: &SearchTree<S>) {
        let path: Vec<NodeId> = tree.path().collect();
        assert!(!path.is_empty());
        assert_eq!(path[0], tree.root());
        assert_eq!(*path.last().unwrap(), tree.tail());
        assert_eq!(tree.node(tree.root()).parent(), None);
        for pair in path.windows(2) {
            let (parent, child) = (pair[0], pair[1]);
            assert_eq!(tree.node(child).parent(), Some(parent));
            assert!(tree.node(parent).children().any(|(_, id)| id == child));
        }
    }

    #[test]
    fn test_search_fills_path() {
        let mut tree = tree_with_depth(12, 42);
        assert_eq!(tree.search(), SearchOutcome::Found);
        assert_eq!(tree.depth(), 12);
        assert_path_invariant(&tree);
        assert!(tree.path_states().all(|s| !s.bird.dead));
    }

    #[test]
    fn test_exhaustion_when_everything_dies() {
        let mut config = Config::default();
        config.bird.death_distance = 10_000.0;
        let state = GameState::new(&config, 1);
        let mut tree = SearchTree::new(config, state);

        assert_eq!(tree.search(), SearchOutcome::Exhausted);
        assert!(tree.is_exhausted());
        assert_eq!(tree.path().collect::<Vec<_>>(), vec![tree.root()]);
        assert_eq!(tree.live_nodes(), 1);

        // Searching again does no further work
        assert_eq!(tree.search(), SearchOutcome::Exhausted);
        assert_eq!(tree.stats().expansions, 1);
    }

    #[test]
    fn test_exhaustion_two_levels_deep() {
        let config = Config::default();
        let mut state = GameState::new(&config, 1);
        // A wall two frames ahead, with the bird level with the top pipe
        state.bird.body.pos.y = 100.0;
        state.pipes[0] = PipePair {
            x: 92.0,
            gap_top: 300.0,
            gap_bottom: 440.0,
            passed: false,
        };
        let mut tree = SearchTree::new(config, state);

        assert_eq!(tree.search(), SearchOutcome::Exhausted);
        assert!(tree.is_exhausted());
        assert_eq!(tree.depth(), 1);
        assert_eq!(tree.live_nodes(), 1);
        let stats = tree.stats();
        assert_eq!(stats.expansions, 3);
        assert_eq!(stats.climbs, 2);
        assert_eq!(stats.disposed, 2);
    }

    #[test]
    fn test_climb_recovers_alternate_branch() {
        let config = Config::default();
        let mut state = GameState::new(&config, 1);
        // Falling fast into the bottom pipe; only flapping now survives
        state.bird.body.pos.y = 250.0;
        state.bird.velocity = 600.0;
        state.pipes[0] = PipePair {
            x: 70.0,
            gap_top: 150.0,
            gap_bottom: 287.0,
            passed: false,
        };
        // Raw distance prefers falling at first, which dies a frame later
        let mut tree = SearchTree::with_scorer(config, state, |s: &GameState| s.bird.y());

        assert_eq!(tree.search(), SearchOutcome::Found);
        assert_path_invariant(&tree);
        assert!(tree.stats().climbs >= 1);
        let first = tree.node(tree.path().nth(1).unwrap());
        assert!(first.state().bird.velocity < 0.0);
    }

    #[test]
    fn test_proceed_advances_and_frees() {
        let mut tree = tree_with_depth(5, 7);
        assert_eq!(tree.search(), SearchOutcome::Found);
        assert_eq!(tree.depth(), 5);

        let old_root = tree.root();
        let new_root = tree.path().nth(1).unwrap();
        let kept: Vec<NodeId> = tree.arena().subtree(new_root);
        let discarded: Vec<NodeId> = tree
            .arena()
            .iter()
            .map(|(id, _)| id)
            .filter(|id| !kept.contains(id))
            .collect();
        assert!(discarded.contains(&old_root));
        assert!(discarded.len() >= 2, "root and the sibling branch");

        let committed_tick = tree.proceed().time_ticks;
        assert_eq!(committed_tick, 1);

        assert_eq!(tree.depth(), 4);
        assert_eq!(tree.root(), new_root);
        assert!(!tree.contains(old_root));
        assert!(discarded.iter().all(|&id| !tree.contains(id)));
        assert_eq!(tree.live_nodes(), kept.len());
        assert_path_invariant(&tree);
    }

    #[test]
    #[should_panic(expected = "proceed needs a searched frame")]
    fn test_proceed_without_search_panics() {
        let mut tree = tree_with_depth(5, 7);
        tree.proceed();
    }

    #[test]
    fn test_steady_state_costs_one_expansion() {
        let mut tree = tree_with_depth(10, 3);
        assert_eq!(tree.search(), SearchOutcome::Found);
        assert_eq!(tree.stats().expansions, 9);
        tree.proceed();

        for _ in 0..30 {
            let before = tree.stats();
            assert_eq!(tree.search(), SearchOutcome::Found);
            let after = tree.stats();
            if after.climbs == before.climbs {
                assert_eq!(after.expansions - before.expansions, 1);
            }
            // Path nodes plus at most one unexplored sibling each
            assert!(tree.live_nodes() <= 2 * tree.depth_limit());
            tree.proceed();
        }
    }

    #[test]
    fn test_same_seed_same_run() {
        let mut a = tree_with_depth(15, 2024);
        let mut b = tree_with_depth(15, 2024);
        for _ in 0..40 {
            assert_eq!(a.search(), SearchOutcome::Found);
            assert_eq!(b.search(), SearchOutcome::Found);
            let sa = serde_json::to_string(a.proceed()).unwrap();
            let sb = serde_json::to_string(b.proceed()).unwrap();
            assert_eq!(sa, sb);
        }
    }

    #[test]
    fn test_committed_frames_match_prediction() {
        // The RNG travels with the state, so the searched path is exact
        let mut tree = tree_with_depth(8, 11);
        tree.search();
        let predicted: Vec<GameState> = tree.path_states().skip(1).cloned().collect();
        for expected in predicted {
            let state = tree.proceed();
            assert_eq!(state.bird, expected.bird);
            assert_eq!(state.pipes, expected.pipes);
        }
    }

    #[test]
    fn test_preview_samples_path() {
        let mut tree = tree_with_depth(40, 5);
        tree.search();
        let step = tree.config().search.preview_step();
        let preview = tree.preview();

        let frames: Vec<usize> = preview.iter().map(|p| p.frames_ahead).collect();
        assert_eq!(frames[0], step);
        assert_eq!(*frames.last().unwrap(), tree.depth() - 1);
        assert!(frames.windows(2).all(|w| w[0] < w[1]));

        let p = preview[0];
        let state = tree.path_states().nth(step).unwrap();
        let shift = state.scroll_speed * state.time_step * step as f32;
        assert_eq!(p.pos.x, state.bird.body.pos.x + shift);
        assert_eq!(p.pos.y, state.bird.y());
    }

    #[test]
    fn test_preview_empty_before_search() {
        let tree = tree_with_depth(10, 5);
        assert!(tree.preview().is_empty());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(24))]

        #[test]
        fn prop_search_invariants(
            seed in any::<u64>(),
            depth in 2usize..16,
            center in any::<bool>(),
            frames in 1usize..40,
            first_pipe in 90.0f32..548.0,
        ) {
            let mut config = Config::default();
            config.search.depth_limit = depth;
            config.pipes.initial_x = vec![first_pipe, first_pipe * 1.4, first_pipe * 1.8];
            config.search.scoring = if center {
                ScoringPolicy::Center
            } else {
                ScoringPolicy::Threat
            };
            let state = GameState::new(&config, seed);
            let mut tree = SearchTree::new(config, state);
            let mut terminal: Vec<NodeId> = Vec::new();

            for _ in 0..frames {
                let outcome = tree.search();
                assert_path_invariant(&tree);
                prop_assert!(tree.depth() <= depth);

                // No dead bird is ever reachable
                for (_, node) in tree.arena().iter() {
                    prop_assert!(!node.state().bird.dead);
                }

                // Terminal nodes never regain children
                for &id in &terminal {
                    if let Some(node) = tree.arena().get(id) {
                        prop_assert!(node.is_terminal());
                    }
                }
                terminal.extend(
                    tree.arena()
                        .iter()
                        .filter(|(_, node)| node.is_terminal())
                        .map(|(id, _)| id),
                );

                if outcome == SearchOutcome::Exhausted {
                    prop_assert!(tree.is_exhausted());
                    prop_assert_eq!(tree.depth(), 1);
                    break;
                }
                prop_assert_eq!(tree.depth(), depth);

                tree.proceed();
                assert_path_invariant(&tree);
                prop_assert_eq!(tree.depth(), depth - 1);
            }
        }
    }
}
