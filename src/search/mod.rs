//! Lookahead search over simulated futures
//!
//! Each frame the bird either falls or flaps, so the futures form a binary
//! tree of game states. The search keeps a single surviving path through that
//! tree and reuses it from one frame to the next.

pub mod node;
pub mod score;
pub mod tree;

pub use node::{Branch, NodeArena, NodeId, SearchNode, SearchStats};
pub use score::Scorer;
pub use tree::{PreviewPoint, SearchOutcome, SearchTree};
