//! Dynamic side of the decision procedure.
//!
//! Components:
//! - `state`: per-query bookkeeping, budgets and the certifying line
//! - `tt`: depth-indexed transposition table
//! - `helpmate`: the heuristic cooperative mate search
//! - `analysis`: the full, quick and shortest-mate pipelines

pub mod analysis;
pub mod helpmate;
pub mod state;
pub mod tt;

pub use self::analysis::{find_shortest, full_analysis, is_dead, quick_analysis};
pub use self::state::{
    AnalysisPhase, Search, SearchMode, SearchResult, SearchTarget, DEFAULT_NODE_LIMIT,
    MAX_VARIATION_LENGTH,
};
pub use self::tt::TranspositionTable;
