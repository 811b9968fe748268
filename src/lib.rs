//! Unwinnability analysis for standard chess.
//!
//! Given a legal position and an intended winner, the crate decides whether
//! any sequence of legal moves, with both players cooperating, ends in a
//! checkmate delivered by that player. This is the question behind the dead
//! position rule: a game where neither side can possibly win is drawn.
//!
//! Chess rules, move generation and hashing come from `shakmaty`. The crate
//! adds a semi-static reachability prover for locked positions and a
//! heuristic helpmate search, combined into staged analysis pipelines.

pub mod repl;
pub mod search;
pub mod semistatic;
pub mod utils;

pub use search::{
    find_shortest, full_analysis, is_dead, quick_analysis, Search, SearchResult,
    TranspositionTable,
};

/// Build the global tables. Call once at startup, before any analysis.
pub fn init() {
    utils::init_tables();
    semistatic::init();
}
