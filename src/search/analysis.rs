//! Analysis pipelines combining the static and dynamic provers.
//!
//! `full_analysis` is the complete decision procedure: cheap static facts
//! first, then a throwaway shallow search that settles most winnable
//! positions, then the semi-static oracle for locked positions, and finally
//! iterative deepening with the transposition table. `quick_analysis` is a
//! reduced pipeline for bulk screening, sound with respect to the full one.
//! `find_shortest` trades the heuristics for minimality of the reported
//! mate.

use shakmaty::{Chess, Color, Move, Position, Role};

use crate::search::helpmate::{dynamically_unwinnable, find_mate, impossible_to_win};
use crate::search::state::{AnalysisPhase, Search, SearchMode, SearchResult, SearchTarget};
use crate::search::tt::TranspositionTable;
use crate::semistatic;
use crate::utils;

/// Node budget multiplier for the shallow pre-static pass.
const QUICK_LOCAL_LIMIT: u64 = 5_000;
/// Node budget multiplier per iterative-deepening pass.
const FULL_LOCAL_LIMIT: u64 = 10_000;
/// Deepening never goes past this many plies.
const MAX_SEARCH_DEPTH: i32 = 1000;
/// Forced-line cap for trivial progress.
const TRIVIAL_PROGRESS_LIMIT: usize = 100;
/// Shallow exhaustive depth in the quick pipeline, and its extension for
/// locked pawn-and-bishop boards with very few replies.
const QUICK_EXHAUSTIVE_DEPTH: i32 = 7;
const QUICK_EXHAUSTIVE_DEPTH_EXTENDED: i32 = 15;
const QUICK_RESTRICTED_MOBILITY: usize = 8;

/// Play forced moves, recording them so a later mate certificate starts at
/// the queried position. True when the forced line repeats, which draws.
fn trivial_progress(pos: &mut Chess, search: &mut Search) -> bool {
    let mut seen = vec![utils::zobrist_key(pos)];
    for _ in 0..TRIVIAL_PROGRESS_LIMIT {
        let legals = pos.legal_moves();
        if legals.len() != 1 {
            return false;
        }
        let m = legals[0].clone();
        search.annotate_move(&m);
        search.step();
        pos.play_unchecked(&m);
        let key = utils::zobrist_key(pos);
        if seen.contains(&key) {
            return true;
        }
        seen.push(key);
    }
    false
}

/// One full iterative-deepening run from `pos`. Clears the table, then
/// deepens until the position is exhausted, a mate is found or the budget
/// runs out.
fn iterative_deepening(
    pos: &Chess,
    search: &mut Search,
    tt: &mut TranspositionTable,
) -> SearchResult {
    tt.clear();
    for max_depth in 2..=MAX_SEARCH_DEPTH {
        search.set(max_depth, FULL_LOCAL_LIMIT);
        let mate = find_mate(
            pos,
            search,
            tt,
            0,
            SearchMode::Full,
            SearchTarget::Any,
            false,
            false,
        );
        if mate {
            return SearchResult::Winnable;
        }
        if !search.is_interrupted() {
            return SearchResult::Unwinnable;
        }
        if search.is_limit_reached() {
            break;
        }
    }
    SearchResult::Undetermined
}

/// Decide whether `winner` can still deliver mate from `pos`.
///
/// The result is exact up to the node budget: `Winnable` comes with a
/// certifying line in the search state, `Unwinnable` is proved, and
/// `Undetermined` means the global limit ran out first.
pub fn full_analysis(
    pos: &Chess,
    winner: Color,
    search: &mut Search,
    tt: &mut TranspositionTable,
) -> SearchResult {
    search.reset(winner);
    let mut pos = pos.clone();

    // A forced line that repeats is drawn on the spot.
    if trivial_progress(&mut pos, search) {
        search.set_unwinnable();
        return search.result();
    }

    let legals = pos.legal_moves();
    if legals.is_empty() {
        if pos.is_check() && pos.turn() != winner {
            search.set_winnable();
        } else {
            search.set_unwinnable();
        }
        return search.result();
    }

    if impossible_to_win(&pos, winner) {
        search.set_unwinnable();
        return search.result();
    }

    // Shallow throwaway pass. Completing it without interruption and
    // without a mate is already a proof.
    search.set(2, QUICK_LOCAL_LIMIT);
    let mate = find_mate(
        &pos,
        search,
        tt,
        0,
        SearchMode::Quick,
        SearchTarget::Any,
        false,
        false,
    );
    if !search.is_interrupted() && !mate {
        search.set_unwinnable();
    }
    if search.result() != SearchResult::Undetermined {
        return search.result();
    }

    search.set_phase(AnalysisPhase::Static);
    if semistatic::is_unwinnable(&pos, winner) {
        search.set_unwinnable();
        return search.result();
    }

    // One-ply lookahead: a move whose successor is statically dead cannot
    // be part of any mating line.
    let mut surviving: Vec<Move> = Vec::new();
    for m in &legals {
        let mut child = pos.clone();
        child.play_unchecked(m);
        let dead = utils::trivial_progress(&mut child, TRIVIAL_PROGRESS_LIMIT)
            || semistatic::is_unwinnable(&child, winner);
        if !dead {
            surviving.push(m.clone());
        }
    }
    if surviving.is_empty() {
        search.set_unwinnable();
        return search.result();
    }

    search.set_phase(AnalysisPhase::PostStatic);
    if surviving.len() == legals.len() {
        if iterative_deepening(&pos, search, tt) == SearchResult::Unwinnable {
            search.set_unwinnable();
        }
    } else {
        let mut all_unwinnable = true;
        for (i, m) in surviving.iter().enumerate() {
            let mut child = pos.clone();
            child.play_unchecked(m);
            search.annotate_move(m);
            search.step();
            let subtree = iterative_deepening(&child, search, tt);
            search.undo_step();
            match subtree {
                SearchResult::Winnable => return search.result(),
                SearchResult::Unwinnable => {}
                SearchResult::Undetermined => all_unwinnable = false,
            }
            if search.is_limit_reached() {
                // Whatever was not analyzed stays unknown.
                if i + 1 < surviving.len() {
                    all_unwinnable = false;
                }
                break;
            }
        }
        if all_unwinnable {
            search.set_unwinnable();
        }
    }

    search.result()
}

/// Reduced pipeline for bulk screening. Only its `Unwinnable` verdicts are
/// meant to be consumed; they always agree with [`full_analysis`].
pub fn quick_analysis(pos: &Chess, winner: Color, search: &mut Search) -> SearchResult {
    search.reset(winner);
    search.set(0, 0);
    let mut pos = pos.clone();

    if trivial_progress(&mut pos, search) {
        search.set_unwinnable();
        return search.result();
    }

    let board = pos.board();
    let heavy = board.knights() | board.rooks() | board.queens();
    let only_pawns_and_bishops = heavy.is_empty();
    let almost_only_pawns_and_bishops = heavy.count() <= 1;

    let legals = pos.legal_moves();
    let depth = if only_pawns_and_bishops
        && legals.len() <= QUICK_RESTRICTED_MOBILITY
        && legals.iter().any(|m| m.role() != Role::King)
    {
        QUICK_EXHAUSTIVE_DEPTH_EXTENDED
    } else {
        QUICK_EXHAUSTIVE_DEPTH
    };

    let mut unwinnable = dynamically_unwinnable(&pos, depth, winner, search);

    let blocked_candidate =
        utils::blocked_pawn_count(&pos) >= 1 && !utils::has_lonely_pawns(&pos);

    if blocked_candidate && !unwinnable && only_pawns_and_bishops {
        unwinnable = semistatic::is_unwinnable(&pos, winner);
    }

    if blocked_candidate
        && !unwinnable
        && almost_only_pawns_and_bishops
        && (pos.is_check() || !board.knights().is_empty())
    {
        unwinnable = semistatic::is_unwinnable_after_one_move(&pos, winner);
    }

    if unwinnable {
        search.set_unwinnable();
    }
    search.result()
}

/// Find a shortest mate for `winner` within the global node limit.
///
/// Iterative deepening steps by two plies, aligned so that the winner makes
/// the last move, and the per-pass search is exhaustive, so the first mate
/// found has minimal length.
pub fn find_shortest(
    pos: &Chess,
    winner: Color,
    search: &mut Search,
    tt: &mut TranspositionTable,
) -> SearchResult {
    search.reset(winner);

    if semistatic::is_unwinnable(pos, winner) {
        search.set_unwinnable();
        return search.result();
    }

    tt.clear();
    let mut depth = if pos.turn() == winner { 1 } else { 0 };
    while depth <= MAX_SEARCH_DEPTH {
        search.set(depth, search.node_limit());
        let mate = find_mate(
            pos,
            search,
            tt,
            0,
            SearchMode::Full,
            SearchTarget::Shortest,
            false,
            false,
        );
        if !search.is_interrupted() && !mate {
            search.set_unwinnable();
        }
        if search.result() != SearchResult::Undetermined || search.is_limit_reached() {
            break;
        }
        depth += 2;
    }
    search.result()
}

/// A position is dead when neither player can ever deliver mate.
pub fn is_dead(pos: &Chess) -> bool {
    let mut search = Search::new(Color::White);
    search.set_node_limit(5_000_000);
    if quick_analysis(pos, Color::White, &mut search) != SearchResult::Unwinnable {
        return false;
    }
    quick_analysis(pos, Color::Black, &mut search) == SearchResult::Unwinnable
}
