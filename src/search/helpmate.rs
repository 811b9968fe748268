//! Heuristic depth-first search for a cooperative mate.
//!
//! Both sides are assumed to collaborate towards a checkmate of the loser,
//! so there is no minimax: the search succeeds as soon as any line reaches a
//! mate delivered by the intended winner. What makes it practical on locked
//! endgames is the budget shaping. Moves that make progress towards a mating
//! picture in the right corner are rewarded with extra remaining depth,
//! moves that destroy material or wander are punished with less, and the
//! budget checks convert node counts into an interruption flag so callers
//! can tell an exhausted search from a completed one.

use shakmaty::{Chess, Color, Move, Position, Role, Square};

use crate::search::state::{Search, SearchMode, SearchTarget};
use crate::search::tt::TranspositionTable;
use crate::utils::{self, DARK_SQUARES, LIGHT_SQUARES};

/// Beyond this many real plies from the queried position, rewarded lines no
/// longer extend the budget. Empirically tuned; raising it trades time for
/// the ability to certify extremely long helpmates.
const REWARD_DEPTH_CUTOFF: i32 = 400;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Variation {
    Normal,
    Reward,
    Punish,
}

/// Corner-based target square for the moving piece.
///
/// The envisioned mate puts the loser's king in a corner whose color the
/// winner's bishops can attack, the winner's king two ranks in front of it,
/// a loser's piece blocking the exit and any winner's piece delivering the
/// check. Each piece kind therefore aims at a different square near that
/// corner.
fn mating_corner_target(pos: &Chess, moved: Role, winner: Color) -> Square {
    let board = pos.board();
    let winner_bishops = board.by_piece(Role::Bishop.of(winner));
    let loser_bishops = board.by_piece(Role::Bishop.of(!winner));

    let dark_corner = !(winner_bishops & DARK_SQUARES).is_empty()
        || (winner_bishops.is_empty() && !(loser_bishops & LIGHT_SQUARES).is_empty());

    let king = moved == Role::King;
    let winners_turn = pos.turn() == winner;

    // Seen from White aiming at the dark corner h8.
    let mut target = if winners_turn {
        if king {
            Square::H6
        } else {
            Square::H8
        }
    } else if king {
        Square::H8
    } else {
        Square::G8
    };

    if !dark_corner {
        target = utils::flip_file(target);
    }
    if winner == Color::Black {
        target = utils::flip_rank(utils::flip_file(target));
    }
    target
}

/// Whether a move brings a slow piece closer to `s`. Only kings, knights
/// and (when asked) bishops count; fast pieces reach their targets anyway.
fn going_to_square(m: &Move, s: Square, p: Role, include_bishops: bool) -> bool {
    let Some(from) = m.from() else {
        return false;
    };
    match p {
        Role::King => utils::square_distance(m.to(), s) < utils::square_distance(from, s),
        Role::Bishop if include_bishops => {
            utils::square_distance(m.to(), s) < utils::square_distance(from, s)
        }
        Role::Knight => utils::knight_distance(m.to(), s) < utils::knight_distance(from, s),
        _ => false,
    }
}

fn advanced_pawn_push(pos: &Chess, m: &Move) -> bool {
    m.role() == Role::Pawn && utils::relative_rank(pos.turn(), m.to()) >= 5
}

/// Whether the winner's material is so thin that any mate needs the loser to
/// promote a pawn into extra material. May err on the side of true; it is
/// only exact once the loser has no pawns.
pub(crate) fn need_loser_promotion(pos: &Chess, winner: Color) -> bool {
    let board = pos.board();
    let loser = !winner;
    let minor_or_rook = board.knights() | board.bishops() | board.rooks();

    // A lone knight cannot mate unless the loser keeps or creates a piece
    // that can seal the king in.
    if board.by_color(winner).count() == 2
        && board.by_piece(Role::Knight.of(winner)).count() == 1
        && (board.by_color(loser) & minor_or_rook).is_empty()
    {
        return true;
    }

    // Bishops of one color cannot mate without an opposing blocker on their
    // own square color.
    let winner_bishops = board.by_piece(Role::Bishop.of(winner));
    let bishops_color = if (winner_bishops & DARK_SQUARES).is_empty() {
        LIGHT_SQUARES
    } else {
        DARK_SQUARES
    };
    if board.by_color(winner).count() == winner_bishops.count() + 1
        && (board.bishops() & !bishops_color).is_empty()
        && (board.by_color(loser) & board.knights()).is_empty()
    {
        return true;
    }

    false
}

/// Static proof that the winner can never mate. Never wrong when true.
pub(crate) fn impossible_to_win(pos: &Chess, winner: Color) -> bool {
    let board = pos.board();
    if board.by_color(winner).count() == 1 {
        return true;
    }
    board.by_piece(Role::Pawn.of(!winner)).is_empty() && need_loser_promotion(pos, winner)
}

/// Search for a helpmate within the configured depth budget.
///
/// Returns true when a mate was found; the certifying line is then recorded
/// in the search state. A false return only proves unwinnability within the
/// budget when the search was not interrupted.
#[allow(clippy::too_many_arguments)]
pub(crate) fn find_mate(
    pos: &Chess,
    search: &mut Search,
    tt: &mut TranspositionTable,
    depth: i32,
    mode: SearchMode,
    target: SearchTarget,
    past_progress: bool,
    was_semi_blocked: bool,
) -> bool {
    let winner = search.intended_winner();
    let loser = !winner;
    let moves_left = search.max_depth() - depth;

    let key = if mode == SearchMode::Full {
        utils::zobrist_key(pos)
    } else {
        0
    };

    // Already searched with at least this much depth remaining.
    if mode == SearchMode::Full {
        if let Some(stored) = tt.probe(key) {
            if stored >= moves_left {
                return false;
            }
        }
    }

    if impossible_to_win(pos, winner) {
        return false;
    }

    let legals = pos.legal_moves();
    if legals.is_empty() {
        if pos.is_check() && pos.turn() == loser {
            search.set_winnable();
            return true;
        }
        return false;
    }

    if depth >= search.max_depth() || search.is_local_limit_reached() {
        search.interrupt();
        return false;
    }

    if mode == SearchMode::Full {
        tt.store(key, moves_left);
    }

    let need_promotion = need_loser_promotion(pos, winner);
    let winners_turn = pos.turn() == winner;

    let board = pos.board();
    let only_pawns_and_bishops = (board.knights() | board.rooks() | board.queens()).is_empty();
    let blocked_heuristics = only_pawns_and_bishops
        && utils::blocked_pawn_count(pos) >= 4
        && !utils::has_lonely_pawns(pos);
    let semi_blocked = utils::semi_blocked_target(pos);

    for m in &legals {
        let mut variation = Variation::Normal;

        if target == SearchTarget::Any {
            let moved = m.role();
            let corner = mating_corner_target(pos, moved, winner);

            if winners_turn {
                if advanced_pawn_push(pos, m)
                    || m.is_capture()
                    || going_to_square(m, corner, moved, false)
                {
                    variation = Variation::Reward;
                }
            } else {
                if need_promotion {
                    let heavy = matches!(m.promotion(), Some(Role::Queen | Role::Rook));
                    variation = if moved == Role::Pawn && !heavy {
                        Variation::Reward
                    } else {
                        Variation::Punish
                    };
                }
                if going_to_square(m, corner, moved, false) {
                    variation = Variation::Reward;
                }
                if m.is_capture() {
                    variation = Variation::Punish;
                }
            }

            // Locked pawn chains with bishops need a different plan: free
            // the position through the one available capture, walking the
            // king there, and keep everything else still.
            if blocked_heuristics {
                if semi_blocked.is_some() || was_semi_blocked {
                    if m.is_capture() && winners_turn {
                        variation = Variation::Reward;
                    } else if moved == Role::King {
                        variation = Variation::Normal;
                        if let Some(unblock) = semi_blocked {
                            if going_to_square(m, unblock, moved, false) {
                                variation = Variation::Reward;
                            }
                        }
                    } else {
                        variation = Variation::Punish;
                    }
                } else if going_to_square(m, corner, moved, true)
                    && board.by_piece(Role::Bishop.of(loser)).count() > 1
                {
                    variation = Variation::Reward;
                }
            }
        }

        let mut child = pos.clone();
        child.play_unchecked(m);

        let mut new_depth = depth + 1;
        if target == SearchTarget::Any {
            if variation == Variation::Reward {
                // Rewarding the loser while they keep a queen mostly feeds
                // pointless checking lines.
                if !winners_turn && !child.board().by_piece(Role::Queen.of(loser)).is_empty() {
                    variation = Variation::Normal;
                }
                if search.actual_depth() > REWARD_DEPTH_CUTOFF {
                    variation = Variation::Normal;
                }
            }
            new_depth = match variation {
                Variation::Reward => depth - 1,
                Variation::Punish => (depth + 2).min(search.max_depth()),
                Variation::Normal => {
                    if past_progress {
                        depth - 1
                    } else {
                        depth + 1
                    }
                }
            };
        }

        search.annotate_move(m);
        search.step();
        let mate = find_mate(
            &child,
            search,
            tt,
            new_depth,
            mode,
            target,
            variation == Variation::Reward,
            semi_blocked.is_some() || was_semi_blocked,
        );
        search.undo_step();

        if mate {
            return true;
        }
    }

    false
}

/// Exhaustive proof search: true when no line of up to `depth` plies lets
/// the winner deliver mate. Finds incidental mates along the way and records
/// them in the search state.
pub(crate) fn dynamically_unwinnable(
    pos: &Chess,
    depth: i32,
    winner: Color,
    search: &mut Search,
) -> bool {
    if impossible_to_win(pos, winner) {
        return true;
    }

    let legals = pos.legal_moves();
    if legals.is_empty() {
        if pos.is_check() && pos.turn() != winner {
            search.set_winnable();
            return false;
        }
        // Stalemate, or the winner is the side that got mated.
        return true;
    }

    if depth <= 0 {
        return false;
    }

    for m in &legals {
        let mut child = pos.clone();
        child.play_unchecked(m);
        search.annotate_move(m);
        search.step();
        let unwinnable = dynamically_unwinnable(&child, depth - 1, winner, search);
        search.undo_step();
        if !unwinnable {
            return false;
        }
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use shakmaty::fen::Fen;
    use shakmaty::CastlingMode;

    fn position(fen: &str) -> Chess {
        fen.parse::<Fen>()
            .expect("valid FEN")
            .into_position(CastlingMode::Standard)
            .expect("legal position")
    }

    #[test]
    fn lone_king_cannot_win() {
        let pos = position("4k3/8/4K3/8/8/8/8/8 w - -");
        assert!(impossible_to_win(&pos, Color::White));
        assert!(impossible_to_win(&pos, Color::Black));
    }

    #[test]
    fn lone_knight_needs_a_loser_promotion() {
        let pos = position("8/8/8/4k3/8/8/8/N1K5 w - -");
        assert!(need_loser_promotion(&pos, Color::White));
        // No pawns to promote, so the mate is impossible outright.
        assert!(impossible_to_win(&pos, Color::White));

        // Give the loser a pawn and the mate becomes conceivable again.
        let pos = position("8/8/8/4k3/8/4p3/8/N1K5 w - -");
        assert!(need_loser_promotion(&pos, Color::White));
        assert!(!impossible_to_win(&pos, Color::White));
    }

    #[test]
    fn same_colored_bishops_need_a_loser_promotion() {
        let pos = position("8/8/8/5k2/8/8/8/B1K1B3 w - -");
        assert!(need_loser_promotion(&pos, Color::White));
        assert!(impossible_to_win(&pos, Color::White));

        // An opposite-colored enemy bishop provides the blocker.
        let pos = position("8/7b/8/5k2/8/8/8/B1K1B3 w - -");
        assert!(!need_loser_promotion(&pos, Color::White));
        assert!(!impossible_to_win(&pos, Color::White));
    }

    #[test]
    fn two_knights_are_not_written_off() {
        // Two knights can still mate with the loser's cooperation.
        let pos = position("8/8/8/4k3/8/8/8/NNK5 w - -");
        assert!(!need_loser_promotion(&pos, Color::White));
        assert!(!impossible_to_win(&pos, Color::White));
    }

    #[test]
    fn corner_targets_follow_bishops_and_turn() {
        // White to move with a dark-squared bishop aims pieces at h8.
        let pos = position("4k3/8/8/8/8/8/8/2B1K3 w - -");
        assert_eq!(
            mating_corner_target(&pos, Role::Bishop, Color::White),
            Square::H8
        );
        assert_eq!(
            mating_corner_target(&pos, Role::King, Color::White),
            Square::H6
        );

        // Black winner with a light-squared bishop mirrors to h1.
        let pos = position("2b1k3/8/8/8/8/8/8/4K3 b - -");
        assert_eq!(
            mating_corner_target(&pos, Role::Bishop, Color::Black),
            Square::H1
        );
    }

    #[test]
    fn shallow_exhaustive_search_finds_forced_emptiness() {
        // Bare kings: nothing to search, trivially unwinnable.
        let pos = position("4k3/8/4K3/8/8/8/8/8 w - -");
        let mut search = Search::new(Color::White);
        search.reset(Color::White);
        search.set(0, 0);
        assert!(dynamically_unwinnable(&pos, 3, Color::White, &mut search));
    }

    #[test]
    fn quick_mode_finds_a_mate_in_one() {
        // White to move mates with Qb8; winner White.
        let pos = position("7k/8/6K1/8/8/8/8/1Q6 w - -");
        let mut search = Search::new(Color::White);
        search.reset(Color::White);
        search.set(2, 5_000);
        let mut tt = TranspositionTable::new(1);
        assert!(find_mate(
            &pos,
            &mut search,
            &mut tt,
            0,
            SearchMode::Quick,
            SearchTarget::Any,
            false,
            false,
        ));
        assert_eq!(search.mate_sequence().len(), 1);
    }
}
