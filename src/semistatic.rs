//! Semi-static reachability analysis.
//!
//! For a fixed position we ask which pieces could ever land on which squares
//! if both players cooperated. The answer is computed without moving a single
//! piece: a system of Boolean variables is saturated to its least fixed
//! point. `Move(p, c, s, t)` states that the piece of kind `p` and color `c`
//! currently on `s` can potentially reach `t` after any number of moves.
//! Auxiliary variables refine the system: `Clear(c, s)` states that `s` can
//! be freed of `c`-colored pieces, `Reach(c, s)` that some non-king piece of
//! color `c` can arrive on `s`, and `Capture(c, s)` that color `c` can arrive
//! on `s` with a capture.
//!
//! Each `Move` variable is justified through its pre-image row: the variable
//! may only become true if the piece can reach one of the squares from which
//! `t` is one step away, and additional side conditions hold (the target can
//! be cleared, a pawn push is not permanently confronted, a pawn capture has
//! something to take). All variables start false except the trivial facts of
//! the current position, and rules only ever set variables to true, so the
//! iteration reaches a fixed point.
//!
//! The analysis is sound but not complete: a false `Move` variable proves the
//! piece can never get there, while a true one carries no guarantee. That
//! direction is exactly what is needed to prove positions unwinnable, which
//! [`is_unwinnable`] does for locked positions where only same-colored
//! bishops can approach the defending king.

use once_cell::sync::Lazy;
use shakmaty::{Bitboard, Board, Chess, Color, Piece, Position, Role, Square};

use crate::utils::{
    self, has_lonely_pawns, neighbours, unmove_sources, DARK_SQUARES, LIGHT_SQUARES,
};

const N_MOVE_VARS: usize = 49_152; // kind * color * source * target
const N_PROM_VARS: usize = 128; // color * square
const N_CLEAR_VARS: usize = 128;
const N_REACH_VARS: usize = 128;
const N_CAPTURE_VARS: usize = 128;

const N_VARS: usize =
    N_MOVE_VARS + N_PROM_VARS + N_CLEAR_VARS + N_REACH_VARS + N_CAPTURE_VARS;

fn role_index(p: Role) -> usize {
    p as usize - 1
}

fn color_index(c: Color) -> usize {
    if c.is_white() {
        0
    } else {
        1
    }
}

fn move_index(p: Role, c: Color, source: Square, target: Square) -> usize {
    role_index(p) * (1 << 13)
        + ((color_index(c) << 12) | (usize::from(source) << 6) | usize::from(target))
}

fn color_square_index(c: Color, s: Square) -> usize {
    (color_index(c) << 6) | usize::from(s)
}

fn clear_index(c: Color, s: Square) -> usize {
    N_MOVE_VARS + N_PROM_VARS + color_square_index(c, s)
}

fn reach_index(c: Color, s: Square) -> usize {
    N_MOVE_VARS + N_PROM_VARS + N_CLEAR_VARS + color_square_index(c, s)
}

fn capture_index(c: Color, s: Square) -> usize {
    N_MOVE_VARS + N_PROM_VARS + N_CLEAR_VARS + N_REACH_VARS + color_square_index(c, s)
}

/// Pre-image rows for every `Move` variable: the indices of the up to eight
/// variables standing for "the piece already reaches a square one step away
/// from the target". Rows are terminated by -1. Built once, immutable, and
/// shared by every [`System`].
static EQUATIONS: Lazy<Vec<[i32; 8]>> = Lazy::new(|| {
    let mut equations = vec![[-1i32; 8]; N_MOVE_VARS];
    let roles = [
        Role::Pawn,
        Role::Knight,
        Role::Bishop,
        Role::Rook,
        Role::Queen,
        Role::King,
    ];
    for p in roles {
        for c in [Color::White, Color::Black] {
            for s in Square::ALL {
                for t in Square::ALL {
                    let row = &mut equations[move_index(p, c, s, t)];
                    for (j, pre) in unmove_sources(p, c, t).iter().enumerate() {
                        row[j] = match pre {
                            Some(sq) => move_index(p, c, s, *sq) as i32,
                            None => -1,
                        };
                    }
                }
            }
        }
    }
    equations
});

/// Force the pre-image rows. Called once from [`crate::init`].
pub fn init() {
    Lazy::force(&EQUATIONS);
}

/// The per-position variable store. Rewritten by every [`System::saturate`]
/// call; cheap to create, so independent analyses can own separate instances.
pub struct System {
    variables: Vec<bool>,
}

impl Default for System {
    fn default() -> Self {
        Self::new()
    }
}

impl System {
    pub fn new() -> Self {
        Self {
            variables: vec![false; N_VARS],
        }
    }

    /// Whether the piece of the given kind and color on `source` can
    /// potentially reach `target`. Meaningful after [`System::saturate`].
    pub fn can_move(&self, p: Role, c: Color, source: Square, target: Square) -> bool {
        self.variables[move_index(p, c, source, target)]
    }

    /// Compute the least fixed point of the reachability rules for `pos`.
    pub fn saturate(&mut self, pos: &Chess) {
        self.variables.fill(false);
        let board = pos.board();

        let mut occupied: Vec<(Square, Piece)> = Vec::with_capacity(32);
        for s in Square::ALL {
            match board.piece_at(s) {
                None => {
                    self.variables[clear_index(Color::White, s)] = true;
                    self.variables[clear_index(Color::Black, s)] = true;
                }
                Some(piece) => {
                    self.variables[clear_index(!piece.color, s)] = true;
                    self.variables[move_index(piece.role, piece.color, s, s)] = true;
                    occupied.push((s, piece));
                }
            }
        }

        let mut change = true;
        while change {
            change = false;

            for &(source, piece) in &occupied {
                let (p, c) = (piece.role, piece.color);

                // A square clears once its piece can leave or an opposing
                // piece can capture into it.
                if !self.variables[clear_index(c, source)] {
                    for aux in Square::ALL {
                        if aux == source {
                            continue;
                        }
                        let leaves = self.variables[move_index(p, c, source, aux)];
                        let captured = board.piece_at(aux).is_some_and(|other| {
                            self.variables[move_index(other.role, !c, aux, source)]
                        });
                        if leaves || captured {
                            self.variables[clear_index(c, source)] = true;
                            change = true;
                            break;
                        }
                    }
                }

                // Reach and Capture follow from the movement variables. Pawn
                // captures feed Capture inside the movement rule instead.
                for target in Square::ALL {
                    if !self.variables[move_index(p, c, source, target)] {
                        continue;
                    }
                    if p != Role::King && !self.variables[reach_index(c, target)] {
                        self.variables[reach_index(c, target)] = true;
                        change = true;
                    }
                    if p != Role::Pawn && !self.variables[capture_index(c, target)] {
                        self.variables[capture_index(c, target)] = true;
                        change = true;
                    }
                }

                // Movement propagation through the pre-image rows.
                for target in Square::ALL {
                    if !self.variables[clear_index(c, target)] {
                        continue;
                    }

                    // A king may not step onto a square whose attackers can
                    // never be cleared away.
                    if p == Role::King {
                        let attackers = board.attacks_to(target, !c, board.occupied());
                        let mut permanently_attacked = false;
                        for a in attackers {
                            if !self.variables[clear_index(!c, a)] {
                                permanently_attacked = true;
                                break;
                            }
                        }
                        if permanently_attacked {
                            continue;
                        }
                    }

                    let i = move_index(p, c, source, target);
                    for j in 0..8 {
                        let var = EQUATIONS[i][j];
                        if var < 0 || self.variables[i] {
                            break;
                        }
                        if !self.variables[var as usize] {
                            continue;
                        }

                        if p == Role::Pawn {
                            if j == 0 {
                                // Push entry: the target must also clear of
                                // opposing pieces, and a pawn facing an enemy
                                // pawn stuck on the same file never advances.
                                if !self.variables[clear_index(!c, target)] {
                                    continue;
                                }
                                if self.confronting_pawns(board, c, source, target) {
                                    continue;
                                }
                            } else {
                                // Capture entry: something must be able to
                                // arrive on the target to be taken.
                                if !self.variables[reach_index(!c, target)] {
                                    continue;
                                }
                                self.variables[capture_index(c, target)] = true;
                            }
                        }

                        self.variables[i] = true;
                        change = true;
                        break;
                    }
                }

                // A pawn that promotes may go anywhere afterwards.
                if p == Role::Pawn {
                    let promotion_base = if c.is_white() { 56 } else { 0 };
                    for file in 0..8 {
                        let prom = Square::new(promotion_base + file);
                        if self.variables[move_index(p, c, source, prom)] {
                            for t in Square::ALL {
                                let i = move_index(p, c, source, t);
                                if !self.variables[i] {
                                    self.variables[i] = true;
                                    change = true;
                                }
                            }
                            break;
                        }
                    }
                }
            }
        }
    }

    /// A pawn on `source` pushing towards an enemy pawn on `target` of the
    /// same file is permanently confronted when neither pawn can ever leave
    /// the file and no square between them (inclusive of `target`) admits a
    /// capture by the pushing side.
    fn confronting_pawns(&self, board: &Board, c: Color, source: Square, target: Square) -> bool {
        let Some(other) = board.piece_at(target) else {
            return false;
        };
        if other.role != Role::Pawn || other.color == c || source.file() != target.file() {
            return false;
        }
        for aux in Square::ALL {
            if aux.file() != source.file() {
                if self.variables[move_index(Role::Pawn, c, source, aux)]
                    || self.variables[move_index(Role::Pawn, !c, target, aux)]
                {
                    return false;
                }
            } else if (source.rank() < aux.rank() && aux.rank() <= target.rank())
                || (source.rank() > aux.rank() && aux.rank() >= target.rank())
            {
                if self.variables[capture_index(c, aux)] {
                    return false;
                }
            }
        }
        true
    }

    /// Squares the king of color `c` can potentially visit.
    pub fn king_region(&self, pos: &Chess, c: Color) -> Bitboard {
        let mut region = Bitboard::EMPTY;
        if let Some(k) = pos.board().king_of(c) {
            for t in Square::ALL {
                if self.variables[move_index(Role::King, c, k, t)] {
                    region |= Bitboard::from(t);
                }
            }
        }
        region
    }

    /// Squares holding pieces of color `c` that can enter `region`. Pawns
    /// that cannot reach a1 are excluded: reaching a1 requires a promotion,
    /// so the probe singles out pawns that are completely boxed in.
    fn visitors(&self, pos: &Chess, region: Bitboard, c: Color) -> Bitboard {
        let board = pos.board();
        let mut visitors = Bitboard::EMPTY;
        for s in Square::ALL {
            let Some(piece) = board.piece_at(s) else {
                continue;
            };
            if piece.role == Role::Pawn
                && !self.variables[move_index(Role::Pawn, c, s, Square::A1)]
            {
                continue;
            }
            if piece.color != c {
                continue;
            }
            for t in region {
                if self.variables[move_index(piece.role, c, s, t)] {
                    visitors |= Bitboard::from(s);
                    break;
                }
            }
        }
        visitors
    }

    /// Decide unwinnability for `winner` from the saturated system.
    ///
    /// Only returns true when no piece of the winner besides the king can
    /// ever enter the loser king's region, or when every visitor is a bishop
    /// of one square color and every candidate mating square keeps an
    /// opposite-colored escape open that the loser cannot block.
    pub fn is_unwinnable(&self, pos: &Chess, winner: Color) -> bool {
        if has_lonely_pawns(pos) {
            return false;
        }

        let board = pos.board();
        let winner_king = board.by_piece(Role::King.of(winner));
        let loser_region = self.king_region(pos, !winner);
        let visitors = self.visitors(pos, loser_region, winner) & !winner_king;

        if visitors.is_empty() {
            return true;
        }

        if !(visitors & DARK_SQUARES).is_empty() && !(visitors & LIGHT_SQUARES).is_empty() {
            return false;
        }

        for s in visitors {
            if board.piece_at(s).map(|p| p.role) != Some(Role::Bishop) {
                return false;
            }
        }

        let visitors_color = if (visitors & DARK_SQUARES).is_empty() {
            LIGHT_SQUARES
        } else {
            DARK_SQUARES
        };

        let kings = board.kings();

        for s in Square::ALL {
            let mating_bishops = self.visitors(pos, Bitboard::from(s), winner) & !winner_king;
            if mating_bishops.is_empty() || !loser_region.contains(s) {
                continue;
            }

            let mut escaping = Bitboard::EMPTY;
            let mut checking = Bitboard::EMPTY;
            for t in neighbours(s) & loser_region {
                if visitors_color.contains(t) {
                    checking |= Bitboard::from(t);
                } else {
                    escaping |= Bitboard::from(t);
                }
            }

            let active_winner_king =
                !(winner_king & self.visitors(pos, neighbours(s), winner)).is_empty();

            // Two checking squares two files or two ranks apart mean two
            // mating diagonals converge on s; a single bishop cannot cover
            // both without the king's help.
            let two_diagonals = checking.0 & ((checking.0 >> 2) | (checking.0 >> 16)) != 0;
            if two_diagonals && mating_bishops.count() < 2 && !active_winner_king {
                continue;
            }

            let mut unblockable = false;
            for e in escaping {
                if (self.visitors(pos, Bitboard::from(e), !winner) & !kings).is_empty() {
                    unblockable = true;
                    break;
                }
            }
            if unblockable && !active_winner_king {
                continue;
            }

            let blockers = self.visitors(pos, escaping, !winner) & !kings;
            let blocker_count = blockers.count() + usize::from(active_winner_king);
            if escaping.count() <= blocker_count {
                return false;
            }
        }

        true
    }
}

/// Semi-static unwinnability check for a position. Sound but not complete.
pub fn is_unwinnable(pos: &Chess, winner: Color) -> bool {
    let legals = pos.legal_moves();
    if legals.is_empty() {
        // Stalemate is unwinnable; so is checkmate against the winner.
        return !pos.is_check() || pos.turn() == winner;
    }
    // The movement rules do not model en passant.
    if legals.iter().any(|m| m.is_en_passant()) {
        return false;
    }

    let mut system = System::new();
    system.saturate(pos);
    system.is_unwinnable(pos, winner)
}

/// Whether every legal move leads to a semi-statically unwinnable position.
/// Forced continuations are walked before checking each successor.
pub fn is_unwinnable_after_one_move(pos: &Chess, winner: Color) -> bool {
    let legals = pos.legal_moves();
    if legals.is_empty() {
        return !pos.is_check() || pos.turn() == winner;
    }
    for m in &legals {
        let mut child = pos.clone();
        child.play_unchecked(m);
        if !utils::trivial_progress(&mut child, 100) && !is_unwinnable(&child, winner) {
            return false;
        }
    }
    true
}
