//! Board geometry helpers and precomputed tables shared by the analyzers.
//!
//! Everything here is position-independent: step offsets for walking moves
//! backwards, the knight-distance table, square-color masks and a few pawn
//! structure predicates used to gate the blocked-position heuristics.

use once_cell::sync::Lazy;
use shakmaty::attacks;
use shakmaty::zobrist::{Zobrist64, ZobristHash};
use shakmaty::{Bitboard, Chess, Color, EnPassantMode, File, Position, Rank, Role, Square};

/// Squares of the same color as a1.
pub const DARK_SQUARES: Bitboard = Bitboard(0xAA55_AA55_AA55_AA55);
/// Squares of the same color as h1.
pub const LIGHT_SQUARES: Bitboard = Bitboard(!0xAA55_AA55_AA55_AA55u64);

/// One-step movement offsets, expressed from the target square backwards for
/// a white piece (mirrored for black). For pawns the first entry is the push
/// source; the remaining two are the diagonal capture sources. This ordering
/// is relied upon by the saturation rules.
fn step_offsets(role: Role) -> &'static [i32] {
    match role {
        Role::Pawn => &[-8, -7, -9],
        Role::Knight => &[17, 15, 10, 6, -6, -10, -15, -17],
        Role::Bishop => &[9, 7, -7, -9],
        Role::Rook => &[8, 1, -1, -8],
        Role::Queen | Role::King => &[9, 8, 7, 1, -1, -7, -8, -9],
    }
}

/// Squares from which a piece of the given kind and color could have stepped
/// onto `target` in one move, ignoring occupancy. Sliding pieces contribute
/// only their adjacent step; longer slides are recovered transitively by the
/// saturation pass. Trailing entries are `None`.
pub fn unmove_sources(role: Role, color: Color, target: Square) -> [Option<Square>; 8] {
    let mut sources = [None; 8];
    let dir: i32 = if color.is_white() { 1 } else { -1 };
    let t = u32::from(target) as i32;
    let mut n = 0;
    for &inc in step_offsets(role) {
        let prev = t + dir * inc;
        if !(0..64).contains(&prev) {
            continue;
        }
        if (prev % 8 - t % 8).abs() > 2 {
            continue;
        }
        sources[n] = Some(Square::new(prev as u32));
        n += 1;
    }
    sources
}

/// King-step neighbourhood of a square.
pub fn neighbours(s: Square) -> Bitboard {
    attacks::king_attacks(s)
}

pub fn is_corner(s: Square) -> bool {
    matches!(s, Square::A1 | Square::H1 | Square::A8 | Square::H8)
}

/// Chebyshev (king-move) distance.
pub fn square_distance(a: Square, b: Square) -> u32 {
    let df = (u32::from(a.file()) as i32 - u32::from(b.file()) as i32).unsigned_abs();
    let dr = (u32::from(a.rank()) as i32 - u32::from(b.rank()) as i32).unsigned_abs();
    df.max(dr)
}

pub fn flip_file(s: Square) -> Square {
    Square::from_coords(File::new(7 - u32::from(s.file())), s.rank())
}

pub fn flip_rank(s: Square) -> Square {
    Square::from_coords(s.file(), Rank::new(7 - u32::from(s.rank())))
}

/// Rank of `s` from the point of view of `c` (0 = own back rank).
pub fn relative_rank(c: Color, s: Square) -> u32 {
    let r = u32::from(s.rank());
    if c.is_white() {
        r
    } else {
        7 - r
    }
}

// The knight distance between two squares is a function of the sorted pair of
// their file and rank distances alone, except between a corner and its
// diagonal neighbour, where the corner walls off the two-move routes and the
// knight needs four moves.

fn knight_distance_formula(x: Square, y: Square) -> u8 {
    let df = (u32::from(x.file()) as i32 - u32::from(y.file()) as i32).unsigned_abs();
    let dr = (u32::from(x.rank()) as i32 - u32::from(y.rank()) as i32).unsigned_abs();
    let (lo, hi) = (df.min(dr), df.max(dr));

    if lo == 1 && hi == 1 && (is_corner(x) || is_corner(y)) {
        return 4;
    }

    if lo % 2 == hi % 2 {
        match (lo, hi) {
            (0, 0) => 0,
            (0, 2) | (0, 4) | (2, 4) => 2,
            (1, 1) | (1, 3) | (3, 3) => 2,
            (7, 7) => 6,
            _ => 4,
        }
    } else {
        match (lo, hi) {
            (_, 7) => 5,
            (1, 2) => 1,
            (5, 6) => 5,
            _ => 3,
        }
    }
}

static KNIGHT_DISTANCE: Lazy<Box<[[u8; 64]; 64]>> = Lazy::new(|| {
    let mut table = Box::new([[0u8; 64]; 64]);
    for x in Square::ALL {
        for y in Square::ALL {
            table[usize::from(x)][usize::from(y)] = knight_distance_formula(x, y);
        }
    }
    table
});

/// Minimum number of knight moves between two squares.
pub fn knight_distance(x: Square, y: Square) -> u32 {
    u32::from(KNIGHT_DISTANCE[usize::from(x)][usize::from(y)])
}

/// Force the lazily built tables. Called once from [`crate::init`].
pub fn init_tables() {
    Lazy::force(&KNIGHT_DISTANCE);
}

/// A pawn is lonely if no opposing pawn stands on its file. Pawns one step
/// from promotion are not counted; they no longer need an opposing pawn to
/// matter. The check compares per-file occupancy masks of the two sides.
pub fn has_lonely_pawns(pos: &Chess) -> bool {
    let board = pos.board();
    let mut white_files = 0u8;
    let mut black_files = 0u8;
    for s in board.by_piece(Role::Pawn.of(Color::White)) {
        if u32::from(s) < 48 {
            white_files |= 1 << u32::from(s.file());
        }
    }
    for s in board.by_piece(Role::Pawn.of(Color::Black)) {
        if u32::from(s) > 15 {
            black_files |= 1 << u32::from(s.file());
        }
    }
    white_files != black_files
}

/// Number of pawns with an enemy pawn directly in front of them. Both pawns
/// of a confronting pair are counted.
pub fn blocked_pawn_count(pos: &Chess) -> usize {
    let board = pos.board();
    let white = board.by_piece(Role::Pawn.of(Color::White));
    let black = board.by_piece(Role::Pawn.of(Color::Black));
    let mut n = 0;
    for s in white {
        if s.offset(8).is_some_and(|up| black.contains(up)) {
            n += 1;
        }
    }
    for s in black {
        if s.offset(-8).is_some_and(|down| white.contains(down)) {
            n += 1;
        }
    }
    n
}

/// Zobrist key of a position, used for the transposition table and for
/// repetition detection along forced lines.
pub fn zobrist_key(pos: &Chess) -> u64 {
    pos.zobrist_hash::<Zobrist64>(EnPassantMode::Legal).0
}

/// Play forced moves while the position has exactly one legal move, up to
/// `limit` of them. Returns true when the forced line repeats a position,
/// which draws the game by force.
pub fn trivial_progress(pos: &mut Chess, limit: usize) -> bool {
    let mut seen = vec![zobrist_key(pos)];
    for _ in 0..limit {
        let legals = pos.legal_moves();
        if legals.len() != 1 {
            return false;
        }
        pos.play_unchecked(&legals[0]);
        let key = zobrist_key(pos);
        if seen.contains(&key) {
            return true;
        }
        seen.push(key);
    }
    false
}

/// Detect a pawn formation that is locked except for one king capture.
///
/// The board counts as semi-blocked when no pawn of either side has a push
/// or a pawn capture available. The unblocking target is the first pawn not
/// defended by another pawn of its own color; a king walking there and
/// capturing is the only way to make progress in such positions.
pub fn semi_blocked_target(pos: &Chess) -> Option<Square> {
    let board = pos.board();
    let occupied = board.occupied();

    for color in [Color::White, Color::Black] {
        let them = board.by_color(!color);
        let dir = if color.is_white() { 8 } else { -8 };
        for s in board.by_piece(Role::Pawn.of(color)) {
            match s.offset(dir) {
                Some(ahead) if occupied.contains(ahead) => {}
                _ => return None,
            }
            if !(attacks::pawn_attacks(color, s) & them).is_empty() {
                return None;
            }
        }
    }

    for color in [Color::White, Color::Black] {
        let own_pawns = board.by_piece(Role::Pawn.of(color));
        for s in own_pawns {
            let defenders = attacks::pawn_attacks(!color, s) & own_pawns;
            if defenders.is_empty() {
                return Some(s);
            }
        }
    }

    None
}
