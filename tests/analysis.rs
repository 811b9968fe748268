//! End-to-end pipeline tests on known positions.

use shakmaty::fen::Fen;
use shakmaty::{CastlingMode, Chess, Color, Position};
use unwinnable::search::{
    find_shortest, full_analysis, is_dead, Search, SearchResult, TranspositionTable,
};

fn position(fen: &str) -> Chess {
    fen.parse::<Fen>()
        .expect("valid FEN")
        .into_position(CastlingMode::Standard)
        .expect("legal position")
}

fn analyze(fen: &str, winner: Color, limit: u64) -> (SearchResult, Search) {
    unwinnable::init();
    let mut search = Search::new(winner);
    search.set_node_limit(limit);
    let mut tt = TranspositionTable::default();
    let result = full_analysis(&position(fen), winner, &mut search, &mut tt);
    (result, search)
}

/// Replay a certifying line from the queried position and require that it
/// ends in checkmate against the loser, with every move legal on the way.
fn assert_valid_mate(fen: &str, winner: Color, search: &Search) {
    let mut pos = position(fen);
    for m in search.mate_sequence() {
        assert!(
            pos.legal_moves().iter().any(|legal| legal == m),
            "illegal move in certificate: {:?}",
            m
        );
        pos.play_unchecked(m);
    }
    assert!(pos.is_checkmate(), "certificate does not end in mate");
    assert_eq!(pos.turn(), !winner, "the wrong king got mated");
}

#[test]
fn bare_kings_are_unwinnable_for_both() {
    for winner in [Color::White, Color::Black] {
        let (result, _) = analyze("4k3/8/4K3/8/8/8/8/8 w - -", winner, 500_000);
        assert_eq!(result, SearchResult::Unwinnable);
    }
}

#[test]
fn lone_knight_is_unwinnable() {
    let (result, _) = analyze("8/8/8/4k3/8/8/8/N1K5 w - -", Color::White, 500_000);
    assert_eq!(result, SearchResult::Unwinnable);
}

#[test]
fn mate_already_on_the_board_is_winnable() {
    let (result, search) = analyze("7k/6Q1/6K1/8/8/8/8/8 b - -", Color::White, 500_000);
    assert_eq!(result, SearchResult::Winnable);
    assert_eq!(search.mate_sequence().len(), 0);
}

#[test]
fn open_queen_endgame_is_winnable_with_certificate() {
    let fen = "k7/2Q5/8/8/8/8/8/K7 w - -";
    let (result, search) = analyze(fen, Color::White, 2_000_000);
    assert_eq!(result, SearchResult::Winnable);
    assert_valid_mate(fen, Color::White, &search);
}

#[test]
fn locked_bishops_position_is_unwinnable_for_black() {
    let (result, _) = analyze(
        "7b/1k5B/7b/8/1p1p1p1p/1PpP1P1P/2P3K1/N7 b - -",
        Color::Black,
        500_000,
    );
    assert_eq!(result, SearchResult::Unwinnable);
}

#[test]
fn locked_bishops_verdict_comes_from_the_oracle() {
    // The quick shallow pass cannot settle this position; the semi-static
    // stage alone must prove it dead for Black.
    let (result, search) = analyze(
        "7b/1k5B/7b/8/1p1p1p1p/1PpP1P1P/2P3K1/N7 b - -",
        Color::Black,
        500_000,
    );
    assert_eq!(result, SearchResult::Unwinnable);
    assert_eq!(search.phase(), unwinnable::search::AnalysisPhase::Static);
}

#[test]
fn blocked_corridor_helpmate_is_found() {
    let fen = "Bb2kb2/bKp1p1p1/1pP1P1P1/pP6/6P1/P7/8/8 b - -";
    let (result, search) = analyze(fen, Color::White, 10_000_000);
    assert_eq!(result, SearchResult::Winnable);
    assert_valid_mate(fen, Color::White, &search);
}

#[test]
fn shortest_mate_has_minimal_length() {
    unwinnable::init();
    let fen = "8/4K2k/4P2p/8/3b1q2/8/8/8 b - -";
    let mut search = Search::new(Color::White);
    search.set_node_limit(1_000_000);
    let mut tt = TranspositionTable::default();
    let result = find_shortest(&position(fen), Color::White, &mut search, &mut tt);
    assert_eq!(result, SearchResult::Winnable);
    assert_eq!(search.mate_sequence().len(), 6);
    assert_valid_mate(fen, Color::White, &search);
}

#[test]
fn rook_endgame_is_winnable_for_the_rook_side() {
    // The intended winner moves second here; targets mirror to the first
    // rank.
    let fen = "4k3/r7/8/8/8/8/8/4K3 w - -";
    let (result, search) = analyze(fen, Color::Black, 10_000_000);
    assert_eq!(result, SearchResult::Winnable);
    assert_valid_mate(fen, Color::Black, &search);
}

#[test]
fn pawn_endgame_promotes_and_mates() {
    let fen = "4k3/8/8/8/8/8/4P3/4K3 w - -";
    let (result, search) = analyze(fen, Color::White, 10_000_000);
    assert_eq!(result, SearchResult::Winnable);
    assert_valid_mate(fen, Color::White, &search);
}

#[test]
fn tiny_budget_yields_undetermined() {
    let (result, _) = analyze(
        "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq -",
        Color::White,
        1,
    );
    assert_eq!(result, SearchResult::Undetermined);
}

#[test]
fn dead_position_detection() {
    unwinnable::init();
    assert!(is_dead(&position("4k3/8/4K3/8/8/8/8/8 w - -")));
    assert!(is_dead(&position("8/8/8/8/8/4k3/4p3/4K3 w - -")));
    assert!(!is_dead(&position(
        "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq -"
    )));
}
