//! Cross-checks between the provers: the cheap verdicts must never
//! contradict the expensive ones.

use shakmaty::fen::Fen;
use shakmaty::{CastlingMode, Chess, Color};
use unwinnable::search::{
    full_analysis, quick_analysis, Search, SearchResult, TranspositionTable,
};
use unwinnable::semistatic;

fn position(fen: &str) -> Chess {
    fen.parse::<Fen>()
        .expect("valid FEN")
        .into_position(CastlingMode::Standard)
        .expect("legal position")
}

const SAMPLE: &[&str] = &[
    "4k3/8/4K3/8/8/8/8/8 w - -",
    "8/8/8/4k3/8/8/8/N1K5 w - -",
    "5k2/8/8/8/8/8/8/4KB2 w - -",
    "8/8/8/8/8/4k3/4p3/4K3 w - -",
    "7b/1k5B/7b/8/1p1p1p1p/1PpP1P1P/2P3K1/N7 b - -",
    "4k3/8/8/8/8/8/8/R3K3 w - -",
    "k7/2Q5/8/8/8/8/8/K7 w - -",
    "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq -",
    "8/4K2k/4P2p/8/3b1q2/8/8/8 b - -",
];

#[test]
fn quick_unwinnable_implies_full_unwinnable() {
    unwinnable::init();
    let mut search = Search::new(Color::White);
    let mut tt = TranspositionTable::default();

    for fen in SAMPLE {
        let pos = position(fen);
        for winner in [Color::White, Color::Black] {
            search.set_node_limit(2_000_000);
            if quick_analysis(&pos, winner, &mut search) == SearchResult::Unwinnable {
                let full = full_analysis(&pos, winner, &mut search, &mut tt);
                assert_eq!(
                    full,
                    SearchResult::Unwinnable,
                    "quick called {fen} unwinnable for {winner:?} but full disagrees"
                );
            }
        }
    }
}

#[test]
fn semistatic_unwinnable_implies_full_unwinnable() {
    unwinnable::init();
    let mut search = Search::new(Color::White);
    let mut tt = TranspositionTable::default();

    for fen in SAMPLE {
        let pos = position(fen);
        for winner in [Color::White, Color::Black] {
            if semistatic::is_unwinnable(&pos, winner) {
                search.set_node_limit(2_000_000);
                let full = full_analysis(&pos, winner, &mut search, &mut tt);
                assert_eq!(
                    full,
                    SearchResult::Unwinnable,
                    "oracle called {fen} unwinnable for {winner:?} but full disagrees"
                );
            }
        }
    }
}

#[test]
fn full_analysis_always_classifies() {
    unwinnable::init();
    let mut search = Search::new(Color::White);
    let mut tt = TranspositionTable::default();

    for fen in SAMPLE {
        let pos = position(fen);
        for winner in [Color::White, Color::Black] {
            search.set_node_limit(200_000);
            let result = full_analysis(&pos, winner, &mut search, &mut tt);
            assert!(matches!(
                result,
                SearchResult::Winnable | SearchResult::Unwinnable | SearchResult::Undetermined
            ));
        }
    }
}
