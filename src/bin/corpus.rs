//! Regression runner over an annotated corpus.
//!
//! Each corpus line is `XY <FEN>` where `X` is `W` if White can potentially
//! win (`-` otherwise) and `Y` is `B` for Black. Every position is analyzed
//! for both intended winners and mismatches are reported, together with the
//! node statistics and a breakdown of which pipeline stage settled each
//! verdict.

use std::fs::File;
use std::io::{BufRead, BufReader};

use clap::Parser;
use shakmaty::fen::Fen;
use shakmaty::{CastlingMode, Chess, Color};

use unwinnable::search::{full_analysis, AnalysisPhase, Search, SearchResult, TranspositionTable};

#[derive(Parser)]
#[command(about = "Analyze an annotated corpus of positions and report statistics")]
struct Args {
    /// Corpus file with `XY <FEN>` lines.
    #[arg(long, default_value = "data/corpus.txt")]
    file: String,

    /// Global node limit per analysis.
    #[arg(long, default_value_t = 10_000_000)]
    limit: u64,
}

fn main() -> std::io::Result<()> {
    unwinnable::init();
    let args = Args::parse();

    let reader = BufReader::new(File::open(&args.file)?);

    let mut search = Search::new(Color::White);
    let mut tt = TranspositionTable::default();

    let mut total = 0u64;
    let mut solved = 0u64;
    let mut failed = 0u64;
    let mut pre_static = 0u64;
    let mut static_solved = 0u64;
    let mut total_nodes = 0u64;
    let mut max_nodes = 0u64;

    for line in reader.lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((expected, fen)) = line.split_once(' ') else {
            eprintln!("skipping malformed line: {line}");
            continue;
        };
        let expected = expected.as_bytes();
        if expected.len() != 2 {
            eprintln!("skipping malformed annotation: {line}");
            continue;
        }

        let pos: Chess = match fen
            .parse::<Fen>()
            .ok()
            .and_then(|f| f.into_position(CastlingMode::Standard).ok())
        {
            Some(pos) => pos,
            None => {
                eprintln!("skipping unparseable position: {line}");
                continue;
            }
        };

        for (winner, expected_winnable) in [
            (Color::White, expected[0] == b'W'),
            (Color::Black, expected[1] == b'B'),
        ] {
            let winner_name = if winner.is_white() { "white" } else { "black" };
            total += 1;
            search.reset(winner);
            search.set_node_limit(args.limit);
            let result = full_analysis(&pos, winner, &mut search, &mut tt);

            let nodes = search.nodes();
            total_nodes += nodes;
            max_nodes = max_nodes.max(nodes);

            if result == SearchResult::Undetermined {
                println!("undetermined ({line} {winner_name})");
                continue;
            }

            solved += 1;
            match search.phase() {
                AnalysisPhase::PreStatic => pre_static += 1,
                AnalysisPhase::Static => static_solved += 1,
                AnalysisPhase::PostStatic => {}
            }

            let winnable = result == SearchResult::Winnable;
            if winnable != expected_winnable {
                failed += 1;
                println!(
                    "mismatch: {winner_name} expected {} got {:?} ({line})",
                    if expected_winnable { "winnable" } else { "unwinnable" },
                    result
                );
            }
        }
    }

    println!();
    println!("positions:");
    println!("     solved: {solved}/{total}");
    println!("   unsolved: {}", total - solved);
    println!("     failed: {failed}");
    println!(" pre-static: {pre_static}");
    println!("     static: {static_solved}");
    println!("post-static: {}", solved - pre_static - static_solved);
    println!();
    println!("nodes:");
    println!("      total: {total_nodes}");
    println!("    average: {}", total_nodes / total.max(1));
    println!("    maximum: {max_nodes}");

    Ok(())
}
