//! Line-oriented front end.
//!
//! One query per line on stdin, one result line per query on stdout. A line
//! holds a FEN and optionally the intended winner; `quit` ends the loop.
//! With the `test` argument the loop reads the bundled corpus instead of
//! stdin.

pub mod parser;

use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::time::Instant;

use shakmaty::{CastlingMode, Color};

use crate::search::{self, Search, SearchResult, TranspositionTable, DEFAULT_NODE_LIMIT};

/// Positions file used by the `test` argument.
pub const TEST_CORPUS_PATH: &str = "data/positions.txt";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pipeline {
    Full,
    Quick,
    Shortest,
}

#[derive(Debug, Clone)]
pub struct Options {
    pub pipeline: Pipeline,
    /// Print nothing for winnable positions.
    pub suppress_winnable: bool,
    /// Print a game result tag instead of a verdict.
    pub pgn_result: bool,
    /// Read the bundled corpus instead of stdin.
    pub corpus: bool,
    pub node_limit: u64,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            pipeline: Pipeline::Full,
            suppress_winnable: false,
            pgn_result: false,
            corpus: false,
            node_limit: DEFAULT_NODE_LIMIT,
        }
    }
}

impl Options {
    /// Parse the argument vocabulary: `test`, `-u`, `-quick`, `-min`,
    /// `-limit N`, `-timeout`.
    pub fn from_args<I: Iterator<Item = String>>(mut args: I) -> Result<Options, String> {
        let mut options = Options::default();
        let mut quick = false;
        let mut shortest = false;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "test" => options.corpus = true,
                "-u" => options.suppress_winnable = true,
                "-quick" => quick = true,
                "-min" => shortest = true,
                "-limit" => {
                    let value = args.next().ok_or("-limit expects a number")?;
                    options.node_limit = value
                        .parse()
                        .map_err(|_| format!("bad -limit value: {value}"))?;
                }
                "-timeout" => options.pgn_result = true,
                other => return Err(format!("unknown argument: {other}")),
            }
        }

        if quick && shortest {
            return Err("-min cannot be combined with -quick".to_string());
        }
        options.pipeline = if shortest {
            Pipeline::Shortest
        } else if quick {
            Pipeline::Quick
        } else {
            Pipeline::Full
        };

        Ok(options)
    }
}

/// The result line body, or None when this mode stays silent for the given
/// verdict.
fn format_result(search: &Search, result: SearchResult, options: &Options) -> Option<String> {
    if options.pgn_result {
        return Some(match result {
            SearchResult::Unwinnable => "1/2-1/2".to_string(),
            _ => {
                if search.intended_winner().is_white() {
                    "1-0".to_string()
                } else {
                    "0-1".to_string()
                }
            }
        });
    }

    match result {
        SearchResult::Winnable => {
            if options.suppress_winnable || options.pipeline == Pipeline::Quick {
                return None;
            }
            let mut text = String::from("winnable");
            for m in search.mate_sequence() {
                text.push(' ');
                text.push_str(&m.to_uci(CastlingMode::Standard).to_string());
            }
            text.push('#');
            Some(text)
        }
        SearchResult::Unwinnable => Some("unwinnable".to_string()),
        SearchResult::Undetermined => {
            if options.pipeline == Pipeline::Quick {
                None
            } else {
                Some("undetermined".to_string())
            }
        }
    }
}

/// Run the query loop until end of input or `quit`.
pub fn run(options: &Options) -> io::Result<()> {
    let reader: Box<dyn BufRead> = if options.corpus {
        Box::new(BufReader::new(File::open(TEST_CORPUS_PATH)?))
    } else {
        Box::new(BufReader::new(io::stdin()))
    };
    let stdout = io::stdout();
    let mut out = stdout.lock();

    let mut search = Search::new(Color::White);
    let mut tt = TranspositionTable::default();

    for line in reader.lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if line == "quit" {
            break;
        }

        search.reset(Color::White);
        search.set_node_limit(options.node_limit);

        let started = Instant::now();
        let result = match parser::parse_query(line) {
            Ok(query) => match options.pipeline {
                Pipeline::Full => {
                    search::full_analysis(&query.pos, query.winner, &mut search, &mut tt)
                }
                Pipeline::Quick => search::quick_analysis(&query.pos, query.winner, &mut search),
                Pipeline::Shortest => {
                    search::find_shortest(&query.pos, query.winner, &mut search, &mut tt)
                }
            },
            Err(_) => SearchResult::Undetermined,
        };
        let elapsed = started.elapsed().as_millis();

        if let Some(text) = format_result(&search, result, options) {
            writeln!(
                out,
                "{} nodes {} time {} ({})",
                text,
                search.nodes(),
                elapsed,
                line
            )?;
            out.flush()?;
        }
    }

    Ok(())
}
