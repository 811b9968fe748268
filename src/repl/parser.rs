//! Query-line parsing for the analyzer loop.

use shakmaty::fen::Fen;
use shakmaty::{CastlingMode, Chess, Color, Position};

/// One parsed input line: the position and the player who is supposed to
/// win.
pub struct Query {
    pub pos: Chess,
    pub winner: Color,
}

/// Parse `<FEN> [white|black]`. Without the trailing token the intended
/// winner defaults to the player who just moved.
pub fn parse_query(line: &str) -> Result<Query, String> {
    let mut fen_tokens: Vec<&str> = Vec::new();
    let mut winner_token = None;

    for token in line.split_whitespace() {
        match token {
            "white" => {
                winner_token = Some(Color::White);
                break;
            }
            "black" => {
                winner_token = Some(Color::Black);
                break;
            }
            _ => fen_tokens.push(token),
        }
    }

    let fen: Fen = fen_tokens
        .join(" ")
        .parse()
        .map_err(|e| format!("bad FEN: {e}"))?;
    let pos: Chess = fen
        .into_position(CastlingMode::Standard)
        .map_err(|e| format!("illegal position: {e}"))?;
    let winner = winner_token.unwrap_or(!pos.turn());

    Ok(Query { pos, winner })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn winner_defaults_to_the_player_who_moved() {
        let query = parse_query("4k3/8/4K3/8/8/8/8/8 w - -").expect("parses");
        assert_eq!(query.winner, Color::Black);

        let query = parse_query("4k3/8/4K3/8/8/8/8/8 b - - 0 1").expect("parses");
        assert_eq!(query.winner, Color::White);
    }

    #[test]
    fn explicit_winner_token_wins() {
        let query = parse_query("4k3/8/4K3/8/8/8/8/8 w - - white").expect("parses");
        assert_eq!(query.winner, Color::White);
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(parse_query("not a fen at all").is_err());
        // Side to move could capture the king: rejected at construction.
        assert!(parse_query("4k3/4Q3/4K3/8/8/8/8/8 w - -").is_err());
    }
}
