//! The UCI text protocol front-end.
//!
//! Stdout belongs to the protocol; every diagnostic goes to stderr. A
//! `position` command that fails to parse, or that contains an illegal
//! move, is reported and the previous position is kept.

use std::io::{self, BufRead, Write};

use crate::board::Board;
use crate::movegen::legal_moves;
use crate::moves::parse_move_text;
use crate::search;

/// Reads commands from stdin until `quit` or end of input.
pub fn run() {
    let stdin = io::stdin();
    let mut board = Board::new();
    board.set_startpos();

    for line in stdin.lock().lines() {
        let Ok(line) = line else { break };
        let Some(command) = line.split_whitespace().next() else { continue };

        match command {
            "uci" => {
                println!("id name Vezir {}", env!("CARGO_PKG_VERSION"));
                println!("id author the Vezir developers");
                println!("uciok");
            }
            "isready" => println!("readyok"),
            "ucinewgame" => board.set_startpos(),
            "position" => match position_from(&line) {
                Ok(new_board) => board = new_board,
                Err(message) => eprintln!("{message}"),
            },
            "go" => match search::best_move(&mut board, search::DEFAULT_DEPTH) {
                Some(m) => println!("bestmove {m}"),
                None => println!("bestmove 0000"),
            },
            "quit" => return,
            _ => eprintln!("discarding unknown command `{line}`"),
        }
        io::stdout().flush().ok();
    }
}

/// Builds the board a `position` command describes: `startpos` or a FEN,
/// then a `moves` tail replayed against the legal move list of each
/// intermediate position.
fn position_from(line: &str) -> Result<Board, String> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let moves_at = tokens.iter().position(|t| *t == "moves").unwrap_or(tokens.len());

    let mut board = Board::new();
    match tokens.get(1) {
        Some(&"startpos") => board.set_startpos(),
        Some(&"fen") => {
            let fen = tokens[2..moves_at].join(" ");
            board.from_fen(&fen).map_err(|err| format!("rejected position: {err}"))?;
        }
        _ => return Err("position needs `startpos` or `fen <FEN>`".to_string()),
    }

    if moves_at == tokens.len() {
        return Ok(board);
    }
    for token in &tokens[moves_at + 1..] {
        let (from, to, promotion) =
            parse_move_text(token).map_err(|err| format!("rejected move `{token}`: {err}"))?;
        match legal_moves(&board).find(from, to, promotion) {
            Some(m) => board.make_move(m),
            None => return Err(format!("illegal move `{token}`")),
        }
    }
    Ok(board)
}
