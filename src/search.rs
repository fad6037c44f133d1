//! Fixed-depth negamax search with alpha-beta pruning.

use crate::board::Board;
use crate::eval::eval;
use crate::movegen::legal_moves;
use crate::moves::Move;

/// Scores are centipawns; mate dwarfs any material total. Kept well inside
/// `i32` so negation can never overflow.
pub const INF: i32 = 1_000_000;

/// Plies searched below the root on a `go` command.
pub const DEFAULT_DEPTH: u32 = 5;

/// Returns the root move with the best negamax score, or `None` when the
/// side to move has no legal moves. On equal scores the first move in
/// generation order wins, which keeps the choice deterministic.
pub fn best_move(board: &mut Board, depth: u32) -> Option<Move> {
    debug_assert!(depth > 0);
    let moves = legal_moves(board);
    let mut best: Option<Move> = None;
    let mut best_score = -INF - 1;

    for &m in moves.iter() {
        board.make_move(m);
        let score = -negamax(board, depth - 1, -INF, INF);
        board.unmake_move(m);
        if score > best_score {
            best_score = score;
            best = Some(m);
        }
    }
    best
}

/// Fail-hard alpha-beta: scores above `beta` are cut off and reported as
/// `beta` itself. Terminal positions score `-INF` for the mated side and `0`
/// for stalemate.
fn negamax(board: &mut Board, depth: u32, mut alpha: i32, beta: i32) -> i32 {
    if depth == 0 {
        return eval(board);
    }

    let moves = legal_moves(board);
    if moves.is_empty() {
        return if board.king_in_check(board.side_to_move()) { -INF } else { 0 };
    }

    for &m in moves.iter() {
        board.make_move(m);
        let score = -negamax(board, depth - 1, -beta, -alpha);
        board.unmake_move(m);
        if score >= beta {
            // Too good: the opponent had a better alternative earlier.
            return beta;
        }
        if score > alpha {
            alpha = score;
        }
    }
    alpha
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::START_FEN;

    fn board(fen: &str) -> Board {
        let mut b = Board::new();
        b.from_fen(fen).unwrap();
        b
    }

    #[test]
    fn finds_a_mate_in_one() {
        // Only b6b8 mates; a7a8 lets the king slip to g7.
        let mut b = board("6k1/R7/1R6/8/8/8/8/K7 w - - 0 1");
        let best = best_move(&mut b, 3).unwrap();
        assert_eq!(best.to_string(), "b6b8");
    }

    #[test]
    fn prefers_winning_a_queen() {
        // The black queen on h4 hangs to the g3 pawn; the pawn is pinned
        // along h4-e1, but capturing the pinner stays on the ray.
        let mut b = board("rnb1kbnr/pppp1ppp/8/4p3/7q/5PP1/PPPPP2P/RNBQKBNR w KQkq - 0 1");
        let best = best_move(&mut b, 3).unwrap();
        assert_eq!(best.to_string(), "g3h4");
    }

    #[test]
    fn search_is_deterministic() {
        let mut a = board(START_FEN);
        let mut b = board(START_FEN);
        assert_eq!(best_move(&mut a, 4), best_move(&mut b, 4));
    }

    #[test]
    fn search_leaves_the_position_untouched() {
        let mut b = board(START_FEN);
        let before = b.clone();
        let _ = best_move(&mut b, 3);
        assert_eq!(b, before);
    }

    #[test]
    fn no_move_is_returned_for_a_finished_game() {
        let mut mated = board("R3k3/6R1/8/8/8/8/8/4K3 b - - 0 1");
        assert_eq!(best_move(&mut mated, 3), None);
        let mut stalemated = board("k7/2Q5/8/8/8/8/8/4K3 b - - 0 1");
        assert_eq!(best_move(&mut stalemated, 3), None);
    }
}
