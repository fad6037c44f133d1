//! Perft testing module.
//!
//! This module implements the **perft (performance test)** routine, which is
//! used to validate move generation correctness by counting the number of
//! leaf nodes reachable from a given position at a specified search depth.
//!
//! The generator emits only legal moves, so perft is a straight recursion of
//! make, count, unmake. The companion `divide` breaks the total down per
//! root move, the standard way of bisecting a generator bug against a known
//! good engine.

use crate::board::Board;
use crate::movegen::legal_moves;

/// Counts the leaf positions of the legal move tree at `depth`.
/// `perft(board, 0)` is 1 by definition.
pub fn perft(board: &mut Board, depth: u32) -> u64 {
    if depth == 0 {
        return 1;
    }

    let moves = legal_moves(board);
    if depth == 1 {
        return moves.len() as u64;
    }

    let mut nodes = 0;
    for &m in moves.iter() {
        board.make_move(m);
        nodes += perft(board, depth - 1);
        board.unmake_move(m);
    }
    nodes
}

/// Prints the subtree count below every root move, then the total.
pub fn divide(board: &mut Board, depth: u32) -> u64 {
    let moves = legal_moves(board);
    let mut nodes = 0;

    for &m in moves.iter() {
        board.make_move(m);
        let count = if depth > 0 { perft(board, depth - 1) } else { 1 };
        board.unmake_move(m);
        println!("{m}: {count}");
        nodes += count;
    }
    println!("total: {nodes}");
    nodes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::START_FEN;

    const KIWIPETE: &str = "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1";
    const POSITION_4: &str = "r3k2r/Pppp1ppp/1b3nbN/nP6/BBP1P3/q4N2/Pp1P2PP/R2Q1RK1 w kq - 0 1";
    const POSITION_5: &str = "rnbq1k1r/pp1Pbppp/2p5/8/2B5/8/PPP1NnPP/RNBQK2R w KQ - 1 8";
    const EDWARDS: &str = "r4rk1/1pp1qppp/p1np1n2/2b1p1B1/2B1P1b1/P1NP1N2/1PP1QPPP/R4RK1 w - - 0 10";

    fn expect(fen: &str, counts: &[u64]) {
        let mut board = Board::new();
        board.from_fen(fen).unwrap();
        assert_eq!(perft(&mut board, 0), 1);
        for (i, &count) in counts.iter().enumerate() {
            let depth = (i + 1) as u32;
            assert_eq!(perft(&mut board, depth), count, "depth {depth} of {fen}");
        }
    }

    #[test]
    fn startpos_shallow() {
        expect(START_FEN, &[20, 400, 8902, 197_281]);
    }

    #[test]
    #[ignore = "minutes in a debug build; run with --ignored"]
    fn startpos_deep() {
        expect(START_FEN, &[20, 400, 8902, 197_281, 4_865_609, 119_060_324]);
    }

    #[test]
    fn kiwipete_shallow() {
        expect(KIWIPETE, &[48, 2039, 97_862]);
    }

    #[test]
    fn position_4_shallow() {
        expect(POSITION_4, &[6, 264, 9467, 422_333]);
    }

    #[test]
    fn position_5_shallow() {
        expect(POSITION_5, &[44, 1486, 62_379]);
    }

    #[test]
    #[ignore = "minutes in a debug build; run with --ignored"]
    fn position_5_deep() {
        expect(POSITION_5, &[44, 1486, 62_379, 2_103_487, 89_941_194]);
    }

    #[test]
    fn edwards_shallow() {
        expect(EDWARDS, &[46, 2079, 89_890]);
    }

    #[test]
    #[ignore = "minutes in a debug build; run with --ignored"]
    fn edwards_deep() {
        expect(EDWARDS, &[46, 2079, 89_890, 3_894_594, 164_075_551]);
    }

    #[test]
    fn divide_agrees_with_perft() {
        let mut board = Board::new();
        board.from_fen(KIWIPETE).unwrap();
        assert_eq!(divide(&mut board, 2), 2039);
    }
}
