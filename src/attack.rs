use std::sync::OnceLock;

use crate::bitboard::Bitboard;
use crate::types::Color;

/// Precomputed attack maps for the leaper pieces, plus pawn push masks.
///
/// Pawn tables are indexed `[color][square]`. A pawn on its promotion rank
/// attacks nothing and pushes nowhere; the double-push mask is only populated
/// on each side's home rank.
pub struct AttackTables {
    pub knight: [Bitboard; 64],
    pub king: [Bitboard; 64],
    pub pawn_capture: [[Bitboard; 64]; 2],
    pub pawn_push: [[Bitboard; 64]; 2],
    pub pawn_double_push: [[Bitboard; 64]; 2],
}

#[rustfmt::skip]
const KNIGHT_DELTAS: [(i8, i8); 8] =
    [(2, 1), (2, -1), (1, 2), (1, -2), (-1, 2), (-1, -2), (-2, 1), (-2, -1)];

#[rustfmt::skip]
const KING_DELTAS: [(i8, i8); 8] =
    [(1, -1), (1, 0), (1, 1), (0, -1), (0, 1), (-1, -1), (-1, 0), (-1, 1)];

/// Global attack tables, initialized exactly once on first access.
/// Rust discourages mutable static global variables because of the lack of thread safety.
/// The idiomatic way to hold process-lifetime read-only tables is a OnceLock: one atomic
/// check on first access, a plain load afterwards, no locks and no branches in steady state.
static ATTACKS: OnceLock<AttackTables> = OnceLock::new();

pub fn tables() -> &'static AttackTables {
    ATTACKS.get_or_init(AttackTables::new)
}

impl AttackTables {
    fn new() -> Self {
        let mut tables = Self {
            knight: [Bitboard::EMPTY; 64],
            king: [Bitboard::EMPTY; 64],
            pawn_capture: [[Bitboard::EMPTY; 64]; 2],
            pawn_push: [[Bitboard::EMPTY; 64]; 2],
            pawn_double_push: [[Bitboard::EMPTY; 64]; 2],
        };

        for sq in 0..64usize {
            let (rank, file) = ((sq / 8) as i8, (sq % 8) as i8);

            for (dr, df) in KNIGHT_DELTAS {
                tables.knight[sq].set_if_on_board(file + df, rank + dr);
            }
            for (dr, df) in KING_DELTAS {
                tables.king[sq].set_if_on_board(file + df, rank + dr);
            }

            let white = Color::White as usize;
            tables.pawn_capture[white][sq].set_if_on_board(file - 1, rank + 1);
            tables.pawn_capture[white][sq].set_if_on_board(file + 1, rank + 1);
            tables.pawn_push[white][sq].set_if_on_board(file, rank + 1);
            if rank == 1 {
                tables.pawn_double_push[white][sq].set_if_on_board(file, rank + 2);
            }

            let black = Color::Black as usize;
            tables.pawn_capture[black][sq].set_if_on_board(file - 1, rank - 1);
            tables.pawn_capture[black][sq].set_if_on_board(file + 1, rank - 1);
            tables.pawn_push[black][sq].set_if_on_board(file, rank - 1);
            if rank == 6 {
                tables.pawn_double_push[black][sq].set_if_on_board(file, rank - 2);
            }
        }

        tables
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::parse_square;

    fn squares(names: &[&str]) -> Bitboard {
        let mut b = Bitboard::EMPTY;
        for name in names {
            b.set(parse_square(name).unwrap());
        }
        b
    }

    #[test]
    fn knight_moves_are_clipped_to_the_board() {
        let t = tables();
        assert_eq!(t.knight[parse_square("a1").unwrap() as usize], squares(&["b3", "c2"]));
        assert_eq!(
            t.knight[parse_square("d4").unwrap() as usize],
            squares(&["b3", "b5", "c2", "c6", "e2", "e6", "f3", "f5"])
        );
    }

    #[test]
    fn king_moves_exclude_castling() {
        let t = tables();
        assert_eq!(t.king[parse_square("e1").unwrap() as usize], squares(&["d1", "d2", "e2", "f1", "f2"]));
        assert_eq!(t.king[parse_square("e4").unwrap() as usize].popcnt(), 8);
    }

    #[test]
    fn edge_pawns_attack_a_single_square() {
        let t = tables();
        let white = Color::White as usize;
        let black = Color::Black as usize;
        assert_eq!(t.pawn_capture[white][parse_square("a2").unwrap() as usize], squares(&["b3"]));
        assert_eq!(t.pawn_capture[black][parse_square("h7").unwrap() as usize], squares(&["g6"]));
    }

    #[test]
    fn last_rank_pawns_attack_nothing() {
        let t = tables();
        let white = Color::White as usize;
        let black = Color::Black as usize;
        for file in 0..8u8 {
            let sq = (56 + file) as usize;
            assert!(t.pawn_capture[white][sq].is_empty());
            assert!(t.pawn_push[white][sq].is_empty());
            let sq = file as usize;
            assert!(t.pawn_capture[black][sq].is_empty());
            assert!(t.pawn_push[black][sq].is_empty());
        }
    }

    #[test]
    fn double_pushes_only_from_the_home_rank() {
        let t = tables();
        let white = Color::White as usize;
        let black = Color::Black as usize;
        assert_eq!(t.pawn_double_push[white][parse_square("e2").unwrap() as usize], squares(&["e4"]));
        assert!(t.pawn_double_push[white][parse_square("e3").unwrap() as usize].is_empty());
        assert_eq!(t.pawn_double_push[black][parse_square("c7").unwrap() as usize], squares(&["c5"]));
        assert!(t.pawn_double_push[black][parse_square("c6").unwrap() as usize].is_empty());
    }
}
