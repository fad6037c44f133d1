//! Legal move generation.
//!
//! The generator produces exactly the legal moves, without a
//! pseudo-legal-then-filter pass. Before emitting anything it classifies the
//! position: how many pieces check the king, which squares a non-king move
//! may go to at all (`targets`), and which of our pieces are absolutely
//! pinned together with the line they are pinned on. Emission then reduces
//! to intersecting each piece's pseudo-attacks with those masks. The king,
//! castling, and en passant get their own treatment.

use crate::attack;
use crate::bitboard::{above, below, left_of, right_of, Bitboard};
use crate::board::Board;
use crate::magics;
use crate::moves::{Move, MoveKind};
use crate::types::{
    castling, file_of, promotion_rank, rank_of, square::*, Color, Piece, PieceType, NULL_SQUARE,
};

/// A fixed-capacity list of the moves generated for one position. Certain
/// positions can reach ~200 legal moves, hence the rounding to 256.
pub struct MoveList {
    moves: [Move; 256],
    count: usize,
}

impl MoveList {
    pub fn new() -> Self {
        Self { moves: [Move::NULL; 256], count: 0 }
    }

    pub fn push(&mut self, m: Move) {
        self.moves[self.count] = m;
        self.count += 1;
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Move> {
        self.moves[..self.count].iter()
    }

    /// Resolves parsed move text against this list. The promotion piece must
    /// match exactly: a bare `e7e8` does not resolve to a promotion.
    pub fn find(&self, from: u8, to: u8, promotion: Option<PieceType>) -> Option<Move> {
        self.iter().copied().find(|m| {
            m.from() == from
                && m.to() == to
                && if m.is_promotion() {
                    promotion == Some(m.promotion_kind())
                } else {
                    promotion.is_none()
                }
        })
    }
}

/// Generates the exact set of legal moves for the side to move.
pub fn legal_moves(board: &Board) -> MoveList {
    let mut gen = Generator::new(board);
    gen.run();
    gen.list
}

struct Generator<'a> {
    board: &'a Board,
    us: Color,
    them: Color,
    king_sq: u8,
    occupancy: Bitboard,

    /// Number of pieces giving check.
    checks: u32,
    /// Squares a non-king piece may move to: everything when not in check,
    /// the checker and its ray when in single check.
    targets: Bitboard,
    /// Our absolutely pinned pieces.
    pins: Bitboard,
    /// For each pinned square, the line through king and pinner it may stay
    /// on.
    pin_rays: [Bitboard; 64],

    list: MoveList,
}

impl<'a> Generator<'a> {
    fn new(board: &'a Board) -> Self {
        let us = board.side_to_move();
        Self {
            board,
            us,
            them: !us,
            king_sq: board.king_square(us),
            occupancy: board.occupancy(),
            checks: 0,
            targets: Bitboard::ALL,
            pins: Bitboard::EMPTY,
            pin_rays: [Bitboard::EMPTY; 64],
            list: MoveList::new(),
        }
    }

    fn run(&mut self) {
        self.leaper_checks();
        self.slider_checks_and_pins();

        if self.checks <= 1 {
            self.piece_moves();
            if self.checks == 0 {
                self.castling_moves();
            }
            if self.board.en_passant() != NULL_SQUARE {
                self.en_passant_moves();
            }
        }
        self.king_moves();
    }

    /// Pawn and knight checks, found by the symmetry trick from the king's
    /// square. A leaper check cannot be blocked, so the only non-king answer
    /// is capturing the checker.
    fn leaper_checks(&mut self) {
        let tables = attack::tables();
        let pawn_checkers = tables.pawn_capture[self.us][self.king_sq as usize]
            & self.board.piece_of(PieceType::Pawn, self.them);
        if !pawn_checkers.is_empty() {
            self.checks += pawn_checkers.popcnt();
            self.targets &= pawn_checkers;
        }
        let knight_checkers =
            tables.knight[self.king_sq as usize] & self.board.piece_of(PieceType::Knight, self.them);
        if !knight_checkers.is_empty() {
            self.checks += knight_checkers.popcnt();
            self.targets &= knight_checkers;
        }
    }

    /// Casts the king as a slider against opponent-only occupancy, so our
    /// own pieces do not interrupt the rays, and splits the result into the
    /// eight directional rays. A ray whose first opposing piece is a matching
    /// slider either checks the king (no own blocker), pins the single own
    /// blocker, or is harmless (two or more blockers).
    fn slider_checks_and_pins(&mut self) {
        let board = self.board;
        let magics = magics::tables();
        let rook_like =
            board.piece_of(PieceType::Rook, self.them) | board.piece_of(PieceType::Queen, self.them);
        let bishop_like = board.piece_of(PieceType::Bishop, self.them)
            | board.piece_of(PieceType::Queen, self.them);

        let opponent_occ = board.color(self.them);
        let king_rank = rank_of(self.king_sq);
        let king_file = file_of(self.king_sq);

        let rook_rays = magics.rook_attacks(self.king_sq, opponent_occ);
        self.slider_ray(rook_like, rook_rays & above(king_rank));
        self.slider_ray(rook_like, rook_rays & below(king_rank));
        self.slider_ray(rook_like, rook_rays & left_of(king_file));
        self.slider_ray(rook_like, rook_rays & right_of(king_file));

        let bishop_rays = magics.bishop_attacks(self.king_sq, opponent_occ);
        self.slider_ray(bishop_like, bishop_rays & above(king_rank) & left_of(king_file));
        self.slider_ray(bishop_like, bishop_rays & above(king_rank) & right_of(king_file));
        self.slider_ray(bishop_like, bishop_rays & below(king_rank) & left_of(king_file));
        self.slider_ray(bishop_like, bishop_rays & below(king_rank) & right_of(king_file));
    }

    fn slider_ray(&mut self, opponent_sliders: Bitboard, ray: Bitboard) {
        let attackers = opponent_sliders & ray;
        if attackers.is_empty() {
            return;
        }
        let blockers = ray & self.board.color(self.us);
        match blockers.popcnt() {
            0 => {
                self.checks += 1;
                self.targets &= ray;
            }
            1 => {
                self.pins |= blockers;
                self.pin_rays[blockers.lsb() as usize] = ray;
            }
            _ => {}
        }
    }

    /// Emits the moves of every non-king piece: free pieces against
    /// `targets`, pinned pieces additionally restricted to their pin ray.
    fn piece_moves(&mut self) {
        let board = self.board;
        for piece in PieceType::NON_KING {
            let positions = board.piece_of(piece, self.us);

            let mut free = positions & !self.pins;
            while !free.is_empty() {
                let from = free.pop_lsb();
                let ends = board.attacks_from(piece, self.us, from, self.occupancy);
                self.push_moves(from, piece, ends);
            }

            let mut pinned = positions & self.pins;
            while !pinned.is_empty() {
                let from = pinned.pop_lsb();
                let ends = board.attacks_from(piece, self.us, from, self.occupancy)
                    & self.pin_rays[from as usize];
                self.push_moves(from, piece, ends);
            }
        }
    }

    fn castling_moves(&mut self) {
        // Squares that must be empty between king and rook.
        const WK_EMPTY: Bitboard = Bitboard(0x60);
        const WQ_EMPTY: Bitboard = Bitboard(0x0E);
        const BK_EMPTY: Bitboard = Bitboard(0x6000_0000_0000_0000);
        const BQ_EMPTY: Bitboard = Bitboard(0x0E00_0000_0000_0000);

        let rights = self.board.castling();
        let occ = self.occupancy;
        // The king's home square is known safe: castling is not generated
        // while in check. Only the transit and destination squares need the
        // attack test.
        match self.us {
            Color::White => {
                if rights & castling::WHITE_KING_SIDE != 0
                    && (occ & WK_EMPTY).is_empty()
                    && self.safe_for_king(F1)
                    && self.safe_for_king(G1)
                {
                    self.list.push(Move::new_special(E1, G1, MoveKind::KingCastle));
                }
                if rights & castling::WHITE_QUEEN_SIDE != 0
                    && (occ & WQ_EMPTY).is_empty()
                    && self.safe_for_king(D1)
                    && self.safe_for_king(C1)
                {
                    self.list.push(Move::new_special(E1, C1, MoveKind::QueenCastle));
                }
            }
            Color::Black => {
                if rights & castling::BLACK_KING_SIDE != 0
                    && (occ & BK_EMPTY).is_empty()
                    && self.safe_for_king(F8)
                    && self.safe_for_king(G8)
                {
                    self.list.push(Move::new_special(E8, G8, MoveKind::KingCastle));
                }
                if rights & castling::BLACK_QUEEN_SIDE != 0
                    && (occ & BQ_EMPTY).is_empty()
                    && self.safe_for_king(D8)
                    && self.safe_for_king(C8)
                {
                    self.list.push(Move::new_special(E8, C8, MoveKind::QueenCastle));
                }
            }
        }
    }

    fn safe_for_king(&self, sq: u8) -> bool {
        self.board.attackers_to(sq, self.them, self.occupancy).is_empty()
    }

    /// En passant is the one capture whose victim does not stand on the
    /// destination square, which breaks both the `targets` logic and the pin
    /// analysis in ways handled here.
    fn en_passant_moves(&mut self) {
        let board = self.board;
        let ep = board.en_passant();
        let mut capturers = attack::tables().pawn_capture[self.them][ep as usize]
            & board.piece_of(PieceType::Pawn, self.us);
        if capturers.is_empty() {
            return;
        }
        let victim = if self.us == Color::White { ep - 8 } else { ep + 8 };

        if self.targets.test(victim) {
            // The victim pawn itself is a wanted target (it gives check, or
            // stands on a check ray); capturing it en passant resolves the
            // check just as well, so the landing square becomes a target too.
            self.targets.set(ep);
        }

        if rank_of(self.king_sq) == rank_of(victim) && capturers.popcnt() == 1 {
            // The capture removes two pieces from the king's rank at once, a
            // pattern the pin analysis cannot see. Re-cast the rook ray with
            // both of them gone: if an opposing rook or queen appears on the
            // capturer's side, the move is illegal.
            let capturer = capturers.lsb();
            let mut occ = self.occupancy;
            occ.clear(victim);
            occ.clear(capturer);
            let rays = magics::tables().rook_attacks(self.king_sq, occ);
            let side = if self.king_sq < capturer {
                right_of(file_of(self.king_sq))
            } else {
                left_of(file_of(self.king_sq))
            };
            let rook_like = board.piece_of(PieceType::Rook, self.them)
                | board.piece_of(PieceType::Queen, self.them);
            if (rays & side & rook_like).is_empty() && self.targets.test(ep) {
                self.list.push(Move::new_special(capturer, ep, MoveKind::EnPassant));
            }
        } else {
            while !capturers.is_empty() {
                let from = capturers.pop_lsb();
                let mut ends = Bitboard::from_square(ep) & self.targets;
                if self.pins.test(from) {
                    ends &= self.pin_rays[from as usize];
                }
                if !ends.is_empty() {
                    self.list.push(Move::new_special(from, ep, MoveKind::EnPassant));
                }
            }
        }
    }

    /// King moves are checked against attacks computed with the king removed
    /// from the occupancy: a slider's ray continues through the square the
    /// king just left.
    fn king_moves(&mut self) {
        let board = self.board;
        let mut occ_without_king = self.occupancy;
        occ_without_king.clear(self.king_sq);

        let mut ends = attack::tables().king[self.king_sq as usize] & !board.color(self.us);
        while !ends.is_empty() {
            let to = ends.pop_lsb();
            if !board.attackers_to(to, self.them, occ_without_king).is_empty() {
                continue;
            }
            if board.piece_on(to) != Piece::None {
                self.list.push(Move::new_special(self.king_sq, to, MoveKind::Capture));
            } else {
                self.list.push(Move::new_normal(self.king_sq, to));
            }
        }
    }

    /// Emits `from` to every square of `ends & targets`, classifying the
    /// move kind and fanning promotions out into the four choices.
    fn push_moves(&mut self, from: u8, piece: PieceType, ends: Bitboard) {
        let mut ends = ends & self.targets;
        while !ends.is_empty() {
            let to = ends.pop_lsb();
            let capture = self.board.piece_on(to) != Piece::None;

            if piece == PieceType::Pawn && rank_of(to) == promotion_rank(self.us) {
                for kind in [PieceType::Knight, PieceType::Bishop, PieceType::Rook, PieceType::Queen]
                {
                    self.list.push(Move::new_special(from, to, MoveKind::promotion(kind, capture)));
                }
            } else if capture {
                self.list.push(Move::new_special(from, to, MoveKind::Capture));
            } else if piece == PieceType::Pawn && from.abs_diff(to) == 16 {
                self.list.push(Move::new_special(from, to, MoveKind::DoublePush));
            } else {
                self.list.push(Move::new_normal(from, to));
            }
        }
    }
}
