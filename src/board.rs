use std::fmt;

use crate::attack;
use crate::bitboard::Bitboard;
use crate::error::ParseError;
use crate::magics;
use crate::moves::{Move, MoveKind};
use crate::types::{
    castling, rank_of, square::*, square_at, square_name, Color, Piece, PieceType, NULL_SQUARE,
};

pub const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// The complete game state: a square-to-piece mailbox kept in lockstep with
/// the piece and color bitboards, plus a stack of per-ply state records.
///
/// The top of the stack always holds the *current* castling rights,
/// en-passant target, halfmove clock, and the piece captured by the move
/// that produced the position. `make_move` pushes a record, `unmake_move`
/// pops it; everything the move encoding itself cannot reconstruct is
/// restored from there.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Board {
    mailbox: [Piece; 64],
    pieces: [Bitboard; PieceType::NUM], // p,n,b,r,q,k, color agnostic
    colors: [Bitboard; 2],              // Per-color occupancy
    side_to_move: Color,
    states: Vec<State>,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
struct State {
    castling: u8,
    en_passant: u8,
    halfmove: u8,
    captured: Piece, // Which piece the move leading here removed
}

impl Default for Board {
    fn default() -> Self {
        Self {
            mailbox: [Piece::None; 64],
            pieces: [Bitboard::EMPTY; PieceType::NUM],
            colors: [Bitboard::EMPTY; 2],
            side_to_move: Color::White,
            states: vec![State {
                castling: castling::NONE,
                en_passant: NULL_SQUARE,
                halfmove: 0,
                captured: Piece::None,
            }],
        }
    }
}

impl Board {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets board to the starting position.
    pub fn set_startpos(&mut self) {
        self.from_fen(START_FEN).unwrap();
    }

    /// Sets board state from a FEN string. On failure the board is left
    /// unchanged.
    pub fn from_fen(&mut self, fen: &str) -> Result<(), ParseError> {
        let mut fields = fen.split_whitespace();
        let placement = fields.next().ok_or(ParseError::MissingField("piece placement"))?;
        let side_field = fields.next().ok_or(ParseError::MissingField("side to move"))?;
        let castling_field = fields.next().ok_or(ParseError::MissingField("castling rights"))?;
        let ep_field = fields.next().ok_or(ParseError::MissingField("en passant target"))?;
        let halfmove_field = fields.next().unwrap_or("0");
        let _fullmove = fields.next(); // consumed, unused by the engine

        // ===== Parse piece placement, ranks 8 down to 1 =====
        let mut mailbox = [Piece::None; 64];
        let mut pieces = [Bitboard::EMPTY; PieceType::NUM];
        let mut colors = [Bitboard::EMPTY; 2];

        let mut ranks = 0u8;
        for (i, row) in placement.split('/').enumerate() {
            if i >= 8 {
                return Err(ParseError::BadBoardShape);
            }
            let rank = 7 - i as u8;
            let mut file = 0u8;
            for ch in row.chars() {
                if let Some(run) = ch.to_digit(10).filter(|d| (1..=8).contains(d)) {
                    file += run as u8;
                } else {
                    let piece = Piece::from_char(ch).ok_or(ParseError::UnknownPiece(ch))?;
                    if file >= 8 {
                        return Err(ParseError::BadBoardShape);
                    }
                    let sq = square_at(file, rank);
                    mailbox[sq as usize] = piece;
                    pieces[piece.kind()].set(sq);
                    colors[piece.color()].set(sq);
                    file += 1;
                }
            }
            if file != 8 {
                return Err(ParseError::BadBoardShape);
            }
            ranks += 1;
        }
        if ranks != 8 {
            return Err(ParseError::BadBoardShape);
        }
        for color in [Color::White, Color::Black] {
            if (pieces[PieceType::King] & colors[color]).popcnt() != 1 {
                return Err(ParseError::BadKingCount);
            }
        }

        // ===== Parse side to move =====
        let side_to_move = match side_field {
            "w" => Color::White,
            "b" => Color::Black,
            _ => return Err(ParseError::BadSideToMove(side_field.to_string())),
        };

        // ===== Parse castling rights =====
        let mut rights = castling::NONE;
        if castling_field != "-" {
            for ch in castling_field.chars() {
                rights |= match ch {
                    'K' => castling::WHITE_KING_SIDE,
                    'Q' => castling::WHITE_QUEEN_SIDE,
                    'k' => castling::BLACK_KING_SIDE,
                    'q' => castling::BLACK_QUEEN_SIDE,
                    _ => return Err(ParseError::BadCastlingRights(castling_field.to_string())),
                };
            }
        }
        // A right only survives if its king and rook actually stand on their
        // home squares.
        if mailbox[E1 as usize] != Piece::WhiteKing || mailbox[H1 as usize] != Piece::WhiteRook {
            rights &= !castling::WHITE_KING_SIDE;
        }
        if mailbox[E1 as usize] != Piece::WhiteKing || mailbox[A1 as usize] != Piece::WhiteRook {
            rights &= !castling::WHITE_QUEEN_SIDE;
        }
        if mailbox[E8 as usize] != Piece::BlackKing || mailbox[H8 as usize] != Piece::BlackRook {
            rights &= !castling::BLACK_KING_SIDE;
        }
        if mailbox[E8 as usize] != Piece::BlackKing || mailbox[A8 as usize] != Piece::BlackRook {
            rights &= !castling::BLACK_QUEEN_SIDE;
        }

        // ===== Parse en passant target =====
        let en_passant = if ep_field == "-" {
            NULL_SQUARE
        } else {
            let sq = crate::types::parse_square(ep_field)
                .ok_or_else(|| ParseError::BadEnPassant(ep_field.to_string()))?;
            let expected_rank = if side_to_move == Color::White { 5 } else { 2 };
            if rank_of(sq) != expected_rank {
                return Err(ParseError::BadEnPassant(ep_field.to_string()));
            }
            sq
        };

        self.mailbox = mailbox;
        self.pieces = pieces;
        self.colors = colors;
        self.side_to_move = side_to_move;
        self.states.clear();
        self.states.push(State {
            castling: rights,
            en_passant,
            halfmove: halfmove_field.parse().unwrap_or(0),
            captured: Piece::None,
        });
        debug_assert!(self.is_consistent());
        Ok(())
    }

    fn state(&self) -> &State {
        self.states.last().expect("board has no state record")
    }

    #[inline(always)]
    pub fn piece(&self, kind: PieceType) -> Bitboard {
        self.pieces[kind]
    }

    #[inline(always)]
    pub fn color(&self, color: Color) -> Bitboard {
        self.colors[color]
    }

    #[inline(always)]
    pub fn piece_of(&self, kind: PieceType, color: Color) -> Bitboard {
        self.pieces[kind] & self.colors[color]
    }

    #[inline(always)]
    pub fn piece_on(&self, sq: u8) -> Piece {
        self.mailbox[sq as usize]
    }

    #[inline(always)]
    pub fn occupancy(&self) -> Bitboard {
        self.colors[0] | self.colors[1]
    }

    #[inline(always)]
    pub fn side_to_move(&self) -> Color {
        self.side_to_move
    }

    #[inline(always)]
    pub fn castling(&self) -> u8 {
        self.state().castling
    }

    #[inline(always)]
    pub fn en_passant(&self) -> u8 {
        self.state().en_passant
    }

    #[inline(always)]
    pub fn halfmove(&self) -> u8 {
        self.state().halfmove
    }

    #[inline(always)]
    pub fn king_square(&self, color: Color) -> u8 {
        self.piece_of(PieceType::King, color).lsb()
    }

    /// Pseudo-attacks of a piece of `color` standing on `sq` against the
    /// hypothetical occupancy `occ`, masked to exclude same-color squares.
    /// Pawns mix blocked pushes with captures onto occupied squares only.
    pub fn attacks_from(&self, piece: PieceType, color: Color, sq: u8, occ: Bitboard) -> Bitboard {
        let tables = attack::tables();
        let moves = match piece {
            PieceType::Pawn => {
                let mut moves = tables.pawn_capture[color][sq as usize] & occ;
                let push = tables.pawn_push[color][sq as usize] & !occ;
                moves |= push;
                if !push.is_empty() {
                    // The double push needs its transit square free too.
                    moves |= tables.pawn_double_push[color][sq as usize] & !occ;
                }
                moves
            }
            PieceType::Knight => tables.knight[sq as usize],
            PieceType::King => tables.king[sq as usize],
            PieceType::Bishop => magics::tables().bishop_attacks(sq, occ),
            PieceType::Rook => magics::tables().rook_attacks(sq, occ),
            PieceType::Queen => magics::tables().queen_attacks(sq, occ),
        };
        moves & !self.colors[color]
    }

    /// The set of pieces of color `by` attacking `sq` under occupancy `occ`,
    /// found by the symmetry trick: a piece attacks `sq` exactly if the same
    /// piece kind placed on `sq` for the other side would attack it back.
    pub fn attackers_to(&self, sq: u8, by: Color, occ: Bitboard) -> Bitboard {
        let mut attackers = Bitboard::EMPTY;
        for piece in PieceType::ALL {
            attackers |= self.attacks_from(piece, !by, sq, occ) & self.pieces[piece] & self.colors[by];
        }
        attackers
    }

    #[inline(always)]
    pub fn is_attacked(&self, sq: u8, by: Color) -> bool {
        !self.attackers_to(sq, by, self.occupancy()).is_empty()
    }

    pub fn king_in_check(&self, color: Color) -> bool {
        self.is_attacked(self.king_square(color), !color)
    }

    /// Applies a move. The move must come from the legal move generator for
    /// the current position.
    pub fn make_move(&mut self, m: Move) {
        let us = self.side_to_move;
        let them = !us;
        let from = m.from();
        let to = m.to();
        let kind = m.kind();

        let mut st = State {
            castling: self.state().castling,
            en_passant: NULL_SQUARE,
            halfmove: self.state().halfmove.saturating_add(1),
            captured: Piece::None,
        };

        match kind {
            MoveKind::Normal => {
                if self.mailbox[from as usize].kind() == PieceType::Pawn {
                    st.halfmove = 0;
                }
                self.move_piece(from, to);
            }
            MoveKind::DoublePush => {
                st.halfmove = 0;
                self.move_piece(from, to);
                // Only record an en-passant target an opposing pawn can
                // actually use.
                let transit = (from + to) / 2;
                let enemy_pawns = self.piece_of(PieceType::Pawn, them);
                if !(attack::tables().pawn_capture[us][transit as usize] & enemy_pawns).is_empty() {
                    st.en_passant = transit;
                }
            }
            MoveKind::KingCastle | MoveKind::QueenCastle => {
                self.move_piece(from, to);
                let (rook_from, rook_to) = rook_castling_squares(kind, us);
                self.move_piece(rook_from, rook_to);
            }
            MoveKind::Capture => {
                st.halfmove = 0;
                st.captured = self.remove_piece(to);
                self.move_piece(from, to);
            }
            MoveKind::EnPassant => {
                st.halfmove = 0;
                let victim = if us == Color::White { to - 8 } else { to + 8 };
                st.captured = self.remove_piece(victim);
                self.move_piece(from, to);
            }
            _ => {
                // Promotions: the pawn leaves the board, the chosen piece
                // appears on the destination.
                st.halfmove = 0;
                if m.is_capture() {
                    st.captured = self.remove_piece(to);
                }
                self.remove_piece(from);
                self.put_piece(Piece::new(m.promotion_kind(), us), to);
            }
        }

        st.castling &= surviving_rights(from) & surviving_rights(to);

        self.side_to_move = them;
        self.states.push(st);
        debug_assert!(self.is_consistent());
    }

    /// Reverses a move previously applied with `make_move`. Castling rights,
    /// en-passant target and halfmove clock come back by popping the state
    /// stack; the piece placement is reversed from the move encoding.
    pub fn unmake_move(&mut self, m: Move) {
        let st = self.states.pop().expect("unmake_move without a matching make_move");
        self.side_to_move = !self.side_to_move;
        let us = self.side_to_move;
        let from = m.from();
        let to = m.to();
        let kind = m.kind();

        match kind {
            MoveKind::Normal | MoveKind::DoublePush => self.move_piece(to, from),
            MoveKind::KingCastle | MoveKind::QueenCastle => {
                self.move_piece(to, from);
                let (rook_from, rook_to) = rook_castling_squares(kind, us);
                self.move_piece(rook_to, rook_from);
            }
            MoveKind::Capture => {
                self.move_piece(to, from);
                self.put_piece(st.captured, to);
            }
            MoveKind::EnPassant => {
                self.move_piece(to, from);
                let victim = if us == Color::White { to - 8 } else { to + 8 };
                self.put_piece(st.captured, victim);
            }
            _ => {
                self.remove_piece(to);
                self.put_piece(Piece::new(PieceType::Pawn, us), from);
                if m.is_capture() {
                    self.put_piece(st.captured, to);
                }
            }
        }
        debug_assert!(self.is_consistent());
    }

    fn put_piece(&mut self, piece: Piece, sq: u8) {
        debug_assert!(piece != Piece::None && self.mailbox[sq as usize] == Piece::None);
        self.mailbox[sq as usize] = piece;
        self.pieces[piece.kind()].set(sq);
        self.colors[piece.color()].set(sq);
    }

    fn remove_piece(&mut self, sq: u8) -> Piece {
        let piece = self.mailbox[sq as usize];
        debug_assert!(piece != Piece::None);
        self.mailbox[sq as usize] = Piece::None;
        self.pieces[piece.kind()].clear(sq);
        self.colors[piece.color()].clear(sq);
        piece
    }

    fn move_piece(&mut self, from: u8, to: u8) {
        let piece = self.remove_piece(from);
        self.put_piece(piece, to);
    }

    /// Checks the representation invariants: piece bitboards are pairwise
    /// disjoint, the color boards partition the occupancy, the mailbox
    /// agrees with the bitboards square by square, and each side has exactly
    /// one king.
    pub fn is_consistent(&self) -> bool {
        let mut union = Bitboard::EMPTY;
        let mut total = 0;
        for &bb in &self.pieces {
            union |= bb;
            total += bb.popcnt();
        }
        if union.popcnt() != total {
            return false;
        }
        if !(self.colors[0] & self.colors[1]).is_empty() {
            return false;
        }
        if union != (self.colors[0] | self.colors[1]) {
            return false;
        }
        for sq in 0..64u8 {
            let piece = self.mailbox[sq as usize];
            let agrees = if piece == Piece::None {
                !union.test(sq)
            } else {
                self.pieces[piece.kind()].test(sq) && self.colors[piece.color()].test(sq)
            };
            if !agrees {
                return false;
            }
        }
        self.piece_of(PieceType::King, Color::White).popcnt() == 1
            && self.piece_of(PieceType::King, Color::Black).popcnt() == 1
    }
}

/// The rook's from/to squares for each of the four castling moves.
fn rook_castling_squares(kind: MoveKind, color: Color) -> (u8, u8) {
    match (kind, color) {
        (MoveKind::KingCastle, Color::White) => (H1, F1),
        (MoveKind::QueenCastle, Color::White) => (A1, D1),
        (MoveKind::KingCastle, Color::Black) => (H8, F8),
        (MoveKind::QueenCastle, Color::Black) => (A8, D8),
        _ => unreachable!(),
    }
}

/// The castling rights that survive a move touching `sq`. Strips the right
/// whenever the king or rook home square is vacated or captured on.
fn surviving_rights(sq: u8) -> u8 {
    match sq {
        E1 => castling::ALL & !(castling::WHITE_KING_SIDE | castling::WHITE_QUEEN_SIDE),
        H1 => castling::ALL & !castling::WHITE_KING_SIDE,
        A1 => castling::ALL & !castling::WHITE_QUEEN_SIDE,
        E8 => castling::ALL & !(castling::BLACK_KING_SIDE | castling::BLACK_QUEEN_SIDE),
        H8 => castling::ALL & !castling::BLACK_KING_SIDE,
        A8 => castling::ALL & !castling::BLACK_QUEEN_SIDE,
        _ => castling::ALL,
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "  +------------------------+")?;
        for rank in (0..8).rev() {
            write!(f, "{} |", rank + 1)?;
            for file in 0..8 {
                let sq = square_at(file, rank);
                write!(f, " {} ", self.mailbox[sq as usize].to_char())?;
            }
            writeln!(f, "|")?;
        }
        writeln!(f, "  +------------------------+")?;
        writeln!(f, "    a  b  c  d  e  f  g  h")?;
        let ep = if self.en_passant() == NULL_SQUARE {
            "-".to_string()
        } else {
            square_name(self.en_passant())
        };
        writeln!(
            f,
            "side: {:?}  castling: {}  en passant: {}  halfmove: {}",
            self.side_to_move,
            castling_string(self.castling()),
            ep,
            self.halfmove(),
        )
    }
}

fn castling_string(rights: u8) -> String {
    if rights == castling::NONE {
        return "-".to_string();
    }
    let mut s = String::new();
    for (bit, ch) in [
        (castling::WHITE_KING_SIDE, 'K'),
        (castling::WHITE_QUEEN_SIDE, 'Q'),
        (castling::BLACK_KING_SIDE, 'k'),
        (castling::BLACK_QUEEN_SIDE, 'q'),
    ] {
        if rights & bit != 0 {
            s.push(ch);
        }
    }
    s
}
