use thiserror::Error;

/// Failures turning text from the outside world into engine state. The UCI
/// layer reports these on the error stream and keeps its previous position.
#[derive(Debug, Error, Eq, PartialEq)]
pub enum ParseError {
    #[error("FEN is missing its {0} field")]
    MissingField(&'static str),

    #[error("unknown piece character `{0}`")]
    UnknownPiece(char),

    #[error("piece placement does not describe an 8x8 board")]
    BadBoardShape,

    #[error("each side must have exactly one king")]
    BadKingCount,

    #[error("invalid side to move `{0}`")]
    BadSideToMove(String),

    #[error("invalid castling rights `{0}`")]
    BadCastlingRights(String),

    #[error("invalid en passant target `{0}`")]
    BadEnPassant(String),

    #[error("malformed move text `{0}`")]
    BadMoveText(String),

    #[error("invalid promotion piece `{0}`")]
    BadPromotion(char),
}
