//! Magic bitboard generation for sliding pieces.
//!
//! This module generates and stores all data required to compute rook and
//! bishop attacks in O(1) time using magic bitboards. On first access, it:
//!
//! - Computes relevant occupancy masks for each square
//! - Enumerates all possible blocker configurations
//! - Searches for collision-free magic multipliers
//! - Builds flat attack tables indexed via magic hashing
//!
//! Once initialized, attack lookup requires only:
//!     - masking the occupancy
//!     - a 64-bit multiplication
//!     - a shift
//!     - a table lookup
//!
//! The generated tables are read-only after initialization and contain no
//! runtime branches, locks, or collision checks.

use std::sync::OnceLock;

use rand::rngs::SmallRng;
use rand::{RngCore, SeedableRng};

use crate::bitboard::Bitboard;

const ROOK_DELTAS: [(i8, i8); 4] = [(0, 1), (1, 0), (0, -1), (-1, 0)];
const BISHOP_DELTAS: [(i8, i8); 4] = [(1, 1), (1, -1), (-1, 1), (-1, -1)];

/// Total number of rook magic attack entries.
///
/// This is the sum over all squares of:
///     2 ^ (number of relevant rook occupancy bits on that square)
///
/// Central squares have up to 12 relevant bits, edge squares fewer.
const ROOK_TABLE_SIZE: usize = 102_400;

/// Total number of bishop magic attack entries, summed the same way.
/// Central squares have up to 9 relevant bits.
const BISHOP_TABLE_SIZE: usize = 5_248;

/// The multiplier search is randomized but reproducible: the generator is
/// seeded with a fixed constant.
const MAGIC_SEED: u64 = 0xD10FA;

/// Candidates per square before the search is declared failed. Exhausting
/// this bound indicates a programming bug, not a runtime condition.
const MAX_TRIES: usize = 1 << 31;

/// The perfect-hash configuration for one square: lookup is
/// `((occupancy & mask) * multiplier) >> shift + offset` into the flat
/// attack table, with `shift = 64 - popcount(mask)`.
#[derive(Copy, Clone)]
pub struct Magic {
    pub mask: Bitboard,
    pub multiplier: u64,
    pub shift: u8,
    pub offset: u32,
}

impl Magic {
    const UNSET: Magic = Magic { mask: Bitboard::EMPTY, multiplier: 0, shift: 0, offset: 0 };

    #[inline(always)]
    fn index(&self, occupancy: Bitboard) -> usize {
        let hash = (occupancy.0 & self.mask.0).wrapping_mul(self.multiplier);
        (hash >> self.shift) as usize + self.offset as usize
    }
}

/// Precomputed magic bitboard data for sliding piece attack generation.
///
/// All tables are generated once on first access and are read-only
/// thereafter.
pub struct MagicTables {
    rook: [Magic; 64],
    bishop: [Magic; 64],
    rook_attacks: Box<[Bitboard]>,
    bishop_attacks: Box<[Bitboard]>,
}

static MAGICS: OnceLock<MagicTables> = OnceLock::new();

pub fn tables() -> &'static MagicTables {
    MAGICS.get_or_init(MagicTables::generate)
}

impl MagicTables {
    /// Rook attacks from `sq` against the given occupancy, friend and foe
    /// alike included in the result.
    #[inline(always)]
    pub fn rook_attacks(&self, sq: u8, occupancy: Bitboard) -> Bitboard {
        self.rook_attacks[self.rook[sq as usize].index(occupancy)]
    }

    /// Bishop attacks from `sq` against the given occupancy.
    #[inline(always)]
    pub fn bishop_attacks(&self, sq: u8, occupancy: Bitboard) -> Bitboard {
        self.bishop_attacks[self.bishop[sq as usize].index(occupancy)]
    }

    #[inline(always)]
    pub fn queen_attacks(&self, sq: u8, occupancy: Bitboard) -> Bitboard {
        self.rook_attacks(sq, occupancy) | self.bishop_attacks(sq, occupancy)
    }

    /// Generates magic numbers and populates the flat attack tables for both
    /// slider kinds. Deterministic for a fixed seed.
    fn generate() -> Self {
        let mut rng = SmallRng::seed_from_u64(MAGIC_SEED);
        let (rook, rook_attacks) = build_slider(&ROOK_DELTAS, ROOK_TABLE_SIZE, &mut rng);
        let (bishop, bishop_attacks) = build_slider(&BISHOP_DELTAS, BISHOP_TABLE_SIZE, &mut rng);
        Self { rook, bishop, rook_attacks, bishop_attacks }
    }
}

fn build_slider(
    deltas: &[(i8, i8); 4],
    table_size: usize,
    rng: &mut SmallRng,
) -> ([Magic; 64], Box<[Bitboard]>) {
    let mut magics = [Magic::UNSET; 64];
    let mut table = vec![Bitboard::EMPTY; table_size];
    let mut offset = 0usize;

    for sq in 0..64u8 {
        let mask = blocker_mask(sq, deltas);
        let bits = mask.popcnt();
        let shift = 64 - bits;

        let occupancies = enumerate_subsets(mask);
        let multiplier = find_multiplier(sq, mask, &occupancies, shift, rng);

        for &occ in &occupancies {
            let index = (occ.0.wrapping_mul(multiplier) >> shift) as usize;
            table[offset + index] = sliding_attacks(sq, deltas, occ);
        }

        magics[sq as usize] =
            Magic { mask, multiplier, shift: shift as u8, offset: offset as u32 };
        offset += 1 << bits;
    }

    debug_assert_eq!(offset, table_size);
    (magics, table.into_boxed_slice())
}

/// Searches for a multiplier that hashes every blocker subset of `mask` to a
/// distinct index. Candidates with few set bits collide less, hence the
/// triple-AND draw; candidates whose masked product leaves the top byte
/// nearly empty are rejected without the full collision scan.
fn find_multiplier(
    sq: u8,
    mask: Bitboard,
    occupancies: &[Bitboard],
    shift: u32,
    rng: &mut SmallRng,
) -> u64 {
    'search: for _ in 0..MAX_TRIES {
        let candidate = sparse_random(rng);
        if (mask.0.wrapping_mul(candidate) & 0xFF00_0000_0000_0000).count_ones() < 6 {
            continue;
        }

        let mut used = vec![false; occupancies.len()];
        for occ in occupancies {
            let index = (occ.0.wrapping_mul(candidate) >> shift) as usize;
            if used[index] {
                continue 'search;
            }
            used[index] = true;
        }
        return candidate;
    }
    panic!("magic number search exhausted for square {sq}");
}

/// Draws a candidate with sparse bits set. Deterministic if the same seed is
/// used.
#[inline(always)]
fn sparse_random(rng: &mut SmallRng) -> u64 {
    rng.next_u64() & rng.next_u64() & rng.next_u64()
}

/// Computes the relevant occupancy mask for a slider on `sq`: every square
/// on its rays where a piece could obstruct further movement. The final
/// square of each ray is excluded, a blocker there obstructs nothing.
fn blocker_mask(sq: u8, deltas: &[(i8, i8); 4]) -> Bitboard {
    let mut mask = Bitboard::EMPTY;
    let from_rank = (sq / 8) as i8;
    let from_file = (sq % 8) as i8;

    for &(dr, df) in deltas {
        let mut rank = from_rank + dr;
        let mut file = from_file + df;
        while (0..8).contains(&(rank + dr)) && (0..8).contains(&(file + df)) {
            mask.set((rank * 8 + file) as u8);
            rank += dr;
            file += df;
        }
    }
    mask
}

/// Enumerates the powerset of `mask` by mapping each subset index onto the
/// mask's set bits.
fn enumerate_subsets(mask: Bitboard) -> Vec<Bitboard> {
    let bits: Vec<u8> = mask.collect();
    let mut subsets = Vec::with_capacity(1 << bits.len());

    for subset in 0u64..(1u64 << bits.len()) {
        let mut occ = Bitboard::EMPTY;
        for (i, &sq) in bits.iter().enumerate() {
            if subset & (1 << i) != 0 {
                occ.set(sq);
            }
        }
        subsets.push(occ);
    }
    subsets
}

/// Computes slider attacks by ray-tracing: each ray stops at, and includes,
/// the first occupied square.
fn sliding_attacks(sq: u8, deltas: &[(i8, i8); 4], occupancy: Bitboard) -> Bitboard {
    let mut attacks = Bitboard::EMPTY;
    let from_rank = (sq / 8) as i8;
    let from_file = (sq % 8) as i8;

    for &(dr, df) in deltas {
        let mut rank = from_rank + dr;
        let mut file = from_file + df;

        while (0..8).contains(&rank) && (0..8).contains(&file) {
            let here = (rank * 8 + file) as u8;
            attacks.set(here);
            if occupancy.test(here) {
                break;
            }
            rank += dr;
            file += df;
        }
    }
    attacks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::parse_square;

    #[test]
    fn rook_blocker_mask_keeps_interior_ray_squares() {
        // Rook on a1: b1..g1 and a2..a7, the terminal edge squares excluded.
        let mask = blocker_mask(0, &ROOK_DELTAS);
        assert_eq!(mask.popcnt(), 12);
        assert!(mask.test(parse_square("b1").unwrap()));
        assert!(mask.test(parse_square("g1").unwrap()));
        assert!(!mask.test(parse_square("h1").unwrap()));
        assert!(mask.test(parse_square("a2").unwrap()));
        assert!(!mask.test(parse_square("a8").unwrap()));
    }

    #[test]
    fn bishop_blocker_mask_is_interior_only() {
        let mask = blocker_mask(parse_square("d5").unwrap(), &BISHOP_DELTAS);
        assert!((mask & Bitboard::EDGES).is_empty());
        assert_eq!(mask.popcnt(), 9);
    }

    #[test]
    fn table_sizes_add_up() {
        let rook: usize =
            (0..64).map(|sq| 1usize << blocker_mask(sq, &ROOK_DELTAS).popcnt()).sum();
        let bishop: usize =
            (0..64).map(|sq| 1usize << blocker_mask(sq, &BISHOP_DELTAS).popcnt()).sum();
        assert_eq!(rook, ROOK_TABLE_SIZE);
        assert_eq!(bishop, BISHOP_TABLE_SIZE);
    }

    #[test]
    fn magic_lookup_matches_ray_tracing_everywhere() {
        let tables = tables();
        for sq in 0..64u8 {
            for occ in enumerate_subsets(blocker_mask(sq, &ROOK_DELTAS)) {
                assert_eq!(
                    tables.rook_attacks(sq, occ),
                    sliding_attacks(sq, &ROOK_DELTAS, occ),
                    "rook on square {sq}"
                );
            }
            for occ in enumerate_subsets(blocker_mask(sq, &BISHOP_DELTAS)) {
                assert_eq!(
                    tables.bishop_attacks(sq, occ),
                    sliding_attacks(sq, &BISHOP_DELTAS, occ),
                    "bishop on square {sq}"
                );
            }
        }
    }

    #[test]
    fn lookup_ignores_irrelevant_occupancy() {
        let tables = tables();
        let sq = parse_square("d4").unwrap();
        // Pieces on the board edges beyond the blocker mask must not change
        // the result.
        let occ = Bitboard::EDGES;
        assert_eq!(tables.rook_attacks(sq, occ), tables.rook_attacks(sq, Bitboard::EMPTY));
    }
}
