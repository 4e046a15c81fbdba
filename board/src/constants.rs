use crate::bitboard::Bitboard;

pub const LIGHT_SQUARES: Bitboard = Bitboard(6172840429334713770);
pub const DARK_SQUARES: Bitboard = Bitboard(12273903644374837845);

/// Rank masks, indexed by rank number (0 = rank 1, ..., 7 = rank 8).
pub const RANKS: [Bitboard; 8] = [
    Bitboard(0x0000_0000_0000_00FF),
    Bitboard(0x0000_0000_0000_FF00),
    Bitboard(0x0000_0000_00FF_0000),
    Bitboard(0x0000_0000_FF00_0000),
    Bitboard(0x0000_00FF_0000_0000),
    Bitboard(0x0000_FF00_0000_0000),
    Bitboard(0x00FF_0000_0000_0000),
    Bitboard(0xFF00_0000_0000_0000),
];

/// File masks, indexed by file number (0 = file a, ..., 7 = file h).
pub const FILES: [Bitboard; 8] = [
    Bitboard(0x0101_0101_0101_0101),
    Bitboard(0x0202_0202_0202_0202),
    Bitboard(0x0404_0404_0404_0404),
    Bitboard(0x0808_0808_0808_0808),
    Bitboard(0x1010_1010_1010_1010),
    Bitboard(0x2020_2020_2020_2020),
    Bitboard(0x4040_4040_4040_4040),
    Bitboard(0x8080_8080_8080_8080),
];
