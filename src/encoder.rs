//! One-wire LED protocol encoding over SPI
//!
//! Every payload bit becomes four bus symbols. Shifted out at 3.2 MHz each
//! symbol lasts 312.5 ns, so a `1110` pattern gives a long high pulse (one)
//! and `1000` a short one (zero). Each payload byte expands to four bus bytes.

/// Bus symbols emitted per payload bit
pub const SYMBOLS_PER_BIT: usize = 4;

/// Bus bytes emitted per payload byte
pub const BYTES_PER_SYMBOL_GROUP: usize = SYMBOLS_PER_BIT * 8 / 8;

/// Pattern for a logical one: high for three symbols, low for one
pub const ONE_PATTERN: u8 = 0b1110;

/// Pattern for a logical zero: high for one symbol, low for three
pub const ZERO_PATTERN: u8 = 0b1000;

/// Reference bus clock for the patterns above
pub const REFERENCE_CLOCK_HZ: u32 = 3_200_000;

/// Encoded form of a single payload byte, most significant bit first
pub type SymbolGroup = [u8; BYTES_PER_SYMBOL_GROUP];

/// Table-driven encoder, one entry per possible payload byte
///
/// `table[b]` holds the four bus bytes that encode byte `b`.
#[derive(Clone, PartialEq, Eq)]
pub struct SymbolEncoder {
    table: [SymbolGroup; 256],
}

impl core::fmt::Debug for SymbolEncoder {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SymbolEncoder").finish_non_exhaustive()
    }
}

impl Default for SymbolEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl SymbolEncoder {
    pub const fn new() -> Self {
        let mut table = [[0u8; BYTES_PER_SYMBOL_GROUP]; 256];
        let mut byte = 0;
        while byte < 256 {
            table[byte] = encode_byte(byte as u8);
            byte += 1;
        }
        Self { table }
    }

    /// Symbols for a single byte
    #[inline]
    pub const fn symbols(&self, byte: u8) -> &SymbolGroup {
        &self.table[byte as usize]
    }

    /// Encode `payload` into `out`, replacing its contents.
    ///
    /// `out` ends up exactly four times as long as `payload`.
    pub fn encode_into(&self, payload: &[u8], out: &mut Vec<u8>) {
        out.clear();
        out.reserve(payload.len() * BYTES_PER_SYMBOL_GROUP);
        for &byte in payload {
            out.extend_from_slice(self.symbols(byte));
        }
    }

    pub fn encode(&self, payload: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        self.encode_into(payload, &mut out);
        out
    }
}

#[allow(clippy::cast_possible_truncation)]
const fn encode_byte(byte: u8) -> SymbolGroup {
    let mut bits: u32 = 0;
    let mut i = 8;
    while i > 0 {
        i -= 1;
        let pattern = if (byte >> i) & 1 == 1 {
            ONE_PATTERN
        } else {
            ZERO_PATTERN
        };
        bits = (bits << SYMBOLS_PER_BIT) | pattern as u32;
    }
    bits.to_be_bytes()
}

/// Recover payload bytes from a symbol stream.
///
/// Each 4-symbol group is read as a one when its second symbol is high.
/// Trailing bytes that do not form a full group are ignored.
pub fn decode(symbols: &[u8]) -> Vec<u8> {
    symbols
        .chunks_exact(BYTES_PER_SYMBOL_GROUP)
        .map(|group| {
            let bits = u32::from_be_bytes([group[0], group[1], group[2], group[3]]);
            (0..8).fold(0u8, |byte, i| {
                let nibble = (bits >> ((7 - i) * SYMBOLS_PER_BIT)) & 0xF;
                (byte << 1) | u8::from(nibble & 0b0100 != 0)
            })
        })
        .collect()
}

/// High and low times of a single encoded bit at a given bus clock
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PulseTiming {
    /// Duration of one bus symbol
    pub symbol_ns: u32,
    /// High time of a zero bit
    pub t0h_ns: u32,
    /// High time of a one bit
    pub t1h_ns: u32,
    /// Full bit period
    pub bit_ns: u32,
}

impl PulseTiming {
    #[allow(clippy::cast_possible_truncation)]
    pub const fn at_clock(clock_hz: u32) -> Self {
        let symbol_ns = if clock_hz == 0 {
            0
        } else {
            (1_000_000_000u64 / clock_hz as u64) as u32
        };
        Self {
            symbol_ns,
            t0h_ns: symbol_ns * ZERO_PATTERN.count_ones(),
            t1h_ns: symbol_ns * ONE_PATTERN.count_ones(),
            bit_ns: symbol_ns * SYMBOLS_PER_BIT as u32,
        }
    }
}
