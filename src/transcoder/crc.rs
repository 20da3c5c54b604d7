//! # CRC-16/CCITT Implementation
//!
//! Incremental CRC-16 ("1021") engine shared by sender and receiver firmware.
//!
//! **Polynomial**: 0x1021 (x^16 + x^12 + x^5 + 1)
//! **Initial Value**: 0xFFFF
//! **Reflection / Final XOR**: none (CRC-16/CCITT-FALSE)

/// CRC-16/CCITT polynomial
const CRC16_POLY: u16 = 0x1021;

/// CRC-16/CCITT initial value
const CRC16_INIT: u16 = 0xFFFF;

/// Precomputed CRC16 lookup table for fast calculation
const CRC16_TABLE: [u16; 256] = generate_crc16_table();

/// Generate CRC16 lookup table at compile time
const fn generate_crc16_table() -> [u16; 256] {
    let mut table = [0u16; 256];
    let mut i = 0;

    while i < 256 {
        let mut crc = (i as u16) << 8;
        let mut j = 0;

        while j < 8 {
            if (crc & 0x8000) != 0 {
                crc = (crc << 1) ^ CRC16_POLY;
            } else {
                crc <<= 1;
            }
            j += 1;
        }

        table[i] = crc;
        i += 1;
    }

    table
}

/// Stateful CRC-16/CCITT accumulator
///
/// Fed one 32-bit word (or one byte) at a time so a checksum can be built
/// over data that is not contiguous in memory, such as a range of a
/// circular buffer that wraps.
///
/// # Examples
///
/// ```
/// use blueberry_link::transcoder::crc::Crc1021;
///
/// let mut crc = Crc1021::new();
/// for &b in b"123456789" {
///     crc.update_byte(b);
/// }
/// assert_eq!(crc.finalize(), 0x29B1);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Crc1021 {
    crc: u16,
}

impl Default for Crc1021 {
    fn default() -> Self {
        Self::new()
    }
}

impl Crc1021 {
    /// Create an accumulator in the reset state
    pub const fn new() -> Self {
        Self { crc: CRC16_INIT }
    }

    /// Return the accumulator to its initial value
    pub fn reset(&mut self) {
        self.crc = CRC16_INIT;
    }

    /// Feed a single byte
    pub fn update_byte(&mut self, byte: u8) {
        let index = ((self.crc >> 8) as u8 ^ byte) as usize;
        self.crc = (self.crc << 8) ^ CRC16_TABLE[index];
    }

    /// Feed a 32-bit word, least significant byte first
    ///
    /// Feeding a word read with `get_u32` is therefore equivalent to feeding
    /// its four bytes in the order they sit in storage.
    pub fn update_word(&mut self, word: u32) {
        for byte in word.to_le_bytes() {
            self.update_byte(byte);
        }
    }

    /// Current checksum value
    ///
    /// The accumulator is left untouched, so more data may still be fed.
    pub fn finalize(&self) -> u16 {
        self.crc
    }
}

/// Calculate CRC-16/CCITT over a contiguous byte slice
///
/// # Arguments
///
/// * `data` - Byte slice to calculate CRC for
///
/// # Returns
///
/// * `u16` - Calculated checksum
pub fn crc16_ccitt(data: &[u8]) -> u16 {
    let mut crc = Crc1021::new();
    for &byte in data {
        crc.update_byte(byte);
    }
    crc.finalize()
}

/// Calculate CRC-16/CCITT using direct algorithm (slow, for verification)
#[cfg(test)]
fn crc16_ccitt_slow(data: &[u8]) -> u16 {
    let mut crc = CRC16_INIT;

    for &byte in data {
        crc ^= (byte as u16) << 8;

        for _ in 0..8 {
            if (crc & 0x8000) != 0 {
                crc = (crc << 1) ^ CRC16_POLY;
            } else {
                crc <<= 1;
            }
        }
    }

    crc
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crc16_empty() {
        assert_eq!(crc16_ccitt(&[]), 0xFFFF);
    }

    #[test]
    fn test_crc16_check_value() {
        // Standard check string for CRC-16/CCITT-FALSE
        assert_eq!(crc16_ccitt(b"123456789"), 0x29B1);
        assert_eq!(crc16_ccitt_slow(b"123456789"), 0x29B1);
    }

    #[test]
    fn test_crc16_known_vectors() {
        assert_eq!(crc16_ccitt(&[0x55, 0x55, 0x00, 0x02, 0x01, 0x02]), 0x76F3);
        assert_eq!(crc16_ccitt(&[0x01, 0x02, 0x03, 0x04]), 0x89C3);
        assert_eq!(crc16_ccitt(&[0x01, 0x02, 0x03, 0x05]), 0x99E2);
    }

    #[test]
    fn test_crc16_lookup_table_matches_slow() {
        let test_data = [
            vec![0x01, 0x02, 0x03],
            vec![0xFF, 0xFE, 0xFD],
            vec![0x42, 0x42, 0x03, 0x00],
            vec![0x00; 24],
            vec![0xFF; 10],
        ];

        for data in test_data.iter() {
            assert_eq!(
                crc16_ccitt(data),
                crc16_ccitt_slow(data),
                "CRC mismatch for data: {:?}",
                data
            );
        }
    }

    #[test]
    fn test_update_word_matches_bytes() {
        let mut by_word = Crc1021::new();
        by_word.update_word(u32::from_le_bytes([0x01, 0x02, 0x03, 0x04]));

        assert_eq!(by_word.finalize(), 0x89C3);
    }

    #[test]
    fn test_reset_restarts_accumulation() {
        let mut crc = Crc1021::new();
        crc.update_word(0xDEAD_BEEF);
        assert_ne!(crc.finalize(), 0xFFFF);

        crc.reset();
        assert_eq!(crc, Crc1021::new());
        for &b in b"123456789" {
            crc.update_byte(b);
        }
        assert_eq!(crc.finalize(), 0x29B1);
    }

    #[test]
    fn test_crc16_changes_with_data() {
        let crc1 = crc16_ccitt(&[0x42, 0x42, 0x00, 0x04]);
        let crc2 = crc16_ccitt(&[0x42, 0x42, 0x00, 0x05]);

        assert_ne!(crc1, crc2, "CRC should change when data changes");
    }
}
