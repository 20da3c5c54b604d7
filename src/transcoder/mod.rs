//! # Transcoder Module
//!
//! Field access and checksums over packets that live in a circular buffer.
//!
//! This module handles:
//! - Logical to physical offset translation (wraparound)
//! - 8/16/32-bit signed and unsigned fields, binary32 floats and single bits
//! - CRC-16/CCITT over a logical range of a packet

pub mod crc;
pub mod window;

pub use crc::{crc16_ccitt, Crc1021};
pub use window::{wrap, Block, PacketWindow};

/// Compute the CRC of the logical range `[start, end)` of a window
///
/// The range is walked one 32-bit word at a time through
/// [`PacketWindow::get_u32`], so it is safe for ranges that wrap past the
/// end of storage. Only whole words are processed: if `end - start` is
/// not a multiple of 4, the trailing 1-3 bytes are not included.
///
/// # Arguments
///
/// * `window` - Packet window to read
/// * `start` - First logical byte of the range
/// * `end` - One past the last logical byte of the range
///
/// # Returns
///
/// * `u16` - CRC-16/CCITT of the range
///
/// # Examples
///
/// ```
/// use blueberry_link::transcoder::{compute_crc, crc16_ccitt, PacketWindow};
///
/// // Packet "1234" stored across the wrap point
/// let storage = *b"34..12";
/// let window = PacketWindow::new(&storage[..], 4, 4);
/// assert_eq!(compute_crc(&window, 0, 4), crc16_ccitt(b"1234"));
/// ```
pub fn compute_crc<S: AsRef<[u8]>>(window: &PacketWindow<S>, start: Block, end: Block) -> u16 {
    let mut crc = Crc1021::new();

    let mut block = start;
    while block + 4 <= end {
        crc.update_word(window.get_u32(block, 0));
        block += 4;
    }

    crc.finalize()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compute_crc_contiguous() {
        let storage = [0x01, 0x02, 0x03, 0x04, 0xAA, 0xAA];
        let window = PacketWindow::new(&storage[..], 0, 4);
        assert_eq!(compute_crc(&window, 0, 4), 0x89C3);
    }

    #[test]
    fn test_compute_crc_across_wrap_point() {
        // Packet 42 42 03 00 DE AD BE EF starting 5 bytes into a 10-byte store
        let mut storage = [0u8; 10];
        let mut window = PacketWindow::new(&mut storage[..], 5, 8);
        window.write_bytes(0, &[0x42, 0x42, 0x03, 0x00, 0xDE, 0xAD, 0xBE, 0xEF]);

        assert_eq!(storage, [0xAD, 0xBE, 0xEF, 0, 0, 0x42, 0x42, 0x03, 0x00, 0xDE]);

        let window = PacketWindow::new(&storage[..], 5, 8);
        assert_eq!(compute_crc(&window, 0, 8), 0xFFF0);
    }

    #[test]
    fn test_compute_crc_is_deterministic() {
        let storage = [0x42, 0x42, 0x03, 0x00, 0xDE, 0xAD, 0xBE, 0xEF];
        let window = PacketWindow::new(&storage[..], 0, 8);

        let first = compute_crc(&window, 0, 8);
        let second = compute_crc(&window, 0, 8);
        assert_eq!(first, second);
        assert_eq!(first, crc16_ccitt(&storage));
    }

    #[test]
    fn test_compute_crc_detects_single_byte_change() {
        let original = [0x42, 0x42, 0x03, 0x00, 0xDE, 0xAD, 0xBE, 0xEF];
        let reference = compute_crc(&PacketWindow::new(&original[..], 0, 8), 0, 8);

        for index in 0..original.len() {
            let mut corrupted = original;
            corrupted[index] ^= 0x01;
            let crc = compute_crc(&PacketWindow::new(&corrupted[..], 0, 8), 0, 8);
            assert_ne!(crc, reference, "flip at byte {} went undetected", index);
        }
    }

    #[test]
    fn test_compute_crc_sub_range() {
        let storage = [0xFF, 0xFF, 0xFF, 0xFF, 0x01, 0x02, 0x03, 0x04];
        let window = PacketWindow::new(&storage[..], 0, 8);
        assert_eq!(compute_crc(&window, 4, 8), 0x89C3);
    }

    #[test]
    fn test_compute_crc_ignores_partial_trailing_word() {
        let storage = [0x01, 0x02, 0x03, 0x04, 0x05, 0x06];
        let window = PacketWindow::new(&storage[..], 0, 6);
        assert_eq!(compute_crc(&window, 0, 6), compute_crc(&window, 0, 4));
        assert_eq!(compute_crc(&window, 0, 0), 0xFFFF);
    }
}
