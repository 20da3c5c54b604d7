//! # Blueberry Packet Constants and Types
//!
//! Packet layout (all multi-byte fields little-endian):
//!
//! ```text
//! offset  size  field
//! 0       2     start word, bytes 0x42 0x42 ("BB")
//! 2       2     packet length in 4-byte words (header + payload + trailer)
//! 4       N     payload, padded with zeros to a whole word
//! 4+N     2     CRC-16/CCITT over bytes [0, 4+N)
//! 6+N     2     zero padding
//! ```

use crate::error::{LinkError, Result};
use crate::transcoder::PacketWindow;

/// Start word bytes, in the order they arrive
pub const BB_START_WORD: [u8; 2] = [0x42, 0x42];

/// Offset of the length field
pub const BB_LENGTH_OFFSET: usize = 2;

/// Header size (start word + length)
pub const BB_HEADER_SIZE: usize = 4;

/// Trailer size (CRC + padding)
pub const BB_TRAILER_SIZE: usize = 4;

/// Bytes per length unit
pub const BB_WORD_SIZE: usize = 4;

/// Smallest legal packet: header and trailer, no payload
pub const BB_MIN_PACKET_WORDS: u16 = 2;

/// Default upper bound on the length field
pub const BB_DEFAULT_MAX_PACKET_WORDS: u16 = 256;

/// A packet copied out of a receive window
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    /// Length field, in words
    pub length_words: u16,

    /// Payload bytes, including any padding to a whole word
    pub payload: Vec<u8>,

    /// CRC carried in the trailer
    pub crc: u16,
}

impl Packet {
    /// Copy a packet out of a window that holds a complete packet
    ///
    /// # Errors
    ///
    /// Returns error if the length field is below the minimum or the
    /// window is shorter than the length field declares.
    pub fn from_window<S: AsRef<[u8]>>(window: &PacketWindow<S>) -> Result<Self> {
        if window.length() < BB_HEADER_SIZE {
            return Err(LinkError::Protocol(format!(
                "Packet too short: {} bytes",
                window.length()
            )));
        }

        let length_words = window.get_u16(0, BB_LENGTH_OFFSET);
        if length_words < BB_MIN_PACKET_WORDS {
            return Err(LinkError::Protocol(format!(
                "Invalid length field: {} words",
                length_words
            )));
        }

        let total = length_words as usize * BB_WORD_SIZE;
        if window.length() < total {
            return Err(LinkError::Protocol(format!(
                "Packet too short: expected {} bytes, got {}",
                total,
                window.length()
            )));
        }

        let trailer = total - BB_TRAILER_SIZE;
        let payload = window.bytes(BB_HEADER_SIZE, trailer - BB_HEADER_SIZE).collect();

        Ok(Self {
            length_words,
            payload,
            crc: window.get_u16(trailer, 0),
        })
    }

    /// Total packet size in bytes
    pub fn total_size(&self) -> usize {
        self.length_words as usize * BB_WORD_SIZE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_constants() {
        assert_eq!(BB_START_WORD, [0x42, 0x42]);
        assert_eq!(BB_HEADER_SIZE + BB_TRAILER_SIZE, BB_MIN_PACKET_WORDS as usize * BB_WORD_SIZE);
    }

    #[test]
    fn test_from_window() {
        let bytes = [0x42, 0x42, 0x03, 0x00, 0xDE, 0xAD, 0xBE, 0xEF, 0xF0, 0xFF, 0x00, 0x00];
        let window = PacketWindow::new(&bytes[..], 0, bytes.len());

        let packet = Packet::from_window(&window).unwrap();
        assert_eq!(packet.length_words, 3);
        assert_eq!(packet.payload, vec![0xDE, 0xAD, 0xBE, 0xEF]);
        assert_eq!(packet.crc, 0xFFF0);
        assert_eq!(packet.total_size(), 12);
    }

    #[test]
    fn test_from_window_wrapped() {
        // Same packet starting 9 bytes into a 16-byte store
        let packet = [0x42, 0x42, 0x03, 0x00, 0xDE, 0xAD, 0xBE, 0xEF, 0xF0, 0xFF, 0x00, 0x00];
        let mut storage = [0u8; 16];
        for (k, &b) in packet.iter().enumerate() {
            storage[(9 + k) % 16] = b;
        }

        let window = PacketWindow::new(&storage[..], 9, 12);
        let decoded = Packet::from_window(&window).unwrap();
        assert_eq!(decoded.payload, vec![0xDE, 0xAD, 0xBE, 0xEF]);
        assert_eq!(decoded.crc, 0xFFF0);
    }

    #[test]
    fn test_from_window_too_short() {
        let bytes = [0x42, 0x42, 0x03, 0x00, 0xDE, 0xAD];
        let window = PacketWindow::new(&bytes[..], 0, bytes.len());
        assert!(Packet::from_window(&window).is_err());

        let window = window.with_length(2);
        assert!(Packet::from_window(&window).is_err());
    }

    #[test]
    fn test_from_window_bad_length_field() {
        let bytes = [0x42, 0x42, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00];
        let window = PacketWindow::new(&bytes[..], 0, bytes.len());

        match Packet::from_window(&window) {
            Err(LinkError::Protocol(msg)) => assert!(msg.contains("Invalid length")),
            other => panic!("Expected Protocol error, got: {:?}", other),
        }
    }
}
