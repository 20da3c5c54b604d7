//! # Blueberry Packet Decoder
//!
//! The receiver checks for Blueberry packets.

use super::packet::*;
use crate::receiver::{FrameFormat, RxWindow};
use crate::transcoder::compute_crc;

/// Frame checks for the Blueberry packet format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlueberryFormat {
    max_words: u16,
}

impl Default for BlueberryFormat {
    fn default() -> Self {
        Self::new(BB_DEFAULT_MAX_PACKET_WORDS)
    }
}

impl BlueberryFormat {
    /// Create checks that reject length fields above `max_words`
    pub fn new(max_words: u16) -> Self {
        Self {
            max_words: max_words.max(BB_MIN_PACKET_WORDS),
        }
    }

    /// Largest accepted length field, in words
    pub fn max_words(&self) -> u16 {
        self.max_words
    }

    /// Declared packet size in bytes, once the header has arrived
    pub fn declared_size(&self, window: &RxWindow<'_>) -> Option<usize> {
        if window.length() < BB_HEADER_SIZE {
            return None;
        }
        Some(window.get_u16(0, BB_LENGTH_OFFSET) as usize * BB_WORD_SIZE)
    }
}

impl FrameFormat for BlueberryFormat {
    fn start_word_ok(&self, window: &RxWindow<'_>) -> bool {
        let present = window.length().min(BB_START_WORD.len());
        if (0..present).any(|k| window.get_u8(0, k) != BB_START_WORD[k]) {
            return false;
        }

        // A nonsensical length field means this was not a real start word
        match self.declared_size(window) {
            Some(size) => {
                let words = size / BB_WORD_SIZE;
                (BB_MIN_PACKET_WORDS as usize..=self.max_words as usize).contains(&words)
            }
            None => true,
        }
    }

    fn length_ok(&self, window: &RxWindow<'_>) -> bool {
        self.declared_size(window)
            .is_some_and(|size| window.length() >= size)
    }

    fn crc_ok(&self, window: &RxWindow<'_>) -> bool {
        let Some(size) = self.declared_size(window) else {
            return false;
        };
        if size < BB_HEADER_SIZE + BB_TRAILER_SIZE || window.length() < size {
            return false;
        }

        let trailer = size - BB_TRAILER_SIZE;
        compute_crc(window, 0, trailer) == window.get_u16(trailer, 0)
    }

    fn start_word_len(&self) -> usize {
        BB_START_WORD.len()
    }
}
