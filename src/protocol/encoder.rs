//! # Blueberry Packet Encoder
//!
//! Builds packets, either as a new buffer or in place inside a circular
//! transmit buffer.

use super::packet::*;
use crate::error::{LinkError, Result};
use crate::transcoder::{compute_crc, PacketWindow};

/// Packet length in words for a payload of `payload_len` bytes
///
/// # Errors
///
/// Returns error if the packet would exceed `max_words`.
pub fn packet_words(payload_len: usize, max_words: u16) -> Result<u16> {
    let padded = payload_len.div_ceil(BB_WORD_SIZE) * BB_WORD_SIZE;
    let words = (BB_HEADER_SIZE + padded + BB_TRAILER_SIZE) / BB_WORD_SIZE;

    if words > max_words as usize {
        return Err(LinkError::Protocol(format!(
            "Payload of {} bytes needs {} words, maximum is {}",
            payload_len, words, max_words
        )));
    }

    Ok(words as u16)
}

/// Write a packet into a window, starting at its logical position 0
///
/// The packet may wrap around the end of the window's storage. The window's
/// length is ignored; the capacity bounds the packet size.
///
/// # Arguments
///
/// * `window` - Destination window
/// * `payload` - Payload bytes (zero padded to a whole word)
/// * `max_words` - Upper bound on the length field
///
/// # Returns
///
/// * `Result<usize>` - Bytes written
///
/// # Errors
///
/// Returns error if the packet is larger than `max_words` or the storage.
pub fn encode_into<S>(window: &mut PacketWindow<S>, payload: &[u8], max_words: u16) -> Result<usize>
where
    S: AsRef<[u8]> + AsMut<[u8]>,
{
    let words = packet_words(payload.len(), max_words)?;
    let total = words as usize * BB_WORD_SIZE;
    if total > window.capacity() {
        return Err(LinkError::Protocol(format!(
            "Packet of {} bytes does not fit in {} bytes of storage",
            total,
            window.capacity()
        )));
    }

    let trailer = total - BB_TRAILER_SIZE;

    window.write_bytes(0, &BB_START_WORD);
    window.set_u16(0, BB_LENGTH_OFFSET, words);
    window.write_bytes(BB_HEADER_SIZE, payload);
    for pad in BB_HEADER_SIZE + payload.len()..trailer {
        window.set_u8(pad, 0, 0);
    }

    let crc = compute_crc(window, 0, trailer);
    window.set_u16(trailer, 0, crc);
    window.set_u16(trailer, 2, 0);

    Ok(total)
}

/// Encode a payload into a complete packet
///
/// # Examples
///
/// ```
/// use blueberry_link::protocol::encoder::encode_packet;
///
/// let packet = encode_packet(&[0xDE, 0xAD, 0xBE, 0xEF]).unwrap();
/// assert_eq!(packet.len(), 12);
/// assert_eq!(&packet[..4], &[0x42, 0x42, 0x03, 0x00]);
/// ```
pub fn encode_packet(payload: &[u8]) -> Result<Vec<u8>> {
    let words = packet_words(payload.len(), u16::MAX)?;
    let mut buffer = vec![0u8; words as usize * BB_WORD_SIZE];

    let mut window = PacketWindow::new(&mut buffer[..], 0, 0);
    encode_into(&mut window, payload, u16::MAX)?;

    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_packet_words() {
        assert_eq!(packet_words(0, 256).unwrap(), 2);
        assert_eq!(packet_words(1, 256).unwrap(), 3);
        assert_eq!(packet_words(4, 256).unwrap(), 3);
        assert_eq!(packet_words(5, 256).unwrap(), 4);
        assert!(packet_words(1016, 256).is_ok());
        assert!(packet_words(1017, 256).is_err());
    }

    #[test]
    fn test_encode_packet_known_bytes() {
        let packet = encode_packet(&[0xDE, 0xAD, 0xBE, 0xEF]).unwrap();
        assert_eq!(
            packet,
            vec![0x42, 0x42, 0x03, 0x00, 0xDE, 0xAD, 0xBE, 0xEF, 0xF0, 0xFF, 0x00, 0x00]
        );
    }

    #[test]
    fn test_encode_empty_payload() {
        let packet = encode_packet(&[]).unwrap();
        assert_eq!(packet, vec![0x42, 0x42, 0x02, 0x00, 0x9B, 0x12, 0x00, 0x00]);
    }

    #[test]
    fn test_encode_pads_payload() {
        let packet = encode_packet(&[1, 2, 3, 4, 5]).unwrap();
        assert_eq!(packet.len(), 16);
        assert_eq!(&packet[4..12], &[1, 2, 3, 4, 5, 0, 0, 0]);
    }

    #[test]
    fn test_encode_into_wraps() {
        let mut storage = [0xAAu8; 16];
        let mut window = PacketWindow::new(&mut storage[..], 10, 0);

        let written = encode_into(&mut window, &[0xDE, 0xAD, 0xBE, 0xEF], 256).unwrap();
        assert_eq!(written, 12);

        let expected = encode_packet(&[0xDE, 0xAD, 0xBE, 0xEF]).unwrap();
        let window = PacketWindow::new(&storage[..], 10, written);
        assert_eq!(window.to_vec(), expected);
        // Untouched bytes between the end and the start of the packet
        assert_eq!(&storage[6..10], &[0xAA; 4]);
    }

    #[test]
    fn test_encode_into_too_small() {
        let mut storage = [0u8; 8];
        let mut window = PacketWindow::new(&mut storage[..], 0, 0);
        assert!(encode_into(&mut window, &[1], 256).is_err());
    }

    #[test]
    fn test_encode_into_over_max_words() {
        let mut storage = [0u8; 64];
        let mut window = PacketWindow::new(&mut storage[..], 0, 0);
        assert!(encode_into(&mut window, &[0u8; 16], 4).is_err());
    }
}
