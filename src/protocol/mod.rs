//! # Blueberry Packet Module
//!
//! A concrete word-aligned packet format built on the transcoder and
//! receiver.
//!
//! This module handles:
//! - Packet layout constants and the decoded packet type
//! - Packet encoding, into a `Vec` or in place into a circular buffer
//! - The start word, length and CRC checks the receiver runs

pub mod packet;
pub mod encoder;
pub mod decoder;

pub use decoder::BlueberryFormat;
pub use packet::Packet;
