//! # Blueberry Link Library
//!
//! Zero-copy packet framing and field transcoding for embedded links.
//!
//! This library provides the core of a link layer for devices exchanging
//! fixed-structure packets over byte-oriented transports (UART, Ethernet):
//! structured field access directly inside a circular receive buffer, and a
//! resumable receiver that assembles validated frames across many small,
//! non-blocking polls.

pub mod capture;
pub mod config;
pub mod error;
pub mod protocol;
pub mod receiver;
pub mod serial;
pub mod transcoder;
