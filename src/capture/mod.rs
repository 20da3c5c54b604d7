//! # Frame Capture Module
//!
//! Appends received packets to a JSON Lines file, one object per packet.

use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::Result;
use crate::protocol::Packet;

/// One captured packet
#[derive(Debug, Serialize)]
struct CaptureRecord<'a> {
    timestamp: String,
    length_words: u16,
    crc: u16,
    payload: &'a str,
}

/// JSONL writer for received packets
#[derive(Debug)]
pub struct FrameCapture<W: Write> {
    writer: W,
    records: u64,
}

impl FrameCapture<BufWriter<File>> {
    /// Open `path` for appending, creating it if needed
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be opened
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self::new(BufWriter::new(file)))
    }
}

impl<W: Write> FrameCapture<W> {
    /// Capture into any writer
    pub fn new(writer: W) -> Self {
        Self { writer, records: 0 }
    }

    /// Write one packet as a JSON line and flush it
    pub fn record(&mut self, packet: &Packet) -> Result<()> {
        let payload: String = packet.payload.iter().map(|b| format!("{:02x}", b)).collect();
        let record = CaptureRecord {
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            length_words: packet.length_words,
            crc: packet.crc,
            payload: &payload,
        };

        serde_json::to_writer(&mut self.writer, &record)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        self.records += 1;
        Ok(())
    }

    /// Packets written so far
    pub fn records(&self) -> u64 {
        self.records
    }

    /// Recover the underlying writer
    pub fn into_inner(self) -> W {
        self.writer
    }
}
