//! # Blueberry Monitor
//!
//! Receives Blueberry packets from a serial port and logs them.
//!
//! Bytes read from the port go into a ring queue; the receiver polls the
//! queue with a bounded budget, and every verified packet is logged (and
//! optionally captured to a JSONL file) before its bytes are released.

use anyhow::Result;
use std::fs::File;
use std::io::BufWriter;
use tokio::time::{interval, Duration};
use tracing::{debug, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use blueberry_link::capture::FrameCapture;
use blueberry_link::config::{Config, LoggingConfig, ReceiveMode, ReceiverConfig};
use blueberry_link::protocol::{BlueberryFormat, Packet};
use blueberry_link::receiver::{ByteQueue, Receiver, RingQueue, RxPhase};
use blueberry_link::serial::LinkSerial;

/// Configuration file used when none is given on the command line
const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Period of the receive poll and stale-frame check
const POLL_INTERVAL_MS: u64 = 20;

/// Main entry point for the Blueberry monitor
///
/// # Control Flow
///
/// 1. Load configuration (first argument, or `config/default.toml`)
/// 2. Set up logging and open the serial port
/// 3. Loop until Ctrl+C or the port closes:
///    - read bytes into the queue and poll the receiver
///    - on each tick, poll again and discard a partial frame that has
///      been pending longer than `rx_timeout_ms`
/// 4. Log reception statistics
///
/// # Examples
///
/// ```bash
/// cargo run --release -- config/default.toml
/// ```
#[tokio::main]
async fn main() -> Result<()> {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    let config = Config::load(&config_path)?;

    let _log_guard = init_logging(&config.logging);
    info!("Blueberry Monitor v{} starting...", env!("CARGO_PKG_VERSION"));
    info!("Loaded configuration from {}", config_path);

    let mut serial = LinkSerial::open(&config.serial)?;
    let mut queue = RingQueue::new(config.receiver.queue_capacity);
    let mut receiver = Receiver::new();
    let format = BlueberryFormat::new(config.receiver.max_packet_words);

    let mut capture = if config.capture.enabled {
        info!("Capturing packets to {}", config.capture.path);
        Some(FrameCapture::create(&config.capture.path)?)
    } else {
        None
    };

    let mut poll_interval = interval(Duration::from_millis(POLL_INTERVAL_MS));

    info!("Receiving in {:?} mode. Press Ctrl+C to exit", config.receiver.mode);

    loop {
        tokio::select! {
            read = serial.read_into(&mut queue) => {
                if read? == 0 {
                    warn!("Serial port {} closed", serial.device_path());
                    break;
                }
                poll_receiver(&mut receiver, &mut queue, &format, &config.receiver, &mut capture)?;
            }

            _ = poll_interval.tick() => {
                poll_receiver(&mut receiver, &mut queue, &format, &config.receiver, &mut capture)?;

                if receiver.expired(config.receiver.rx_timeout()) {
                    warn!(
                        length = receiver.length(),
                        "Partial frame timed out after {}ms, discarding",
                        config.receiver.rx_timeout_ms
                    );
                    receiver.receive_done(&mut queue);
                }
            }

            _ = tokio::signal::ctrl_c() => {
                info!("Received Ctrl+C, shutting down...");
                break;
            }
        }
    }

    let stats = receiver.stats();
    info!(
        "Frames: {}, CRC failures: {}, start word failures: {}, bytes skipped: {}, bytes dropped: {}",
        stats.frames,
        stats.crc_failures,
        stats.start_word_failures,
        stats.skipped_bytes,
        queue.dropped()
    );

    Ok(())
}

/// Set up stdout logging, plus a daily-rolling file when configured
///
/// `RUST_LOG` overrides the configured level. The returned guard must be
/// held for the life of the program so buffered file output is flushed.
fn init_logging(config: &LoggingConfig) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    if config.dir.is_empty() {
        tracing_subscriber::fmt().with_env_filter(filter).init();
        return None;
    }

    let appender = tracing_appender::rolling::daily(&config.dir, "blueberry-monitor.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .with(fmt::layer().with_ansi(false).with_writer(writer))
        .init();

    Some(guard)
}

/// Run the receiver until the queue holds no unexamined bytes
fn poll_receiver(
    receiver: &mut Receiver,
    queue: &mut RingQueue,
    format: &BlueberryFormat,
    config: &ReceiverConfig,
    capture: &mut Option<FrameCapture<BufWriter<File>>>,
) -> Result<()> {
    loop {
        let ready = match config.mode {
            ReceiveMode::Stream => receiver.receive_frame(queue, config.max_bytes_per_poll, format),
            ReceiveMode::Framed => receiver.receive_all_frame(queue, format),
        };

        if ready {
            handle_packet(receiver, queue, capture)?;
            continue;
        }

        // A framed transport has no resynchronization; drop what was examined
        if receiver.phase() == RxPhase::Rejected {
            warn!(length = receiver.length(), "Frame does not start with a start word, discarding");
            receiver.receive_done(queue);
            continue;
        }

        if queue.available() <= receiver.length() {
            return Ok(());
        }
    }
}

/// Decode, log and capture the ready packet, then release its bytes
fn handle_packet(
    receiver: &mut Receiver,
    queue: &mut RingQueue,
    capture: &mut Option<FrameCapture<BufWriter<File>>>,
) -> Result<()> {
    match Packet::from_window(&receiver.window(queue)) {
        Ok(packet) => {
            info!(
                length_words = packet.length_words,
                "Received packet with {} payload bytes, CRC 0x{:04X}",
                packet.payload.len(),
                packet.crc
            );
            debug!("Payload: {:02X?}", packet.payload);

            if let Some(capture) = capture.as_mut() {
                capture.record(&packet)?;
            }
        }
        Err(e) => warn!("Failed to decode packet: {}", e),
    }

    receiver.receive_done(queue);
    Ok(())
}
