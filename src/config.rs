//! # Configuration Module
//!
//! Handles loading and validating configuration from TOML files.

use serde::Deserialize;
use serde::de::Error;
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::error::{LinkError, Result};
use crate::protocol::packet::{BB_MIN_PACKET_WORDS, BB_WORD_SIZE};

/// Main configuration structure
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub serial: SerialConfig,
    pub receiver: ReceiverConfig,
    #[serde(default)]
    pub capture: CaptureConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Serial port configuration
#[derive(Debug, Deserialize, Clone)]
pub struct SerialConfig {
    #[serde(default = "default_serial_port")]
    pub port: String,

    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,

    #[serde(default = "default_read_chunk_size")]
    pub read_chunk_size: usize,
}

/// How frame boundaries are found in the input
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ReceiveMode {
    /// Byte stream: search for the start word, resynchronize, check CRC
    Stream,
    /// Transport delimits frames: each frame starts at the queue head
    Framed,
}

/// Receiver configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ReceiverConfig {
    #[serde(default = "default_mode")]
    pub mode: ReceiveMode,

    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    #[serde(default = "default_max_bytes_per_poll")]
    pub max_bytes_per_poll: usize,

    #[serde(default = "default_rx_timeout_ms")]
    pub rx_timeout_ms: u64,

    #[serde(default = "default_max_packet_words")]
    pub max_packet_words: u16,
}

/// Frame capture configuration
#[derive(Debug, Deserialize, Clone)]
pub struct CaptureConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "default_capture_path")]
    pub path: String,
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Directory for a daily-rolling log file; empty logs to stdout only
    #[serde(default)]
    pub dir: String,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            path: default_capture_path(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            dir: String::new(),
        }
    }
}

impl ReceiverConfig {
    /// Partial frame timeout as a `Duration`
    pub fn rx_timeout(&self) -> Duration {
        Duration::from_millis(self.rx_timeout_ms)
    }
}

// Default value functions
fn default_serial_port() -> String { "/dev/ttyUSB0".to_string() }
fn default_baud_rate() -> u32 { 115200 }
fn default_read_chunk_size() -> usize { 256 }

fn default_mode() -> ReceiveMode { ReceiveMode::Stream }
fn default_queue_capacity() -> usize { 4096 }
fn default_max_bytes_per_poll() -> usize { 64 }
fn default_rx_timeout_ms() -> u64 { 500 }
fn default_max_packet_words() -> u16 { 256 }

fn default_capture_path() -> String { "./frames.jsonl".to_string() }

fn default_log_level() -> String { "info".to_string() }

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration file
    ///
    /// # Returns
    ///
    /// * `Result<Config>` - Loaded and validated configuration
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be read
    /// - TOML parsing fails
    /// - Validation fails
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use blueberry_link::config::Config;
    ///
    /// let config = Config::load("config/default.toml")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Parse and validate configuration from a TOML string
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns error if any configuration value is out of valid range
    fn validate(&self) -> Result<()> {
        // Validate serial port configuration
        if self.serial.port.is_empty() {
            return Err(invalid("serial port cannot be empty"));
        }

        if ![9600, 19200, 38400, 57600, 115200, 230400, 460800, 921600].contains(&self.serial.baud_rate) {
            return Err(invalid(
                "baud_rate must be one of: 9600, 19200, 38400, 57600, 115200, 230400, 460800, 921600",
            ));
        }

        if self.serial.read_chunk_size == 0 || self.serial.read_chunk_size > 65536 {
            return Err(invalid("read_chunk_size must be between 1 and 65536"));
        }

        // Validate receiver sizing
        let receiver = &self.receiver;
        if receiver.queue_capacity < 64 || receiver.queue_capacity > 1 << 20 {
            return Err(invalid("queue_capacity must be between 64 and 1048576"));
        }

        if receiver.max_bytes_per_poll == 0 || receiver.max_bytes_per_poll > receiver.queue_capacity {
            return Err(invalid("max_bytes_per_poll must be between 1 and queue_capacity"));
        }

        if receiver.rx_timeout_ms == 0 || receiver.rx_timeout_ms > 60000 {
            return Err(invalid("rx_timeout_ms must be between 1 and 60000"));
        }

        if receiver.max_packet_words < BB_MIN_PACKET_WORDS {
            return Err(invalid(format!(
                "max_packet_words must be at least {}",
                BB_MIN_PACKET_WORDS
            )));
        }

        // A whole packet has to fit in the queue to be received
        if receiver.max_packet_words as usize * BB_WORD_SIZE > receiver.queue_capacity {
            return Err(invalid("max_packet_words * 4 must not exceed queue_capacity"));
        }

        if self.capture.enabled && self.capture.path.is_empty() {
            return Err(invalid("capture path cannot be empty when enabled"));
        }

        if !["trace", "debug", "info", "warn", "error"].contains(&self.logging.level.as_str()) {
            return Err(invalid("log level must be one of: trace, debug, info, warn, error"));
        }

        Ok(())
    }
}

fn invalid(msg: impl std::fmt::Display) -> LinkError {
    LinkError::Config(toml::de::Error::custom(msg))
}
