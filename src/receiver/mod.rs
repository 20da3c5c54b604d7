//! # Receiver Module
//!
//! Resumable frame reception from a [`ByteQueue`].
//!
//! A [`Receiver`] grows a window over the queue's storage a byte at a time,
//! asking three caller-supplied checks whether the bytes so far still look
//! like a frame (start word), whether the frame is complete (length), and
//! whether it is intact (CRC). Each call examines a bounded number of new
//! bytes and returns immediately; the window persists between calls.
//!
//! On a start word or CRC failure the oldest byte is consumed from the
//! queue and the search resumes one byte further on (resynchronization).
//! The window's start therefore always sits at the queue head.
//!
//! ```text
//! Searching --start word ok--> Accumulating --length ok--> Validating --crc ok--> Ready
//!     ^                                                        |                    |
//!     +------------------- start word / crc failure -----------+      receive_done -+
//! ```
//!
//! `receive_all` does not resynchronize; a start word failure moves it to
//! `Rejected` until `receive_done` discards the examined bytes.

pub mod queue;

use std::time::{Duration, Instant};

use tracing::{debug, trace};

use crate::transcoder::PacketWindow;
pub use queue::{ByteQueue, RingQueue};

/// Read-only window over a queue's storage, as seen by the checks
pub type RxWindow<'a> = PacketWindow<&'a [u8]>;

/// A predicate over the bytes received so far
///
/// Implemented for any `Fn(&RxWindow) -> bool`. Closures need their
/// argument type spelled out:
///
/// ```
/// use blueberry_link::receiver::{FrameCheck, RxWindow};
///
/// let at_least_two = |w: &RxWindow<'_>| w.length() >= 2;
/// # let _ = &at_least_two as &dyn FrameCheck;
/// ```
pub trait FrameCheck {
    /// Evaluate the check against the current window
    fn check(&self, window: &RxWindow<'_>) -> bool;
}

impl<F> FrameCheck for F
where
    F: Fn(&RxWindow<'_>) -> bool,
{
    fn check(&self, window: &RxWindow<'_>) -> bool {
        self(window)
    }
}

/// The three checks of one packet format, bundled
pub trait FrameFormat {
    /// `false` only when the bytes so far definitely are not a start word
    ///
    /// Must tolerate windows shorter than the start word.
    fn start_word_ok(&self, window: &RxWindow<'_>) -> bool;

    /// `true` once the window holds the whole frame
    fn length_ok(&self, window: &RxWindow<'_>) -> bool;

    /// `true` when the frame's checksum matches
    fn crc_ok(&self, window: &RxWindow<'_>) -> bool;

    /// Bytes in the start word
    ///
    /// The receiver reports [`RxPhase::Searching`] until this many bytes
    /// have passed the start word check.
    fn start_word_len(&self) -> usize {
        1
    }
}

/// Where the receiver is in assembling the current frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RxPhase {
    /// No start word confirmed yet
    Searching,
    /// Start word confirmed, waiting for the declared length
    Accumulating,
    /// Length satisfied, checking integrity
    Validating,
    /// A verified frame is in the window, waiting for `receive_done`
    Ready,
    /// `receive_all` found no start word at the queue head, waiting for
    /// `receive_done` to discard the examined bytes
    Rejected,
}

/// Reception counters
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReceiverStats {
    /// Frames accepted
    pub frames: u64,
    /// Bytes consumed while resynchronizing
    pub skipped_bytes: u64,
    /// Start word check failures
    pub start_word_failures: u64,
    /// CRC check failures
    pub crc_failures: u64,
}

enum Verdict {
    Pending,
    Ready,
    Reject,
}

/// Reception state for one input stream
#[derive(Debug, Clone)]
pub struct Receiver {
    start: usize,
    length: usize,
    rx_time: Option<Instant>,
    phase: RxPhase,
    start_word_len: usize,
    stats: ReceiverStats,
}

impl Default for Receiver {
    fn default() -> Self {
        Self::new()
    }
}

impl Receiver {
    /// Create a receiver with an empty window
    pub fn new() -> Self {
        Self {
            start: 0,
            length: 0,
            rx_time: None,
            phase: RxPhase::Searching,
            start_word_len: 1,
            stats: ReceiverStats::default(),
        }
    }

    /// Set how many bytes the start word spans, for [`phase`](Self::phase)
    ///
    /// [`receive_frame`](Self::receive_frame) and
    /// [`receive_all_frame`](Self::receive_all_frame) take this from the
    /// format instead.
    pub fn with_start_word_len(mut self, len: usize) -> Self {
        self.start_word_len = len;
        self
    }

    /// Physical index in the queue storage where the current frame begins
    pub fn start(&self) -> usize {
        self.start
    }

    /// Bytes currently in the window
    pub fn length(&self) -> usize {
        self.length
    }

    /// Current phase
    pub fn phase(&self) -> RxPhase {
        self.phase
    }

    /// Counters since creation
    pub fn stats(&self) -> ReceiverStats {
        self.stats
    }

    /// When the oldest byte still in the window was first examined
    ///
    /// Kept across resynchronization while examined bytes remain in the
    /// queue, so a candidate found by rescanning old bytes is not treated
    /// as fresh.
    pub fn rx_time(&self) -> Option<Instant> {
        self.rx_time
    }

    /// `true` if a partial frame has been pending for longer than `timeout`
    ///
    /// A ready frame never expires; the caller owns it until `receive_done`.
    pub fn expired(&self, timeout: Duration) -> bool {
        self.phase != RxPhase::Ready
            && self.rx_time.is_some_and(|t| t.elapsed() > timeout)
    }

    /// The current window over `queue`'s storage
    ///
    /// Valid until the next `receive_done`, which frees the bytes for reuse.
    pub fn window<'q, Q: ByteQueue + ?Sized>(&self, queue: &'q Q) -> RxWindow<'q> {
        PacketWindow::new(queue.storage(), self.start, self.length)
    }

    /// Receive at most `max_bytes` new bytes, resynchronizing on bad data
    ///
    /// Intended for byte streams such as a UART, where a frame may start
    /// anywhere and may arrive in many small pieces. Returns `true` once a
    /// frame has passed all three checks; it stays in the window (and
    /// further calls keep returning `true`) until [`receive_done`](Self::receive_done).
    ///
    /// # Arguments
    ///
    /// * `queue` - Source of bytes; skipped bytes are consumed from it
    /// * `max_bytes` - Limit on new bytes examined by this call
    /// * `start_word` - Start word check
    /// * `length` - Frame complete check
    /// * `crc` - Integrity check
    pub fn receive<Q, A, B, C>(
        &mut self,
        queue: &mut Q,
        max_bytes: usize,
        start_word: &A,
        length: &B,
        crc: &C,
    ) -> bool
    where
        Q: ByteQueue + ?Sized,
        A: FrameCheck,
        B: FrameCheck,
        C: FrameCheck,
    {
        if self.phase == RxPhase::Ready {
            return true;
        }
        if self.length == 0 {
            self.start = queue.head();
        }

        let fresh = max_bytes.min(queue.available().saturating_sub(self.length));
        if fresh == 0 {
            return false;
        }

        // Bytes already examined are re-read after a rejection without
        // counting against this call's budget
        let mut limit = self.length + fresh;
        while self.length < limit {
            self.grow();
            let window = PacketWindow::new(queue.storage(), self.start, self.length);
            match self.evaluate(&window, start_word, length, Some(crc as &dyn FrameCheck)) {
                Verdict::Ready => return true,
                Verdict::Pending => {}
                Verdict::Reject => {
                    self.skip(queue);
                    limit -= 1;
                }
            }
        }

        false
    }

    /// Receive a frame that begins at the queue head, without a CRC check
    ///
    /// Intended for transports that already delimit frames, such as
    /// Ethernet. A start word mismatch is not resynchronized: the call
    /// returns `false`, the phase becomes [`RxPhase::Rejected`] and the
    /// examined bytes stay in the window until the caller discards them
    /// with [`receive_done`](Self::receive_done).
    pub fn receive_all<Q, A, B>(&mut self, queue: &Q, start_word: &A, length: &B) -> bool
    where
        Q: ByteQueue + ?Sized,
        A: FrameCheck,
        B: FrameCheck,
    {
        match self.phase {
            RxPhase::Ready => return true,
            RxPhase::Rejected => return false,
            _ => {}
        }
        if self.length == 0 {
            self.start = queue.head();
        }

        while self.length < queue.available() {
            self.grow();
            let window = PacketWindow::new(queue.storage(), self.start, self.length);
            match self.evaluate(&window, start_word, length, None) {
                Verdict::Ready => return true,
                Verdict::Pending => {}
                Verdict::Reject => {
                    debug!(length = self.length, "Start word mismatch at queue head");
                    self.phase = RxPhase::Rejected;
                    return false;
                }
            }
        }

        false
    }

    /// [`receive`](Self::receive) with the checks of a [`FrameFormat`]
    pub fn receive_frame<Q, F>(&mut self, queue: &mut Q, max_bytes: usize, format: &F) -> bool
    where
        Q: ByteQueue + ?Sized,
        F: FrameFormat + ?Sized,
    {
        self.start_word_len = format.start_word_len();
        self.receive(
            queue,
            max_bytes,
            &|w: &RxWindow<'_>| format.start_word_ok(w),
            &|w: &RxWindow<'_>| format.length_ok(w),
            &|w: &RxWindow<'_>| format.crc_ok(w),
        )
    }

    /// [`receive_all`](Self::receive_all) with the checks of a [`FrameFormat`]
    pub fn receive_all_frame<Q, F>(&mut self, queue: &Q, format: &F) -> bool
    where
        Q: ByteQueue + ?Sized,
        F: FrameFormat + ?Sized,
    {
        self.start_word_len = format.start_word_len();
        self.receive_all(
            queue,
            &|w: &RxWindow<'_>| format.start_word_ok(w),
            &|w: &RxWindow<'_>| format.length_ok(w),
        )
    }

    /// Release the current frame
    ///
    /// Consumes the window's bytes from the queue and starts an empty
    /// window at the new head. Call once per accepted frame, or to discard
    /// a partial one (for example after [`expired`](Self::expired)).
    pub fn receive_done<Q: ByteQueue + ?Sized>(&mut self, queue: &mut Q) {
        debug!(length = self.length, phase = ?self.phase, "Receive done");

        queue.consume(self.length);
        self.start = queue.head();
        self.length = 0;
        self.rx_time = None;
        self.phase = RxPhase::Searching;
    }

    fn grow(&mut self) {
        if self.rx_time.is_none() {
            self.rx_time = Some(Instant::now());
        }
        self.length += 1;
    }

    fn evaluate(
        &mut self,
        window: &RxWindow<'_>,
        start_word: &dyn FrameCheck,
        length: &dyn FrameCheck,
        crc: Option<&dyn FrameCheck>,
    ) -> Verdict {
        if !start_word.check(window) {
            self.stats.start_word_failures += 1;
            return Verdict::Reject;
        }

        if !length.check(window) {
            self.phase = if window.length() >= self.start_word_len {
                RxPhase::Accumulating
            } else {
                RxPhase::Searching
            };
            return Verdict::Pending;
        }

        if let Some(crc) = crc {
            self.phase = RxPhase::Validating;
            if !crc.check(window) {
                self.stats.crc_failures += 1;
                debug!(start = self.start, length = self.length, "CRC mismatch, resynchronizing");
                return Verdict::Reject;
            }
        }

        self.phase = RxPhase::Ready;
        self.stats.frames += 1;
        debug!(start = self.start, length = self.length, "Frame ready");
        Verdict::Ready
    }

    fn skip<Q: ByteQueue + ?Sized>(&mut self, queue: &mut Q) {
        queue.consume(1);
        self.start = queue.head();
        self.length = 0;
        if queue.available() == 0 {
            self.rx_time = None;
        }
        self.phase = RxPhase::Searching;
        self.stats.skipped_bytes += 1;
        trace!(start = self.start, "Skipped one byte");
    }
}
