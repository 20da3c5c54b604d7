//! # Packet Window
//!
//! A view of one packet inside a circular byte store, with width, sign and
//! bit aware field access at logical offsets.
//!
//! Every logical position `p + i` is translated to a physical index with
//! `(start + p + i) mod capacity` before storage is touched. Multi-byte
//! fields are assembled one byte at a time, each byte wrapped on its own,
//! so a field that straddles the end of storage reads back correctly.
//!
//! Byte order is little-endian: byte `k` of a value lives at logical
//! position `i + k`.
//!
//! Accessors do not check offsets against `length`. An offset past the
//! end of the packet silently wraps around the storage.

/// A logical byte offset relative to the start of a packet
pub type Block = usize;

/// Convert a linear index into a circular one
///
/// # Panics
///
/// Panics if `n` is zero.
///
/// # Examples
///
/// ```
/// use blueberry_link::transcoder::wrap;
///
/// assert_eq!(wrap(5, 8), 5);
/// assert_eq!(wrap(9, 8), 1);
/// ```
pub fn wrap(i: usize, n: usize) -> usize {
    i % n
}

/// A packet-sized window onto a circular byte store
///
/// `S` is the storage: `&[u8]` for a read-only alias of a queue's buffer,
/// `&mut [u8]` or an owned array/`Vec` when fields are written. The window
/// never owns more than what `S` is; building one copies nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacketWindow<S> {
    storage: S,
    start: usize,
    length: usize,
}

impl<S: AsRef<[u8]>> PacketWindow<S> {
    /// Create a window whose logical position 0 is physical index `start`
    ///
    /// `start` is reduced modulo the storage capacity.
    ///
    /// # Panics
    ///
    /// Panics if `storage` is empty.
    pub fn new(storage: S, start: usize, length: usize) -> Self {
        let start = wrap(start, storage.as_ref().len());
        Self {
            storage,
            start,
            length,
        }
    }

    /// Physical index of logical position 0
    pub fn start(&self) -> usize {
        self.start
    }

    /// Number of bytes currently recognized as belonging to the packet
    pub fn length(&self) -> usize {
        self.length
    }

    /// Size of the circular storage
    pub fn capacity(&self) -> usize {
        self.storage.as_ref().len()
    }

    /// The whole aliased storage, in physical order
    pub fn storage(&self) -> &[u8] {
        self.storage.as_ref()
    }

    /// Same storage and start, different length
    pub fn with_length(self, length: usize) -> Self {
        Self { length, ..self }
    }

    /// Translate a logical offset into a physical storage index
    pub fn wrap(&self, i: Block) -> usize {
        let capacity = self.capacity();
        wrap(self.start + wrap(i, capacity), capacity)
    }

    /// Get an 8-bit unsigned integer at logical position `p + i`
    pub fn get_u8(&self, p: Block, i: usize) -> u8 {
        self.storage.as_ref()[self.wrap(p + i)]
    }

    /// Get an 8-bit signed integer at logical position `p + i`
    pub fn get_i8(&self, p: Block, i: usize) -> i8 {
        self.get_u8(p, i) as i8
    }

    /// Get a 16-bit unsigned integer starting at logical position `p + i`
    pub fn get_u16(&self, p: Block, i: usize) -> u16 {
        u16::from_le_bytes(self.get_array(p, i))
    }

    /// Get a 16-bit signed integer starting at logical position `p + i`
    pub fn get_i16(&self, p: Block, i: usize) -> i16 {
        self.get_u16(p, i) as i16
    }

    /// Get a 32-bit unsigned integer starting at logical position `p + i`
    pub fn get_u32(&self, p: Block, i: usize) -> u32 {
        u32::from_le_bytes(self.get_array(p, i))
    }

    /// Get a 32-bit signed integer starting at logical position `p + i`
    ///
    /// All four bytes contribute; this is the same assembly as
    /// [`get_u32`](Self::get_u32) reinterpreted as two's complement.
    pub fn get_i32(&self, p: Block, i: usize) -> i32 {
        self.get_u32(p, i) as i32
    }

    /// Get an IEEE-754 binary32 value starting at logical position `p + i`
    ///
    /// The bits are reinterpreted as-is, NaN payloads included.
    pub fn get_f32(&self, p: Block, i: usize) -> f32 {
        f32::from_bits(self.get_u32(p, i))
    }

    /// Get bit `bit_num` (0 = least significant) of the byte at `p + i`
    ///
    /// `bit_num` must be below 8.
    pub fn get_bool(&self, p: Block, i: usize, bit_num: u32) -> bool {
        debug_assert!(bit_num < 8, "bit number {} out of range", bit_num);
        self.get_u8(p, i) & (1 << bit_num) != 0
    }

    /// Iterate over `len` bytes starting at logical position `p`
    pub fn bytes(&self, p: Block, len: usize) -> impl Iterator<Item = u8> + '_ {
        (0..len).map(move |k| self.get_u8(p, k))
    }

    /// Copy the `length` bytes of the packet out into a contiguous buffer
    pub fn to_vec(&self) -> Vec<u8> {
        self.bytes(0, self.length).collect()
    }

    fn get_array<const N: usize>(&self, p: Block, i: usize) -> [u8; N] {
        let mut bytes = [0u8; N];
        for (k, byte) in bytes.iter_mut().enumerate() {
            *byte = self.get_u8(p, i + k);
        }
        bytes
    }
}

impl<S: AsRef<[u8]> + AsMut<[u8]>> PacketWindow<S> {
    /// Set an 8-bit unsigned integer at logical position `p + i`
    pub fn set_u8(&mut self, p: Block, i: usize, v: u8) {
        let index = self.wrap(p + i);
        self.storage.as_mut()[index] = v;
    }

    /// Set an 8-bit signed integer at logical position `p + i`
    pub fn set_i8(&mut self, p: Block, i: usize, v: i8) {
        self.set_u8(p, i, v as u8);
    }

    /// Set a 16-bit unsigned integer starting at logical position `p + i`
    pub fn set_u16(&mut self, p: Block, i: usize, v: u16) {
        self.set_array(p, i, v.to_le_bytes());
    }

    /// Set a 16-bit signed integer starting at logical position `p + i`
    pub fn set_i16(&mut self, p: Block, i: usize, v: i16) {
        self.set_u16(p, i, v as u16);
    }

    /// Set a 32-bit unsigned integer starting at logical position `p + i`
    pub fn set_u32(&mut self, p: Block, i: usize, v: u32) {
        self.set_array(p, i, v.to_le_bytes());
    }

    /// Set a 32-bit signed integer starting at logical position `p + i`
    pub fn set_i32(&mut self, p: Block, i: usize, v: i32) {
        self.set_u32(p, i, v as u32);
    }

    /// Set an IEEE-754 binary32 value starting at logical position `p + i`
    pub fn set_f32(&mut self, p: Block, i: usize, v: f32) {
        self.set_u32(p, i, v.to_bits());
    }

    /// Set or clear bit `bit_num` of the byte at `p + i`, leaving the other
    /// seven bits alone
    pub fn set_bool(&mut self, p: Block, i: usize, bit_num: u32, v: bool) {
        debug_assert!(bit_num < 8, "bit number {} out of range", bit_num);
        let mask = 1u8 << bit_num;
        let byte = self.get_u8(p, i);
        let byte = if v { byte | mask } else { byte & !mask };
        self.set_u8(p, i, byte);
    }

    /// Copy `data` into consecutive logical positions starting at `p`
    pub fn write_bytes(&mut self, p: Block, data: &[u8]) {
        for (k, &byte) in data.iter().enumerate() {
            self.set_u8(p, k, byte);
        }
    }

    fn set_array<const N: usize>(&mut self, p: Block, i: usize, bytes: [u8; N]) {
        for (k, byte) in bytes.into_iter().enumerate() {
            self.set_u8(p, i + k, byte);
        }
    }
}
