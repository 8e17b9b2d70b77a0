//! EVM memory implementation

use strata_primitives::U256;

/// EVM memory (byte-addressable, grows in 32-byte words).
///
/// Handlers size memory through [`crate::gas::memory_expansion`] and
/// [`Memory::resize`] before touching it; reads past the end return zeros.
#[derive(Clone, Debug, Default)]
pub struct Memory {
    data: Vec<u8>,
}

impl Memory {
    /// Create new empty memory
    pub fn new() -> Self {
        Self { data: Vec::new() }
    }

    /// Get current memory size in bytes
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Grow to `new_size` bytes; never shrinks
    pub fn resize(&mut self, new_size: usize) {
        if new_size > self.data.len() {
            self.data.resize(new_size, 0);
        }
    }

    /// Load a 32-byte word from memory
    pub fn load(&self, offset: usize) -> U256 {
        U256::from_big_endian(&self.load_slice(offset, 32))
    }

    /// Store a 32-byte word to memory
    pub fn store(&mut self, offset: usize, value: &U256) {
        let mut word = [0u8; 32];
        value.to_big_endian(&mut word);
        self.store_slice(offset, &word);
    }

    /// Store a single byte to memory
    pub fn store8(&mut self, offset: usize, value: u8) {
        self.store_slice(offset, &[value]);
    }

    /// Load a byte slice from memory, zero-filled past the end
    pub fn load_slice(&self, offset: usize, size: usize) -> Vec<u8> {
        let mut result = vec![0u8; size];
        if offset < self.data.len() {
            let end = offset.saturating_add(size).min(self.data.len());
            result[..end - offset].copy_from_slice(&self.data[offset..end]);
        }
        result
    }

    /// Store a byte slice to memory
    pub fn store_slice(&mut self, offset: usize, data: &[u8]) {
        if data.is_empty() {
            return;
        }
        let end = offset + data.len();
        if end > self.data.len() {
            self.resize(end.div_ceil(32) * 32);
        }
        self.data[offset..end].copy_from_slice(data);
    }

    /// Get raw data slice
    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

/// Read `size` bytes of `buffer` from `offset`, zero-padded on the right.
/// Offsets beyond the buffer (including ones beyond `usize`) read zeros.
pub fn buffer_read(buffer: &[u8], offset: U256, size: usize) -> Vec<u8> {
    let mut result = vec![0u8; size];
    if offset < U256::from(buffer.len()) {
        let start = offset.low_u64() as usize;
        let end = start.saturating_add(size).min(buffer.len());
        result[..end - start].copy_from_slice(&buffer[start..end]);
    }
    result
}
