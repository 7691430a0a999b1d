//! The fixed-size record (`elem`) carried by every ring.

/// Payload capacity of a [`Record`], in bytes.
pub const DATA_SIZE: usize = 128;

/// Wire size of a [`Record`]: 8-byte `id` + 128-byte `data`, no padding.
pub const RECORD_SIZE: usize = std::mem::size_of::<Record>();

/// A fixed-layout, trivially-copyable record.
///
/// Bit-stable across processes on one host: bytes 0..7 are `id` in
/// native-endian order, bytes 8..135 are `data`, NUL-padded. There is no
/// alignment padding beyond the native `u64`, so `RECORD_SIZE` is exactly
/// 136 bytes.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Record {
    pub id: u64,
    pub data: [u8; DATA_SIZE],
}

impl Record {
    /// Builds a record from an id and a byte payload, truncating at
    /// `DATA_SIZE - 1` bytes and NUL-padding the remainder so the payload
    /// is also safely readable as a C string.
    pub fn new(id: u64, payload: &[u8]) -> Self {
        let mut data = [0u8; DATA_SIZE];
        let n = payload.len().min(DATA_SIZE - 1);
        data[..n].copy_from_slice(&payload[..n]);
        Self { id, data }
    }

    /// Returns the payload up to the first NUL byte (or the full buffer if
    /// none is present).
    pub fn payload(&self) -> &[u8] {
        let end = self.data.iter().position(|&b| b == 0).unwrap_or(DATA_SIZE);
        &self.data[..end]
    }
}
