//! Audio assembly buffer.
//!
//! Binary frames arrive as an ordered sequence of chunks for exactly one
//! in-flight synthesis. The assembler accumulates them in arrival order and
//! concatenates on finalize; a finalize or clear always leaves the buffer
//! empty and ready for the next synthesis.

use bytes::{Bytes, BytesMut};

/// Accumulates binary audio chunks in arrival order.
#[derive(Debug, Default)]
pub struct AudioAssembler {
    chunks: Vec<Bytes>,
    total_bytes: usize,
}

impl AudioAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one chunk. Chunk boundaries carry no meaning; only the
    /// concatenated byte sequence does.
    pub fn append(&mut self, chunk: Bytes) {
        self.total_bytes += chunk.len();
        self.chunks.push(chunk);
    }

    /// Concatenates everything received so far, in arrival order, and resets
    /// the buffer. A finalize with nothing buffered yields empty bytes.
    pub fn finalize(&mut self) -> Bytes {
        let mut assembled = BytesMut::with_capacity(self.total_bytes);
        for chunk in self.chunks.drain(..) {
            assembled.extend_from_slice(&chunk);
        }
        self.total_bytes = 0;
        assembled.freeze()
    }

    /// Discards everything buffered without producing output. Used when a
    /// synthesis fails mid-stream.
    pub fn clear(&mut self) {
        self.chunks.clear();
        self.total_bytes = 0;
    }

    /// Number of chunks currently buffered.
    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// Total bytes currently buffered.
    pub fn byte_len(&self) -> usize {
        self.total_bytes
    }

    /// Returns true if nothing is buffered.
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_concatenates_in_arrival_order() {
        let mut assembler = AudioAssembler::new();
        assembler.append(Bytes::from(vec![1u8; 100]));
        assembler.append(Bytes::from(vec![2u8; 250]));
        assembler.append(Bytes::from(vec![3u8; 50]));
        assert_eq!(assembler.chunk_count(), 3);
        assert_eq!(assembler.byte_len(), 400);

        let audio = assembler.finalize();
        assert_eq!(audio.len(), 400);
        assert_eq!(&audio[..100], &[1u8; 100][..]);
        assert_eq!(&audio[100..350], &[2u8; 250][..]);
        assert_eq!(&audio[350..], &[3u8; 50][..]);
    }

    #[test]
    fn test_finalize_resets_buffer() {
        let mut assembler = AudioAssembler::new();
        assembler.append(Bytes::from_static(b"abc"));
        let first = assembler.finalize();
        assert_eq!(first, Bytes::from_static(b"abc"));
        assert!(assembler.is_empty());
        assert_eq!(assembler.byte_len(), 0);

        assembler.append(Bytes::from_static(b"xyz"));
        assert_eq!(assembler.finalize(), Bytes::from_static(b"xyz"));
    }

    #[test]
    fn test_finalize_with_no_chunks_is_empty() {
        let mut assembler = AudioAssembler::new();
        assert_eq!(assembler.finalize(), Bytes::new());
    }

    #[test]
    fn test_clear_discards_without_output() {
        let mut assembler = AudioAssembler::new();
        assembler.append(Bytes::from_static(b"partial"));
        assembler.clear();
        assert!(assembler.is_empty());
        assert_eq!(assembler.finalize(), Bytes::new());
    }
}
