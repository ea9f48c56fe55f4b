//! Byte compressors used as the fitness oracle.
//!
//! The search only needs the compressed length, so a compressor is anything
//! that maps a byte slice to a length deterministically.

/// A pure function from bytes to compressed length in bytes.
pub trait Compressor: Send + Sync {
    /// Compressed size of `data` in bytes.
    fn compressed_len(&self, data: &[u8]) -> usize;
}

/// LZ4 block compression.
#[derive(Debug, Clone, Copy, Default)]
pub struct Lz4Compressor;

impl Compressor for Lz4Compressor {
    fn compressed_len(&self, data: &[u8]) -> usize {
        lz4_flex::block::compress(data).len()
    }
}

/// Reports the input length unchanged. Useful as a stand-in in tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityCompressor;

impl Compressor for IdentityCompressor {
    fn compressed_len(&self, data: &[u8]) -> usize {
        data.len()
    }
}

impl<C: Compressor + ?Sized> Compressor for Box<C> {
    fn compressed_len(&self, data: &[u8]) -> usize {
        (**self).compressed_len(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_compressor() {
        assert_eq!(IdentityCompressor.compressed_len(&[1, 2, 3, 4]), 4);
        assert_eq!(IdentityCompressor.compressed_len(&[]), 0);
    }

    #[test]
    fn test_lz4_rewards_redundancy() {
        let flat = vec![100u8; 4096];
        let noisy: Vec<u8> = (0..4096u32)
            .map(|i| (i.wrapping_mul(2_654_435_761) >> 24) as u8)
            .collect();

        let flat_len = Lz4Compressor.compressed_len(&flat);
        let noisy_len = Lz4Compressor.compressed_len(&noisy);
        assert!(flat_len < noisy_len);
    }

    #[test]
    fn test_lz4_is_deterministic() {
        let data: Vec<u8> = (0..=255).collect();
        assert_eq!(
            Lz4Compressor.compressed_len(&data),
            Lz4Compressor.compressed_len(&data)
        );
    }

    #[test]
    fn test_boxed_compressor() {
        let boxed: Box<dyn Compressor> = Box::new(IdentityCompressor);
        assert_eq!(boxed.compressed_len(&[0; 7]), 7);
    }
}
