//! Byte-backed bitsets as they appear in table map and rows events

/// Bitset over the binlog on-disk layout: bit `i` lives in byte `i / 8`
/// at position `i % 8`, least significant bit first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitset {
    bytes: Vec<u8>,
    len: usize,
}

impl Bitset {
    /// Number of bytes needed to store `bits` bits
    pub fn byte_len(bits: usize) -> usize {
        (bits + 7) / 8
    }

    /// Wrap raw bytes holding `len` bits
    pub fn from_bytes(bytes: &[u8], len: usize) -> Self {
        debug_assert!(bytes.len() >= Self::byte_len(len));
        Self {
            bytes: bytes.to_vec(),
            len,
        }
    }

    /// Number of bits
    pub fn len(&self) -> usize {
        self.len
    }

    /// True if the set holds no bits
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Test bit `i`; out-of-range bits read as unset
    pub fn bit(&self, i: usize) -> bool {
        if i >= self.len {
            return false;
        }
        self.bytes[i / 8] & (1 << (i % 8)) != 0
    }

    /// Number of set bits, padding in the last byte excluded
    pub fn count_set(&self) -> usize {
        (0..self.len).filter(|&i| self.bit(i)).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_byte_len() {
        assert_eq!(Bitset::byte_len(0), 0);
        assert_eq!(Bitset::byte_len(1), 1);
        assert_eq!(Bitset::byte_len(8), 1);
        assert_eq!(Bitset::byte_len(9), 2);
        assert_eq!(Bitset::byte_len(16), 2);
    }

    #[test]
    fn test_bit_order_lsb_first() {
        // 0b0000_0101: bits 0 and 2 set
        let set = Bitset::from_bytes(&[0b0000_0101], 8);
        assert!(set.bit(0));
        assert!(!set.bit(1));
        assert!(set.bit(2));
        assert!(!set.bit(7));
    }

    #[test]
    fn test_multi_byte() {
        let set = Bitset::from_bytes(&[0x00, 0x01], 9);
        assert!(!set.bit(7));
        assert!(set.bit(8));
        assert_eq!(set.count_set(), 1);
    }

    #[test]
    fn test_padding_excluded() {
        // 10 bits stored in 2 bytes; bits above len read as unset
        let set = Bitset::from_bytes(&[0xFF, 0xFF], 10);
        assert_eq!(set.count_set(), 10);
        assert!(!set.bit(10));
        assert!(!set.bit(63));
    }
}
