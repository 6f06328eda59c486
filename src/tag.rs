use byteorder::{BigEndian, ByteOrder};

/// The width of the tag space in bits. Every tag is carried in a value of
/// this width; a PPRF instance additionally configures an effective tag
/// length and rejects tags that use bits beyond it.
pub const MAX_TAG_LEN: usize = 256;

/// A wrapping tag: a fixed-width 256-bit unsigned integer.
///
/// Bit positions count from the least significant bit, so a tag constructed
/// with `Tag::from(5u64)` has bits 0 and 2 set. When a tag is matched against
/// node prefixes in the derivation tree it is rendered most-significant-bit
/// first, zero-padded to the effective tag length.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Tag([u8; 32]);

impl Tag {
    /// The all-zero tag
    pub fn zero() -> Tag {
        Tag([0u8; 32])
    }

    /// Returns the bit at position `pos`, counting from the least significant
    /// bit.
    ///
    /// Panics if `pos >= MAX_TAG_LEN`.
    pub fn bit(&self, pos: usize) -> bool {
        assert!(pos < MAX_TAG_LEN, "bit position out of range");
        (self.0[31 - pos / 8] >> (pos % 8)) & 1 == 1
    }

    /// Sets the bit at position `pos`, counting from the least significant
    /// bit.
    ///
    /// Panics if `pos >= MAX_TAG_LEN`.
    pub fn set_bit(&mut self, pos: usize, value: bool) {
        assert!(pos < MAX_TAG_LEN, "bit position out of range");
        let mask = 1u8 << (pos % 8);
        if value {
            self.0[31 - pos / 8] |= mask;
        } else {
            self.0[31 - pos / 8] &= !mask;
        }
    }

    /// Returns true iff every bit at position `tag_len` and above is zero,
    /// i.e. the tag lies inside a tag space of `tag_len` bits
    pub(crate) fn fits(&self, tag_len: usize) -> bool {
        (tag_len..MAX_TAG_LEN).all(|pos| !self.bit(pos))
    }

    /// Renders the low `tag_len` bits as a `'0'`/`'1'` string, most
    /// significant bit first
    pub(crate) fn to_bit_string(&self, tag_len: usize) -> String {
        let mut rendered = String::with_capacity(tag_len);
        for pos in (0..tag_len).rev() {
            rendered.push(if self.bit(pos) { '1' } else { '0' });
        }
        rendered
    }

    /// The low 64 bits of the tag
    pub(crate) fn low_u64(&self) -> u64 {
        BigEndian::read_u64(&self.0[24..])
    }
}

impl From<u64> for Tag {
    fn from(val: u64) -> Tag {
        let mut bytes = [0u8; 32];
        BigEndian::write_u64(&mut bytes[24..], val);
        Tag(bytes)
    }
}

impl From<u128> for Tag {
    fn from(val: u128) -> Tag {
        let mut bytes = [0u8; 32];
        BigEndian::write_u128(&mut bytes[16..], val);
        Tag(bytes)
    }
}

#[cfg(test)]
mod test {
    use super::{Tag, MAX_TAG_LEN};

    #[test]
    fn test_bit_positions() {
        let tag = Tag::from(0b101u64);
        assert!(tag.bit(0));
        assert!(!tag.bit(1));
        assert!(tag.bit(2));
        assert!(!tag.bit(3));
        assert!(!tag.bit(255));
    }

    #[test]
    fn test_set_bit_round_trip() {
        let mut tag = Tag::zero();
        for pos in [0, 7, 8, 63, 64, 128, 255] {
            tag.set_bit(pos, true);
            assert!(tag.bit(pos));
        }
        tag.set_bit(128, false);
        assert!(!tag.bit(128));
    }

    #[test]
    fn test_from_u128_matches_from_u64() {
        assert_eq!(Tag::from(356u64), Tag::from(356u128));
        let wide = Tag::from(1u128 << 100);
        assert!(wide.bit(100));
    }

    #[test]
    fn test_fits() {
        let tag = Tag::from(1023u64);
        assert!(tag.fits(10));
        assert!(!Tag::from(1024u64).fits(10));
        let mut huge = Tag::zero();
        huge.set_bit(MAX_TAG_LEN - 1, true);
        assert!(!huge.fits(255));
        assert!(huge.fits(256));
    }

    #[test]
    fn test_bit_string_rendering() {
        assert_eq!(Tag::from(356u64).to_bit_string(10), "0101100100");
        assert_eq!(Tag::from(1u64).to_bit_string(3), "001");
        assert_eq!(Tag::zero().to_bit_string(4), "0000");
    }

    #[test]
    fn test_low_u64() {
        assert_eq!(Tag::from(0xDEAD_BEEFu64).low_u64(), 0xDEAD_BEEF);
    }
}
