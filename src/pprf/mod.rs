//! A puncturable pseudorandom function built from the Goldreich-Goldwasser-
//! Micali tree construction (<https://doi.org/10.1145/6490.6503>), with
//! HKDF-SHA256 as the length-preserving PRG at each node.
//!
//! The key is an ordered list of subtree roots whose subtrees partition the
//! unpunctured tags. Evaluation walks from the covering root down to the
//! leaf for the tag; puncturing replaces the covering root with the siblings
//! along that walk (the co-path), which cover everything the root covered
//! except the tag itself.

pub(crate) mod codec;
mod key;

pub use key::{PprfKey, SecretRoot};

use crate::{secret::SecretBytes, tag::Tag, PkwError};

use core::mem;

use hkdf::Hkdf;
use sha2::Sha256;

// Child-derivation labels: a tag bit of 1 descends right, 0 left
const LEFT: &[u8] = b"l";
const RIGHT: &[u8] = b"r";

/// Derives one child of a tree node: HKDF with the parent value as input key
/// material, no salt, and the one-byte direction label as the info string.
fn derive_child(parent: &[u8], direction: &[u8], out: &mut [u8]) {
    let hkdf = Hkdf::<Sha256>::new(None, parent);
    // Only fails if the output is over 255 hash lengths, i.e. a key of more
    // than 65280 bits
    hkdf.expand(direction, out)
        .expect("pprf key len is way too big");
}

/// The GGM puncturable PRF. Evaluation derives a distinct pseudorandom value
/// per tag; puncturing permanently removes a single tag from the domain
/// while leaving every other tag's value unchanged.
pub struct GgmPprf {
    key: PprfKey,
}

impl GgmPprf {
    /// Constructs a PPRF instance over the given key
    pub fn new(key: PprfKey) -> GgmPprf {
        GgmPprf { key }
    }

    /// Evaluates the PPRF at `tag`, yielding `key_len / 8` pseudorandom
    /// bytes.
    ///
    /// Return Value
    /// ============
    /// Returns `Ok(value)` on success. If the tag has bits set at or beyond
    /// the configured tag length, or the tag has been punctured, returns
    /// `Err(PkwError::IllegalTag)`. There is no other failure path: the
    /// derivation is deterministic and total for in-range tags.
    pub fn eval(&self, tag: Tag) -> Result<SecretBytes, PkwError> {
        if !tag.fits(self.key.tag_len) {
            return Err(PkwError::IllegalTag);
        }
        let rendered = tag.to_bit_string(self.key.tag_len);
        let index = self
            .find_covering_node(&rendered)
            .ok_or(PkwError::IllegalTag)?;
        let node = &self.key.nodes[index];

        let mut current = node.value().clone();
        let mut derived = SecretBytes::zeroed(self.key.key_len / 8);
        for &bit in rendered.as_bytes()[node.prefix().len()..].iter() {
            let direction = if bit == b'1' { RIGHT } else { LEFT };
            derive_child(current.as_slice(), direction, derived.as_mut_slice());
            mem::swap(&mut current, &mut derived);
        }
        Ok(current)
    }

    /// Punctures the PPRF at `tag`: the covering subtree root is replaced by
    /// the co-path of the tag, after which the tag can never be evaluated
    /// again. Puncturing an already-punctured tag is a no-op and does not
    /// move the counter.
    ///
    /// Return Value
    /// ============
    /// Returns `Ok(())` unless the tag has bits set at or beyond the
    /// configured tag length, in which case it returns
    /// `Err(PkwError::IllegalTag)`.
    pub fn punc(&mut self, tag: Tag) -> Result<(), PkwError> {
        if !tag.fits(self.key.tag_len) {
            return Err(PkwError::IllegalTag);
        }
        let rendered = tag.to_bit_string(self.key.tag_len);
        let index = match self.find_covering_node(&rendered) {
            Some(index) => index,
            // Already punctured
            None => return Ok(()),
        };

        self.key.puncs += 1;

        let co_path = self.expand_co_path(&rendered, index);
        self.key.nodes.remove(index);
        for (offset, root) in co_path.into_iter().enumerate() {
            self.key.nodes.insert(index + offset, root);
        }
        Ok(())
    }

    /// The number of punctures performed on this PPRF
    pub fn num_puncs(&self) -> u64 {
        self.key.puncs
    }

    /// The size of the tag space in bits
    pub fn tag_len(&self) -> usize {
        self.key.tag_len
    }

    /// Serializes the key. See [`PprfKey::to_bytes`] for the format.
    pub fn serialize_key(&self) -> SecretBytes {
        self.key.to_bytes()
    }

    /// Wipes all secret material immediately. Every subsequent evaluation
    /// fails as if its tag had been punctured.
    pub fn wipe(&mut self) {
        // Dropping the roots zeroizes their values
        self.key.nodes.clear();
    }

    /// Finds the unique node whose prefix is a prefix of the rendered tag.
    ///
    /// Because the prefixes are pairwise incomparable and sorted, binary
    /// search works: if the probed prefix does not cover the tag, every
    /// prefix on one side of it is also too small or too large.
    fn find_covering_node(&self, rendered: &str) -> Option<usize> {
        let nodes = &self.key.nodes;
        let mut min = 0;
        let mut max = nodes.len();
        while max > min {
            let index = (max + min) / 2;
            let prefix = nodes[index].prefix();
            if rendered.starts_with(prefix) {
                return Some(index);
            } else if prefix < rendered {
                min = index + 1;
            } else {
                max = index;
            }
        }
        None
    }

    /// Walks from the covering node down to the leaf for the rendered tag,
    /// collecting the sibling of every step. The result is ordered so that
    /// splicing it in place of the covering node keeps the node list sorted:
    /// siblings left of the path ascend, siblings right of the path are
    /// reversed to ascend as well.
    fn expand_co_path(&self, rendered: &str, index: usize) -> Vec<SecretRoot> {
        let node = &self.key.nodes[index];
        let key_bytes = self.key.key_len / 8;

        let mut lefts = Vec::new();
        let mut rights = Vec::new();

        let mut prefix = node.prefix().to_string();
        let mut current = node.value().clone();
        let mut derived_left = SecretBytes::zeroed(key_bytes);
        let mut derived_right = SecretBytes::zeroed(key_bytes);

        for &bit in rendered.as_bytes()[node.prefix().len()..].iter() {
            derive_child(current.as_slice(), LEFT, derived_left.as_mut_slice());
            derive_child(current.as_slice(), RIGHT, derived_right.as_mut_slice());
            if bit == b'1' {
                let mut sibling = prefix.clone();
                sibling.push('0');
                lefts.push(SecretRoot::new(sibling, derived_left.clone()));
                mem::swap(&mut current, &mut derived_right);
                prefix.push('1');
            } else {
                let mut sibling = prefix.clone();
                sibling.push('1');
                rights.push(SecretRoot::new(sibling, derived_right.clone()));
                mem::swap(&mut current, &mut derived_left);
                prefix.push('0');
            }
        }

        // If the covering node was already a leaf the co-path is empty and
        // the caller simply removes it
        lefts.extend(rights.into_iter().rev());
        lefts
    }
}

#[cfg(test)]
mod test {
    use super::{GgmPprf, PprfKey, SecretRoot};
    use crate::{secret::SecretBytes, tag::Tag, PkwError};

    use rand::{rngs::StdRng, SeedableRng};

    const TEST_KEY_LEN: usize = 128;

    fn test_pprf(tag_len: usize) -> GgmPprf {
        let mut csprng = StdRng::from_entropy();
        GgmPprf::new(PprfKey::generate(TEST_KEY_LEN, tag_len, &mut csprng).unwrap())
    }

    fn zero_value() -> SecretBytes {
        SecretBytes::zeroed(TEST_KEY_LEN / 8)
    }

    /// Checks that the node list is strictly ascending and that no prefix is
    /// a prefix of another
    fn assert_cover_invariant(pprf: &GgmPprf) {
        let nodes = &pprf.key.nodes;
        for pair in nodes.windows(2) {
            assert!(pair[0].prefix() < pair[1].prefix(), "nodes out of order");
        }
        for n1 in nodes.iter() {
            for n2 in nodes.iter() {
                if n1.prefix() != n2.prefix() {
                    assert!(
                        !n2.prefix().starts_with(n1.prefix()),
                        "prefixes {} and {} overlap",
                        n1.prefix(),
                        n2.prefix()
                    );
                }
            }
        }
    }

    // Value found by manual inspection of an independent HKDF-SHA256 chain
    #[test]
    fn test_eval_known_answer() {
        let n1 = SecretRoot::new("0101".to_string(), zero_value());
        let n2 = SecretRoot::new("001".to_string(), zero_value());
        let pprf = GgmPprf::new(PprfKey::from_parts(TEST_KEY_LEN, 10, 0, vec![n1, n2]));

        // 356 = 0b0101100100, so the "0101" root covers it
        let value = pprf.eval(Tag::from(356u64)).unwrap();
        assert_eq!(
            value.as_slice(),
            &hex::decode("d436ae44ce57f972a5b10b702e802389").unwrap()[..]
        );
    }

    #[test]
    fn test_eval_range_bounds() {
        let pprf = test_pprf(10);
        assert!(pprf.eval(Tag::from(0u64)).is_ok());
        assert!(pprf.eval(Tag::from(1023u64)).is_ok());
        assert_eq!(pprf.eval(Tag::from(1024u64)), Err(PkwError::IllegalTag));
        assert_eq!(pprf.eval(Tag::from(1u64 << 13)), Err(PkwError::IllegalTag));

        let mut huge = Tag::zero();
        huge.set_bit(255, true);
        assert_eq!(pprf.eval(huge), Err(PkwError::IllegalTag));
    }

    #[test]
    fn test_multi_eval() {
        let pprf = test_pprf(10);
        for i in 0..200u64 {
            assert!(pprf.eval(Tag::from(i)).is_ok(), "could not eval for {}", i);
        }
    }

    #[test]
    fn test_punc_then_eval() {
        let mut pprf = test_pprf(10);
        assert!(pprf.eval(Tag::from(10u64)).is_ok());
        pprf.punc(Tag::from(10u64)).unwrap();
        assert_eq!(pprf.eval(Tag::from(10u64)), Err(PkwError::IllegalTag));
    }

    #[test]
    fn test_punc_leaves_other_values_unchanged() {
        let mut pprf = test_pprf(10);
        let before: Vec<_> = (0..100u64)
            .map(|i| pprf.eval(Tag::from(i)).unwrap())
            .collect();

        for p in [10u64, 8, 4, 98] {
            pprf.punc(Tag::from(p)).unwrap();
        }
        assert_cover_invariant(&pprf);

        for i in 0..100u64 {
            if [10, 8, 4, 98].contains(&i) {
                assert_eq!(
                    pprf.eval(Tag::from(i)),
                    Err(PkwError::IllegalTag),
                    "{} was punctured",
                    i
                );
            } else {
                // Not just still evaluable: the exact value is unaffected
                assert_eq!(
                    pprf.eval(Tag::from(i)).unwrap(),
                    before[i as usize],
                    "value changed for {}",
                    i
                );
            }
        }
    }

    #[test]
    fn test_punc_same_tag_twice() {
        let mut pprf = test_pprf(10);
        pprf.punc(Tag::from(10u64)).unwrap();
        assert_eq!(pprf.num_puncs(), 1);
        // The second puncture is a no-op, not an error
        pprf.punc(Tag::from(10u64)).unwrap();
        assert_eq!(pprf.num_puncs(), 1);
        assert_eq!(pprf.eval(Tag::from(10u64)), Err(PkwError::IllegalTag));
    }

    #[test]
    fn test_punc_out_of_range() {
        let mut pprf = test_pprf(10);
        assert_eq!(pprf.punc(Tag::from(1024u64)), Err(PkwError::IllegalTag));
        assert_eq!(pprf.num_puncs(), 0);
    }

    #[test]
    fn test_puncture_whole_tag_space() {
        // With every tag punctured the node list is empty, so even legal tags
        // look punctured
        let mut pprf = test_pprf(3);
        for i in 0..8u64 {
            pprf.punc(Tag::from(i)).unwrap();
            assert_cover_invariant(&pprf);
        }
        assert_eq!(pprf.num_puncs(), 8);
        assert_eq!(pprf.key.nodes.len(), 0);
        for i in 0..8u64 {
            assert_eq!(pprf.eval(Tag::from(i)), Err(PkwError::IllegalTag));
        }
    }

    #[test]
    fn test_large_tag_space() {
        let mut pprf = test_pprf(256);
        let punctured = [0u64, 1, 2, 3, 4, 5, 1000];
        for &i in punctured.iter() {
            pprf.punc(Tag::from(i)).unwrap();
        }
        assert_cover_invariant(&pprf);

        let mut prev = SecretBytes::new();
        for i in 0..2048u64 {
            if punctured.contains(&i) {
                assert_eq!(
                    pprf.eval(Tag::from(i)),
                    Err(PkwError::IllegalTag),
                    "{} was punctured",
                    i
                );
            } else {
                let curr = pprf.eval(Tag::from(i)).unwrap();
                // Sanity check
                assert_ne!(curr, prev, "values should differ");
                prev = curr;
            }
        }
    }

    #[test]
    fn test_serialization_preserves_behavior() {
        let mut pprf1 = test_pprf(10);
        for p in [12u64, 500, 1022] {
            pprf1.punc(Tag::from(p)).unwrap();
        }

        let serialized = pprf1.serialize_key();
        let mut pprf2 = GgmPprf::new(PprfKey::from_bytes(serialized.as_slice()).unwrap());
        assert_eq!(pprf2.num_puncs(), 3);
        assert_eq!(pprf2.tag_len(), 10);

        for i in 0..1024u64 {
            assert_eq!(pprf1.eval(Tag::from(i)), pprf2.eval(Tag::from(i)));
        }

        // And the two instances keep agreeing after further punctures
        pprf1.punc(Tag::from(77u64)).unwrap();
        pprf2.punc(Tag::from(77u64)).unwrap();
        assert_eq!(pprf1.num_puncs(), pprf2.num_puncs());
        assert_eq!(pprf1.eval(Tag::from(78u64)), pprf2.eval(Tag::from(78u64)));
        assert_eq!(pprf2.eval(Tag::from(77u64)), Err(PkwError::IllegalTag));
    }

    #[test]
    fn test_wipe() {
        let mut pprf = test_pprf(10);
        assert!(pprf.eval(Tag::from(3u64)).is_ok());
        pprf.wipe();
        assert_eq!(pprf.eval(Tag::from(3u64)), Err(PkwError::IllegalTag));
    }
}
