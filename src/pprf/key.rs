use crate::{pprf::codec, secret::SecretBytes, tag::MAX_TAG_LEN, PkwError};

use rand::{CryptoRng, RngCore};

/// A root of a subtree of the GGM derivation tree: the path from the tree
/// root as a `'0'`/`'1'` string, and the secret that seeds every tag whose
/// top bits equal that path. A root with an empty prefix seeds the whole tag
/// space.
///
/// Immutable after construction.
#[derive(Clone, Debug, PartialEq)]
pub struct SecretRoot {
    prefix: String,
    value: SecretBytes,
}

impl SecretRoot {
    pub fn new(prefix: String, value: SecretBytes) -> SecretRoot {
        SecretRoot { prefix, value }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn value(&self) -> &SecretBytes {
        &self.value
    }
}

/// The key of a [`GgmPprf`](crate::pprf::GgmPprf): the derivation-tree
/// parameters, the puncture counter, and the subtree roots that cover
/// exactly the unpunctured tags.
///
/// Invariant: `nodes` is ordered lexicographically by prefix, and no prefix
/// is a prefix of another. Puncturing maintains this; the explicit
/// constructor restores the ordering but trusts the caller for disjointness.
#[derive(Clone, Debug, PartialEq)]
pub struct PprfKey {
    /// The size of the key space in bits
    pub(crate) key_len: usize,
    /// The size of the tag space in bits
    pub(crate) tag_len: usize,
    /// The number of punctures performed with this key
    pub(crate) puncs: u64,
    pub(crate) nodes: Vec<SecretRoot>,
}

impl PprfKey {
    /// Generates a fresh key: a single uniformly random subtree root with an
    /// empty prefix, covering the whole tag space.
    ///
    /// Return Value
    /// ============
    /// Returns `Ok(key)` on success. If `key_len == 0`, `tag_len == 0`, or
    /// `tag_len > MAX_TAG_LEN`, returns `Err(PkwError::Initialization)`.
    pub fn generate<R: CryptoRng + RngCore>(
        key_len: usize,
        tag_len: usize,
        csprng: &mut R,
    ) -> Result<PprfKey, PkwError> {
        if key_len == 0 || tag_len == 0 || tag_len > MAX_TAG_LEN {
            return Err(PkwError::Initialization);
        }

        let mut seed = SecretBytes::zeroed(key_len / 8);
        csprng.fill_bytes(seed.as_mut_slice());

        Ok(PprfKey {
            key_len,
            tag_len,
            puncs: 0,
            nodes: vec![SecretRoot::new(String::new(), seed)],
        })
    }

    /// Assembles a key from explicit parts. The nodes are sorted
    /// lexicographically by prefix on entry; the caller is responsible for
    /// them covering disjoint subtrees.
    pub fn from_parts(
        key_len: usize,
        tag_len: usize,
        puncs: u64,
        mut nodes: Vec<SecretRoot>,
    ) -> PprfKey {
        nodes.sort_by(|n1, n2| n1.prefix.cmp(&n2.prefix));
        PprfKey {
            key_len,
            tag_len,
            puncs,
            nodes,
        }
    }

    /// Constructs a key from its serialized form. See
    /// [`to_bytes`](PprfKey::to_bytes) for the format.
    ///
    /// Return Value
    /// ============
    /// Returns `Err(PkwError::PprfDeserialization)` if any field is
    /// truncated, the declared node count does not consume the buffer
    /// exactly, the key length is not a positive multiple of 8, the tag
    /// length is outside `[1, MAX_TAG_LEN]`, or a prefix contains bytes
    /// other than `'0'`/`'1'`.
    pub fn from_bytes(bytes: &[u8]) -> Result<PprfKey, PkwError> {
        codec::deserialize(bytes)
    }

    /// Serializes the key for export. All integers are unsigned 64-bit in
    /// network byte order:
    ///
    /// ```text
    /// tag_len || key_len || puncs || n_nodes
    ///     || (prefix_len || prefix || value)*
    /// ```
    pub fn to_bytes(&self) -> SecretBytes {
        codec::serialize(self)
    }

    pub fn key_len(&self) -> usize {
        self.key_len
    }

    pub fn tag_len(&self) -> usize {
        self.tag_len
    }

    pub fn num_puncs(&self) -> u64 {
        self.puncs
    }

    pub fn nodes(&self) -> &[SecretRoot] {
        &self.nodes
    }
}
