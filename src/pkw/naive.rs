//! The naive scheme: one pre-generated key per tag, held in a map with
//! tombstones. Exponential in the tag length and only viable for tiny tag
//! spaces, but trivially correct -- it exists as a conformance oracle for
//! the PPRF-based scheme, so it satisfies the same binding properties
//! (header as associated data, same ciphertext shape).

use crate::{
    aead::{open, seal, AesGcm128},
    export,
    pkw::{Pkw, PkwFactory},
    secret::SecretBytes,
    tag::Tag,
    PkwError,
};

use std::collections::BTreeMap;

use byteorder::{BigEndian, ByteOrder};
use rand::{rngs::OsRng, CryptoRng, RngCore};

// Per-tag keys are AES-128 keys
const KEY_LEN: usize = 16;

/// The widest tag space the naive scheme accepts. Beyond this the up-front
/// key generation (2^tag_len keys) is the limiting factor, not the
/// algorithm.
pub const NAIVE_MAX_TAG_LEN: usize = 24;

/// A puncturable key wrapper that materializes an AES-128 key for every tag
/// up front. Puncturing wipes the tag's key and leaves a tombstone.
pub struct NaivePkw {
    tag_len: usize,
    puncs: u64,
    /// `None` marks a punctured tag
    keys: BTreeMap<u64, Option<SecretBytes>>,
}

impl NaivePkw {
    /// Makes a fresh instance, generating a random key for each of the
    /// `2^tag_len` tags.
    ///
    /// Return Value
    /// ============
    /// Returns `Err(PkwError::Initialization)` if `tag_len` is zero or
    /// exceeds [`NAIVE_MAX_TAG_LEN`].
    pub fn new<R: CryptoRng + RngCore>(
        tag_len: usize,
        csprng: &mut R,
    ) -> Result<NaivePkw, PkwError> {
        if tag_len == 0 || tag_len > NAIVE_MAX_TAG_LEN {
            return Err(PkwError::Initialization);
        }

        let mut keys = BTreeMap::new();
        for index in 0..(1u64 << tag_len) {
            let mut kek = SecretBytes::zeroed(KEY_LEN);
            csprng.fill_bytes(kek.as_mut_slice());
            keys.insert(index, Some(kek));
        }

        Ok(NaivePkw {
            tag_len,
            puncs: 0,
            keys,
        })
    }

    /// Looks up the live key for a tag
    fn lookup(&self, tag: Tag) -> Result<&SecretBytes, PkwError> {
        if !tag.fits(self.tag_len) {
            return Err(PkwError::IllegalTag);
        }
        match self.keys.get(&tag.low_u64()) {
            Some(Some(kek)) => Ok(kek),
            // Punctured (or never materialized, which a fresh instance
            // cannot produce)
            _ => Err(PkwError::IllegalTag),
        }
    }
}

impl Pkw for NaivePkw {
    fn wrap(&self, tag: Tag, header: &[u8], key: &[u8]) -> Result<Vec<u8>, PkwError> {
        let kek = self.lookup(tag)?;
        seal::<AesGcm128>(kek.as_slice(), header, key)
    }

    fn unwrap(&self, tag: Tag, header: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>, PkwError> {
        let kek = self.lookup(tag)?;
        open::<AesGcm128>(kek.as_slice(), header, ciphertext)
    }

    fn punc(&mut self, tag: Tag) -> Result<(), PkwError> {
        if !tag.fits(self.tag_len) {
            return Err(PkwError::IllegalTag);
        }
        if let Some(slot) = self.keys.get_mut(&tag.low_u64()) {
            if slot.is_some() {
                // Dropping the key zeroizes it
                *slot = None;
                self.puncs += 1;
            }
        }
        Ok(())
    }

    fn num_puncs(&self) -> u64 {
        self.puncs
    }

    fn secure_teardown(&mut self) {
        for slot in self.keys.values_mut() {
            *slot = None;
        }
    }

    /// Serializes as `tag_len || puncs || n_live || (tag || key)*`, all
    /// integers unsigned 64-bit big-endian. Punctured tags are simply
    /// absent.
    fn serialize_key(&self) -> SecretBytes {
        let live: Vec<(&u64, &SecretBytes)> = self
            .keys
            .iter()
            .filter_map(|(index, slot)| slot.as_ref().map(|kek| (index, kek)))
            .collect();

        let mut out = Vec::with_capacity(24 + live.len() * (8 + KEY_LEN));
        put_u64(&mut out, self.tag_len as u64);
        put_u64(&mut out, self.puncs);
        put_u64(&mut out, live.len() as u64);
        for (index, kek) in live {
            put_u64(&mut out, *index);
            out.extend_from_slice(kek.as_slice());
        }
        SecretBytes::from(out)
    }

    fn serialize_and_encrypt_key(&self, password: &str) -> Result<SecretBytes, PkwError> {
        let serialized = self.serialize_key();
        export::encrypt_export(serialized.as_slice(), password, &mut OsRng)
    }
}

/// Constructs [`NaivePkw`] instances from serialized keys
pub struct NaivePkwFactory;

impl PkwFactory for NaivePkwFactory {
    type Pkw = NaivePkw;

    fn from_serialized(serialized: &[u8]) -> Result<NaivePkw, PkwError> {
        let mut reader = SliceReader {
            buf: serialized,
            pos: 0,
        };
        let tag_len = reader.read_u64()?;
        let puncs = reader.read_u64()?;
        let n_live = reader.read_u64()?;

        if tag_len == 0 || tag_len > NAIVE_MAX_TAG_LEN as u64 {
            return Err(PkwError::PprfDeserialization);
        }
        let tag_len = tag_len as usize;

        // Every tag starts out as a tombstone; the serialized entries bring
        // the live ones back
        let mut keys: BTreeMap<u64, Option<SecretBytes>> =
            (0..(1u64 << tag_len)).map(|index| (index, None)).collect();
        for _ in 0..n_live {
            let index = reader.read_u64()?;
            let kek = reader.read_bytes(KEY_LEN)?;
            match keys.get_mut(&index) {
                Some(slot) => *slot = Some(SecretBytes::from(kek.to_vec())),
                None => return Err(PkwError::PprfDeserialization),
            }
        }
        if reader.pos != serialized.len() {
            return Err(PkwError::PprfDeserialization);
        }

        Ok(NaivePkw {
            tag_len,
            puncs,
            keys,
        })
    }
}

fn put_u64(out: &mut Vec<u8>, val: u64) {
    let mut buf = [0u8; 8];
    BigEndian::write_u64(&mut buf, val);
    out.extend_from_slice(&buf);
}

struct SliceReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> SliceReader<'a> {
    fn read_u64(&mut self) -> Result<u64, PkwError> {
        let bytes = self.read_bytes(8)?;
        Ok(BigEndian::read_u64(bytes))
    }

    fn read_bytes(&mut self, len: usize) -> Result<&'a [u8], PkwError> {
        if self.buf.len() - self.pos < len {
            return Err(PkwError::PprfDeserialization);
        }
        let bytes = &self.buf[self.pos..self.pos + len];
        self.pos += len;
        Ok(bytes)
    }
}
