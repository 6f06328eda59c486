//! The real scheme: a GGM PPRF derives a one-off wrapping key per tag, and
//! AES-GCM encrypts the payload under it.

use crate::{
    aead::{key_len_bits, open, seal, Aead},
    export,
    pkw::{Pkw, PkwFactory},
    pprf::{GgmPprf, PprfKey},
    secret::SecretBytes,
    tag::Tag,
    PkwError,
};

use core::marker::PhantomData;

use rand::{rngs::OsRng, CryptoRng, RngCore};

/// A puncturable key wrapper composing a GGM PPRF with the AEAD `A`. The
/// PPRF's key length is fixed to `A`'s key size, so the value derived for a
/// tag is used directly as the wrapping key.
pub struct PprfAeadPkw<A: Aead> {
    pprf: GgmPprf,
    marker: PhantomData<A>,
}

impl<A: Aead> PprfAeadPkw<A> {
    /// Makes a fresh instance over a tag space of `tag_len` bits.
    ///
    /// Return Value
    /// ============
    /// Returns `Err(PkwError::Initialization)` if `tag_len` is zero or
    /// exceeds [`MAX_TAG_LEN`](crate::MAX_TAG_LEN).
    pub fn new<R: CryptoRng + RngCore>(
        tag_len: usize,
        csprng: &mut R,
    ) -> Result<PprfAeadPkw<A>, PkwError> {
        let key = PprfKey::generate(key_len_bits::<A>(), tag_len, csprng)?;
        Ok(PprfAeadPkw {
            pprf: GgmPprf::new(key),
            marker: PhantomData,
        })
    }

    /// Wraps an existing PPRF key.
    ///
    /// Return Value
    /// ============
    /// Returns `Err(PkwError::Initialization)` if the key's length does not
    /// match `A`'s key size.
    pub fn from_key(key: PprfKey) -> Result<PprfAeadPkw<A>, PkwError> {
        if key.key_len() != key_len_bits::<A>() {
            return Err(PkwError::Initialization);
        }
        Ok(PprfAeadPkw {
            pprf: GgmPprf::new(key),
            marker: PhantomData,
        })
    }

    /// The size of the tag space in bits
    pub fn tag_len(&self) -> usize {
        self.pprf.tag_len()
    }
}

impl<A: Aead> Pkw for PprfAeadPkw<A> {
    fn wrap(&self, tag: Tag, header: &[u8], key: &[u8]) -> Result<Vec<u8>, PkwError> {
        let wrapping_key = self.pprf.eval(tag)?;
        seal::<A>(wrapping_key.as_slice(), header, key)
    }

    fn unwrap(&self, tag: Tag, header: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>, PkwError> {
        let wrapping_key = self.pprf.eval(tag)?;
        open::<A>(wrapping_key.as_slice(), header, ciphertext)
    }

    fn punc(&mut self, tag: Tag) -> Result<(), PkwError> {
        self.pprf.punc(tag)
    }

    fn num_puncs(&self) -> u64 {
        self.pprf.num_puncs()
    }

    fn secure_teardown(&mut self) {
        self.pprf.wipe();
    }

    fn serialize_key(&self) -> SecretBytes {
        self.pprf.serialize_key()
    }

    fn serialize_and_encrypt_key(&self, password: &str) -> Result<SecretBytes, PkwError> {
        let serialized = self.serialize_key();
        export::encrypt_export(serialized.as_slice(), password, &mut OsRng)
    }
}

/// Constructs [`PprfAeadPkw`] instances from serialized keys
pub struct PprfAeadPkwFactory<A: Aead> {
    marker: PhantomData<A>,
}

impl<A: Aead> PkwFactory for PprfAeadPkwFactory<A> {
    type Pkw = PprfAeadPkw<A>;

    fn from_serialized(serialized: &[u8]) -> Result<PprfAeadPkw<A>, PkwError> {
        PprfAeadPkw::from_key(PprfKey::from_bytes(serialized)?)
    }
}
