//! The puncturable key wrapping capability: wrap small secrets under tags,
//! permanently retire any tag, and export the whole object -- in the clear
//! or under a password.

pub(crate) mod naive;
pub(crate) mod pprf_aead;

use crate::{export, secret::SecretBytes, tag::Tag, PkwError};

/// The interface every puncturable key wrapping scheme provides
pub trait Pkw {
    /// Wraps `key` under `tag`, binding `header` as associated data that is
    /// integrity protected but not encrypted.
    ///
    /// Return Value
    /// ============
    /// Returns `Ok(ciphertext)` on success. If the tag is out of range or
    /// punctured, returns `Err(PkwError::IllegalTag)`; if the underlying
    /// encryption fails, `Err(PkwError::Wrapping)`.
    fn wrap(&self, tag: Tag, header: &[u8], key: &[u8]) -> Result<Vec<u8>, PkwError>;

    /// Unwraps a key previously wrapped with the same tag and header.
    ///
    /// Return Value
    /// ============
    /// Returns `Ok(key)` on success. If the tag is out of range or
    /// punctured, returns `Err(PkwError::IllegalTag)`; if authentication
    /// fails -- a different tag or header than at wrap time, or a mutated
    /// ciphertext -- returns `Err(PkwError::Unwrapping)`.
    fn unwrap(&self, tag: Tag, header: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>, PkwError>;

    /// Punctures on `tag`: subsequent wraps and unwraps under it fail with
    /// `PkwError::IllegalTag`. Puncturing the same tag again is a no-op.
    ///
    /// Return Value
    /// ============
    /// Returns `Ok(())` unless the tag is out of range, in which case it
    /// returns `Err(PkwError::IllegalTag)`.
    fn punc(&mut self, tag: Tag) -> Result<(), PkwError>;

    /// The number of distinct tags punctured so far
    fn num_puncs(&self) -> u64;

    /// Securely erases all key material ahead of destruction. The instance
    /// stays usable but behaves as if every tag had been punctured.
    fn secure_teardown(&mut self);

    /// Serializes the key in the clear. Protecting the result is the
    /// caller's responsibility.
    fn serialize_key(&self) -> SecretBytes;

    /// Serializes the key and encrypts it under a password-derived key
    fn serialize_and_encrypt_key(&self, password: &str) -> Result<SecretBytes, PkwError>;
}

/// Constructs [`Pkw`] instances from serialized key material
pub trait PkwFactory {
    /// The scheme this factory constructs
    type Pkw: Pkw;

    /// Constructs an instance from a serialized key
    fn from_serialized(serialized: &[u8]) -> Result<Self::Pkw, PkwError>;

    /// Constructs an instance from a serialized key encrypted with
    /// [`Pkw::serialize_and_encrypt_key`].
    ///
    /// Return Value
    /// ============
    /// Returns `Err(PkwError::Import)` if the envelope does not decrypt
    /// under `password`, otherwise whatever [`Self::from_serialized`]
    /// returns for the recovered blob.
    fn from_serialized_and_encrypted(
        serialized: &[u8],
        password: &str,
    ) -> Result<Self::Pkw, PkwError> {
        let decrypted = export::decrypt_export(serialized, password)?;
        Self::from_serialized(decrypted.as_slice())
    }
}
