//! The password envelope used to move serialized keys between machines: the
//! key blob is AES-GCM encrypted under a password-derived key, with the
//! nonce and salt carried at the tail of the ciphertext.

use crate::{secret::SecretBytes, PkwError};

use aead::{Aead as BaseAead, KeyInit, Nonce, Payload};
use generic_array::typenum::{U12, U16};
use pbkdf2::pbkdf2_hmac;
use rand::{CryptoRng, RngCore};
use sha2::Sha256;

pub(crate) const SALT_LEN: usize = 16;
pub(crate) const NONCE_LEN: usize = 16;
const KEY_LEN: usize = 16;
const PBKDF_ITERS: u32 = 100;

// The envelope always uses AES-128-GCM with a 16-byte nonce and a truncated
// 12-byte mac, independent of the algorithm wrapped keys use
type ExportAead = aes_gcm::AesGcm<aes_gcm::aes::Aes128, U16, U12>;

/// Derives the envelope key from a password and salt
fn derive_export_key(password: &str, salt: &[u8]) -> SecretBytes {
    let mut key = SecretBytes::zeroed(KEY_LEN);
    pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, PBKDF_ITERS, key.as_mut_slice());
    key
}

/// Encrypts `plaintext` under a password-derived key.
///
/// The salt is drawn fresh per export, so equal plaintexts under equal
/// passwords yield unrelated blobs. The output layout is
/// `body || mac(12) || nonce(16) || salt(16)`.
///
/// Return Value
/// ============
/// Returns `Ok(blob)` on success, `Err(PkwError::Export)` if the underlying
/// encryption fails.
pub(crate) fn encrypt_export<R: CryptoRng + RngCore>(
    plaintext: &[u8],
    password: &str,
    csprng: &mut R,
) -> Result<SecretBytes, PkwError> {
    let mut salt = [0u8; SALT_LEN];
    csprng.fill_bytes(&mut salt);
    let mut nonce = [0u8; NONCE_LEN];
    csprng.fill_bytes(&mut nonce);

    let key = derive_export_key(password, &salt);
    let encryptor =
        ExportAead::new_from_slice(key.as_slice()).map_err(|_| PkwError::Export)?;
    let mut blob = encryptor
        .encrypt(
            Nonce::<ExportAead>::from_slice(&nonce),
            Payload {
                msg: plaintext,
                aad: &[],
            },
        )
        .map_err(|_| PkwError::Export)?;

    blob.extend_from_slice(&nonce);
    blob.extend_from_slice(&salt);
    Ok(SecretBytes::from(blob))
}

/// Decrypts a blob produced by [`encrypt_export`].
///
/// Return Value
/// ============
/// Returns `Ok(plaintext)` on success. Any failure -- a blob too short to
/// hold the trailer, or a wrong password, or a mutated body -- returns
/// `Err(PkwError::Import)`.
pub(crate) fn decrypt_export(blob: &[u8], password: &str) -> Result<SecretBytes, PkwError> {
    if blob.len() < SALT_LEN + NONCE_LEN {
        return Err(PkwError::Import);
    }
    // Layout is body || nonce || salt, splitting from the end
    let (body, trailer) = blob.split_at(blob.len() - SALT_LEN - NONCE_LEN);
    let (nonce, salt) = trailer.split_at(NONCE_LEN);

    let key = derive_export_key(password, salt);
    let decryptor =
        ExportAead::new_from_slice(key.as_slice()).map_err(|_| PkwError::Import)?;
    let plaintext = decryptor
        .decrypt(
            Nonce::<ExportAead>::from_slice(nonce),
            Payload {
                msg: body,
                aad: &[],
            },
        )
        .map_err(|_| PkwError::Import)?;

    Ok(SecretBytes::from(plaintext))
}
