use crate::PkwError;

use aead::{Aead as BaseAead, KeyInit, Payload};
use generic_array::{
    typenum::{Unsigned, U16},
    GenericArray,
};

/// Represents authenticated encryption functionality
pub trait Aead {
    /// The underlying AEAD implementation
    type AeadImpl: BaseAead + KeyInit;
}

/// The implementation of AES-GCM-128.
///
/// The wire format calls for a 16-byte IV, so this is AES-GCM instantiated
/// with a 16-byte nonce rather than the more common 12 bytes. The
/// authentication tag is 16 bytes, appended to the ciphertext.
pub struct AesGcm128 {}

impl Aead for AesGcm128 {
    type AeadImpl = aes_gcm::AesGcm<aes_gcm::aes::Aes128, U16>;
}

/// The implementation of AES-GCM-256
pub struct AesGcm256 {}

impl Aead for AesGcm256 {
    type AeadImpl = aes_gcm::AesGcm<aes_gcm::aes::Aes256, U16>;
}

pub(crate) type AeadNonce<A> =
    GenericArray<u8, <<A as Aead>::AeadImpl as aead::AeadCore>::NonceSize>;

/// The length in bits of the key that `A`'s implementation expects
pub(crate) fn key_len_bits<A: Aead>() -> usize {
    <<<A as Aead>::AeadImpl as aead::KeySizeUser>::KeySize as Unsigned>::USIZE * 8
}

/// Encrypts `plaintext` under `key` with an all-zero IV, binding `header` as
/// associated data. Returns `ciphertext || mac`.
///
/// Callers must not reuse a key across plaintexts: the fixed IV assumes
/// wrapping keys are derived per tag and the tag is punctured after use.
pub(crate) fn seal<A: Aead>(
    key: &[u8],
    header: &[u8],
    plaintext: &[u8],
) -> Result<Vec<u8>, PkwError> {
    let encryptor =
        <A::AeadImpl as KeyInit>::new_from_slice(key).map_err(|_| PkwError::Wrapping)?;
    let nonce = AeadNonce::<A>::default();
    encryptor
        .encrypt(
            &nonce,
            Payload {
                msg: plaintext,
                aad: header,
            },
        )
        .map_err(|_| PkwError::Wrapping)
}

/// Decrypts `ciphertext || mac` produced by [`seal`]. Fails with
/// `PkwError::Unwrapping` if authentication fails for any reason: wrong key,
/// wrong header, or a mutated ciphertext.
pub(crate) fn open<A: Aead>(
    key: &[u8],
    header: &[u8],
    ciphertext: &[u8],
) -> Result<Vec<u8>, PkwError> {
    let decryptor =
        <A::AeadImpl as KeyInit>::new_from_slice(key).map_err(|_| PkwError::Unwrapping)?;
    let nonce = AeadNonce::<A>::default();
    decryptor
        .decrypt(
            &nonce,
            Payload {
                msg: ciphertext,
                aad: header,
            },
        )
        .map_err(|_| PkwError::Unwrapping)
}

#[cfg(test)]
mod test {
    use super::{key_len_bits, open, seal, AesGcm128, AesGcm256};
    use crate::PkwError;

    use rand::{rngs::StdRng, RngCore, SeedableRng};

    /// Tests that `open()` recovers what `seal()` produced, and that
    /// authentication failures map to the right error
    macro_rules! test_seal_open {
        ($test_name:ident, $aead_ty:ty) => {
            #[test]
            fn $test_name() {
                type A = $aead_ty;

                let mut csprng = StdRng::from_entropy();
                let mut key = vec![0u8; key_len_bits::<A>() / 8];
                csprng.fill_bytes(&mut key);

                let header = b"but what is it that I am";
                let msg = b"a rose by any other name";

                let ciphertext = seal::<A>(&key, header, msg).expect("seal() failed");
                // ciphertext || 16-byte mac
                assert_eq!(ciphertext.len(), msg.len() + 16);

                let opened = open::<A>(&key, header, &ciphertext).expect("open() failed");
                assert_eq!(&opened[..], &msg[..]);

                // A different header must not authenticate
                assert_eq!(
                    open::<A>(&key, b"some other header", &ciphertext),
                    Err(PkwError::Unwrapping)
                );

                // Neither must a clobbered ciphertext
                let mut mutated = ciphertext.clone();
                mutated[0] ^= 1;
                assert_eq!(open::<A>(&key, header, &mutated), Err(PkwError::Unwrapping));

                // Nor one too short to even hold a mac
                assert_eq!(open::<A>(&key, header, &[0u8; 4]), Err(PkwError::Unwrapping));
            }
        };
    }

    test_seal_open!(test_seal_open_aes128, AesGcm128);
    test_seal_open!(test_seal_open_aes256, AesGcm256);

    #[test]
    fn test_key_sizes() {
        assert_eq!(key_len_bits::<AesGcm128>(), 128);
        assert_eq!(key_len_bits::<AesGcm256>(), 256);
    }

    #[test]
    fn test_wrong_key_length_rejected() {
        assert_eq!(
            seal::<AesGcm128>(&[0u8; 5], b"", b""),
            Err(PkwError::Wrapping)
        );
    }
}
