//! # pkw
//!
//! An implementation of puncturable key wrapping (PKW) in pure Rust.
//!
//! A PKW object wraps small secret payloads under *tags* drawn from a large
//! tag space, like an AEAD whose key is indexed by tag. Any tag can be
//! permanently *punctured*: wrapping and unwrapping under it become
//! impossible, while every other tag is unaffected. This gives forward
//! security for key hierarchies -- once a client retires a tag, not even a
//! full compromise of its state recovers the keys wrapped under it.
//!
//! Per-tag wrapping keys come from a puncturable PRF built on the
//! Goldreich-Goldwasser-Micali tree construction over HKDF-SHA256, and
//! payloads are encrypted with AES-GCM. The PKW primitive is described in
//! [Backendal, Günther and Paterson](https://eprint.iacr.org/2022/1209).
//!
//! Example:
//!
//! ```
//! use pkw::{AesGcm128, Pkw, PprfAeadPkw, Tag};
//!
//! let mut csprng = rand::thread_rng();
//! let mut pkw = PprfAeadPkw::<AesGcm128>::new(32, &mut csprng).unwrap();
//!
//! let header = b"epoch 17";
//! let dek = b"a data encryption key";
//!
//! // Wrap a payload under tag 7, then recover it
//! let wrapped = pkw.wrap(Tag::from(7u64), header, dek).unwrap();
//! assert_eq!(pkw.unwrap(Tag::from(7u64), header, &wrapped).unwrap(), dek);
//!
//! // After puncturing, tag 7 is gone for good
//! pkw.punc(Tag::from(7u64)).unwrap();
//! assert!(pkw.unwrap(Tag::from(7u64), header, &wrapped).is_err());
//! assert!(pkw.wrap(Tag::from(8u64), header, dek).is_ok());
//! ```
//!
//! Instances are not thread-safe: callers sharing one across threads must
//! serialize access themselves. All buffers holding secrets are wiped when
//! dropped.

#![forbid(unsafe_code)]

mod aead;
mod export;
mod pkw;
pub mod pprf;
mod secret;
mod tag;

use core::fmt;

pub use crate::{
    aead::{Aead, AesGcm128, AesGcm256},
    pkw::{
        naive::{NaivePkw, NaivePkwFactory, NAIVE_MAX_TAG_LEN},
        pprf_aead::{PprfAeadPkw, PprfAeadPkwFactory},
        Pkw, PkwFactory,
    },
    secret::SecretBytes,
    tag::{Tag, MAX_TAG_LEN},
};

/// The failure modes of this crate
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PkwError {
    /// The tag has bits set beyond the configured tag length, or its
    /// covering subtree has been punctured
    IllegalTag,
    /// The underlying AEAD encryption failed
    Wrapping,
    /// AEAD authentication failed: wrong tag, wrong header, or a mutated
    /// ciphertext
    Unwrapping,
    /// Construction parameters describe an empty or oversized key or tag
    /// space
    Initialization,
    /// A serialized key was malformed
    PprfDeserialization,
    /// A password-encrypted key could not be decrypted
    Import,
    /// A key could not be encrypted for export
    Export,
}

impl fmt::Display for PkwError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self {
            PkwError::IllegalTag => "tag is out of range or punctured",
            PkwError::Wrapping => "encryption error while wrapping",
            PkwError::Unwrapping => "could not authenticate while unwrapping",
            PkwError::Initialization => "invalid construction parameters",
            PkwError::PprfDeserialization => "malformed serialized key",
            PkwError::Import => "could not decrypt key with password",
            PkwError::Export => "could not encrypt key with password",
        };
        f.write_str(kind)
    }
}

impl std::error::Error for PkwError {}
