use core::fmt;

use subtle::ConstantTimeEq;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// An owned byte buffer whose storage is wiped before it is released.
///
/// Every buffer holding key material in this crate is a `SecretBytes`. The
/// wipe happens on drop and therefore also on replacement-assignment, since
/// assigning drops the previous value. The zeroizing write cannot be elided
/// by the compiler.
///
/// Equality is value equality, evaluated in constant time.
#[derive(Clone, Default, Zeroize, ZeroizeOnDrop)]
pub struct SecretBytes(Vec<u8>);

impl SecretBytes {
    /// Makes an empty buffer
    pub fn new() -> SecretBytes {
        SecretBytes(Vec::new())
    }

    /// Makes a buffer of `len` zero bytes
    pub fn zeroed(len: usize) -> SecretBytes {
        SecretBytes(vec![0u8; len])
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> core::slice::Iter<'_, u8> {
        self.0.iter()
    }
}

// Takes ownership of the vector's allocation, so the only live copy of the
// bytes is held by the zeroizing owner.
impl From<Vec<u8>> for SecretBytes {
    fn from(bytes: Vec<u8>) -> SecretBytes {
        SecretBytes(bytes)
    }
}

impl AsRef<[u8]> for SecretBytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl PartialEq for SecretBytes {
    fn eq(&self, other: &SecretBytes) -> bool {
        // Length mismatch short-circuits inside ct_eq
        self.0.ct_eq(&other.0).into()
    }
}

impl Eq for SecretBytes {}

// Contents never appear in debug output
impl fmt::Debug for SecretBytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecretBytes({} bytes)", self.0.len())
    }
}
