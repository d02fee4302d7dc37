//! Owning byte container for key material and object secrets.

use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::TokenResult;

/// Variable-length binary value with single-owner semantics.
///
/// The buffer is owned outright: construction copies, `Clone` deep-copies,
/// and the storage is zeroized exactly once when the value is dropped.
/// Secrets routinely live in these, so `Debug` does not print the contents.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct Blob(Vec<u8>);

impl Blob {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// Deep-copy construction that reports allocation failure instead of
    /// aborting, for use on append paths that must stay atomic.
    pub fn try_from_slice(bytes: &[u8]) -> TokenResult<Self> {
        let mut buf = Vec::new();
        buf.try_reserve_exact(bytes.len())?;
        buf.extend_from_slice(bytes);
        Ok(Self(buf))
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl AsRef<[u8]> for Blob {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<Vec<u8>> for Blob {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl std::fmt::Debug for Blob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Blob")
            .field("len", &self.0.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deep_copy_does_not_alias() {
        let original = Blob::try_from_slice(b"secret material").unwrap();
        let copy = original.clone();
        assert_eq!(original, copy);
        assert_ne!(original.as_slice().as_ptr(), copy.as_slice().as_ptr());
    }

    #[test]
    fn debug_redacts_contents() {
        let blob = Blob::new(b"wrapped auth".to_vec());
        let rendered = format!("{blob:?}");
        assert!(!rendered.contains("wrapped"));
        assert!(rendered.contains("len"));
    }
}
