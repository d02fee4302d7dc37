//! Typed attribute storage and template matching for token objects.

use serde::{Deserialize, Serialize};

use crate::error::TokenResult;

/// Identifier for a PKCS#11-style attribute (mirrors CK_ATTRIBUTE_TYPE numeric values).
pub type AttributeType = u64;

pub const CKA_CLASS: AttributeType = 0x0000_0000;
pub const CKA_TOKEN: AttributeType = 0x0000_0001;
pub const CKA_PRIVATE: AttributeType = 0x0000_0002;
pub const CKA_LABEL: AttributeType = 0x0000_0003;
pub const CKA_VALUE: AttributeType = 0x0000_0011;
pub const CKA_KEY_TYPE: AttributeType = 0x0000_0100;
pub const CKA_ID: AttributeType = 0x0000_0102;
pub const CKA_SENSITIVE: AttributeType = 0x0000_0103;
pub const CKA_ENCRYPT: AttributeType = 0x0000_0104;
pub const CKA_DECRYPT: AttributeType = 0x0000_0105;
pub const CKA_SIGN: AttributeType = 0x0000_0108;
pub const CKA_VERIFY: AttributeType = 0x0000_010A;
pub const CKA_MODULUS: AttributeType = 0x0000_0120;

/// A single typed, length-delimited attribute value.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    pub attribute_type: AttributeType,
    pub value: Vec<u8>,
}

impl Attribute {
    pub fn new(attribute_type: AttributeType, value: impl Into<Vec<u8>>) -> Self {
        Self {
            attribute_type,
            value: value.into(),
        }
    }

    /// Full equality as used for template matching: same type, same length,
    /// and byte-equal values (two zero-length values always match).
    pub fn matches(&self, other: &Attribute) -> bool {
        self.attribute_type == other.attribute_type
            && self.value.len() == other.value.len()
            && (self.value.is_empty() || self.value == other.value)
    }

    fn try_clone(&self) -> TokenResult<Self> {
        let mut value = Vec::new();
        value.try_reserve_exact(self.value.len())?;
        value.extend_from_slice(&self.value);
        Ok(Self {
            attribute_type: self.attribute_type,
            value,
        })
    }
}

/// An object's ordered attribute collection.
///
/// Duplicate attribute types are legal; lookups return the first entry in
/// storage order. Every append deep-copies its input, so the caller keeps
/// ownership of whatever it passed in.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeStore {
    attrs: Vec<Attribute>,
}

impl AttributeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deep-copy and append `new_attrs`.
    ///
    /// Callers probe before appending and hand over a placeholder entry when
    /// they have nothing to add; a leading zero-length value therefore means
    /// "nothing to append" and the call succeeds without touching the store.
    /// On allocation failure the store is left exactly as it was.
    pub fn append(&mut self, new_attrs: &[Attribute]) -> TokenResult<()> {
        if new_attrs.first().is_none_or(|a| a.value.is_empty()) {
            return Ok(());
        }

        let mut staged = Vec::new();
        staged.try_reserve_exact(new_attrs.len())?;
        for attr in new_attrs {
            staged.push(attr.try_clone()?);
        }

        self.attrs.try_reserve(staged.len())?;
        self.attrs.extend(staged);
        Ok(())
    }

    /// First attribute with the given type, if any.
    pub fn find_by_type(&self, attribute_type: AttributeType) -> Option<&Attribute> {
        self.attrs
            .iter()
            .find(|a| a.attribute_type == attribute_type)
    }

    /// First attribute fully matching `candidate` (type, length, and bytes).
    pub fn find_exact(&self, candidate: &Attribute) -> Option<&Attribute> {
        self.attrs.iter().find(|a| a.matches(candidate))
    }

    /// Subset-match an attribute template against this store.
    ///
    /// An empty template matches unconditionally. Otherwise every template
    /// entry must have a full match here; the object may carry attributes
    /// the template does not mention.
    pub fn matches_template(&self, template: &[Attribute]) -> bool {
        if template.is_empty() {
            return true;
        }
        template.iter().all(|entry| self.find_exact(entry).is_some())
    }

    pub fn len(&self) -> usize {
        self.attrs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attrs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Attribute> {
        self.attrs.iter()
    }
}
