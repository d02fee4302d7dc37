//! Token object representation and load-time population.

use serde::{Deserialize, Serialize};

use crate::attributes::{Attribute, AttributeStore, AttributeType};
use crate::blob::Blob;
use crate::error::TokenResult;
use crate::mechanisms::{Mechanism, MechanismList};

/// Caller-visible identifier for a token object.
pub type ObjectHandle = u64;

/// Public/private key material pair. Set together through the single
/// mutator on [`TokenObject`]; never replaced afterwards.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyMaterial {
    pub public: Blob,
    pub private: Blob,
}

/// Object-level authorization secret. The wrapped form is what persistence
/// stores; the unsealed form exists only while the token is loaded and is
/// never written out.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectAuth {
    pub wrapped: Blob,
    #[serde(skip)]
    pub unsealed: Blob,
}

/// A single tokenized object: key material, authorization secret, typed
/// attributes, and the mechanism configurations the object supports.
///
/// Objects are created empty and populated incrementally by the load
/// collaborator through the setters and append operations below, then
/// inserted into the [`Token`](crate::token::Token) registry. All owned
/// buffers are released exactly once when the object is dropped.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct TokenObject {
    handle: ObjectHandle,
    id: u32,
    key_material: Option<KeyMaterial>,
    auth: Option<ObjectAuth>,
    attributes: AttributeStore,
    mechanisms: MechanismList,
}

impl TokenObject {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign the caller-visible handle. Assigned once, immutable after.
    pub fn set_handle(&mut self, handle: ObjectHandle) {
        debug_assert_eq!(self.handle, 0, "object handle is assigned exactly once");
        self.handle = handle;
    }

    /// Assign the internal persistence-correlation id.
    pub fn set_id(&mut self, id: u32) {
        self.id = id;
    }

    /// Install the public and private key blobs. Both are required; this is
    /// the only mutator for key material and may be called once.
    pub fn set_key_material(&mut self, public: Blob, private: Blob) {
        debug_assert!(self.key_material.is_none(), "key material is set exactly once");
        self.key_material = Some(KeyMaterial { public, private });
    }

    /// Install the object authorization secret: the unsealed form paired
    /// with its wrapped counterpart. May be called once.
    pub fn set_auth(&mut self, unsealed: Blob, wrapped: Blob) {
        debug_assert!(self.auth.is_none(), "object auth is set exactly once");
        self.auth = Some(ObjectAuth { wrapped, unsealed });
    }

    pub fn append_attributes(&mut self, attrs: &[Attribute]) -> TokenResult<()> {
        self.attributes.append(attrs)
    }

    pub fn append_mechanisms(&mut self, mechs: &[Mechanism]) -> TokenResult<()> {
        self.mechanisms.append(mechs)
    }

    pub fn handle(&self) -> ObjectHandle {
        self.handle
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn key_material(&self) -> Option<&KeyMaterial> {
        self.key_material.as_ref()
    }

    pub fn auth(&self) -> Option<&ObjectAuth> {
        self.auth.as_ref()
    }

    pub fn attributes(&self) -> &AttributeStore {
        &self.attributes
    }

    pub fn mechanisms(&self) -> &MechanismList {
        &self.mechanisms
    }

    /// First attribute with the given type, if any.
    pub fn attribute_by_type(&self, attribute_type: AttributeType) -> Option<&Attribute> {
        self.attributes.find_by_type(attribute_type)
    }

    /// Does this object satisfy the caller-supplied attribute template?
    /// Pure read-only predicate; see [`AttributeStore::matches_template`].
    pub fn matches_template(&self, template: &[Attribute]) -> bool {
        self.attributes.matches_template(template)
    }

    /// Is the requested mechanism configuration compatible with this
    /// object's capability list? See [`MechanismList::is_supported`].
    pub fn supports_mechanism(&self, requested: &Mechanism) -> TokenResult<()> {
        self.mechanisms.is_supported(requested)
    }
}

/// The token's wrapping key pair and its authorization value, used by the
/// load collaborator to unwrap per-object secrets.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct WrappingObject {
    pub public: Blob,
    pub private: Blob,
    pub auth: Blob,
}

/// The token's seal object: SO and user authorization salts with their
/// sealed key blobs.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SealObject {
    pub so_auth_salt: Blob,
    pub so_public: Blob,
    pub so_private: Blob,
    pub user_auth_salt: Blob,
    pub user_public: Blob,
    pub user_private: Blob,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::CKA_CLASS;
    use crate::mechanisms::CKM_RSA_PKCS;

    #[test]
    fn load_populates_incrementally() {
        let mut obj = TokenObject::new();
        obj.set_id(42);
        obj.set_handle(7);
        obj.set_key_material(
            Blob::new(b"pub".to_vec()),
            Blob::new(b"priv-ciphertext".to_vec()),
        );
        obj.set_auth(Blob::new(b"authval".to_vec()), Blob::new(b"wrapped".to_vec()));
        obj.append_attributes(&[Attribute::new(CKA_CLASS, b"key".to_vec())])
            .unwrap();
        obj.append_mechanisms(&[Mechanism::no_params(CKM_RSA_PKCS)])
            .unwrap();

        assert_eq!(obj.handle(), 7);
        assert_eq!(obj.id(), 42);
        assert_eq!(obj.key_material().unwrap().public.as_slice(), b"pub");
        assert_eq!(obj.auth().unwrap().unsealed.as_slice(), b"authval");
        assert_eq!(obj.attributes().len(), 1);
        assert_eq!(obj.mechanisms().len(), 1);
    }

    #[test]
    fn unsealed_auth_never_serializes() {
        let mut obj = TokenObject::new();
        obj.set_auth(
            Blob::new(b"plaintext-auth".to_vec()),
            Blob::new(b"wrapped-auth".to_vec()),
        );
        let json = serde_json::to_string(&obj).unwrap();
        assert!(!json.contains("unsealed"));

        let restored: TokenObject = serde_json::from_str(&json).unwrap();
        assert!(restored.auth().unwrap().unsealed.is_empty());
        assert_eq!(
            restored.auth().unwrap().wrapped.as_slice(),
            b"wrapped-auth"
        );
    }
}
