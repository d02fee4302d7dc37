//! SoftToken core library: the in-memory object store and query engine of
//! the PKCS#11 provider. Holds the token's objects, answers attribute and
//! mechanism-capability queries against them, and drives the multi-call
//! find protocol. Higher level components (the C-ABI front-end, session
//! layer, and persistence backends) interact exclusively with this crate;
//! cryptographic execution and on-disk formats live with those
//! collaborators, not here.
//!
//! The library is synchronous and lock-free by contract: a token context
//! is exclusively owned by its caller, which serializes access.

pub mod attributes;
pub mod blob;
pub mod error;
pub mod mechanisms;
pub mod object;
pub mod operation;
pub mod token;

pub use attributes::{Attribute, AttributeStore, AttributeType};
pub use blob::Blob;
pub use error::{TokenError, TokenResult};
pub use mechanisms::{
    Mechanism, MechanismList, MechanismParameter, MechanismType, OaepParams,
};
pub use object::{KeyMaterial, ObjectAuth, ObjectHandle, SealObject, TokenObject, WrappingObject};
pub use operation::{ActiveOperation, FindState, OperationRegister};
pub use token::{AttributeRequest, Token};
