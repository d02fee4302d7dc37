use std::collections::TryReserveError;

use thiserror::Error;

use crate::mechanisms::MechanismType;
use crate::object::ObjectHandle;

pub type TokenResult<T> = Result<T, TokenError>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("host memory exhausted")]
    OutOfMemory,
    #[error("an operation is already active on this token")]
    OperationActive,
    #[error("no operation is active on this token")]
    NoActiveOperation,
    #[error("object handle {0} does not resolve")]
    ObjectNotFound(ObjectHandle),
    #[error("caller buffer too small: attribute needs {needed} bytes, buffer holds {capacity}")]
    BufferTooSmall { needed: usize, capacity: usize },
    #[error("mechanism {0:#06x} is not offered by this object")]
    MechanismUnsupported(MechanismType),
    #[error("mechanism {0:#06x} is offered, but not with the requested parameters")]
    MechanismParamInvalid(MechanismType),
    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl TokenError {
    pub fn unexpected<E: std::fmt::Display>(err: E) -> Self {
        Self::Unexpected(err.to_string())
    }
}

impl From<TryReserveError> for TokenError {
    fn from(_: TryReserveError) -> Self {
        TokenError::OutOfMemory
    }
}
