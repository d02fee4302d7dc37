//! Mechanism capability lists and per-mechanism parameter compatibility.

use serde::{Deserialize, Serialize};

use crate::error::{TokenError, TokenResult};

/// Identifier for a PKCS#11-style mechanism (mirrors CK_MECHANISM_TYPE numeric values).
pub type MechanismType = u64;

pub const CKM_RSA_PKCS_KEY_PAIR_GEN: MechanismType = 0x0000_0000;
pub const CKM_RSA_PKCS: MechanismType = 0x0000_0001;
pub const CKM_RSA_X_509: MechanismType = 0x0000_0003;
pub const CKM_RSA_PKCS_OAEP: MechanismType = 0x0000_0009;
pub const CKM_SHA256: MechanismType = 0x0000_0250;
pub const CKM_ECDSA: MechanismType = 0x0000_1041;
pub const CKM_AES_CBC: MechanismType = 0x0000_1082;
pub const CKM_AES_GCM: MechanismType = 0x0000_1087;

/// Mask generation function identifiers for OAEP.
pub const CKG_MGF1_SHA1: u64 = 0x0000_0001;
pub const CKG_MGF1_SHA256: u64 = 0x0000_0002;
pub const CKG_MGF1_SHA384: u64 = 0x0000_0003;
pub const CKG_MGF1_SHA512: u64 = 0x0000_0004;

/// AES block size; CBC initialization vectors must be exactly this long.
pub const AES_BLOCK_SIZE: usize = 16;

/// OAEP parameter block. Only the hash and MGF tags participate in
/// compatibility checks; the encoding label is free-form.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OaepParams {
    pub hash_alg: MechanismType,
    pub mgf: u64,
    pub source_data: Vec<u8>,
}

/// Owned mechanism parameter payload.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MechanismParameter {
    Empty,
    Oaep(OaepParams),
    Bytes(Vec<u8>),
}

impl MechanismParameter {
    /// Byte length when the parameter is a raw blob (e.g. an IV).
    fn raw_len(&self) -> Option<usize> {
        match self {
            MechanismParameter::Empty => Some(0),
            MechanismParameter::Bytes(bytes) => Some(bytes.len()),
            MechanismParameter::Oaep(_) => None,
        }
    }

    fn try_clone(&self) -> TokenResult<Self> {
        Ok(match self {
            MechanismParameter::Empty => MechanismParameter::Empty,
            MechanismParameter::Oaep(params) => {
                let mut source_data = Vec::new();
                source_data.try_reserve_exact(params.source_data.len())?;
                source_data.extend_from_slice(&params.source_data);
                MechanismParameter::Oaep(OaepParams {
                    hash_alg: params.hash_alg,
                    mgf: params.mgf,
                    source_data,
                })
            }
            MechanismParameter::Bytes(bytes) => {
                let mut copy = Vec::new();
                copy.try_reserve_exact(bytes.len())?;
                copy.extend_from_slice(bytes);
                MechanismParameter::Bytes(copy)
            }
        })
    }
}

/// An identified algorithm configuration an object may support.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mechanism {
    pub mechanism_type: MechanismType,
    pub parameter: MechanismParameter,
}

impl Mechanism {
    pub fn new(mechanism_type: MechanismType, parameter: MechanismParameter) -> Self {
        Self {
            mechanism_type,
            parameter,
        }
    }

    pub fn no_params(mechanism_type: MechanismType) -> Self {
        Self::new(mechanism_type, MechanismParameter::Empty)
    }

    fn try_clone(&self) -> TokenResult<Self> {
        Ok(Self {
            mechanism_type: self.mechanism_type,
            parameter: self.parameter.try_clone()?,
        })
    }
}

/// Parameter-equality rule applied when checking a requested mechanism
/// against a stored capability entry. The rule is keyed by mechanism
/// identifier; anything without a dedicated rule falls back to strict
/// byte equality against the catalog entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ParamRule {
    /// The mechanism takes no parameters; any request matches.
    Ignored,
    /// OAEP: the requested hash and MGF tags must equal the stored ones.
    OaepTags,
    /// CBC: the request must carry an IV of the cipher block size. The
    /// stored entry is irrelevant; this is a structural check on the
    /// caller-supplied parameter.
    IvLength(usize),
    /// Byte-for-byte parameter equality.
    ExactBytes,
}

impl ParamRule {
    fn for_mechanism(mechanism_type: MechanismType) -> Self {
        match mechanism_type {
            CKM_RSA_X_509 => ParamRule::Ignored,
            CKM_RSA_PKCS_OAEP => ParamRule::OaepTags,
            CKM_AES_CBC => ParamRule::IvLength(AES_BLOCK_SIZE),
            _ => ParamRule::ExactBytes,
        }
    }

    fn compatible(&self, requested: &MechanismParameter, stored: &MechanismParameter) -> bool {
        match self {
            ParamRule::Ignored => true,
            ParamRule::OaepTags => match (requested, stored) {
                (MechanismParameter::Oaep(req), MechanismParameter::Oaep(cat)) => {
                    req.hash_alg == cat.hash_alg && req.mgf == cat.mgf
                }
                _ => false,
            },
            ParamRule::IvLength(expected) => requested.raw_len() == Some(*expected),
            ParamRule::ExactBytes => requested == stored,
        }
    }
}

/// An object's ordered mechanism capability collection.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MechanismList {
    mechs: Vec<Mechanism>,
}

impl MechanismList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deep-copy and append `new_mechs`. On allocation failure the list is
    /// left exactly as it was.
    pub fn append(&mut self, new_mechs: &[Mechanism]) -> TokenResult<()> {
        let mut staged = Vec::new();
        staged.try_reserve_exact(new_mechs.len())?;
        for mech in new_mechs {
            staged.push(mech.try_clone()?);
        }

        self.mechs.try_reserve(staged.len())?;
        self.mechs.extend(staged);
        Ok(())
    }

    /// Check whether `requested` is compatible with any stored capability.
    ///
    /// `MechanismUnsupported` means the identifier is not offered at all;
    /// `MechanismParamInvalid` means the identifier is offered but no entry
    /// accepted the requested parameters. Callers remediate the two cases
    /// differently, so the distinction is part of the contract.
    pub fn is_supported(&self, requested: &Mechanism) -> TokenResult<()> {
        let rule = ParamRule::for_mechanism(requested.mechanism_type);
        let mut identifier_offered = false;

        for entry in &self.mechs {
            if entry.mechanism_type != requested.mechanism_type {
                continue;
            }
            identifier_offered = true;
            if rule.compatible(&requested.parameter, &entry.parameter) {
                return Ok(());
            }
        }

        Err(if identifier_offered {
            TokenError::MechanismParamInvalid(requested.mechanism_type)
        } else {
            TokenError::MechanismUnsupported(requested.mechanism_type)
        })
    }

    pub fn len(&self) -> usize {
        self.mechs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mechs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Mechanism> {
        self.mechs.iter()
    }
}
