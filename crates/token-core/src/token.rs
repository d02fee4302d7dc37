//! Token object registry, the find protocol, and attribute retrieval.

use tracing::{debug, trace};

use crate::attributes::{Attribute, AttributeType};
use crate::error::{TokenError, TokenResult};
use crate::mechanisms::Mechanism;
use crate::object::{ObjectHandle, SealObject, TokenObject, WrappingObject};
use crate::operation::{FindState, OperationRegister};

/// One entry of an attribute-retrieval template, mirroring the two-call
/// size/data pattern: probe with no buffer to learn the required length,
/// then call again with a buffer of at least that capacity.
#[derive(Clone, Debug)]
pub struct AttributeRequest {
    attribute_type: AttributeType,
    buffer: Option<Vec<u8>>,
    size: Option<usize>,
}

impl AttributeRequest {
    /// Size-probe entry: reports the required length without copying.
    pub fn probe(attribute_type: AttributeType) -> Self {
        Self {
            attribute_type,
            buffer: None,
            size: None,
        }
    }

    /// Entry backed by a caller buffer of `capacity` bytes.
    pub fn with_capacity(attribute_type: AttributeType, capacity: usize) -> Self {
        Self {
            attribute_type,
            buffer: Some(vec![0; capacity]),
            size: None,
        }
    }

    pub fn attribute_type(&self) -> AttributeType {
        self.attribute_type
    }

    /// Copied attribute bytes, when the call filled this entry's buffer.
    pub fn value(&self) -> Option<&[u8]> {
        match (&self.buffer, self.size) {
            (Some(buf), Some(_)) => Some(buf.as_slice()),
            _ => None,
        }
    }

    /// Length reported for this entry. `None` after a completed call means
    /// the object has no attribute of this type ("absent", as opposed to
    /// "present with an empty value", which reports `Some(0)`).
    pub fn reported_len(&self) -> Option<usize> {
        self.size
    }

    /// True once a completed call found no attribute of this type.
    pub fn is_absent(&self) -> bool {
        self.buffer.is_none() && self.size.is_none()
    }
}

/// The token-wide object registry plus the single active-operation slot.
///
/// The registry exclusively owns its objects for the lifetime of the token
/// context; find sessions reference them by handle only. The caller
/// serializes access (single-writer discipline), so nothing here locks.
#[derive(Debug, Default)]
pub struct Token {
    objects: Vec<TokenObject>,
    wrapping: Option<WrappingObject>,
    seal: Option<SealObject>,
    ops: OperationRegister,
}

impl Token {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a loaded object. Insertion order is preserved and determines
    /// find iteration order.
    pub fn add_object(&mut self, object: TokenObject) -> TokenResult<()> {
        self.objects.try_reserve(1)?;
        self.objects.push(object);
        Ok(())
    }

    pub fn set_wrapping_object(&mut self, wrapping: WrappingObject) {
        self.wrapping = Some(wrapping);
    }

    pub fn set_seal_object(&mut self, seal: SealObject) {
        self.seal = Some(seal);
    }

    pub fn wrapping_object(&self) -> Option<&WrappingObject> {
        self.wrapping.as_ref()
    }

    pub fn seal_object(&self) -> Option<&SealObject> {
        self.seal.as_ref()
    }

    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    pub fn objects(&self) -> impl Iterator<Item = &TokenObject> {
        self.objects.iter()
    }

    /// Resolve a caller-visible handle by linear scan of the registry.
    pub fn object_by_handle(&self, handle: ObjectHandle) -> Option<&TokenObject> {
        self.objects.iter().find(|obj| obj.handle() == handle)
    }

    /// Whether any multi-call operation currently holds this token context.
    pub fn is_operation_active(&self) -> bool {
        self.ops.is_active()
    }

    /// Begin an object search over the registry.
    ///
    /// Fails with `OperationActive` if another operation holds the context.
    /// Zero matches (or an empty registry) still produces a valid, empty
    /// session. If the match list cannot be allocated the partial list is
    /// discarded and the context stays idle.
    pub fn find_init(&mut self, template: &[Attribute]) -> TokenResult<()> {
        if self.ops.is_active() {
            return Err(TokenError::OperationActive);
        }

        let mut matches = Vec::new();
        for obj in &self.objects {
            if obj.matches_template(template) {
                matches.try_reserve(1)?;
                matches.push(obj.handle());
            }
        }

        debug!(
            matched = matches.len(),
            total = self.objects.len(),
            "find session initialized"
        );
        self.ops.set_finding(FindState::new(matches));
        Ok(())
    }

    /// Retrieve up to `max_count` handles from the active search, advancing
    /// its cursor. An empty page signals exhaustion; it is not an error and
    /// may be requested repeatedly. `NoActiveOperation` without a prior
    /// `find_init`.
    pub fn find_next(&mut self, max_count: usize) -> TokenResult<Vec<ObjectHandle>> {
        let state = self.ops.finding_mut()?;
        let page = state.next_page(max_count);
        trace!(count = page.len(), remaining = state.remaining(), "find page served");
        Ok(page)
    }

    /// Tear down the active search and return the context to idle. The
    /// matched objects themselves are untouched; they belong to the
    /// registry, not the session.
    pub fn find_final(&mut self) -> TokenResult<()> {
        self.ops.finding_mut()?;
        self.ops.clear();
        debug!("find session finalized");
        Ok(())
    }

    /// Fill an attribute-retrieval template from the object behind `handle`.
    ///
    /// Entries are processed in template order. An entry whose type the
    /// object lacks is marked absent (not an error). An entry without a
    /// buffer gets only the required length written back. An entry whose
    /// buffer is too small fails the whole call with `BufferTooSmall`;
    /// entries already processed keep their results. Callers depend on
    /// this first-failure-aborts behavior, so it is part of the contract.
    /// The registry is never mutated.
    pub fn get_attributes(
        &self,
        handle: ObjectHandle,
        template: &mut [AttributeRequest],
    ) -> TokenResult<()> {
        let obj = self
            .object_by_handle(handle)
            .ok_or(TokenError::ObjectNotFound(handle))?;

        for request in template.iter_mut() {
            let Some(found) = obj.attribute_by_type(request.attribute_type) else {
                request.buffer = None;
                request.size = None;
                continue;
            };

            match &mut request.buffer {
                None => {
                    request.size = Some(found.value.len());
                }
                Some(buf) => {
                    if buf.len() < found.value.len() {
                        return Err(TokenError::BufferTooSmall {
                            needed: found.value.len(),
                            capacity: buf.len(),
                        });
                    }
                    buf.clear();
                    buf.extend_from_slice(&found.value);
                    request.size = Some(found.value.len());
                }
            }
        }

        Ok(())
    }

    /// Check a requested mechanism against the capability list of the
    /// object behind `handle`.
    pub fn mechanism_supported(
        &self,
        handle: ObjectHandle,
        requested: &Mechanism,
    ) -> TokenResult<()> {
        let obj = self
            .object_by_handle(handle)
            .ok_or(TokenError::ObjectNotFound(handle))?;
        obj.supports_mechanism(requested)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::{CKA_CLASS, CKA_ID, CKA_LABEL};

    fn object(handle: ObjectHandle, attrs: &[(AttributeType, &[u8])]) -> TokenObject {
        let mut obj = TokenObject::new();
        obj.set_handle(handle);
        obj.set_id(handle as u32);
        let attrs: Vec<Attribute> = attrs
            .iter()
            .map(|(t, v)| Attribute::new(*t, v.to_vec()))
            .collect();
        obj.append_attributes(&attrs).unwrap();
        obj
    }

    fn two_object_token() -> Token {
        let mut token = Token::new();
        token
            .add_object(object(1, &[(CKA_CLASS, b"KEY"), (CKA_ID, b"01")]))
            .unwrap();
        token
            .add_object(object(2, &[(CKA_CLASS, b"CERT")]))
            .unwrap();
        token
    }

    #[test]
    fn second_find_init_is_rejected_and_first_survives() {
        let mut token = two_object_token();
        token.find_init(&[]).unwrap();
        assert_eq!(token.find_init(&[]).unwrap_err(), TokenError::OperationActive);
        // first session still iterable, covering both objects
        assert_eq!(token.find_next(10).unwrap(), vec![1, 2]);
        token.find_final().unwrap();
    }

    #[test]
    fn find_continuations_without_init_fail() {
        let mut token = two_object_token();
        assert_eq!(token.find_next(1).unwrap_err(), TokenError::NoActiveOperation);
        assert_eq!(token.find_final().unwrap_err(), TokenError::NoActiveOperation);
    }

    #[test]
    fn empty_registry_yields_valid_empty_session() {
        let mut token = Token::new();
        token.find_init(&[Attribute::new(CKA_CLASS, b"KEY".to_vec())]).unwrap();
        assert!(token.find_next(16).unwrap().is_empty());
        token.find_final().unwrap();
    }

    #[test]
    fn size_probe_reports_length_without_copying() {
        let token = two_object_token();
        let mut template = vec![AttributeRequest::probe(CKA_CLASS)];
        token.get_attributes(1, &mut template).unwrap();
        assert_eq!(template[0].reported_len(), Some(3));
        assert!(template[0].value().is_none());
    }

    #[test]
    fn missing_attribute_is_absent_not_an_error() {
        let token = two_object_token();
        let mut template = vec![AttributeRequest::with_capacity(CKA_LABEL, 8)];
        token.get_attributes(2, &mut template).unwrap();
        assert!(template[0].is_absent());
        assert_eq!(template[0].reported_len(), None);
    }

    #[test]
    fn undersized_buffer_fails_but_keeps_earlier_entries() {
        let token = two_object_token();
        let mut template = vec![
            AttributeRequest::with_capacity(CKA_CLASS, 8),
            AttributeRequest::with_capacity(CKA_ID, 1), // needs 2
        ];
        let err = token.get_attributes(1, &mut template).unwrap_err();
        assert_eq!(err, TokenError::BufferTooSmall { needed: 2, capacity: 1 });
        // the first entry was already written and stays written
        assert_eq!(template[0].value(), Some(&b"KEY"[..]));
        assert_eq!(template[1].value(), None);
    }

    #[test]
    fn unknown_handle_does_not_resolve() {
        let token = two_object_token();
        let mut template = vec![AttributeRequest::probe(CKA_CLASS)];
        assert_eq!(
            token.get_attributes(99, &mut template).unwrap_err(),
            TokenError::ObjectNotFound(99)
        );
    }

    #[test]
    fn retrieval_does_not_mutate_the_object() {
        let token = two_object_token();
        let before = token.object_by_handle(1).unwrap().attributes().clone();
        let mut template = vec![AttributeRequest::with_capacity(CKA_CLASS, 16)];
        token.get_attributes(1, &mut template).unwrap();
        assert_eq!(token.object_by_handle(1).unwrap().attributes(), &before);
    }
}
