//! Active-operation register and the find-session state it holds.

use crate::error::{TokenError, TokenResult};
use crate::object::ObjectHandle;

/// In-progress object search: the ordered match list computed at init time
/// and a cursor over it. Holds handles, never object references, so the
/// session cannot outlive the objects it points at.
#[derive(Debug)]
pub struct FindState {
    matches: Vec<ObjectHandle>,
    cursor: usize,
}

impl FindState {
    pub fn new(matches: Vec<ObjectHandle>) -> Self {
        Self { matches, cursor: 0 }
    }

    /// Copy up to `max_count` handles from the cursor and advance it.
    /// Returns an empty page once the match list is exhausted.
    pub fn next_page(&mut self, max_count: usize) -> Vec<ObjectHandle> {
        let end = self.cursor.saturating_add(max_count).min(self.matches.len());
        let page = self.matches[self.cursor..end].to_vec();
        self.cursor = end;
        page
    }

    pub fn remaining(&self) -> usize {
        self.matches.len() - self.cursor
    }
}

/// The operation currently holding the token context, if any.
///
/// Modeled as a tagged variant so an idle context cannot be mistaken for a
/// live find session; "find" is the only multi-call operation this core
/// drives today.
#[derive(Debug, Default)]
pub enum ActiveOperation {
    #[default]
    Idle,
    Finding(FindState),
}

/// Single-slot register for the token's active operation. At most one
/// operation is in progress per token context; this register is the source
/// of truth for that question.
#[derive(Debug, Default)]
pub struct OperationRegister {
    current: ActiveOperation,
}

impl OperationRegister {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        !matches!(self.current, ActiveOperation::Idle)
    }

    /// Install a find session. The caller must have checked `is_active`
    /// first; overwriting a live operation is a programming error.
    pub fn set_finding(&mut self, state: FindState) {
        debug_assert!(!self.is_active(), "operation slot is already occupied");
        self.current = ActiveOperation::Finding(state);
    }

    /// The live find session, or `NoActiveOperation` when the register is
    /// idle (a continuation call without a matching init).
    pub fn finding_mut(&mut self) -> TokenResult<&mut FindState> {
        match &mut self.current {
            ActiveOperation::Finding(state) => Ok(state),
            ActiveOperation::Idle => Err(TokenError::NoActiveOperation),
        }
    }

    /// Release the active operation and return the register to idle.
    pub fn clear(&mut self) {
        self.current = ActiveOperation::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pagination_covers_exactly_the_match_list() {
        let handles: Vec<ObjectHandle> = (1..=7).collect();
        for page_size in 1..=8usize {
            let mut state = FindState::new(handles.clone());
            let mut seen = Vec::new();
            loop {
                let page = state.next_page(page_size);
                if page.is_empty() {
                    break;
                }
                assert!(page.len() <= page_size);
                seen.extend(page);
            }
            assert_eq!(seen, handles);
            // exhaustion is repeatable, not an error
            assert!(state.next_page(page_size).is_empty());
        }
    }

    #[test]
    fn register_transitions() {
        let mut reg = OperationRegister::new();
        assert!(!reg.is_active());
        assert_eq!(reg.finding_mut().unwrap_err(), TokenError::NoActiveOperation);

        reg.set_finding(FindState::new(vec![3]));
        assert!(reg.is_active());
        assert_eq!(reg.finding_mut().unwrap().remaining(), 1);

        reg.clear();
        assert!(!reg.is_active());
        assert_eq!(reg.finding_mut().unwrap_err(), TokenError::NoActiveOperation);
    }
}
