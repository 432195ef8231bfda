//! LIFO store of presented navigation entries.
//!
//! The stack has no synchronization of its own. [`crate::NavigationService`] is its only writer
//! and serializes every mutation through its episode gate.

use sheet_contract::{EntryId, NavigationError};

use crate::model::{NavigationEntry, StackSnapshot};

#[derive(Debug, Default)]
/// Presented entries, bottom first.
pub struct NavigationStack {
    entries: Vec<NavigationEntry>,
}

impl NavigationStack {
    /// Creates an empty stack.
    pub fn new() -> Self {
        Self::default()
    }

    /// Pushes a new top entry.
    pub fn push(&mut self, entry: NavigationEntry) {
        self.entries.push(entry);
    }

    /// Removes and returns the top entry.
    ///
    /// # Errors
    ///
    /// Returns [`NavigationError::EmptyStack`] when nothing is presented.
    pub fn pop(&mut self) -> Result<NavigationEntry, NavigationError> {
        self.entries.pop().ok_or(NavigationError::EmptyStack)
    }

    /// Removes the top entry only when it is `id`.
    pub fn pop_top(&mut self, id: EntryId) -> Option<NavigationEntry> {
        if self.is_top(id) {
            self.entries.pop()
        } else {
            None
        }
    }

    /// Top entry.
    ///
    /// # Errors
    ///
    /// Returns [`NavigationError::EmptyStack`] when nothing is presented.
    pub fn current(&self) -> Result<&NavigationEntry, NavigationError> {
        self.entries.last().ok_or(NavigationError::EmptyStack)
    }

    /// Mutable top entry.
    ///
    /// # Errors
    ///
    /// Returns [`NavigationError::EmptyStack`] when nothing is presented.
    pub fn current_mut(&mut self) -> Result<&mut NavigationEntry, NavigationError> {
        self.entries.last_mut().ok_or(NavigationError::EmptyStack)
    }

    /// Returns whether nothing is presented.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of presented entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Drops every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Entries from bottom to top.
    pub fn iter(&self) -> impl Iterator<Item = &NavigationEntry> {
        self.entries.iter()
    }

    /// Index of `id` counted from the bottom.
    pub fn position(&self, id: EntryId) -> Option<usize> {
        self.entries.iter().position(|entry| entry.id() == id)
    }

    /// Entry with `id`, wherever it sits.
    pub fn get(&self, id: EntryId) -> Option<&NavigationEntry> {
        self.entries.iter().find(|entry| entry.id() == id)
    }

    /// Mutable entry with `id`, wherever it sits.
    pub fn get_mut(&mut self, id: EntryId) -> Option<&mut NavigationEntry> {
        self.entries.iter_mut().find(|entry| entry.id() == id)
    }

    /// Returns whether `id` is the top entry.
    pub fn is_top(&self, id: EntryId) -> bool {
        self.entries.last().is_some_and(|entry| entry.id() == id)
    }

    /// Serializable view, bottom first.
    pub fn snapshot(&self) -> StackSnapshot {
        StackSnapshot {
            entries: self.entries.iter().map(NavigationEntry::snapshot).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use sheet_contract::{NavigationCapabilities, Sheet, SheetOptions, SheetState, SheetStates};

    use super::*;
    use crate::registry::ResolvedSheet;

    struct Blank;

    impl NavigationCapabilities for Blank {}
    impl Sheet for Blank {}

    fn entry(id: u64, options: SheetOptions) -> NavigationEntry {
        NavigationEntry::new(
            EntryId(id),
            ResolvedSheet {
                name: format!("sheet-{id}"),
                sheet: Rc::new(Blank),
                view_model: None,
                options,
            },
        )
        .expect("entry")
    }

    #[test]
    fn empty_stack_reports_discipline_errors() {
        let mut stack = NavigationStack::new();

        assert!(stack.is_empty());
        assert_eq!(stack.current().err(), Some(NavigationError::EmptyStack));
        assert_eq!(stack.pop().err(), Some(NavigationError::EmptyStack));
        assert!(!stack.is_top(EntryId(1)));
    }

    #[test]
    fn current_tracks_top_and_position_counts_from_bottom() {
        let mut stack = NavigationStack::new();
        stack.push(entry(1, SheetOptions::default()));
        stack.push(entry(2, SheetOptions::default()));

        assert_eq!(stack.current().expect("top").id(), EntryId(2));
        assert_eq!(stack.position(EntryId(1)), Some(0));
        assert!(stack.is_top(EntryId(2)));
        assert!(stack.get(EntryId(1)).is_some());
        assert!(stack.pop_top(EntryId(1)).is_none());
        assert_eq!(stack.len(), 2);

        stack
            .current_mut()
            .expect("top")
            .detents_mut()
            .select(SheetState::Large)
            .expect("select");
        assert_eq!(stack.current().expect("top").state(), SheetState::Large);

        stack.clear();
        assert_eq!(stack.len(), 0);
    }

    #[test]
    fn snapshot_lists_entries_bottom_first() {
        let mut stack = NavigationStack::new();
        stack.push(entry(1, SheetOptions::default()));
        stack.push(entry(
            2,
            SheetOptions {
                allowed_states: SheetStates::MEDIUM | SheetStates::LARGE,
                initial_state: Some(SheetState::Large),
                cancelable: false,
                has_handle: true,
            },
        ));

        let snapshot = stack.snapshot();

        assert_eq!(snapshot.names(), vec!["sheet-1", "sheet-2"]);
        assert_eq!(
            serde_json::to_value(&snapshot.entries[1]).expect("json"),
            serde_json::json!({
                "id": 2,
                "name": "sheet-2",
                "state": "large",
                "allowed_states": ["medium", "large"],
                "cancelable": false,
                "has_view_model": false,
            })
        );
    }

    #[test]
    fn empty_allowed_set_fails_fast() {
        let error = NavigationEntry::new(
            EntryId(9),
            ResolvedSheet {
                name: "broken".to_string(),
                sheet: Rc::new(Blank),
                view_model: None,
                options: SheetOptions {
                    allowed_states: SheetStates::empty(),
                    ..SheetOptions::default()
                },
            },
        )
        .err();

        assert_eq!(
            error,
            Some(sheet_contract::SheetStateError::EmptyAllowedStates)
        );
    }

    proptest! {
        #[test]
        fn pops_return_entries_in_reverse_push_order(count in 0usize..24) {
            let mut stack = NavigationStack::new();
            for id in 0..count as u64 {
                stack.push(entry(id, SheetOptions::default()));
            }

            let mut popped = Vec::new();
            while let Ok(top) = stack.pop() {
                popped.push(top.id().0);
            }

            let expected: Vec<u64> = (0..count as u64).rev().collect();
            prop_assert_eq!(popped, expected);
            prop_assert!(stack.is_empty());
        }
    }
}
