//! Slot arena backing the mesh entity storage.
//!
//! Each entity kind lives in its own [`Arena`]. Elements are stored in slots
//! that never move, so a slot index is a stable handle for as long as the
//! element is alive. Live elements are threaded on an intrusive doubly-linked
//! list (in allocation order), which gives O(1) append and O(1) unlink from any
//! position.
//!
//! Removal comes in two flavours:
//!
//! - [`Arena::free`] unlinks the element and vacates its slot immediately.
//! - [`Arena::defer_free`] unlinks the element but keeps it readable on a
//!   singly-linked pending list until [`Arena::reclaim`] is called. Code that
//!   iterates a snapshot of handles collected before a mutation can keep
//!   dereferencing them safely in between.
//!
//! Vacated slots are reused by later allocations.

use std::ops::{Index, IndexMut};

#[derive(Debug, Clone)]
enum SlotState<T> {
    Vacant,
    Live(T),
    Pending(T),
}

#[derive(Debug, Clone)]
struct Slot<T> {
    state: SlotState<T>,
    /// Previous live slot. Unused while pending.
    prev: Option<usize>,
    /// Next live slot, or next pending slot while pending.
    next: Option<usize>,
}

/// Arena of stable slots with an intrusive live list and a pending-removal list.
#[derive(Debug, Clone)]
pub struct Arena<T> {
    slots: Vec<Slot<T>>,
    first: Option<usize>,
    last: Option<usize>,
    len: usize,
    pending: Option<usize>,
    pending_len: usize,
    vacant: Vec<usize>,
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Arena<T> {
    /// Create an empty arena.
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Create an empty arena with room for `capacity` slots.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            first: None,
            last: None,
            len: 0,
            pending: None,
            pending_len: 0,
            vacant: Vec::new(),
        }
    }

    /// Number of live elements.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the arena has no live elements.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of elements waiting on the pending list.
    #[inline]
    pub fn pending_len(&self) -> usize {
        self.pending_len
    }

    /// First live slot in allocation order.
    #[inline]
    pub fn first(&self) -> Option<usize> {
        self.first
    }

    /// Last live slot in allocation order.
    #[inline]
    pub fn last(&self) -> Option<usize> {
        self.last
    }

    /// The live slot after `index`, or `None` at the tail or for non-live slots.
    #[inline]
    pub fn next_of(&self, index: usize) -> Option<usize> {
        if self.contains(index) {
            self.slots[index].next
        } else {
            None
        }
    }

    /// The live slot before `index`, or `None` at the head or for non-live slots.
    #[inline]
    pub fn prev_of(&self, index: usize) -> Option<usize> {
        if self.contains(index) {
            self.slots[index].prev
        } else {
            None
        }
    }

    /// Whether `index` holds a live element.
    #[inline]
    pub fn contains(&self, index: usize) -> bool {
        matches!(
            self.slots.get(index).map(|s| &s.state),
            Some(SlotState::Live(_))
        )
    }

    /// Whether `index` holds an element waiting for reclamation.
    #[inline]
    pub fn is_pending(&self, index: usize) -> bool {
        matches!(
            self.slots.get(index).map(|s| &s.state),
            Some(SlotState::Pending(_))
        )
    }

    /// Borrow a live or pending element.
    #[inline]
    pub fn get(&self, index: usize) -> Option<&T> {
        match self.slots.get(index).map(|s| &s.state) {
            Some(SlotState::Live(value)) | Some(SlotState::Pending(value)) => Some(value),
            _ => None,
        }
    }

    /// Mutably borrow a live or pending element.
    #[inline]
    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        match self.slots.get_mut(index).map(|s| &mut s.state) {
            Some(SlotState::Live(value)) | Some(SlotState::Pending(value)) => Some(value),
            _ => None,
        }
    }

    /// Append `value` to the tail of the live list and return its slot.
    pub fn alloc(&mut self, value: T) -> usize {
        let slot = Slot {
            state: SlotState::Live(value),
            prev: self.last,
            next: None,
        };
        let index = match self.vacant.pop() {
            Some(index) => {
                self.slots[index] = slot;
                index
            }
            None => {
                self.slots.push(slot);
                self.slots.len() - 1
            }
        };
        match self.last {
            Some(last) => self.slots[last].next = Some(index),
            None => self.first = Some(index),
        }
        self.last = Some(index);
        self.len += 1;
        index
    }

    /// Detach a live slot from the live list, leaving it vacant.
    fn unlink(&mut self, index: usize) -> Option<T> {
        if !self.contains(index) {
            return None;
        }
        let slot = &mut self.slots[index];
        let prev = slot.prev.take();
        let next = slot.next.take();
        let value = match std::mem::replace(&mut slot.state, SlotState::Vacant) {
            SlotState::Live(value) => value,
            _ => unreachable!("slot {} checked live", index),
        };

        match prev {
            Some(p) => self.slots[p].next = next,
            None => self.first = next,
        }
        match next {
            Some(n) => self.slots[n].prev = prev,
            None => self.last = prev,
        }
        self.len -= 1;
        Some(value)
    }

    /// Remove a live element immediately, returning it.
    ///
    /// Returns `None` (and changes nothing) if `index` is not live.
    pub fn free(&mut self, index: usize) -> Option<T> {
        let value = self.unlink(index)?;
        self.vacant.push(index);
        Some(value)
    }

    /// Unlink a live element but keep it readable until [`Arena::reclaim`].
    ///
    /// Returns `false` (and changes nothing) if `index` is not live.
    pub fn defer_free(&mut self, index: usize) -> bool {
        let Some(value) = self.unlink(index) else {
            return false;
        };
        let slot = &mut self.slots[index];
        slot.state = SlotState::Pending(value);
        slot.next = self.pending;
        self.pending = Some(index);
        self.pending_len += 1;
        true
    }

    /// Release every pending element. Returns how many were released.
    pub fn reclaim(&mut self) -> usize {
        let mut released = 0;
        let mut cursor = self.pending.take();
        while let Some(index) = cursor {
            let slot = &mut self.slots[index];
            cursor = slot.next.take();
            slot.state = SlotState::Vacant;
            self.vacant.push(index);
            released += 1;
        }
        self.pending_len = 0;
        released
    }

    /// Iterate live slot indices in list order.
    pub fn indices(&self) -> Indices<'_, T> {
        Indices {
            arena: self,
            cursor: self.first,
        }
    }

    /// Iterate live elements with their slot indices in list order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &T)> + '_ {
        self.indices().map(move |i| (i, &self[i]))
    }
}

impl<T> Index<usize> for Arena<T> {
    type Output = T;

    fn index(&self, index: usize) -> &T {
        match self.get(index) {
            Some(value) => value,
            None => panic!("arena slot {} is vacant", index),
        }
    }
}

impl<T> IndexMut<usize> for Arena<T> {
    fn index_mut(&mut self, index: usize) -> &mut T {
        match self.get_mut(index) {
            Some(value) => value,
            None => panic!("arena slot {} is vacant", index),
        }
    }
}

/// Iterator over live slot indices, following the intrusive list.
pub struct Indices<'a, T> {
    arena: &'a Arena<T>,
    cursor: Option<usize>,
}

impl<T> Iterator for Indices<'_, T> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        let index = self.cursor?;
        self.cursor = self.arena.slots[index].next;
        Some(index)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.arena.len))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(arena: &Arena<&'static str>) -> Vec<&'static str> {
        arena.iter().map(|(_, v)| *v).collect()
    }

    #[test]
    fn test_alloc_appends_in_order() {
        let mut arena = Arena::new();
        let a = arena.alloc("a");
        let b = arena.alloc("b");
        let c = arena.alloc("c");

        assert_eq!(arena.len(), 3);
        assert_eq!(arena.first(), Some(a));
        assert_eq!(arena.last(), Some(c));
        assert_eq!(arena.next_of(a), Some(b));
        assert_eq!(arena.prev_of(c), Some(b));
        assert_eq!(collect(&arena), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_free_patches_neighbours() {
        let mut arena = Arena::new();
        let a = arena.alloc("a");
        let b = arena.alloc("b");
        let c = arena.alloc("c");

        assert_eq!(arena.free(b), Some("b"));
        assert_eq!(arena.len(), 2);
        assert_eq!(arena.next_of(a), Some(c));
        assert_eq!(arena.prev_of(c), Some(a));
        assert_eq!(collect(&arena), vec!["a", "c"]);

        assert_eq!(arena.free(a), Some("a"));
        assert_eq!(arena.first(), Some(c));
        assert_eq!(arena.free(c), Some("c"));
        assert_eq!(arena.first(), None);
        assert_eq!(arena.last(), None);
        assert!(arena.is_empty());
    }

    #[test]
    fn test_free_rejects_dead_slots() {
        let mut arena = Arena::new();
        let a = arena.alloc(1);
        assert_eq!(arena.free(a), Some(1));
        assert_eq!(arena.free(a), None);
        assert_eq!(arena.free(99), None);
        assert!(!arena.defer_free(a));
    }

    #[test]
    fn test_deferred_free_keeps_element_readable() {
        let mut arena = Arena::new();
        let a = arena.alloc("a");
        let b = arena.alloc("b");

        assert!(arena.defer_free(a));
        assert_eq!(arena.len(), 1);
        assert_eq!(arena.pending_len(), 1);
        assert!(!arena.contains(a));
        assert!(arena.is_pending(a));
        assert_eq!(arena.get(a), Some(&"a"));
        assert_eq!(arena[a], "a");
        assert_eq!(arena.first(), Some(b));

        assert_eq!(arena.reclaim(), 1);
        assert_eq!(arena.pending_len(), 0);
        assert_eq!(arena.get(a), None);
        assert!(!arena.is_pending(a));
    }

    #[test]
    fn test_vacant_slots_are_reused() {
        let mut arena = Arena::new();
        let a = arena.alloc(1);
        let _b = arena.alloc(2);
        arena.defer_free(a);

        // Pending slots are not handed out again before reclamation.
        let c = arena.alloc(3);
        assert_ne!(c, a);

        arena.reclaim();
        let d = arena.alloc(4);
        assert_eq!(d, a);
        assert_eq!(arena.iter().map(|(_, v)| *v).collect::<Vec<_>>(), vec![2, 3, 4]);
    }

    #[test]
    #[should_panic(expected = "vacant")]
    fn test_index_vacant_panics() {
        let mut arena = Arena::new();
        let a = arena.alloc(1);
        arena.free(a);
        let value = arena[a];
        assert_eq!(value, 1);
    }
}
