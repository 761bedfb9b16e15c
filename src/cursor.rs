use alloc::vec::Vec;

use crate::error::CursorError;
use crate::hash_set::HashSet;
use crate::strategy::EqualityStrategy;

/// A single-pass cursor over a snapshot of a [`HashSet`].
///
/// The snapshot is taken when the cursor is created by
/// [`HashSet::cursor`]; later changes to the set are not observed. The
/// cursor does not borrow the set, so the element it most recently produced
/// can be removed from the live set with [`Cursor::remove_current`].
///
/// # Examples
///
/// ```rust
/// # #[cfg(any(feature = "std", feature = "foldhash"))]
/// # {
/// use bucket_hash::HashSet;
///
/// let mut set: HashSet<i32> = (0..10).collect();
/// let mut cursor = set.cursor();
/// while let Ok(&value) = cursor.advance() {
///     if value % 2 == 1 {
///         cursor.remove_current(&mut set).unwrap();
///     }
/// }
/// assert_eq!(set.len(), 5);
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct Cursor<T> {
    snapshot: Vec<T>,
    next_index: usize,
    removed: bool,
}

impl<T> Cursor<T> {
    pub(crate) fn new(snapshot: Vec<T>) -> Self {
        Cursor {
            snapshot,
            next_index: 0,
            removed: true,
        }
    }

    /// Returns `true` if [`advance`](Self::advance) would produce an element.
    pub fn has_next(&self) -> bool {
        self.next_index < self.snapshot.len()
    }

    /// Returns the number of elements not yet produced.
    pub fn remaining(&self) -> usize {
        self.snapshot.len() - self.next_index
    }

    /// Produces the next element of the snapshot.
    ///
    /// Fails with [`CursorError::Exhausted`] once every element has been
    /// produced.
    pub fn advance(&mut self) -> Result<&T, CursorError> {
        if !self.has_next() {
            return Err(CursorError::Exhausted);
        }

        self.removed = false;
        self.next_index += 1;
        Ok(&self.snapshot[self.next_index - 1])
    }

    /// Returns the element most recently produced, if any.
    pub fn current(&self) -> Option<&T> {
        self.next_index
            .checked_sub(1)
            .map(|index| &self.snapshot[index])
    }

    /// Removes the element most recently produced from `set`.
    ///
    /// Returns whether `set` still contained it. Fails with
    /// [`CursorError::InvalidState`], leaving `set` untouched, if nothing has
    /// been produced yet or the current element was already removed.
    pub fn remove_current<S>(&mut self, set: &mut HashSet<T, S>) -> Result<bool, CursorError>
    where
        S: EqualityStrategy<T>,
    {
        if self.removed {
            return Err(CursorError::InvalidState);
        }

        let removed = set.remove(&self.snapshot[self.next_index - 1]);
        self.removed = true;
        Ok(removed)
    }
}

impl<T: Clone> Iterator for Cursor<T> {
    type Item = T;

    fn next(&mut self) -> Option<Self::Item> {
        self.advance().ok().cloned()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining(), Some(self.remaining()))
    }
}

impl<T: Clone> ExactSizeIterator for Cursor<T> {}
