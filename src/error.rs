use core::fmt;

/// Errors reported by a [`Cursor`](crate::Cursor).
///
/// Neither variant leaves the underlying set in an inconsistent state; the
/// failing call simply has no effect.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq)]
pub enum CursorError {
    /// Removal was requested before any element was produced, or twice
    /// without an intervening advance.
    InvalidState,
    /// The next element was requested but the snapshot is exhausted.
    Exhausted,
}

impl fmt::Display for CursorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CursorError::InvalidState => f.write_str("no current element to remove"),
            CursorError::Exhausted => f.write_str("cursor has no remaining elements"),
        }
    }
}

impl core::error::Error for CursorError {}
