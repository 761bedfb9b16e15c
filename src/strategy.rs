use core::fmt::Debug;
use core::hash::BuildHasher;
use core::hash::Hash;

cfg_if::cfg_if! {
    if #[cfg(feature = "foldhash")] {
        /// The hasher builder used by [`DefaultStrategy`] when none is given.
        ///
        /// Fixed-seed foldhash, so that independently constructed sets agree
        /// on element hashes.
        pub type DefaultHashBuilder = foldhash::fast::FixedState;
    } else if #[cfg(feature = "std")] {
        /// The hasher builder used by [`DefaultStrategy`] when none is given.
        ///
        /// Unkeyed SipHash from `std`, so that independently constructed sets
        /// agree on element hashes.
        pub type DefaultHashBuilder =
            core::hash::BuildHasherDefault<std::collections::hash_map::DefaultHasher>;
    }
}

/// The equality capability a [`HashSet`](crate::HashSet) is built on.
///
/// Implementations must keep `hash` consistent with `equals`: two elements
/// that compare equal must produce the same hash, and an element's hash must
/// not change while it is stored in a set. `equals` must be reflexive,
/// symmetric and transitive.
///
/// A panic raised by either method is not caught; it unwinds through the
/// calling set operation.
pub trait EqualityStrategy<T> {
    /// Hashes `value`.
    fn hash(&self, value: &T) -> u64;

    /// Returns `true` if `a` and `b` denote the same set member.
    fn equals(&self, a: &T, b: &T) -> bool;
}

/// Strategy deferring to the element's own `Hash` and `Eq` implementations,
/// hashed through the hasher builder `B`.
#[derive(Clone, Copy, Default)]
pub struct DefaultStrategy<B> {
    hash_builder: B,
}

impl<B> DefaultStrategy<B> {
    /// Creates a strategy hashing through `hash_builder`.
    pub fn with_hasher(hash_builder: B) -> Self {
        Self { hash_builder }
    }

    /// Returns the strategy's hasher builder.
    pub fn hasher(&self) -> &B {
        &self.hash_builder
    }
}

impl<B> Debug for DefaultStrategy<B> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DefaultStrategy").finish_non_exhaustive()
    }
}

impl<T, B> EqualityStrategy<T> for DefaultStrategy<B>
where
    T: Hash + Eq,
    B: BuildHasher,
{
    #[inline]
    fn hash(&self, value: &T) -> u64 {
        self.hash_builder.hash_one(value)
    }

    #[inline]
    fn equals(&self, a: &T, b: &T) -> bool {
        a == b
    }
}

/// Strategy assembled from a hash closure and an equality closure.
///
/// # Examples
///
/// ```rust
/// use bucket_hash::FnStrategy;
/// use bucket_hash::HashSet;
///
/// let strategy = FnStrategy::new(
///     |s: &String| s.len() as u64,
///     |a: &String, b: &String| a.eq_ignore_ascii_case(b),
/// );
/// let mut set: HashSet<String, _> = HashSet::with_strategy(strategy);
/// assert!(set.insert("Hello".to_string()));
/// assert!(!set.insert("HELLO".to_string()));
/// assert_eq!(set.get(&"hello".to_string()).map(String::as_str), Some("Hello"));
/// ```
#[derive(Clone, Copy)]
pub struct FnStrategy<H, E> {
    hash: H,
    equals: E,
}

impl<H, E> FnStrategy<H, E> {
    /// Creates a strategy from `hash` and `equals`.
    pub fn new(hash: H, equals: E) -> Self {
        Self { hash, equals }
    }
}

impl<H, E> Debug for FnStrategy<H, E> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("FnStrategy").finish_non_exhaustive()
    }
}

impl<T, H, E> EqualityStrategy<T> for FnStrategy<H, E>
where
    H: Fn(&T) -> u64,
    E: Fn(&T, &T) -> bool,
{
    #[inline]
    fn hash(&self, value: &T) -> u64 {
        (self.hash)(value)
    }

    #[inline]
    fn equals(&self, a: &T, b: &T) -> bool {
        (self.equals)(a, b)
    }
}
