use alloc::string::String;
use alloc::string::ToString;
use alloc::vec::Vec;
use core::fmt::Debug;
use core::fmt::Display;
use core::hash::Hash;
use core::hash::Hasher;
use core::iter::FusedIterator;

use crate::bucket_table::BucketTable;
use crate::bucket_table::DEFAULT_BUCKET_CAPACITY;
use crate::bucket_table::DEFAULT_CAPACITY;
use crate::cursor::Cursor;
use crate::strategy::EqualityStrategy;
#[cfg(any(feature = "foldhash", feature = "std"))]
use crate::strategy::DefaultHashBuilder;
#[cfg(any(feature = "foldhash", feature = "std"))]
use crate::strategy::DefaultStrategy;

/// Murmur3's 64-bit finalizer.
#[inline(always)]
fn fmix64(mut k: u64) -> u64 {
    k ^= k >> 33;
    k = k.wrapping_mul(0xff51_afd7_ed55_8ccd);
    k ^= k >> 33;
    k = k.wrapping_mul(0xc4ce_b9fe_1a85_ec53);
    k ^= k >> 33;
    k
}

cfg_if::cfg_if! {
    if #[cfg(any(feature = "foldhash", feature = "std"))] {
        /// An unordered set stored in a [`BucketTable`].
        ///
        /// `HashSet<T, S>` hashes and compares its elements through the
        /// [`EqualityStrategy`] `S`, which is fixed for the lifetime of the set.
        /// The default strategy defers to `T`'s own `Hash` and `Eq`.
        ///
        /// Inserting an element equal to one already stored keeps the stored
        /// element; [`get_or_add`](Self::get_or_add) and [`get`](Self::get)
        /// always hand back that canonical instance.
        ///
        /// # Performance Characteristics
        ///
        /// - **Memory**: one `Option` of a bucket header per table slot, plus
        ///   unused bucket slots.
        /// - **Lookup**: a linear scan of one bucket.
        #[derive(Clone)]
        pub struct HashSet<T, S = DefaultStrategy<DefaultHashBuilder>> {
            table: BucketTable<T>,
            strategy: S,
        }
    } else {
        /// An unordered set stored in a [`BucketTable`].
        ///
        /// `HashSet<T, S>` hashes and compares its elements through the
        /// [`EqualityStrategy`] `S`, which is fixed for the lifetime of the set.
        ///
        /// Inserting an element equal to one already stored keeps the stored
        /// element; [`get_or_add`](Self::get_or_add) and [`get`](Self::get)
        /// always hand back that canonical instance.
        #[derive(Clone)]
        pub struct HashSet<T, S> {
            table: BucketTable<T>,
            strategy: S,
        }
    }
}

/// Two sets are equal when they hold the same number of elements and each
/// contains every element of the other.
impl<T, S> PartialEq for HashSet<T, S>
where
    S: EqualityStrategy<T>,
{
    fn eq(&self, other: &Self) -> bool {
        if self.len() != other.len() {
            return false;
        }
        self.contains_all(other) && other.contains_all(self)
    }
}

impl<T, S> Eq for HashSet<T, S> where S: EqualityStrategy<T> {}

/// Writes [`HashSet::set_hash`], which does not depend on iteration order.
impl<T, S> Hash for HashSet<T, S>
where
    S: EqualityStrategy<T>,
{
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.set_hash());
    }
}

impl<T, S> Debug for HashSet<T, S>
where
    T: Debug,
    S: EqualityStrategy<T>,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<T, S> Display for HashSet<T, S>
where
    T: Display,
    S: EqualityStrategy<T>,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("{")?;
        for (i, value) in self.iter().enumerate() {
            if i != 0 {
                f.write_str(", ")?;
            }
            write!(f, "{value}")?;
        }
        f.write_str("}")
    }
}

impl<T, S> HashSet<T, S>
where
    S: EqualityStrategy<T>,
{
    /// Creates an empty set using `strategy`, with the default table
    /// capacity (16) and bucket length (8).
    ///
    /// # Examples
    ///
    /// ```rust
    /// use bucket_hash::FnStrategy;
    /// use bucket_hash::HashSet;
    ///
    /// let set: HashSet<u32, _> = HashSet::with_strategy(FnStrategy::new(
    ///     |v: &u32| *v as u64,
    ///     |a: &u32, b: &u32| a == b,
    /// ));
    /// assert!(set.is_empty());
    /// assert_eq!(set.capacity(), 16);
    /// ```
    pub fn with_strategy(strategy: S) -> Self {
        Self::with_capacity_and_strategy(DEFAULT_CAPACITY, DEFAULT_BUCKET_CAPACITY, strategy)
    }

    /// Creates an empty set with `capacity` table slots (rounded up to a
    /// power of two) and buckets starting at `bucket_capacity` elements.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(any(feature = "std", feature = "foldhash"))]
    /// # {
    /// use bucket_hash::DefaultStrategy;
    /// use bucket_hash::HashSet;
    ///
    /// let set: HashSet<i32> =
    ///     HashSet::with_capacity_and_strategy(100, 4, DefaultStrategy::default());
    /// assert_eq!(set.capacity(), 128);
    /// assert_eq!(set.threshold(), 96);
    /// assert_eq!(set.bucket_capacity(), 4);
    /// # }
    /// ```
    pub fn with_capacity_and_strategy(capacity: usize, bucket_capacity: usize, strategy: S) -> Self {
        Self {
            table: BucketTable::with_capacity(capacity, bucket_capacity),
            strategy,
        }
    }

    /// Returns the number of elements in the set.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(any(feature = "std", feature = "foldhash"))]
    /// # {
    /// use bucket_hash::HashSet;
    ///
    /// let mut set: HashSet<i32> = HashSet::new();
    /// assert_eq!(set.len(), 0);
    /// set.insert(1);
    /// assert_eq!(set.len(), 1);
    /// # }
    /// ```
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Returns `true` if the set contains no elements.
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Returns the number of table slots. Always a power of two.
    pub fn capacity(&self) -> usize {
        self.table.capacity()
    }

    /// Returns the element count at which the next insert grows the table:
    /// three quarters of [`capacity`](Self::capacity).
    pub fn threshold(&self) -> usize {
        self.table.threshold()
    }

    /// Returns the length a bucket is allocated with.
    pub fn bucket_capacity(&self) -> usize {
        self.table.bucket_capacity()
    }

    /// Returns the set's equality strategy.
    pub fn strategy(&self) -> &S {
        &self.strategy
    }

    /// Removes all elements and restores the table capacity the set was
    /// created with.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(any(feature = "std", feature = "foldhash"))]
    /// # {
    /// use bucket_hash::HashSet;
    ///
    /// let mut set: HashSet<i32> = (0..100).collect();
    /// assert!(set.capacity() > 16);
    /// set.clear();
    /// assert!(set.is_empty());
    /// assert_eq!(set.capacity(), 16);
    /// # }
    /// ```
    pub fn clear(&mut self) {
        self.table.clear();
    }

    fn get_or_insert(&mut self, value: T) -> (&T, bool) {
        let hash = self.strategy.hash(&value);
        let strategy = &self.strategy;
        self.table.get_or_insert(
            hash,
            value,
            |stored, value| strategy.equals(stored, value),
            |v| strategy.hash(v),
        )
    }

    /// Adds `value` if no equal element is stored, and returns the stored
    /// element.
    ///
    /// When an equal element already exists it is returned and `value` is
    /// dropped, so repeated calls canonicalize equal values to the first one
    /// added.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use bucket_hash::FnStrategy;
    /// use bucket_hash::HashSet;
    ///
    /// let mut set: HashSet<String, _> = HashSet::with_strategy(FnStrategy::new(
    ///     |s: &String| s.len() as u64,
    ///     |a: &String, b: &String| a.eq_ignore_ascii_case(b),
    /// ));
    /// assert_eq!(set.get_or_add("Rust".to_string()), "Rust");
    /// assert_eq!(set.get_or_add("RUST".to_string()), "Rust");
    /// assert_eq!(set.len(), 1);
    /// ```
    pub fn get_or_add(&mut self, value: T) -> &T {
        self.get_or_insert(value).0
    }

    /// Adds a value to the set.
    ///
    /// Returns whether the value was newly inserted. That is:
    ///
    /// - If the set did not previously contain an equal value, `true` is
    ///   returned.
    /// - If the set already contained an equal value, `false` is returned and
    ///   the stored value is kept.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(any(feature = "std", feature = "foldhash"))]
    /// # {
    /// use bucket_hash::HashSet;
    ///
    /// let mut set: HashSet<i32> = HashSet::new();
    /// assert_eq!(set.insert(37), true);
    /// assert_eq!(set.insert(37), false);
    /// assert_eq!(set.len(), 1);
    /// # }
    /// ```
    pub fn insert(&mut self, value: T) -> bool {
        self.get_or_insert(value).1
    }

    /// Returns a reference to the stored element, if any, that is equal to
    /// `value`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(any(feature = "std", feature = "foldhash"))]
    /// # {
    /// use bucket_hash::HashSet;
    ///
    /// let mut set: HashSet<i32> = HashSet::new();
    /// set.insert(1);
    /// assert_eq!(set.get(&1), Some(&1));
    /// assert_eq!(set.get(&2), None);
    /// # }
    /// ```
    pub fn get(&self, value: &T) -> Option<&T> {
        let hash = self.strategy.hash(value);
        self.table
            .find(hash, |stored| self.strategy.equals(stored, value))
    }

    /// Returns `true` if the set contains an element equal to `value`.
    pub fn contains(&self, value: &T) -> bool {
        self.get(value).is_some()
    }

    /// Removes the element equal to `value`. Returns whether one was
    /// present.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(any(feature = "std", feature = "foldhash"))]
    /// # {
    /// use bucket_hash::HashSet;
    ///
    /// let mut set: HashSet<i32> = HashSet::new();
    /// set.insert(1);
    /// assert_eq!(set.remove(&1), true);
    /// assert_eq!(set.remove(&1), false);
    /// # }
    /// ```
    pub fn remove(&mut self, value: &T) -> bool {
        self.take(value).is_some()
    }

    /// Removes and returns the stored element, if any, that is equal to
    /// `value`.
    pub fn take(&mut self, value: &T) -> Option<T> {
        let hash = self.strategy.hash(value);
        let strategy = &self.strategy;
        self.table
            .remove(hash, |stored| strategy.equals(stored, value))
    }

    /// Returns `true` if every element produced by `values` is in the set.
    /// Stops at the first missing element.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(any(feature = "std", feature = "foldhash"))]
    /// # {
    /// use bucket_hash::HashSet;
    ///
    /// let set: HashSet<i32> = (0..10).collect();
    /// assert!(set.contains_all(&[1, 5, 9]));
    /// assert!(!set.contains_all(&[1, 50]));
    /// # }
    /// ```
    pub fn contains_all<'a, I>(&self, values: I) -> bool
    where
        I: IntoIterator<Item = &'a T>,
        T: 'a,
    {
        values.into_iter().all(|v| self.contains(v))
    }

    /// Adds every element of `values`. Returns `true` if at least one of them
    /// was newly inserted.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(any(feature = "std", feature = "foldhash"))]
    /// # {
    /// use bucket_hash::HashSet;
    ///
    /// let mut set: HashSet<i32> = HashSet::new();
    /// assert!(set.add_all([1, 2, 3]));
    /// assert!(!set.add_all([1, 2]));
    /// assert!(set.add_all([3, 4]));
    /// assert_eq!(set.len(), 4);
    /// # }
    /// ```
    pub fn add_all<I>(&mut self, values: I) -> bool
    where
        I: IntoIterator<Item = T>,
    {
        let mut changed = false;
        for value in values {
            changed |= self.insert(value);
        }
        changed
    }

    /// Retains only the elements for which `f` returns `true`. Returns
    /// whether any element was removed.
    ///
    /// The elements are visited in table order.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(any(feature = "std", feature = "foldhash"))]
    /// # {
    /// use bucket_hash::HashSet;
    ///
    /// let mut set: HashSet<i32> = (1..=4).collect();
    /// assert!(set.retain(|&x| x % 2 == 0));
    /// assert_eq!(set.len(), 2);
    /// assert!(set.contains(&2));
    /// assert!(set.contains(&4));
    /// # }
    /// ```
    pub fn retain(&mut self, f: impl FnMut(&T) -> bool) -> bool {
        self.table.retain(f)
    }

    /// Retains only the elements also contained in `other`. Returns whether
    /// any element was removed.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(any(feature = "std", feature = "foldhash"))]
    /// # {
    /// use bucket_hash::HashSet;
    ///
    /// let mut set: HashSet<&str> = ["x"].into_iter().collect();
    /// let keep: HashSet<&str> = ["x", "y"].into_iter().collect();
    /// assert!(!set.retain_all(&keep));
    /// assert_eq!(set.len(), 1);
    /// # }
    /// ```
    pub fn retain_all<S2>(&mut self, other: &HashSet<T, S2>) -> bool
    where
        S2: EqualityStrategy<T>,
    {
        self.retain(|v| other.contains(v))
    }

    /// Removes every element equal to one produced by `values`. Returns
    /// `true` if anything was removed.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(any(feature = "std", feature = "foldhash"))]
    /// # {
    /// use bucket_hash::HashSet;
    ///
    /// let mut set: HashSet<i32> = (0..5).collect();
    /// assert!(set.remove_all(&[0, 1, 10]));
    /// assert!(!set.remove_all(&[0, 10]));
    /// assert_eq!(set.len(), 3);
    /// # }
    /// ```
    pub fn remove_all<'a, I>(&mut self, values: I) -> bool
    where
        I: IntoIterator<Item = &'a T>,
        T: 'a,
    {
        let mut changed = false;
        for value in values {
            changed |= self.remove(value);
        }
        changed
    }

    /// Returns an iterator over the elements of the set, bucket by bucket.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(any(feature = "std", feature = "foldhash"))]
    /// # {
    /// use bucket_hash::HashSet;
    ///
    /// let set: HashSet<i32> = [1, 2].into_iter().collect();
    /// for value in set.iter() {
    ///     println!("Value: {}", value);
    /// }
    /// assert_eq!(set.iter().len(), 2);
    /// # }
    /// ```
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            inner: self.table.iter(),
        }
    }

    /// Copies the elements into a `Vec`, in table order.
    pub fn to_vec(&self) -> Vec<T>
    where
        T: Clone,
    {
        self.iter().cloned().collect()
    }

    /// Returns a [`Cursor`] over a snapshot of the current elements.
    ///
    /// Unlike [`iter`](Self::iter), the cursor does not borrow the set, so
    /// the set can be modified while walking it, including through
    /// [`Cursor::remove_current`].
    pub fn cursor(&self) -> Cursor<T>
    where
        T: Clone,
    {
        Cursor::new(self.to_vec())
    }

    /// Renders the raw bucket layout, one line per table slot.
    ///
    /// An absent bucket prints as `null`; an allocated one prints its
    /// elements followed by `_` for each free slot.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use bucket_hash::FnStrategy;
    /// use bucket_hash::HashSet;
    ///
    /// let mut set: HashSet<u32, _> = HashSet::with_capacity_and_strategy(
    ///     4,
    ///     2,
    ///     FnStrategy::new(|v: &u32| *v as u64, |a: &u32, b: &u32| a == b),
    /// );
    /// set.insert(1);
    /// set.insert(5);
    /// assert_eq!(set.to_table_string(), "null\n[1 5]\nnull\nnull\n");
    /// ```
    pub fn to_table_string(&self) -> String
    where
        T: Display,
    {
        self.table.layout().to_string()
    }

    /// Returns a hash of the set's contents that does not depend on the
    /// order elements are stored or visited in.
    ///
    /// Element hashes come from the set's strategy, so sets compare equal
    /// hashes only when their strategies agree on element hashes.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(any(feature = "std", feature = "foldhash"))]
    /// # {
    /// use bucket_hash::HashSet;
    ///
    /// let a: HashSet<i32> = [1, 2, 3].into_iter().collect();
    /// let b: HashSet<i32> = [3, 1, 2].into_iter().collect();
    /// assert_eq!(a.set_hash(), b.set_hash());
    /// # }
    /// ```
    pub fn set_hash(&self) -> u64 {
        let combined = self.iter().fold(0u64, |acc, v| {
            acc.wrapping_add(fmix64(self.strategy.hash(v)))
        });
        fmix64(combined ^ self.len() as u64)
    }

    /// Returns `true` if the set has no elements in common with `other`.
    pub fn is_disjoint(&self, other: &HashSet<T, S>) -> bool {
        if self.len() <= other.len() {
            self.iter().all(|v| !other.contains(v))
        } else {
            other.iter().all(|v| !self.contains(v))
        }
    }

    /// Returns `true` if `other` contains every element of the set.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(any(feature = "std", feature = "foldhash"))]
    /// # {
    /// use bucket_hash::HashSet;
    ///
    /// let a: HashSet<i32> = [1, 2].into_iter().collect();
    /// let b: HashSet<i32> = [1, 2, 3].into_iter().collect();
    /// assert!(a.is_subset(&b));
    /// assert!(!b.is_subset(&a));
    /// # }
    /// ```
    pub fn is_subset(&self, other: &HashSet<T, S>) -> bool {
        if self.len() > other.len() {
            return false;
        }
        other.contains_all(self)
    }

    /// Returns `true` if the set contains every element of `other`.
    pub fn is_superset(&self, other: &HashSet<T, S>) -> bool {
        other.is_subset(self)
    }

    /// Returns an iterator over the elements in `self` or `other`, without
    /// duplicates.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(any(feature = "std", feature = "foldhash"))]
    /// # {
    /// use bucket_hash::HashSet;
    ///
    /// let a: HashSet<i32> = [1, 2].into_iter().collect();
    /// let b: HashSet<i32> = [2, 3].into_iter().collect();
    /// assert_eq!(a.union(&b).count(), 3);
    /// # }
    /// ```
    pub fn union<'a>(&'a self, other: &'a HashSet<T, S>) -> Union<'a, T, S> {
        Union {
            iter: self.iter(),
            other_iter: other.iter(),
            set: self,
        }
    }

    /// Returns an iterator over the elements in both `self` and `other`.
    pub fn intersection<'a>(&'a self, other: &'a HashSet<T, S>) -> Intersection<'a, T, S> {
        if self.len() <= other.len() {
            Intersection {
                iter: self.iter(),
                other,
            }
        } else {
            Intersection {
                iter: other.iter(),
                other: self,
            }
        }
    }

    /// Returns an iterator over the elements in `self` but not in `other`.
    pub fn difference<'a>(&'a self, other: &'a HashSet<T, S>) -> Difference<'a, T, S> {
        Difference {
            iter: self.iter(),
            other,
        }
    }

    /// Returns statistics about the underlying bucket table.
    #[cfg(any(test, feature = "stats"))]
    pub fn debug_stats(&self) -> crate::bucket_table::TableStats {
        self.table.debug_stats()
    }
}

impl<T, S> HashSet<T, S>
where
    S: EqualityStrategy<T> + Default,
{
    /// Creates an empty set using the default strategy.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(any(feature = "std", feature = "foldhash"))]
    /// # {
    /// use bucket_hash::HashSet;
    ///
    /// let set: HashSet<i32> = HashSet::new();
    /// assert!(set.is_empty());
    /// assert_eq!(set.capacity(), 16);
    /// assert_eq!(set.threshold(), 12);
    /// # }
    /// ```
    pub fn new() -> Self {
        Self::with_strategy(S::default())
    }

    /// Creates an empty set with at least `capacity` table slots using the
    /// default strategy.
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_and_strategy(capacity, DEFAULT_BUCKET_CAPACITY, S::default())
    }
}

impl<T, S> Default for HashSet<T, S>
where
    S: EqualityStrategy<T> + Default,
{
    fn default() -> Self {
        Self::new()
    }
}

/// An iterator over the elements of a `HashSet`.
pub struct Iter<'a, T> {
    inner: crate::bucket_table::Iter<'a, T>,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}

impl<T> FusedIterator for Iter<'_, T> {}

impl<T> Clone for Iter<'_, T> {
    fn clone(&self) -> Self {
        Iter {
            inner: self.inner.clone(),
        }
    }
}

/// A consuming iterator over the elements of a `HashSet`.
pub struct IntoIter<T> {
    inner: crate::bucket_table::IntoIter<T>,
}

impl<T> Iterator for IntoIter<T> {
    type Item = T;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<T> ExactSizeIterator for IntoIter<T> {}

impl<T> FusedIterator for IntoIter<T> {}

impl<T, S> IntoIterator for HashSet<T, S>
where
    S: EqualityStrategy<T>,
{
    type IntoIter = IntoIter<T>;
    type Item = T;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter {
            inner: self.table.into_iter(),
        }
    }
}

impl<'a, T, S> IntoIterator for &'a HashSet<T, S>
where
    S: EqualityStrategy<T>,
{
    type IntoIter = Iter<'a, T>;
    type Item = &'a T;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<T, S> FromIterator<T> for HashSet<T, S>
where
    S: EqualityStrategy<T> + Default,
{
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut set = HashSet::new();
        set.add_all(iter);
        set
    }
}

impl<T, S> Extend<T> for HashSet<T, S>
where
    S: EqualityStrategy<T>,
{
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        self.add_all(iter);
    }
}

/// An iterator over the union of two sets.
pub struct Union<'a, T, S> {
    iter: Iter<'a, T>,
    other_iter: Iter<'a, T>,
    set: &'a HashSet<T, S>,
}

impl<'a, T, S> Iterator for Union<'a, T, S>
where
    S: EqualityStrategy<T>,
{
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(v) = self.iter.next() {
            return Some(v);
        }
        loop {
            let v = self.other_iter.next()?;
            if !self.set.contains(v) {
                return Some(v);
            }
        }
    }
}

/// An iterator over the intersection of two sets.
pub struct Intersection<'a, T, S> {
    iter: Iter<'a, T>,
    other: &'a HashSet<T, S>,
}

impl<'a, T, S> Iterator for Intersection<'a, T, S>
where
    S: EqualityStrategy<T>,
{
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let v = self.iter.next()?;
            if self.other.contains(v) {
                return Some(v);
            }
        }
    }
}

/// An iterator over the difference of two sets.
pub struct Difference<'a, T, S> {
    iter: Iter<'a, T>,
    other: &'a HashSet<T, S>,
}

impl<'a, T, S> Iterator for Difference<'a, T, S>
where
    S: EqualityStrategy<T>,
{
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let v = self.iter.next()?;
            if !self.other.contains(v) {
                return Some(v);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use alloc::format;
    use alloc::string::String;
    use alloc::string::ToString;
    use alloc::vec;
    use alloc::vec::Vec;
    use core::hash::BuildHasher;

    use rand::SeedableRng;
    use rand::TryRngCore;
    use rand::rngs::OsRng;
    use rand::rngs::SmallRng;
    use rand::seq::SliceRandom;
    use siphasher::sip::SipHasher;

    use super::*;
    use crate::strategy::DefaultStrategy;
    use crate::strategy::FnStrategy;

    #[derive(Clone)]
    struct SipHashBuilder {
        k1: u64,
        k2: u64,
    }

    impl BuildHasher for SipHashBuilder {
        type Hasher = SipHasher;

        fn build_hasher(&self) -> Self::Hasher {
            SipHasher::new_with_keys(self.k1, self.k2)
        }
    }

    impl Default for SipHashBuilder {
        fn default() -> Self {
            Self {
                k1: OsRng.try_next_u64().unwrap_or(0),
                k2: OsRng.try_next_u64().unwrap_or(0),
            }
        }
    }

    type SipSet<T> = HashSet<T, DefaultStrategy<SipHashBuilder>>;

    /// A value whose identity is `key`; `tag` tells instances apart.
    #[derive(Clone, Debug)]
    struct Tagged {
        key: u32,
        tag: &'static str,
    }

    fn tagged_set() -> HashSet<Tagged, impl EqualityStrategy<Tagged> + Clone> {
        HashSet::with_strategy(FnStrategy::new(
            |t: &Tagged| t.key as u64,
            |a: &Tagged, b: &Tagged| a.key == b.key,
        ))
    }

    #[test]
    fn test_new_and_with_strategy() {
        let set: SipSet<i32> = HashSet::new();
        assert!(set.is_empty());
        assert_eq!(set.len(), 0);
        assert_eq!(set.capacity(), 16);
        assert_eq!(set.threshold(), 12);
        assert_eq!(set.bucket_capacity(), 8);

        let set2 =
            HashSet::<i32, _>::with_strategy(DefaultStrategy::with_hasher(SipHashBuilder::default()));
        assert!(set2.is_empty());
    }

    #[test]
    fn test_with_capacity() {
        let set: SipSet<i32> = HashSet::with_capacity(100);
        assert_eq!(set.capacity(), 128);
        assert!(set.is_empty());

        let set2 = HashSet::<i32, _>::with_capacity_and_strategy(
            200,
            2,
            DefaultStrategy::with_hasher(SipHashBuilder::default()),
        );
        assert_eq!(set2.capacity(), 256);
        assert_eq!(set2.bucket_capacity(), 2);
    }

    #[test]
    fn test_scenario_small_string_set() {
        let mut set: SipSet<&str> = HashSet::new();
        for s in ["a", "b", "c"] {
            assert!(set.insert(s));
        }

        assert_eq!(set.len(), 3);
        assert!(set.contains(&"b"));
        assert!(!set.contains(&"z"));
    }

    #[test]
    fn test_insert_is_idempotent() {
        let mut set: SipSet<i32> = HashSet::new();

        assert!(set.insert(1));
        assert_eq!(set.len(), 1);
        assert!(set.contains(&1));

        assert!(!set.insert(1));
        assert_eq!(set.len(), 1);
        assert!(set.contains(&1));
    }

    #[test]
    fn test_get_or_add_canonicalizes() {
        let mut set = tagged_set();

        let stored = set.get_or_add(Tagged { key: 7, tag: "original" });
        assert_eq!(stored.tag, "original");

        let stored = set.get_or_add(Tagged { key: 7, tag: "duplicate" });
        assert_eq!(stored.tag, "original");
        assert_eq!(set.len(), 1);

        let found = set.get(&Tagged { key: 7, tag: "probe" }).unwrap();
        assert_eq!(found.tag, "original");
        assert!(set.get(&Tagged { key: 8, tag: "probe" }).is_none());
    }

    #[test]
    fn test_growth_on_threshold() {
        let mut set: SipSet<u64> = HashSet::new();
        for i in 0..12u64 {
            set.insert(i);
        }
        assert_eq!(set.capacity(), 16);

        set.insert(12);
        assert_eq!(set.capacity(), 32);
        assert_eq!(set.threshold(), 24);
        assert_eq!(set.len(), 13);
        for i in 0..13u64 {
            assert!(set.contains(&i));
        }

        // A duplicate at the threshold still grows first.
        let mut set: SipSet<u64> = (0..12).collect();
        assert!(!set.insert(0));
        assert_eq!(set.capacity(), 32);
        assert_eq!(set.len(), 12);
    }

    #[test]
    fn test_remove() {
        let mut set: SipSet<i32> = HashSet::new();
        set.insert(1);
        set.insert(2);
        set.insert(3);

        assert!(set.remove(&2));
        assert_eq!(set.len(), 2);
        assert!(set.contains(&1));
        assert!(!set.contains(&2));
        assert!(set.contains(&3));

        assert!(!set.remove(&2));
        assert!(!set.remove(&4));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_take_returns_stored_element() {
        let mut set = tagged_set();
        set.insert(Tagged { key: 1, tag: "stored" });

        let taken = set.take(&Tagged { key: 1, tag: "probe" }).unwrap();
        assert_eq!(taken.tag, "stored");
        assert!(set.is_empty());
        assert!(set.take(&Tagged { key: 1, tag: "probe" }).is_none());
    }

    #[test]
    fn test_clear() {
        let mut set: SipSet<i32> = (0..100).collect();
        assert!(set.capacity() > 16);

        set.clear();
        assert!(set.is_empty());
        assert_eq!(set.capacity(), 16);
        assert_eq!(set.threshold(), 12);
        assert!(!set.contains(&1));

        set.insert(5);
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_contains_all() {
        let set: SipSet<i32> = (0..10).collect();
        assert!(set.contains_all(&[0, 3, 9]));
        assert!(!set.contains_all(&[0, 10]));
        assert!(set.contains_all(&[] as &[i32]));

        let subset: SipSet<i32> = (2..5).collect();
        assert!(set.contains_all(&subset));
        assert!(!subset.contains_all(&set));
    }

    #[test]
    fn test_add_all() {
        let mut set: SipSet<i32> = HashSet::new();
        assert!(set.add_all(vec![1, 2, 3]));
        assert!(!set.add_all(vec![3, 2]));
        assert!(!set.add_all(Vec::new()));
        assert!(set.add_all(vec![3, 4]));
        assert_eq!(set.len(), 4);
    }

    #[test]
    fn test_retain_all_keeps_shared_elements() {
        let mut set: SipSet<&str> = HashSet::new();
        set.insert("x");
        let keep: SipSet<&str> = ["x", "y"].into_iter().collect();

        assert!(!set.retain_all(&keep));
        assert_eq!(set.len(), 1);
        assert!(set.contains(&"x"));

        let mut set: SipSet<i32> = (0..50).collect();
        let evens: SipSet<i32> = (0..100).step_by(2).collect();
        assert!(set.retain_all(&evens));
        assert_eq!(set.len(), 25);
        assert_eq!(set.iter().count(), 25);
        for i in 0..50 {
            assert_eq!(set.contains(&i), i % 2 == 0);
        }
    }

    #[test]
    fn test_remove_all() {
        let mut set: SipSet<i32> = (0..10).collect();
        let other: SipSet<i32> = (5..15).collect();

        assert!(set.remove_all(&other));
        assert_eq!(set.len(), 5);
        assert!(!set.remove_all(&other));
        assert!(!set.remove_all(&[] as &[i32]));
        for i in 0..5 {
            assert!(set.contains(&i));
        }
    }

    #[test]
    fn test_set_equality_ignores_insertion_order() {
        let mut values: Vec<u32> = (0..200).collect();
        let a: HashSet<u32, DefaultStrategy<SipHashBuilder>> = {
            let strategy = DefaultStrategy::with_hasher(SipHashBuilder { k1: 1, k2: 2 });
            let mut set = HashSet::with_strategy(strategy);
            set.add_all(values.iter().copied());
            set
        };

        values.shuffle(&mut SmallRng::seed_from_u64(42));
        let mut b = HashSet::with_capacity_and_strategy(
            4,
            1,
            DefaultStrategy::with_hasher(SipHashBuilder { k1: 1, k2: 2 }),
        );
        b.add_all(values.iter().copied());

        assert_eq!(a, b);
        assert_eq!(a.set_hash(), b.set_hash());

        b.insert(1000);
        assert_ne!(a, b);
        assert_ne!(a.set_hash(), b.set_hash());

        b.remove(&1000);
        b.remove(&0);
        assert_ne!(a, b);
        assert_ne!(a.set_hash(), b.set_hash());
    }

    #[test]
    fn test_equality_requires_same_members() {
        let a: SipSet<i32> = [1, 2, 3].into_iter().collect();
        let b: SipSet<i32> = [1, 2, 4].into_iter().collect();
        let c: SipSet<i32> = [3, 2, 1].into_iter().collect();

        assert_ne!(a, b);
        assert_eq!(a, c);
        assert_eq!(SipSet::<i32>::new(), SipSet::<i32>::new());
    }

    #[test]
    fn test_hash_trait_uses_set_hash() {
        let strategy = DefaultStrategy::with_hasher(SipHashBuilder { k1: 9, k2: 9 });
        let mut a = HashSet::with_strategy(strategy.clone());
        let mut b = HashSet::with_strategy(strategy);
        a.add_all(["one", "two"]);
        b.add_all(["two", "one"]);

        let outer = SipHashBuilder { k1: 3, k2: 4 };
        assert_eq!(outer.hash_one(&a), outer.hash_one(&b));
    }

    #[test]
    fn test_display_and_debug() {
        let set: HashSet<u32, _> = HashSet::with_strategy(FnStrategy::new(
            |v: &u32| *v as u64,
            |a: &u32, b: &u32| a == b,
        ));
        assert_eq!(set.to_string(), "{}");
        assert_eq!(format!("{:?}", set), "{}");

        let mut set = set;
        set.insert(2);
        set.insert(1);
        // Table order follows the bucket index, not insertion order.
        assert_eq!(set.to_string(), "{1, 2}");
        assert_eq!(format!("{:?}", set), "{1, 2}");
    }

    #[test]
    fn test_table_string_shows_layout() {
        let mut set: HashSet<u32, _> = HashSet::with_capacity_and_strategy(
            4,
            2,
            FnStrategy::new(|v: &u32| *v as u64, |a: &u32, b: &u32| a == b),
        );
        assert_eq!(set.to_table_string(), "null\nnull\nnull\nnull\n");

        set.insert(2);
        set.insert(6);
        set.insert(10);
        assert_eq!(set.to_table_string(), "null\nnull\n[2 6 10 _]\nnull\n");

        set.remove(&6);
        assert_eq!(set.to_table_string(), "null\nnull\n[2 10 _ _]\nnull\n");
    }

    #[test]
    fn test_iter_and_into_iter() {
        let set: SipSet<i32> = (1..=3).collect();

        let mut values: Vec<i32> = set.iter().copied().collect();
        values.sort_unstable();
        assert_eq!(values, [1, 2, 3]);

        let mut values: Vec<i32> = (&set).into_iter().copied().collect();
        values.sort_unstable();
        assert_eq!(values, [1, 2, 3]);

        let mut owned: Vec<i32> = set.into_iter().collect();
        owned.sort_unstable();
        assert_eq!(owned, [1, 2, 3]);
    }

    #[test]
    fn test_to_vec_matches_iter() {
        let set: SipSet<i32> = (0..40).collect();
        let copied: Vec<i32> = set.iter().copied().collect();
        assert_eq!(set.to_vec(), copied);
    }

    #[test]
    fn test_cursor_remove_twice() {
        let mut set: SipSet<&str> = ["p", "q"].into_iter().collect();
        let mut cursor = set.cursor();

        let first = *cursor.advance().unwrap();
        assert!(first == "p" || first == "q");
        assert_eq!(cursor.remove_current(&mut set), Ok(true));
        assert_eq!(
            cursor.remove_current(&mut set),
            Err(crate::CursorError::InvalidState)
        );
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_collision_handling() {
        let mut set: HashSet<i32, _> = HashSet::with_strategy(FnStrategy::new(
            |_: &i32| 0u64,
            |a: &i32, b: &i32| a == b,
        ));

        for i in 0..100 {
            assert!(set.insert(i));
        }
        assert_eq!(set.len(), 100);

        for i in (0..100).step_by(2) {
            assert!(set.remove(&i));
        }
        assert_eq!(set.len(), 50);

        for i in 0..100 {
            assert_eq!(set.contains(&i), i % 2 == 1);
        }
        let stats = set.debug_stats();
        assert_eq!(stats.allocated_buckets, 1);
        assert_eq!(stats.longest_bucket, 50);
    }

    #[test]
    fn test_multiple_insertions() {
        let mut set: SipSet<i32> = HashSet::new();

        for i in 0..1000 {
            assert!(set.insert(i));
        }
        assert_eq!(set.len(), 1000);
        assert!(set.len() <= set.threshold());

        for i in 0..1000 {
            assert!(set.contains(&i));
        }
        for i in 0..1000 {
            assert!(!set.insert(i));
        }
        assert_eq!(set.len(), 1000);
    }

    #[test]
    fn test_string_values() {
        let mut set: SipSet<String> = HashSet::new();

        assert!(set.insert("hello".to_string()));
        assert!(set.insert("world".to_string()));
        assert!(set.insert("rust".to_string()));

        assert!(set.contains(&"hello".to_string()));
        assert!(!set.contains(&"missing".to_string()));
        assert_eq!(set.len(), 3);

        assert!(!set.insert("hello".to_string()));
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn test_insert_remove_cycle() {
        let mut set: SipSet<i32> = HashSet::new();

        for _ in 0..10 {
            for i in 0..50 {
                assert!(set.insert(i));
            }
            assert_eq!(set.len(), 50);

            for i in 0..50 {
                assert!(set.remove(&i));
            }
            assert!(set.is_empty());
        }
    }

    #[test]
    fn test_zero_is_a_valid_element() {
        let mut set: SipSet<Option<i32>> = HashSet::new();
        assert!(set.insert(None));
        assert!(set.insert(Some(0)));
        assert!(set.contains(&None));
        assert!(set.contains(&Some(0)));
        assert!(set.remove(&None));
        assert!(!set.contains(&None));
        assert_eq!(set.len(), 1);
    }

    #[test]
    #[should_panic(expected = "broken strategy")]
    fn test_strategy_panic_propagates() {
        let mut set: HashSet<i32, _> = HashSet::with_strategy(FnStrategy::new(
            |v: &i32| {
                if *v < 0 {
                    panic!("broken strategy");
                }
                *v as u64
            },
            |a: &i32, b: &i32| a == b,
        ));
        set.insert(1);
        set.insert(-1);
    }

    #[cfg(feature = "std")]
    #[test]
    fn test_retain_panic_keeps_len_consistent() {
        let mut set: HashSet<u32, _> = HashSet::with_strategy(FnStrategy::new(
            |v: &u32| *v as u64,
            |a: &u32, b: &u32| a == b,
        ));
        set.add_all(0..10);

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            set.retain(|v| {
                if *v == 9 {
                    panic!("predicate failed");
                }
                v % 2 == 0
            })
        }));
        assert!(result.is_err());

        assert_eq!(set.len(), set.iter().count());
        assert_eq!(set.iter().len(), set.len());
        assert_eq!(set.len(), 6);
        assert!(set.contains(&9));
        assert!(!set.contains(&1));
    }

    #[cfg(any(feature = "foldhash", feature = "std"))]
    #[test]
    fn test_default_strategy_sets_hash_equally() {
        let a: HashSet<i32> = (0..100).collect();
        let mut b: HashSet<i32> = HashSet::with_capacity(4);
        b.add_all((0..100).rev());

        assert_eq!(a, b);
        assert_eq!(a.set_hash(), b.set_hash());

        b.remove(&42);
        assert_ne!(a.set_hash(), b.set_hash());
    }

    #[test]
    fn test_is_disjoint() {
        let mut a: SipSet<i32> = [1, 2, 3].into_iter().collect();
        let b: SipSet<i32> = [4, 5, 6].into_iter().collect();

        assert!(a.is_disjoint(&b));
        assert!(b.is_disjoint(&a));

        a.insert(4);
        assert!(!a.is_disjoint(&b));
    }

    #[test]
    fn test_is_subset_and_superset() {
        let a: SipSet<i32> = [1, 2].into_iter().collect();
        let b: SipSet<i32> = [1, 2, 3].into_iter().collect();

        assert!(a.is_subset(&b));
        assert!(!b.is_subset(&a));
        assert!(a.is_subset(&a));
        assert!(b.is_superset(&a));
        assert!(!a.is_superset(&b));
    }

    #[test]
    fn test_union_intersection_difference() {
        let a: SipSet<i32> = [1, 2, 3].into_iter().collect();
        let b: SipSet<i32> = [3, 4, 5].into_iter().collect();

        let mut union: Vec<_> = a.union(&b).copied().collect();
        union.sort_unstable();
        assert_eq!(union, [1, 2, 3, 4, 5]);

        let intersection: Vec<_> = a.intersection(&b).copied().collect();
        assert_eq!(intersection, [3]);

        let mut difference: Vec<_> = a.difference(&b).copied().collect();
        difference.sort_unstable();
        assert_eq!(difference, [1, 2]);
    }

    #[test]
    fn test_extend_and_default() {
        let mut set: SipSet<i32> = HashSet::default();
        set.extend([1, 2, 2, 3]);
        assert_eq!(set.len(), 3);
    }
}
