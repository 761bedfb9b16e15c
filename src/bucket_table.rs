use alloc::vec::Vec;
use core::fmt::Debug;
use core::fmt::Display;
use core::iter::FusedIterator;

/// Number of table slots allocated by default. Must be a power of two.
pub const DEFAULT_CAPACITY: usize = 16;

/// Length a bucket starts at when it receives its first element.
pub const DEFAULT_BUCKET_CAPACITY: usize = 8;

#[inline(always)]
fn target_load_factor(capacity: usize) -> usize {
    ((capacity as u128 * 3) / 4) as usize
}

#[inline(always)]
fn empty_buckets<T>(capacity: usize) -> Vec<Option<Bucket<T>>> {
    let mut buckets = Vec::with_capacity(capacity);
    buckets.resize_with(capacity, || None);
    buckets
}

/// A dense run of elements sharing one table slot.
///
/// `slots` holds the occupied prefix; `length` is the bucket's logical
/// length, so `length - slots.len()` slots are free. Keeping the length
/// explicit (rather than using a sentinel) lets any `T` be stored.
#[derive(Clone)]
struct Bucket<T> {
    slots: Vec<T>,
    length: usize,
}

impl<T> Bucket<T> {
    fn with_length(length: usize) -> Self {
        Bucket {
            slots: Vec::with_capacity(length),
            length,
        }
    }

    #[inline(always)]
    fn is_full(&self) -> bool {
        self.slots.len() == self.length
    }

    /// Appends `value` after the occupied prefix, doubling the bucket first
    /// if no free slot remains.
    fn push(&mut self, value: T) {
        if self.is_full() {
            let length = self
                .length
                .checked_mul(2)
                .expect("bucket length overflow");
            log::trace!("doubling bucket from {} to {} slots", self.length, length);
            self.slots.reserve_exact(length - self.slots.len());
            self.length = length;
        }
        self.slots.push(value);
    }
}

/// Bucket-table statistics.
///
/// Only compiled with the `stats` feature (or in tests).
#[cfg(any(test, feature = "stats"))]
#[derive(Debug, Clone)]
pub struct TableStats {
    /// Number of elements currently in the table
    pub populated: usize,
    /// Number of table slots
    pub capacity: usize,
    /// Element count at which the next insert grows the table
    pub threshold: usize,
    /// Number of table slots with an allocated bucket
    pub allocated_buckets: usize,
    /// Sum of the lengths of all allocated buckets
    pub total_slots: usize,
    /// Occupied slots in the fullest bucket
    pub longest_bucket: usize,
    /// Load factor (populated / capacity)
    pub load_factor: f64,
    /// Slot utilization (populated / total_slots)
    pub slot_utilization: f64,
}

#[cfg(any(test, feature = "stats"))]
impl TableStats {
    /// Pretty-print the statistics.
    #[cfg(feature = "std")]
    pub fn print(&self) {
        println!("=== Bucket Table Statistics ===");
        println!(
            "Population: {}/{} ({:.2}% load factor, grows at {})",
            self.populated,
            self.capacity,
            self.load_factor * 100.0,
            self.threshold
        );
        println!(
            "Buckets: {} allocated, {} slots ({:.2}% utilization)",
            self.allocated_buckets,
            self.total_slots,
            self.slot_utilization * 100.0
        );
        println!("Longest bucket: {} elements", self.longest_bucket);
    }
}

/// A hash table of lazily allocated, independently growing buckets.
///
/// `BucketTable<T>` maps a hash to the slot `hash & (capacity - 1)`; every
/// slot is either absent or a bucket whose occupied slots form a contiguous
/// prefix. Collisions are resolved by a linear scan of that prefix. Like a
/// raw table, it has no notion of how elements are hashed or compared: the
/// caller supplies a hash and an equality predicate for each operation, and a
/// hasher for operations that may grow the table.
///
/// The table grows (doubling its capacity and redistributing every element)
/// when an insert finds the population at three quarters of the capacity.
///
/// ## Example
///
/// ```rust
/// # use core::hash::Hash;
/// # use core::hash::Hasher;
/// #
/// # use bucket_hash::BucketTable;
/// # use siphasher::sip::SipHasher;
/// #
/// # fn hash_word(word: &str) -> u64 {
/// #     let mut hasher = SipHasher::new();
/// #     word.hash(&mut hasher);
/// #     hasher.finish()
/// # }
///
/// let mut table: BucketTable<&str> = BucketTable::new();
///
/// let (stored, inserted) = table.get_or_insert(
///     hash_word("apple"),
///     "apple",
///     |a, b| a == b,
///     |w| hash_word(w),
/// );
/// assert_eq!((*stored, inserted), ("apple", true));
///
/// assert_eq!(table.find(hash_word("apple"), |w| *w == "apple"), Some(&"apple"));
/// assert_eq!(table.remove(hash_word("apple"), |w| *w == "apple"), Some("apple"));
/// assert!(table.is_empty());
/// ```
#[derive(Clone)]
pub struct BucketTable<T> {
    buckets: Vec<Option<Bucket<T>>>,

    populated: usize,
    threshold: usize,

    initial_capacity: usize,
    bucket_capacity: usize,
}

impl<T> Debug for BucketTable<T>
where
    T: Debug,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        struct Slot<'a, T>(&'a Option<Bucket<T>>);

        impl<T: Debug> Debug for Slot<'_, T> {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                match self.0 {
                    None => f.write_str("absent"),
                    Some(bucket) => {
                        let mut list = f.debug_list();
                        list.entries(bucket.slots.iter());
                        for _ in bucket.slots.len()..bucket.length {
                            list.entry(&format_args!("_"));
                        }
                        list.finish()
                    }
                }
            }
        }

        f.debug_struct("BucketTable")
            .field("populated", &self.populated)
            .field("capacity", &self.capacity())
            .field("threshold", &self.threshold)
            .field(
                "buckets",
                &self.buckets.iter().map(Slot).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl<T> Default for BucketTable<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> BucketTable<T> {
    /// Creates an empty table with the default capacity (16 slots) and
    /// default bucket length (8).
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY, DEFAULT_BUCKET_CAPACITY)
    }

    /// Creates an empty table with `capacity` slots, each bucket starting at
    /// `bucket_capacity` elements once allocated.
    ///
    /// `capacity` is rounded up to the next power of two; both arguments are
    /// raised to at least one.
    ///
    /// # Panics
    ///
    /// Panics if the rounded capacity overflows `usize`.
    pub fn with_capacity(capacity: usize, bucket_capacity: usize) -> Self {
        let capacity = capacity
            .max(1)
            .checked_next_power_of_two()
            .expect("capacity overflow");

        BucketTable {
            buckets: empty_buckets(capacity),
            populated: 0,
            threshold: target_load_factor(capacity),
            initial_capacity: capacity,
            bucket_capacity: bucket_capacity.max(1),
        }
    }

    /// Returns the number of elements in the table.
    #[inline]
    pub fn len(&self) -> usize {
        self.populated
    }

    /// Returns `true` if the table holds no elements.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.populated == 0
    }

    /// Returns the number of table slots. Always a power of two.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.buckets.len()
    }

    /// Returns the population at which the next insert grows the table.
    #[inline]
    pub fn threshold(&self) -> usize {
        self.threshold
    }

    /// Returns the length a bucket is allocated with.
    #[inline]
    pub fn bucket_capacity(&self) -> usize {
        self.bucket_capacity
    }

    #[inline(always)]
    fn bucket_index(&self, hash: u64) -> usize {
        hash as usize & (self.buckets.len() - 1)
    }

    /// Returns the stored element matching `eq` in the bucket for `hash`.
    pub fn find(&self, hash: u64, eq: impl Fn(&T) -> bool) -> Option<&T> {
        let bucket = self.buckets[self.bucket_index(hash)].as_ref()?;
        bucket.slots.iter().find(|&v| eq(v))
    }

    /// Returns the stored element equal to `value`, or stores `value` and
    /// returns it.
    ///
    /// `eq` is called as `eq(stored, &value)` against each occupied slot of
    /// the bucket for `hash`. The returned flag is `true` when `value` was
    /// inserted and `false` when an existing element was found, in which case
    /// `value` is dropped. `hasher` rehashes stored elements if the table has
    /// to grow first.
    pub fn get_or_insert(
        &mut self,
        hash: u64,
        value: T,
        eq: impl Fn(&T, &T) -> bool,
        hasher: impl Fn(&T) -> u64,
    ) -> (&T, bool) {
        if self.populated >= self.threshold {
            self.grow(hasher);
        }

        let index = self.bucket_index(hash);
        let bucket_capacity = self.bucket_capacity;
        let bucket =
            self.buckets[index].get_or_insert_with(|| Bucket::with_length(bucket_capacity));

        if let Some(existing) = bucket.slots.iter().position(|v| eq(v, &value)) {
            return (&bucket.slots[existing], false);
        }

        bucket.push(value);
        self.populated += 1;
        let last = bucket.slots.len() - 1;
        (&bucket.slots[last], true)
    }

    /// Removes and returns the element matching `eq` in the bucket for
    /// `hash`.
    ///
    /// Elements after the removed one shift down by a slot, so the bucket's
    /// occupied slots stay contiguous.
    pub fn remove(&mut self, hash: u64, eq: impl Fn(&T) -> bool) -> Option<T> {
        let index = self.bucket_index(hash);
        let bucket = self.buckets[index].as_mut()?;
        let position = bucket.slots.iter().position(eq)?;

        let value = bucket.slots.remove(position);
        self.populated -= 1;
        Some(value)
    }

    /// Keeps only the elements for which `f` returns `true`, compacting each
    /// bucket in a single pass. Returns `true` if any element was removed.
    ///
    /// If `f` panics, the elements already rejected stay removed and the
    /// element count is brought back in line before unwinding continues.
    pub fn retain(&mut self, mut f: impl FnMut(&T) -> bool) -> bool {
        struct Recount<'a, T>(&'a mut BucketTable<T>);

        impl<T> Drop for Recount<'_, T> {
            fn drop(&mut self) {
                self.0.populated = self
                    .0
                    .buckets
                    .iter()
                    .flatten()
                    .map(|bucket| bucket.slots.len())
                    .sum();
            }
        }

        let before = self.populated;
        let mut guard = Recount(self);
        for bucket in guard.0.buckets.iter_mut().flatten() {
            bucket.slots.retain(&mut f);
        }
        drop(guard);

        self.populated != before
    }

    /// Drops every element and bucket, restoring the capacity the table was
    /// created with.
    pub fn clear(&mut self) {
        log::trace!(
            "clearing bucket table of {} elements ({} -> {} buckets)",
            self.populated,
            self.buckets.len(),
            self.initial_capacity
        );
        self.buckets = empty_buckets(self.initial_capacity);
        self.threshold = target_load_factor(self.initial_capacity);
        self.populated = 0;
    }

    /// Doubles the capacity and redistributes every element.
    ///
    /// Elements are known to be distinct, so they are appended to their new
    /// buckets without any equality checks.
    fn grow(&mut self, hasher: impl Fn(&T) -> u64) {
        let capacity = self
            .buckets
            .len()
            .checked_mul(2)
            .expect("capacity overflow");
        log::debug!(
            "growing bucket table from {} to {} buckets ({} elements)",
            self.buckets.len(),
            capacity,
            self.populated
        );

        let old = core::mem::replace(&mut self.buckets, empty_buckets(capacity));
        self.threshold = target_load_factor(capacity);

        let bucket_capacity = self.bucket_capacity;
        for value in old.into_iter().flatten().flat_map(|bucket| bucket.slots) {
            let index = self.bucket_index(hasher(&value));
            self.buckets[index]
                .get_or_insert_with(|| Bucket::with_length(bucket_capacity))
                .push(value);
        }

        debug_assert_eq!(
            self.populated,
            self.buckets
                .iter()
                .flatten()
                .map(|bucket| bucket.slots.len())
                .sum::<usize>()
        );
    }

    /// Returns an iterator over the elements in table order.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            buckets: self.buckets.iter(),
            slots: Default::default(),
            remaining: self.populated,
        }
    }

    /// Returns a view rendering the raw layout: one line per table slot,
    /// `null` for an absent bucket and `_` for each free slot of a bucket.
    pub fn layout(&self) -> Layout<'_, T> {
        Layout { table: self }
    }

    /// Returns statistics about the table's bucket usage.
    #[cfg(any(test, feature = "stats"))]
    pub fn debug_stats(&self) -> TableStats {
        let mut allocated_buckets = 0;
        let mut total_slots = 0;
        let mut longest_bucket = 0;
        for bucket in self.buckets.iter().flatten() {
            allocated_buckets += 1;
            total_slots += bucket.length;
            longest_bucket = longest_bucket.max(bucket.slots.len());
        }

        TableStats {
            populated: self.populated,
            capacity: self.capacity(),
            threshold: self.threshold,
            allocated_buckets,
            total_slots,
            longest_bucket,
            load_factor: self.populated as f64 / self.capacity() as f64,
            slot_utilization: if total_slots == 0 {
                0.0
            } else {
                self.populated as f64 / total_slots as f64
            },
        }
    }
}

impl<T> IntoIterator for BucketTable<T> {
    type IntoIter = IntoIter<T>;
    type Item = T;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter {
            remaining: self.populated,
            buckets: self.buckets.into_iter(),
            slots: Default::default(),
        }
    }
}

/// Renders a [`BucketTable`]'s raw layout; see [`BucketTable::layout`].
pub struct Layout<'a, T> {
    table: &'a BucketTable<T>,
}

impl<T> Display for Layout<'_, T>
where
    T: Display,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        for bucket in &self.table.buckets {
            let Some(bucket) = bucket else {
                f.write_str("null\n")?;
                continue;
            };

            f.write_str("[")?;
            for i in 0..bucket.length {
                if i != 0 {
                    f.write_str(" ")?;
                }
                match bucket.slots.get(i) {
                    Some(value) => write!(f, "{value}")?,
                    None => f.write_str("_")?,
                }
            }
            f.write_str("]\n")?;
        }
        Ok(())
    }
}

/// An iterator over the elements of a [`BucketTable`].
pub struct Iter<'a, T> {
    buckets: core::slice::Iter<'a, Option<Bucket<T>>>,
    slots: core::slice::Iter<'a, T>,
    remaining: usize,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(value) = self.slots.next() {
                self.remaining -= 1;
                return Some(value);
            }
            if let Some(bucket) = self.buckets.next()? {
                self.slots = bucket.slots.iter();
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}

impl<T> FusedIterator for Iter<'_, T> {}

impl<T> Clone for Iter<'_, T> {
    fn clone(&self) -> Self {
        Iter {
            buckets: self.buckets.clone(),
            slots: self.slots.clone(),
            remaining: self.remaining,
        }
    }
}

/// A consuming iterator over the elements of a [`BucketTable`].
pub struct IntoIter<T> {
    buckets: alloc::vec::IntoIter<Option<Bucket<T>>>,
    slots: alloc::vec::IntoIter<T>,
    remaining: usize,
}

impl<T> Iterator for IntoIter<T> {
    type Item = T;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(value) = self.slots.next() {
                self.remaining -= 1;
                return Some(value);
            }
            if let Some(bucket) = self.buckets.next()? {
                self.slots = bucket.slots.into_iter();
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T> ExactSizeIterator for IntoIter<T> {}

impl<T> FusedIterator for IntoIter<T> {}
