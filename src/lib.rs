//! Immutable containers with a closed transformation algebra.
//!
//! **typed-containers** provides two containers
//! that hold values of a single type:
//!
//! - [`Sequence`], whose keys are exactly the positions `0..len`;
//! - [`Mapping`], whose keys are unique, non-empty strings.
//!
//! A [`HashProjection`] is a mapping
//! made from a sequence by running a key generator
//! over each of its elements.
//!
//! # No mutation
//!
//! Every operation borrows its receiver
//! and gives back a *new* container,
//! so a chain of calls composes like a pipeline
//! and no instance ever observes a change to another.
//!
//! ```
//! use typed_containers::prelude::*;
//!
//! let numbers = Sequence::from(vec![1, 2, 3]);
//! let more = numbers.add(4);
//!
//! assert_eq!(numbers.len(), 3);
//! assert_eq!(more.at(3), Some(&4));
//! assert_eq!(numbers.at(3), None);
//! ```
//!
//! Operations that remove elements from a sequence
//! renumber the survivors,
//! so the keys of a sequence never have a gap.
//!
//! # Two kinds of lookup
//!
//! [`Container::get`] is a checked lookup:
//! asking for an absent key is an error,
//! [`Error::KeyNotFound`].
//! [`Sequence::at`] is a plain positional lookup
//! that answers `None` out of range,
//! because asking past the end is an ordinary question.
//!
//! ```
//! use typed_containers::prelude::*;
//!
//! let pair = Sequence::from(vec![10, 20]);
//!
//! assert_eq!(pair.at(5), None);
//! assert!(matches!(pair.get(&5), Err(Error::KeyNotFound(_))));
//! ```
//!
//! # Comparators
//!
//! Operations that compare things come in two forms.
//! The plain form uses the default strategy from [`compare`]:
//! [`PartialEq`] for value equality,
//! [`compare::NaturalOrd`] for value ordering,
//! and byte order for keys.
//! The `_by` form takes a comparator closure instead,
//! where [`core::cmp::Ordering::Equal`] means “the same”.
//!
//! ```
//! use typed_containers::prelude::*;
//!
//! let files = Sequence::from(vec!["img10", "img2", "IMG1"]);
//!
//! assert_eq!(files.sort().to_native(), ["IMG1", "img2", "img10"]);
//!
//! let folded = files.sort_by(|a, b| {
//!     a.to_lowercase().natural_cmp(&b.to_lowercase())
//! });
//! assert_eq!(folded.to_native(), ["IMG1", "img2", "img10"]);
//! ```
//!
//! # Keys stay strings
//!
//! Mapping keys are [`key::Key`]s, which are always strings.
//! A key such as `"123"` is never reinterpreted as a number,
//! so a projection can’t silently change its keys.
//!

#![warn(missing_docs)]

pub mod error {

    //! Failures of construction and lookup.

    use thiserror::Error;

    /// Result of a fallible container operation.
    pub type Result<T> = std::result::Result<T, Error>;

    /// Errors raised by container operations.
    ///
    /// All of them are local and synchronous:
    /// an operation either produces a whole new container
    /// or produces nothing.
    #[derive(Debug, Error)]
    pub enum Error {
        /// Checked lookup of a key that isn’t stored.
        #[error("there is no value stored for provided key: {0}")]
        KeyNotFound(String),

        /// Input that would break a container invariant.
        #[error("invalid construction: {0}")]
        InvalidConstruction(#[from] Violation),

        /// A key generator produced an empty key.
        #[error(
            "key generator produced an empty key \
             for the element at position {position}"
        )]
        InvalidProjection {
            /// Position of the offending element.
            position: usize,
        },

        /// A fill that would leave a gap in the keys.
        #[error(
            "cannot fill from index {start} \
             of a sequence of length {len}"
        )]
        InvalidRange {
            /// Requested start index.
            start: usize,
            /// Length of the sequence being filled.
            len: usize,
        },

        /// A value couldn’t be encoded for its default identifier.
        #[error("cannot identify value: {0}")]
        Identify(#[from] serde_json::Error),
    }

    /// The invariant that some construction input broke.
    #[derive(Clone, Debug, PartialEq, Eq, Error)]
    pub enum Violation {
        /// Mapping keys must not be empty.
        #[error("mapping keys must not be empty")]
        EmptyKey,

        /// Mapping keys must be unique.
        #[error("duplicate mapping key `{0}`")]
        DuplicateKey(String),

        /// Sequence indices must count up from zero.
        #[error("expected index {expected}, found {found}")]
        IndexGap {
            /// The next index the sequence could take.
            expected: usize,
            /// The index that was given instead.
            found: usize,
        },
    }
}

pub mod compare {

    //! Default comparison strategies.
    //!
    //! Each comparing operation has a plain form,
    //! which uses the strategies here,
    //! and a `_by` form, which takes a closure.

    use core::cmp::Ordering;
    use core::iter::Peekable;
    use core::str::Chars;

    /// Natural, locale-independent ordering.
    ///
    /// For strings this compares runs of ASCII digits
    /// by their numeric value, so `"img2"` comes before
    /// `"img10"`; everything else compares by code point.
    /// For numbers it is the usual numeric order.
    pub trait NaturalOrd {
        /// Compares `self` with `other` in natural order.
        fn natural_cmp(&self, other: &Self) -> Ordering;
    }

    impl NaturalOrd for str {
        fn natural_cmp(&self, other: &Self) -> Ordering {
            natural_str_cmp(self, other)
        }
    }

    impl NaturalOrd for String {
        fn natural_cmp(&self, other: &Self) -> Ordering {
            natural_str_cmp(self, other)
        }
    }

    impl<T: NaturalOrd + ?Sized> NaturalOrd for &T {
        fn natural_cmp(&self, other: &Self) -> Ordering {
            (**self).natural_cmp(*other)
        }
    }

    macro_rules! natural_by_ord {
        ($($t:ty),* $(,)?) => {
            $(
                impl NaturalOrd for $t {
                    fn natural_cmp(&self, other: &Self) -> Ordering {
                        self.cmp(other)
                    }
                }
            )*
        };
    }

    natural_by_ord!(
        i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128,
        usize, char, bool,
    );

    macro_rules! natural_by_total_cmp {
        ($($t:ty),* $(,)?) => {
            $(
                impl NaturalOrd for $t {
                    fn natural_cmp(&self, other: &Self) -> Ordering {
                        self.total_cmp(other)
                    }
                }
            )*
        };
    }

    natural_by_total_cmp!(f32, f64);

    /// Default value ordering.
    pub fn natural<V: NaturalOrd + ?Sized>(a: &V, b: &V) -> Ordering {
        a.natural_cmp(b)
    }

    /// Natural order of two strings.
    ///
    /// Digit runs compare by magnitude;
    /// equal magnitudes with more leading zeros come later,
    /// so only identical strings compare equal.
    ///
    /// ```
    /// use core::cmp::Ordering;
    /// use typed_containers::compare::natural_str_cmp;
    ///
    /// assert_eq!(natural_str_cmp("a2", "a10"), Ordering::Less);
    /// assert_eq!(natural_str_cmp("a10", "a10"), Ordering::Equal);
    /// ```
    pub fn natural_str_cmp(a: &str, b: &str) -> Ordering {
        let mut left = a.chars().peekable();
        let mut right = b.chars().peekable();
        loop {
            let next = (left.peek().copied(), right.peek().copied());
            let order = match next {
                (None, None) => return Ordering::Equal,
                (None, Some(_)) => return Ordering::Less,
                (Some(_), None) => return Ordering::Greater,
                (Some(l), Some(r))
                    if l.is_ascii_digit() && r.is_ascii_digit() =>
                {
                    let l = digit_run(&mut left);
                    let r = digit_run(&mut right);
                    digit_run_cmp(&l, &r)
                }
                (Some(l), Some(r)) => {
                    left.next();
                    right.next();
                    l.cmp(&r)
                }
            };
            if order != Ordering::Equal {
                return order;
            }
        }
    }

    fn digit_run(chars: &mut Peekable<Chars<'_>>) -> String {
        let mut run = String::new();
        while let Some(c) = chars.next_if(char::is_ascii_digit) {
            run.push(c);
        }
        run
    }

    fn digit_run_cmp(a: &str, b: &str) -> Ordering {
        let short_a = a.trim_start_matches('0');
        let short_b = b.trim_start_matches('0');
        short_a
            .len()
            .cmp(&short_b.len())
            .then_with(|| short_a.cmp(short_b))
            .then_with(|| a.len().cmp(&b.len()))
    }

    /// Turns an ordering comparator into an equality test.
    pub(crate) fn agrees<V: ?Sized>(
        cmp: impl Fn(&V, &V) -> Ordering,
    ) -> impl Fn(&V, &V) -> bool {
        move |a: &V, b: &V| cmp(a, b) == Ordering::Equal
    }
}

pub mod key {

    //! Strings known to be valid mapping keys.

    use super::compare::{natural_str_cmp, NaturalOrd};
    use super::error::Violation;
    use core::borrow::Borrow;
    use core::cmp::Ordering;
    use core::fmt;
    use core::ops::Deref;
    use serde::de::{Deserialize, Deserializer, Error as _};
    use serde::ser::{Serialize, Serializer};

    /// A string that is known to be a valid key in a mapping,
    /// that is, a non-empty one.
    ///
    /// The only way to make one is [`Key::new`],
    /// which checks, so holding a `Key` means
    /// the check has already been done.
    #[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
    pub struct Key {
        own: String,
    }

    impl Key {
        /// Checks that `body` can be a mapping key.
        pub fn new(
            body: impl Into<String>,
        ) -> Result<Key, Violation> {
            let own = body.into();
            if own.is_empty() {
                return Err(Violation::EmptyKey);
            }
            Ok(Key { own })
        }

        /// Borrows the key as a string slice.
        pub fn as_str(&self) -> &str {
            &self.own
        }

        /// Forgets that the string is a valid key.
        pub fn into_string(self) -> String {
            self.own
        }
    }

    impl Deref for Key {
        type Target = str;
        fn deref(&self) -> &str {
            &self.own
        }
    }

    // Hashes like `str`, which `IndexMap` lookups by `&str` rely on.
    impl Borrow<str> for Key {
        fn borrow(&self) -> &str {
            &self.own
        }
    }

    impl fmt::Debug for Key {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            fmt::Debug::fmt(&self.own, f)
        }
    }

    impl fmt::Display for Key {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(&self.own)
        }
    }

    impl PartialEq<&str> for Key {
        fn eq(&self, other: &&str) -> bool {
            self.own == *other
        }
    }

    impl NaturalOrd for Key {
        fn natural_cmp(&self, other: &Self) -> Ordering {
            natural_str_cmp(&self.own, &other.own)
        }
    }

    impl TryFrom<String> for Key {
        type Error = Violation;
        fn try_from(body: String) -> Result<Key, Violation> {
            Key::new(body)
        }
    }

    impl Serialize for Key {
        fn serialize<S: Serializer>(
            &self,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            serializer.serialize_str(&self.own)
        }
    }

    impl<'de> Deserialize<'de> for Key {
        fn deserialize<D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Key, D::Error> {
            let body = String::deserialize(deserializer)?;
            Key::new(body).map_err(D::Error::custom)
        }
    }
}

pub mod kind {

    //! Type-level tags telling how a mapping was made.
    //!
    //! The tags are phantoms, so they cost nothing at runtime,
    //! and every transform keeps the tag of its receiver.

    /// Mapping kinds. Sealed: the tags here are the only ones.
    pub trait Kind: sealed::Sealed {}

    /// A mapping built directly from key–value pairs.
    pub enum Plain {}

    /// A mapping projected from a sequence by a key generator.
    pub enum Projected {}

    impl Kind for Plain {}
    impl Kind for Projected {}

    mod sealed {
        pub trait Sealed {}
        impl Sealed for super::Plain {}
        impl Sealed for super::Projected {}
    }
}

pub mod container {

    //! What every container can do.

    use super::error::Result;

    /// A read-only key-to-value store.
    ///
    /// Keys are unique; the backing store enforces it.
    pub trait Container {
        /// Key used for lookups.
        type Key: ?Sized;

        /// Element type.
        type Value;

        /// Snapshot produced by [`Container::to_native`],
        /// from which an equal container can be rebuilt.
        type Native;

        /// Gets the value under `key`.
        ///
        /// # Errors
        ///
        /// [`crate::Error::KeyNotFound`] if `key` isn’t stored.
        fn get(&self, key: &Self::Key) -> Result<&Self::Value>;

        /// Whether `key` is stored.
        fn has(&self, key: &Self::Key) -> bool;

        /// Number of entries.
        fn len(&self) -> usize;

        /// Whether there are no entries.
        fn is_empty(&self) -> bool {
            self.len() == 0
        }

        /// Copies the entries out, in iteration order.
        fn to_native(&self) -> Self::Native
        where
            Self::Value: Clone;
    }
}

pub mod identify {

    //! Structural identifiers for values.

    use super::error::Result;
    use serde::Serialize;
    use sha2::{Digest, Sha256};

    /// Hex SHA-256 digest of the JSON encoding of `value`.
    ///
    /// Structurally equal values get equal identifiers,
    /// as long as their encoding is deterministic
    /// (a `HashMap` field, for example, is not).
    ///
    /// # Errors
    ///
    /// [`crate::Error::Identify`] if `value` can’t be encoded.
    pub fn content_hash<V: Serialize + ?Sized>(
        value: &V,
    ) -> Result<String> {
        let encoded = serde_json::to_vec(value)?;
        let mut hasher = Sha256::new();
        hasher.update(&encoded);
        Ok(hex::encode(hasher.finalize()))
    }
}

pub mod sequence {

    //! Like [`mod@std::vec`], but immutable and contiguous.

    use super::compare::{agrees, natural, NaturalOrd};
    use super::container::Container;
    use super::error::{Error, Result, Violation};
    use super::identify::content_hash;
    use core::cmp::Ordering;
    use core::convert::Infallible;
    use core::hash::Hash;
    use core::slice;
    use indexmap::map::Entry;
    use indexmap::IndexMap;
    use serde::{Deserialize, Serialize};
    use std::vec;

    /// An ordered container whose keys are exactly `0..len`.
    ///
    /// Every operation that drops elements renumbers the rest,
    /// so there is never a gap.
    #[derive(
        Clone,
        Debug,
        PartialEq,
        Eq,
        Hash,
        Serialize,
        Deserialize,
    )]
    #[serde(transparent)]
    pub struct Sequence<V> {
        own: Vec<V>,
    }

    impl<V> Sequence<V> {
        /// An empty sequence.
        pub fn empty() -> Sequence<V> {
            Sequence { own: Vec::new() }
        }

        /// Takes the elements of a vector, in order.
        pub fn new(values: Vec<V>) -> Sequence<V> {
            Sequence { own: values }
        }

        /// Builds a sequence from explicitly indexed elements.
        ///
        /// # Errors
        ///
        /// [`Violation::IndexGap`] unless the indices
        /// are exactly `0, 1, …, n - 1`, in that order.
        pub fn from_indexed<I>(pairs: I) -> Result<Sequence<V>>
        where
            I: IntoIterator<Item = (usize, V)>,
        {
            let mut own = Vec::new();
            for (index, value) in pairs {
                let expected = own.len();
                if index != expected {
                    tracing::debug!(
                        expected,
                        found = index,
                        "rejected non-contiguous sequence input"
                    );
                    return Err(Violation::IndexGap {
                        expected,
                        found: index,
                    }
                    .into());
                }
                own.push(value);
            }
            Ok(Sequence { own })
        }

        /// Like [`slice::get`]: `None` out of range, never an error.
        pub fn at(&self, position: usize) -> Option<&V> {
            self.own.get(position)
        }

        /// The keys, which are always `0..len`.
        pub fn keys(&self) -> Sequence<usize> {
            Sequence {
                own: (0..self.own.len()).collect(),
            }
        }

        /// Like [`slice::iter`]
        pub fn iter(&self) -> slice::Iter<'_, V> {
            self.own.iter()
        }

        /// Borrows the elements.
        pub fn as_slice(&self) -> &[V] {
            &self.own
        }

        /// Forgets the sequence, keeping the elements.
        pub fn into_vec(self) -> Vec<V> {
            self.own
        }

        /// Like [`slice::contains`]
        pub fn contains(&self, value: &V) -> bool
        where
            V: PartialEq,
        {
            self.own.contains(value)
        }

        /// Projects every element, keeping the order.
        ///
        /// The new element type may differ from the old one.
        pub fn map<U, F>(&self, transform: F) -> Sequence<U>
        where
            F: FnMut(&V) -> U,
        {
            Sequence {
                own: self.own.iter().map(transform).collect(),
            }
        }
    } // impl Sequence

    impl<V: Clone> Sequence<V> {
        /// Like [`std::vec::Vec::push()`], into a new sequence.
        ///
        /// Existing elements keep their positions.
        pub fn add(&self, value: V) -> Sequence<V> {
            let mut own = Vec::with_capacity(self.own.len() + 1);
            own.extend_from_slice(&self.own);
            own.push(value);
            Sequence { own }
        }

        /// This sequence followed by each of `others`, in order.
        pub fn merge<'a, I>(&self, others: I) -> Sequence<V>
        where
            I: IntoIterator<Item = &'a Sequence<V>>,
            V: 'a,
        {
            let mut own = self.own.clone();
            for other in others {
                own.extend_from_slice(&other.own);
            }
            Sequence { own }
        }

        /// Keeps the elements for which `predicate` holds,
        /// renumbered from zero.
        pub fn filter<F>(&self, mut predicate: F) -> Sequence<V>
        where
            F: FnMut(&V) -> bool,
        {
            self.own
                .iter()
                .filter(|value| predicate(*value))
                .cloned()
                .collect()
        }

        /// Drops every element equal to `value`.
        pub fn remove(&self, value: &V) -> Sequence<V>
        where
            V: PartialEq,
        {
            self.filter(|other| other != value)
        }

        /// Drops every element that `cmp` finds equal to `value`.
        pub fn remove_by<F>(&self, value: &V, cmp: F) -> Sequence<V>
        where
            F: Fn(&V, &V) -> Ordering,
        {
            let same = agrees(cmp);
            self.filter(|other| !same(other, value))
        }

        /// Sorts in natural order.
        pub fn sort(&self) -> Sequence<V>
        where
            V: NaturalOrd,
        {
            self.sort_by(natural::<V>)
        }

        /// Like [`slice::sort_by`]; the sort is stable.
        pub fn sort_by<F>(&self, cmp: F) -> Sequence<V>
        where
            F: FnMut(&V, &V) -> Ordering,
        {
            let mut own = self.own.clone();
            own.sort_by(cmp);
            Sequence { own }
        }

        /// Symmetric difference by value.
        ///
        /// Returns the elements of `self` not found in `other`,
        /// followed by the elements of `other`
        /// not found in `self`.
        pub fn diff(&self, other: &Sequence<V>) -> Sequence<V>
        where
            V: PartialEq,
        {
            self.symmetric_difference(other, |a, b| a == b)
        }

        /// Like [`Self::diff`] but comparing with `cmp`.
        pub fn diff_by<F>(
            &self,
            other: &Sequence<V>,
            cmp: F,
        ) -> Sequence<V>
        where
            F: Fn(&V, &V) -> Ordering,
        {
            self.symmetric_difference(other, agrees(cmp))
        }

        fn symmetric_difference<F>(
            &self,
            other: &Sequence<V>,
            same: F,
        ) -> Sequence<V>
        where
            F: Fn(&V, &V) -> bool,
        {
            let ours = self
                .own
                .iter()
                .filter(|a| !other.own.iter().any(|b| same(*a, b)));
            let theirs = other
                .own
                .iter()
                .filter(|b| !self.own.iter().any(|a| same(*b, a)));
            ours.chain(theirs).cloned().collect()
        }

        /// The elements of `self` also found in `other`,
        /// in the order of `self`.
        pub fn intersect(&self, other: &Sequence<V>) -> Sequence<V>
        where
            V: PartialEq,
        {
            self.filter(|a| other.own.contains(a))
        }

        /// Like [`Self::intersect`] but comparing with `cmp`.
        pub fn intersect_by<F>(
            &self,
            other: &Sequence<V>,
            cmp: F,
        ) -> Sequence<V>
        where
            F: Fn(&V, &V) -> Ordering,
        {
            let same = agrees(cmp);
            self.filter(|a| other.own.iter().any(|b| same(a, b)))
        }

        /// Drops structurally equal duplicates,
        /// keeping each first occurrence where it was.
        ///
        /// Elements are identified by
        /// [`crate::identify::content_hash`].
        ///
        /// # Errors
        ///
        /// [`Error::Identify`] if an element can’t be encoded.
        pub fn unify(&self) -> Result<Sequence<V>>
        where
            V: Serialize,
        {
            self.unified(
                |value: &V| content_hash(value),
                None::<fn(&V, &V) -> V>,
            )
        }

        /// Like [`Self::unify`], but folds each later duplicate
        /// into the first occurrence with
        /// `combine(retained, incoming)`.
        ///
        /// # Errors
        ///
        /// [`Error::Identify`] if an element can’t be encoded.
        pub fn unify_with<C>(&self, combine: C) -> Result<Sequence<V>>
        where
            V: Serialize,
            C: FnMut(&V, &V) -> V,
        {
            self.unified(|value: &V| content_hash(value), Some(combine))
        }

        /// Drops elements whose identifier was already seen,
        /// keeping each first occurrence where it was.
        ///
        /// ```
        /// use typed_containers::Sequence;
        ///
        /// let words = Sequence::from(vec!["a", "b", "A"]);
        /// let unique = words.unify_by(|w| w.to_lowercase());
        ///
        /// assert_eq!(unique.into_vec(), ["a", "b"]);
        /// ```
        pub fn unify_by<I, G>(&self, mut identify: G) -> Sequence<V>
        where
            I: Eq + Hash,
            G: FnMut(&V) -> I,
        {
            let unified = self.unified(
                |value| Ok::<_, Infallible>(identify(value)),
                None::<fn(&V, &V) -> V>,
            );
            match unified {
                Ok(sequence) => sequence,
                Err(never) => match never {},
            }
        }

        /// Like [`Self::unify_by`], but folds each later element
        /// sharing an identifier into the first occurrence with
        /// `combine(retained, incoming)`, in encounter order.
        pub fn unify_by_with<I, G, C>(
            &self,
            mut identify: G,
            combine: C,
        ) -> Sequence<V>
        where
            I: Eq + Hash,
            G: FnMut(&V) -> I,
            C: FnMut(&V, &V) -> V,
        {
            let unified = self.unified(
                |value| Ok::<_, Infallible>(identify(value)),
                Some(combine),
            );
            match unified {
                Ok(sequence) => sequence,
                Err(never) => match never {},
            }
        }

        fn unified<I, E, G, C>(
            &self,
            mut identify: G,
            mut combine: Option<C>,
        ) -> core::result::Result<Sequence<V>, E>
        where
            I: Eq + Hash,
            G: FnMut(&V) -> core::result::Result<I, E>,
            C: FnMut(&V, &V) -> V,
        {
            let mut unified: IndexMap<I, V> = IndexMap::new();
            for (position, value) in self.own.iter().enumerate() {
                match unified.entry(identify(value)?) {
                    Entry::Vacant(slot) => {
                        slot.insert(value.clone());
                    }
                    Entry::Occupied(mut slot) => match combine.as_mut() {
                        Some(combine) => {
                            let folded = combine(slot.get(), value);
                            slot.insert(folded);
                            tracing::trace!(
                                position,
                                "folded duplicate into first occurrence"
                            );
                        }
                        None => {
                            tracing::trace!(
                                position,
                                "discarded duplicate"
                            );
                        }
                    },
                }
            }
            Ok(Sequence {
                own: unified.into_values().collect(),
            })
        }

        /// Writes `amount` copies of `value` from `start` on.
        ///
        /// See [`Self::fill_with`] for which starts are allowed.
        pub fn fill(
            &self,
            start: usize,
            amount: usize,
            value: V,
        ) -> Result<Sequence<V>> {
            self.fill_with(start, amount, |_| value.clone())
        }

        /// Writes `generate(index)` at each index
        /// of `start..start + amount`.
        ///
        /// `start` may be any index up to and including `len`:
        /// existing elements in range are overwritten
        /// and the rest are appended.
        ///
        /// # Errors
        ///
        /// [`Error::InvalidRange`] if `start > len`,
        /// which would leave a gap.
        ///
        /// ```
        /// use typed_containers::Sequence;
        ///
        /// let base = Sequence::from(vec![1, 2, 3]);
        /// let filled = base.fill_with(2, 3, |i| i * 10).unwrap();
        ///
        /// assert_eq!(filled.into_vec(), [1, 2, 20, 30, 40]);
        /// assert!(base.fill(5, 2, 0).is_err());
        /// ```
        pub fn fill_with<F>(
            &self,
            start: usize,
            amount: usize,
            mut generate: F,
        ) -> Result<Sequence<V>>
        where
            F: FnMut(usize) -> V,
        {
            let len = self.own.len();
            let end = match start.checked_add(amount) {
                Some(end) if start <= len => end,
                _ => {
                    tracing::debug!(
                        start,
                        amount,
                        len,
                        "rejected fill that would leave a gap"
                    );
                    return Err(Error::InvalidRange { start, len });
                }
            };
            let mut own = self.own.clone();
            own.reserve(end.saturating_sub(len));
            for index in start..end {
                let value = generate(index);
                match own.get_mut(index) {
                    Some(slot) => *slot = value,
                    None => own.push(value),
                }
            }
            Ok(Sequence { own })
        }
    } // impl Sequence

    impl<V> Container for Sequence<V> {
        type Key = usize;
        type Value = V;
        type Native = Vec<V>;

        fn get(&self, key: &usize) -> Result<&V> {
            self.own
                .get(*key)
                .ok_or_else(|| Error::KeyNotFound(key.to_string()))
        }

        fn has(&self, key: &usize) -> bool {
            *key < self.own.len()
        }

        fn len(&self) -> usize {
            self.own.len()
        }

        fn to_native(&self) -> Vec<V>
        where
            Self::Value: Clone,
        {
            self.own.clone()
        }
    }

    impl<V> Default for Sequence<V> {
        fn default() -> Self {
            Sequence::empty()
        }
    }

    impl<V> From<Vec<V>> for Sequence<V> {
        fn from(own: Vec<V>) -> Self {
            Sequence { own }
        }
    }

    impl<V> From<Sequence<V>> for Vec<V> {
        fn from(sequence: Sequence<V>) -> Self {
            sequence.own
        }
    }

    impl<V> FromIterator<V> for Sequence<V> {
        fn from_iter<I: IntoIterator<Item = V>>(iter: I) -> Self {
            Sequence {
                own: iter.into_iter().collect(),
            }
        }
    }

    impl<V> IntoIterator for Sequence<V> {
        type Item = V;
        type IntoIter = vec::IntoIter<V>;
        fn into_iter(self) -> vec::IntoIter<V> {
            self.own.into_iter()
        }
    }

    impl<'seq, V> IntoIterator for &'seq Sequence<V> {
        type Item = &'seq V;
        type IntoIter = slice::Iter<'seq, V>;
        fn into_iter(self) -> slice::Iter<'seq, V> {
            self.own.iter()
        }
    }
}

pub mod mapping {

    //! Like [`indexmap::IndexMap`] with string keys,
    //! but immutable.

    use super::compare::{agrees, natural, NaturalOrd};
    use super::container::Container;
    use super::error::{Error, Result, Violation};
    use super::key::Key;
    use super::kind::{Kind, Plain};
    use super::sequence::Sequence;
    use core::cmp::Ordering;
    use core::fmt;
    use core::marker::PhantomData;
    use indexmap::{map, IndexMap};
    use serde::de::{
        Deserialize, Deserializer, Error as _, MapAccess, Visitor,
    };
    use serde::ser::{Serialize, Serializer};

    /// A container keyed by unique, non-empty strings.
    ///
    /// Iteration follows insertion order,
    /// which matters for [`Mapping::merge`] and [`Mapping::sort`]
    /// but not for the set operations.
    ///
    /// `K` records how the mapping was made;
    /// see [`mod@crate::kind`].
    pub struct Mapping<V, K = Plain> {
        own: IndexMap<Key, V>,
        kind: PhantomData<fn() -> K>,
    }

    impl<V> Mapping<V> {
        /// An empty mapping.
        pub fn empty() -> Mapping<V> {
            Mapping::with_store(IndexMap::new())
        }

        /// Builds a mapping from key–value pairs, in order.
        ///
        /// # Errors
        ///
        /// [`Error::InvalidConstruction`] if a key is empty
        /// or appears twice.
        ///
        /// ```
        /// use typed_containers::Mapping;
        ///
        /// assert!(Mapping::new([("a", 1), ("b", 2)]).is_ok());
        /// assert!(Mapping::new([("a", 1), ("a", 2)]).is_err());
        /// assert!(Mapping::new([("", 1)]).is_err());
        /// ```
        pub fn new<S, I>(pairs: I) -> Result<Mapping<V>>
        where
            I: IntoIterator<Item = (S, V)>,
            S: Into<String>,
        {
            Mapping::from_pairs(pairs)
        }
    } // impl Mapping

    impl<V, K: Kind> Mapping<V, K> {
        pub(crate) fn with_store(own: IndexMap<Key, V>) -> Self {
            Mapping {
                own,
                kind: PhantomData,
            }
        }

        pub(crate) fn from_pairs<S, I>(pairs: I) -> Result<Self>
        where
            I: IntoIterator<Item = (S, V)>,
            S: Into<String>,
        {
            let mut own = IndexMap::new();
            for (key, value) in pairs {
                let key = Key::new(key).inspect_err(|_| {
                    tracing::debug!("rejected empty key");
                })?;
                if own.contains_key(&key) {
                    tracing::debug!(%key, "rejected duplicate key");
                    return Err(Violation::DuplicateKey(
                        key.into_string(),
                    )
                    .into());
                }
                own.insert(key, value);
            }
            Ok(Mapping::with_store(own))
        }

        /// The keys, in iteration order.
        pub fn keys(&self) -> Sequence<Key> {
            self.own.keys().cloned().collect()
        }

        /// Like [`indexmap::IndexMap::values`]
        pub fn values(&self) -> map::Values<'_, Key, V> {
            self.own.values()
        }

        /// Like [`indexmap::IndexMap::iter`]
        pub fn iter(&self) -> map::Iter<'_, Key, V> {
            self.own.iter()
        }

        /// Projects every value, keeping keys and order.
        ///
        /// The result is a plain mapping
        /// whose value type may differ from this one’s.
        pub fn map<U, F>(&self, mut transform: F) -> Mapping<U>
        where
            F: FnMut(&V) -> U,
        {
            Mapping::with_store(
                self.own
                    .iter()
                    .map(|(key, value)| (key.clone(), transform(value)))
                    .collect(),
            )
        }
    } // impl Mapping

    impl<V: Clone, K: Kind> Mapping<V, K> {
        fn selected<F>(&self, mut keep: F) -> IndexMap<Key, V>
        where
            F: FnMut(&Key, &V) -> bool,
        {
            self.own
                .iter()
                .filter(|&(key, value)| keep(key, value))
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect()
        }

        /// Sets `key` to `value`, replacing any previous value
        /// in place.
        ///
        /// # Errors
        ///
        /// [`Error::InvalidConstruction`] if `key` is empty.
        pub fn put(
            &self,
            key: impl Into<String>,
            value: V,
        ) -> Result<Self> {
            let key = Key::new(key).inspect_err(|_| {
                tracing::debug!("rejected empty key");
            })?;
            let mut own = self.own.clone();
            own.insert(key, value);
            Ok(Mapping::with_store(own))
        }

        /// Folds `others` into this mapping, left to right.
        ///
        /// On a key collision the rightmost value wins,
        /// and the key stays where it first appeared.
        ///
        /// ```
        /// use typed_containers::Mapping;
        ///
        /// let left = Mapping::new([("a", 1), ("b", 2)]).unwrap();
        /// let right = Mapping::new([("b", 3), ("c", 4)]).unwrap();
        ///
        /// assert_eq!(
        ///     left.merge([&right]),
        ///     Mapping::new([("a", 1), ("b", 3), ("c", 4)]).unwrap(),
        /// );
        /// ```
        pub fn merge<'a, O, I>(&self, others: I) -> Self
        where
            I: IntoIterator<Item = &'a Mapping<V, O>>,
            V: 'a,
            O: Kind + 'a,
        {
            let mut own = self.own.clone();
            for other in others {
                for (key, value) in &other.own {
                    own.insert(key.clone(), value.clone());
                }
            }
            Mapping::with_store(own)
        }

        /// Sorts by value in natural order, keeping keys with
        /// their values.
        pub fn sort(&self) -> Self
        where
            V: NaturalOrd,
        {
            self.sort_by(natural::<V>)
        }

        /// Sorts by value with `cmp`, keeping keys with their
        /// values. The sort is stable.
        pub fn sort_by<F>(&self, mut cmp: F) -> Self
        where
            F: FnMut(&V, &V) -> Ordering,
        {
            let mut own = self.own.clone();
            own.sort_by(|_, a, _, b| cmp(a, b));
            Mapping::with_store(own)
        }

        /// Symmetric difference by key.
        ///
        /// Returns the entries whose key is only in `self`,
        /// followed by those whose key is only in `other`.
        pub fn diff_keys<O: Kind>(&self, other: &Mapping<V, O>) -> Self {
            let mut own = self.selected(|key, _| !other.own.contains_key(key));
            own.extend(other.selected(|key, _| !self.own.contains_key(key)));
            Mapping::with_store(own)
        }

        /// Like [`Self::diff_keys`] but comparing keys with `cmp`.
        pub fn diff_keys_by<O, F>(
            &self,
            other: &Mapping<V, O>,
            cmp: F,
        ) -> Self
        where
            O: Kind,
            F: Fn(&str, &str) -> Ordering,
        {
            let same = agrees(cmp);
            let mut own = self.selected(|key, _| {
                !other
                    .own
                    .keys()
                    .any(|theirs| same(key.as_str(), theirs.as_str()))
            });
            own.extend(other.selected(|key, _| {
                !self
                    .own
                    .keys()
                    .any(|ours| same(key.as_str(), ours.as_str()))
            }));
            Mapping::with_store(own)
        }

        /// Symmetric difference by value, regardless of keys.
        ///
        /// Returns the entries of `self` whose value isn’t
        /// among the values of `other`, followed by the entries
        /// of `other` whose value isn’t among those of `self`.
        /// If both halves hold the same key,
        /// the entry from `other` overwrites it in place.
        pub fn diff<O: Kind>(&self, other: &Mapping<V, O>) -> Self
        where
            V: PartialEq,
        {
            self.value_difference(other, |a, b| a == b)
        }

        /// Like [`Self::diff`] but comparing values with `cmp`.
        pub fn diff_by<O, F>(
            &self,
            other: &Mapping<V, O>,
            cmp: F,
        ) -> Self
        where
            O: Kind,
            F: Fn(&V, &V) -> Ordering,
        {
            self.value_difference(other, agrees(cmp))
        }

        fn value_difference<O, F>(
            &self,
            other: &Mapping<V, O>,
            same: F,
        ) -> Self
        where
            O: Kind,
            F: Fn(&V, &V) -> bool,
        {
            let mut own = self.selected(|_, a| {
                !other.own.values().any(|b| same(a, b))
            });
            own.extend(other.selected(|_, b| {
                !self.own.values().any(|a| same(b, a))
            }));
            Mapping::with_store(own)
        }

        /// The entries of `self` whose value is among
        /// the values of `other`, regardless of keys.
        pub fn intersect<O: Kind>(&self, other: &Mapping<V, O>) -> Self
        where
            V: PartialEq,
        {
            Mapping::with_store(self.selected(|_, a| {
                other.own.values().any(|b| a == b)
            }))
        }

        /// Like [`Self::intersect`] but comparing values with `cmp`.
        pub fn intersect_by<O, F>(
            &self,
            other: &Mapping<V, O>,
            cmp: F,
        ) -> Self
        where
            O: Kind,
            F: Fn(&V, &V) -> Ordering,
        {
            let same = agrees(cmp);
            Mapping::with_store(self.selected(|_, a| {
                other.own.values().any(|b| same(a, b))
            }))
        }

        /// Same result as [`Self::intersect`].
        ///
        /// Despite the name, keys are not compared;
        /// use [`Self::intersect_user_assoc`] to match
        /// on key and value together.
        pub fn intersect_assoc<O: Kind>(
            &self,
            other: &Mapping<V, O>,
        ) -> Self
        where
            V: PartialEq,
        {
            self.intersect(other)
        }

        /// Same result as [`Self::intersect_by`].
        pub fn intersect_assoc_by<O, F>(
            &self,
            other: &Mapping<V, O>,
            cmp: F,
        ) -> Self
        where
            O: Kind,
            F: Fn(&V, &V) -> Ordering,
        {
            self.intersect_by(other, cmp)
        }

        /// The entries of `self` whose key is also in `other`.
        pub fn intersect_using_keys<O: Kind>(
            &self,
            other: &Mapping<V, O>,
        ) -> Self {
            Mapping::with_store(
                self.selected(|key, _| other.own.contains_key(key)),
            )
        }

        /// Like [`Self::intersect_using_keys`] but comparing keys
        /// with `cmp`.
        pub fn intersect_using_keys_by<O, F>(
            &self,
            other: &Mapping<V, O>,
            cmp: F,
        ) -> Self
        where
            O: Kind,
            F: Fn(&str, &str) -> Ordering,
        {
            let same = agrees(cmp);
            Mapping::with_store(self.selected(|key, _| {
                other
                    .own
                    .keys()
                    .any(|theirs| same(key.as_str(), theirs.as_str()))
            }))
        }

        /// The entries of `self` for which `other` holds
        /// an equal value under an equal key.
        pub fn intersect_user_assoc<O: Kind>(
            &self,
            other: &Mapping<V, O>,
        ) -> Self
        where
            V: PartialEq,
        {
            Mapping::with_store(self.selected(|key, a| {
                other.own.get(key).is_some_and(|b| a == b)
            }))
        }

        /// Like [`Self::intersect_user_assoc`] but comparing
        /// values with `value_cmp` and keys with `key_cmp`.
        pub fn intersect_user_assoc_by<O, F, G>(
            &self,
            other: &Mapping<V, O>,
            value_cmp: F,
            key_cmp: G,
        ) -> Self
        where
            O: Kind,
            F: Fn(&V, &V) -> Ordering,
            G: Fn(&str, &str) -> Ordering,
        {
            let same_value = agrees(value_cmp);
            let same_key = agrees(key_cmp);
            Mapping::with_store(self.selected(|key, a| {
                other.own.iter().any(|(theirs, b)| {
                    same_key(key.as_str(), theirs.as_str())
                        && same_value(a, b)
                })
            }))
        }

        /// Keeps the entries for which `predicate(value, key)`
        /// holds. Keys are kept as they are.
        pub fn filter<F>(&self, mut predicate: F) -> Self
        where
            F: FnMut(&V, &str) -> bool,
        {
            Mapping::with_store(
                self.selected(|key, value| predicate(value, key.as_str())),
            )
        }

        /// Drops the entry under `key`, if there is one.
        pub fn remove_element_by_key(&self, key: &str) -> Self {
            let mut own = self.own.clone();
            own.shift_remove(key);
            Mapping::with_store(own)
        }

        /// Drops every entry whose value equals `value`.
        pub fn remove_element(&self, value: &V) -> Self
        where
            V: PartialEq,
        {
            Mapping::with_store(self.selected(|_, other| other != value))
        }

        /// The values, in iteration order, without their keys.
        pub fn to_ordered_list(&self) -> Sequence<V> {
            self.own.values().cloned().collect()
        }

        /// The values sorted with `cmp`, without their keys.
        pub fn to_ordered_list_by<F>(&self, cmp: F) -> Sequence<V>
        where
            F: FnMut(&V, &V) -> Ordering,
        {
            let mut values: Vec<V> = self.own.values().cloned().collect();
            values.sort_by(cmp);
            Sequence::new(values)
        }

        /// Splits by `predicate`, keeping keys.
        ///
        /// Returns:
        ///
        /// 0. Entries for which `predicate` holds
        /// 1. Entries for which it doesn’t
        ///
        pub fn partition<F>(&self, mut predicate: F) -> (Self, Self)
        where
            F: FnMut(&V) -> bool,
        {
            let mut matching = IndexMap::new();
            let mut rest = IndexMap::new();
            for (key, value) in &self.own {
                let side = if predicate(value) {
                    &mut matching
                } else {
                    &mut rest
                };
                side.insert(key.clone(), value.clone());
            }
            (Mapping::with_store(matching), Mapping::with_store(rest))
        }
    } // impl Mapping

    impl<V, K: Kind> Container for Mapping<V, K> {
        type Key = str;
        type Value = V;
        type Native = IndexMap<String, V>;

        fn get(&self, key: &str) -> Result<&V> {
            self.own
                .get(key)
                .ok_or_else(|| Error::KeyNotFound(key.to_owned()))
        }

        fn has(&self, key: &str) -> bool {
            self.own.contains_key(key)
        }

        fn len(&self) -> usize {
            self.own.len()
        }

        fn to_native(&self) -> IndexMap<String, V>
        where
            Self::Value: Clone,
        {
            self.own
                .iter()
                .map(|(key, value)| (key.to_string(), value.clone()))
                .collect()
        }
    }

    impl<V, K: Kind> TryFrom<IndexMap<String, V>> for Mapping<V, K> {
        type Error = Error;
        fn try_from(native: IndexMap<String, V>) -> Result<Self> {
            Mapping::from_pairs(native)
        }
    }

    impl<V: Clone, K> Clone for Mapping<V, K> {
        fn clone(&self) -> Self {
            Mapping {
                own: self.own.clone(),
                kind: PhantomData,
            }
        }
    }

    impl<V: fmt::Debug, K> fmt::Debug for Mapping<V, K> {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.debug_map().entries(self.own.iter()).finish()
        }
    }

    impl<V, K> Default for Mapping<V, K> {
        fn default() -> Self {
            Mapping {
                own: IndexMap::new(),
                kind: PhantomData,
            }
        }
    }

    /// Equal when the same entries appear in the same order.
    impl<V: PartialEq, K, O> PartialEq<Mapping<V, O>> for Mapping<V, K> {
        fn eq(&self, other: &Mapping<V, O>) -> bool {
            self.own.len() == other.own.len()
                && self.own.iter().eq(other.own.iter())
        }
    }

    impl<V: Eq, K> Eq for Mapping<V, K> {}

    impl<'map, V, K> IntoIterator for &'map Mapping<V, K> {
        type Item = (&'map Key, &'map V);
        type IntoIter = map::Iter<'map, Key, V>;
        fn into_iter(self) -> map::Iter<'map, Key, V> {
            self.own.iter()
        }
    }

    impl<V, K> IntoIterator for Mapping<V, K> {
        type Item = (Key, V);
        type IntoIter = map::IntoIter<Key, V>;
        fn into_iter(self) -> map::IntoIter<Key, V> {
            self.own.into_iter()
        }
    }

    impl<V: Serialize, K> Serialize for Mapping<V, K> {
        fn serialize<S: Serializer>(
            &self,
            serializer: S,
        ) -> core::result::Result<S::Ok, S::Error> {
            serializer.collect_map(self.own.iter())
        }
    }

    impl<'de, V, K> Deserialize<'de> for Mapping<V, K>
    where
        V: Deserialize<'de>,
        K: Kind,
    {
        fn deserialize<D: Deserializer<'de>>(
            deserializer: D,
        ) -> core::result::Result<Self, D::Error> {
            deserializer.deserialize_map(PairsVisitor(PhantomData))
        }
    }

    // Keeps every entry, repeats included, so `from_pairs`
    // sees what the input actually said.
    struct PairsVisitor<V, K>(PhantomData<fn() -> (V, K)>);

    impl<'de, V, K> Visitor<'de> for PairsVisitor<V, K>
    where
        V: Deserialize<'de>,
        K: Kind,
    {
        type Value = Mapping<V, K>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a map with unique, non-empty string keys")
        }

        fn visit_map<A: MapAccess<'de>>(
            self,
            mut access: A,
        ) -> core::result::Result<Self::Value, A::Error> {
            let mut pairs: Vec<(String, V)> = Vec::new();
            while let Some(entry) = access.next_entry()? {
                pairs.push(entry);
            }
            Mapping::from_pairs(pairs).map_err(A::Error::custom)
        }
    }

}

pub mod projection {

    //! Mappings projected from sequences.

    use super::error::{Error, Result};
    use super::key::Key;
    use super::kind::Projected;
    use super::mapping::Mapping;
    use super::sequence::Sequence;
    use indexmap::IndexMap;

    /// A mapping whose keys came from a key generator
    /// run over the elements of a [`Sequence`].
    ///
    /// It has every operation of [`Mapping`],
    /// and its transforms stay projections.
    pub type HashProjection<V> = Mapping<V, Projected>;

    impl<V: Clone> Sequence<V> {
        /// Keys each element by `generate(element)`.
        ///
        /// When two elements generate the same key,
        /// the later element’s value is stored under it,
        /// at the position where the key first appeared.
        ///
        /// # Errors
        ///
        /// [`Error::InvalidProjection`] if a generated key is
        /// empty.
        ///
        /// ```
        /// use typed_containers::prelude::*;
        ///
        /// let letters = Sequence::from(vec!["x", "y"]);
        /// let projected = letters.to_hashmap(|_| "k").unwrap();
        ///
        /// assert_eq!(projected.len(), 1);
        /// assert_eq!(projected.get("k").unwrap(), &"y");
        /// ```
        pub fn to_hashmap<S, G>(
            &self,
            mut generate: G,
        ) -> Result<HashProjection<V>>
        where
            S: Into<String>,
            G: FnMut(&V) -> S,
        {
            let mut own = IndexMap::with_capacity(self.as_slice().len());
            for (position, value) in self.iter().enumerate() {
                let key = Key::new(generate(value)).map_err(|_| {
                    tracing::debug!(
                        position,
                        "key generator produced an empty key"
                    );
                    Error::InvalidProjection { position }
                })?;
                if own.contains_key(&key) {
                    tracing::trace!(
                        position,
                        %key,
                        "projected key collided; later element wins"
                    );
                }
                own.insert(key, value.clone());
            }
            Ok(Mapping::with_store(own))
        }
    }
}

pub mod prelude {

    //! Everything needed to work with containers.

    pub use super::compare::NaturalOrd;
    pub use super::container::Container;
    pub use super::error::{Error, Result};
    pub use super::key::Key;
    pub use super::mapping::Mapping;
    pub use super::projection::HashProjection;
    pub use super::sequence::Sequence;
}

pub use container::Container;
pub use error::{Error, Result, Violation};
pub use key::Key;
pub use mapping::Mapping;
pub use projection::HashProjection;
pub use sequence::Sequence;

#[cfg(test)]
mod tests {

    use super::compare::natural_str_cmp;
    use super::prelude::*;
    use super::Violation;
    use core::cmp::Ordering;
    use serde::{Deserialize, Serialize};
    use test_case::test_case;
    use tracing_test::traced_test;

    fn map<V>(pairs: Vec<(&str, V)>) -> Mapping<V> {
        Mapping::new(pairs).unwrap()
    }

    fn seq<V>(values: Vec<V>) -> Sequence<V> {
        Sequence::from(values)
    }

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    struct Line {
        key: String,
        value: i32,
    }

    fn line(key: &str, value: i32) -> Line {
        Line {
            key: key.to_string(),
            value,
        }
    }

    #[test_case("a2", "a10", Ordering::Less ; "digit runs by magnitude")]
    #[test_case("a10", "a2", Ordering::Greater ; "reversed")]
    #[test_case("x", "x", Ordering::Equal ; "identical")]
    #[test_case("", "a", Ordering::Less ; "empty first")]
    #[test_case("a07", "a7", Ordering::Greater ; "leading zeros last")]
    #[test_case("B", "a", Ordering::Less ; "code point order")]
    #[test_case("v1.10", "v1.9", Ordering::Greater ; "several runs")]
    fn natural_order(a: &str, b: &str, expected: Ordering) {
        assert_eq!(natural_str_cmp(a, b), expected);
    }

    #[test]
    fn get_fails_but_at_does_not() {
        let pair = seq(vec![10, 20]);
        assert_eq!(pair.at(5), None);
        assert_eq!(pair.at(1), Some(&20));
        assert!(matches!(pair.get(&5), Err(Error::KeyNotFound(k)) if k == "5"));
        assert_eq!(pair.get(&0).unwrap(), &10);
        assert!(pair.has(&1));
        assert!(!pair.has(&2));
    }

    #[test]
    fn add_appends_one() {
        let s = seq(vec!["a", "b"]);
        let t = s.add("c");
        assert_eq!(t.len(), 3);
        assert_eq!(t.at(2), Some(&"c"));
        assert_eq!(s.to_native(), ["a", "b"]);
    }

    #[test]
    fn sequence_merge_concatenates() {
        let a = seq(vec![1, 2]);
        let b = seq(vec![3]);
        let c = seq(vec![4, 5]);
        assert_eq!(a.merge([&b, &c]).into_vec(), [1, 2, 3, 4, 5]);
        assert_eq!(a.merge([]).into_vec(), [1, 2]);
    }

    #[test]
    fn filter_and_remove_reindex() {
        let s = seq(vec![1, 2, 3, 2, 4]);
        let odd = s.filter(|v| v % 2 == 1);
        assert_eq!(odd.to_native(), [1, 3]);
        assert_eq!(odd.keys().into_vec(), [0, 1]);

        let without = s.remove(&2);
        assert_eq!(without.to_native(), [1, 3, 4]);
        assert_eq!(without.get(&2).unwrap(), &4);

        let loose = seq(vec![1.0, 2.5, 1.2]);
        let trimmed =
            loose.remove_by(&1.1, |a: &f64, b: &f64| {
                if (a - b).abs() < 0.2 {
                    Ordering::Equal
                } else {
                    a.total_cmp(b)
                }
            });
        assert_eq!(trimmed.to_native(), [2.5]);
    }

    #[test]
    fn sequence_sort() {
        let s = seq(vec!["file10", "file9", "file1"]);
        assert_eq!(s.sort().to_native(), ["file1", "file9", "file10"]);
        let reversed = s.sort_by(|a, b| b.cmp(a));
        assert_eq!(reversed.to_native(), ["file9", "file10", "file1"]);
        assert_eq!(s.at(0), Some(&"file10"));
    }

    #[test]
    fn sequence_diff_is_symmetric() {
        let a = seq(vec![1, 2, 3]);
        let b = seq(vec![2, 3, 4]);
        assert_eq!(a.diff(&b).to_native(), [1, 4]);
        assert_eq!(b.diff(&a).to_native(), [4, 1]);
    }

    #[test]
    fn sequence_diff_by_comparator() {
        let a = seq(vec!["A", "b"]);
        let b = seq(vec!["a", "c"]);
        let folded = a.diff_by(&b, |x, y| {
            x.to_lowercase().cmp(&y.to_lowercase())
        });
        assert_eq!(folded.to_native(), ["b", "c"]);
    }

    #[test]
    fn sequence_intersect_keeps_own_order() {
        let a = seq(vec![5, 1, 3, 1]);
        let b = seq(vec![1, 5]);
        assert_eq!(a.intersect(&b).to_native(), [5, 1, 1]);
        let parity = a.intersect_by(&seq(vec![2]), |x, y| {
            (x % 2).cmp(&(y % 2))
        });
        assert!(parity.is_empty());
    }

    #[test]
    fn sequence_map_changes_type() {
        let s = seq(vec![1, 2, 3]);
        let words = s.map(|n| format!("#{n}"));
        assert_eq!(words.to_native(), ["#1", "#2", "#3"]);
    }

    #[test]
    fn unify_keeps_first_occurrence() {
        let s = seq(vec!["a", "b", "a"]);
        assert_eq!(s.unify().unwrap().to_native(), ["a", "b"]);
        assert_eq!(s.unify_by(|v| v.to_string()).to_native(), ["a", "b"]);
    }

    #[test]
    fn unify_uses_structure_by_default() {
        let s = seq(vec![line("x", 1), line("y", 2), line("x", 1)]);
        let unique = s.unify().unwrap();
        assert_eq!(unique.to_native(), [line("x", 1), line("y", 2)]);
    }

    #[test]
    fn unify_folds_with_combiner() {
        let s = seq(vec![
            line("x", 1),
            line("y", 10),
            line("x", 2),
            line("x", 3),
        ]);
        let folded = s.unify_by_with(
            |l| l.key.clone(),
            |retained, incoming| {
                line(&retained.key, retained.value + incoming.value)
            },
        );
        assert_eq!(folded.to_native(), [line("x", 6), line("y", 10)]);
    }

    #[test]
    fn unify_with_default_identifier_folds_duplicates() {
        let s = seq(vec![1, 2, 1, 1]);
        let counted = s.unify_with(|retained, incoming| retained + incoming);
        assert_eq!(counted.unwrap().to_native(), [3, 2]);
    }

    #[test]
    fn to_hashmap_last_write_wins() {
        let s = seq(vec!["x", "y"]);
        let projected = s.to_hashmap(|_| "k").unwrap();
        assert_eq!(projected.len(), 1);
        assert_eq!(projected.get("k").unwrap(), &"y");
    }

    #[test]
    fn to_hashmap_rejects_empty_keys() {
        let s = seq(vec!["a", "", "c"]);
        let result = s.to_hashmap(|v| v.to_string());
        assert!(matches!(
            result,
            Err(Error::InvalidProjection { position: 1 })
        ));
    }

    #[test]
    fn to_hashmap_keeps_integer_like_keys_as_strings() {
        let s = seq(vec![7, 8]);
        let projected = s.to_hashmap(|v| format!("{}", v * 100)).unwrap();
        assert_eq!(projected.keys().to_native(), ["700", "800"]);
        assert_eq!(projected.get("700").unwrap(), &7);
    }

    #[traced_test]
    #[test]
    fn to_hashmap_logs_collisions() {
        let s = seq(vec![1, 2]);
        let projected = s.to_hashmap(|_| "same").unwrap();
        assert_eq!(projected.get("same").unwrap(), &2);
        assert!(logs_contain("later element wins"));
    }

    #[test]
    fn projection_keeps_mapping_algebra() {
        let s = seq(vec![line("a", 1), line("b", 2), line("c", 3)]);
        let projected = s.to_hashmap(|l| l.key.clone()).unwrap();
        let big: HashProjection<Line> = projected.filter(|l, _| l.value > 1);
        assert_eq!(big.keys().to_native(), ["b", "c"]);
        let plain = map(vec![("b", line("b", 2))]);
        assert_eq!(big.diff_keys(&plain).keys().to_native(), ["c"]);
    }

    #[test_case(0, 2, vec![9, 9, 3] ; "overwrite from start")]
    #[test_case(2, 2, vec![1, 2, 9, 9] ; "overwrite then extend")]
    #[test_case(3, 2, vec![1, 2, 3, 9, 9] ; "append at end")]
    #[test_case(1, 0, vec![1, 2, 3] ; "nothing to write")]
    fn fill_allowed_starts(start: usize, amount: usize, expected: Vec<i32>) {
        let s = seq(vec![1, 2, 3]);
        assert_eq!(s.fill(start, amount, 9).unwrap().into_vec(), expected);
    }

    #[test]
    fn fill_rejects_gaps() {
        let s = seq(vec![1, 2, 3]);
        assert!(matches!(
            s.fill(5, 2, 0),
            Err(Error::InvalidRange { start: 5, len: 3 })
        ));
        assert!(matches!(
            s.fill(4, 0, 0),
            Err(Error::InvalidRange { .. })
        ));
    }

    #[test]
    fn fill_with_generator_gets_indices() {
        let s: Sequence<usize> = Sequence::empty();
        let squares = s.fill_with(0, 4, |i| i * i).unwrap();
        assert_eq!(squares.into_vec(), [0, 1, 4, 9]);
    }

    #[test]
    fn from_indexed_requires_contiguity() {
        let ok = Sequence::from_indexed([(0, 'a'), (1, 'b')]).unwrap();
        assert_eq!(ok.to_native(), ['a', 'b']);

        let gap = Sequence::from_indexed([(0, 'a'), (2, 'b')]);
        assert!(matches!(
            gap,
            Err(Error::InvalidConstruction(Violation::IndexGap {
                expected: 1,
                found: 2
            }))
        ));
        assert!(Sequence::from_indexed([(1, 'a')]).is_err());
    }

    #[test]
    fn mapping_construction_is_validated() {
        assert!(matches!(
            Mapping::new([("a", 1), ("a", 2)]),
            Err(Error::InvalidConstruction(Violation::DuplicateKey(k)))
                if k == "a"
        ));
        assert!(matches!(
            Mapping::new([("", 1)]),
            Err(Error::InvalidConstruction(Violation::EmptyKey))
        ));
        assert!(map(vec![("a", 1)]).put("", 2).is_err());
    }

    #[test]
    fn mapping_get_and_has() {
        let m = map(vec![("a", 1)]);
        assert_eq!(m.get("a").unwrap(), &1);
        assert!(m.has("a"));
        assert!(!m.has("b"));
        assert!(matches!(m.get("b"), Err(Error::KeyNotFound(k)) if k == "b"));
    }

    #[test]
    fn put_overwrites_in_place() {
        let m = map(vec![("a", 1), ("b", 2)]);
        let n = m.put("a", 9).unwrap().put("c", 3).unwrap();
        assert_eq!(n, map(vec![("a", 9), ("b", 2), ("c", 3)]));
        assert_eq!(m.get("a").unwrap(), &1);
    }

    #[test]
    fn mapping_merge_is_right_biased() {
        let a = map(vec![("a", 1), ("b", 2)]);
        let b = map(vec![("b", 3), ("c", 4)]);
        let c = map(vec![("a", 5)]);
        assert_eq!(a.merge([&b]), map(vec![("a", 1), ("b", 3), ("c", 4)]));
        assert_eq!(
            a.merge([&b, &c]),
            map(vec![("a", 5), ("b", 3), ("c", 4)])
        );
    }

    #[test]
    fn mapping_sort_reorders_only() {
        let m = map(vec![("x", "img12"), ("y", "img10"), ("z", "img2")]);
        let sorted = m.sort();
        assert_eq!(sorted.keys().to_native(), ["z", "y", "x"]);
        assert_eq!(sorted.get("x").unwrap(), &"img12");
        let by_length = m.sort_by(|a, b| b.len().cmp(&a.len()));
        assert_eq!(by_length.keys().to_native(), ["x", "y", "z"]);
    }

    #[test]
    fn diff_keys_concatenates_exclusive_entries() {
        let a = map(vec![("a", 1), ("b", 2)]);
        let b = map(vec![("b", 20), ("c", 30)]);
        assert_eq!(a.diff_keys(&b), map(vec![("a", 1), ("c", 30)]));

        let upper = map(vec![("B", 5)]);
        let folded = a.diff_keys_by(&upper, |x, y| {
            x.to_lowercase().cmp(&y.to_lowercase())
        });
        assert_eq!(folded, map(vec![("a", 1)]));
    }

    #[test]
    fn diff_compares_values_not_keys() {
        let a = map(vec![("a", 1), ("b", 2)]);
        let b = map(vec![("x", 2), ("y", 3)]);
        assert_eq!(a.diff(&b), map(vec![("a", 1), ("y", 3)]));
    }

    #[test]
    fn diff_collision_takes_other_value() {
        let a = map(vec![("k", 1)]);
        let b = map(vec![("k", 2)]);
        assert_eq!(a.diff(&b), map(vec![("k", 2)]));
    }

    #[test]
    fn intersections() {
        let a = map(vec![("a", 1), ("b", 2), ("c", 3)]);
        let b = map(vec![("a", 2), ("c", 3), ("d", 1)]);

        let by_value = a.intersect(&b);
        assert_eq!(by_value, a);
        assert_eq!(a.intersect_assoc(&b), by_value);

        assert_eq!(
            a.intersect_using_keys(&b),
            map(vec![("a", 1), ("c", 3)])
        );
        assert_eq!(a.intersect_user_assoc(&b), map(vec![("c", 3)]));
    }

    #[test]
    fn intersections_by_comparators() {
        let a = map(vec![("A", 10), ("b", 21)]);
        let b = map(vec![("a", 11), ("B", 40)]);
        let by_key = |x: &str, y: &str| {
            x.to_lowercase().cmp(&y.to_lowercase())
        };
        let by_tens = |x: &i32, y: &i32| (x / 10).cmp(&(y / 10));

        assert_eq!(a.intersect_by(&b, by_tens), map(vec![("A", 10)]));
        assert_eq!(a.intersect_assoc_by(&b, by_tens), map(vec![("A", 10)]));
        assert_eq!(a.intersect_using_keys_by(&b, by_key), a);
        assert_eq!(
            a.intersect_user_assoc_by(&b, by_tens, by_key),
            map(vec![("A", 10)])
        );
    }

    #[test]
    fn mapping_filter_sees_keys() {
        let m = map(vec![("keep", 1), ("drop", 2), ("keep2", 3)]);
        let kept = m.filter(|_, key| key.starts_with("keep"));
        assert_eq!(kept.keys().to_native(), ["keep", "keep2"]);
    }

    #[test]
    fn mapping_removals() {
        let m = map(vec![("a", 1), ("b", 2), ("c", 1)]);
        assert_eq!(m.remove_element_by_key("b"), map(vec![("a", 1), ("c", 1)]));
        assert_eq!(m.remove_element_by_key("zz"), m);
        assert_eq!(m.remove_element(&1), map(vec![("b", 2)]));
    }

    #[test]
    fn mapping_map_keeps_keys() {
        let m = map(vec![("a", 1), ("b", 2)]);
        let labels: Mapping<String> = m.map(|v| v.to_string());
        assert_eq!(labels.keys().to_native(), ["a", "b"]);
        assert_eq!(labels.get("b").unwrap(), "2");
    }

    #[test]
    fn to_ordered_list_drops_keys() {
        let m = map(vec![("a", 3), ("b", 1), ("c", 2)]);
        assert_eq!(m.to_ordered_list().into_vec(), [3, 1, 2]);
        assert_eq!(m.to_ordered_list_by(Ord::cmp).into_vec(), [1, 2, 3]);
    }

    #[test]
    fn partition_splits_and_keeps_keys() {
        let m = map(vec![("a", 1), ("b", 2), ("c", 3)]);
        let (odd, even) = m.partition(|v| v % 2 == 1);
        assert_eq!(odd, map(vec![("a", 1), ("c", 3)]));
        assert_eq!(even, map(vec![("b", 2)]));
    }

    #[test]
    fn serde_round_trip() {
        let m = map(vec![("b", 2), ("a", 1)]);
        let encoded = serde_json::to_string(&m).unwrap();
        assert_eq!(encoded, r#"{"b":2,"a":1}"#);
        let decoded: Mapping<i32> = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded, m);

        let s = seq(vec![3, 1]);
        let encoded = serde_json::to_string(&s).unwrap();
        assert_eq!(encoded, "[3,1]");
        let decoded: Sequence<i32> = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded, s);

        assert!(serde_json::from_str::<Mapping<i32>>(r#"{"":1}"#).is_err());
    }

    #[test]
    #[traced_test]
    fn deserialize_rejects_repeated_keys() {
        let repeated = r#"{"a":1,"b":2,"a":3}"#;
        let error = serde_json::from_str::<Mapping<i32>>(repeated)
            .unwrap_err();
        assert!(error.to_string().contains("duplicate mapping key `a`"));
        assert!(logs_contain("rejected duplicate key"));
        assert!(
            serde_json::from_str::<HashProjection<i32>>(repeated).is_err()
        );

        let decoded: HashProjection<i32> =
            serde_json::from_str(r#"{"a":1,"b":2}"#).unwrap();
        assert_eq!(decoded, map(vec![("a", 1), ("b", 2)]));
    }

    #[test]
    fn error_messages() {
        let missing = map(vec![("a", 1)]).get("zz").unwrap_err();
        assert_eq!(
            missing.to_string(),
            "there is no value stored for provided key: zz"
        );
        let gap = seq(vec![1]).fill(3, 1, 0).unwrap_err();
        assert_eq!(
            gap.to_string(),
            "cannot fill from index 3 of a sequence of length 1"
        );
    }
}
