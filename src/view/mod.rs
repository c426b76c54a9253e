/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! The lazy, composable collection algebra (§4.1): concatenation, set
//! difference, Cartesian product, zip, reorder, and the materialize-by-reference
//! constructors, plus the parallel short-circuit drivers (`view::parallel`).
//!
//! Combinators hold their operands as `Arc<dyn View<Item = T>>` rather than
//! fully generic type parameters: `breakdown` (§4.4) composes `Concat`/`Difference`
//! arbitrarily deeply across recursive `sub_prove` calls, and monomorphizing
//! every such composition would reproduce exactly the compile-time blowup the
//! source's own design notes warn against (§9, "Polymorphism over views").

pub mod parallel;

use crate::error::ProverError;
use std::marker::PhantomData;
use std::sync::Arc;

/// A lazy, index-addressable, size-known projection of underlying data (§4.1).
///
/// No enumeration happens until something indexes into a view or runs a
/// parallel driver over it.
pub trait View: Send + Sync {
    /// The item produced by indexing into this view. Cheaply cloneable (views
    /// cross thread boundaries for the parallel driver), never borrowed.
    type Item: Clone + Send + Sync;

    /// The number of addressable positions, `[0, size)`.
    fn size(&self) -> usize;

    /// Random access. Indices outside `[0, size)` fail with [`ProverError::Index`].
    ///
    /// # Errors
    /// Returns [`ProverError::Index`] if `index >= self.size()`.
    fn get(&self, index: usize) -> Result<Self::Item, ProverError>;
}

/// Shorthand for a type-erased, thread-shareable view.
pub type DynView<T> = Arc<dyn View<Item = T>>;

/// Multiplicity of `target` in `view` under a caller-supplied equality
/// predicate (pointer-identity by default throughout this crate, §4.1).
pub fn count<T, Eq>(view: &dyn View<Item = T>, target: &T, eq: Eq) -> usize
where
    T: Clone + Send + Sync,
    Eq: Fn(&T, &T) -> bool,
{
    (0..view.size())
        .filter(|&i| {
            let item = view.get(i).expect("index within bounds by construction");
            eq(&item, target)
        })
        .count()
}

/// Pointer-identity equality for `Arc<T>`, the default comparator used
/// throughout the proof engine for `count`/`Difference`.
#[must_use]
pub fn ptr_eq<T>(a: &Arc<T>, b: &Arc<T>) -> bool {
    Arc::ptr_eq(a, b)
}

/// Materialize a view's elements into a plain `Vec`, in index order.
///
/// # Errors
/// Propagates any [`ProverError`] from indexing (never happens for a
/// correctly-constructed view, since indices `0..size` are always in bounds).
pub fn to_vec<T: Clone + Send + Sync>(view: &dyn View<Item = T>) -> Result<Vec<T>, ProverError> {
    (0..view.size()).map(|i| view.get(i)).collect()
}

/// The empty view: `size = 0`, every index fails.
pub struct Empty<T>(PhantomData<fn() -> T>);

impl<T> Empty<T> {
    /// Build an empty view.
    #[must_use]
    pub fn new() -> Self {
        Self(PhantomData)
    }
}

impl<T> Default for Empty<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + Send + Sync> View for Empty<T> {
    type Item = T;
    fn size(&self) -> usize {
        0
    }
    fn get(&self, index: usize) -> Result<Self::Item, ProverError> {
        Err(ProverError::Index {
            index,
            size: 0,
            context: "Empty",
        })
    }
}

// SAFETY-free: `Empty<T>` holds no `T`, only a function-pointer-shaped
// `PhantomData`, so it is `Send + Sync` regardless of `T`.
unsafe impl<T> Send for Empty<T> {}
unsafe impl<T> Sync for Empty<T> {}

/// A view over exactly one element.
pub struct Singleton<T>(T);

impl<T> Singleton<T> {
    /// Build a view over exactly `item`.
    #[must_use]
    pub fn new(item: T) -> Self {
        Self(item)
    }
}

impl<T: Clone + Send + Sync> View for Singleton<T> {
    type Item = T;
    fn size(&self) -> usize {
        1
    }
    fn get(&self, index: usize) -> Result<Self::Item, ProverError> {
        if index == 0 {
            Ok(self.0.clone())
        } else {
            Err(ProverError::Index {
                index,
                size: 1,
                context: "Singleton",
            })
        }
    }
}

/// A view forwarding to an underlying view by reference, without copying it.
/// Distinguished from [`Unfold`], which eagerly materializes a stable pointer
/// array; `Shadow` is purely a cheap alias.
pub struct Shadow<T>(DynView<T>);

impl<T> Shadow<T> {
    /// Wrap an existing view, forwarding `size`/`get` without materializing anything.
    #[must_use]
    pub fn new(inner: DynView<T>) -> Self {
        Self(inner)
    }
}

impl<T: Clone + Send + Sync> View for Shadow<T> {
    type Item = T;
    fn size(&self) -> usize {
        self.0.size()
    }
    fn get(&self, index: usize) -> Result<Self::Item, ProverError> {
        self.0.get(index)
    }
}

/// A view that eagerly materializes an underlying view's elements into a
/// stable array of handles, so later reads never re-traverse the source view.
pub struct Unfold<T>(Vec<T>);

impl<T: Clone + Send + Sync> Unfold<T> {
    /// Materialize `inner` eagerly.
    ///
    /// # Errors
    /// Propagates any error from indexing `inner` (never happens for a
    /// well-formed view).
    pub fn from_view(inner: &dyn View<Item = T>) -> Result<Self, ProverError> {
        Ok(Self(to_vec(inner)?))
    }

    /// Materialize a plain `Vec` directly (no intermediate view needed).
    #[must_use]
    pub fn from_vec(items: Vec<T>) -> Self {
        Self(items)
    }
}

impl<T: Clone + Send + Sync> View for Unfold<T> {
    type Item = T;
    fn size(&self) -> usize {
        self.0.len()
    }
    fn get(&self, index: usize) -> Result<Self::Item, ProverError> {
        self.0.get(index).cloned().ok_or(ProverError::Index {
            index,
            size: self.0.len(),
            context: "Unfold",
        })
    }
}

/// `A` followed by `B`.
pub struct Concat<T> {
    left: DynView<T>,
    right: DynView<T>,
}

impl<T> Concat<T> {
    /// Build the concatenation of `left` and `right`.
    #[must_use]
    pub fn new(left: DynView<T>, right: DynView<T>) -> Self {
        Self { left, right }
    }
}

impl<T: Clone + Send + Sync> View for Concat<T> {
    type Item = T;
    fn size(&self) -> usize {
        self.left.size() + self.right.size()
    }
    fn get(&self, index: usize) -> Result<Self::Item, ProverError> {
        let a = self.left.size();
        if index < a {
            self.left.get(index)
        } else {
            self.right.get(index - a).map_err(|_| ProverError::Index {
                index,
                size: self.size(),
                context: "Concat",
            })
        }
    }
}

/// Elements of `left` whose value does not appear (under `eq`) in `right`.
pub struct Difference<T> {
    kept: Vec<T>,
}

impl<T: Clone + Send + Sync> Difference<T> {
    /// Build `left − right` under equality predicate `eq` (pointer-identity by
    /// convention elsewhere in this crate, but any predicate is accepted).
    ///
    /// # Errors
    /// Propagates any error from indexing `left`/`right`.
    pub fn new(
        left: &dyn View<Item = T>,
        right: &dyn View<Item = T>,
        eq: impl Fn(&T, &T) -> bool,
    ) -> Result<Self, ProverError> {
        let right_items = to_vec(right)?;
        let mut kept = Vec::new();
        for i in 0..left.size() {
            let item = left.get(i)?;
            if !right_items.iter().any(|r| eq(&item, r)) {
                kept.push(item);
            }
        }
        Ok(Self { kept })
    }
}

impl<T: Clone + Send + Sync> View for Difference<T> {
    type Item = T;
    fn size(&self) -> usize {
        self.kept.len()
    }
    fn get(&self, index: usize) -> Result<Self::Item, ProverError> {
        self.kept.get(index).cloned().ok_or(ProverError::Index {
            index,
            size: self.kept.len(),
            context: "Difference",
        })
    }
}

/// Ordered pairs `(A[i], B[j])` for every `i` in `A`, `j` in `B`.
pub struct Cartesian<A, B> {
    left: DynView<A>,
    right: DynView<B>,
}

impl<A, B> Cartesian<A, B> {
    /// Build the Cartesian product of `left` and `right`.
    #[must_use]
    pub fn new(left: DynView<A>, right: DynView<B>) -> Self {
        Self { left, right }
    }
}

impl<A: Clone + Send + Sync, B: Clone + Send + Sync> View for Cartesian<A, B> {
    type Item = (A, B);
    fn size(&self) -> usize {
        self.left.size() * self.right.size()
    }
    fn get(&self, index: usize) -> Result<Self::Item, ProverError> {
        let a_size = self.left.size();
        if a_size == 0 || index >= self.size() {
            return Err(ProverError::Index {
                index,
                size: self.size(),
                context: "Cartesian",
            });
        }
        let i = index % a_size;
        let j = index / a_size;
        Ok((self.left.get(i)?, self.right.get(j)?))
    }
}

/// Pairwise `(A[i], B[i])`; `A` and `B` must have equal size.
pub struct Zip<A, B> {
    left: DynView<A>,
    right: DynView<B>,
}

impl<A, B> Zip<A, B> {
    /// Build the zip of `left` and `right`.
    ///
    /// # Errors
    /// Returns [`ProverError::Iterator`] if `left.size() != right.size()`.
    pub fn new(left: DynView<A>, right: DynView<B>) -> Result<Self, ProverError> {
        if left.size() != right.size() {
            return Err(ProverError::Iterator {
                left: left.size(),
                right: right.size(),
                context: "Zip",
            });
        }
        Ok(Self { left, right })
    }
}

impl<A: Clone + Send + Sync, B: Clone + Send + Sync> View for Zip<A, B> {
    type Item = (A, B);
    fn size(&self) -> usize {
        self.left.size()
    }
    fn get(&self, index: usize) -> Result<Self::Item, ProverError> {
        Ok((self.left.get(index)?, self.right.get(index)?))
    }
}

/// `C` under a stable permutation sorted ascending by `key`.
pub struct Reorder<T> {
    inner: DynView<T>,
    permutation: Vec<usize>,
}

impl<T: Clone + Send + Sync> Reorder<T> {
    /// Sort `inner` ascending by `key`, keeping every element (stable: ties
    /// keep their original relative order).
    ///
    /// # Errors
    /// Propagates any error from indexing `inner`.
    pub fn new(inner: DynView<T>, key: impl Fn(&T) -> f64) -> Result<Self, ProverError> {
        let items = to_vec(inner.as_ref())?;
        let mut permutation: Vec<usize> = (0..items.len()).collect();
        permutation.sort_by(|&a, &b| {
            key(&items[a])
                .partial_cmp(&key(&items[b]))
                .unwrap_or(core::cmp::Ordering::Equal)
        });
        Ok(Self { inner, permutation })
    }
}

impl<T: Clone + Send + Sync> View for Reorder<T> {
    type Item = T;
    fn size(&self) -> usize {
        self.permutation.len()
    }
    fn get(&self, index: usize) -> Result<Self::Item, ProverError> {
        let original = *self.permutation.get(index).ok_or(ProverError::Index {
            index,
            size: self.permutation.len(),
            context: "Reorder",
        })?;
        self.inner.get(original)
    }
}

/// As [`Reorder`], but keeping exactly one element per distinct key value
/// (earliest original index wins).
pub struct ReorderUnique<T> {
    inner: DynView<T>,
    kept_indices: Vec<usize>,
}

impl<T: Clone + Send + Sync> ReorderUnique<T> {
    /// Sort `inner` ascending by `key`, deduplicating by key.
    ///
    /// # Errors
    /// Propagates any error from indexing `inner`.
    pub fn new(inner: DynView<T>, key: impl Fn(&T) -> f64) -> Result<Self, ProverError> {
        let items = to_vec(inner.as_ref())?;
        let mut order: Vec<usize> = (0..items.len()).collect();
        order.sort_by(|&a, &b| {
            key(&items[a])
                .partial_cmp(&key(&items[b]))
                .unwrap_or(core::cmp::Ordering::Equal)
        });
        let mut kept_indices = Vec::new();
        let mut last_key: Option<f64> = None;
        for idx in order {
            let k = key(&items[idx]);
            let is_new = match last_key {
                Some(prev) => (prev - k).abs() > f64::EPSILON,
                None => true,
            };
            if is_new {
                kept_indices.push(idx);
                last_key = Some(k);
            }
        }
        Ok(Self {
            inner,
            kept_indices,
        })
    }
}

impl<T: Clone + Send + Sync> View for ReorderUnique<T> {
    type Item = T;
    fn size(&self) -> usize {
        self.kept_indices.len()
    }
    fn get(&self, index: usize) -> Result<Self::Item, ProverError> {
        let original = *self.kept_indices.get(index).ok_or(ProverError::Index {
            index,
            size: self.kept_indices.len(),
            context: "ReorderUnique",
        })?;
        self.inner.get(original)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view_of(items: &[i32]) -> DynView<i32> {
        Arc::new(Unfold::from_vec(items.to_vec()))
    }

    #[test]
    fn indexing_out_of_range_fails_with_index_error() {
        let v = view_of(&[1, 2, 3]);
        assert!(matches!(v.get(3), Err(ProverError::Index { .. })));
    }

    #[test]
    fn concat_size_is_sum() {
        let a = view_of(&[1, 2]);
        let b = view_of(&[3, 4, 5]);
        let c = Concat::new(a, b);
        assert_eq!(c.size(), 5);
        assert_eq!(to_vec(&c).unwrap(), vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn cartesian_size_is_product() {
        let a = view_of(&[1, 2]);
        let b = view_of(&[10, 20, 30]);
        let c = Cartesian::new(a, b);
        assert_eq!(c.size(), 6);
        assert_eq!(c.get(0).unwrap(), (1, 10));
        assert_eq!(c.get(1).unwrap(), (2, 10));
        assert_eq!(c.get(2).unwrap(), (1, 20));
    }

    #[test]
    fn zip_requires_equal_sizes() {
        let a = view_of(&[1, 2]);
        let b = view_of(&[10, 20, 30]);
        assert!(matches!(
            Zip::new(a, b),
            Err(ProverError::Iterator { .. })
        ));
    }

    #[test]
    fn zip_pairs_elementwise() {
        let a = view_of(&[1, 2, 3]);
        let b = view_of(&[10, 20, 30]);
        let z = Zip::new(a, b).unwrap();
        assert_eq!(to_vec(&z).unwrap(), vec![(1, 10), (2, 20), (3, 30)]);
    }

    #[test]
    fn difference_removes_matching_elements() {
        let a = view_of(&[1, 2, 3, 4]);
        let b = view_of(&[2, 4]);
        let d = Difference::new(a.as_ref(), b.as_ref(), |x, y| x == y).unwrap();
        assert_eq!(d.size(), 2);
        assert_eq!(to_vec(&d).unwrap(), vec![1, 3]);
    }

    #[test]
    fn difference_of_disjoint_sets_preserves_size() {
        let a = view_of(&[1, 2, 3]);
        let b = view_of(&[9, 10]);
        let d = Difference::new(a.as_ref(), b.as_ref(), |x, y| x == y).unwrap();
        assert_eq!(d.size(), a.size());
    }

    #[test]
    fn sort_is_non_decreasing() {
        let a = view_of(&[3, 1, 2]);
        let sorted = Reorder::new(a, |&x| f64::from(x)).unwrap();
        let items = to_vec(&sorted).unwrap();
        assert!(items.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn sort_unique_is_strictly_increasing_and_deduplicated() {
        let a = view_of(&[3, 1, 2, 1, 3]);
        let sorted = ReorderUnique::new(a, |&x| f64::from(x)).unwrap();
        let items = to_vec(&sorted).unwrap();
        assert_eq!(items, vec![1, 2, 3]);
        assert!(items.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn sort_then_sort_is_idempotent_on_order() {
        let a = view_of(&[3, 1, 2]);
        let once = Reorder::new(Arc::clone(&a), |&x| f64::from(x)).unwrap();
        let once_items = to_vec(&once).unwrap();
        let twice = Reorder::new(Arc::new(Unfold::from_vec(once_items.clone())), |&x| {
            f64::from(x)
        })
        .unwrap();
        assert_eq!(once_items, to_vec(&twice).unwrap());
    }

    #[test]
    fn count_uses_supplied_predicate() {
        let a = view_of(&[1, 2, 1, 3, 1]);
        assert_eq!(count(a.as_ref(), &1, |x, y| x == y), 3);
    }
}
