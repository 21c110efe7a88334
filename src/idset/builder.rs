//-
// Copyright (c) 2026, The Mapisync Authors
//
// This file is part of Mapisync.
//
// Mapisync is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free
// Software Foundation, either version 3 of the License, or (at your option)
// any later version.
//
// Mapisync is distributed in the hope that it will be useful, but WITHOUT ANY
// WARRANTY; without  even the implied  warranty of MERCHANTABILITY  or FITNESS
// FOR  A PARTICULAR  PURPOSE.  See the  GNU General  Public  License for  more
// details.
//
// You should have received a copy of the GNU General Public License along with
// Mapisync. If not, see <http://www.gnu.org/licenses/>.

use super::model::{ExtendedId, GlobCnt, GlobRange, RangeSet, Scope};

/// Accumulates raw ids discovered in arbitrary order and turns them into a
/// `RangeSet`.
///
/// Pushing is just an append; all sorting and merging happens once, in
/// `into_range_set`. This matters for synchronization walks, which can
/// discover tens of thousands of ids in folder order.
///
/// The replica a pushed id belongs to is decided by the scope the builder was
/// created with. The replica component of pushed `ExtendedId`s is not
/// consulted, so the caller must only push ids it has already attributed to
/// that replica.
#[derive(Clone, Debug)]
pub struct RangeBuilder {
    scope: Scope,
    accept_single: bool,
    globs: Vec<GlobCnt>,
}

impl RangeBuilder {
    /// Create a new, empty builder.
    ///
    /// If `accept_single` is true, a builder which ends up holding exactly
    /// one distinct counter produces a set marked `is_single()`.
    pub fn new(scope: Scope, accept_single: bool) -> Self {
        RangeBuilder {
            scope,
            accept_single,
            globs: Vec::new(),
        }
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    pub fn push(&mut self, id: ExtendedId) {
        self.globs.push(id.glob_cnt());
    }

    pub fn push_glob(&mut self, glob: GlobCnt) {
        self.globs.push(glob);
    }

    /// Return the number of pushes so far, counting duplicates.
    pub fn len(&self) -> usize {
        self.globs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.globs.is_empty()
    }

    /// Discard everything pushed so far, keeping scope and allocation.
    pub fn clear(&mut self) {
        self.globs.clear();
    }

    /// Build the minimal `RangeSet` holding every pushed counter.
    ///
    /// The builder is left empty and may be reused.
    pub fn take_range_set(&mut self) -> RangeSet {
        self.globs.sort_unstable();
        self.globs.dedup();

        let mut ranges: Vec<GlobRange> = Vec::new();
        for &glob in &self.globs {
            if let Some(last) = ranges.last_mut() {
                if last.high.next() == Some(glob) {
                    last.high = glob;
                    continue;
                }
            }

            ranges.push(GlobRange::just(glob));
        }

        let single = self.accept_single && 1 == self.globs.len();
        self.globs.clear();

        RangeSet {
            scope: self.scope,
            single,
            ranges,
        }
    }

    pub fn into_range_set(mut self) -> RangeSet {
        self.take_range_set()
    }
}

#[cfg(test)]
mod test {
    use proptest::prelude::*;

    use super::*;
    use crate::idset::model::{Guid, ReplId};

    fn by_id() -> Scope {
        Scope::ById(ReplId(1))
    }

    fn build(accept_single: bool, globs: &[u64]) -> RangeSet {
        let mut builder = RangeBuilder::new(by_id(), accept_single);
        for &glob in globs {
            builder.push(ExtendedId::new(GlobCnt::u(glob), ReplId(1)));
        }
        builder.into_range_set()
    }

    #[test]
    fn empty_builder() {
        let set = build(true, &[]);
        assert!(set.is_empty());
        assert!(!set.is_single());
        assert_eq!(&by_id(), set.scope());
    }

    #[test]
    fn single_value() {
        let set = build(true, &[42]);
        assert!(set.is_single());
        assert_eq!(&[GlobRange::u(42, 42)], set.ranges());

        let set = build(false, &[42]);
        assert!(!set.is_single());
        assert_eq!(&[GlobRange::u(42, 42)], set.ranges());

        // Duplicates still count as one id
        let set = build(true, &[42, 42, 42]);
        assert!(set.is_single());
        assert_eq!(1, set.range_count());
    }

    #[test]
    fn unordered_pushes_coalesce() {
        let set = build(true, &[9, 3, 1, 2, 10, 7, 2, 20, 8]);
        assert!(!set.is_single());
        assert_eq!(
            &[GlobRange::u(1, 3), GlobRange::u(7, 10), GlobRange::u(20, 20)],
            set.ranges()
        );
    }

    #[test]
    fn counter_bounds() {
        let max = GlobCnt::MAX.get();
        let set = build(false, &[0, max, max - 1]);
        assert_eq!(
            &[GlobRange::u(0, 0), GlobRange::u(max - 1, max)],
            set.ranges()
        );
    }

    #[test]
    fn builder_reuse() {
        let guid = Guid::random();
        let mut builder = RangeBuilder::new(Scope::ByGuid(guid), false);
        builder.push_glob(GlobCnt::u(5));
        builder.push_glob(GlobCnt::u(6));
        assert_eq!(2, builder.len());

        let first = builder.take_range_set();
        assert_eq!(&[GlobRange::u(5, 6)], first.ranges());
        assert_eq!(&guid, first.repl_guid().unwrap());
        assert!(builder.is_empty());

        builder.push_glob(GlobCnt::u(100));
        builder.clear();
        builder.push_glob(GlobCnt::u(7));
        assert_eq!(&[GlobRange::u(7, 7)], builder.take_range_set().ranges());
    }

    proptest! {
        #[test]
        fn any_permutation_of_a_run_is_one_range(
            (start, order) in (0u64..1 << 40, 1usize..64).prop_flat_map(
                |(start, len)| (
                    Just(start),
                    Just((0..len as u64).collect::<Vec<_>>()).prop_shuffle(),
                ))
        ) {
            let globs: Vec<u64> = order.iter().map(|&o| start + o).collect();
            let set = build(false, &globs);
            prop_assert_eq!(
                &[GlobRange::u(start, start + order.len() as u64 - 1)],
                set.ranges()
            );
        }

        #[test]
        fn builder_matches_sorted_dedup(
            globs in prop::collection::vec(0u64..200, 0..100)
        ) {
            let set = build(true, &globs);

            let mut expected = globs.clone();
            expected.sort();
            expected.dedup();

            let actual: Vec<u64> = set.items().map(GlobCnt::get).collect();
            prop_assert_eq!(&expected, &actual);
            prop_assert_eq!(1 == expected.len(), set.is_single());

            for pair in set.ranges().windows(2) {
                prop_assert!(pair[0].high.get() + 1 < pair[1].low.get());
            }
        }
    }
}
