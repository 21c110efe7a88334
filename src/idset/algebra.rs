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

use super::model::{ExtendedId, GlobRange, Guid, RangeSet, Scope};
use crate::support::error::Error;

impl RangeSet {
    /// Remove every counter in `other` from this set.
    ///
    /// The scopes of the two sets are not compared; the caller is expected
    /// to have selected both for the same replica. Runs in time linear in
    /// the number of ranges of both sets.
    pub fn remove(&mut self, other: &RangeSet) {
        if self.ranges.is_empty() || other.ranges.is_empty() {
            return;
        }

        let subtract = &other.ranges;
        let mut out = Vec::with_capacity(self.ranges.len());
        let mut next_sub = 0;

        for range in &self.ranges {
            while next_sub < subtract.len()
                && subtract[next_sub].high < range.low
            {
                next_sub += 1;
            }

            // `low` is the start of the part of `range` not yet examined, or
            // `None` once everything up to `range.high` has been removed.
            let mut low = Some(range.low);
            let mut ix = next_sub;
            while let (Some(cur), Some(sub)) = (low, subtract.get(ix)) {
                if sub.low > range.high {
                    break;
                }

                if let Some(high) = sub.low.prev().filter(|&h| h >= cur) {
                    out.push(GlobRange { low: cur, high });
                }

                low = if sub.high < range.high {
                    sub.high.next()
                } else {
                    None
                };
                ix += 1;
            }

            if let Some(low) = low {
                out.push(GlobRange {
                    low,
                    high: range.high,
                });
            }
            // `next_sub` stays put; the last subtracted range may extend
            // into the next range of this set.
        }

        self.single = self.single && !out.is_empty();
        self.ranges = out;
    }

    /// Add every counter in `other` to this set.
    ///
    /// Both sets must belong to the same replica. On error, this set is left
    /// unchanged.
    pub fn merge(&mut self, other: &RangeSet) -> Result<(), Error> {
        if self.scope != other.scope {
            return Err(Error::InvalidArgument(
                "cannot merge sets of different replicas",
            ));
        }

        let (a, b) = (&self.ranges, &other.ranges);
        let mut merged: Vec<GlobRange> =
            Vec::with_capacity(a.len() + b.len());
        let (mut i, mut j) = (0, 0);
        while i < a.len() || j < b.len() {
            let take_a = j >= b.len() || (i < a.len() && a[i].low <= b[j].low);
            let next = if take_a {
                i += 1;
                a[i - 1]
            } else {
                j += 1;
                b[j - 1]
            };

            if let Some(last) = merged.last_mut() {
                if next.low.get() <= last.high.get() + 1 {
                    last.high = last.high.max(next.high);
                    continue;
                }
            }

            merged.push(next);
        }

        self.single = self.single && merged == self.ranges;
        self.ranges = merged;
        Ok(())
    }

    /// Return whether the counter of `id` is in this set and this set is
    /// scoped to `repl_guid`.
    ///
    /// Sets scoped by replica id never include anything by GUID; this
    /// returns `false` for them rather than failing.
    pub fn includes(&self, repl_guid: &Guid, id: ExtendedId) -> bool {
        match self.scope {
            Scope::ByGuid(ref guid) => {
                guid == repl_guid && self.contains(id.glob_cnt())
            },
            Scope::ById(_) => false,
        }
    }

    /// Return whether `id` is in this set, matching both its replica id and
    /// its counter.
    ///
    /// Always `false` for sets scoped by GUID.
    pub fn includes_eid(&self, id: ExtendedId) -> bool {
        match self.scope {
            Scope::ById(repl_id) => {
                repl_id == id.repl_id() && self.contains(id.glob_cnt())
            },
            Scope::ByGuid(_) => false,
        }
    }
}
