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

use std::cmp::Ordering;
use std::convert::TryFrom;
use std::fmt;

use byteorder::{BigEndian, ByteOrder, LittleEndian};
use serde::{Deserialize, Deserializer, Serialize};

use crate::support::error::Error;

/// A 48-bit global counter.
///
/// Each replica assigns these sequentially to the folders, messages, and
/// changes it creates. They are the unit of every range in a `RangeSet`.
///
/// On the wire a `GlobCnt` is 6 bytes, most significant first, which is what
/// makes the common-prefix factoring of the GLOBSET encoding work.
#[derive(
    Deserialize,
    Serialize,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
)]
#[serde(try_from = "u64", into = "u64")]
pub struct GlobCnt(u64);

impl GlobCnt {
    pub const MIN: Self = GlobCnt(0);
    pub const MAX: Self = GlobCnt((1 << 48) - 1);

    /// Wrap `v`, which must fit in 48 bits.
    pub fn of(v: u64) -> Option<Self> {
        if v <= GlobCnt::MAX.0 {
            Some(GlobCnt(v))
        } else {
            None
        }
    }

    #[cfg(test)]
    pub fn u(v: u64) -> Self {
        GlobCnt::of(v).unwrap()
    }

    pub fn get(self) -> u64 {
        self.0
    }

    pub fn next(self) -> Option<Self> {
        GlobCnt::of(self.0 + 1)
    }

    pub fn prev(self) -> Option<Self> {
        self.0.checked_sub(1).map(GlobCnt)
    }

    pub fn from_bytes(bytes: &[u8; 6]) -> Self {
        GlobCnt(BigEndian::read_u48(bytes))
    }

    pub fn to_bytes(self) -> [u8; 6] {
        let mut bytes = [0u8; 6];
        BigEndian::write_u48(&mut bytes, self.0);
        bytes
    }
}

impl TryFrom<u64> for GlobCnt {
    type Error = &'static str;

    fn try_from(v: u64) -> Result<Self, Self::Error> {
        GlobCnt::of(v).ok_or("GlobCnt exceeds 48 bits")
    }
}

impl From<GlobCnt> for u64 {
    fn from(v: GlobCnt) -> u64 {
        v.0
    }
}

impl fmt::Debug for GlobCnt {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "GlobCnt({:#x})", self.0)
    }
}

impl fmt::Display for GlobCnt {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// The short numeric identifier of a replica, as used in folder and message
/// ids.
#[derive(
    Deserialize,
    Serialize,
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
)]
#[serde(transparent)]
pub struct ReplId(pub u16);

impl fmt::Display for ReplId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:#06x}", self.0)
    }
}

/// A replica GUID, held in its 16-byte wire form.
#[derive(
    Deserialize, Serialize, Clone, Copy, Default, PartialEq, Eq, Hash,
)]
#[serde(transparent)]
pub struct Guid(pub [u8; 16]);

impl Guid {
    /// Generate a new random GUID.
    pub fn random() -> Self {
        let mut bytes: [u8; 16] = rand::random();
        // Version 4, RFC 4122 variant. The version nibble lives in the
        // little-endian `data3` field.
        bytes[7] = (bytes[7] & 0x0f) | 0x40;
        bytes[8] = (bytes[8] & 0x3f) | 0x80;
        Guid(bytes)
    }

    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if 16 != bytes.len() {
            return None;
        }

        let mut guid = [0u8; 16];
        guid.copy_from_slice(bytes);
        Some(Guid(guid))
    }

    pub fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }
}

impl fmt::Display for Guid {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let b = &self.0;
        write!(
            f,
            "{:08x}-{:04x}-{:04x}-{:02x}{:02x}-",
            LittleEndian::read_u32(&b[0..4]),
            LittleEndian::read_u16(&b[4..6]),
            LittleEndian::read_u16(&b[6..8]),
            b[8],
            b[9],
        )?;
        for byte in &b[10..] {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Guid {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Guid({})", self)
    }
}

/// A folder or message id: a `GlobCnt` qualified by the `ReplId` of the
/// replica which allocated it.
///
/// The packed form is `(glob_cnt << 16) | repl_id`, which orders ids by
/// counter first. This is *not* the representation used inside protocol
/// structures; see `from_wire_u64`.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ExtendedId(u64);

impl ExtendedId {
    pub fn new(glob_cnt: GlobCnt, repl_id: ReplId) -> Self {
        ExtendedId((glob_cnt.0 << 16) | u64::from(repl_id.0))
    }

    pub fn from_packed(packed: u64) -> Self {
        ExtendedId(packed)
    }

    pub fn packed(self) -> u64 {
        self.0
    }

    pub fn glob_cnt(self) -> GlobCnt {
        GlobCnt(self.0 >> 16)
    }

    pub fn repl_id(self) -> ReplId {
        ReplId(self.0 as u16)
    }

    /// Decode the 8-byte wire form: the replica id, little-endian, followed
    /// by the global counter, big-endian.
    pub fn from_wire_bytes(bytes: &[u8; 8]) -> Self {
        ExtendedId::new(
            GlobCnt(BigEndian::read_u48(&bytes[2..])),
            ReplId(LittleEndian::read_u16(&bytes[..2])),
        )
    }

    pub fn to_wire_bytes(self) -> [u8; 8] {
        let mut bytes = [0u8; 8];
        LittleEndian::write_u16(&mut bytes[..2], self.repl_id().0);
        BigEndian::write_u48(&mut bytes[2..], self.glob_cnt().0);
        bytes
    }

    /// Interpret `raw` as the little-endian reading of the wire form.
    ///
    /// This is how ids appear when a protocol structure is decoded as a plain
    /// `u64`: the replica id lands in the low 16 bits, and the counter in
    /// the upper 48 bits with its bytes reversed.
    pub fn from_wire_u64(raw: u64) -> Self {
        ExtendedId::from_wire_bytes(&raw.to_le_bytes())
    }

    pub fn to_wire_u64(self) -> u64 {
        u64::from_le_bytes(self.to_wire_bytes())
    }
}

impl fmt::Debug for ExtendedId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "ExtendedId({})", self)
    }
}

impl fmt::Display for ExtendedId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}/{:#x}", self.repl_id(), self.glob_cnt().0)
    }
}

/// Identifies the replica a `RangeSet` belongs to.
#[derive(Deserialize, Serialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Scope {
    ById(ReplId),
    ByGuid(Guid),
}

impl Scope {
    pub fn is_id_based(&self) -> bool {
        match *self {
            Scope::ById(_) => true,
            Scope::ByGuid(_) => false,
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Scope::ById(repl_id) => write!(f, "replid {}", repl_id),
            Scope::ByGuid(ref guid) => write!(f, "replguid {}", guid),
        }
    }
}

/// An inclusive range of global counters.
///
/// `low <= high` always holds; the only ways to build one outside this module
/// are `new`, which refuses inverted bounds, and `just`.
#[derive(Serialize, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GlobRange {
    pub(super) low: GlobCnt,
    pub(super) high: GlobCnt,
}

impl<'de> Deserialize<'de> for GlobRange {
    fn deserialize<D: Deserializer<'de>>(de: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        struct Raw {
            low: GlobCnt,
            high: GlobCnt,
        }

        let raw = Raw::deserialize(de)?;
        GlobRange::new(raw.low, raw.high)
            .ok_or_else(|| serde::de::Error::custom("inverted GlobRange"))
    }
}

impl GlobRange {
    pub fn new(low: GlobCnt, high: GlobCnt) -> Option<Self> {
        if low <= high {
            Some(GlobRange { low, high })
        } else {
            None
        }
    }

    pub fn just(v: GlobCnt) -> Self {
        GlobRange { low: v, high: v }
    }

    #[cfg(test)]
    pub fn u(low: u64, high: u64) -> Self {
        GlobRange::new(GlobCnt::u(low), GlobCnt::u(high)).unwrap()
    }

    pub fn low(&self) -> GlobCnt {
        self.low
    }

    pub fn high(&self) -> GlobCnt {
        self.high
    }

    pub fn contains(&self, v: GlobCnt) -> bool {
        self.low <= v && v <= self.high
    }

    /// The number of counters in this range.
    pub fn len(&self) -> u64 {
        self.high.0 - self.low.0 + 1
    }

    fn cmp_to(&self, v: GlobCnt) -> Ordering {
        if self.high < v {
            Ordering::Less
        } else if self.low > v {
            Ordering::Greater
        } else {
            Ordering::Equal
        }
    }
}

impl fmt::Debug for GlobRange {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "[{}]", self)
    }
}

impl fmt::Display for GlobRange {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.low == self.high {
            write!(f, "{:#x}", self.low.0)
        } else {
            write!(f, "{:#x}-{:#x}", self.low.0, self.high.0)
        }
    }
}

/// A set of global counters belonging to one replica.
///
/// Internally, this is a sorted list of inclusive ranges which is kept
/// minimal: ranges never overlap and never touch, so `range_count()` is
/// exactly the number of maximal runs in the set.
///
/// `is_single()` is a marker carried over from the wire form (or from a
/// `RangeBuilder` created with `accept_single`) for sets that denote one
/// discrete id. It does not affect membership or the algebra; it is only
/// ever set on a set of exactly one counter.
#[derive(Clone, PartialEq, Eq)]
pub struct RangeSet {
    pub(super) scope: Scope,
    pub(super) single: bool,
    pub(super) ranges: Vec<GlobRange>,
}

impl RangeSet {
    /// Create a new, empty set.
    pub fn new(scope: Scope) -> Self {
        RangeSet {
            scope,
            single: false,
            ranges: Vec::new(),
        }
    }

    /// Create a set holding the given ranges, which may be in any order and
    /// may overlap.
    pub fn from_ranges(
        scope: Scope,
        ranges: impl IntoIterator<Item = GlobRange>,
    ) -> Self {
        let mut ranges: Vec<GlobRange> = ranges.into_iter().collect();
        coalesce(&mut ranges);
        RangeSet {
            scope,
            single: false,
            ranges,
        }
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    pub fn is_id_based(&self) -> bool {
        self.scope.is_id_based()
    }

    pub fn is_single(&self) -> bool {
        self.single
    }

    /// Return the replica id of an id-scoped set.
    pub fn repl_id(&self) -> Result<ReplId, Error> {
        match self.scope {
            Scope::ById(repl_id) => Ok(repl_id),
            Scope::ByGuid(_) => Err(Error::NotApplicable),
        }
    }

    /// Return the replica GUID of a GUID-scoped set.
    pub fn repl_guid(&self) -> Result<&Guid, Error> {
        match self.scope {
            Scope::ById(_) => Err(Error::NotApplicable),
            Scope::ByGuid(ref guid) => Ok(guid),
        }
    }

    /// The ranges in this set, in ascending order.
    pub fn ranges(&self) -> &[GlobRange] {
        &self.ranges
    }

    pub fn range_count(&self) -> usize {
        self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Return the total number of counters in the set.
    pub fn len(&self) -> u64 {
        self.ranges.iter().map(GlobRange::len).sum()
    }

    /// Return whether `v` is in this set, regardless of scope.
    pub fn contains(&self, v: GlobCnt) -> bool {
        self.ranges.binary_search_by(|r| r.cmp_to(v)).is_ok()
    }

    /// Iterate over every counter in the set, in ascending order.
    pub fn items<'a>(&'a self) -> impl Iterator<Item = GlobCnt> + 'a {
        self.ranges
            .iter()
            .flat_map(|r| (r.low.0..=r.high.0).map(GlobCnt))
    }
}

impl fmt::Display for RangeSet {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}: [", self.scope)?;
        for (ix, range) in self.ranges.iter().enumerate() {
            let delim = if 0 == ix { "" } else { ", " };
            write!(f, "{}{}", delim, range)?;
        }
        write!(f, "]")?;
        if self.single {
            write!(f, " (single)")?;
        }
        Ok(())
    }
}

impl fmt::Debug for RangeSet {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "RangeSet({})", self)
    }
}

/// Sort `ranges` and fuse every pair that overlaps or touches.
pub(super) fn coalesce(ranges: &mut Vec<GlobRange>) {
    ranges.sort_unstable_by_key(|r| r.low);

    let mut out = 0;
    for ix in 0..ranges.len() {
        let next = ranges[ix];
        if ix > 0 && next.low.0 <= ranges[out - 1].high.0 + 1 {
            let last = &mut ranges[out - 1];
            last.high = last.high.max(next.high);
        } else {
            ranges[out] = next;
            out += 1;
        }
    }
    ranges.truncate(out);
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn extended_id_packing() {
        let eid = ExtendedId::new(GlobCnt::u(0x1041d), ReplId(1));
        assert_eq!(0x1_041d_0001, eid.packed());
        assert_eq!(GlobCnt::u(0x1041d), eid.glob_cnt());
        assert_eq!(ReplId(1), eid.repl_id());
        assert_eq!(eid, ExtendedId::from_packed(eid.packed()));
    }

    #[test]
    fn extended_id_wire_form() {
        // A message id as it appears when read from a protocol structure.
        let raw = (0x1d04_0100_0000u64 << 16) | 1;
        let eid = ExtendedId::from_wire_u64(raw);
        assert_eq!(ReplId(1), eid.repl_id());
        assert_eq!(GlobCnt::u(0x1041d), eid.glob_cnt());
        assert_eq!(raw, eid.to_wire_u64());
        assert_eq!(
            [0x01, 0x00, 0x00, 0x00, 0x00, 0x01, 0x04, 0x1d],
            eid.to_wire_bytes()
        );
    }

    #[test]
    fn glob_cnt_bounds() {
        assert!(GlobCnt::of(1 << 48).is_none());
        assert_eq!(Some(GlobCnt::MAX), GlobCnt::of((1 << 48) - 1));
        assert!(GlobCnt::MAX.next().is_none());
        assert!(GlobCnt::MIN.prev().is_none());
        assert_eq!(
            [0x00, 0x00, 0x00, 0x01, 0x04, 0x2e],
            GlobCnt::u(0x1042e).to_bytes()
        );
        assert_eq!(
            GlobCnt::u(0x1042e),
            GlobCnt::from_bytes(&[0x00, 0x00, 0x00, 0x01, 0x04, 0x2e])
        );
    }

    #[test]
    fn guid_formatting() {
        let guid = Guid([
            0x9b, 0xb9, 0xff, 0xb5, 0x0f, 0x44, 0x77, 0x4f, 0xb4, 0x88, 0xc5,
            0xc6, 0x70, 0x2e, 0xe3, 0xa8,
        ]);
        assert_eq!("b5ffb99b-440f-4f77-b488-c5c6702ee3a8", guid.to_string());
        assert_eq!(Some(guid), Guid::from_bytes(&guid.0[..]));
        assert_eq!(None, Guid::from_bytes(&guid.0[1..]));
        assert_ne!(Guid::random(), Guid::random());
    }

    #[test]
    fn from_ranges_coalesces() {
        let set = RangeSet::from_ranges(
            Scope::ById(ReplId(1)),
            vec![
                GlobRange::u(10, 12),
                GlobRange::u(1, 3),
                GlobRange::u(4, 4),
                GlobRange::u(11, 20),
                GlobRange::u(30, 30),
            ],
        );
        assert_eq!(
            &[GlobRange::u(1, 4), GlobRange::u(10, 20), GlobRange::u(30, 30)],
            set.ranges()
        );
        assert_eq!(3, set.range_count());
        assert_eq!(16, set.len());
        assert!(!set.is_single());
        assert_eq!("replid 0x0001: [0x1-0x4, 0xa-0x14, 0x1e]", set.to_string());
    }

    #[test]
    fn inverted_ranges_are_unrepresentable() {
        assert_eq!(None, GlobRange::new(GlobCnt::u(5), GlobCnt::u(2)));
        assert_eq!(
            Some(GlobRange::u(5, 5)),
            GlobRange::new(GlobCnt::u(5), GlobCnt::u(5))
        );

        #[derive(Deserialize)]
        struct Doc {
            range: GlobRange,
        }

        let doc: Doc = toml::from_str("range = { low = 2, high = 5 }").unwrap();
        assert_eq!(GlobRange::u(2, 5), doc.range);
        assert_eq!(4, doc.range.len());
        assert!(
            toml::from_str::<Doc>("range = { low = 5, high = 2 }").is_err()
        );
        assert!(toml::from_str::<Doc>(
            "range = { low = 0, high = 281474976710656 }"
        )
        .is_err());

        let set =
            RangeSet::from_ranges(Scope::ById(ReplId(1)), vec![doc.range]);
        assert_eq!(4, set.len());
    }

    #[test]
    fn contains_and_items() {
        let set = RangeSet::from_ranges(
            Scope::ById(ReplId(1)),
            vec![GlobRange::u(1, 3), GlobRange::u(7, 8)],
        );
        let items: Vec<u64> = set.items().map(GlobCnt::get).collect();
        assert_eq!(vec![1, 2, 3, 7, 8], items);

        for v in 0..12 {
            assert_eq!(
                items.contains(&v),
                set.contains(GlobCnt::u(v)),
                "Bad contains result for {}",
                v
            );
        }
    }

    #[test]
    fn scope_accessors() {
        let guid = Guid::random();
        let by_id = RangeSet::new(Scope::ById(ReplId(5)));
        let by_guid = RangeSet::new(Scope::ByGuid(guid));

        assert_eq!(ReplId(5), by_id.repl_id().unwrap());
        assert_matches!(Err(Error::NotApplicable), by_id.repl_guid());
        assert_eq!(&guid, by_guid.repl_guid().unwrap());
        assert_matches!(Err(Error::NotApplicable), by_guid.repl_id());
        assert!(by_id.is_empty());
    }
}
