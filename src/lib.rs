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

//! Replica-scoped change-number sets for Exchange-style incremental
//! synchronization.
//!
//! The central type is `idset::RangeSet`, a minimal sorted list of inclusive
//! ranges of 48-bit global counters belonging to one replica. Sets arrive
//! from the wire in the compressed IDSET/GLOBSET encoding (`idset::codec`),
//! or are accumulated locally from raw ids with `idset::RangeBuilder`, and
//! are then compared with the difference/union/membership operations in
//! `idset::algebra`.

#[cfg(test)]
macro_rules! assert_matches {
    ($expected:pat, $actual:expr) => {
        match $actual {
            $expected => (),
            unexpected => panic!(
                "Expected {} matches {}, got {:?}",
                stringify!($expected),
                stringify!($actual),
                unexpected
            ),
        }
    };
}

pub mod idset;
pub mod support;

pub use crate::idset::{
    ExtendedId, GlobCnt, GlobRange, Guid, RangeBuilder, RangeSet, ReplId,
    Scope,
};
pub use crate::support::error::Error;
