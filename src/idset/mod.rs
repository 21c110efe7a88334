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

//! IDSETs: sets of change numbers, scoped per replica.

pub mod algebra;
pub mod builder;
pub mod codec;
pub mod model;

pub use self::builder::RangeBuilder;
pub use self::model::{
    ExtendedId, GlobCnt, GlobRange, Guid, RangeSet, ReplId, Scope,
};
