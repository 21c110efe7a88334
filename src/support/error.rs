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

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid argument: {0}")]
    InvalidArgument(&'static str),
    #[error("IDSET truncated: needed {needed} bytes at offset {offset}, have {available}")]
    Truncated {
        offset: usize,
        needed: usize,
        available: usize,
    },
    #[error("Invalid GLOBSET command 0x{command:02x} at offset {offset}")]
    InvalidCommand { offset: usize, command: u8 },
    #[error("Operation not applicable to a set of this scope")]
    NotApplicable,
    #[error("Expected a single IDSET segment, found {0}")]
    MultipleSegments(usize),
    #[error("IDSET exceeds configured limit on {0}")]
    LimitExceeded(&'static str),
    #[error(transparent)]
    Config(#[from] toml::de::Error),
}
