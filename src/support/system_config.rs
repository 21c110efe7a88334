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

use serde::{Deserialize, Serialize};

use crate::support::error::Error;

/// Configuration for the synchronization core.
///
/// This is normally embedded in the configuration file of whatever is hosting
/// the synchronization exchange; `from_toml_str` parses the fragment on its
/// own.
#[derive(Clone, Debug, Deserialize, Serialize, Default, PartialEq)]
pub struct SyncConfig {
    /// Bounds applied when decoding IDSETs received from a peer.
    #[serde(default)]
    pub idset: DecodeLimits,
}

impl SyncConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self, Error> {
        Ok(toml::from_str(raw)?)
    }
}

/// Bounds on the work a single untrusted IDSET can cause.
///
/// The defaults are far above anything a real server sends for one
/// synchronization round.
#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct DecodeLimits {
    /// The maximum number of replica segments in one IDSET.
    pub max_segments: usize,
    /// The maximum number of range, bitmask, or singleton commands in one
    /// segment.
    ///
    /// Each such command can produce at most a handful of ranges, so this
    /// also bounds the size of the decoded set.
    pub max_ranges: usize,
}

impl Default for DecodeLimits {
    fn default() -> Self {
        DecodeLimits {
            max_segments: 4096,
            max_ranges: 1 << 20,
        }
    }
}
