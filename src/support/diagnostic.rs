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

use log::{log, log_enabled, Level};

use crate::idset::RangeSet;

/// Write `set` to the log at `level`, one line per range, each prefixed with
/// `label`.
///
/// This is purely a debugging aid for callers; nothing in the
/// synchronization core calls it.
pub fn dump_range_set(level: Level, label: &str, set: &RangeSet) {
    if !log_enabled!(level) {
        return;
    }

    for line in dump_lines(label, set) {
        log!(level, "{}", line);
    }
}

fn dump_lines(label: &str, set: &RangeSet) -> Vec<String> {
    let mut lines = Vec::with_capacity(set.range_count() + 1);
    lines.push(format!(
        "{}{} ({} ranges{})",
        label,
        set.scope(),
        set.range_count(),
        if set.is_single() { ", single" } else { "" },
    ));
    for range in set.ranges() {
        lines.push(format!(
            "{}  {:#014x}:{:#014x}",
            label,
            range.low().get(),
            range.high().get(),
        ));
    }
    lines
}
