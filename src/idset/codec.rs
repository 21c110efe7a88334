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

//! The IDSET wire format.
//!
//! An IDSET is a sequence of segments, one per replica. Each segment is a
//! replica discriminator (a little-endian `ReplId`, or a 16-byte GUID,
//! depending on context the encoding itself does not carry) followed by a
//! GLOBSET.
//!
//! A GLOBSET is a small program over a stack of up to 6 "common" high-order
//! bytes. Every counter it describes is the stacked bytes followed by
//! whatever suffix bytes the command supplies, most significant first.
//!
//! - `0x01`..=`0x06` push that many bytes. If the stack then holds all 6
//!   bytes, they are a single counter; it is added to the set and the bytes
//!   are popped again immediately.
//! - `0x50` pops whatever the most recent surviving push added.
//! - `0x52` is followed by a low and a high suffix, each `6 - depth` bytes,
//!   and adds that inclusive range.
//! - `0x42` requires a 5-byte stack and is followed by a start byte and a
//!   mask byte. It adds the start value, and `start + i + 1` for every bit
//!   `i` set in the mask.
//! - `0x00` ends the GLOBSET.
//!
//! Input here comes straight off the network, so the decoder never trusts a
//! length and bounds the amount of work a single IDSET can demand.

use byteorder::{ByteOrder, LittleEndian};

use super::model::{
    coalesce, GlobCnt, GlobRange, Guid, RangeSet, ReplId, Scope,
};
use crate::support::error::Error;
use crate::support::system_config::DecodeLimits;

const CMD_END: u8 = 0x00;
const CMD_PUSH_MAX: u8 = 0x06;
const CMD_BITMASK: u8 = 0x42;
const CMD_POP: u8 = 0x50;
const CMD_RANGE: u8 = 0x52;

const GLOBCNT_LEN: usize = 6;
const REPLID_LEN: usize = 2;
const REPLGUID_LEN: usize = 16;

type GlobBytes = [u8; GLOBCNT_LEN];

struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Reader { data, pos: 0 }
    }

    fn is_at_end(&self) -> bool {
        self.pos >= self.data.len()
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], Error> {
        let available = self.data.len() - self.pos;
        if available < n {
            return Err(Error::Truncated {
                offset: self.pos,
                needed: n,
                available,
            });
        }

        let bytes = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(bytes)
    }

    fn byte(&mut self) -> Result<u8, Error> {
        self.take(1).map(|b| b[0])
    }
}

/// Decode an IDSET that must contain exactly one replica segment, using the
/// default limits.
///
/// `id_based` selects whether segments start with a `ReplId` or a GUID.
///
/// The result is `is_single()` only when the segment is one singleton push
/// and nothing else. A range command with equal bounds (`0x52 v v`) names the
/// same counter but decodes as an ordinary one-element set.
pub fn decode(data: &[u8], id_based: bool) -> Result<RangeSet, Error> {
    decode_with_limits(data, id_based, &DecodeLimits::default())
}

/// Like `decode`, but with explicit limits.
pub fn decode_with_limits(
    data: &[u8],
    id_based: bool,
    limits: &DecodeLimits,
) -> Result<RangeSet, Error> {
    let mut sets = decode_all(data, id_based, limits)?;
    if 1 != sets.len() {
        return Err(Error::MultipleSegments(sets.len()));
    }

    Ok(sets.remove(0))
}

/// Decode every segment of an IDSET, in wire order.
pub fn decode_all(
    data: &[u8],
    id_based: bool,
    limits: &DecodeLimits,
) -> Result<Vec<RangeSet>, Error> {
    if data.is_empty() {
        return Err(Error::InvalidArgument("empty IDSET"));
    }

    // The smallest possible segment is a discriminator and an END.
    let min_len = if id_based { REPLID_LEN } else { REPLGUID_LEN } + 1;
    if data.len() < min_len {
        return Err(Error::Truncated {
            offset: 0,
            needed: min_len,
            available: data.len(),
        });
    }

    let mut reader = Reader::new(data);
    let mut sets = Vec::new();
    while !reader.is_at_end() {
        if sets.len() >= limits.max_segments {
            return Err(Error::LimitExceeded("segments"));
        }

        let scope = if id_based {
            Scope::ById(ReplId(LittleEndian::read_u16(
                reader.take(REPLID_LEN)?,
            )))
        } else {
            let mut guid = [0u8; REPLGUID_LEN];
            guid.copy_from_slice(reader.take(REPLGUID_LEN)?);
            Scope::ByGuid(Guid(guid))
        };

        let (ranges, single) = read_globset(&mut reader, limits)?;
        sets.push(RangeSet {
            scope,
            single,
            ranges,
        });
    }

    Ok(sets)
}

fn read_globset(
    reader: &mut Reader<'_>,
    limits: &DecodeLimits,
) -> Result<(Vec<GlobRange>, bool), Error> {
    let mut stack: GlobBytes = [0; GLOBCNT_LEN];
    let mut depth = 0;
    let mut pushes = Vec::with_capacity(GLOBCNT_LEN);

    let mut ranges = Vec::new();
    let mut singletons = 0usize;
    let mut multis = 0usize;

    loop {
        let offset = reader.pos;
        let command = reader.byte()?;
        let invalid = Error::InvalidCommand { offset, command };

        match command {
            CMD_END => break,

            1..=CMD_PUSH_MAX => {
                let n = usize::from(command);
                if depth + n > GLOBCNT_LEN {
                    return Err(invalid);
                }

                stack[depth..depth + n].copy_from_slice(reader.take(n)?);
                if depth + n == GLOBCNT_LEN {
                    ranges.push(GlobRange::just(GlobCnt::from_bytes(&stack)));
                    singletons += 1;
                } else {
                    depth += n;
                    pushes.push(n);
                }
            },

            CMD_POP => {
                depth -= pushes.pop().ok_or(invalid)?;
            },

            CMD_RANGE => {
                let n = GLOBCNT_LEN - depth;
                let suffixes = reader.take(2 * n)?;

                let mut low = stack;
                low[depth..].copy_from_slice(&suffixes[..n]);
                let mut high = stack;
                high[depth..].copy_from_slice(&suffixes[n..]);

                ranges.push(
                    GlobRange::new(
                        GlobCnt::from_bytes(&low),
                        GlobCnt::from_bytes(&high),
                    )
                    .ok_or(invalid)?,
                );
                multis += 1;
            },

            CMD_BITMASK => {
                if GLOBCNT_LEN - 1 != depth {
                    return Err(invalid);
                }

                let operands = reader.take(2)?;
                let (start, mask) = (operands[0], operands[1]);
                let highest =
                    u16::from(start) + 8 - mask.leading_zeros() as u16;
                if highest > 0xff {
                    return Err(invalid);
                }

                let glob_at = |low_byte: u8| {
                    let mut bytes = stack;
                    bytes[GLOBCNT_LEN - 1] = low_byte;
                    GlobCnt::from_bytes(&bytes)
                };

                let (mut run_start, mut run_end) = (start, start);
                for bit in 0..8u8 {
                    if 0 == mask & (1 << bit) {
                        continue;
                    }

                    let value = start + bit + 1;
                    if value != run_end + 1 {
                        ranges.push(GlobRange {
                            low: glob_at(run_start),
                            high: glob_at(run_end),
                        });
                        run_start = value;
                    }
                    run_end = value;
                }
                ranges.push(GlobRange {
                    low: glob_at(run_start),
                    high: glob_at(run_end),
                });
                multis += 1;
            },

            _ => return Err(invalid),
        }

        if singletons + multis > limits.max_ranges {
            return Err(Error::LimitExceeded("ranges"));
        }
    }

    // Senders are supposed to emit ranges in order and never overlap them,
    // but nothing stops a peer from doing otherwise.
    coalesce(&mut ranges);
    let single = 1 == singletons && 0 == multis;
    Ok((ranges, single))
}

/// Encode `set` as a single-segment IDSET.
pub fn encode(set: &RangeSet) -> Vec<u8> {
    let mut out = Vec::new();
    encode_into(set, &mut out);
    out
}

/// Encode several sets as one multi-segment IDSET.
///
/// All sets must have the same kind of scope for the result to be decodable.
pub fn encode_all(sets: &[RangeSet]) -> Vec<u8> {
    let mut out = Vec::new();
    for set in sets {
        encode_into(set, &mut out);
    }
    out
}

fn encode_into(set: &RangeSet, out: &mut Vec<u8>) {
    match set.scope {
        Scope::ById(repl_id) => {
            let mut bytes = [0u8; REPLID_LEN];
            LittleEndian::write_u16(&mut bytes, repl_id.0);
            out.extend_from_slice(&bytes);
        },
        Scope::ByGuid(ref guid) => out.extend_from_slice(guid.as_bytes()),
    }

    let ranges: Vec<(GlobBytes, GlobBytes)> = set
        .ranges
        .iter()
        .map(|r| (r.low.to_bytes(), r.high.to_bytes()))
        .collect();

    if set.single {
        write_range(out, &ranges[0], 0, true);
    } else if 1 == ranges.len() {
        // A lone value must not be written as a singleton push, since that
        // would read back as a single-value set.
        write_range(out, &ranges[0], 0, false);
    } else {
        write_group(out, &ranges, 0);
    }

    out.push(CMD_END);
}

/// Write `ranges`, all of which share their first `depth` bytes (which are
/// already on the stack).
fn write_group(
    out: &mut Vec<u8>,
    ranges: &[(GlobBytes, GlobBytes)],
    depth: usize,
) {
    match ranges.len() {
        0 => return,
        1 => return write_range(out, &ranges[0], depth, true),
        _ => (),
    }

    // Sorted order means every bound lies between these two, so they share
    // whatever prefix these share.
    let prefix =
        common_prefix(&ranges[0].0, &ranges[ranges.len() - 1].1, depth);
    if prefix > depth {
        write_push(out, &ranges[0].0[depth..prefix]);
        write_group(out, ranges, prefix);
        out.push(CMD_POP);
        return;
    }

    // No common byte at this depth. Split into runs which share it; a range
    // which itself spans several values of the byte stands alone.
    let mut start = 0;
    while start < ranges.len() {
        let byte = ranges[start].0[depth];
        let mut end = start + 1;
        if ranges[start].1[depth] == byte {
            while end < ranges.len()
                && ranges[end].0[depth] == byte
                && ranges[end].1[depth] == byte
            {
                end += 1;
            }
        }

        write_group(out, &ranges[start..end], depth);
        start = end;
    }
}

fn write_range(
    out: &mut Vec<u8>,
    &(ref low, ref high): &(GlobBytes, GlobBytes),
    depth: usize,
    allow_singleton: bool,
) {
    if low == high && allow_singleton {
        write_push(out, &low[depth..]);
        return;
    }

    // The range command needs at least one suffix byte.
    let prefix = common_prefix(low, high, depth).min(GLOBCNT_LEN - 1);
    if prefix > depth {
        write_push(out, &low[depth..prefix]);
    }

    out.push(CMD_RANGE);
    out.extend_from_slice(&low[prefix..]);
    out.extend_from_slice(&high[prefix..]);

    if prefix > depth {
        out.push(CMD_POP);
    }
}

fn write_push(out: &mut Vec<u8>, bytes: &[u8]) {
    out.push(bytes.len() as u8);
    out.extend_from_slice(bytes);
}

fn common_prefix(a: &GlobBytes, b: &GlobBytes, from: usize) -> usize {
    (from..GLOBCNT_LEN).find(|&ix| a[ix] != b[ix]).unwrap_or(GLOBCNT_LEN)
}

impl RangeSet {
    /// Decode a single-segment IDSET. See `codec::decode`.
    pub fn decode(data: &[u8], id_based: bool) -> Result<Self, Error> {
        decode(data, id_based)
    }

    /// Encode this set as a single-segment IDSET.
    pub fn encode(&self) -> Vec<u8> {
        encode(self)
    }
}
