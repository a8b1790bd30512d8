//! Binary cache codec.
//!
//! ## Layout
//!
//! All integers are little-endian. Strings are a 7-bit variable-length byte
//! count followed by UTF-8 bytes.
//!
//! ```text
//! Catalogue := lastUpdateTicks:i64  groupCount:i32     Group*
//! Group     := name:string          subgroupCount:i32  Subgroup*
//! Subgroup  := name:string          emojiCount:i32     EmojiInfo*
//! EmojiInfo := name:string glyph:string specification:string
//!              qualifier:u8 codePointCount:i32 codePoint:i32*
//! ```
//!
//! `lastUpdateTicks` counts 100 ns ticks since 0001-01-01T00:00:00Z, with
//! `0` meaning "never loaded". The layout is shared with existing cache files
//! and must not change.

use chrono::{DateTime, Timelike, Utc};

use crate::error::EmojiError;
use crate::model::{Catalogue, EmojiInfo, Group, Qualifier, Subgroup};

/// Sentinel tick value for an absent `last_update`.
pub const ABSENT_TICKS: i64 = 0;

const TICKS_PER_SECOND: i64 = 10_000_000;
const NANOS_PER_TICK: u32 = 100;

/// Ticks between 0001-01-01 and the Unix epoch.
const UNIX_EPOCH_TICKS: i64 = 621_355_968_000_000_000;

// Smallest encoded size of each record, used to bound untrusted counts.
const MIN_GROUP_LEN: usize = 1 + 4;
const MIN_SUBGROUP_LEN: usize = 1 + 4;
const MIN_EMOJI_LEN: usize = 1 + 1 + 1 + 1 + 4 + 4;
const CODE_POINT_LEN: usize = 4;

// ---------------------------------------------------------------------------
// Timestamps
// ---------------------------------------------------------------------------

/// Convert a timestamp to 100 ns ticks since 0001-01-01.
pub fn to_ticks(ts: DateTime<Utc>) -> i64 {
    ts.timestamp()
        .saturating_mul(TICKS_PER_SECOND)
        .saturating_add(UNIX_EPOCH_TICKS)
        .saturating_add(i64::from(ts.timestamp_subsec_nanos() / NANOS_PER_TICK))
}

/// Convert ticks back to a timestamp. [`ABSENT_TICKS`] maps to `None`.
pub fn from_ticks(ticks: i64) -> Result<Option<DateTime<Utc>>, EmojiError> {
    if ticks == ABSENT_TICKS {
        return Ok(None);
    }
    let since_epoch = ticks
        .checked_sub(UNIX_EPOCH_TICKS)
        .ok_or_else(|| EmojiError::invalid_data(format!("timestamp out of range: {ticks}")))?;
    let secs = since_epoch.div_euclid(TICKS_PER_SECOND);
    let nanos = (since_epoch.rem_euclid(TICKS_PER_SECOND) as u32) * NANOS_PER_TICK;
    DateTime::from_timestamp(secs, nanos)
        .map(Some)
        .ok_or_else(|| EmojiError::invalid_data(format!("timestamp out of range: {ticks}")))
}

/// Drop sub-tick precision so a timestamp survives an encode/decode cycle.
pub fn truncate_to_tick(ts: DateTime<Utc>) -> DateTime<Utc> {
    let nanos = ts.nanosecond() / NANOS_PER_TICK * NANOS_PER_TICK;
    ts.with_nanosecond(nanos).unwrap_or(ts)
}

// ---------------------------------------------------------------------------
// Encoder
// ---------------------------------------------------------------------------

/// Serialize a catalogue to the cache layout.
pub fn encode(catalogue: &Catalogue) -> Result<Vec<u8>, EmojiError> {
    let mut buf = Vec::new();
    let ticks = catalogue.last_update.map_or(ABSENT_TICKS, to_ticks);
    buf.extend_from_slice(&ticks.to_le_bytes());

    write_count(&mut buf, catalogue.groups.len(), "group")?;
    for group in &catalogue.groups {
        write_string(&mut buf, &group.name)?;
        write_count(&mut buf, group.subgroups.len(), "subgroup")?;
        for subgroup in &group.subgroups {
            write_string(&mut buf, &subgroup.name)?;
            write_count(&mut buf, subgroup.emoji.len(), "emoji")?;
            for info in &subgroup.emoji {
                write_emoji(&mut buf, info)?;
            }
        }
    }
    Ok(buf)
}

fn write_emoji(buf: &mut Vec<u8>, info: &EmojiInfo) -> Result<(), EmojiError> {
    write_string(buf, info.name())?;
    write_string(buf, info.glyph())?;
    write_string(buf, info.specification())?;
    buf.push(info.qualifier().as_u8());
    write_count(buf, info.code_points().len(), "codepoint")?;
    for &cp in info.code_points() {
        // Scalar values are at most 0x10FFFF, so the cast is lossless.
        buf.extend_from_slice(&(cp as i32).to_le_bytes());
    }
    Ok(())
}

fn write_count(buf: &mut Vec<u8>, count: usize, what: &str) -> Result<(), EmojiError> {
    let count = i32::try_from(count)
        .map_err(|_| EmojiError::invalid_argument(format!("too many {what} entries: {count}")))?;
    buf.extend_from_slice(&count.to_le_bytes());
    Ok(())
}

fn write_string(buf: &mut Vec<u8>, s: &str) -> Result<(), EmojiError> {
    let mut len = u32::try_from(s.len())
        .ok()
        .filter(|&n| n <= i32::MAX as u32)
        .ok_or_else(|| EmojiError::invalid_argument("string too long for cache format"))?;
    while len >= 0x80 {
        buf.push((len as u8 & 0x7F) | 0x80);
        len >>= 7;
    }
    buf.push(len as u8);
    buf.extend_from_slice(s.as_bytes());
    Ok(())
}

// ---------------------------------------------------------------------------
// Decoder
// ---------------------------------------------------------------------------

/// Deserialize a catalogue from the cache layout.
///
/// Any structural problem (truncation, bad counts, unknown qualifier byte,
/// invalid UTF-8) fails the whole decode with `InvalidData`.
pub fn decode(data: &[u8]) -> Result<Catalogue, EmojiError> {
    let mut reader = ByteReader::new(data);

    let last_update = from_ticks(reader.read_i64("last update")?)?;
    let group_count = reader.read_count("group", MIN_GROUP_LEN)?;
    let mut groups = Vec::with_capacity(group_count);
    for _ in 0..group_count {
        groups.push(read_group(&mut reader)?);
    }

    if reader.remaining() > 0 {
        log::debug!(
            "Ignoring {} trailing bytes after emoji cache",
            reader.remaining()
        );
    }

    Ok(Catalogue::new(last_update, groups))
}

fn read_group(reader: &mut ByteReader<'_>) -> Result<Group, EmojiError> {
    let name = reader.read_string("group name")?;
    let count = reader.read_count("subgroup", MIN_SUBGROUP_LEN)?;
    let mut subgroups = Vec::with_capacity(count);
    for _ in 0..count {
        subgroups.push(read_subgroup(reader)?);
    }
    Ok(Group { name, subgroups })
}

fn read_subgroup(reader: &mut ByteReader<'_>) -> Result<Subgroup, EmojiError> {
    let name = reader.read_string("subgroup name")?;
    let count = reader.read_count("emoji", MIN_EMOJI_LEN)?;
    let mut emoji = Vec::with_capacity(count);
    for _ in 0..count {
        emoji.push(read_emoji(reader)?);
    }
    Ok(Subgroup { name, emoji })
}

fn read_emoji(reader: &mut ByteReader<'_>) -> Result<EmojiInfo, EmojiError> {
    let name = reader.read_string("emoji name")?;
    let glyph = reader.read_string("glyph")?;
    let specification = reader.read_string("specification")?;

    let raw = reader.read_u8("qualifier")?;
    let qualifier = Qualifier::from_u8(raw).ok_or_else(|| {
        EmojiError::invalid_data(format!("unknown qualifier value {raw} for '{glyph}'"))
    })?;

    let count = reader.read_count("codepoint", CODE_POINT_LEN)?;
    if count == 0 {
        return Err(EmojiError::invalid_data(format!("'{glyph}' has no codepoints")));
    }
    let mut code_points = Vec::with_capacity(count);
    for _ in 0..count {
        let value = reader.read_i32("codepoint")?;
        let cp = u32::try_from(value)
            .ok()
            .filter(|&v| char::from_u32(v).is_some())
            .ok_or_else(|| EmojiError::invalid_data(format!("invalid codepoint {value}")))?;
        code_points.push(cp);
    }

    EmojiInfo::new(name, glyph, specification, qualifier, code_points)
        .map_err(|e| EmojiError::invalid_data(e.to_string()))
}

/// Cursor over the cache bytes with bounds-checked reads.
struct ByteReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    fn take(&mut self, len: usize, what: &str) -> Result<&'a [u8], EmojiError> {
        if len > self.remaining() {
            return Err(EmojiError::invalid_data(format!(
                "truncated {what} at offset {}: need {len} bytes, {} left",
                self.pos,
                self.remaining()
            )));
        }
        let slice = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }

    fn read_array<const N: usize>(&mut self, what: &str) -> Result<[u8; N], EmojiError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N, what)?);
        Ok(out)
    }

    fn read_u8(&mut self, what: &str) -> Result<u8, EmojiError> {
        Ok(self.read_array::<1>(what)?[0])
    }

    fn read_i32(&mut self, what: &str) -> Result<i32, EmojiError> {
        Ok(i32::from_le_bytes(self.read_array(what)?))
    }

    fn read_i64(&mut self, what: &str) -> Result<i64, EmojiError> {
        Ok(i64::from_le_bytes(self.read_array(what)?))
    }

    /// Read an `i32` count and check it could fit in the bytes that remain.
    fn read_count(&mut self, what: &str, min_item_len: usize) -> Result<usize, EmojiError> {
        let raw = self.read_i32(&format!("{what} count"))?;
        let count = usize::try_from(raw)
            .map_err(|_| EmojiError::invalid_data(format!("negative {what} count {raw}")))?;
        if count > self.remaining() / min_item_len {
            return Err(EmojiError::invalid_data(format!(
                "{what} count {count} exceeds remaining {} bytes",
                self.remaining()
            )));
        }
        Ok(count)
    }

    fn read_string(&mut self, what: &str) -> Result<String, EmojiError> {
        let len = self.read_7bit_len(what)?;
        let bytes = self.take(len, what)?;
        String::from_utf8(bytes.to_vec())
            .map_err(|e| EmojiError::invalid_data(format!("{what} is not UTF-8: {e}")))
    }

    fn read_7bit_len(&mut self, what: &str) -> Result<usize, EmojiError> {
        let mut value: u64 = 0;
        for shift in (0..35).step_by(7) {
            let byte = self.read_u8(what)?;
            value |= u64::from(byte & 0x7F) << shift;
            if byte & 0x80 == 0 {
                if value > i32::MAX as u64 {
                    return Err(EmojiError::invalid_data(format!(
                        "{what} length {value} out of range"
                    )));
                }
                return Ok(value as usize);
            }
        }
        Err(EmojiError::invalid_data(format!("bad length prefix for {what}")))
    }
}
