//! Part numbering and byte-range partitioning.
//!
//! Part numbers are 1-based, contiguous, and ascending. Every part has the
//! configured size except the last, which is shorter when the object size
//! is not an exact multiple and is never zero.

use crate::error::{Error, Result};
use crate::{MAX_OBJECT_SIZE, MAX_PARTS};
use std::fmt;

/// One contiguous chunk of an object being moved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartSpec {
    /// 1-based part number.
    pub number: u32,
    /// Byte offset of the part within the object.
    pub offset: u64,
    /// Length of the part in bytes. Never zero.
    pub len: u64,
}

impl PartSpec {
    /// The inclusive byte range this part covers.
    pub fn range(&self) -> ByteRange {
        ByteRange {
            start: self.offset,
            end: self.offset + self.len - 1,
        }
    }
}

/// An inclusive byte range, as used by ranged GET requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: u64,
    pub end: u64,
}

impl ByteRange {
    /// Number of bytes covered. Inclusive ranges always cover at least one.
    pub fn len(&self) -> u64 {
        self.end - self.start + 1
    }
}

impl fmt::Display for ByteRange {
    /// Renders the HTTP `Range` header form, e.g. `bytes=0-8388607`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "bytes={}-{}", self.start, self.end)
    }
}

/// Result of a successfully transferred part: the number plus the opaque
/// integrity tag the remote side returned for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedPart {
    pub number: u32,
    pub etag: String,
}

/// Number of parts needed to move `object_size` bytes in `part_size` chunks.
///
/// Rejects empty and oversized objects, and plans that would exceed the
/// part count limit. Callers validate `part_size` via
/// [`TransferConfig::validate`](crate::TransferConfig::validate).
pub fn part_count(object_size: u64, part_size: u64) -> Result<u32> {
    if object_size == 0 {
        return Err(Error::EmptyObject);
    }
    if object_size > MAX_OBJECT_SIZE {
        return Err(Error::ObjectTooLarge(object_size));
    }
    let count = object_size.div_ceil(part_size);
    if count > MAX_PARTS as u64 {
        return Err(Error::TooManyParts(count));
    }
    Ok(count as u32)
}

/// Split an object into ordered part specs.
///
/// Part numbers are exactly `1..=part_count`, offsets are contiguous, and
/// the lengths sum to `object_size`.
pub fn plan_parts(object_size: u64, part_size: u64) -> Result<Vec<PartSpec>> {
    let count = part_count(object_size, part_size)?;
    let mut parts = Vec::with_capacity(count as usize);
    let mut offset = 0u64;
    for number in 1..=count {
        let len = part_size.min(object_size - offset);
        parts.push(PartSpec {
            number,
            offset,
            len,
        });
        offset += len;
    }
    Ok(parts)
}
