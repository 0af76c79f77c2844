use serde::{Deserialize, Serialize};

use crate::types::errors::{CoreError, CoreResult};

/// Half-open character range `[start, end)` into a text body.
///
/// Offsets count Unicode scalar values, not bytes. On the wire a span is
/// `{"ptr_start": .., "ptr_end": ..}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawSpan")]
pub struct Span {
    #[serde(rename = "ptr_start")]
    start: usize,
    #[serde(rename = "ptr_end")]
    end: usize,
}

#[derive(Deserialize)]
struct RawSpan {
    ptr_start: i64,
    ptr_end: i64,
}

impl TryFrom<RawSpan> for Span {
    type Error = CoreError;

    fn try_from(raw: RawSpan) -> Result<Self, Self::Error> {
        Span::new(raw.ptr_start, raw.ptr_end)
    }
}

impl Span {
    /// Fails with `InvalidSpan` unless `0 <= start <= end`.
    pub fn new(start: i64, end: i64) -> CoreResult<Self> {
        if start < 0 || end < start {
            return Err(CoreError::InvalidSpan(format!("[{start}, {end})")));
        }
        let start = usize::try_from(start)
            .map_err(|_| CoreError::InvalidSpan(format!("start {start} out of range")))?;
        let end = usize::try_from(end)
            .map_err(|_| CoreError::InvalidSpan(format!("end {end} out of range")))?;
        Ok(Span { start, end })
    }

    pub fn start(&self) -> usize {
        self.start
    }

    pub fn end(&self) -> usize {
        self.end
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// True when the two ranges share at least one offset.
    pub fn overlaps(&self, other: &Span) -> bool {
        self.start.max(other.start) < self.end.min(other.end)
    }

    pub fn clamp(&self, max: usize) -> Span {
        Span {
            start: self.start.min(max),
            end: self.end.min(max),
        }
    }

    /// Fails with `InvalidSpan` when the span runs past a text of `len` characters.
    pub fn check_within(&self, len: usize) -> CoreResult<()> {
        if self.end > len {
            return Err(CoreError::InvalidSpan(format!(
                "[{}, {}) exceeds text length {len}",
                self.start, self.end
            )));
        }
        Ok(())
    }

    /// The characters of `text` covered by this span, if it fits.
    pub fn slice<'a>(&self, text: &'a str) -> Option<&'a str> {
        let mut indices = text.char_indices().map(|(i, _)| i).chain(std::iter::once(text.len()));
        let start = indices.nth(self.start)?;
        let end = if self.is_empty() {
            start
        } else {
            indices.nth(self.len() - 1)?
        };
        text.get(start..end)
    }
}
