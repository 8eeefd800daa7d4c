use log::debug;

use crate::error::ValidationError;
use crate::normalize::to_half_width;

/// Widest range a single `start-end` token may expand to.
pub const MAX_RANGE_SPAN: u32 = 100_000;

/// Ordered 1-based page numbers as the user typed them. Repeats are kept and
/// nothing is sorted; ranges expand ascending at their own position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageSpec {
    pages: Vec<u32>,
}

impl PageSpec {
    /// Parse a comma-separated spec like "1,3,5-7".
    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        let pages = parse_pages(s);
        if pages.is_empty() {
            return Err(ValidationError::NoPages);
        }
        Ok(PageSpec { pages })
    }

    /// Build a spec from the two fields of a range form.
    pub fn from_range(start: &str, end: &str) -> Result<Self, ValidationError> {
        RangeSpec::parse(start, end)
            .map(|range| PageSpec {
                pages: range.expand(),
            })
            .ok_or(ValidationError::InvalidRange)
    }

    /// Every page but the last of a `total`-page document.
    pub fn all_but_last(total: u32) -> Result<Self, ValidationError> {
        if total <= 1 {
            return Err(ValidationError::OnlyPage);
        }
        Ok(PageSpec {
            pages: (1..total).collect(),
        })
    }

    pub fn pages(&self) -> &[u32] {
        &self.pages
    }
}

/// A contiguous `start..=end` interval, `0 < start <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeSpec {
    pub start: u32,
    pub end: u32,
}

impl RangeSpec {
    pub fn new(start: u32, end: u32) -> Option<Self> {
        if start == 0 || end < start || end - start >= MAX_RANGE_SPAN {
            return None;
        }
        Some(RangeSpec { start, end })
    }

    /// Parse the two text fields. Each must be a plain number after normalization.
    pub fn parse(start: &str, end: &str) -> Option<Self> {
        let start = to_half_width(start).parse::<u32>().ok()?;
        let end = to_half_width(end).parse::<u32>().ok()?;
        Self::new(start, end)
    }

    pub fn expand(&self) -> Vec<u32> {
        (self.start..=self.end).collect()
    }
}

/// Expand a page spec string into page numbers, dropping tokens that do not parse.
///
/// The result may be empty; [`PageSpec::parse`] turns that into a validation error.
pub fn parse_pages(s: &str) -> Vec<u32> {
    let normalized = to_half_width(s);
    let mut pages = Vec::new();
    for part in normalized.split(',') {
        expand_token(part, &mut pages);
    }
    pages
}

fn expand_token(part: &str, pages: &mut Vec<u32>) {
    if part.is_empty() {
        return;
    }

    if let Some((start, end)) = part.split_once('-') {
        let (Ok(start), Ok(end)) = (start.parse::<u32>(), end.parse::<u32>()) else {
            debug!("dropping malformed range token {:?}", part);
            return;
        };
        // page 0 is never valid, so "0-3" still yields 1..=3
        match RangeSpec::new(start.max(1), end) {
            Some(range) => pages.extend(range.start..=range.end),
            None => debug!("dropping empty range token {:?}", part),
        }
        return;
    }

    match part.parse::<u32>() {
        Ok(page) if page > 0 => pages.push(page),
        _ => debug!("dropping page token {:?}", part),
    }
}
