//! Page selection strings such as `"all"`, `"1,3-5"` or `"2-end"`.

use crate::{FolioError, Result};
use std::collections::BTreeSet;

/// An inclusive run of 1-based pages. `end == None` runs to the last page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRange {
    pub start: u32,
    pub end: Option<u32>,
}

impl PageRange {
    pub fn single(page: u32) -> Self {
        PageRange {
            start: page,
            end: Some(page),
        }
    }
}

/// A set of 1-based pages chosen by the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageSelection {
    All,
    /// Ranges in input order; overlaps collapse on [`PageSelection::resolve`]
    Ranges(Vec<PageRange>),
}

impl PageSelection {
    /// Parse `"all"` or a comma separated list of pages and inclusive ranges.
    ///
    /// A range may end in `end`, meaning the last page of the document, so
    /// `"3-end"` selects everything from page 3 on. Whitespace around items is
    /// ignored. Ranges are kept unexpanded until the page count is known.
    pub fn parse(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        if trimmed.eq_ignore_ascii_case("all") {
            return Ok(PageSelection::All);
        }

        let mut ranges = Vec::new();
        for part in trimmed.split(',') {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }

            if let Some((start, end)) = part.split_once('-') {
                let start = parse_page_number(start)?;
                let end = if end.trim().eq_ignore_ascii_case("end") {
                    None
                } else {
                    Some(parse_page_number(end)?)
                };
                match end {
                    Some(end) if start > end => {
                        return Err(FolioError::validation(format!(
                            "Invalid page range '{}': start {} > end {}",
                            part, start, end
                        )));
                    }
                    _ => {}
                }
                ranges.push(PageRange { start, end });
            } else {
                ranges.push(PageRange::single(parse_page_number(part)?));
            }
        }

        if ranges.is_empty() {
            return Err(FolioError::validation(format!("Empty page selection '{}'", input)));
        }
        Ok(PageSelection::Ranges(ranges))
    }

    /// Resolve to sorted, deduplicated 0-based page indices for a document
    /// with `page_count` pages.
    ///
    /// # Errors
    ///
    /// `FolioError::Validation` if a selected page is beyond the document.
    pub fn resolve(&self, page_count: usize) -> Result<Vec<usize>> {
        let ranges = match self {
            PageSelection::All => return Ok((0..page_count).collect()),
            PageSelection::Ranges(ranges) => ranges,
        };

        let out_of_range = |page: u32| {
            FolioError::validation(format!(
                "Page {} is out of range, document has {} page(s)",
                page, page_count
            ))
        };

        let mut indices = BTreeSet::new();
        for range in ranges {
            let start = range.start as usize;
            if start > page_count {
                return Err(out_of_range(range.start));
            }
            let end = match range.end {
                Some(end) if end as usize > page_count => return Err(out_of_range(end)),
                Some(end) => end as usize,
                None => page_count,
            };
            indices.extend(start - 1..end);
        }
        Ok(indices.into_iter().collect())
    }
}

fn parse_page_number(raw: &str) -> Result<u32> {
    let raw = raw.trim();
    let page: u32 = raw
        .parse()
        .map_err(|_| FolioError::validation(format!("Invalid page number '{}'", raw)))?;
    if page == 0 {
        return Err(FolioError::validation("Page numbers start at 1"));
    }
    Ok(page)
}

/// Parse a page selection string; see [`PageSelection::parse`].
pub fn parse_page_selection(input: &str) -> Result<PageSelection> {
    PageSelection::parse(input)
}
