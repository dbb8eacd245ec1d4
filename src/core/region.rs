//! core::region
//!
//! Locating and replacing marker-bounded regions in a document.
//!
//! # Design
//!
//! Pure functions over `&str`. A region is the first start marker and the
//! first end marker after it; everything in between is the body, blank lines
//! included. The line break that follows the end marker belongs to the
//! region, so replacing a region with a rendered block that ends in `\n`
//! leaves the surrounding text exactly as it was.
//!
//! Missing markers are an error, never an empty default: downstream parsing
//! would otherwise act on text that is not the region at all.

use std::ops::Range;

use super::error::TransformError;
use super::grammar::RegionMarkers;

/// A located region within a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Region<'a> {
    /// Markers the region was located with.
    pub markers: RegionMarkers,
    /// Byte range of the whole region, markers and trailing line break included.
    pub span: Range<usize>,
    /// Byte range of the body between the markers.
    pub body: Range<usize>,
    source: &'a str,
}

impl<'a> Region<'a> {
    /// The text between the markers.
    pub fn body(&self) -> &'a str {
        &self.source[self.body.clone()]
    }

    /// The full matched text, markers included.
    pub fn as_str(&self) -> &'a str {
        &self.source[self.span.clone()]
    }

    /// Text before the region.
    pub fn before(&self) -> &'a str {
        &self.source[..self.span.start]
    }

    /// Text after the region.
    pub fn after(&self) -> &'a str {
        &self.source[self.span.end..]
    }
}

/// Locate the first region bounded by `markers`.
///
/// # Errors
///
/// Returns [`TransformError::RegionNotFound`] if the start marker is absent,
/// or if no end marker follows it.
///
/// # Example
///
/// ```
/// use gotw::core::grammar::CALENDAR;
/// use gotw::core::region::locate;
///
/// let doc = "intro\n[//]: (CALS)\n * Catan\n[//]: (CALE)\noutro";
/// let region = locate(doc, &CALENDAR).unwrap();
/// assert_eq!(region.body(), "\n * Catan\n");
/// assert_eq!(region.after(), "outro");
/// ```
pub fn locate<'a>(doc: &'a str, markers: &RegionMarkers) -> Result<Region<'a>, TransformError> {
    let not_found = || TransformError::RegionNotFound {
        region: markers.name,
        start: markers.start,
        end: markers.end,
    };

    let start_idx = doc.find(markers.start).ok_or_else(not_found)?;
    let body_start = start_idx + markers.start.len();

    let end_idx = doc[body_start..]
        .find(markers.end)
        .map(|i| body_start + i)
        .ok_or_else(not_found)?;
    let end_marker_end = end_idx + markers.end.len();

    let rest = &doc[end_marker_end..];
    let span_end = if rest.starts_with("\r\n") {
        end_marker_end + 2
    } else if rest.starts_with('\n') {
        end_marker_end + 1
    } else {
        end_marker_end
    };

    Ok(Region {
        markers: *markers,
        span: start_idx..span_end,
        body: body_start..end_idx,
        source: doc,
    })
}

/// Replace a located region with `replacement`, returning a new document.
///
/// `region` must have been located in `doc`.
pub fn splice(doc: &str, region: &Region<'_>, replacement: &str) -> String {
    let mut out = String::with_capacity(doc.len() + replacement.len());
    out.push_str(&doc[..region.span.start]);
    out.push_str(replacement);
    out.push_str(&doc[region.span.end..]);
    out
}

/// Locate the region bounded by `markers` and replace it with `replacement`.
///
/// # Errors
///
/// Returns [`TransformError::RegionNotFound`] if the region is missing.
pub fn replace(
    doc: &str,
    markers: &RegionMarkers,
    replacement: &str,
) -> Result<String, TransformError> {
    let region = locate(doc, markers)?;
    Ok(splice(doc, &region, replacement))
}
