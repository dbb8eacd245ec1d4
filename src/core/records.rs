//! core::records
//!
//! Parsing region bodies into records and rendering records back into
//! regions.
//!
//! # Grammar
//!
//! Both lists share one line shape, a `*` list item (see
//! [`grammar::LIST_ITEM`]). The calendar holds plain names; the archive holds
//! `YYYY-MM-DD : [Name](/ReferenceId)` triples.
//!
//! Rendering always produces the start marker on its own line, one
//! ` * <record>` line per record, and the end marker on its own line, so
//! the output of [`render_list`] can be located and parsed again by the
//! next run.

use std::fmt::Display;

use super::error::TransformError;
use super::grammar::{self, RegionMarkers, LIST_ITEM_PREFIX};
use super::types::{ArchiveEntry, ReferenceId};

/// Parse the names listed in a region body, in document order.
///
/// # Errors
///
/// Returns [`TransformError::NoRecordsFound`] if the body holds no list items.
///
/// # Example
///
/// ```
/// use gotw::core::grammar::CALENDAR;
/// use gotw::core::records::parse_names;
///
/// let names = parse_names("\n * Catan\n * Azul\n", &CALENDAR).unwrap();
/// assert_eq!(names, vec!["Catan", "Azul"]);
/// ```
pub fn parse_names(body: &str, markers: &RegionMarkers) -> Result<Vec<String>, TransformError> {
    let names: Vec<String> = body
        .lines()
        .filter_map(|line| grammar::LIST_ITEM.captures(line))
        .map(|caps| caps["value"].trim_end_matches(['\r', '\n']).to_string())
        .filter(|name| !name.is_empty())
        .collect();

    if names.is_empty() {
        return Err(TransformError::NoRecordsFound {
            region: markers.name,
        });
    }
    Ok(names)
}

/// Parse archive entries from a region body.
///
/// Lines that do not have the archive shape are skipped. Every line that
/// does is kept, with its date text as written, so rewriting the archive
/// never drops history.
pub fn parse_archive(body: &str) -> Vec<ArchiveEntry> {
    body.lines()
        .filter_map(|line| grammar::ARCHIVE_LINE.captures(line))
        .filter_map(|caps| match ReferenceId::new(&caps["id"]) {
            Ok(reference) => Some(ArchiveEntry::recorded(
                &caps["date"],
                &caps["name"],
                reference,
            )),
            Err(e) => {
                tracing::warn!(line = &caps[0], error = %e, "skipping archive line");
                None
            }
        })
        .collect()
}

/// Render records as a complete region, markers included.
///
/// # Example
///
/// ```
/// use gotw::core::grammar::CALENDAR;
/// use gotw::core::records::render_list;
///
/// let rendered = render_list(&CALENDAR, &["Azul", "Catan"]);
/// assert_eq!(rendered, "[//]: (CALS)\n * Azul\n * Catan\n[//]: (CALE)\n");
///
/// let empty = render_list::<&str>(&CALENDAR, &[]);
/// assert_eq!(empty, "[//]: (CALS)\n[//]: (CALE)\n");
/// ```
pub fn render_list<T: Display>(markers: &RegionMarkers, records: &[T]) -> String {
    let mut out = String::new();
    out.push_str(markers.start);
    out.push('\n');
    for record in records {
        out.push_str(LIST_ITEM_PREFIX);
        out.push_str(&record.to_string());
        out.push('\n');
    }
    out.push_str(markers.end);
    out.push('\n');
    out
}
