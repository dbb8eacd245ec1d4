//! core::calendar
//!
//! Promoting the head of the queue into the archive.
//!
//! # Algorithm
//!
//! 1. Locate the calendar region and re-render it without the head.
//! 2. Locate the archive region in the already-updated text.
//! 3. Parse the archive, append `(today, head, reference)`.
//! 4. Stable sort the archive by name.
//! 5. Re-render the archive region.
//!
//! Either both regions change or the caller gets an error; a document with
//! only one of the two edits is never returned.
//!
//! The reference id is a parameter, not something this module can produce:
//! it only exists once the announcement has been published.

use chrono::NaiveDate;

use super::error::TransformError;
use super::grammar::{ARCHIVE, CALENDAR};
use super::records::{parse_archive, parse_names, render_list};
use super::region::{locate, splice};
use super::types::{validate_name, ArchiveEntry, ReferenceId};

/// Result of promoting the head of the queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WikiUpdate {
    /// The rewritten document.
    pub text: String,
    /// The entry that was appended to the archive.
    pub promoted: ArchiveEntry,
    /// The queue left on the calendar.
    pub remaining: Vec<String>,
    /// Number of archive entries after the update.
    pub archive_len: usize,
}

/// Read the queue from a wiki document.
///
/// # Errors
///
/// - [`TransformError::RegionNotFound`] if the calendar markers are missing
/// - [`TransformError::NoRecordsFound`] if the calendar is empty
pub fn read_queue(doc: &str) -> Result<Vec<String>, TransformError> {
    let region = locate(doc, &CALENDAR)?;
    parse_names(region.body(), &CALENDAR)
}

/// Read the archive from a wiki document.
///
/// # Errors
///
/// Returns [`TransformError::RegionNotFound`] if the archive markers are missing.
pub fn read_archive(doc: &str) -> Result<Vec<ArchiveEntry>, TransformError> {
    let region = locate(doc, &ARCHIVE)?;
    Ok(parse_archive(region.body()))
}

/// Sort archive entries by name, keeping the existing order among equal names.
pub fn sort_archive(entries: &mut [ArchiveEntry]) {
    entries.sort_by(|a, b| a.name.cmp(&b.name));
}

/// Move the head of `queue` from the calendar into the archive.
///
/// `queue` is the calendar as read at the start of the run, head first.
///
/// # Errors
///
/// - [`TransformError::EmptyQueue`] if `queue` is empty
/// - [`TransformError::InvalidName`] if the head contains `]` or a line break
/// - [`TransformError::RegionNotFound`] if either region is missing
/// - [`TransformError::WikiUpdateFailed`] if a substitution changed nothing
///
/// # Example
///
/// ```
/// use chrono::NaiveDate;
/// use gotw::core::calendar::promote;
/// use gotw::core::types::ReferenceId;
///
/// let doc = "[//]: (CALS)\n * Catan\n * Azul\n[//]: (CALE)\n\n[//]: (GOTWS)\n[//]: (GOTWE)\n";
/// let queue = vec!["Catan".to_string(), "Azul".to_string()];
/// let today = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
///
/// let update = promote(doc, &queue, &ReferenceId::new("abc123").unwrap(), today).unwrap();
/// assert!(update.text.contains("[//]: (CALS)\n * Azul\n[//]: (CALE)\n"));
/// assert!(update.text.contains(" * 2024-06-01 : [Catan](/abc123)\n"));
/// ```
pub fn promote(
    doc: &str,
    queue: &[String],
    reference: &ReferenceId,
    today: NaiveDate,
) -> Result<WikiUpdate, TransformError> {
    let (head, rest) = queue.split_first().ok_or(TransformError::EmptyQueue)?;
    check_name(head)?;

    let calendar = locate(doc, &CALENDAR)?;
    let with_calendar = splice(doc, &calendar, &render_list(&CALENDAR, rest));
    if with_calendar == doc {
        return Err(TransformError::WikiUpdateFailed(
            "calendar region unchanged after removing the current game".into(),
        ));
    }

    let archive = locate(&with_calendar, &ARCHIVE)?;
    let mut entries = parse_archive(archive.body());
    let promoted = ArchiveEntry::new(today, head.clone(), reference.clone());
    entries.push(promoted.clone());
    sort_archive(&mut entries);

    let text = splice(&with_calendar, &archive, &render_list(&ARCHIVE, &entries));
    if text == with_calendar {
        return Err(TransformError::WikiUpdateFailed(
            "archive region unchanged after adding the current game".into(),
        ));
    }

    tracing::debug!(
        promoted = %promoted,
        remaining = rest.len(),
        archive_len = entries.len(),
        "promoted head of queue"
    );

    Ok(WikiUpdate {
        text,
        promoted,
        remaining: rest.to_vec(),
        archive_len: entries.len(),
    })
}

/// Reject a name the archive grammar could not read back.
pub(crate) fn check_name(name: &str) -> Result<(), TransformError> {
    validate_name(name).map_err(|e| TransformError::InvalidName {
        name: name.to_string(),
        reason: e.to_string(),
    })
}
