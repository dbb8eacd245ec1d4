//! core::types
//!
//! Strong types for the values that flow between the wiki, the sidebar and
//! the publishing platform.
//!
//! # Types
//!
//! - [`ReferenceId`] - Opaque id of a published announcement
//! - [`ArchiveEntry`] - One line of the archive region
//! - [`UtcTimestamp`] - RFC3339 timestamp
//! - [`Fingerprint`] - Content hash of a document
//!
//! # Validation
//!
//! A [`ReferenceId`] is checked at construction time against the same
//! character class the archive grammar accepts, so an id that the next run
//! could not parse back is never written to the wiki.
//!
//! # Examples
//!
//! ```
//! use gotw::core::types::{ArchiveEntry, ReferenceId};
//! use chrono::NaiveDate;
//!
//! let id = ReferenceId::new("abc123").unwrap();
//! let entry = ArchiveEntry::new(NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(), "Catan", id);
//! assert_eq!(entry.to_string(), "2024-06-01 : [Catan](/abc123)");
//!
//! assert!(ReferenceId::new("not an id").is_err());
//! ```

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

use super::grammar::REFERENCE_ID;

/// Date format used by archive lines.
pub const ARCHIVE_DATE_FORMAT: &str = "%Y-%m-%d";

/// Errors from type validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid reference id: {0}")]
    InvalidReferenceId(String),

    #[error("invalid item name: {0}")]
    InvalidName(String),
}

/// Identifier returned by the publisher for a published announcement.
///
/// The archive and sidebar link to `/<id>`, and the archive grammar only
/// accepts word characters in that position.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ReferenceId(String);

impl ReferenceId {
    /// Create a validated reference id.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidReferenceId` if the id is empty or contains
    /// anything other than word characters.
    pub fn new(id: impl Into<String>) -> Result<Self, TypeError> {
        let id = id.into();
        if id.is_empty() {
            return Err(TypeError::InvalidReferenceId(
                "reference id cannot be empty".into(),
            ));
        }
        if !REFERENCE_ID.is_match(&id) {
            return Err(TypeError::InvalidReferenceId(format!(
                "'{}' contains non-word characters",
                id
            )));
        }
        Ok(Self(id))
    }

    /// Get the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ReferenceId {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ReferenceId> for String {
    fn from(id: ReferenceId) -> Self {
        id.0
    }
}

impl AsRef<str> for ReferenceId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ReferenceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Validate a queue or archive name.
///
/// Names end up inside `[name](/id)` links, so a closing bracket or a line
/// break would corrupt the region on the next run.
pub fn validate_name(name: &str) -> Result<(), TypeError> {
    if name.trim().is_empty() {
        return Err(TypeError::InvalidName("name cannot be empty".into()));
    }
    if name.contains(']') || name.contains('\n') || name.contains('\r') {
        return Err(TypeError::InvalidName(format!(
            "'{}' contains ']' or a line break",
            name
        )));
    }
    Ok(())
}

/// One entry of the archive region: `YYYY-MM-DD : [Name](/ReferenceId)`.
///
/// The date is kept as written on the wiki. Lines with a date that is not a
/// real calendar day (`2019-02-30`) are still history and are written back
/// unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveEntry {
    /// Promotion date, `YYYY-MM-DD` text.
    pub date: String,
    /// Display name.
    pub name: String,
    /// Id of the published announcement.
    pub reference: ReferenceId,
}

impl ArchiveEntry {
    /// Create an entry for an item promoted on `date`.
    pub fn new(date: NaiveDate, name: impl Into<String>, reference: ReferenceId) -> Self {
        Self::recorded(date.format(ARCHIVE_DATE_FORMAT).to_string(), name, reference)
    }

    /// Create an entry from the date text found on the wiki.
    pub fn recorded(
        date: impl Into<String>,
        name: impl Into<String>,
        reference: ReferenceId,
    ) -> Self {
        Self {
            date: date.into(),
            name: name.into(),
            reference,
        }
    }

    /// The promotion date, if the recorded text is a real calendar day.
    pub fn parsed_date(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(&self.date, ARCHIVE_DATE_FORMAT).ok()
    }
}

impl std::fmt::Display for ArchiveEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} : [{}](/{})",
            self.date,
            self.name,
            self.reference
        )
    }
}

/// A UTC timestamp in RFC3339 format.
///
/// # Example
///
/// ```
/// use gotw::core::types::UtcTimestamp;
///
/// let now = UtcTimestamp::now();
/// println!("Current time: {}", now);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UtcTimestamp(chrono::DateTime<chrono::Utc>);

impl UtcTimestamp {
    /// Create a timestamp for the current moment.
    pub fn now() -> Self {
        Self(chrono::Utc::now())
    }

    /// Get the underlying datetime.
    pub fn as_datetime(&self) -> &chrono::DateTime<chrono::Utc> {
        &self.0
    }
}

impl std::fmt::Display for UtcTimestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}

/// SHA-256 over a document's text.
///
/// Recorded in the run journal so a resumed run can tell whether the wiki
/// was edited by someone else between stages.
///
/// # Example
///
/// ```
/// use gotw::core::types::Fingerprint;
///
/// let fp = Fingerprint::of("some wiki text");
/// assert_eq!(fp, Fingerprint::of("some wiki text"));
/// assert_ne!(fp, Fingerprint::of("other text"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Compute the fingerprint of a document.
    pub fn of(text: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(text.as_bytes());
        Self(hex::encode(hasher.finalize()))
    }

    /// Get the fingerprint as a hex string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Abbreviated form for log lines.
    pub fn short(&self) -> &str {
        &self.0[..12.min(self.0.len())]
    }
}

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
