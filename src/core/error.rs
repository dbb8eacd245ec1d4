//! core::error
//!
//! Errors raised by the region engine.
//!
//! Every variant is fatal to the transformation that raised it. The engine
//! returns one of these instead of a document, so a caller can never persist
//! a half-edited page.

use thiserror::Error;

/// Errors from locating, parsing and rewriting regions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransformError {
    /// A required marker pair is missing or out of order.
    #[error("{region} region not found: expected '{start}' followed by '{end}'")]
    RegionNotFound {
        /// Region name (e.g. "calendar").
        region: &'static str,
        /// Start marker literal.
        start: &'static str,
        /// End marker literal.
        end: &'static str,
    },

    /// A region was found but held no records where at least one is required.
    #[error("no records found in {region} region")]
    NoRecordsFound {
        /// Region name.
        region: &'static str,
    },

    /// Rewriting the wiki left it unchanged.
    #[error("wiki update failed: {0}")]
    WikiUpdateFailed(String),

    /// Rewriting the sidebar left it unchanged.
    #[error("sidebar update failed: {0}")]
    SidebarUpdateFailed(String),

    /// A name cannot be written into a `[name](/id)` link and read back.
    #[error("cannot write '{name}' to the wiki: {reason}")]
    InvalidName {
        /// The offending name.
        name: String,
        /// Why it was rejected.
        reason: String,
    },

    /// The queue passed to a transformer was empty.
    #[error("queue is empty")]
    EmptyQueue,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn region_not_found_names_markers() {
        let err = TransformError::RegionNotFound {
            region: "calendar",
            start: "[//]: (CALS)",
            end: "[//]: (CALE)",
        };
        let msg = err.to_string();
        assert!(msg.contains("calendar"));
        assert!(msg.contains("[//]: (CALS)"));
        assert!(msg.contains("[//]: (CALE)"));
    }

    #[test]
    fn display_formats() {
        assert_eq!(
            TransformError::NoRecordsFound { region: "calendar" }.to_string(),
            "no records found in calendar region"
        );
        assert_eq!(
            TransformError::SidebarUpdateFailed("link bar".into()).to_string(),
            "sidebar update failed: link bar"
        );
    }
}
