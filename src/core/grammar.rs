//! core::grammar
//!
//! The markers and line shapes that make up the wiki and sidebar "format".
//!
//! # Design
//!
//! These literals are the wire format between runs: whatever this run
//! writes, the next run must be able to find again. They are defined here
//! once, and every locator, parser and renderer refers to them instead of
//! building its own patterns.
//!
//! ```markdown
//! [//]: (CALS)
//!  * Azul
//!  * Brass: Birmingham
//! [//]: (CALE)
//!
//! [//]: (GOTWS)
//!  * 2024-06-01 : [Catan](/abc123)
//! [//]: (GOTWE)
//! ```
//!
//! Sidebar:
//!
//! ```markdown
//! [Game of the Week: Catan](/abc123) [Rules](/wiki/rules)
//!
//! [//]: # (GOTWLINK)
//! [Catan](/abc123)
//! ```

use once_cell::sync::Lazy;
use regex::Regex;

/// A named pair of literal markers bounding a region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegionMarkers {
    /// Human-readable region name used in errors and logs.
    pub name: &'static str,
    /// Literal start marker.
    pub start: &'static str,
    /// Literal end marker.
    pub end: &'static str,
}

/// Upcoming queue on the wiki page.
pub const CALENDAR: RegionMarkers = RegionMarkers {
    name: "calendar",
    start: "[//]: (CALS)",
    end: "[//]: (CALE)",
};

/// Archive of promoted items on the wiki page.
pub const ARCHIVE: RegionMarkers = RegionMarkers {
    name: "archive",
    start: "[//]: (GOTWS)",
    end: "[//]: (GOTWE)",
};

/// Markers wrapped around the generated part of an announcement.
pub const ANNOUNCEMENT: RegionMarkers = RegionMarkers {
    name: "announcement",
    start: "[//]: # (GOTWS)",
    end: "[//]: # (GOTWE)",
};

/// Marker line preceding the sidebar link.
pub const SIDEBAR_LINK_MARKER: &str = "[//]: # (GOTWLINK)";

/// Literal prefix of the link-bar phrase.
pub const LINK_BAR_PREFIX: &str = "[Game of the Week: ";

/// Prefix written before every list item.
pub const LIST_ITEM_PREFIX: &str = " * ";

/// A list item line: optional indentation, `*`, whitespace, value.
pub static LIST_ITEM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[ \t]*\*[ \t]+(?P<value>.*)$").unwrap());

/// An archive record: `YYYY-MM-DD : [Name](/ReferenceId)`.
pub static ARCHIVE_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?P<date>\d{4}-\d{2}-\d{2}) : \[(?P<name>[^\]]+)\]\(/(?P<id>\w+)\)").unwrap()
});

/// A whole reference id: the `id` group of [`ARCHIVE_LINE`] on its own.
pub static REFERENCE_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\w+$").unwrap());

/// The link-bar phrase plus the single whitespace character after it.
pub static LINK_BAR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?s){}[^\]]+\]\(/\w+\)\s",
        regex::escape(LINK_BAR_PREFIX.trim_end())
    ))
    .unwrap()
});

/// The sidebar marker line immediately followed by one markdown link.
pub static SIDEBAR_LINK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?s){}\n\[[^\]]+\]\(/\w+\)",
        regex::escape(SIDEBAR_LINK_MARKER)
    ))
    .unwrap()
});

/// Render the link-bar phrase for an item.
///
/// The trailing space stands in for the whitespace character that
/// [`LINK_BAR`] consumes.
pub fn link_bar_phrase(name: &str, reference: &str) -> String {
    format!("{}{}](/{}) ", LINK_BAR_PREFIX, name, reference)
}

/// Render the marker line and link that make up the sidebar link.
pub fn sidebar_link(name: &str, reference: &str) -> String {
    format!("{}\n[{}](/{})", SIDEBAR_LINK_MARKER, name, reference)
}

#[cfg(test)]
mod tests {
    use super::*;

    // =============================================================
    // List items
    // =============================================================

    #[test]
    fn list_item_with_leading_space() {
        let caps = LIST_ITEM.captures(" * Catan").unwrap();
        assert_eq!(&caps["value"], "Catan");
    }

    #[test]
    fn list_item_without_indent() {
        let caps = LIST_ITEM.captures("* Brass: Birmingham").unwrap();
        assert_eq!(&caps["value"], "Brass: Birmingham");
    }

    #[test]
    fn bold_text_is_not_a_list_item() {
        assert!(LIST_ITEM.captures("**Bold** text").is_none());
        assert!(LIST_ITEM.captures("*emphasis*").is_none());
    }

    #[test]
    fn marker_lines_are_not_list_items() {
        assert!(LIST_ITEM.captures(CALENDAR.start).is_none());
        assert!(LIST_ITEM.captures(ARCHIVE.end).is_none());
    }

    // =============================================================
    // Archive lines
    // =============================================================

    #[test]
    fn archive_line_captures_triple() {
        let caps = ARCHIVE_LINE
            .captures(" * 2024-06-01 : [Catan](/abc123)")
            .unwrap();
        assert_eq!(&caps["date"], "2024-06-01");
        assert_eq!(&caps["name"], "Catan");
        assert_eq!(&caps["id"], "abc123");
    }

    #[test]
    fn archive_line_requires_exact_separator() {
        assert!(ARCHIVE_LINE.captures("2024-06-01: [Catan](/abc123)").is_none());
        assert!(ARCHIVE_LINE.captures("2024-06-01 : [Catan](abc123)").is_none());
        assert!(ARCHIVE_LINE.captures("24-06-01 : [Catan](/abc123)").is_none());
    }

    // =============================================================
    // Sidebar patterns
    // =============================================================

    #[test]
    fn link_bar_matches_phrase_and_trailing_space() {
        let text = "[Game of the Week: Azul](/q1w2e3) [Rules](/wiki/rules)";
        let m = LINK_BAR.find(text).unwrap();
        assert_eq!(m.as_str(), "[Game of the Week: Azul](/q1w2e3) ");
    }

    #[test]
    fn link_bar_does_not_run_across_links() {
        let text = "[Game of the Week: Azul](/wiki/gotw) [Other](/abc) ";
        // The path token must be a single segment, and the title cannot
        // swallow a closing bracket, so nothing here matches.
        assert!(LINK_BAR.find(text).is_none());
    }

    #[test]
    fn sidebar_link_matches_marker_and_link() {
        let text = "intro\n[//]: # (GOTWLINK)\n[Azul](/q1w2e3)\nmore";
        let m = SIDEBAR_LINK.find(text).unwrap();
        assert_eq!(m.as_str(), "[//]: # (GOTWLINK)\n[Azul](/q1w2e3)");
    }

    #[test]
    fn rendered_snippets_match_their_patterns() {
        let phrase = link_bar_phrase("Catan", "abc123");
        assert!(LINK_BAR.is_match(&phrase));
        assert_eq!(phrase, "[Game of the Week: Catan](/abc123) ");

        let link = sidebar_link("Catan", "abc123");
        assert!(SIDEBAR_LINK.is_match(&link));
    }
}
