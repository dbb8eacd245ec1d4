//! Property-based tests for the region engine.
//!
//! These tests use proptest to verify invariants hold across
//! randomly generated calendars, archives and sidebars.

use chrono::NaiveDate;
use proptest::prelude::*;

use gotw::core::calendar::{promote, read_archive, read_queue};
use gotw::core::error::TransformError;
use gotw::core::grammar::{ARCHIVE, CALENDAR};
use gotw::core::records::{parse_archive, render_list};
use gotw::core::region::locate;
use gotw::core::sidebar::update_sidebar;
use gotw::core::types::{ArchiveEntry, ReferenceId};

/// Strategy for game names as moderators type them, markdown punctuation
/// included. Never contains `]`.
fn game_name() -> impl Strategy<Value = String> {
    "[A-Za-z0-9(\\[][A-Za-z0-9 :'&!.$()\\[-]{0,24}[A-Za-z0-9)$]"
}

/// Strategy for names that cannot be linked.
fn unlinkable_name() -> impl Strategy<Value = String> {
    (game_name(), "[\\]\n]", game_name()).prop_map(|(a, bad, b)| format!("{}{}{}", a, bad, b))
}

/// Strategy for reference ids.
fn reference_id() -> impl Strategy<Value = ReferenceId> {
    "[a-z0-9]{5,8}".prop_map(|id| ReferenceId::new(id).unwrap())
}

fn date() -> impl Strategy<Value = NaiveDate> {
    (2015i32..2030, 1u32..=12, 1u32..=28)
        .prop_map(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d).unwrap())
}

fn archive_entry() -> impl Strategy<Value = ArchiveEntry> {
    (date(), game_name(), reference_id()).prop_map(|(d, n, r)| ArchiveEntry::new(d, n, r))
}

/// Archive entries as found on the wiki, including dates that are not
/// real calendar days.
fn recorded_entry() -> impl Strategy<Value = ArchiveEntry> {
    ("[0-9]{4}-[0-9]{2}-[0-9]{2}", game_name(), reference_id())
        .prop_map(|(d, n, r)| ArchiveEntry::recorded(d, n, r))
}

/// Free text that never contains a marker.
fn prose() -> impl Strategy<Value = String> {
    "[A-Za-z ,.\n#]{0,80}"
}

fn wiki(head: &str, queue: &[String], archive: &[ArchiveEntry], middle: &str, tail: &str) -> String {
    format!(
        "{}\n{}{}\n{}{}",
        head,
        render_list(&CALENDAR, queue),
        middle,
        render_list(&ARCHIVE, archive),
        tail
    )
}

proptest! {
    #[test]
    fn queue_round_trips(queue in prop::collection::vec(game_name(), 1..12)) {
        let doc = render_list(&CALENDAR, &queue);
        prop_assert_eq!(read_queue(&doc).unwrap(), queue);
    }

    #[test]
    fn archive_round_trips(archive in prop::collection::vec(recorded_entry(), 0..12)) {
        let rendered = render_list(&ARCHIVE, &archive);
        let region = locate(&rendered, &ARCHIVE).unwrap();
        let parsed = parse_archive(region.body());
        prop_assert_eq!(&parsed, &archive);
        prop_assert_eq!(render_list(&ARCHIVE, &parsed), rendered);
    }

    #[test]
    fn promote_keeps_every_archived_line(
        queue in prop::collection::vec(game_name(), 1..4),
        archive in prop::collection::vec(recorded_entry(), 0..8),
        reference in reference_id(),
        today in date(),
    ) {
        let doc = wiki("", &queue, &archive, "", "");
        let update = promote(&doc, &queue, &reference, today).unwrap();
        for entry in &archive {
            let line = format!(" * {}\n", entry);
            prop_assert!(update.text.contains(&line));
        }
    }

    #[test]
    fn promote_rejects_unlinkable_head(
        head in unlinkable_name(),
        rest in prop::collection::vec(game_name(), 0..4),
        reference in reference_id(),
        today in date(),
    ) {
        let mut queue = vec![head.clone()];
        queue.extend(rest);
        let doc = wiki("", &queue, &[], "", "");
        let result = promote(&doc, &queue, &reference, today);
        prop_assert!(
            matches!(&result, Err(TransformError::InvalidName { name, .. }) if name == &head),
            "unexpected {:?}",
            result
        );
    }

    #[test]
    fn promote_pops_head_into_archive(
        queue in prop::collection::vec(game_name(), 1..8),
        archive in prop::collection::vec(archive_entry(), 0..8),
        head in prose(),
        middle in prose(),
        tail in prose(),
        reference in reference_id(),
        today in date(),
    ) {
        let doc = wiki(&head, &queue, &archive, &middle, &tail);
        let update = promote(&doc, &queue, &reference, today).unwrap();

        // Text outside the regions is untouched.
        let head_line = format!("{}\n", head);
        prop_assert!(update.text.starts_with(&head_line));
        prop_assert!(update.text.ends_with(&tail));
        prop_assert!(update.text.contains(&middle));

        prop_assert_eq!(&update.remaining, &queue[1..].to_vec());
        if queue.len() > 1 {
            prop_assert_eq!(read_queue(&update.text).unwrap(), queue[1..].to_vec());
        } else {
            prop_assert!(read_queue(&update.text).is_err());
        }

        let entries = read_archive(&update.text).unwrap();
        prop_assert_eq!(entries.len(), archive.len() + 1);
        prop_assert_eq!(update.archive_len, archive.len() + 1);
        prop_assert!(entries.windows(2).all(|w| w[0].name <= w[1].name));
        prop_assert!(entries
            .iter()
            .any(|e| e.name == queue[0] && e.reference == reference && e.parsed_date() == Some(today)));
    }

    #[test]
    fn sidebar_repoint_only_depends_on_last_item(
        old_name in game_name(),
        mid_name in game_name(),
        new_name in game_name(),
        old_ref in reference_id(),
        mid_ref in reference_id(),
        new_ref in reference_id(),
        before in prose(),
        after in prose(),
    ) {
        prop_assume!(old_ref != mid_ref && mid_ref != new_ref && old_ref != new_ref);

        let sidebar = format!(
            "{} [Game of the Week: {}](/{}) |\n{}\n[//]: # (GOTWLINK)\n[{}](/{})\n{}",
            before, old_name, old_ref, after, old_name, old_ref, after
        );

        let direct = update_sidebar(&sidebar, &new_name, &new_ref).unwrap();
        let via = update_sidebar(&sidebar, &mid_name, &mid_ref).unwrap();
        let via = update_sidebar(&via, &new_name, &new_ref).unwrap();
        prop_assert_eq!(&direct, &via);

        let link_bar = format!("[Game of the Week: {}](/{}) |", new_name, new_ref);
        let link = format!("[//]: # (GOTWLINK)\n[{}](/{})", new_name, new_ref);
        prop_assert!(direct.contains(&link_bar));
        prop_assert!(direct.contains(&link));
        prop_assert!(direct.starts_with(&before));
    }
}
