//! ui::announcement
//!
//! Announcement text for the weekly post.
//!
//! [`compose`] is pure: it takes resolved metadata and returns markdown.
//! [`compose_announcement`] does the lookups and decides how the next game
//! is rendered.
//!
//! # Example Output
//!
//! ```markdown
//! [//]: # (GOTWS)
//! This week's game is [**Catan**](https://cf.geekdo-images.com/catan.jpg)
//!
//!  * **BGG Link**: [Catan](https://boardgamegeek.com/boardgame/13)
//!  * **Designer**: Klaus Teuber
//!  ...
//! [//]: # (GOTWE)
//!
//! ---------------------
//!
//! Next Week: [**Azul**](https://boardgamegeek.com/boardgame/230802)
//! ```

use thiserror::Error;

use crate::core::grammar::ANNOUNCEMENT;
use crate::metadata::{GameMetadata, MetadataError, MetadataSource};

/// Sentence used when the calendar has nothing after the current game.
pub const NO_NEXT_GAME: &str = "There is no Game of the Week scheduled for next week.";

/// Separator between the generated block and the next-week line.
const RULE: &str = "---------------------";

#[derive(Debug, Error)]
pub enum ComposeError {
    #[error("'{0}' was not found in the metadata source")]
    MetadataNotFound(String),

    #[error("metadata lookup for '{name}' failed: {source}")]
    Lookup {
        name: String,
        #[source]
        source: MetadataError,
    },
}

/// How to render the game after this one.
#[derive(Debug, Clone, Copy)]
pub enum NextWeek<'a> {
    /// Nothing is queued.
    Nothing,
    /// Resolved: link to its metadata page.
    Linked(&'a GameMetadata),
    /// Unresolved: print the name as queued.
    Named(&'a str),
}

/// A composed post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Announcement {
    pub title: String,
    pub body: String,
}

/// Post title for a game.
pub fn title(name: &str) -> String {
    format!("Game of the Week: {}", name)
}

/// `Designer`/`Designers` style label and value.
///
/// An empty list renders as `Unknown` under the singular label.
fn labelled_list(label: &str, items: &[String]) -> (String, String) {
    match items.len() {
        0 => (label.to_string(), "Unknown".to_string()),
        1 => (label.to_string(), items[0].clone()),
        _ => (format!("{}s", label), items.join(", ")),
    }
}

fn list_line(label: &str, items: &[String]) -> String {
    let (label, value) = labelled_list(label, items);
    format!(" * **{}**: {}\n", label, value)
}

/// `2` when equal, `2 - 4` otherwise.
pub fn player_count(min: u32, max: u32) -> String {
    if min == max {
        min.to_string()
    } else {
        format!("{} - {}", min, max)
    }
}

fn raters(count: u64) -> &'static str {
    if count > 1 {
        "people"
    } else {
        "person"
    }
}

/// Build the announcement body.
pub fn compose(game: &GameMetadata, next: NextWeek<'_>) -> String {
    let mut text = String::new();

    text.push_str(ANNOUNCEMENT.start);
    text.push('\n');
    match game.image_url() {
        Some(image) => text.push_str(&format!(
            "This week's game is [**{}**]({})\n\n",
            game.name, image
        )),
        None => text.push_str(&format!("This week's game is **{}**\n\n", game.name)),
    }

    text.push_str(&format!(
        " * **BGG Link**: [{}]({})\n",
        game.name,
        game.page_url()
    ));
    text.push_str(&list_line("Designer", &game.designers));
    text.push_str(&list_line("Publisher", &game.publishers));
    let year = game
        .year
        .map(|y| y.to_string())
        .unwrap_or_else(|| "Unknown".to_string());
    text.push_str(&format!(" * **Year Released**: {}\n", year));
    text.push_str(&list_line("Mechanic", &game.mechanics));
    text.push_str(&format!(
        " * **Number of Players**: {}\n",
        player_count(game.min_players, game.max_players)
    ));
    text.push_str(&format!(
        " * **Playing Time**: {} minutes\n",
        game.playing_time
    ));
    if !game.expansions.is_empty() {
        text.push_str(&format!(
            " * **Expansions**: {}\n",
            game.expansions.join(", ")
        ));
    }

    text.push_str(" * **Ratings**:\n");
    text.push_str(&format!(
        "    * Average rating is {:.2} (rated by {} {})\n",
        game.rating_average,
        game.users_rated,
        raters(game.users_rated)
    ));
    let ranks: Vec<String> = game
        .ranks
        .iter()
        .map(|r| format!("{}: {}", r.label, r.value))
        .collect();
    text.push_str(&format!("    * {}\n", ranks.join(", ")));

    text.push_str("\n\n");
    text.push_str(&format!(
        "**Description from Boardgamegeek**:\n\n{}\n\n",
        game.description
    ));
    text.push_str(ANNOUNCEMENT.end);
    text.push_str("\n\n");
    text.push_str(RULE);
    text.push_str("\n\n");

    match next {
        NextWeek::Nothing => text.push_str(NO_NEXT_GAME),
        NextWeek::Linked(next) => text.push_str(&format!(
            "Next Week: [**{}**]({})\n\n",
            next.name,
            next.page_url()
        )),
        NextWeek::Named(name) => text.push_str(&format!("Next Week: {}", name)),
    }

    text
}

/// Look up `name` (and `next`, if any) and compose the post.
///
/// A missing or failing lookup of the next game falls back to its bare name.
///
/// # Errors
///
/// - [`ComposeError::MetadataNotFound`] if `name` is unknown
/// - [`ComposeError::Lookup`] if looking up `name` fails
pub async fn compose_announcement(
    source: &dyn MetadataSource,
    name: &str,
    next: Option<&str>,
) -> Result<Announcement, ComposeError> {
    let game = source
        .lookup(name)
        .await
        .map_err(|source| ComposeError::Lookup {
            name: name.to_string(),
            source,
        })?
        .ok_or_else(|| ComposeError::MetadataNotFound(name.to_string()))?;

    let next_game = match next {
        Some(next_name) => match source.lookup(next_name).await {
            Ok(found) => {
                if found.is_none() {
                    tracing::warn!(game = %next_name, "next game not found, using its name");
                }
                found
            }
            Err(e) => {
                tracing::error!(game = %next_name, error = %e, "next game lookup failed, using its name");
                None
            }
        },
        None => None,
    };

    let next_week = match (next, next_game.as_ref()) {
        (None, _) => NextWeek::Nothing,
        (Some(_), Some(game)) => NextWeek::Linked(game),
        (Some(name), None) => NextWeek::Named(name),
    };

    Ok(Announcement {
        title: title(&game.name),
        body: compose(&game, next_week),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::mock::MockCatalog;
    use crate::metadata::Rank;

    fn catan() -> GameMetadata {
        GameMetadata {
            id: 13,
            name: "Catan".into(),
            image: Some("//cf.geekdo-images.com/catan.jpg".into()),
            year: Some(1995),
            designers: vec!["Klaus Teuber".into()],
            publishers: vec!["KOSMOS".into(), "Catan Studio".into()],
            mechanics: vec!["Dice Rolling".into(), "Trading".into()],
            expansions: vec!["Catan: Seafarers".into()],
            min_players: 3,
            max_players: 4,
            playing_time: 120,
            rating_average: 7.1,
            users_rated: 120000,
            ranks: vec![
                Rank {
                    label: "Board Game Rank".into(),
                    value: "500".into(),
                },
                Rank {
                    label: "Family Game Rank".into(),
                    value: "100".into(),
                },
            ],
            description: "Trade, build & settle.".into(),
        }
    }

    // ==========================================================================
    // Labels
    // ==========================================================================

    mod labels {
        use super::*;

        #[test]
        fn singular() {
            assert_eq!(
                labelled_list("Designer", &["Ann".into()]),
                ("Designer".into(), "Ann".into())
            );
        }

        #[test]
        fn plural() {
            assert_eq!(
                labelled_list("Designer", &["Ann".into(), "Bob".into()]),
                ("Designers".into(), "Ann, Bob".into())
            );
        }

        #[test]
        fn empty_is_unknown() {
            assert_eq!(
                labelled_list("Designer", &[]),
                ("Designer".into(), "Unknown".into())
            );
        }

        #[test]
        fn players() {
            assert_eq!(player_count(2, 2), "2");
            assert_eq!(player_count(2, 4), "2 - 4");
        }

        #[test]
        fn rater_noun() {
            assert_eq!(raters(0), "person");
            assert_eq!(raters(1), "person");
            assert_eq!(raters(2), "people");
        }
    }

    // ==========================================================================
    // Body
    // ==========================================================================

    mod body {
        use super::*;

        #[test]
        fn full_announcement() {
            let azul = GameMetadata {
                id: 230802,
                name: "Azul".into(),
                ..Default::default()
            };
            let text = compose(&catan(), NextWeek::Linked(&azul));
            insta::assert_snapshot!(text, @r"
[//]: # (GOTWS)
This week's game is [**Catan**](https://cf.geekdo-images.com/catan.jpg)

 * **BGG Link**: [Catan](https://boardgamegeek.com/boardgame/13)
 * **Designer**: Klaus Teuber
 * **Publishers**: KOSMOS, Catan Studio
 * **Year Released**: 1995
 * **Mechanics**: Dice Rolling, Trading
 * **Number of Players**: 3 - 4
 * **Playing Time**: 120 minutes
 * **Expansions**: Catan: Seafarers
 * **Ratings**:
    * Average rating is 7.10 (rated by 120000 people)
    * Board Game Rank: 500, Family Game Rank: 100


**Description from Boardgamegeek**:

Trade, build & settle.

[//]: # (GOTWE)

---------------------

Next Week: [**Azul**](https://boardgamegeek.com/boardgame/230802)
");
        }

        #[test]
        fn sparse_record() {
            let game = GameMetadata {
                id: 1,
                name: "Mystery".into(),
                min_players: 2,
                max_players: 2,
                users_rated: 1,
                ..Default::default()
            };
            let text = compose(&game, NextWeek::Nothing);

            assert!(text.starts_with("[//]: # (GOTWS)\nThis week's game is **Mystery**\n\n"));
            assert!(text.contains(" * **Designer**: Unknown\n"));
            assert!(text.contains(" * **Year Released**: Unknown\n"));
            assert!(text.contains(" * **Number of Players**: 2\n"));
            assert!(text.contains("(rated by 1 person)"));
            assert!(!text.contains("Expansions"));
            assert!(text.ends_with(NO_NEXT_GAME));
        }

        #[test]
        fn unresolved_next_is_bare_name() {
            let text = compose(&catan(), NextWeek::Named("Homebrew Thing"));
            assert!(text.ends_with("---------------------\n\nNext Week: Homebrew Thing"));
        }

        #[test]
        fn generated_block_is_a_region() {
            let text = compose(&catan(), NextWeek::Nothing);
            let region = crate::core::region::locate(&text, &ANNOUNCEMENT).unwrap();
            assert!(region.body().contains("**Description from Boardgamegeek**"));
        }
    }

    // ==========================================================================
    // Lookups
    // ==========================================================================

    mod lookups {
        use super::*;

        #[tokio::test]
        async fn primary_missing_is_error() {
            let catalog = MockCatalog::new();
            let err = compose_announcement(&catalog, "Catan", None)
                .await
                .unwrap_err();
            assert!(matches!(err, ComposeError::MetadataNotFound(n) if n == "Catan"));
        }

        #[tokio::test]
        async fn primary_failure_is_error() {
            let catalog = MockCatalog::new().fail_lookup("Catan", MetadataError::RateLimited);
            assert!(matches!(
                compose_announcement(&catalog, "Catan", None).await,
                Err(ComposeError::Lookup { .. })
            ));
        }

        #[tokio::test]
        async fn next_failure_falls_back_to_name() {
            let catalog = MockCatalog::new()
                .with_game(catan())
                .fail_lookup("Azul", MetadataError::NetworkError("reset".into()));
            let post = compose_announcement(&catalog, "Catan", Some("Azul"))
                .await
                .unwrap();
            assert_eq!(post.title, "Game of the Week: Catan");
            assert!(post.body.ends_with("Next Week: Azul"));
        }

        #[tokio::test]
        async fn next_found_is_linked() {
            let catalog = MockCatalog::new()
                .with_game(catan())
                .with_named("Azul", 230802);
            let post = compose_announcement(&catalog, "Catan", Some("Azul"))
                .await
                .unwrap();
            assert!(post
                .body
                .contains("Next Week: [**Azul**](https://boardgamegeek.com/boardgame/230802)"));
            assert_eq!(catalog.lookups(), vec!["Catan", "Azul"]);
        }

        #[tokio::test]
        async fn no_next_skips_lookup() {
            let catalog = MockCatalog::new().with_game(catan());
            let post = compose_announcement(&catalog, "Catan", None).await.unwrap();
            assert!(post.body.ends_with(NO_NEXT_GAME));
            assert_eq!(catalog.lookups(), vec!["Catan"]);
        }
    }
}
