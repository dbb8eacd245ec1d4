//! Integration tests for the weekly run.
//!
//! These drive `engine::Pipeline` end to end with `MockSite` and
//! `MockCatalog` and check what lands on the wiki, the sidebar, the
//! subreddit and in modmail.

use chrono::NaiveDate;
use tempfile::TempDir;

use gotw::core::ops::{RunJournal, RunLock, Stage};
use gotw::core::paths::GotwPaths;
use gotw::engine::{Collaborators, Pipeline, PipelineError, PostOutcome, RunSettings};
use gotw::metadata::mock::MockCatalog;
use gotw::metadata::{GameMetadata, MetadataError, Rank};
use gotw::site::mock::{FailOn, MockOperation, MockSite};
use gotw::site::SiteError;
use gotw::ui::announcement::NO_NEXT_GAME;

const WIKI_PAGE: &str = "game_of_the_week";
const SIDEBAR_PAGE: &str = "config/sidebar";

const WIKI: &str = "\
# Game of the Week

Suggest games in the weekly thread.

[//]: (CALS)
 * Brass: Birmingham
 * Azul
 * Spirit Island
 * Root
[//]: (CALE)

## Past games

[//]: (GOTWS)
 * 2023-01-07 : [Agricola](/10aaaa)
 * 2023-01-14 : [Wingspan](/10bbbb)
[//]: (GOTWE)

Thanks for playing!
";

const SIDEBAR: &str = "\
**Links** [Game of the Week: Wingspan](/10bbbb) | [Wiki](/wiki/index)

---

[//]: # (GOTWLINK)
[Wingspan](/10bbbb)

Be nice.
";

struct World {
    _temp: TempDir,
    paths: GotwPaths,
    site: MockSite,
    catalog: MockCatalog,
}

impl World {
    fn new() -> Self {
        let temp = TempDir::new().unwrap();
        let paths = GotwPaths::new(temp.path().join("state"));
        let site = MockSite::new()
            .with_page(WIKI_PAGE, WIKI)
            .with_page(SIDEBAR_PAGE, SIDEBAR);
        let catalog = MockCatalog::new()
            .with_game(brass())
            .with_named("Azul", 230802)
            .with_named("Spirit Island", 162886)
            .with_named("Root", 237182);
        Self {
            _temp: temp,
            paths,
            site,
            catalog,
        }
    }

    fn pipeline(&self) -> Pipeline<'_> {
        self.pipeline_with(RunSettings::default())
    }

    fn pipeline_with(&self, settings: RunSettings) -> Pipeline<'_> {
        Pipeline::new(
            Collaborators::new(&self.site, &self.site, &self.site, &self.catalog),
            &self.paths,
            settings,
            NaiveDate::from_ymd_opt(2023, 1, 21).unwrap(),
        )
    }

    fn journal(&self) -> Option<RunJournal> {
        RunJournal::read(&self.paths, "boardgames").unwrap()
    }
}

fn brass() -> GameMetadata {
    GameMetadata {
        id: 224517,
        name: "Brass: Birmingham".into(),
        image: Some("//cf.geekdo-images.com/brass.jpg".into()),
        year: Some(2018),
        designers: vec!["Gavan Brown".into(), "Matt Tolman".into(), "Martin Wallace".into()],
        publishers: vec!["Roxley".into()],
        mechanics: vec!["Hand Management".into(), "Network and Route Building".into()],
        expansions: vec![],
        min_players: 2,
        max_players: 4,
        playing_time: 120,
        rating_average: 8.6,
        users_rated: 40000,
        ranks: vec![Rank {
            label: "Board Game Rank".into(),
            value: "1".into(),
        }],
        description: "Brass: Birmingham is an economic strategy game.".into(),
    }
}

// =============================================================================
// Successful runs
// =============================================================================

mod successful_run {
    use super::*;

    #[tokio::test]
    async fn whole_week() {
        let world = World::new();
        let outcome = world.pipeline().post(|_| true).await.unwrap();
        assert!(matches!(outcome, PostOutcome::Posted(ref r) if r.game == "Brass: Birmingham"));

        let posts = world.site.posts();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].title, "Game of the Week: Brass: Birmingham");
        assert!(posts[0].body.contains("https://boardgamegeek.com/boardgame/224517"));
        assert!(posts[0].body.contains("Gavan Brown, Matt Tolman, Martin Wallace"));
        // The next game is linked by name.
        assert!(posts[0].body.contains("Azul"));

        let wiki = world.site.page(WIKI_PAGE).unwrap();
        assert_eq!(
            wiki,
            WIKI.replace(" * Brass: Birmingham\n * Azul", " * Azul").replace(
                " * 2023-01-07 : [Agricola](/10aaaa)\n",
                " * 2023-01-07 : [Agricola](/10aaaa)\n * 2023-01-21 : [Brass: Birmingham](/mock1)\n"
            )
        );

        let sidebar = world.site.page(SIDEBAR_PAGE).unwrap();
        assert!(sidebar.contains("[Game of the Week: Brass: Birmingham](/mock1) | [Wiki]"));
        assert!(sidebar.contains("[//]: # (GOTWLINK)\n[Brass: Birmingham](/mock1)\n\nBe nice."));

        assert!(world.site.notifications().is_empty());
        assert!(world.journal().is_none());
    }

    #[tokio::test]
    async fn operations_happen_in_order() {
        let world = World::new();
        world.pipeline().post(|_| true).await.unwrap();

        let writes_and_posts: Vec<String> = world
            .site
            .operations()
            .into_iter()
            .filter_map(|op| match op {
                MockOperation::Publish { .. } => Some("publish".to_string()),
                MockOperation::Distinguish { .. } => Some("distinguish".to_string()),
                MockOperation::Write { page, reason } => {
                    assert_eq!(reason, "GotW post update for Brass: Birmingham");
                    Some(page)
                }
                _ => None,
            })
            .collect();
        assert_eq!(
            writes_and_posts,
            vec!["publish", "distinguish", WIKI_PAGE, SIDEBAR_PAGE]
        );
    }

    #[tokio::test]
    async fn last_game_on_calendar() {
        let world = World::new();
        world.site.set_page(
            WIKI_PAGE,
            "[//]: (CALS)\n * Root\n[//]: (CALE)\n[//]: (GOTWS)\n[//]: (GOTWE)\n",
        );

        world.pipeline().post(|_| true).await.unwrap();

        let posts = world.site.posts();
        assert!(posts[0].body.ends_with(NO_NEXT_GAME));
        assert_eq!(
            world.site.page(WIKI_PAGE).unwrap(),
            "[//]: (CALS)\n[//]: (CALE)\n[//]: (GOTWS)\n * 2023-01-21 : [Root](/mock1)\n[//]: (GOTWE)\n"
        );
        let mail = world.site.notifications();
        assert_eq!(mail.len(), 1);
        assert_eq!(mail[0].0, "Top up the GotW Calendar");
        assert_eq!(mail[0].1, "Fewer than 3 games on the GotW. Please add more.");
    }

    #[tokio::test]
    async fn reminder_threshold_is_configurable() {
        let world = World::new();
        let settings = RunSettings {
            reminder_threshold: 4,
            ..RunSettings::default()
        };
        world.pipeline_with(settings).post(|_| true).await.unwrap();

        let mail = world.site.notifications();
        assert_eq!(mail.len(), 1);
        assert_eq!(mail[0].1, "Fewer than 5 games on the GotW. Please add more.");
    }

    #[tokio::test]
    async fn unresolved_next_game_is_named() {
        let world = World::new();
        world
            .catalog
            .clone()
            .fail_lookup("Azul", MetadataError::RateLimited);

        world.pipeline().post(|_| true).await.unwrap();
        let body = &world.site.posts()[0].body;
        assert!(body.contains("Azul"));
        assert!(!body.contains("boardgame/230802"));
    }

    #[tokio::test]
    async fn other_subreddit_and_page() {
        let world = World::new();
        world.site.set_page("calendar", WIKI);
        let settings = RunSettings {
            subreddit: "tabletop".into(),
            wiki_page: "calendar".into(),
            ..RunSettings::default()
        };
        world.pipeline_with(settings).post(|_| true).await.unwrap();

        assert_eq!(world.site.page(WIKI_PAGE).unwrap(), WIKI);
        assert_ne!(world.site.page("calendar").unwrap(), WIKI);
    }
}

// =============================================================================
// Failures before publishing
// =============================================================================

mod before_publish {
    use super::*;

    #[tokio::test]
    async fn markers_missing() {
        let world = World::new();
        world
            .site
            .set_page(WIKI_PAGE, &WIKI.replace("[//]: (CALE)", "[//]: (CAL_END)"));

        let err = world.pipeline().post(|_| true).await.unwrap_err();
        assert_eq!(err.exit_code(), 1);
        assert_eq!(world.site.notifications()[0].0, "Unable to post GotW");
        assert!(world.site.posts().is_empty());
        assert!(world.journal().is_none());
    }

    #[tokio::test]
    async fn games_missing_from_catalog() {
        let world = World::new();
        world.site.set_page(
            WIKI_PAGE,
            &WIKI.replace(" * Root\n", " * Rooot\n * Scythee\n"),
        );

        let err = world.pipeline().post(|_| true).await.unwrap_err();
        assert_eq!(err.exit_code(), 3);
        match err {
            PipelineError::GamesNotFound(missing) => assert_eq!(missing, vec!["Rooot", "Scythee"]),
            other => panic!("unexpected {:?}", other),
        }
        let mail = world.site.notifications();
        assert_eq!(mail[0].0, "Error in GotW Calendar");
        assert_eq!(
            mail[0].1,
            "Could not find the following game(s) on BGG: Rooot, Scythee. \
             Please fix the GotW wiki calendar and re-run the GotW script."
        );
    }

    #[tokio::test]
    async fn head_lookup_failure_cannot_compose() {
        let world = World::new();
        world
            .catalog
            .clone()
            .fail_lookup("Brass: Birmingham", MetadataError::NetworkError("reset".into()));

        let err = world.pipeline().post(|_| true).await.unwrap_err();
        assert_eq!(err.exit_code(), 4);
        assert!(world.site.posts().is_empty());
        assert!(world.site.notifications().is_empty());
        assert!(world.journal().is_none());
    }

    #[tokio::test]
    async fn unreadable_wiki() {
        let world = World::new();
        let _site = world.site.clone().fail_on(FailOn::Read {
            page: WIKI_PAGE.into(),
            error: SiteError::NotFound("wiki page 'game_of_the_week'".into()),
        });

        let err = world.pipeline().post(|_| true).await.unwrap_err();
        assert!(matches!(err, PipelineError::Read { .. }));
        assert_eq!(err.exit_code(), 1);
    }

    #[tokio::test]
    async fn concurrent_run_is_refused() {
        let world = World::new();
        let _held = RunLock::acquire(&world.paths).unwrap();

        let err = world.pipeline().post(|_| true).await.unwrap_err();
        assert!(matches!(err, PipelineError::Lock(_)));
        assert!(world.site.operations().is_empty());
    }
}

// =============================================================================
// Failures after publishing
// =============================================================================

mod after_publish {
    use super::*;

    #[tokio::test]
    async fn wiki_failure_keeps_journal() {
        let world = World::new();
        let site = world.site.clone().fail_on(FailOn::Write {
            page: WIKI_PAGE.into(),
            error: SiteError::ApiError {
                status: 500,
                message: "Reddit server error".into(),
            },
        });

        let err = world.pipeline().post(|_| true).await.unwrap_err();
        assert_eq!(err.exit_code(), 5);

        let journal = world.journal().unwrap();
        assert_eq!(journal.next_stage(), Stage::UpdateArchive);
        assert_eq!(journal.reference.as_ref().unwrap().as_str(), "mock1");
        assert_eq!(world.site.page(SIDEBAR_PAGE).unwrap(), SIDEBAR);

        site.clear_fail_on();
        world.pipeline().continue_run().await.unwrap();
        assert_eq!(world.site.posts().len(), 1);
        assert!(world
            .site
            .page(WIKI_PAGE)
            .unwrap()
            .contains("[Brass: Birmingham](/mock1)"));
        assert!(world.journal().is_none());
    }

    #[tokio::test]
    async fn calendar_edited_before_resume() {
        let world = World::new();
        let site = world.site.clone().fail_on(FailOn::Write {
            page: WIKI_PAGE.into(),
            error: SiteError::RateLimited,
        });
        world.pipeline().post(|_| true).await.unwrap_err();

        // A moderator removes the posted game by hand.
        world
            .site
            .set_page(WIKI_PAGE, &WIKI.replace(" * Brass: Birmingham\n", ""));
        site.clear_fail_on();

        let err = world.pipeline().continue_run().await.unwrap_err();
        assert_eq!(err.exit_code(), 5);
        assert!(err.to_string().contains("Azul"));
        assert_eq!(world.journal().unwrap().next_stage(), Stage::UpdateArchive);
    }

    #[tokio::test]
    async fn sidebar_without_link_bar() {
        let world = World::new();
        world.site.set_page(SIDEBAR_PAGE, "no links here\n");

        let err = world.pipeline().post(|_| true).await.unwrap_err();
        assert_eq!(err.exit_code(), 6);
        assert_eq!(world.site.page(SIDEBAR_PAGE).unwrap(), "no links here\n");
        assert_eq!(world.journal().unwrap().next_stage(), Stage::UpdateSidebar);
    }

    #[tokio::test]
    async fn journal_blocks_next_post_until_abort() {
        let world = World::new();
        world.site.set_page(SIDEBAR_PAGE, "broken\n");
        world.pipeline().post(|_| true).await.unwrap_err();

        let err = world.pipeline().post(|_| true).await.unwrap_err();
        assert!(matches!(
            err,
            PipelineError::RunInProgress {
                stage: Stage::UpdateSidebar,
                ..
            }
        ));

        let discarded = world.pipeline().abort().unwrap();
        assert_eq!(discarded.game, "Brass: Birmingham");

        world.site.set_page(SIDEBAR_PAGE, SIDEBAR);
        world.pipeline().post(|_| true).await.unwrap();
        // The second run announces the new head.
        assert_eq!(world.site.posts()[1].title, "Game of the Week: Azul");
    }

    #[tokio::test]
    async fn lost_publish_response_needs_a_human() {
        let world = World::new();
        let site = world
            .site
            .clone()
            .fail_on(FailOn::Publish(SiteError::NetworkError("timed out".into())));

        world.pipeline().post(|_| true).await.unwrap_err();
        let journal = world.journal().unwrap();
        assert!(journal.publish_outcome_unknown());

        site.clear_fail_on();
        let err = world.pipeline().continue_run().await.unwrap_err();
        assert!(matches!(err, PipelineError::PublishUncertain { .. }));
        assert!(err.to_string().contains("gotw abort"));
        assert!(world.site.posts().is_empty());
    }
}

// =============================================================================
// Dry run and check
// =============================================================================

mod read_only {
    use super::*;

    #[tokio::test]
    async fn dry_run_touches_nothing() {
        let world = World::new();
        let report = world.pipeline().dry_run().await.unwrap();

        assert_eq!(
            report.announcement.title,
            "Game of the Week: Brass: Birmingham"
        );
        assert!(report.wiki_changes.contains("- * Brass: Birmingham"));
        assert!(report
            .sidebar_changes
            .contains("+[Brass: Birmingham](/DRY_RUN)"));

        assert_eq!(world.site.page(WIKI_PAGE).unwrap(), WIKI);
        assert_eq!(world.site.page(SIDEBAR_PAGE).unwrap(), SIDEBAR);
        assert!(world.site.posts().is_empty());
        assert!(world.journal().is_none());
    }

    #[tokio::test]
    async fn dry_run_does_not_mail() {
        let world = World::new();
        world.site.set_page(WIKI_PAGE, "nothing here");

        let err = world.pipeline().dry_run().await.unwrap_err();
        assert_eq!(err.exit_code(), 1);
        assert!(world.site.notifications().is_empty());
    }

    #[tokio::test]
    async fn check_lists_queue() {
        let world = World::new();
        let validated = world.pipeline().check().await.unwrap();
        assert_eq!(
            validated.queue,
            vec!["Brass: Birmingham", "Azul", "Spirit Island", "Root"]
        );
    }
}
