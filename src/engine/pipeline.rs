//! engine::pipeline
//!
//! The weekly run: Validate -> Compose -> Publish -> Remind -> UpdateArchive
//! -> UpdateSidebar -> Done.
//!
//! # Contract
//!
//! 1. Validate and Compose touch nothing but reads (and moderator mail when
//!    the calendar is broken). Failing there leaves no journal behind.
//! 2. The journal is written, with Validate and Compose complete, before the
//!    publish request. Every later stage boundary is persisted.
//! 3. Publish runs at most once per journal. If the process dies after the
//!    request was sent but before the id was recorded, resuming refuses to
//!    publish again ([`PipelineError::PublishUncertain`]).
//! 4. UpdateArchive and UpdateSidebar re-read their page and recognise their
//!    own earlier write, so resuming after a crash does not fail on them.
//! 5. One run at a time: every entry point holds [`RunLock`].
//!
//! # Example
//!
//! ```no_run
//! use chrono::NaiveDate;
//! use gotw::core::paths::GotwPaths;
//! use gotw::engine::pipeline::{Collaborators, Pipeline, RunSettings};
//! use gotw::metadata::mock::MockCatalog;
//! use gotw::site::mock::MockSite;
//!
//! # tokio_test::block_on(async {
//! let site = MockSite::new();
//! let catalog = MockCatalog::new();
//! let paths = GotwPaths::new("/tmp/gotw".into());
//! let pipeline = Pipeline::new(
//!     Collaborators::new(&site, &site, &site, &catalog),
//!     &paths,
//!     RunSettings::default(),
//!     NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
//! );
//! let outcome = pipeline.post(|_| true).await;
//! # let _ = outcome;
//! # });
//! ```

use chrono::NaiveDate;
use thiserror::Error;

use crate::core::calendar::{promote, read_archive, read_queue};
use crate::core::config::Config;
use crate::core::error::TransformError;
use crate::core::grammar::{link_bar_phrase, sidebar_link};
use crate::core::ops::{JournalError, LockError, RunJournal, RunLock, Stage};
use crate::core::paths::GotwPaths;
use crate::core::sidebar::update_sidebar;
use crate::core::types::{validate_name, Fingerprint, ReferenceId};
use crate::metadata::{find_missing, MetadataSource};
use crate::site::{DocumentStore, Notifier, Publisher, SiteError};
use crate::ui::announcement::{compose_announcement, Announcement, ComposeError};
use crate::ui::output::format_changes;

pub const SUBJECT_CALENDAR_MISSING: &str = "Unable to post GotW";
pub const BODY_CALENDAR_MISSING: &str =
    "There was a problem posting the GotW. Take a look at the gotw wiki page. There is something amiss.";
pub const SUBJECT_GAMES_MISSING: &str = "Error in GotW Calendar";
pub const SUBJECT_TOP_UP: &str = "Top up the GotW Calendar";

/// Reference id used to render dry-run changes.
const DRY_RUN_REFERENCE: &str = "DRY_RUN";

/// Errors from a run. Each maps to a process exit code.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("calendar not found on wiki page '{page}': {source}")]
    CalendarNotFound {
        page: String,
        #[source]
        source: TransformError,
    },

    #[error("no games are queued on wiki page '{page}'; nothing to post")]
    CalendarEmpty { page: String },

    #[error("game(s) not found in the metadata source: {}", .0.join(", "))]
    GamesNotFound(Vec<String>),

    #[error("game name(s) cannot be linked from the wiki (no ']' or line breaks): {}", .0.join(", "))]
    InvalidNames(Vec<String>),

    #[error("cannot compose the announcement: {0}")]
    Compose(#[from] ComposeError),

    #[error("wiki update failed: {0}")]
    WikiUpdate(String),

    #[error("sidebar update failed: {0}")]
    SidebarUpdate(String),

    #[error("cannot read wiki page '{page}': {source}")]
    Read {
        page: String,
        #[source]
        source: SiteError,
    },

    #[error("publishing failed: {0}")]
    Publish(#[source] SiteError),

    #[error(
        "a post for '{game}' may already exist: the previous run stopped while publishing. \
         Check the subreddit, then run 'gotw abort'"
    )]
    PublishUncertain { game: String },

    #[error("a run for '{game}' is in progress (next stage: {stage}). Run 'gotw continue' or 'gotw abort'")]
    RunInProgress { game: String, stage: Stage },

    #[error("no run in progress for r/{0}")]
    NoRunInProgress(String),

    #[error(transparent)]
    Journal(#[from] JournalError),

    #[error(transparent)]
    Lock(#[from] LockError),
}

impl PipelineError {
    /// Process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            PipelineError::CalendarNotFound { .. } => 1,
            PipelineError::CalendarEmpty { .. } => 2,
            PipelineError::GamesNotFound(_) | PipelineError::InvalidNames(_) => 3,
            PipelineError::Compose(_) => 4,
            PipelineError::WikiUpdate(_) => 5,
            PipelineError::SidebarUpdate(_) => 6,
            _ => 1,
        }
    }
}

/// The external services a run talks to.
#[derive(Clone, Copy)]
pub struct Collaborators<'a> {
    pub docs: &'a dyn DocumentStore,
    pub publisher: &'a dyn Publisher,
    pub notifier: &'a dyn Notifier,
    pub metadata: &'a dyn MetadataSource,
}

impl<'a> Collaborators<'a> {
    pub fn new(
        docs: &'a dyn DocumentStore,
        publisher: &'a dyn Publisher,
        notifier: &'a dyn Notifier,
        metadata: &'a dyn MetadataSource,
    ) -> Self {
        Self {
            docs,
            publisher,
            notifier,
            metadata,
        }
    }
}

/// Per-run settings, usually taken from [`Config`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSettings {
    pub subreddit: String,
    pub wiki_page: String,
    pub sidebar_page: String,
    /// Remind moderators when this many games or fewer are queued,
    /// the posted one included.
    pub reminder_threshold: usize,
    pub distinguish: bool,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl RunSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            subreddit: config.subreddit().to_string(),
            wiki_page: config.wiki_page().to_string(),
            sidebar_page: config.sidebar_page().to_string(),
            reminder_threshold: config.reminder_threshold(),
            distinguish: config.distinguish(),
        }
    }
}

/// A calendar that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Validated {
    /// Wiki text as read.
    pub wiki: String,
    /// Queued names, head first. Never empty.
    pub queue: Vec<String>,
}

impl Validated {
    pub fn game(&self) -> &str {
        &self.queue[0]
    }

    pub fn next_game(&self) -> Option<&str> {
        self.queue.get(1).map(String::as_str)
    }
}

/// What a dry run would do.
#[derive(Debug, Clone)]
pub struct DryRunReport {
    pub announcement: Announcement,
    pub wiki_changes: String,
    pub sidebar_changes: String,
}

/// A finished run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub game: String,
    pub reference: ReferenceId,
    pub url: String,
}

/// Result of [`Pipeline::post`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostOutcome {
    Posted(RunReport),
    /// The confirmation callback said no. Nothing was written.
    Declined { game: String },
}

/// Body of the "games missing" modmail.
pub fn games_missing_body(missing: &[String]) -> String {
    format!(
        "Could not find the following game(s) on BGG: {}. Please fix the GotW wiki calendar and re-run the GotW script.",
        missing.join(", ")
    )
}

/// Body of the modmail about names the archive could not hold.
pub fn invalid_names_body(names: &[String]) -> String {
    format!(
        "These game(s) contain ']' or a line break and cannot be linked from the wiki: {}. \
         Please fix the GotW wiki calendar and re-run the GotW script.",
        names.join(", ")
    )
}

/// Body of the "queue running low" modmail.
pub fn top_up_body(threshold: usize) -> String {
    format!(
        "Fewer than {} games on the GotW. Please add more.",
        threshold + 1
    )
}

/// Wiki and sidebar edit reason.
pub fn update_reason(game: &str) -> String {
    format!("GotW post update for {}", game)
}

pub struct Pipeline<'a> {
    services: Collaborators<'a>,
    paths: &'a GotwPaths,
    settings: RunSettings,
    today: NaiveDate,
}

impl<'a> Pipeline<'a> {
    /// `today` is the date recorded in the archive.
    pub fn new(
        services: Collaborators<'a>,
        paths: &'a GotwPaths,
        settings: RunSettings,
        today: NaiveDate,
    ) -> Self {
        Self {
            services,
            paths,
            settings,
            today,
        }
    }

    pub fn settings(&self) -> &RunSettings {
        &self.settings
    }

    // ========================================================================
    // Entry points
    // ========================================================================

    /// Run a full post. `confirm` sees the composed announcement and can stop
    /// the run before anything is published.
    pub async fn post<F>(&self, confirm: F) -> Result<PostOutcome, PipelineError>
    where
        F: FnOnce(&Announcement) -> bool,
    {
        let _lock = RunLock::acquire(self.paths)?;
        self.ensure_no_run()?;

        let validated = self.validate(true).await?;
        let announcement = self.compose(&validated).await?;

        if !confirm(&announcement) {
            tracing::info!(game = %validated.game(), "post declined");
            return Ok(PostOutcome::Declined {
                game: validated.game().to_string(),
            });
        }

        let mut journal = self.begin(&validated, &announcement)?;
        self.resume(&mut journal).await.map(PostOutcome::Posted)
    }

    /// Validate and compose, then show the changes a post would make.
    /// Writes nothing and sends no mail.
    pub async fn dry_run(&self) -> Result<DryRunReport, PipelineError> {
        let validated = self.validate(false).await?;
        let announcement = self.compose(&validated).await?;

        let placeholder = ReferenceId::new(DRY_RUN_REFERENCE)
            .map_err(|e| PipelineError::WikiUpdate(e.to_string()))?;

        let update = promote(&validated.wiki, &validated.queue, &placeholder, self.today)
            .map_err(|e| PipelineError::WikiUpdate(e.to_string()))?;
        let wiki_changes = format_changes(&validated.wiki, &update.text);

        let sidebar = self.read_sidebar().await?;
        let new_sidebar = update_sidebar(&sidebar, validated.game(), &placeholder)
            .map_err(|e| PipelineError::SidebarUpdate(e.to_string()))?;
        let sidebar_changes = format_changes(&sidebar, &new_sidebar);

        Ok(DryRunReport {
            announcement,
            wiki_changes,
            sidebar_changes,
        })
    }

    /// Check the calendar without writing anything or sending mail.
    pub async fn check(&self) -> Result<Validated, PipelineError> {
        self.validate(false).await
    }

    /// Resume an interrupted run from its journal.
    pub async fn continue_run(&self) -> Result<RunReport, PipelineError> {
        let _lock = RunLock::acquire(self.paths)?;
        let mut journal = RunJournal::read(self.paths, &self.settings.subreddit)?
            .ok_or_else(|| PipelineError::NoRunInProgress(self.settings.subreddit.clone()))?;

        tracing::info!(
            run = %journal.run_id,
            game = %journal.game,
            stage = %journal.next_stage(),
            "resuming run"
        );
        self.resume(&mut journal).await
    }

    /// Discard an interrupted run's journal. Returns the discarded journal.
    pub fn abort(&self) -> Result<RunJournal, PipelineError> {
        let _lock = RunLock::acquire(self.paths)?;
        let journal = RunJournal::read(self.paths, &self.settings.subreddit)?
            .ok_or_else(|| PipelineError::NoRunInProgress(self.settings.subreddit.clone()))?;
        RunJournal::remove(self.paths, &self.settings.subreddit)?;
        tracing::info!(run = %journal.run_id, game = %journal.game, "run aborted");
        Ok(journal)
    }

    // ========================================================================
    // Stages
    // ========================================================================

    fn ensure_no_run(&self) -> Result<(), PipelineError> {
        match RunJournal::read(self.paths, &self.settings.subreddit)? {
            Some(journal) => Err(PipelineError::RunInProgress {
                game: journal.game.clone(),
                stage: journal.next_stage(),
            }),
            None => Ok(()),
        }
    }

    async fn read_wiki(&self) -> Result<String, PipelineError> {
        self.services
            .docs
            .read(&self.settings.wiki_page)
            .await
            .map_err(|source| PipelineError::Read {
                page: self.settings.wiki_page.clone(),
                source,
            })
    }

    async fn read_sidebar(&self) -> Result<String, PipelineError> {
        self.services
            .docs
            .read(&self.settings.sidebar_page)
            .await
            .map_err(|e| PipelineError::SidebarUpdate(format!("cannot read sidebar: {}", e)))
    }

    async fn notify(&self, subject: &str, body: &str) {
        if let Err(e) = self.services.notifier.notify(subject, body).await {
            tracing::error!(subject, error = %e, "failed to send modmail");
        }
    }

    /// Read the calendar and check every queued game resolves.
    ///
    /// With `notify`, moderators are mailed about a missing calendar or
    /// unknown games.
    pub async fn validate(&self, notify: bool) -> Result<Validated, PipelineError> {
        let wiki = self.read_wiki().await?;
        tracing::debug!(page = %self.settings.wiki_page, bytes = wiki.len(), "read wiki page");

        let queue = match read_queue(&wiki) {
            Ok(queue) => queue,
            Err(source @ TransformError::RegionNotFound { .. }) => {
                tracing::error!(
                    page = %self.settings.wiki_page,
                    "calendar markers [//]: (CALS) and [//]: (CALE) not found"
                );
                if notify {
                    self.notify(SUBJECT_CALENDAR_MISSING, BODY_CALENDAR_MISSING)
                        .await;
                }
                return Err(PipelineError::CalendarNotFound {
                    page: self.settings.wiki_page.clone(),
                    source,
                });
            }
            Err(_) => {
                tracing::error!("no games of the week queued");
                return Err(PipelineError::CalendarEmpty {
                    page: self.settings.wiki_page.clone(),
                });
            }
        };

        let invalid: Vec<String> = queue
            .iter()
            .filter(|name| validate_name(name).is_err())
            .cloned()
            .collect();
        if !invalid.is_empty() {
            tracing::error!(names = %invalid.join(", "), "calendar names cannot be archived");
            if notify {
                self.notify(SUBJECT_GAMES_MISSING, &invalid_names_body(&invalid))
                    .await;
            }
            return Err(PipelineError::InvalidNames(invalid));
        }

        let missing = find_missing(self.services.metadata, &queue).await;
        if !missing.is_empty() {
            if notify {
                tracing::info!(missing = %missing.join(", "), "mailing moderators about unknown games");
                self.notify(SUBJECT_GAMES_MISSING, &games_missing_body(&missing))
                    .await;
            }
            return Err(PipelineError::GamesNotFound(missing));
        }

        let validated = Validated { wiki, queue };
        tracing::info!(
            game = %validated.game(),
            next = ?validated.next_game(),
            queued = validated.queue.len(),
            "calendar validated"
        );
        Ok(validated)
    }

    /// Compose the announcement for the head of the queue.
    pub async fn compose(&self, validated: &Validated) -> Result<Announcement, PipelineError> {
        Ok(compose_announcement(
            self.services.metadata,
            validated.game(),
            validated.next_game(),
        )
        .await?)
    }

    /// Create and persist the journal for a validated, composed run.
    fn begin(
        &self,
        validated: &Validated,
        announcement: &Announcement,
    ) -> Result<RunJournal, PipelineError> {
        let mut journal = RunJournal::new(
            &self.settings.subreddit,
            &self.settings.wiki_page,
            validated.game(),
            validated.next_game().map(str::to_string),
            validated.queue.len(),
        );
        journal.wiki_fingerprint = Some(Fingerprint::of(&validated.wiki));
        journal.complete(self.paths, Stage::Validate)?;

        journal.title = Some(announcement.title.clone());
        journal.announcement = Some(announcement.body.clone());
        journal.complete(self.paths, Stage::Compose)?;
        Ok(journal)
    }

    /// Drive `journal` through its remaining stages.
    pub async fn resume(&self, journal: &mut RunJournal) -> Result<RunReport, PipelineError> {
        loop {
            match journal.next_stage() {
                stage @ (Stage::Validate | Stage::Compose) => {
                    return Err(PipelineError::Journal(JournalError::InvalidState(format!(
                        "journal stopped before '{}'; run 'gotw abort' and post again",
                        stage
                    ))));
                }
                Stage::Publish => self.publish(journal).await?,
                Stage::Remind => {
                    self.remind(journal).await;
                    journal.complete(self.paths, Stage::Remind)?;
                }
                Stage::UpdateArchive => {
                    self.update_archive(journal).await?;
                    journal.complete(self.paths, Stage::UpdateArchive)?;
                }
                Stage::UpdateSidebar => {
                    self.update_sidebar(journal).await?;
                    journal.complete(self.paths, Stage::UpdateSidebar)?;
                }
                Stage::Done => {
                    if !journal.is_completed(Stage::Done) {
                        journal.complete(self.paths, Stage::Done)?;
                    }
                    RunJournal::remove(self.paths, &journal.subreddit)?;
                    break;
                }
            }
        }

        let reference = self.reference(journal)?;
        tracing::info!(game = %journal.game, post = %reference, "run complete");
        Ok(RunReport {
            game: journal.game.clone(),
            url: self.services.publisher.post_url(&reference),
            reference,
        })
    }

    fn reference(&self, journal: &RunJournal) -> Result<ReferenceId, PipelineError> {
        journal.reference.clone().ok_or_else(|| {
            PipelineError::Journal(JournalError::InvalidState(
                "publish completed without a reference id".into(),
            ))
        })
    }

    async fn publish(&self, journal: &mut RunJournal) -> Result<(), PipelineError> {
        if journal.publish_outcome_unknown() {
            return Err(PipelineError::PublishUncertain {
                game: journal.game.clone(),
            });
        }

        let (title, body) = match (&journal.title, &journal.announcement) {
            (Some(title), Some(body)) => (title.clone(), body.clone()),
            _ => {
                return Err(PipelineError::Journal(JournalError::InvalidState(
                    "journal has no composed announcement".into(),
                )))
            }
        };

        journal.begin_publish(self.paths)?;
        let reference = match self.services.publisher.publish(&title, &body).await {
            Ok(reference) => reference,
            Err(e) => {
                // Only a transport failure leaves the outcome in doubt.
                if !matches!(e, SiteError::NetworkError(_)) {
                    journal.publish_started = None;
                    journal.write(self.paths)?;
                }
                return Err(PipelineError::Publish(e));
            }
        };

        journal.complete_publish(self.paths, reference.clone())?;
        tracing::info!(game = %journal.game, post = %reference, "announcement published");

        if self.settings.distinguish {
            if let Err(e) = self.services.publisher.distinguish(&reference).await {
                tracing::warn!(post = %reference, error = %e, "could not distinguish post");
            }
        }
        Ok(())
    }

    async fn remind(&self, journal: &RunJournal) {
        if journal.queue_len <= self.settings.reminder_threshold {
            tracing::info!(
                queued = journal.queue_len,
                threshold = self.settings.reminder_threshold,
                "calendar running low, mailing moderators"
            );
            self.notify(
                SUBJECT_TOP_UP,
                &top_up_body(self.settings.reminder_threshold),
            )
            .await;
        }
    }

    async fn update_archive(&self, journal: &RunJournal) -> Result<(), PipelineError> {
        let reference = self.reference(journal)?;
        let wiki = self
            .read_wiki()
            .await
            .map_err(|e| PipelineError::WikiUpdate(e.to_string()))?;

        if let Some(seen) = &journal.wiki_fingerprint {
            if *seen != Fingerprint::of(&wiki) {
                tracing::warn!("wiki page changed since validation");
            }
        }

        let archived = read_archive(&wiki)
            .map(|entries| entries.iter().any(|e| e.reference == reference))
            .unwrap_or(false);
        if archived {
            tracing::info!(post = %reference, "archive already records this post");
            return Ok(());
        }

        let queue = read_queue(&wiki).map_err(|e| PipelineError::WikiUpdate(e.to_string()))?;
        if queue.first() != Some(&journal.game) {
            return Err(PipelineError::WikiUpdate(format!(
                "calendar now starts with '{}', expected '{}'",
                queue.first().map(String::as_str).unwrap_or(""),
                journal.game
            )));
        }

        let update = promote(&wiki, &queue, &reference, self.today)
            .map_err(|e| PipelineError::WikiUpdate(e.to_string()))?;

        self.services
            .docs
            .write(
                &self.settings.wiki_page,
                &update.text,
                &update_reason(&journal.game),
            )
            .await
            .map_err(|e| PipelineError::WikiUpdate(e.to_string()))?;

        tracing::info!(
            remaining = update.remaining.len(),
            archived = update.archive_len,
            "wiki updated"
        );
        Ok(())
    }

    async fn update_sidebar(&self, journal: &RunJournal) -> Result<(), PipelineError> {
        let reference = self.reference(journal)?;
        let sidebar = self.read_sidebar().await?;

        if sidebar.contains(&link_bar_phrase(&journal.game, reference.as_str()))
            && sidebar.contains(&sidebar_link(&journal.game, reference.as_str()))
        {
            tracing::info!(post = %reference, "sidebar already points at this post");
            return Ok(());
        }

        let updated = update_sidebar(&sidebar, &journal.game, &reference)
            .map_err(|e| PipelineError::SidebarUpdate(e.to_string()))?;

        self.services
            .docs
            .write(
                &self.settings.sidebar_page,
                &updated,
                &update_reason(&journal.game),
            )
            .await
            .map_err(|e| PipelineError::SidebarUpdate(e.to_string()))?;

        tracing::info!("sidebar updated");
        Ok(())
    }
}
