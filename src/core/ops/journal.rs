//! core::ops::journal
//!
//! Run journal for crash safety.
//!
//! # Crash Safety Contract
//!
//! 1. **Per-stage persistence:** [`RunJournal::complete`] writes the journal
//!    to disk (temp file, fsync, rename) before returning. A crash at any
//!    point leaves either the previous or the new journal on disk, never a
//!    torn one.
//!
//! 2. **Publish happens once:** the reference id returned by the publisher
//!    is recorded in the same write that marks [`Stage::Publish`] complete.
//!    A resumed run that finds `Publish` completed reuses that id.
//!
//! 3. **Recoverability:** after a crash, [`RunJournal::read`] returns the
//!    journal as of the last completed stage, and [`RunJournal::next_stage`]
//!    says where to resume.
//!
//! # Storage
//!
//! - `<root>/runs/<subreddit>.json` while a run is in flight
//!
//! The file is removed when the run reaches [`Stage::Done`] or is aborted.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::core::paths::GotwPaths;
use crate::core::types::{Fingerprint, ReferenceId, UtcTimestamp};

/// Errors from journal operations.
#[derive(Debug, Error)]
pub enum JournalError {
    /// I/O error reading or writing journal files.
    #[error("journal i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("journal json error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid journal state.
    #[error("invalid journal state: {0}")]
    InvalidState(String),
}

/// Unique identifier for a run.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunId(String);

impl RunId {
    /// Generate a new unique run id.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Pipeline stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Validate,
    Compose,
    Publish,
    Remind,
    UpdateArchive,
    UpdateSidebar,
    Done,
}

impl Stage {
    /// All stages in order.
    pub const ALL: [Stage; 7] = [
        Stage::Validate,
        Stage::Compose,
        Stage::Publish,
        Stage::Remind,
        Stage::UpdateArchive,
        Stage::UpdateSidebar,
        Stage::Done,
    ];

    /// The stage after this one, or `None` after `Done`.
    pub fn next(self) -> Option<Stage> {
        let idx = Self::ALL.iter().position(|s| *s == self)?;
        Self::ALL.get(idx + 1).copied()
    }

    /// Whether running this stage twice has an externally visible effect.
    pub fn is_repeatable(self) -> bool {
        !matches!(self, Stage::Publish)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Validate => "validate",
            Stage::Compose => "compose",
            Stage::Publish => "publish",
            Stage::Remind => "remind",
            Stage::UpdateArchive => "update_archive",
            Stage::UpdateSidebar => "update_sidebar",
            Stage::Done => "done",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One completed stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageRecord {
    pub stage: Stage,
    pub completed_at: UtcTimestamp,
}

/// The persisted record of a pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunJournal {
    pub run_id: RunId,
    pub subreddit: String,
    pub wiki_page: String,
    /// Item being announced (head of the queue).
    pub game: String,
    /// Item announced as next week's, if any.
    pub next_game: Option<String>,
    /// Queue length when the run was validated, the posted item included.
    pub queue_len: usize,
    /// Wiki text fingerprint seen by Validate.
    pub wiki_fingerprint: Option<Fingerprint>,
    /// Post title produced by Compose.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Announcement body produced by Compose.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub announcement: Option<String>,
    /// Set just before the publish request is sent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publish_started: Option<UtcTimestamp>,
    /// Id of the published announcement, set together with `Publish`.
    pub reference: Option<ReferenceId>,
    pub started_at: UtcTimestamp,
    pub stages: Vec<StageRecord>,
}

impl RunJournal {
    /// Start a journal for a validated queue.
    pub fn new(
        subreddit: impl Into<String>,
        wiki_page: impl Into<String>,
        game: impl Into<String>,
        next_game: Option<String>,
        queue_len: usize,
    ) -> Self {
        Self {
            run_id: RunId::new(),
            subreddit: subreddit.into(),
            wiki_page: wiki_page.into(),
            game: game.into(),
            next_game,
            queue_len,
            wiki_fingerprint: None,
            title: None,
            announcement: None,
            publish_started: None,
            reference: None,
            started_at: UtcTimestamp::now(),
            stages: Vec::new(),
        }
    }

    /// Path to this run's journal file.
    pub fn file_path(&self, paths: &GotwPaths) -> PathBuf {
        paths.run_journal_path(&self.subreddit)
    }

    /// The last completed stage.
    pub fn last_completed(&self) -> Option<Stage> {
        self.stages.last().map(|r| r.stage)
    }

    pub fn is_completed(&self, stage: Stage) -> bool {
        self.stages.iter().any(|r| r.stage == stage)
    }

    /// The first stage that has not completed.
    pub fn next_stage(&self) -> Stage {
        match self.last_completed() {
            None => Stage::Validate,
            Some(stage) => stage.next().unwrap_or(Stage::Done),
        }
    }

    /// Mark `stage` complete and persist.
    ///
    /// # Errors
    ///
    /// Returns `JournalError::InvalidState` if `stage` is not the next stage,
    /// or if `Publish` is completed before a reference id was recorded.
    pub fn complete(&mut self, paths: &GotwPaths, stage: Stage) -> Result<(), JournalError> {
        let expected = self.next_stage();
        if stage != expected {
            return Err(JournalError::InvalidState(format!(
                "cannot complete '{}' before '{}'",
                stage, expected
            )));
        }
        if stage == Stage::Publish && self.reference.is_none() {
            return Err(JournalError::InvalidState(
                "publish completed without a reference id".into(),
            ));
        }

        self.stages.push(StageRecord {
            stage,
            completed_at: UtcTimestamp::now(),
        });
        self.write(paths)?;
        tracing::debug!(run = %self.run_id, %stage, "stage complete");
        Ok(())
    }

    /// Persist that a publish request is about to be sent.
    ///
    /// A journal with `publish_started` set and no reference means the post
    /// may or may not exist; resuming must not publish again.
    pub fn begin_publish(&mut self, paths: &GotwPaths) -> Result<(), JournalError> {
        if self.next_stage() != Stage::Publish {
            return Err(JournalError::InvalidState(format!(
                "cannot publish at stage '{}'",
                self.next_stage()
            )));
        }
        self.publish_started = Some(UtcTimestamp::now());
        self.write(paths)
    }

    /// True when a publish was attempted but its result was never recorded.
    pub fn publish_outcome_unknown(&self) -> bool {
        self.publish_started.is_some() && self.reference.is_none()
    }

    /// Record the publish result and mark `Publish` complete in one write.
    pub fn complete_publish(
        &mut self,
        paths: &GotwPaths,
        reference: ReferenceId,
    ) -> Result<(), JournalError> {
        self.reference = Some(reference);
        self.complete(paths, Stage::Publish)
    }

    /// Write the journal atomically with fsync.
    pub fn write(&self, paths: &GotwPaths) -> Result<(), JournalError> {
        fs::create_dir_all(paths.runs_dir())?;

        let path = self.file_path(paths);
        let temp_path = path.with_extension("json.tmp");
        let content = serde_json::to_string_pretty(self)?;

        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&temp_path)?;
        file.write_all(content.as_bytes())?;
        file.sync_all()?;
        fs::rename(&temp_path, &path)?;

        Ok(())
    }

    /// Read the in-flight journal for `subreddit`, if any.
    pub fn read(paths: &GotwPaths, subreddit: &str) -> Result<Option<Self>, JournalError> {
        let path = paths.run_journal_path(subreddit);
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&path)?;
        Ok(Some(serde_json::from_str(&content)?))
    }

    /// Remove the journal for `subreddit`. Missing files are not an error.
    pub fn remove(paths: &GotwPaths, subreddit: &str) -> Result<(), JournalError> {
        let path = paths.run_journal_path(subreddit);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
