//! core::ops
//!
//! Run journaling and locking.
//!
//! # Modules
//!
//! - [`journal`] - Run journal for crash safety and resume
//! - [`lock`] - Exclusive run lock
//!
//! # Architecture
//!
//! Every run that writes to the site:
//! 1. Acquires the exclusive run lock
//! 2. Creates a run journal before the first write
//! 3. Persists the journal at every stage boundary
//! 4. On success: removes the journal
//! 5. On failure: leaves the journal for `continue` or `abort`

pub mod journal;
pub mod lock;

pub use journal::{JournalError, RunId, RunJournal, Stage, StageRecord};
pub use lock::{LockError, RunLock};
