//! site::mock
//!
//! In-memory site for deterministic testing.
//!
//! Pages, posts and modmail live in memory. Failures can be injected per
//! operation (and per page for reads and writes), and every call is recorded.
//!
//! # Example
//!
//! ```
//! use gotw::site::mock::{FailOn, MockSite};
//! use gotw::site::{DocumentStore, SiteError};
//!
//! # tokio_test::block_on(async {
//! let site = MockSite::new()
//!     .with_page("config/sidebar", "...")
//!     .fail_on(FailOn::Write {
//!         page: "config/sidebar".into(),
//!         error: SiteError::RateLimited,
//!     });
//!
//! assert!(site.write("config/sidebar", "new", "update").await.is_err());
//! assert_eq!(site.page("config/sidebar").as_deref(), Some("..."));
//! # });
//! ```

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use super::traits::{DocumentStore, Notifier, Publisher, SiteError};
use crate::core::types::ReferenceId;

/// Mock site.
///
/// Clones share state.
#[derive(Debug, Clone, Default)]
pub struct MockSite {
    inner: Arc<Mutex<MockSiteInner>>,
}

#[derive(Debug, Default)]
struct MockSiteInner {
    pages: HashMap<String, String>,
    posts: Vec<MockPost>,
    distinguished: Vec<ReferenceId>,
    fail_on: Vec<FailOn>,
    operations: Vec<MockOperation>,
}

/// A post created through [`Publisher::publish`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockPost {
    pub id: ReferenceId,
    pub title: String,
    pub body: String,
}

/// Which operation should fail.
#[derive(Debug, Clone)]
pub enum FailOn {
    Read { page: String, error: SiteError },
    Write { page: String, error: SiteError },
    Publish(SiteError),
    Distinguish(SiteError),
    Notify(SiteError),
}

/// Recorded operation for test verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockOperation {
    Read { page: String },
    Write { page: String, reason: String },
    Publish { title: String },
    Distinguish { id: String },
    Notify { subject: String, body: String },
}

impl MockSite {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(self, page: &str, text: &str) -> Self {
        self.set_page(page, text);
        self
    }

    /// Add a failure. Several can be active at once.
    pub fn fail_on(self, fail_on: FailOn) -> Self {
        {
            let mut inner = self.inner.lock().unwrap();
            inner.fail_on.push(fail_on);
        }
        self
    }

    pub fn clear_fail_on(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.fail_on.clear();
    }

    pub fn set_page(&self, page: &str, text: &str) {
        let mut inner = self.inner.lock().unwrap();
        inner.pages.insert(page.to_string(), text.to_string());
    }

    /// Current content of a page (for test verification).
    pub fn page(&self, page: &str) -> Option<String> {
        let inner = self.inner.lock().unwrap();
        inner.pages.get(page).cloned()
    }

    pub fn posts(&self) -> Vec<MockPost> {
        let inner = self.inner.lock().unwrap();
        inner.posts.clone()
    }

    pub fn distinguished(&self) -> Vec<ReferenceId> {
        let inner = self.inner.lock().unwrap();
        inner.distinguished.clone()
    }

    /// Modmail sent so far as `(subject, body)`.
    pub fn notifications(&self) -> Vec<(String, String)> {
        self.operations()
            .into_iter()
            .filter_map(|op| match op {
                MockOperation::Notify { subject, body } => Some((subject, body)),
                _ => None,
            })
            .collect()
    }

    pub fn operations(&self) -> Vec<MockOperation> {
        let inner = self.inner.lock().unwrap();
        inner.operations.clone()
    }

    pub fn clear_operations(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.operations.clear();
    }

    fn record(&self, op: MockOperation) {
        let mut inner = self.inner.lock().unwrap();
        inner.operations.push(op);
    }

    fn check_fail(&self, matches: impl Fn(&FailOn) -> Option<&SiteError>) -> Result<(), SiteError> {
        let inner = self.inner.lock().unwrap();
        match inner.fail_on.iter().find_map(matches) {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl DocumentStore for MockSite {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn read(&self, page: &str) -> Result<String, SiteError> {
        self.record(MockOperation::Read {
            page: page.to_string(),
        });
        self.check_fail(|f| match f {
            FailOn::Read { page: p, error } if p == page => Some(error),
            _ => None,
        })?;

        self.page(page)
            .ok_or_else(|| SiteError::NotFound(format!("wiki page '{}'", page)))
    }

    async fn write(&self, page: &str, text: &str, reason: &str) -> Result<(), SiteError> {
        self.record(MockOperation::Write {
            page: page.to_string(),
            reason: reason.to_string(),
        });
        self.check_fail(|f| match f {
            FailOn::Write { page: p, error } if p == page => Some(error),
            _ => None,
        })?;

        self.set_page(page, text);
        Ok(())
    }
}

#[async_trait]
impl Publisher for MockSite {
    async fn publish(&self, title: &str, body: &str) -> Result<ReferenceId, SiteError> {
        self.record(MockOperation::Publish {
            title: title.to_string(),
        });
        self.check_fail(|f| match f {
            FailOn::Publish(error) => Some(error),
            _ => None,
        })?;

        let mut inner = self.inner.lock().unwrap();
        let id = ReferenceId::new(format!("mock{}", inner.posts.len() + 1)).map_err(|e| {
            SiteError::ApiError {
                status: 500,
                message: e.to_string(),
            }
        })?;
        inner.posts.push(MockPost {
            id: id.clone(),
            title: title.to_string(),
            body: body.to_string(),
        });
        Ok(id)
    }

    async fn distinguish(&self, id: &ReferenceId) -> Result<(), SiteError> {
        self.record(MockOperation::Distinguish {
            id: id.to_string(),
        });
        self.check_fail(|f| match f {
            FailOn::Distinguish(error) => Some(error),
            _ => None,
        })?;

        let mut inner = self.inner.lock().unwrap();
        if !inner.posts.iter().any(|p| &p.id == id) {
            return Err(SiteError::NotFound(format!("post {}", id)));
        }
        inner.distinguished.push(id.clone());
        Ok(())
    }

    fn post_url(&self, id: &ReferenceId) -> String {
        format!("https://mock.invalid/{}", id)
    }
}

#[async_trait]
impl Notifier for MockSite {
    async fn notify(&self, subject: &str, body: &str) -> Result<(), SiteError> {
        self.record(MockOperation::Notify {
            subject: subject.to_string(),
            body: body.to_string(),
        });
        self.check_fail(|f| match f {
            FailOn::Notify(error) => Some(error),
            _ => None,
        })
    }
}
