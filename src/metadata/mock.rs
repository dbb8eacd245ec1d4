//! metadata::mock
//!
//! In-memory metadata source for deterministic testing.
//!
//! # Example
//!
//! ```
//! use gotw::metadata::mock::MockCatalog;
//! use gotw::metadata::{GameMetadata, MetadataSource};
//!
//! # tokio_test::block_on(async {
//! let catalog = MockCatalog::new().with_game(GameMetadata {
//!     id: 13,
//!     name: "Catan".into(),
//!     ..Default::default()
//! });
//!
//! assert!(catalog.lookup("Catan").await.unwrap().is_some());
//! assert!(catalog.lookup("Unknown Game").await.unwrap().is_none());
//! assert_eq!(catalog.lookups(), vec!["Catan", "Unknown Game"]);
//! # });
//! ```

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use super::traits::{GameMetadata, MetadataError, MetadataSource};

/// Mock catalog keyed by name.
///
/// Clones share state, so a test can keep a handle for assertions after
/// handing the catalog to the pipeline.
#[derive(Debug, Clone, Default)]
pub struct MockCatalog {
    inner: Arc<Mutex<MockCatalogInner>>,
}

#[derive(Debug, Default)]
struct MockCatalogInner {
    games: HashMap<String, GameMetadata>,
    /// Names whose lookup fails with the given error.
    failing: HashMap<String, MetadataError>,
    /// Every name looked up, in order.
    lookups: Vec<String>,
}

impl MockCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a game, keyed by its `name`.
    pub fn with_game(self, game: GameMetadata) -> Self {
        self.insert(game);
        self
    }

    /// Add a minimal game record with just a name and id.
    pub fn with_named(self, name: &str, id: u64) -> Self {
        self.with_game(GameMetadata {
            id,
            name: name.to_string(),
            ..Default::default()
        })
    }

    /// Make lookups of `name` fail with `error`.
    pub fn fail_lookup(self, name: &str, error: MetadataError) -> Self {
        {
            let mut inner = self.inner.lock().unwrap();
            inner.failing.insert(name.to_string(), error);
        }
        self
    }

    pub fn insert(&self, game: GameMetadata) {
        let mut inner = self.inner.lock().unwrap();
        inner.games.insert(game.name.clone(), game);
    }

    /// Names looked up so far.
    pub fn lookups(&self) -> Vec<String> {
        let inner = self.inner.lock().unwrap();
        inner.lookups.clone()
    }
}

#[async_trait]
impl MetadataSource for MockCatalog {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn lookup(&self, name: &str) -> Result<Option<GameMetadata>, MetadataError> {
        let mut inner = self.inner.lock().unwrap();
        inner.lookups.push(name.to_string());
        if let Some(err) = inner.failing.get(name) {
            return Err(err.clone());
        }
        Ok(inner.games.get(name).cloned())
    }
}
