//! secrets
//!
//! Secret storage for Reddit credentials and the BoardGameGeek token.
//!
//! # Security
//!
//! - Secrets are **never** logged or included in error messages
//! - The file store uses 0600 permissions on Unix
//! - All writes are atomic (temp file + rename)
//!
//! # Example
//!
//! ```no_run
//! use gotw::core::paths::GotwPaths;
//! use gotw::secrets::create_store;
//!
//! let paths = GotwPaths::from_env().unwrap();
//! let store = create_store("file", &paths)?;
//! store.set("bgg.token", "...")?;
//! # Ok::<(), gotw::secrets::SecretError>(())
//! ```

mod file_store;
mod traits;

pub use file_store::FileSecretStore;
pub use traits::{SecretError, SecretStore};

use crate::core::paths::GotwPaths;

/// The default secret store provider name.
pub const DEFAULT_PROVIDER: &str = "file";

/// Create a secret store by provider name.
///
/// # Errors
///
/// `SecretError::ProviderNotAvailable` for anything but `"file"`.
pub fn create_store(provider: &str, paths: &GotwPaths) -> Result<Box<dyn SecretStore>, SecretError> {
    match provider {
        "file" => Ok(Box::new(FileSecretStore::new(paths))),
        other => Err(SecretError::ProviderNotAvailable(format!(
            "unknown secret provider: '{}' (valid: file)",
            other
        ))),
    }
}
