//! metadata
//!
//! Game metadata lookup.
//!
//! # Modules
//!
//! - `traits`: The `MetadataSource` trait, `GameMetadata` and `MetadataError`
//! - [`bgg`]: BoardGameGeek XML API2 client
//! - [`mock`]: In-memory catalog for deterministic testing
//!
//! The pipeline and the composer only see `dyn MetadataSource`; commands
//! build the concrete client.

pub mod bgg;
pub mod mock;
mod traits;

pub use traits::*;

/// Look up every name and return the ones the source does not know.
///
/// A transport error for one name is logged and that name is skipped, not
/// reported as missing: the calendar is only blamed for names the source
/// positively does not have.
pub async fn find_missing(source: &dyn MetadataSource, names: &[String]) -> Vec<String> {
    let mut missing = Vec::new();
    for name in names {
        match source.lookup(name).await {
            Ok(Some(_)) => {}
            Ok(None) => {
                tracing::warn!(game = %name, source = source.name(), "game not found");
                missing.push(name.clone());
            }
            Err(e) => {
                tracing::error!(game = %name, source = source.name(), error = %e, "lookup failed");
            }
        }
    }
    missing
}
