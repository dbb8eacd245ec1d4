//! core::sidebar
//!
//! Pointing the sidebar at the newly published item.
//!
//! The sidebar carries two references to the current item:
//!
//! - the link-bar phrase `[Game of the Week: <name>](/<id>) `, found by its
//!   literal prefix, and
//! - the link on the line after `[//]: # (GOTWLINK)`.
//!
//! Both must change. If either substitution finds nothing the caller gets an
//! error instead of a partially rewritten sidebar.

use regex::NoExpand;

use super::calendar::check_name;
use super::error::TransformError;
use super::grammar::{link_bar_phrase, sidebar_link, LINK_BAR, SIDEBAR_LINK};
use super::types::ReferenceId;

/// Rewrite both sidebar references to point at `name` / `reference`.
///
/// # Errors
///
/// - [`TransformError::InvalidName`] if `name` contains `]` or a line break
/// - [`TransformError::SidebarUpdateFailed`] if the link-bar phrase or the
///   delimited link could not be found (the output would equal the input)
///
/// # Example
///
/// ```
/// use gotw::core::sidebar::update_sidebar;
/// use gotw::core::types::ReferenceId;
///
/// let sidebar = "[Game of the Week: Azul](/old1) [Rules](/wiki/rules)\n\n[//]: # (GOTWLINK)\n[Azul](/old1)\n";
/// let updated = update_sidebar(sidebar, "Catan", &ReferenceId::new("abc123").unwrap()).unwrap();
/// assert_eq!(
///     updated,
///     "[Game of the Week: Catan](/abc123) [Rules](/wiki/rules)\n\n[//]: # (GOTWLINK)\n[Catan](/abc123)\n"
/// );
/// ```
pub fn update_sidebar(
    sidebar: &str,
    name: &str,
    reference: &ReferenceId,
) -> Result<String, TransformError> {
    check_name(name)?;

    let phrase = link_bar_phrase(name, reference.as_str());
    let with_link_bar = LINK_BAR.replace_all(sidebar, NoExpand(&phrase));
    if with_link_bar == sidebar {
        tracing::error!("link-bar phrase not found in sidebar");
        return Err(TransformError::SidebarUpdateFailed(
            "link-bar phrase '[Game of the Week: ...](/...)' not found".into(),
        ));
    }

    let link = sidebar_link(name, reference.as_str());
    let with_link = SIDEBAR_LINK.replace_all(&with_link_bar, NoExpand(&link));
    if with_link == with_link_bar {
        tracing::error!("GOTWLINK link not found in sidebar");
        return Err(TransformError::SidebarUpdateFailed(
            "link after '[//]: # (GOTWLINK)' not found".into(),
        ));
    }

    Ok(with_link.into_owned())
}
