//! `/api/admin/*`. Every handler takes a [`CurrentUser`] and checks its
//! permission before touching the store.
//!
//! [`CurrentUser`]: crate::middleware::auth::CurrentUser

pub mod catalog;
pub mod chat;
pub mod comments;
pub mod dashboard;
pub mod leads;
pub mod posts;
pub mod settings;
pub mod subscribers;
pub mod taxonomy;
pub mod users;

use crate::error::CmsError;
use crate::service::slug::slug_or_title;

/// Slug from the explicit value or the title; 400 when nothing usable remains.
pub(crate) fn derive_slug(slug: Option<&str>, title: &str) -> Result<String, CmsError> {
    let slug = slug_or_title(slug, title);
    if slug.is_empty() {
        return Err(CmsError::BadRequest(
            "slug must contain at least one letter or digit".to_string(),
        ));
    }
    Ok(slug)
}
