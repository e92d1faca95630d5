//! Query strings. Kept flat: `serde_urlencoded` cannot parse numbers through
//! `#[serde(flatten)]`.

use crate::db::models::{
    CommentStatus, ConversationStatus, LeadSource, LeadStatus, PublishStatus, ResourceKind,
    SubscriberStatus,
};
use crate::types::pagination::Pagination;
use serde::Deserialize;

macro_rules! paged_query {
    ($($ty:ident),* $(,)?) => {
        $(impl $ty {
            pub fn window(&self) -> Pagination {
                Pagination::new(self.page, self.limit)
            }
        })*
    };
}

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PublicPostQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub category: Option<String>,
    pub tag: Option<String>,
    pub search: Option<String>,
    pub featured: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
pub struct AdminPostQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub status: Option<PublishStatus>,
    pub search: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LeadQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub status: Option<LeadStatus>,
    pub source: Option<LeadSource>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CommentQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub status: Option<CommentStatus>,
    pub post_id: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SubscriberQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub status: Option<SubscriberStatus>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ChatQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub status: Option<ConversationStatus>,
}

paged_query!(
    PageQuery,
    PublicPostQuery,
    AdminPostQuery,
    LeadQuery,
    CommentQuery,
    SubscriberQuery,
    ChatQuery,
);

#[derive(Debug, Default, Deserialize)]
pub struct IndustryQuery {
    pub industry: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct FeaturedQuery {
    pub featured: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ResourceQuery {
    pub kind: Option<ResourceKind>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::Query;
    use axum::http::Uri;

    fn parse<T: serde::de::DeserializeOwned>(uri: &str) -> T {
        let uri: Uri = uri.parse().unwrap();
        Query::<T>::try_from_uri(&uri).unwrap().0
    }

    #[test]
    fn numeric_and_enum_params_parse() {
        let q: LeadQuery = parse("/leads?page=3&limit=500&status=qualified");
        assert_eq!(q.status, Some(LeadStatus::Qualified));
        let window = q.window();
        assert_eq!(window.page, 3);
        assert_eq!(window.limit, 100);
    }

    #[test]
    fn featured_flag_parses() {
        let q: PublicPostQuery = parse("/posts?featured=true&tag=ransomware");
        assert_eq!(q.featured, Some(true));
        assert_eq!(q.tag.as_deref(), Some("ransomware"));
        assert_eq!(q.window(), Pagination::default());
    }
}
