use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use std::collections::HashMap;
use tracing::info;

use crate::db::comments::NewComment;
use crate::db::models::{Category, Comment, Post, PublishStatus, TermCount};
use crate::db::posts::PostFilter;
use crate::error::CmsError;
use crate::middleware::rate_limit::{Bucket, ClientIp};
use crate::middleware::validated::ValidatedJson;
use crate::router::AppState;
use crate::types::forms::{CommentInput, normalize_email};
use crate::types::pagination::Paged;
use crate::types::query::PublicPostQuery;
use crate::types::views::{LikeView, PostDetail, PostView};

/// Attach category and tags to a page of posts.
pub(crate) async fn hydrate_page(
    state: &AppState,
    page: Paged<Post>,
) -> Result<Paged<PostView>, CmsError> {
    let ids: Vec<i64> = page.items.iter().map(|p| p.id).collect();
    let mut tags = state.posts().tags_for_many(&ids).await?;
    let categories: HashMap<i64, Category> = state
        .categories()
        .list()
        .await?
        .into_iter()
        .map(|c| (c.id, c))
        .collect();
    Ok(page.map(|post| PostView {
        category: post.category_id.and_then(|id| categories.get(&id).cloned()),
        tags: tags.remove(&post.id).unwrap_or_default(),
        post,
    }))
}

pub(crate) async fn hydrate_post(state: &AppState, post: Post) -> Result<PostView, CmsError> {
    let category = match post.category_id {
        Some(id) => state.categories().get(id).await?,
        None => None,
    };
    let tags = state.posts().tags_for(post.id).await?;
    Ok(PostView {
        post,
        category,
        tags,
    })
}

async fn published_post(state: &AppState, slug: &str) -> Result<Post, CmsError> {
    state
        .posts()
        .get_by_slug(slug)
        .await?
        .filter(|p| p.status == PublishStatus::Published)
        .ok_or(CmsError::NotFound("post"))
}

/// GET /api/public/posts
pub async fn list_posts(
    State(state): State<AppState>,
    Query(query): Query<PublicPostQuery>,
) -> Result<Json<Paged<PostView>>, CmsError> {
    let window = query.window();
    let filter = PostFilter {
        status: Some(PublishStatus::Published),
        category_slug: query.category,
        tag_slug: query.tag,
        search: query.search,
        featured: query.featured,
    };
    let page = state.posts().list(&filter, window).await?;
    Ok(Json(hydrate_page(&state, page).await?))
}

/// GET /api/public/posts/{slug}
pub async fn get_post(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<PostDetail>, CmsError> {
    let mut post = published_post(&state, &slug).await?;
    state.posts().increment_views(post.id).await?;
    post.view_count += 1;

    let author_name = match post.author_id {
        Some(id) => state.users().get(id).await?.map(|u| u.name),
        None => None,
    };
    let comments = state.comments().approved_for_post(post.id).await?;
    let view = hydrate_post(&state, post).await?;
    Ok(Json(PostDetail {
        view,
        author_name,
        comments,
    }))
}

/// GET /api/public/categories
pub async fn list_categories(
    State(state): State<AppState>,
) -> Result<Json<Vec<TermCount>>, CmsError> {
    Ok(Json(state.categories().list_with_counts().await?))
}

/// GET /api/public/tags
pub async fn list_tags(State(state): State<AppState>) -> Result<Json<Vec<TermCount>>, CmsError> {
    Ok(Json(state.tags().list_with_counts().await?))
}

/// POST /api/public/posts/{slug}/comments
///
/// New comments wait in the moderation queue as `pending`.
pub async fn create_comment(
    State(state): State<AppState>,
    ClientIp(ip): ClientIp,
    Path(slug): Path<String>,
    ValidatedJson(input): ValidatedJson<CommentInput>,
) -> Result<(StatusCode, Json<Comment>), CmsError> {
    state.limits.check(Bucket::Forms, ip)?;
    let post = published_post(&state, &slug).await?;
    let comments = state.comments();

    if let Some(parent_id) = input.parent_id {
        let parent = comments
            .get(parent_id)
            .await?
            .ok_or_else(|| CmsError::BadRequest("parent comment does not exist".to_string()))?;
        if parent.post_id != post.id {
            return Err(CmsError::BadRequest(
                "parent comment belongs to a different post".to_string(),
            ));
        }
    }

    let email = normalize_email(&input.email);
    let comment = comments
        .create(NewComment {
            post_id: post.id,
            parent_id: input.parent_id,
            author_name: input.name.trim(),
            author_email: &email,
            content: input.content.trim(),
        })
        .await?;
    info!(comment_id = comment.id, post_id = post.id, "comment awaiting moderation");
    Ok((StatusCode::CREATED, Json(comment)))
}

/// POST /api/comments/{id}/like
pub async fn like_comment(
    State(state): State<AppState>,
    ClientIp(ip): ClientIp,
    Path(id): Path<i64>,
) -> Result<Json<LikeView>, CmsError> {
    state.limits.check(Bucket::Likes, ip)?;
    let likes = state
        .comments()
        .like(id)
        .await?
        .ok_or(CmsError::NotFound("comment"))?;
    Ok(Json(LikeView { id, likes }))
}
