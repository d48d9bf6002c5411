use crate::server::{
    Result, ServerError, ServerRouter,
    auth::AuthenticatedUser,
    extract::{Created, Json},
    permissions::ensure_owner_or_reading,
    routes::posts::fetch_post,
};
use axum::{
    extract::State,
    http::{Method, StatusCode},
};
use axum_extra::routing::{RouterExt, TypedPath};
use serde::Deserialize;
use tracing::{debug, info};
use yatube_common::model::{
    Id,
    comment::{Comment, CommentFields, CommentMarker, CommentUpdate},
    post::PostMarker,
};
use yatube_db::store::{DynStore, Store};

/// Comments live under their post. The post is always taken from the path and has to
/// exist for any of these routes to do something.
pub fn routes() -> ServerRouter {
    ServerRouter::new()
        .typed_get(list_comments)
        .typed_post(create_comment)
        .typed_get(get_comment)
        .typed_put(replace_comment)
        .typed_patch(update_comment)
        .typed_delete(delete_comment)
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/posts/{post_id}/comments/", rejection(ServerError))]
struct CommentsPath {
    post_id: Id<PostMarker>,
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/posts/{post_id}/comments/{comment_id}/", rejection(ServerError))]
struct CommentPath {
    post_id: Id<PostMarker>,
    comment_id: Id<CommentMarker>,
}

async fn fetch_comment(
    store: &dyn Store,
    post_id: Id<PostMarker>,
    comment_id: Id<CommentMarker>,
) -> Result<Comment> {
    let post = fetch_post(store, post_id).await?;

    store
        .fetch_comment(post.id, comment_id)
        .await?
        .ok_or(ServerError::CommentByIdNotFound(comment_id))
}

async fn list_comments(
    CommentsPath { post_id }: CommentsPath,
    State(store): State<DynStore>,
    _requester: Option<AuthenticatedUser>,
) -> Result<Json<Vec<Comment>>> {
    let post = fetch_post(&*store, post_id).await?;
    let comments = store.fetch_post_comments(post.id).await?;

    Ok(Json(comments))
}

async fn create_comment(
    CommentsPath { post_id }: CommentsPath,
    State(store): State<DynStore>,
    requester: AuthenticatedUser,
    Json(fields): Json<CommentFields>,
) -> Result<Created<Comment>> {
    let post = fetch_post(&*store, post_id).await?;

    let comment = store
        .create_comment(&fields.into_create(requester.id(), post.id))
        .await?;
    info!(comment = %comment.id, post = %post.id, author = %requester.username(), "Created comment");

    Ok(Created(comment))
}

async fn get_comment(
    CommentPath {
        post_id,
        comment_id,
    }: CommentPath,
    method: Method,
    State(store): State<DynStore>,
    requester: Option<AuthenticatedUser>,
) -> Result<Json<Comment>> {
    let comment = fetch_comment(&*store, post_id, comment_id).await?;
    ensure_owner_or_reading(
        requester.as_ref().map(AuthenticatedUser::user),
        &method,
        comment.author.id,
    )?;

    Ok(Json(comment))
}

async fn replace_comment(
    CommentPath {
        post_id,
        comment_id,
    }: CommentPath,
    method: Method,
    State(store): State<DynStore>,
    requester: AuthenticatedUser,
    fields: Result<Json<CommentFields>>,
) -> Result<Json<Comment>> {
    let update = fields.map(|Json(fields)| fields.into());
    write_update(&*store, &requester, &method, (post_id, comment_id), update).await
}

async fn update_comment(
    CommentPath {
        post_id,
        comment_id,
    }: CommentPath,
    method: Method,
    State(store): State<DynStore>,
    requester: AuthenticatedUser,
    update: Result<Json<CommentUpdate>>,
) -> Result<Json<Comment>> {
    let update = update.map(|Json(update)| update);
    write_update(&*store, &requester, &method, (post_id, comment_id), update).await
}

async fn write_update(
    store: &dyn Store,
    requester: &AuthenticatedUser,
    method: &Method,
    (post_id, comment_id): (Id<PostMarker>, Id<CommentMarker>),
    update: Result<CommentUpdate>,
) -> Result<Json<Comment>> {
    let comment = fetch_comment(store, post_id, comment_id).await?;
    ensure_owner_or_reading(Some(requester.user()), method, comment.author.id)?;
    let update = update?;

    let comment = store
        .update_comment(comment_id, &update)
        .await?
        .ok_or(ServerError::CommentByIdNotFound(comment_id))?;
    debug!(comment = %comment_id, editor = %requester.username(), "Updated comment");

    Ok(Json(comment))
}

async fn delete_comment(
    CommentPath {
        post_id,
        comment_id,
    }: CommentPath,
    method: Method,
    State(store): State<DynStore>,
    requester: AuthenticatedUser,
) -> Result<StatusCode> {
    let comment = fetch_comment(&*store, post_id, comment_id).await?;
    ensure_owner_or_reading(Some(requester.user()), &method, comment.author.id)?;

    if !store.delete_comment(comment_id).await? {
        return Err(ServerError::CommentByIdNotFound(comment_id));
    }
    info!(comment = %comment_id, by = %requester.username(), "Deleted comment");

    Ok(StatusCode::NO_CONTENT)
}
