use crate::server::{
    Result, ServerError, ServerRouter,
    auth::AuthenticatedUser,
    extract::{Created, Json, Query},
    pagination::{Listing, PageParams, Paginated},
    permissions::ensure_owner_or_reading,
};
use axum::{
    extract::State,
    http::{Method, StatusCode, Uri},
};
use axum_extra::routing::{RouterExt, TypedPath};
use serde::Deserialize;
use tracing::{debug, info};
use yatube_common::model::{
    Id,
    group::GroupMarker,
    post::{Post, PostFields, PostMarker, PostReplacement, PostUpdate},
};
use yatube_db::store::{DynStore, Store};

pub fn routes() -> ServerRouter {
    ServerRouter::new()
        .typed_get(list_posts)
        .typed_post(create_post)
        .typed_get(get_post)
        .typed_put(replace_post)
        .typed_patch(update_post)
        .typed_delete(delete_post)
}

#[derive(TypedPath)]
#[typed_path("/posts/")]
struct PostsPath;

#[derive(TypedPath, Deserialize)]
#[typed_path("/posts/{post_id}/", rejection(ServerError))]
struct PostPath {
    post_id: Id<PostMarker>,
}

pub(super) async fn fetch_post(store: &dyn Store, post_id: Id<PostMarker>) -> Result<Post> {
    store
        .fetch_post(post_id)
        .await?
        .ok_or(ServerError::PostByIdNotFound(post_id))
}

async fn ensure_group_exists(store: &dyn Store, group_id: Option<Id<GroupMarker>>) -> Result<()> {
    if let Some(group_id) = group_id
        && store.fetch_group(group_id).await?.is_none()
    {
        return Err(ServerError::UnknownGroup(group_id));
    }

    Ok(())
}

async fn list_posts(
    _: PostsPath,
    State(store): State<DynStore>,
    _requester: Option<AuthenticatedUser>,
    uri: Uri,
    Query(params): Query<PageParams>,
) -> Result<Json<Listing<Post>>> {
    let Some(page) = params.page() else {
        let posts = store.fetch_posts(None).await?;
        return Ok(Json(Listing::All(posts)));
    };

    let count = store.count_posts().await?;
    let posts = store.fetch_posts(Some(page)).await?;

    Ok(Json(Listing::Page(Paginated::new(page, &uri, count, posts))))
}

async fn create_post(
    _: PostsPath,
    State(store): State<DynStore>,
    requester: AuthenticatedUser,
    Json(fields): Json<PostFields>,
) -> Result<Created<Post>> {
    ensure_group_exists(&*store, fields.group).await?;

    let post = store
        .create_post(&fields.into_create(requester.id()))
        .await?;
    info!(post = %post.id, author = %requester.username(), "Created post");

    Ok(Created(post))
}

async fn get_post(
    PostPath { post_id }: PostPath,
    method: Method,
    State(store): State<DynStore>,
    requester: Option<AuthenticatedUser>,
) -> Result<Json<Post>> {
    let post = fetch_post(&*store, post_id).await?;
    ensure_owner_or_reading(
        requester.as_ref().map(AuthenticatedUser::user),
        &method,
        post.author.id,
    )?;

    Ok(Json(post))
}

async fn replace_post(
    PostPath { post_id }: PostPath,
    method: Method,
    State(store): State<DynStore>,
    requester: AuthenticatedUser,
    replacement: Result<Json<PostReplacement>>,
) -> Result<Json<Post>> {
    let update = replacement.map(|Json(replacement)| replacement.into());
    write_update(&*store, &requester, &method, post_id, update).await
}

async fn update_post(
    PostPath { post_id }: PostPath,
    method: Method,
    State(store): State<DynStore>,
    requester: AuthenticatedUser,
    update: Result<Json<PostUpdate>>,
) -> Result<Json<Post>> {
    let update = update.map(|Json(update)| update);
    write_update(&*store, &requester, &method, post_id, update).await
}

/// The body is only looked at once the post is known to exist and the requester may edit it.
async fn write_update(
    store: &dyn Store,
    requester: &AuthenticatedUser,
    method: &Method,
    post_id: Id<PostMarker>,
    update: Result<PostUpdate>,
) -> Result<Json<Post>> {
    let post = fetch_post(store, post_id).await?;
    ensure_owner_or_reading(Some(requester.user()), method, post.author.id)?;

    let update = update?;
    ensure_group_exists(store, update.target_group()).await?;

    let post = store
        .update_post(post_id, &update)
        .await?
        .ok_or(ServerError::PostByIdNotFound(post_id))?;
    debug!(post = %post_id, editor = %requester.username(), "Updated post");

    Ok(Json(post))
}

async fn delete_post(
    PostPath { post_id }: PostPath,
    method: Method,
    State(store): State<DynStore>,
    requester: AuthenticatedUser,
) -> Result<StatusCode> {
    let post = fetch_post(&*store, post_id).await?;
    ensure_owner_or_reading(Some(requester.user()), &method, post.author.id)?;

    if !store.delete_post(post_id).await? {
        return Err(ServerError::PostByIdNotFound(post_id));
    }
    info!(post = %post_id, by = %requester.username(), "Deleted post");

    Ok(StatusCode::NO_CONTENT)
}
