use crate::server::{
    Result, ServerError, ServerRouter,
    auth::AuthenticatedUser,
    extract::{Created, Json, Query},
    search::{SearchParams, matches_all_terms},
};
use axum::extract::State;
use axum_extra::routing::{RouterExt, TypedPath};
use tracing::info;
use yatube_common::model::follow::{CreateFollow, Follow, FollowFields};
use yatube_db::store::{DynStore, Store};

/// Who the requester follows. Listing and creating both need authentication; there is
/// no way to read or change anybody else's edges.
pub fn routes() -> ServerRouter {
    ServerRouter::new()
        .typed_get(list_follows)
        .typed_post(create_follow)
}

#[derive(TypedPath)]
#[typed_path("/follow/")]
struct FollowPath;

async fn requester_follows(store: &dyn Store, requester: &AuthenticatedUser) -> Result<Vec<Follow>> {
    // Edges are keyed on the account found by username, not on the token's user id.
    let user = store
        .fetch_user_by_username(requester.username())
        .await?
        .ok_or_else(|| ServerError::UserByUsernameNotFound(requester.username().clone()))?;

    Ok(store.fetch_follows(user.id).await?)
}

async fn list_follows(
    _: FollowPath,
    State(store): State<DynStore>,
    requester: AuthenticatedUser,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<Follow>>> {
    let terms = params.terms();
    let follows = requester_follows(&*store, &requester)
        .await?
        .into_iter()
        .filter(|follow| {
            matches_all_terms(
                &terms,
                &[follow.user.username.get(), follow.following.username.get()],
            )
        })
        .collect();

    Ok(Json(follows))
}

async fn create_follow(
    _: FollowPath,
    State(store): State<DynStore>,
    requester: AuthenticatedUser,
    Json(fields): Json<FollowFields>,
) -> Result<Created<Follow>> {
    let following = store
        .fetch_user_by_username(&fields.following)
        .await?
        .ok_or_else(|| ServerError::UnknownFollowee(fields.following.clone()))?;

    let follow = store
        .create_follow(&CreateFollow {
            user: requester.id(),
            following: following.id,
        })
        .await?;
    info!(user = %requester.username(), following = %follow.following.username, "Created follow");

    Ok(Created(follow))
}
