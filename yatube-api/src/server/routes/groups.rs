use crate::server::{Result, ServerError, ServerRouter, auth::AuthenticatedUser, extract::Json};
use axum::extract::State;
use axum_extra::routing::{RouterExt, TypedPath};
use serde::Deserialize;
use yatube_common::model::{
    Id,
    group::{Group, GroupMarker},
};
use yatube_db::store::DynStore;

/// Groups are managed outside the API and can only be read.
pub fn routes() -> ServerRouter {
    ServerRouter::new()
        .typed_get(list_groups)
        .typed_get(get_group)
}

#[derive(TypedPath)]
#[typed_path("/groups/")]
struct GroupsPath;

#[derive(TypedPath, Deserialize)]
#[typed_path("/groups/{group_id}/", rejection(ServerError))]
struct GroupPath {
    group_id: Id<GroupMarker>,
}

async fn list_groups(
    _: GroupsPath,
    State(store): State<DynStore>,
    _requester: Option<AuthenticatedUser>,
) -> Result<Json<Vec<Group>>> {
    let groups = store.fetch_groups().await?;

    Ok(Json(groups))
}

async fn get_group(
    GroupPath { group_id }: GroupPath,
    State(store): State<DynStore>,
    _requester: Option<AuthenticatedUser>,
) -> Result<Json<Group>> {
    let group = store
        .fetch_group(group_id)
        .await?
        .ok_or(ServerError::GroupByIdNotFound(group_id))?;

    Ok(Json(group))
}
