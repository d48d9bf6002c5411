use crate::server::{Result, ServerError};
use axum::{
    extract::{FromRef, FromRequestParts, OptionalFromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
};
use axum_extra::TypedHeader;
use headers::{Authorization, authorization::Bearer};
use time::OffsetDateTime;
use tracing::debug;
use yatube_common::model::{
    Id,
    auth::AuthToken,
    user::{User, UserMarker, Username},
};
use yatube_db::store::{DynStore, Store};

/// The requester, resolved from a bearer token.
///
/// Extracting it directly makes a route require authentication. Extracting
/// `Option<AuthenticatedUser>` lets anonymous requests through but still rejects
/// a token that is present and invalid.
#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub struct AuthenticatedUser {
    user: User,
}

impl AuthenticatedUser {
    #[must_use]
    pub fn user(&self) -> &User {
        &self.user
    }

    #[must_use]
    pub fn id(&self) -> Id<UserMarker> {
        self.user.id
    }

    #[must_use]
    pub fn username(&self) -> &Username {
        &self.user.username
    }
}

async fn bearer_token<S>(parts: &mut Parts, state: &S) -> Result<AuthToken>
where
    S: Send + Sync,
{
    let TypedHeader(authorization) =
        <TypedHeader<Authorization<Bearer>> as FromRequestParts<S>>::from_request_parts(
            parts, state,
        )
        .await
        .map_err(ServerError::InvalidAuthorizationHeader)?;

    Ok(authorization.token().parse()?)
}

/// Looks the token up by its hash and resolves the user it was issued to.
async fn authenticate(store: &dyn Store, token: &AuthToken) -> Result<User> {
    let authentication = store
        .fetch_authentication(&token.hash()?)
        .await?
        .ok_or(ServerError::InvalidToken)?;

    if !authentication.is_valid_for(token.user_id, OffsetDateTime::now_utc()) {
        debug!(user = %token.user_id, "Rejecting expired or mismatched token");
        return Err(ServerError::InvalidToken);
    }

    store
        .fetch_user(authentication.user)
        .await?
        .ok_or(ServerError::InvalidToken)
}

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    DynStore: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ServerError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts, state).await?;
        let user = authenticate(&*DynStore::from_ref(state), &token).await?;

        Ok(Self { user })
    }
}

impl<S> OptionalFromRequestParts<S> for AuthenticatedUser
where
    DynStore: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ServerError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &S,
    ) -> Result<Option<Self>, Self::Rejection> {
        if !parts.headers.contains_key(AUTHORIZATION) {
            return Ok(None);
        }

        <Self as FromRequestParts<S>>::from_request_parts(parts, state)
            .await
            .map(Some)
    }
}
