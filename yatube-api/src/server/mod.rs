use axum::{
    Router,
    extract::{
        FromRef, Request,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::{Method, StatusCode, Uri},
    response::{IntoResponse, Response},
};
use axum_extra::typed_header::TypedHeaderRejection;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tower_http::trace::TraceLayer;
use tracing::{error, warn};
use yatube_common::model::{
    Id,
    auth::{MalformedTokenError, TokenHashingError},
    comment::CommentMarker,
    group::GroupMarker,
    post::PostMarker,
    user::Username,
};
use yatube_db::store::{DbError, DynStore, FOLLOWS_NO_SELF_FOLLOW, FOLLOWS_UNIQUE_PAIR, Store};

pub mod auth;
mod extract;
pub mod pagination;
pub mod permissions;
mod routes;
pub mod search;

pub type ServerRouter = Router<ServerState>;

#[derive(Clone, FromRef)]
pub struct ServerState {
    pub store: DynStore,
}

impl ServerState {
    pub fn new(store: impl Store + 'static) -> Self {
        Self {
            store: Arc::new(store),
        }
    }
}

pub fn routes() -> ServerRouter {
    routes::routes()
        .fallback(fallback)
        .method_not_allowed_fallback(method_not_allowed)
}

/// The complete application with request tracing, ready to be served.
pub fn app(state: ServerState) -> Router {
    routes()
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn fallback(request: Request) -> ServerError {
    ServerError::UnknownRoute(request.into_parts().0.uri)
}

pub async fn method_not_allowed(method: Method) -> ServerError {
    ServerError::MethodNotAllowed(method)
}

pub type Result<T, E = ServerError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Unknown route requested: {0}")]
    UnknownRoute(Uri),
    #[error("Method {0} is not allowed on this route")]
    MethodNotAllowed(Method),
    #[error("Path rejected: {0}")]
    PathRejection(#[from] PathRejection),
    #[error("Query string rejected: {0}")]
    QueryRejection(#[from] QueryRejection),
    #[error("Incoming JSON rejected: {0}")]
    JsonRejection(#[from] JsonRejection),
    #[error("JSON response could not be serialized: {0}")]
    JsonResponse(#[from] serde_json::Error),
    #[error("Authentication credentials were not provided or unreadable: {0}")]
    InvalidAuthorizationHeader(TypedHeaderRejection),
    #[error("Bearer token is malformed: {0}")]
    MalformedToken(#[from] MalformedTokenError),
    #[error(transparent)]
    TokenHashing(#[from] TokenHashingError),
    #[error("Invalid token.")]
    InvalidToken,
    #[error("You do not have permission to perform this action.")]
    Forbidden,
    #[error(transparent)]
    Database(#[from] DbError),
    #[error("Group with id {0} was not found.")]
    GroupByIdNotFound(Id<GroupMarker>),
    #[error("Post with id {0} was not found.")]
    PostByIdNotFound(Id<PostMarker>),
    #[error("Comment with id {0} was not found.")]
    CommentByIdNotFound(Id<CommentMarker>),
    #[error("User with username {0} was not found.")]
    UserByUsernameNotFound(Username),
    #[error("Group with id {0} does not exist.")]
    UnknownGroup(Id<GroupMarker>),
    #[error("User with username {0} does not exist.")]
    UnknownFollowee(Username),
}

impl ServerError {
    pub fn status(&self) -> StatusCode {
        match self {
            ServerError::UnknownRoute(_)
            | ServerError::PathRejection(_)
            | ServerError::GroupByIdNotFound(_)
            | ServerError::PostByIdNotFound(_)
            | ServerError::CommentByIdNotFound(_)
            | ServerError::UserByUsernameNotFound(_) => StatusCode::NOT_FOUND,
            ServerError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            ServerError::InvalidAuthorizationHeader(rejection) if rejection.is_missing() => {
                StatusCode::UNAUTHORIZED
            }
            ServerError::InvalidToken => StatusCode::UNAUTHORIZED,
            ServerError::Forbidden => StatusCode::FORBIDDEN,
            ServerError::JsonRejection(JsonRejection::MissingJsonContentType(_)) => {
                StatusCode::UNSUPPORTED_MEDIA_TYPE
            }
            ServerError::Database(err) if err.violated_constraint().is_some() => {
                StatusCode::BAD_REQUEST
            }
            ServerError::JsonRejection(_)
            | ServerError::QueryRejection(_)
            | ServerError::InvalidAuthorizationHeader(_)
            | ServerError::MalformedToken(_)
            | ServerError::UnknownGroup(_)
            | ServerError::UnknownFollowee(_) => StatusCode::BAD_REQUEST,
            ServerError::JsonResponse(_)
            | ServerError::Database(_)
            | ServerError::TokenHashing(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message shown to the client. Internal failures are not described.
    fn detail(&self) -> String {
        match self {
            ServerError::Database(err) => match err.violated_constraint() {
                Some(FOLLOWS_UNIQUE_PAIR) => "You already follow this user.".to_owned(),
                Some(FOLLOWS_NO_SELF_FOLLOW) => "You cannot follow yourself.".to_owned(),
                Some(constraint) => format!("Constraint {constraint} was violated."),
                None => "Internal server error.".to_owned(),
            },
            ServerError::InvalidAuthorizationHeader(rejection) if rejection.is_missing() => {
                "Authentication credentials were not provided.".to_owned()
            }
            ServerError::JsonResponse(_) | ServerError::TokenHashing(_) => {
                "Internal server error.".to_owned()
            }
            other => other.to_string(),
        }
    }
}

#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash, Serialize, Deserialize)]
struct ErrorResponse {
    status: u16,
    detail: String,
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            error!(error = %self, %status, "Replying with error");
        } else {
            warn!(error = %self, %status, "Replying with error");
        }

        let error_response = ErrorResponse {
            status: status.as_u16(),
            detail: self.detail(),
        };
        extract::json_response(status, &error_response)
    }
}
