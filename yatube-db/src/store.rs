use async_trait::async_trait;
use sqlx::{error::ErrorKind, migrate::MigrateError};
use std::sync::Arc;
use thiserror::Error;
use yatube_common::model::{
    Id, ModelValidationError,
    auth::{Authentication, TokenHash},
    comment::{Comment, CommentMarker, CommentUpdate, CreateComment},
    follow::{CreateFollow, Follow},
    group::{CreateGroup, Group, GroupMarker},
    post::{CreatePost, Post, PostMarker, PostUpdate},
    user::{CreateUser, User, UserMarker, Username},
};

pub const FOLLOWS_UNIQUE_PAIR: &str = "follows_unique_pair";
pub const FOLLOWS_NO_SELF_FOLLOW: &str = "follows_no_self_follow";
pub const POSTS_GROUP_FKEY: &str = "posts_group_id_fkey";
pub const USERS_USERNAME_KEY: &str = "users_username_key";
pub const GROUPS_SLUG_KEY: &str = "groups_slug_key";

pub type Result<T, E = DbError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("An object in the database was invalid: {0}")]
    Data(#[from] ModelValidationError),
    #[error("Database constraint {constraint} was violated")]
    Constraint { constraint: String },
    #[error(transparent)]
    Sqlx(sqlx::Error),
    #[error("Applying migrations failed: {0}")]
    Migrate(#[from] MigrateError),
}

impl DbError {
    #[must_use]
    pub fn violated_constraint(&self) -> Option<&str> {
        match self {
            DbError::Constraint { constraint } => Some(constraint),
            _ => None,
        }
    }
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        if let Some(database_error) = err.as_database_error()
            && matches!(
                database_error.kind(),
                ErrorKind::UniqueViolation | ErrorKind::ForeignKeyViolation | ErrorKind::CheckViolation
            )
        {
            return DbError::Constraint {
                constraint: database_error.constraint().unwrap_or_default().to_owned(),
            };
        }

        DbError::Sqlx(err)
    }
}

/// A limit/offset window into an ordered listing.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash)]
pub struct Page {
    pub limit: u64,
    pub offset: u64,
}

pub type DynStore = Arc<dyn Store>;

/// Persistence behind the API. Listings are ordered by id.
#[async_trait]
pub trait Store: Send + Sync {
    async fn fetch_user(&self, user_id: Id<UserMarker>) -> Result<Option<User>>;

    async fn fetch_user_by_username(&self, username: &Username) -> Result<Option<User>>;

    async fn create_user(&self, user: &CreateUser) -> Result<User>;

    async fn fetch_authentication(&self, token_hash: &TokenHash)
    -> Result<Option<Authentication>>;

    async fn create_authentication(&self, authentication: &Authentication) -> Result<()>;

    async fn fetch_groups(&self) -> Result<Vec<Group>>;

    async fn fetch_group(&self, group_id: Id<GroupMarker>) -> Result<Option<Group>>;

    async fn create_group(&self, group: &CreateGroup) -> Result<Group>;

    async fn count_posts(&self) -> Result<u64>;

    /// All posts, or only those inside `page`.
    async fn fetch_posts(&self, page: Option<Page>) -> Result<Vec<Post>>;

    async fn fetch_post(&self, post_id: Id<PostMarker>) -> Result<Option<Post>>;

    async fn create_post(&self, post: &CreatePost) -> Result<Post>;

    /// Returns `None` when the post does not exist.
    async fn update_post(&self, post_id: Id<PostMarker>, update: &PostUpdate)
    -> Result<Option<Post>>;

    /// Deletes the post and its comments. Returns whether the post existed.
    async fn delete_post(&self, post_id: Id<PostMarker>) -> Result<bool>;

    async fn fetch_post_comments(&self, post_id: Id<PostMarker>) -> Result<Vec<Comment>>;

    /// Only finds the comment if it belongs to `post_id`.
    async fn fetch_comment(
        &self,
        post_id: Id<PostMarker>,
        comment_id: Id<CommentMarker>,
    ) -> Result<Option<Comment>>;

    async fn create_comment(&self, comment: &CreateComment) -> Result<Comment>;

    async fn update_comment(
        &self,
        comment_id: Id<CommentMarker>,
        update: &CommentUpdate,
    ) -> Result<Option<Comment>>;

    async fn delete_comment(&self, comment_id: Id<CommentMarker>) -> Result<bool>;

    /// Edges whose follower is `user_id`.
    async fn fetch_follows(&self, user_id: Id<UserMarker>) -> Result<Vec<Follow>>;

    async fn create_follow(&self, follow: &CreateFollow) -> Result<Follow>;
}
