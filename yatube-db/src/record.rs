use sqlx::FromRow;
use time::{Duration, OffsetDateTime};
use yatube_common::model::{
    ModelValidationError, Text,
    auth::Authentication,
    comment::Comment,
    follow::Follow,
    group::Group,
    post::Post,
    user::{User, Username},
};

#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, FromRow)]
pub(crate) struct UserRecord {
    pub user_id: i64,
    pub username: String,
    pub is_superuser: bool,
}

#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, FromRow)]
pub(crate) struct GroupRecord {
    pub group_id: i64,
    pub title: String,
    pub slug: String,
    pub description: String,
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, FromRow)]
pub(crate) struct FullPostRecord {
    pub post_id: i64,
    pub text: String,
    pub pub_date: OffsetDateTime,
    pub group_id: Option<i64>,
    pub user_id: i64,
    pub username: String,
    pub is_superuser: bool,
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, FromRow)]
pub(crate) struct FullCommentRecord {
    pub comment_id: i64,
    pub text: String,
    pub created: OffsetDateTime,
    pub post_id: i64,
    pub user_id: i64,
    pub username: String,
    pub is_superuser: bool,
}

#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, FromRow)]
pub(crate) struct FullFollowRecord {
    pub follow_id: i64,
    pub user_id: i64,
    pub username: String,
    pub is_superuser: bool,
    pub following_id: i64,
    pub following_username: String,
    pub following_is_superuser: bool,
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, FromRow)]
pub(crate) struct AuthenticationRecord {
    pub user_id: i64,
    pub token_hash: Vec<u8>,
    pub created_at: OffsetDateTime,
    pub expires_after_seconds: Option<i64>,
}

fn user(user_id: i64, username: String, is_superuser: bool) -> Result<User, ModelValidationError> {
    Ok(User {
        id: user_id.into(),
        username: Username::new(username)?,
        is_superuser,
    })
}

impl TryFrom<UserRecord> for User {
    type Error = ModelValidationError;

    fn try_from(value: UserRecord) -> Result<Self, Self::Error> {
        user(value.user_id, value.username, value.is_superuser)
    }
}

impl From<GroupRecord> for Group {
    fn from(value: GroupRecord) -> Self {
        Self {
            id: value.group_id.into(),
            title: value.title,
            slug: value.slug,
            description: value.description,
        }
    }
}

impl TryFrom<FullPostRecord> for Post {
    type Error = ModelValidationError;

    fn try_from(value: FullPostRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            id: value.post_id.into(),
            text: Text::new(&value.text)?,
            author: user(value.user_id, value.username, value.is_superuser)?,
            group: value.group_id.map(Into::into),
            pub_date: value.pub_date,
        })
    }
}

impl TryFrom<FullCommentRecord> for Comment {
    type Error = ModelValidationError;

    fn try_from(value: FullCommentRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            id: value.comment_id.into(),
            text: Text::new(&value.text)?,
            author: user(value.user_id, value.username, value.is_superuser)?,
            post: value.post_id.into(),
            created: value.created,
        })
    }
}

impl TryFrom<FullFollowRecord> for Follow {
    type Error = ModelValidationError;

    fn try_from(value: FullFollowRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            id: value.follow_id.into(),
            user: user(value.user_id, value.username, value.is_superuser)?,
            following: user(
                value.following_id,
                value.following_username,
                value.following_is_superuser,
            )?,
        })
    }
}

impl TryFrom<AuthenticationRecord> for Authentication {
    type Error = ModelValidationError;

    fn try_from(value: AuthenticationRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            user: value.user_id.into(),
            token_hash: value.token_hash.try_into()?,
            created_at: value.created_at,
            expires_after: value
                .expires_after_seconds
                .map(|seconds| Duration::seconds(seconds).try_into())
                .transpose()?,
        })
    }
}
