use crate::{
    record::{
        AuthenticationRecord, FullCommentRecord, FullFollowRecord, FullPostRecord, GroupRecord,
        UserRecord,
    },
    store::{Page, Result, Store},
};
use async_trait::async_trait;
use sqlx::{PgPool, postgres::PgPoolOptions, query, query_as, query_scalar};
use tracing::{debug, info};
use yatube_common::{
    model::{
        Id, Text,
        auth::{Authentication, TokenHash},
        comment::{Comment, CommentMarker, CommentUpdate, CreateComment},
        follow::{CreateFollow, Follow},
        group::{CreateGroup, Group, GroupMarker},
        post::{CreatePost, Post, PostMarker, PostUpdate},
        user::{CreateUser, User, UserMarker, Username},
    },
    util::PositiveDuration,
};

/// Postgres backed [`Store`].
#[derive(Clone, Debug)]
pub struct DbClient {
    pool: PgPool,
}

impl DbClient {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self> {
        debug!(max_connections, "Connecting to database");
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;

        Ok(Self::new(pool))
    }

    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        info!("Database migrations applied");
        Ok(())
    }
}

#[async_trait]
impl Store for DbClient {
    async fn fetch_user(&self, user_id: Id<UserMarker>) -> Result<Option<User>> {
        let record = query_as::<_, UserRecord>(
            "
            SELECT
                users.user_id,
                users.username,
                users.is_superuser
            FROM
                users.users
            WHERE
                users.user_id = $1
            ",
        )
        .bind(user_id.get())
        .fetch_optional(&self.pool)
        .await?;

        let user = record.map(User::try_from).transpose()?;
        Ok(user)
    }

    async fn fetch_user_by_username(&self, username: &Username) -> Result<Option<User>> {
        let record = query_as::<_, UserRecord>(
            "
            SELECT
                users.user_id,
                users.username,
                users.is_superuser
            FROM
                users.users
            WHERE
                users.username = $1
            ",
        )
        .bind(username.get())
        .fetch_optional(&self.pool)
        .await?;

        let user = record.map(User::try_from).transpose()?;
        Ok(user)
    }

    async fn create_user(&self, user: &CreateUser) -> Result<User> {
        let record = query_as::<_, UserRecord>(
            "
            INSERT INTO users.users (username, is_superuser)
            VALUES ($1, $2)
            RETURNING user_id, username, is_superuser
            ",
        )
        .bind(user.username.get())
        .bind(user.is_superuser)
        .fetch_one(&self.pool)
        .await?;

        Ok(record.try_into()?)
    }

    async fn fetch_authentication(
        &self,
        token_hash: &TokenHash,
    ) -> Result<Option<Authentication>> {
        let record = query_as::<_, AuthenticationRecord>(
            "
            SELECT
                authentications.user_id,
                authentications.token_hash,
                authentications.created_at,
                authentications.expires_after_seconds
            FROM
                users.authentications
            WHERE
                authentications.token_hash = $1
            ",
        )
        .bind(token_hash.as_bytes())
        .fetch_optional(&self.pool)
        .await?;

        let authentication = record.map(Authentication::try_from).transpose()?;
        Ok(authentication)
    }

    async fn create_authentication(&self, authentication: &Authentication) -> Result<()> {
        query(
            "
            INSERT INTO users.authentications
                (token_hash, user_id, created_at, expires_after_seconds)
            VALUES ($1, $2, $3, $4)
            ",
        )
        .bind(authentication.token_hash.as_bytes())
        .bind(authentication.user.get())
        .bind(authentication.created_at)
        .bind(
            authentication
                .expires_after
                .as_ref()
                .map(PositiveDuration::whole_seconds_ceil),
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn fetch_groups(&self) -> Result<Vec<Group>> {
        let records = query_as::<_, GroupRecord>(
            "
            SELECT
                groups.group_id,
                groups.title,
                groups.slug,
                groups.description
            FROM
                posts.groups
            ORDER BY
                groups.group_id
            ",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(records.into_iter().map(Group::from).collect())
    }

    async fn fetch_group(&self, group_id: Id<GroupMarker>) -> Result<Option<Group>> {
        let record = query_as::<_, GroupRecord>(
            "
            SELECT
                groups.group_id,
                groups.title,
                groups.slug,
                groups.description
            FROM
                posts.groups
            WHERE
                groups.group_id = $1
            ",
        )
        .bind(group_id.get())
        .fetch_optional(&self.pool)
        .await?;

        Ok(record.map(Group::from))
    }

    async fn create_group(&self, group: &CreateGroup) -> Result<Group> {
        let record = query_as::<_, GroupRecord>(
            "
            INSERT INTO posts.groups (title, slug, description)
            VALUES ($1, $2, $3)
            RETURNING group_id, title, slug, description
            ",
        )
        .bind(&group.title)
        .bind(&group.slug)
        .bind(&group.description)
        .fetch_one(&self.pool)
        .await?;

        Ok(record.into())
    }

    async fn count_posts(&self) -> Result<u64> {
        let count: i64 = query_scalar("SELECT COUNT(*) FROM posts.posts")
            .fetch_one(&self.pool)
            .await?;

        Ok(count.cast_unsigned())
    }

    async fn fetch_posts(&self, page: Option<Page>) -> Result<Vec<Post>> {
        let limit = page.map(|page| i64::try_from(page.limit).unwrap_or(i64::MAX));
        let offset = page.map_or(0, |page| i64::try_from(page.offset).unwrap_or(i64::MAX));

        let records = query_as::<_, FullPostRecord>(
            "
            SELECT
                posts.post_id,
                posts.text,
                posts.pub_date,
                posts.group_id,
                users.user_id,
                users.username,
                users.is_superuser
            FROM
                posts.posts JOIN users.users ON users.user_id = posts.author_id
            ORDER BY
                posts.post_id
            LIMIT $1 OFFSET $2
            ",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let posts = records
            .into_iter()
            .map(Post::try_from)
            .collect::<Result<_, _>>()?;
        Ok(posts)
    }

    async fn fetch_post(&self, post_id: Id<PostMarker>) -> Result<Option<Post>> {
        let record = query_as::<_, FullPostRecord>(
            "
            SELECT
                posts.post_id,
                posts.text,
                posts.pub_date,
                posts.group_id,
                users.user_id,
                users.username,
                users.is_superuser
            FROM
                posts.posts JOIN users.users ON users.user_id = posts.author_id
            WHERE
                posts.post_id = $1
            ",
        )
        .bind(post_id.get())
        .fetch_optional(&self.pool)
        .await?;

        let post = record.map(Post::try_from).transpose()?;
        Ok(post)
    }

    async fn create_post(&self, post: &CreatePost) -> Result<Post> {
        let record = query_as::<_, FullPostRecord>(
            "
            WITH inserted AS (
                INSERT INTO posts.posts (text, author_id, group_id)
                VALUES ($1, $2, $3)
                RETURNING post_id, text, pub_date, group_id, author_id
            )
            SELECT
                inserted.post_id,
                inserted.text,
                inserted.pub_date,
                inserted.group_id,
                users.user_id,
                users.username,
                users.is_superuser
            FROM
                inserted JOIN users.users ON users.user_id = inserted.author_id
            ",
        )
        .bind(post.text.get())
        .bind(post.author.get())
        .bind(post.group.map(Id::get))
        .fetch_one(&self.pool)
        .await?;

        Ok(record.try_into()?)
    }

    async fn update_post(
        &self,
        post_id: Id<PostMarker>,
        update: &PostUpdate,
    ) -> Result<Option<Post>> {
        let updated = query(
            "
            UPDATE posts.posts
            SET
                text = COALESCE($2, text),
                group_id = CASE WHEN $3 THEN $4 ELSE group_id END
            WHERE
                post_id = $1
            ",
        )
        .bind(post_id.get())
        .bind(update.text.as_ref().map(Text::get))
        .bind(update.group.is_some())
        .bind(update.target_group().map(Id::get))
        .execute(&self.pool)
        .await?
        .rows_affected();

        if updated == 0 {
            return Ok(None);
        }
        self.fetch_post(post_id).await
    }

    async fn delete_post(&self, post_id: Id<PostMarker>) -> Result<bool> {
        let deleted = query("DELETE FROM posts.posts WHERE post_id = $1")
            .bind(post_id.get())
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(deleted > 0)
    }

    async fn fetch_post_comments(&self, post_id: Id<PostMarker>) -> Result<Vec<Comment>> {
        let records = query_as::<_, FullCommentRecord>(
            "
            SELECT
                comments.comment_id,
                comments.text,
                comments.created,
                comments.post_id,
                users.user_id,
                users.username,
                users.is_superuser
            FROM
                posts.comments JOIN users.users ON users.user_id = comments.author_id
            WHERE
                comments.post_id = $1
            ORDER BY
                comments.comment_id
            ",
        )
        .bind(post_id.get())
        .fetch_all(&self.pool)
        .await?;

        let comments = records
            .into_iter()
            .map(Comment::try_from)
            .collect::<Result<_, _>>()?;
        Ok(comments)
    }

    async fn fetch_comment(
        &self,
        post_id: Id<PostMarker>,
        comment_id: Id<CommentMarker>,
    ) -> Result<Option<Comment>> {
        let record = query_as::<_, FullCommentRecord>(
            "
            SELECT
                comments.comment_id,
                comments.text,
                comments.created,
                comments.post_id,
                users.user_id,
                users.username,
                users.is_superuser
            FROM
                posts.comments JOIN users.users ON users.user_id = comments.author_id
            WHERE
                comments.post_id = $1 AND comments.comment_id = $2
            ",
        )
        .bind(post_id.get())
        .bind(comment_id.get())
        .fetch_optional(&self.pool)
        .await?;

        let comment = record.map(Comment::try_from).transpose()?;
        Ok(comment)
    }

    async fn create_comment(&self, comment: &CreateComment) -> Result<Comment> {
        let record = query_as::<_, FullCommentRecord>(
            "
            WITH inserted AS (
                INSERT INTO posts.comments (text, author_id, post_id)
                VALUES ($1, $2, $3)
                RETURNING comment_id, text, created, post_id, author_id
            )
            SELECT
                inserted.comment_id,
                inserted.text,
                inserted.created,
                inserted.post_id,
                users.user_id,
                users.username,
                users.is_superuser
            FROM
                inserted JOIN users.users ON users.user_id = inserted.author_id
            ",
        )
        .bind(comment.text.get())
        .bind(comment.author.get())
        .bind(comment.post.get())
        .fetch_one(&self.pool)
        .await?;

        Ok(record.try_into()?)
    }

    async fn update_comment(
        &self,
        comment_id: Id<CommentMarker>,
        update: &CommentUpdate,
    ) -> Result<Option<Comment>> {
        let post_id: Option<i64> = query_scalar(
            "
            UPDATE posts.comments
            SET
                text = COALESCE($2, text)
            WHERE
                comment_id = $1
            RETURNING post_id
            ",
        )
        .bind(comment_id.get())
        .bind(update.text.as_ref().map(Text::get))
        .fetch_optional(&self.pool)
        .await?;

        match post_id {
            Some(post_id) => self.fetch_comment(post_id.into(), comment_id).await,
            None => Ok(None),
        }
    }

    async fn delete_comment(&self, comment_id: Id<CommentMarker>) -> Result<bool> {
        let deleted = query("DELETE FROM posts.comments WHERE comment_id = $1")
            .bind(comment_id.get())
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(deleted > 0)
    }

    async fn fetch_follows(&self, user_id: Id<UserMarker>) -> Result<Vec<Follow>> {
        let records = query_as::<_, FullFollowRecord>(
            "
            SELECT
                follows.follow_id,
                follower.user_id,
                follower.username,
                follower.is_superuser,
                followee.user_id AS following_id,
                followee.username AS following_username,
                followee.is_superuser AS following_is_superuser
            FROM
                users.follows
                JOIN users.users AS follower ON follower.user_id = follows.user_id
                JOIN users.users AS followee ON followee.user_id = follows.following_id
            WHERE
                follows.user_id = $1
            ORDER BY
                follows.follow_id
            ",
        )
        .bind(user_id.get())
        .fetch_all(&self.pool)
        .await?;

        let follows = records
            .into_iter()
            .map(Follow::try_from)
            .collect::<Result<_, _>>()?;
        Ok(follows)
    }

    async fn create_follow(&self, follow: &CreateFollow) -> Result<Follow> {
        let record = query_as::<_, FullFollowRecord>(
            "
            WITH inserted AS (
                INSERT INTO users.follows (user_id, following_id)
                VALUES ($1, $2)
                RETURNING follow_id, user_id, following_id
            )
            SELECT
                inserted.follow_id,
                follower.user_id,
                follower.username,
                follower.is_superuser,
                followee.user_id AS following_id,
                followee.username AS following_username,
                followee.is_superuser AS following_is_superuser
            FROM
                inserted
                JOIN users.users AS follower ON follower.user_id = inserted.user_id
                JOIN users.users AS followee ON followee.user_id = inserted.following_id
            ",
        )
        .bind(follow.user.get())
        .bind(follow.following.get())
        .fetch_one(&self.pool)
        .await?;

        Ok(record.try_into()?)
    }
}
