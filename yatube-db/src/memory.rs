//! In-process [`Store`] mirroring the Postgres schema, constraints included.

use crate::store::{
    DbError, FOLLOWS_NO_SELF_FOLLOW, FOLLOWS_UNIQUE_PAIR, GROUPS_SLUG_KEY, POSTS_GROUP_FKEY, Page,
    Result, Store, USERS_USERNAME_KEY,
};
use async_trait::async_trait;
use std::collections::BTreeMap;
use time::OffsetDateTime;
use tokio::sync::Mutex;
use yatube_common::model::{
    Id,
    auth::{Authentication, TokenHash},
    comment::{Comment, CommentMarker, CommentUpdate, CreateComment},
    follow::{CreateFollow, Follow, FollowMarker},
    group::{CreateGroup, Group, GroupMarker},
    post::{CreatePost, Post, PostMarker, PostUpdate},
    user::{CreateUser, User, UserMarker, Username},
};

const POSTS_AUTHOR_FKEY: &str = "posts_author_id_fkey";
const COMMENTS_POST_FKEY: &str = "comments_post_id_fkey";
const COMMENTS_AUTHOR_FKEY: &str = "comments_author_id_fkey";
const FOLLOWS_USER_FKEY: &str = "follows_user_id_fkey";
const FOLLOWS_FOLLOWING_FKEY: &str = "follows_following_id_fkey";
const AUTHENTICATIONS_USER_FKEY: &str = "authentications_user_id_fkey";

#[derive(Copy, Clone, Eq, PartialEq, Debug, Default)]
struct Sequence(i64);

impl Sequence {
    fn next<Marker>(&mut self) -> Id<Marker> {
        self.0 += 1;
        Id::new(self.0)
    }
}

#[derive(Debug, Default)]
struct Tables {
    user_ids: Sequence,
    group_ids: Sequence,
    post_ids: Sequence,
    comment_ids: Sequence,
    follow_ids: Sequence,
    users: BTreeMap<Id<UserMarker>, User>,
    authentications: Vec<Authentication>,
    groups: BTreeMap<Id<GroupMarker>, Group>,
    posts: BTreeMap<Id<PostMarker>, Post>,
    comments: BTreeMap<Id<CommentMarker>, Comment>,
    follows: BTreeMap<Id<FollowMarker>, CreateFollow>,
}

impl Tables {
    fn user(&self, user_id: Id<UserMarker>, constraint: &str) -> Result<User> {
        self.users
            .get(&user_id)
            .cloned()
            .ok_or_else(|| violation(constraint))
    }

    fn check_group(&self, group_id: Option<Id<GroupMarker>>) -> Result<()> {
        match group_id {
            Some(group_id) if !self.groups.contains_key(&group_id) => {
                Err(violation(POSTS_GROUP_FKEY))
            }
            _ => Ok(()),
        }
    }

    fn follow(&self, follow_id: Id<FollowMarker>, edge: CreateFollow) -> Result<Follow> {
        Ok(Follow {
            id: follow_id,
            user: self.user(edge.user, FOLLOWS_USER_FKEY)?,
            following: self.user(edge.following, FOLLOWS_FOLLOWING_FKEY)?,
        })
    }
}

fn violation(constraint: &str) -> DbError {
    DbError::Constraint {
        constraint: constraint.to_owned(),
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn fetch_user(&self, user_id: Id<UserMarker>) -> Result<Option<User>> {
        Ok(self.tables.lock().await.users.get(&user_id).cloned())
    }

    async fn fetch_user_by_username(&self, username: &Username) -> Result<Option<User>> {
        let tables = self.tables.lock().await;
        let user = tables
            .users
            .values()
            .find(|user| &user.username == username)
            .cloned();
        Ok(user)
    }

    async fn create_user(&self, user: &CreateUser) -> Result<User> {
        let mut tables = self.tables.lock().await;
        if tables
            .users
            .values()
            .any(|existing| existing.username == user.username)
        {
            return Err(violation(USERS_USERNAME_KEY));
        }

        let user = User {
            id: tables.user_ids.next(),
            username: user.username.clone(),
            is_superuser: user.is_superuser,
        };
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn fetch_authentication(
        &self,
        token_hash: &TokenHash,
    ) -> Result<Option<Authentication>> {
        let tables = self.tables.lock().await;
        let authentication = tables
            .authentications
            .iter()
            .find(|authentication| &authentication.token_hash == token_hash)
            .cloned();
        Ok(authentication)
    }

    async fn create_authentication(&self, authentication: &Authentication) -> Result<()> {
        let mut tables = self.tables.lock().await;
        tables.user(authentication.user, AUTHENTICATIONS_USER_FKEY)?;
        tables.authentications.push(authentication.clone());
        Ok(())
    }

    async fn fetch_groups(&self) -> Result<Vec<Group>> {
        Ok(self.tables.lock().await.groups.values().cloned().collect())
    }

    async fn fetch_group(&self, group_id: Id<GroupMarker>) -> Result<Option<Group>> {
        Ok(self.tables.lock().await.groups.get(&group_id).cloned())
    }

    async fn create_group(&self, group: &CreateGroup) -> Result<Group> {
        let mut tables = self.tables.lock().await;
        if tables.groups.values().any(|existing| existing.slug == group.slug) {
            return Err(violation(GROUPS_SLUG_KEY));
        }

        let group = Group {
            id: tables.group_ids.next(),
            title: group.title.clone(),
            slug: group.slug.clone(),
            description: group.description.clone(),
        };
        tables.groups.insert(group.id, group.clone());
        Ok(group)
    }

    async fn count_posts(&self) -> Result<u64> {
        Ok(self.tables.lock().await.posts.len() as u64)
    }

    async fn fetch_posts(&self, page: Option<Page>) -> Result<Vec<Post>> {
        let tables = self.tables.lock().await;
        let posts = tables.posts.values().cloned();

        let posts = match page {
            Some(Page { limit, offset }) => posts
                .skip(usize::try_from(offset).unwrap_or(usize::MAX))
                .take(usize::try_from(limit).unwrap_or(usize::MAX))
                .collect(),
            None => posts.collect(),
        };
        Ok(posts)
    }

    async fn fetch_post(&self, post_id: Id<PostMarker>) -> Result<Option<Post>> {
        Ok(self.tables.lock().await.posts.get(&post_id).cloned())
    }

    async fn create_post(&self, post: &CreatePost) -> Result<Post> {
        let mut tables = self.tables.lock().await;
        let author = tables.user(post.author, POSTS_AUTHOR_FKEY)?;
        tables.check_group(post.group)?;

        let post = Post {
            id: tables.post_ids.next(),
            text: post.text.clone(),
            author,
            group: post.group,
            pub_date: OffsetDateTime::now_utc(),
        };
        tables.posts.insert(post.id, post.clone());
        Ok(post)
    }

    async fn update_post(
        &self,
        post_id: Id<PostMarker>,
        update: &PostUpdate,
    ) -> Result<Option<Post>> {
        let mut tables = self.tables.lock().await;
        tables.check_group(update.target_group())?;

        let post = tables.posts.get_mut(&post_id).map(|post| {
            update.apply_to(post);
            post.clone()
        });
        Ok(post)
    }

    async fn delete_post(&self, post_id: Id<PostMarker>) -> Result<bool> {
        let mut tables = self.tables.lock().await;
        let existed = tables.posts.remove(&post_id).is_some();
        tables.comments.retain(|_, comment| comment.post != post_id);
        Ok(existed)
    }

    async fn fetch_post_comments(&self, post_id: Id<PostMarker>) -> Result<Vec<Comment>> {
        let tables = self.tables.lock().await;
        let comments = tables
            .comments
            .values()
            .filter(|comment| comment.post == post_id)
            .cloned()
            .collect();
        Ok(comments)
    }

    async fn fetch_comment(
        &self,
        post_id: Id<PostMarker>,
        comment_id: Id<CommentMarker>,
    ) -> Result<Option<Comment>> {
        let tables = self.tables.lock().await;
        let comment = tables
            .comments
            .get(&comment_id)
            .filter(|comment| comment.post == post_id)
            .cloned();
        Ok(comment)
    }

    async fn create_comment(&self, comment: &CreateComment) -> Result<Comment> {
        let mut tables = self.tables.lock().await;
        let author = tables.user(comment.author, COMMENTS_AUTHOR_FKEY)?;
        if !tables.posts.contains_key(&comment.post) {
            return Err(violation(COMMENTS_POST_FKEY));
        }

        let comment = Comment {
            id: tables.comment_ids.next(),
            text: comment.text.clone(),
            author,
            post: comment.post,
            created: OffsetDateTime::now_utc(),
        };
        tables.comments.insert(comment.id, comment.clone());
        Ok(comment)
    }

    async fn update_comment(
        &self,
        comment_id: Id<CommentMarker>,
        update: &CommentUpdate,
    ) -> Result<Option<Comment>> {
        let mut tables = self.tables.lock().await;
        let comment = tables.comments.get_mut(&comment_id).map(|comment| {
            update.apply_to(comment);
            comment.clone()
        });
        Ok(comment)
    }

    async fn delete_comment(&self, comment_id: Id<CommentMarker>) -> Result<bool> {
        Ok(self
            .tables
            .lock()
            .await
            .comments
            .remove(&comment_id)
            .is_some())
    }

    async fn fetch_follows(&self, user_id: Id<UserMarker>) -> Result<Vec<Follow>> {
        let tables = self.tables.lock().await;
        tables
            .follows
            .iter()
            .filter(|(_, edge)| edge.user == user_id)
            .map(|(&follow_id, &edge)| tables.follow(follow_id, edge))
            .collect()
    }

    async fn create_follow(&self, follow: &CreateFollow) -> Result<Follow> {
        let mut tables = self.tables.lock().await;
        if follow.user == follow.following {
            return Err(violation(FOLLOWS_NO_SELF_FOLLOW));
        }
        if tables.follows.values().any(|edge| edge == follow) {
            return Err(violation(FOLLOWS_UNIQUE_PAIR));
        }

        let follow_id = tables.follow_ids.next();
        let created = tables.follow(follow_id, *follow)?;
        tables.follows.insert(follow_id, *follow);
        Ok(created)
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        memory::MemoryStore,
        store::{FOLLOWS_NO_SELF_FOLLOW, FOLLOWS_UNIQUE_PAIR, POSTS_GROUP_FKEY, Page, Store},
    };
    use yatube_common::model::{
        Id, Text,
        comment::CreateComment,
        follow::CreateFollow,
        post::{CreatePost, PostMarker, PostUpdate},
        user::{CreateUser, User, Username},
    };

    async fn user(store: &MemoryStore, username: &str) -> User {
        store
            .create_user(&CreateUser {
                username: Username::new(username.to_owned()).unwrap(),
                is_superuser: false,
            })
            .await
            .unwrap()
    }

    async fn post(store: &MemoryStore, author: &User, text: &str) -> Id<PostMarker> {
        store
            .create_post(&CreatePost {
                author: author.id,
                text: Text::new(text).unwrap(),
                group: None,
            })
            .await
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn follow_constraints() {
        let store = MemoryStore::new();
        let alice = user(&store, "alice").await;
        let bob = user(&store, "bob").await;

        let edge = CreateFollow {
            user: alice.id,
            following: bob.id,
        };
        let follow = store.create_follow(&edge).await.unwrap();
        assert_eq!(follow.user, alice);
        assert_eq!(follow.following, bob);

        let duplicate = store.create_follow(&edge).await.unwrap_err();
        assert_eq!(duplicate.violated_constraint(), Some(FOLLOWS_UNIQUE_PAIR));

        let own = store
            .create_follow(&CreateFollow {
                user: alice.id,
                following: alice.id,
            })
            .await
            .unwrap_err();
        assert_eq!(own.violated_constraint(), Some(FOLLOWS_NO_SELF_FOLLOW));

        assert_eq!(store.fetch_follows(alice.id).await.unwrap().len(), 1);
        assert!(store.fetch_follows(bob.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unknown_group_is_a_foreign_key_violation() {
        let store = MemoryStore::new();
        let alice = user(&store, "alice").await;

        let err = store
            .create_post(&CreatePost {
                author: alice.id,
                text: Text::new("hello").unwrap(),
                group: Some(Id::new(404)),
            })
            .await
            .unwrap_err();
        assert_eq!(err.violated_constraint(), Some(POSTS_GROUP_FKEY));

        let post_id = post(&store, &alice, "hello").await;
        let update = PostUpdate {
            text: None,
            group: Some(Some(Id::new(404))),
        };
        assert!(store.update_post(post_id, &update).await.is_err());
    }

    #[tokio::test]
    async fn paging_and_cascade() {
        let store = MemoryStore::new();
        let alice = user(&store, "alice").await;
        let mut ids = Vec::new();
        for text in ["one", "two", "three", "four"] {
            ids.push(post(&store, &alice, text).await);
        }

        let page = store
            .fetch_posts(Some(Page {
                limit: 2,
                offset: 1,
            }))
            .await
            .unwrap();
        let texts: Vec<_> = page.iter().map(|post| post.text.get()).collect();
        assert_eq!(texts, ["two", "three"]);
        assert_eq!(store.count_posts().await.unwrap(), 4);

        let comment = store
            .create_comment(&CreateComment {
                author: alice.id,
                post: ids[0],
                text: Text::new("first!").unwrap(),
            })
            .await
            .unwrap();
        assert!(store.fetch_comment(ids[1], comment.id).await.unwrap().is_none());
        assert!(store.fetch_comment(ids[0], comment.id).await.unwrap().is_some());

        assert!(store.delete_post(ids[0]).await.unwrap());
        assert!(!store.delete_post(ids[0]).await.unwrap());
        assert!(!store.delete_comment(comment.id).await.unwrap());
    }
}
