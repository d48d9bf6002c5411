use crate::model::{
    Id, Text,
    post::PostMarker,
    user::{User, UserMarker, serialize_as_username},
};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash)]
pub struct CommentMarker;

#[derive(Clone, Eq, PartialEq, Debug, Hash, Serialize)]
pub struct Comment {
    pub id: Id<CommentMarker>,
    pub text: Text,
    #[serde(serialize_with = "serialize_as_username")]
    pub author: User,
    pub post: Id<PostMarker>,
    #[serde(with = "time::serde::rfc3339")]
    pub created: OffsetDateTime,
}

/// A new comment. Both the author and the post come from the request context.
#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub struct CreateComment {
    pub author: Id<UserMarker>,
    pub post: Id<PostMarker>,
    pub text: Text,
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, Deserialize)]
pub struct CommentFields {
    pub text: Text,
}

impl CommentFields {
    #[must_use]
    pub fn into_create(self, author: Id<UserMarker>, post: Id<PostMarker>) -> CreateComment {
        CreateComment {
            author,
            post,
            text: self.text,
        }
    }
}

#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, Deserialize)]
pub struct CommentUpdate {
    #[serde(default)]
    pub text: Option<Text>,
}

impl CommentUpdate {
    pub fn apply_to(&self, comment: &mut Comment) {
        if let Some(text) = &self.text {
            comment.text = text.clone();
        }
    }
}

impl From<CommentFields> for CommentUpdate {
    fn from(value: CommentFields) -> Self {
        Self {
            text: Some(value.text),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::model::{Id, comment::CommentFields};

    #[test]
    fn author_and_post_come_from_context() {
        let fields: CommentFields =
            serde_json::from_str(r#"{"text": "nice", "author": 1, "post": 2}"#).unwrap();
        let create = fields.into_create(Id::new(10), Id::new(20));

        assert_eq!(create.author, Id::new(10));
        assert_eq!(create.post, Id::new(20));
        assert_eq!(create.text.get(), "nice");
    }
}
