use crate::{
    model::{
        Id, Text,
        group::GroupMarker,
        user::{User, UserMarker, serialize_as_username},
    },
    util::deserialize_some,
};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash)]
pub struct PostMarker;

#[derive(Clone, Eq, PartialEq, Debug, Hash, Serialize)]
pub struct Post {
    pub id: Id<PostMarker>,
    pub text: Text,
    #[serde(serialize_with = "serialize_as_username")]
    pub author: User,
    pub group: Option<Id<GroupMarker>>,
    #[serde(with = "time::serde::rfc3339")]
    pub pub_date: OffsetDateTime,
}

/// Everything needed to store a new post. The author is never taken from a request body.
#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub struct CreatePost {
    pub author: Id<UserMarker>,
    pub text: Text,
    pub group: Option<Id<GroupMarker>>,
}

/// Client supplied fields of a post on creation.
#[derive(Clone, Eq, PartialEq, Debug, Hash, Deserialize)]
pub struct PostFields {
    pub text: Text,
    #[serde(default)]
    pub group: Option<Id<GroupMarker>>,
}

impl PostFields {
    #[must_use]
    pub fn into_create(self, author: Id<UserMarker>) -> CreatePost {
        CreatePost {
            author,
            text: self.text,
            group: self.group,
        }
    }
}

/// Body of a full update. `text` is required; a missing `group` leaves it unchanged.
#[derive(Clone, Eq, PartialEq, Debug, Hash, Deserialize)]
pub struct PostReplacement {
    pub text: Text,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub group: Option<Option<Id<GroupMarker>>>,
}

/// Body of a partial update. Only the keys present are changed; `"group": null`
/// detaches the post from its group.
#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, Deserialize)]
pub struct PostUpdate {
    #[serde(default)]
    pub text: Option<Text>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub group: Option<Option<Id<GroupMarker>>>,
}

impl PostUpdate {
    /// The group this update would attach the post to, if any.
    #[must_use]
    pub fn target_group(&self) -> Option<Id<GroupMarker>> {
        self.group.flatten()
    }

    pub fn apply_to(&self, post: &mut Post) {
        if let Some(text) = &self.text {
            post.text = text.clone();
        }
        if let Some(group) = self.group {
            post.group = group;
        }
    }
}

impl From<PostReplacement> for PostUpdate {
    fn from(value: PostReplacement) -> Self {
        Self {
            text: Some(value.text),
            group: value.group,
        }
    }
}
