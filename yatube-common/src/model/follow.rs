use crate::model::{
    Id,
    user::{User, UserMarker, Username, serialize_as_username},
};
use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash)]
pub struct FollowMarker;

/// A directed edge: `user` follows `following`.
#[derive(Clone, Eq, PartialEq, Debug, Hash, Serialize)]
pub struct Follow {
    pub id: Id<FollowMarker>,
    #[serde(serialize_with = "serialize_as_username")]
    pub user: User,
    #[serde(serialize_with = "serialize_as_username")]
    pub following: User,
}

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash)]
pub struct CreateFollow {
    pub user: Id<UserMarker>,
    pub following: Id<UserMarker>,
}

/// Client supplied fields of a follow. The follower is always the requester.
#[derive(Clone, Eq, PartialEq, Debug, Hash, Deserialize)]
pub struct FollowFields {
    pub following: Username,
}
