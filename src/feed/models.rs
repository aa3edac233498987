use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A linked account, stored as JSON under its id in the `users` mapping.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub image: Option<String>,
    pub refresh_token: String,
    pub connected_at: DateTime<Utc>,
}

impl User {
    pub fn liked_by(&self) -> LikedBy {
        LikedBy {
            id: self.id.clone(),
            name: self.name.clone(),
            image: self.image.clone(),
        }
    }

    pub fn summary(&self) -> UserSummary {
        UserSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            image: self.image.clone(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AlbumRef {
    pub name: String,
    pub image: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub id: String,
    pub name: String,
    pub artists: Vec<String>,
    pub album: AlbumRef,
    pub uri: String,
    pub external_url: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LikedBy {
    pub id: String,
    pub name: String,
    pub image: Option<String>,
}

/// One like in the merged timeline. Computed per request, never stored.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FeedEntry {
    pub added_at: DateTime<Utc>,
    pub track: Track,
    pub liked_by: LikedBy,
    pub comment_count: u64,
}

impl FeedEntry {
    pub fn key(&self) -> FeedKey {
        FeedKey::new(&self.track.id, &self.liked_by.id)
    }
}

/// Identity of a feed entry: the liked track and the user who liked it.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FeedKey {
    pub track_id: String,
    pub liker_id: String,
}

impl FeedKey {
    pub fn new(track_id: &str, liker_id: &str) -> Self {
        Self {
            track_id: track_id.to_string(),
            liker_id: liker_id.to_string(),
        }
    }

    /// Member string in the `hidden` set.
    pub fn hidden_member(&self) -> String {
        format!("{}:{}", self.track_id, self.liker_id)
    }

    /// Key of the comment list attached to this entry.
    pub fn comments_key(&self) -> String {
        format!("comments:{}:{}", self.track_id, self.liker_id)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    #[serde(alias = "userId")]
    pub user_id: String,
    #[serde(alias = "userName")]
    pub user_name: String,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: String,
    pub name: String,
    pub image: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FeedResponse {
    pub songs: Vec<FeedEntry>,
    pub users: Vec<UserSummary>,
}
