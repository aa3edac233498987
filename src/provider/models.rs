//! Typed provider responses and their normalization into feed shapes.
//!
//! Every optional field of the provider payload is an explicit `Option`;
//! nothing from the provider reaches the feed without going through the
//! conversions below.

use crate::feed::{AlbumRef, FeedEntry, LikedBy, Track};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Credentials returned by the token endpoint.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct TokenGrant {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub expires_in: u64,
    /// Present on code exchange, and on refresh only when rotated.
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ProviderImage {
    pub url: String,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ProviderProfile {
    pub id: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub images: Option<Vec<ProviderImage>>,
}

impl ProviderProfile {
    /// Display name, falling back to the account id when none is set.
    pub fn name(&self) -> String {
        match self.display_name.as_deref() {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => self.id.clone(),
        }
    }

    pub fn avatar_url(&self) -> Option<String> {
        first_image_url(self.images.as_deref())
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ProviderArtist {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ProviderAlbum {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub images: Option<Vec<ProviderImage>>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct ProviderExternalUrls {
    #[serde(default)]
    pub spotify: Option<String>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ProviderTrack {
    /// Null for local files.
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub artists: Option<Vec<ProviderArtist>>,
    #[serde(default)]
    pub album: Option<ProviderAlbum>,
    #[serde(default)]
    pub uri: Option<String>,
    #[serde(default)]
    pub external_urls: Option<ProviderExternalUrls>,
}

/// One item of the "liked tracks" listing.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ProviderSavedTrack {
    pub added_at: DateTime<Utc>,
    /// Null when the track was removed from the catalog.
    #[serde(default)]
    pub track: Option<ProviderTrack>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct SavedTracksPage {
    #[serde(default)]
    pub items: Vec<ProviderSavedTrack>,
}

fn first_image_url(images: Option<&[ProviderImage]>) -> Option<String> {
    images.and_then(|images| images.first()).map(|i| i.url.clone())
}

impl ProviderSavedTrack {
    /// Converts the item into a feed entry attributed to `liked_by`.
    ///
    /// Returns `None` when the item has no usable track id.
    pub fn into_feed_entry(self, liked_by: LikedBy) -> Option<FeedEntry> {
        let track = self.track?;
        let id = track.id.filter(|id| !id.is_empty())?;

        let artists = track
            .artists
            .unwrap_or_default()
            .into_iter()
            .map(|a| a.name)
            .collect();
        let album = match track.album {
            Some(album) => AlbumRef {
                image: first_image_url(album.images.as_deref()),
                name: album.name.unwrap_or_default(),
            },
            None => AlbumRef {
                name: String::new(),
                image: None,
            },
        };
        let uri = track
            .uri
            .unwrap_or_else(|| format!("spotify:track:{}", id));

        Some(FeedEntry {
            added_at: self.added_at,
            track: Track {
                name: track.name.unwrap_or_default(),
                artists,
                album,
                uri,
                external_url: track.external_urls.and_then(|u| u.spotify),
                id,
            },
            liked_by,
            comment_count: 0,
        })
    }
}
