use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Template, Tier};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(skip)]
    pub password_hash: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    pub tier: Tier,
    /// Cached count of media owned by the account. Only ever written by
    /// `QuotaEnforcer::recompute`.
    pub content_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Token {
    pub id: String,
    #[serde(skip)]
    pub token_hash: String,
    #[serde(skip)]
    pub token_lookup: String,
    pub account_id: String,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_used_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Story {
    pub id: String,
    pub account_id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub slug: String,
    /// Domain of the owning account at creation time; the public address is
    /// `{domain}/{slug}`.
    pub domain: String,
    pub template: Template,
    pub is_public: bool,
    /// A plain URL, not a reference to a media row.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_photo: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Story {
    #[must_use]
    pub fn public_address(&self) -> String {
        format!("{}/{}", self.domain, self.slug)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorySettings {
    pub story_id: String,
    pub primary_color: String,
    pub font_family: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo_image: Option<String>,
    pub enable_comments: bool,
    pub enable_download: bool,
}

impl StorySettings {
    #[must_use]
    pub fn defaults_for(story_id: &str) -> Self {
        Self {
            story_id: story_id.to_string(),
            primary_color: "#1f2937".to_string(),
            font_family: "serif".to_string(),
            cover_image: None,
            logo_image: None,
            enable_comments: false,
            enable_download: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chapter {
    pub id: String,
    pub story_id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<DateTime<Utc>>,
    pub order: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Image,
    Video,
}

impl MediaType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            MediaType::Image => "image",
            MediaType::Video => "video",
        }
    }

    pub fn parse(s: &str) -> Option<MediaType> {
        match s {
            "image" => Some(MediaType::Image),
            "video" => Some(MediaType::Video),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Media {
    pub id: String,
    pub account_id: String,
    #[serde(rename = "type")]
    pub media_type: MediaType,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Where a media reference is placed inside its story.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Placement {
    Story,
    Chapter { chapter_id: String },
}

impl Placement {
    #[must_use]
    pub fn from_chapter(chapter_id: Option<String>) -> Self {
        match chapter_id {
            Some(chapter_id) => Placement::Chapter { chapter_id },
            None => Placement::Story,
        }
    }

    #[must_use]
    pub fn chapter_id(&self) -> Option<&str> {
        match self {
            Placement::Story => None,
            Placement::Chapter { chapter_id } => Some(chapter_id),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaReference {
    pub id: String,
    pub media_id: String,
    /// The containing story, also set for chapter placements.
    pub story_id: String,
    pub placement: Placement,
    pub order: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReferenceWithMedia {
    #[serde(flatten)]
    pub reference: MediaReference,
    pub media: Media,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChapterWithMedia {
    #[serde(flatten)]
    pub chapter: Chapter,
    pub media_references: Vec<ReferenceWithMedia>,
}

/// A story with everything needed to render it.
#[derive(Debug, Clone, Serialize)]
pub struct StoryDetail {
    #[serde(flatten)]
    pub story: Story,
    pub chapters: Vec<ChapterWithMedia>,
    pub media_references: Vec<ReferenceWithMedia>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub settings: Option<StorySettings>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StorySummary {
    #[serde(flatten)]
    pub story: Story,
    pub chapter_count: i64,
    pub media_count: i64,
}
