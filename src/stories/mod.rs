//! Story and chapter authoring for the owning account.
//!
//! Everything here is scoped to one account. A story or chapter that exists
//! but belongs to someone else is reported as [`Error::NotFound`].

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::accounts::AccountService;
use crate::error::{Error, Result};
use crate::ident::IdentifierAllocator;
use crate::quota::QuotaEnforcer;
use crate::store::{Store, assemble_story_detail};
use crate::types::{
    Account, Chapter, ChapterWithMedia, Feature, Placement, Story, StoryDetail, StorySettings,
    StorySummary, Template,
};

const MAX_SLUG_RETRIES: u32 = 5;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewStory {
    pub title: String,
    #[serde(default)]
    pub subtitle: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub template: Option<Template>,
    #[serde(default)]
    pub is_public: bool,
}

/// Partial update. For optional text fields an empty string clears the value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StoryPatch {
    pub title: Option<String>,
    pub subtitle: Option<String>,
    pub description: Option<String>,
    pub template: Option<Template>,
    pub is_public: Option<bool>,
    pub cover_photo: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SettingsPatch {
    pub primary_color: Option<String>,
    pub font_family: Option<String>,
    pub cover_image: Option<String>,
    pub logo_image: Option<String>,
    pub enable_comments: Option<bool>,
    pub enable_download: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewChapter {
    pub title: String,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub order: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChapterPatch {
    pub title: Option<String>,
    pub content: Option<String>,
    pub date: Option<DateTime<Utc>>,
    pub order: Option<i64>,
}

fn required(value: &str, field: &str) -> Result<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(Error::Validation(format!("{field} is required")));
    }
    Ok(value.to_string())
}

fn apply_optional(target: &mut Option<String>, value: Option<String>) {
    if let Some(value) = value {
        let value = value.trim();
        *target = (!value.is_empty()).then(|| value.to_string());
    }
}

pub struct StoryService {
    store: Arc<dyn Store>,
    allocator: Arc<IdentifierAllocator>,
    accounts: Arc<AccountService>,
    quota: Arc<QuotaEnforcer>,
}

impl StoryService {
    pub fn new(
        store: Arc<dyn Store>,
        allocator: Arc<IdentifierAllocator>,
        accounts: Arc<AccountService>,
        quota: Arc<QuotaEnforcer>,
    ) -> Self {
        Self {
            store,
            allocator,
            accounts,
            quota,
        }
    }

    fn owned_story(&self, account_id: &str, story_id: &str) -> Result<Story> {
        self.store
            .get_story(story_id)?
            .filter(|s| s.account_id == account_id)
            .ok_or(Error::NotFound)
    }

    fn owned_chapter(&self, account_id: &str, story_id: &str, chapter_id: &str) -> Result<Chapter> {
        let story = self.owned_story(account_id, story_id)?;
        self.store
            .get_chapter(chapter_id)?
            .filter(|c| c.story_id == story.id)
            .ok_or(Error::NotFound)
    }

    /// Creates a story with a freshly allocated slug and default settings.
    pub fn create(&self, account: &Account, req: NewStory) -> Result<Story> {
        let title = required(&req.title, "title")?;
        let template = req.template.unwrap_or_default();
        self.quota
            .ensure_feature(account.tier, Feature::Template(template))?;

        let domain = self.accounts.ensure_domain(account)?;

        for attempt in 1..=MAX_SLUG_RETRIES {
            let slug = self.allocator.allocate_slug(&title)?;
            let now = Utc::now();
            let mut story = Story {
                id: Uuid::new_v4().to_string(),
                account_id: account.id.clone(),
                title: title.clone(),
                subtitle: None,
                description: None,
                slug,
                domain: domain.clone(),
                template,
                is_public: req.is_public,
                cover_photo: None,
                created_at: now,
                updated_at: now,
            };
            apply_optional(&mut story.subtitle, req.subtitle.clone());
            apply_optional(&mut story.description, req.description.clone());

            match self
                .store
                .create_story(&story, &StorySettings::defaults_for(&story.id))
            {
                Ok(()) => {
                    tracing::info!("Account {} created story {}", account.id, story.slug);
                    return Ok(story);
                }
                Err(Error::AlreadyExists) => {
                    tracing::warn!(
                        "Slug '{}' claimed concurrently (attempt {}/{})",
                        story.slug,
                        attempt,
                        MAX_SLUG_RETRIES
                    );
                }
                Err(e) => return Err(e),
            }
        }

        Err(Error::AlreadyExists)
    }

    pub fn list(&self, account_id: &str) -> Result<Vec<StorySummary>> {
        self.store.list_stories(account_id)
    }

    pub fn detail(&self, account_id: &str, story_id: &str) -> Result<StoryDetail> {
        let story = self.owned_story(account_id, story_id)?;
        assemble_story_detail(self.store.as_ref(), story)
    }

    pub fn update(&self, account: &Account, story_id: &str, patch: StoryPatch) -> Result<Story> {
        let mut story = self.owned_story(&account.id, story_id)?;

        if let Some(title) = patch.title {
            story.title = required(&title, "title")?;
        }
        if let Some(template) = patch.template {
            self.quota
                .ensure_feature(account.tier, Feature::Template(template))?;
            story.template = template;
        }
        if let Some(cover) = &patch.cover_photo {
            if !cover.trim().is_empty() {
                self.quota.ensure_feature(account.tier, Feature::CoverPhoto)?;
            }
        }
        if let Some(is_public) = patch.is_public {
            story.is_public = is_public;
        }
        apply_optional(&mut story.subtitle, patch.subtitle);
        apply_optional(&mut story.description, patch.description);
        apply_optional(&mut story.cover_photo, patch.cover_photo);
        story.updated_at = Utc::now();

        self.store.update_story(&story)?;
        Ok(story)
    }

    pub fn update_settings(
        &self,
        account_id: &str,
        story_id: &str,
        patch: SettingsPatch,
    ) -> Result<StorySettings> {
        let story = self.owned_story(account_id, story_id)?;
        let mut settings = self
            .store
            .get_story_settings(&story.id)?
            .unwrap_or_else(|| StorySettings::defaults_for(&story.id));

        if let Some(color) = patch.primary_color {
            settings.primary_color = required(&color, "primary_color")?;
        }
        if let Some(font) = patch.font_family {
            settings.font_family = required(&font, "font_family")?;
        }
        apply_optional(&mut settings.cover_image, patch.cover_image);
        apply_optional(&mut settings.logo_image, patch.logo_image);
        if let Some(enabled) = patch.enable_comments {
            settings.enable_comments = enabled;
        }
        if let Some(enabled) = patch.enable_download {
            settings.enable_download = enabled;
        }

        self.store.update_story_settings(&settings)?;
        Ok(settings)
    }

    /// Deletes a story with its chapters and placements. Media stays in the
    /// account's library.
    pub fn delete(&self, account_id: &str, story_id: &str) -> Result<()> {
        let story = self.owned_story(account_id, story_id)?;
        if !self.store.delete_story(&story.id)? {
            return Err(Error::NotFound);
        }
        tracing::info!("Account {} deleted story {}", account_id, story.slug);
        Ok(())
    }

    pub fn create_chapter(
        &self,
        account_id: &str,
        story_id: &str,
        req: NewChapter,
    ) -> Result<Chapter> {
        let story = self.owned_story(account_id, story_id)?;
        let now = Utc::now();

        let chapter = Chapter {
            id: Uuid::new_v4().to_string(),
            story_id: story.id,
            title: required(&req.title, "title")?,
            content: req.content,
            date: req.date,
            order: req.order.unwrap_or(0),
            created_at: now,
            updated_at: now,
        };

        self.store.create_chapter(&chapter)?;
        Ok(chapter)
    }

    pub fn chapter(
        &self,
        account_id: &str,
        story_id: &str,
        chapter_id: &str,
    ) -> Result<ChapterWithMedia> {
        let chapter = self.owned_chapter(account_id, story_id, chapter_id)?;
        let media_references = self
            .store
            .list_story_references(&chapter.story_id)?
            .into_iter()
            .filter(|r| {
                matches!(&r.reference.placement, Placement::Chapter { chapter_id } if *chapter_id == chapter.id)
            })
            .collect();

        Ok(ChapterWithMedia {
            chapter,
            media_references,
        })
    }

    pub fn update_chapter(
        &self,
        account_id: &str,
        story_id: &str,
        chapter_id: &str,
        patch: ChapterPatch,
    ) -> Result<Chapter> {
        let mut chapter = self.owned_chapter(account_id, story_id, chapter_id)?;

        if let Some(title) = patch.title {
            chapter.title = required(&title, "title")?;
        }
        if let Some(content) = patch.content {
            chapter.content = Some(content);
        }
        if let Some(date) = patch.date {
            chapter.date = Some(date);
        }
        if let Some(order) = patch.order {
            chapter.order = order;
        }
        chapter.updated_at = Utc::now();

        self.store.update_chapter(&chapter)?;
        Ok(chapter)
    }

    pub fn delete_chapter(&self, account_id: &str, story_id: &str, chapter_id: &str) -> Result<()> {
        let chapter = self.owned_chapter(account_id, story_id, chapter_id)?;
        if !self.store.delete_chapter(&chapter.id)? {
            return Err(Error::NotFound);
        }
        Ok(())
    }
}
