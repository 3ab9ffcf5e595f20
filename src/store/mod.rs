mod detail;
#[cfg(test)]
pub(crate) mod racing;
mod schema;
mod sqlite;

pub use detail::assemble_story_detail;
pub use sqlite::SqliteStore;

use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::types::*;

/// Store defines the database interface.
pub trait Store: Send + Sync {
    fn initialize(&self) -> Result<()>;

    // Account operations
    fn create_account(&self, account: &Account) -> Result<()>;
    fn get_account(&self, id: &str) -> Result<Option<Account>>;
    fn get_account_by_email(&self, email: &str) -> Result<Option<Account>>;
    fn get_account_by_domain(&self, domain: &str) -> Result<Option<Account>>;
    fn list_accounts(&self) -> Result<Vec<Account>>;
    fn domain_exists(&self, domain: &str) -> Result<bool>;
    /// Sets the domain only while the account has none. Returns false if the
    /// account already had a domain or does not exist.
    fn claim_account_domain(&self, id: &str, domain: &str) -> Result<bool>;
    fn set_account_tier(&self, id: &str, tier: Tier) -> Result<()>;
    /// Rewrites `content_count` from the media table in one statement and
    /// returns the new value.
    fn recompute_content_count(&self, account_id: &str) -> Result<i64>;

    // Token operations
    fn create_token(&self, token: &Token) -> Result<()>;
    fn get_token_by_lookup(&self, lookup: &str) -> Result<Option<Token>>;
    fn update_token_last_used(&self, id: &str) -> Result<()>;

    // Story operations
    fn slug_exists(&self, slug: &str) -> Result<bool>;
    /// Creates the story and its settings row atomically.
    fn create_story(&self, story: &Story, settings: &StorySettings) -> Result<()>;
    fn get_story(&self, id: &str) -> Result<Option<Story>>;
    /// Looks up a public story by slug, scoped to the owning account's domain.
    fn get_public_story(&self, domain: &str, slug: &str) -> Result<Option<Story>>;
    fn list_stories(&self, account_id: &str) -> Result<Vec<StorySummary>>;
    fn list_public_stories(&self, account_id: &str) -> Result<Vec<StorySummary>>;
    fn update_story(&self, story: &Story) -> Result<()>;
    fn delete_story(&self, id: &str) -> Result<bool>;
    fn get_story_settings(&self, story_id: &str) -> Result<Option<StorySettings>>;
    fn update_story_settings(&self, settings: &StorySettings) -> Result<()>;

    // Chapter operations
    fn create_chapter(&self, chapter: &Chapter) -> Result<()>;
    fn get_chapter(&self, id: &str) -> Result<Option<Chapter>>;
    fn list_chapters(&self, story_id: &str) -> Result<Vec<Chapter>>;
    fn update_chapter(&self, chapter: &Chapter) -> Result<()>;
    fn delete_chapter(&self, id: &str) -> Result<bool>;

    // Media operations
    fn create_media(&self, media: &Media) -> Result<()>;
    fn get_media(&self, id: &str) -> Result<Option<Media>>;
    fn list_account_media(&self, account_id: &str) -> Result<Vec<Media>>;
    fn count_media_with_url(&self, account_id: &str, url: &str) -> Result<i64>;
    /// Deletes every reference to the media and then the media row, in one
    /// transaction. Returns false if the media did not exist.
    fn delete_media_cascade(&self, id: &str) -> Result<bool>;

    // Media reference operations
    /// Links media into a story placement in one transaction. Fails with
    /// `NotFound` and writes nothing if any id is not owned by `account_id`.
    /// Triples that already exist are skipped; only new references are returned.
    fn link_media(
        &self,
        account_id: &str,
        story_id: &str,
        placement: &Placement,
        media_ids: &[String],
        now: DateTime<Utc>,
    ) -> Result<Vec<MediaReference>>;
    fn get_media_reference(&self, id: &str) -> Result<Option<MediaReference>>;
    fn update_media_reference_order(&self, id: &str, order: i64) -> Result<()>;
    fn delete_media_reference(&self, id: &str) -> Result<bool>;
    /// All references in a story (story- and chapter-level), sorted by order.
    fn list_story_references(&self, story_id: &str) -> Result<Vec<ReferenceWithMedia>>;

    fn close(&self) -> Result<()>;
}
