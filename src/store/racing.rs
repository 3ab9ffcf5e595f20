//! Test store that simulates identifiers claimed between the existence
//! check and the insert.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use chrono::{DateTime, Utc};

use super::Store;
use crate::error::Result;
use crate::types::*;

/// Wraps a store so that the next `stale_checks` calls to `domain_exists`
/// or `slug_exists` report the identifier as free. Everything else,
/// including the unique constraints, is the inner store's.
pub struct RacingStore {
    inner: Arc<dyn Store>,
    stale_checks: AtomicU32,
    checks: AtomicU32,
}

impl RacingStore {
    pub fn new(inner: Arc<dyn Store>, stale_checks: u32) -> Self {
        Self {
            inner,
            stale_checks: AtomicU32::new(stale_checks),
            checks: AtomicU32::new(0),
        }
    }

    /// Number of existence checks seen so far.
    pub fn checks(&self) -> u32 {
        self.checks.load(Ordering::SeqCst)
    }

    fn check(&self, real: impl FnOnce() -> Result<bool>) -> Result<bool> {
        self.checks.fetch_add(1, Ordering::SeqCst);
        let stale = self
            .stale_checks
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if stale { Ok(false) } else { real() }
    }
}

impl Store for RacingStore {
    fn initialize(&self) -> Result<()> {
        self.inner.initialize()
    }

    fn create_account(&self, account: &Account) -> Result<()> {
        self.inner.create_account(account)
    }

    fn get_account(&self, id: &str) -> Result<Option<Account>> {
        self.inner.get_account(id)
    }

    fn get_account_by_email(&self, email: &str) -> Result<Option<Account>> {
        self.inner.get_account_by_email(email)
    }

    fn get_account_by_domain(&self, domain: &str) -> Result<Option<Account>> {
        self.inner.get_account_by_domain(domain)
    }

    fn list_accounts(&self) -> Result<Vec<Account>> {
        self.inner.list_accounts()
    }

    fn domain_exists(&self, domain: &str) -> Result<bool> {
        self.check(|| self.inner.domain_exists(domain))
    }

    fn claim_account_domain(&self, id: &str, domain: &str) -> Result<bool> {
        self.inner.claim_account_domain(id, domain)
    }

    fn set_account_tier(&self, id: &str, tier: Tier) -> Result<()> {
        self.inner.set_account_tier(id, tier)
    }

    fn recompute_content_count(&self, account_id: &str) -> Result<i64> {
        self.inner.recompute_content_count(account_id)
    }

    fn create_token(&self, token: &Token) -> Result<()> {
        self.inner.create_token(token)
    }

    fn get_token_by_lookup(&self, lookup: &str) -> Result<Option<Token>> {
        self.inner.get_token_by_lookup(lookup)
    }

    fn update_token_last_used(&self, id: &str) -> Result<()> {
        self.inner.update_token_last_used(id)
    }

    fn slug_exists(&self, slug: &str) -> Result<bool> {
        self.check(|| self.inner.slug_exists(slug))
    }

    fn create_story(&self, story: &Story, settings: &StorySettings) -> Result<()> {
        self.inner.create_story(story, settings)
    }

    fn get_story(&self, id: &str) -> Result<Option<Story>> {
        self.inner.get_story(id)
    }

    fn get_public_story(&self, domain: &str, slug: &str) -> Result<Option<Story>> {
        self.inner.get_public_story(domain, slug)
    }

    fn list_stories(&self, account_id: &str) -> Result<Vec<StorySummary>> {
        self.inner.list_stories(account_id)
    }

    fn list_public_stories(&self, account_id: &str) -> Result<Vec<StorySummary>> {
        self.inner.list_public_stories(account_id)
    }

    fn update_story(&self, story: &Story) -> Result<()> {
        self.inner.update_story(story)
    }

    fn delete_story(&self, id: &str) -> Result<bool> {
        self.inner.delete_story(id)
    }

    fn get_story_settings(&self, story_id: &str) -> Result<Option<StorySettings>> {
        self.inner.get_story_settings(story_id)
    }

    fn update_story_settings(&self, settings: &StorySettings) -> Result<()> {
        self.inner.update_story_settings(settings)
    }

    fn create_chapter(&self, chapter: &Chapter) -> Result<()> {
        self.inner.create_chapter(chapter)
    }

    fn get_chapter(&self, id: &str) -> Result<Option<Chapter>> {
        self.inner.get_chapter(id)
    }

    fn list_chapters(&self, story_id: &str) -> Result<Vec<Chapter>> {
        self.inner.list_chapters(story_id)
    }

    fn update_chapter(&self, chapter: &Chapter) -> Result<()> {
        self.inner.update_chapter(chapter)
    }

    fn delete_chapter(&self, id: &str) -> Result<bool> {
        self.inner.delete_chapter(id)
    }

    fn create_media(&self, media: &Media) -> Result<()> {
        self.inner.create_media(media)
    }

    fn get_media(&self, id: &str) -> Result<Option<Media>> {
        self.inner.get_media(id)
    }

    fn list_account_media(&self, account_id: &str) -> Result<Vec<Media>> {
        self.inner.list_account_media(account_id)
    }

    fn count_media_with_url(&self, account_id: &str, url: &str) -> Result<i64> {
        self.inner.count_media_with_url(account_id, url)
    }

    fn delete_media_cascade(&self, id: &str) -> Result<bool> {
        self.inner.delete_media_cascade(id)
    }

    fn link_media(
        &self,
        account_id: &str,
        story_id: &str,
        placement: &Placement,
        media_ids: &[String],
        now: DateTime<Utc>,
    ) -> Result<Vec<MediaReference>> {
        self.inner
            .link_media(account_id, story_id, placement, media_ids, now)
    }

    fn get_media_reference(&self, id: &str) -> Result<Option<MediaReference>> {
        self.inner.get_media_reference(id)
    }

    fn update_media_reference_order(&self, id: &str, order: i64) -> Result<()> {
        self.inner.update_media_reference_order(id, order)
    }

    fn delete_media_reference(&self, id: &str) -> Result<bool> {
        self.inner.delete_media_reference(id)
    }

    fn list_story_references(&self, story_id: &str) -> Result<Vec<ReferenceWithMedia>> {
        self.inner.list_story_references(story_id)
    }

    fn close(&self) -> Result<()> {
        self.inner.close()
    }
}
