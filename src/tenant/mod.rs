//! Read-only resolution of public addresses.
//!
//! An address is a domain, optionally followed by a story slug. Bare names
//! get the platform suffix appended, so `acme` and `acme.<suffix>` resolve
//! the same way. Every miss is reported as [`Error::NotFound`], whether the
//! account is missing, the story is private, or nothing is published yet.

use std::sync::Arc;

use serde::Serialize;

use crate::error::{Error, Result};
use crate::ident::qualify_domain;
use crate::store::{Store, assemble_story_detail};
use crate::types::{StoryDetail, StorySummary};

/// A single public story with the author's display name.
#[derive(Debug, Clone, Serialize)]
pub struct PublicStory {
    #[serde(flatten)]
    pub detail: StoryDetail,
    pub author_name: String,
}

/// An account's landing page: its name and published stories.
#[derive(Debug, Clone, Serialize)]
pub struct PublicSite {
    pub name: String,
    pub domain: String,
    pub stories: Vec<StorySummary>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum SiteView {
    Story(PublicStory),
    Site(PublicSite),
}

pub struct TenantResolver {
    store: Arc<dyn Store>,
    suffix: String,
}

impl TenantResolver {
    pub fn new(store: Arc<dyn Store>, suffix: impl Into<String>) -> Self {
        Self {
            store,
            suffix: suffix.into(),
        }
    }

    #[must_use]
    pub fn normalize_domain(&self, domain: &str) -> String {
        let domain = domain.trim().trim_end_matches('.').to_ascii_lowercase();
        qualify_domain(&domain, &self.suffix)
    }

    /// Resolves `domain` alone to a site, or `domain` + `slug` to one story.
    pub fn resolve(&self, domain: &str, slug: Option<&str>) -> Result<SiteView> {
        let domain = self.normalize_domain(domain);
        if domain.starts_with('.') {
            return Err(Error::NotFound);
        }

        match slug.map(str::trim).filter(|s| !s.is_empty()) {
            Some(slug) => self.resolve_story(&domain, slug).map(SiteView::Story),
            None => self.resolve_site(&domain).map(SiteView::Site),
        }
    }

    /// Resolves a `domain[/slug]` address string.
    pub fn resolve_address(&self, address: &str) -> Result<SiteView> {
        let address = address.trim().trim_matches('/');
        match address.split_once('/') {
            Some((domain, slug)) => self.resolve(domain, Some(slug.trim_end_matches('/'))),
            None => self.resolve(address, None),
        }
    }

    fn resolve_story(&self, domain: &str, slug: &str) -> Result<PublicStory> {
        let story = self
            .store
            .get_public_story(domain, slug)?
            .ok_or(Error::NotFound)?;

        let author = self
            .store
            .get_account(&story.account_id)?
            .ok_or(Error::NotFound)?;

        let detail = assemble_story_detail(self.store.as_ref(), story)?;
        Ok(PublicStory {
            detail,
            author_name: author.name,
        })
    }

    fn resolve_site(&self, domain: &str) -> Result<PublicSite> {
        let account = self
            .store
            .get_account_by_domain(domain)?
            .ok_or(Error::NotFound)?;

        let stories = self.store.list_public_stories(&account.id)?;
        if stories.is_empty() {
            return Err(Error::NotFound);
        }

        Ok(PublicSite {
            name: account.name,
            domain: domain.to_string(),
            stories,
        })
    }
}
