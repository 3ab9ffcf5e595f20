//! Media library and placements.
//!
//! Media belongs to an account and exists independently of stories. A
//! [`MediaReference`] places a media item in a story or one of its chapters.
//! Removing a reference never touches the media; deleting media removes all
//! of its references, recomputes the owner's count, and then tries to remove
//! the stored asset.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use crate::blob::{BlobStorage, sanitize_file_name};
use crate::error::{Error, Result};
use crate::quota::QuotaEnforcer;
use crate::store::Store;
use crate::types::{Media, MediaReference, Placement, Story};

/// What happened to the stored asset after a media row was deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RemoteCleanup {
    Deleted,
    /// Another media row of the same account still points at the URL.
    SharedUrl,
    /// The URL was not issued by the configured provider.
    Unmanaged,
    /// The provider refused or failed; the asset is left behind.
    Failed,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeleteOutcome {
    pub media_id: String,
    pub remote: RemoteCleanup,
    pub content_count: i64,
}

/// An upload as received from the client.
#[derive(Debug, Clone)]
pub struct NewUpload<'a> {
    pub file_name: &'a str,
    pub content_type: Option<&'a str>,
    pub title: Option<String>,
    pub data: &'a [u8],
}

pub struct MediaManager {
    store: Arc<dyn Store>,
    blobs: Arc<dyn BlobStorage>,
    quota: Arc<QuotaEnforcer>,
}

impl MediaManager {
    pub fn new(
        store: Arc<dyn Store>,
        blobs: Arc<dyn BlobStorage>,
        quota: Arc<QuotaEnforcer>,
    ) -> Self {
        Self {
            store,
            blobs,
            quota,
        }
    }

    pub fn list(&self, account_id: &str) -> Result<Vec<Media>> {
        self.store.list_account_media(account_id)
    }

    fn owned_story(&self, account_id: &str, story_id: &str) -> Result<Story> {
        self.store
            .get_story(story_id)?
            .filter(|s| s.account_id == account_id)
            .ok_or(Error::NotFound)
    }

    /// Stores an asset in the account's gallery after the quota check.
    pub async fn upload(&self, account_id: &str, upload: NewUpload<'_>) -> Result<Media> {
        if upload.data.is_empty() {
            return Err(Error::Validation("file is empty".to_string()));
        }
        if let Some(content_type) = upload.content_type {
            if !(content_type.starts_with("image/") || content_type.starts_with("video/")) {
                return Err(Error::Validation(format!(
                    "unsupported content type '{content_type}'"
                )));
            }
        }

        let account = self
            .store
            .get_account(account_id)?
            .ok_or(Error::NotFound)?;
        self.quota.ensure_can_upload(&account)?;

        let folder = format!("{account_id}/gallery");
        // Millisecond stamps alone collide under concurrent uploads.
        let unique = Uuid::new_v4().simple().to_string();
        let name = format!(
            "{}-{}-{}",
            Utc::now().timestamp_millis(),
            &unique[..8],
            sanitize_file_name(upload.file_name)
        );
        let asset = self.blobs.upload(upload.data, &folder, &name).await?;

        let media = Media {
            id: Uuid::new_v4().to_string(),
            account_id: account_id.to_string(),
            media_type: asset.resource_type,
            url: asset.url,
            thumbnail_url: None,
            title: upload.title,
            created_at: Utc::now(),
        };

        if let Err(e) = self.store.create_media(&media) {
            if let Err(cleanup) = self.blobs.delete(&asset.asset_id).await {
                tracing::warn!(
                    "Failed to remove orphaned asset {}: {}",
                    asset.asset_id,
                    cleanup
                );
            }
            return Err(e);
        }

        self.quota.recompute(account_id)?;
        tracing::info!("Account {} uploaded media {}", account_id, media.id);

        Ok(media)
    }

    /// Places media into a story, or into one of its chapters.
    ///
    /// The batch is all-or-nothing with respect to ownership. Placements that
    /// already exist are skipped and only new references are returned.
    pub fn link(
        &self,
        account_id: &str,
        story_id: &str,
        chapter_id: Option<&str>,
        media_ids: &[String],
    ) -> Result<Vec<MediaReference>> {
        if media_ids.is_empty() {
            return Err(Error::Validation("media_ids must not be empty".to_string()));
        }

        let story = self.owned_story(account_id, story_id)?;

        let placement = match chapter_id {
            Some(chapter_id) => {
                let chapter = self
                    .store
                    .get_chapter(chapter_id)?
                    .filter(|c| c.story_id == story.id)
                    .ok_or(Error::NotFound)?;
                Placement::Chapter {
                    chapter_id: chapter.id,
                }
            }
            None => Placement::Story,
        };

        let created =
            self.store
                .link_media(account_id, &story.id, &placement, media_ids, Utc::now())?;

        tracing::debug!(
            "Linked {} of {} media into story {}",
            created.len(),
            media_ids.len(),
            story.id
        );
        Ok(created)
    }

    /// Loads a reference whose story belongs to the account.
    fn owned_reference(&self, account_id: &str, reference_id: &str) -> Result<MediaReference> {
        let reference = self
            .store
            .get_media_reference(reference_id)?
            .ok_or(Error::NotFound)?;

        match self.store.get_story(&reference.story_id)? {
            Some(story) if story.account_id == account_id => Ok(reference),
            _ => Err(Error::Forbidden),
        }
    }

    /// Removes one placement. The media itself is left untouched.
    pub fn unlink(&self, account_id: &str, reference_id: &str) -> Result<()> {
        let reference = self.owned_reference(account_id, reference_id)?;
        if !self.store.delete_media_reference(&reference.id)? {
            return Err(Error::NotFound);
        }
        Ok(())
    }

    /// Sets a placement's display order. Gaps and duplicates are allowed.
    pub fn reorder(
        &self,
        account_id: &str,
        reference_id: &str,
        order: i64,
    ) -> Result<MediaReference> {
        let mut reference = self.owned_reference(account_id, reference_id)?;
        self.store.update_media_reference_order(&reference.id, order)?;
        reference.order = order;
        Ok(reference)
    }

    /// Deletes media everywhere it appears.
    ///
    /// Store failures abort. Once the row is gone, failure to remove the
    /// stored asset is logged and reported in the outcome only.
    pub async fn delete_media(&self, account_id: &str, media_id: &str) -> Result<DeleteOutcome> {
        let media = self
            .store
            .get_media(media_id)?
            .filter(|m| m.account_id == account_id)
            .ok_or(Error::NotFound)?;

        if !self.store.delete_media_cascade(&media.id)? {
            return Err(Error::NotFound);
        }

        let content_count = self.quota.recompute(account_id)?;
        let remote = self.cleanup_remote(account_id, &media).await?;

        tracing::info!(
            "Account {} deleted media {} (remote: {:?})",
            account_id,
            media.id,
            remote
        );

        Ok(DeleteOutcome {
            media_id: media.id,
            remote,
            content_count,
        })
    }

    async fn cleanup_remote(&self, account_id: &str, media: &Media) -> Result<RemoteCleanup> {
        if self.store.count_media_with_url(account_id, &media.url)? > 0 {
            tracing::info!(
                "Keeping asset for media {}: URL still used by another media row",
                media.id
            );
            return Ok(RemoteCleanup::SharedUrl);
        }

        let Some(asset_id) = self.blobs.asset_id_from_url(&media.url) else {
            tracing::debug!("Media {} URL is not managed storage, skipping", media.id);
            return Ok(RemoteCleanup::Unmanaged);
        };

        match self.blobs.delete(&asset_id).await {
            Ok(_) => Ok(RemoteCleanup::Deleted),
            Err(e) => {
                tracing::warn!("Failed to delete asset {}: {}", asset_id, e);
                Ok(RemoteCleanup::Failed)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blob::{BlobError, UploadedAsset, resource_type_for};
    use crate::store::SqliteStore;
    use crate::types::{Account, Chapter, MediaType, StorySettings, Template, Tier};
    use async_trait::async_trait;
    use std::sync::Mutex;
    use tempfile::TempDir;

    const PREFIX: &str = "https://blobs.test/";

    #[derive(Default)]
    struct RecordingBlobs {
        deletes: Mutex<Vec<String>>,
        fail_deletes: bool,
    }

    impl RecordingBlobs {
        fn deletes(&self) -> Vec<String> {
            self.deletes.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl BlobStorage for RecordingBlobs {
        async fn upload(
            &self,
            _data: &[u8],
            folder: &str,
            name: &str,
        ) -> std::result::Result<UploadedAsset, BlobError> {
            let asset_id = format!("{folder}/{name}");
            Ok(UploadedAsset {
                url: format!("{PREFIX}{asset_id}"),
                resource_type: resource_type_for(name),
                asset_id,
            })
        }

        async fn delete(&self, asset_id: &str) -> std::result::Result<bool, BlobError> {
            self.deletes.lock().unwrap().push(asset_id.to_string());
            if self.fail_deletes {
                return Err(BlobError::Io(std::io::Error::other("provider down")));
            }
            Ok(true)
        }

        fn asset_id_from_url(&self, url: &str) -> Option<String> {
            url.strip_prefix(PREFIX).map(str::to_string)
        }
    }

    struct Fixture {
        _temp: TempDir,
        store: Arc<dyn Store>,
        blobs: Arc<RecordingBlobs>,
        manager: MediaManager,
    }

    fn fixture_with(blobs: RecordingBlobs) -> Fixture {
        let temp = TempDir::new().unwrap();
        let store = SqliteStore::new(temp.path().join("test.db")).unwrap();
        store.initialize().unwrap();
        let store: Arc<dyn Store> = Arc::new(store);

        let now = Utc::now();
        for (id, domain) in [("acct-1", "acme.test"), ("acct-2", "other.test")] {
            store
                .create_account(&Account {
                    id: id.to_string(),
                    name: id.to_string(),
                    email: format!("{id}@example.com"),
                    password_hash: "hash".to_string(),
                    domain: Some(domain.to_string()),
                    tier: Tier::Free,
                    content_count: 0,
                    created_at: now,
                    updated_at: now,
                })
                .unwrap();
        }

        for (id, owner, slug) in [
            ("story-a", "acct-1", "a"),
            ("story-b", "acct-1", "b"),
            ("story-x", "acct-2", "x"),
        ] {
            let story = Story {
                id: id.to_string(),
                account_id: owner.to_string(),
                title: slug.to_string(),
                subtitle: None,
                description: None,
                slug: slug.to_string(),
                domain: "acme.test".to_string(),
                template: Template::Timeline,
                is_public: true,
                cover_photo: None,
                created_at: now,
                updated_at: now,
            };
            store
                .create_story(&story, &StorySettings::defaults_for(id))
                .unwrap();
        }

        let blobs = Arc::new(blobs);
        let quota = Arc::new(QuotaEnforcer::new(store.clone()));
        let manager = MediaManager::new(store.clone(), blobs.clone(), quota);

        Fixture {
            _temp: temp,
            store,
            blobs,
            manager,
        }
    }

    fn fixture() -> Fixture {
        fixture_with(RecordingBlobs::default())
    }

    fn insert_media(store: &Arc<dyn Store>, id: &str, owner: &str, url: &str) {
        store
            .create_media(&Media {
                id: id.to_string(),
                account_id: owner.to_string(),
                media_type: MediaType::Image,
                url: url.to_string(),
                thumbnail_url: None,
                title: None,
                created_at: Utc::now(),
            })
            .unwrap();
    }

    fn upload<'a>(name: &'a str) -> NewUpload<'a> {
        NewUpload {
            file_name: name,
            content_type: Some("image/jpeg"),
            title: None,
            data: b"bytes",
        }
    }

    fn content_count(store: &Arc<dyn Store>, id: &str) -> i64 {
        store.get_account(id).unwrap().unwrap().content_count
    }

    #[tokio::test]
    async fn test_upload_at_quota_boundary() {
        let f = fixture();
        for i in 0..19 {
            insert_media(&f.store, &format!("m-{i}"), "acct-1", &format!("{PREFIX}{i}"));
        }
        f.store.recompute_content_count("acct-1").unwrap();
        assert_eq!(content_count(&f.store, "acct-1"), 19);

        let media = f.manager.upload("acct-1", upload("beach.jpg")).await.unwrap();
        assert!(media.url.starts_with(&format!("{PREFIX}acct-1/gallery/")));
        assert!(media.url.ends_with("-beach.jpg"));
        assert_eq!(content_count(&f.store, "acct-1"), 20);

        let result = f.manager.upload("acct-1", upload("again.jpg")).await;
        assert!(matches!(
            result,
            Err(Error::QuotaExceeded {
                tier: Tier::Free,
                count: 20,
                limit: 20
            })
        ));
        assert_eq!(content_count(&f.store, "acct-1"), 20);
    }

    #[tokio::test]
    async fn test_same_name_uploads_get_distinct_assets() {
        let f = fixture();

        let first = f.manager.upload("acct-1", upload("beach.jpg")).await.unwrap();
        let second = f.manager.upload("acct-1", upload("beach.jpg")).await.unwrap();

        assert_ne!(first.url, second.url);
        assert!(second.url.ends_with("-beach.jpg"));
        assert_eq!(f.store.list_account_media("acct-1").unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_upload_rejects_unsupported_type() {
        let f = fixture();
        let mut request = upload("notes.txt");
        request.content_type = Some("text/plain");

        let result = f.manager.upload("acct-1", request).await;
        assert!(matches!(result, Err(Error::Validation(_))));
    }

    #[tokio::test]
    async fn test_upload_classifies_video() {
        let f = fixture();
        let mut request = upload("clip.mp4");
        request.content_type = Some("video/mp4");

        let media = f.manager.upload("acct-1", request).await.unwrap();
        assert_eq!(media.media_type, MediaType::Video);
    }

    #[test]
    fn test_link_requires_media_ids() {
        let f = fixture();
        assert!(matches!(
            f.manager.link("acct-1", "story-a", None, &[]),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn test_link_foreign_story_is_not_found() {
        let f = fixture();
        insert_media(&f.store, "m-1", "acct-1", "u1");

        let result = f
            .manager
            .link("acct-1", "story-x", None, &["m-1".to_string()]);
        assert!(matches!(result, Err(Error::NotFound)));
    }

    #[test]
    fn test_link_chapter_must_belong_to_story() {
        let f = fixture();
        insert_media(&f.store, "m-1", "acct-1", "u1");
        let now = Utc::now();
        f.store
            .create_chapter(&Chapter {
                id: "ch-b".to_string(),
                story_id: "story-b".to_string(),
                title: "Elsewhere".to_string(),
                content: None,
                date: None,
                order: 0,
                created_at: now,
                updated_at: now,
            })
            .unwrap();

        let result = f
            .manager
            .link("acct-1", "story-a", Some("ch-b"), &["m-1".to_string()]);
        assert!(matches!(result, Err(Error::NotFound)));

        let created = f
            .manager
            .link("acct-1", "story-b", Some("ch-b"), &["m-1".to_string()])
            .unwrap();
        assert_eq!(
            created[0].placement,
            Placement::Chapter {
                chapter_id: "ch-b".to_string()
            }
        );
    }

    #[test]
    fn test_link_twice_creates_once() {
        let f = fixture();
        insert_media(&f.store, "m-1", "acct-1", "u1");
        let ids = vec!["m-1".to_string()];

        assert_eq!(f.manager.link("acct-1", "story-a", None, &ids).unwrap().len(), 1);
        assert!(f.manager.link("acct-1", "story-a", None, &ids).unwrap().is_empty());
    }

    #[test]
    fn test_link_with_foreign_media_fails_whole_batch() {
        let f = fixture();
        insert_media(&f.store, "m-1", "acct-1", "u1");
        insert_media(&f.store, "m-foreign", "acct-2", "u2");

        let ids = vec!["m-1".to_string(), "m-foreign".to_string()];
        let result = f.manager.link("acct-1", "story-a", None, &ids);
        assert!(matches!(result, Err(Error::NotFound)));
        assert!(f.store.list_story_references("story-a").unwrap().is_empty());
    }

    #[test]
    fn test_unlink_keeps_media_and_other_placements() {
        let f = fixture();
        insert_media(&f.store, "m-1", "acct-1", "u1");
        let ids = vec!["m-1".to_string()];

        let in_a = f.manager.link("acct-1", "story-a", None, &ids).unwrap();
        f.manager.link("acct-1", "story-b", None, &ids).unwrap();

        f.manager.unlink("acct-1", &in_a[0].id).unwrap();

        assert!(f.store.get_media("m-1").unwrap().is_some());
        assert!(f.store.list_story_references("story-a").unwrap().is_empty());
        let in_b = f.store.list_story_references("story-b").unwrap();
        assert_eq!(in_b.len(), 1);
        assert_eq!(in_b[0].media.id, "m-1");
    }

    #[test]
    fn test_unlink_foreign_reference_is_forbidden() {
        let f = fixture();
        insert_media(&f.store, "m-1", "acct-1", "u1");
        let created = f
            .manager
            .link("acct-1", "story-a", None, &["m-1".to_string()])
            .unwrap();

        assert!(matches!(
            f.manager.unlink("acct-2", &created[0].id),
            Err(Error::Forbidden)
        ));
        assert!(matches!(
            f.manager.unlink("acct-1", "missing"),
            Err(Error::NotFound)
        ));
    }

    #[test]
    fn test_reorder() {
        let f = fixture();
        insert_media(&f.store, "m-1", "acct-1", "u1");
        let created = f
            .manager
            .link("acct-1", "story-a", None, &["m-1".to_string()])
            .unwrap();

        let updated = f.manager.reorder("acct-1", &created[0].id, 7).unwrap();
        assert_eq!(updated.order, 7);
        assert_eq!(
            f.store.get_media_reference(&created[0].id).unwrap().unwrap().order,
            7
        );
    }

    #[tokio::test]
    async fn test_delete_media_cascades_and_cleans_up() {
        let f = fixture();
        let media = f.manager.upload("acct-1", upload("a.jpg")).await.unwrap();
        f.manager
            .link("acct-1", "story-a", None, &[media.id.clone()])
            .unwrap();
        f.manager
            .link("acct-1", "story-b", None, &[media.id.clone()])
            .unwrap();

        let outcome = f.manager.delete_media("acct-1", &media.id).await.unwrap();

        assert_eq!(outcome.remote, RemoteCleanup::Deleted);
        assert_eq!(outcome.content_count, 0);
        assert_eq!(f.blobs.deletes().len(), 1);
        assert!(f.store.list_story_references("story-a").unwrap().is_empty());
        assert!(f.store.list_story_references("story-b").unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_media_with_shared_url_keeps_asset() {
        let f = fixture();
        let url = format!("{PREFIX}acct-1/gallery/shared.jpg");
        insert_media(&f.store, "m-1", "acct-1", &url);
        insert_media(&f.store, "m-2", "acct-1", &url);

        let outcome = f.manager.delete_media("acct-1", "m-1").await.unwrap();

        assert_eq!(outcome.remote, RemoteCleanup::SharedUrl);
        assert!(f.blobs.deletes().is_empty());
        assert!(f.store.get_media("m-2").unwrap().is_some());

        let outcome = f.manager.delete_media("acct-1", "m-2").await.unwrap();
        assert_eq!(outcome.remote, RemoteCleanup::Deleted);
        assert_eq!(f.blobs.deletes(), vec!["acct-1/gallery/shared.jpg".to_string()]);
    }

    #[tokio::test]
    async fn test_delete_media_with_unmanaged_url() {
        let f = fixture();
        insert_media(&f.store, "m-1", "acct-1", "https://elsewhere.example/a.jpg");

        let outcome = f.manager.delete_media("acct-1", "m-1").await.unwrap();
        assert_eq!(outcome.remote, RemoteCleanup::Unmanaged);
        assert!(f.blobs.deletes().is_empty());
    }

    #[tokio::test]
    async fn test_delete_media_survives_remote_failure() {
        let f = fixture_with(RecordingBlobs {
            fail_deletes: true,
            ..Default::default()
        });
        insert_media(&f.store, "m-1", "acct-1", &format!("{PREFIX}acct-1/gallery/a.jpg"));
        f.store.recompute_content_count("acct-1").unwrap();

        let outcome = f.manager.delete_media("acct-1", "m-1").await.unwrap();

        assert_eq!(outcome.remote, RemoteCleanup::Failed);
        assert_eq!(f.blobs.deletes().len(), 1);
        assert!(f.store.get_media("m-1").unwrap().is_none());
        assert_eq!(content_count(&f.store, "acct-1"), 0);
    }

    #[tokio::test]
    async fn test_delete_foreign_media_is_not_found() {
        let f = fixture();
        insert_media(&f.store, "m-1", "acct-2", "u1");

        let result = f.manager.delete_media("acct-1", "m-1").await;
        assert!(matches!(result, Err(Error::NotFound)));
        assert!(f.store.get_media("m-1").unwrap().is_some());
    }
}
