use std::sync::Arc;

use serde::Serialize;

use crate::error::{Error, Result};
use crate::store::Store;
use crate::types::{Account, Feature, Tier};

/// Usage share at which an upgrade is suggested.
pub const UPGRADE_THRESHOLD_PERCENT: f64 = 80.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuotaStatus {
    pub tier: Tier,
    pub count: i64,
    pub limit: i64,
    pub remaining: i64,
    pub usage_percent: f64,
    pub upgrade_suggested: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_tier: Option<Tier>,
}

impl QuotaStatus {
    #[must_use]
    pub fn new(tier: Tier, count: i64) -> Self {
        let limit = tier.content_limit();
        let usage_percent = if limit > 0 {
            (count as f64 * 100.0 / limit as f64).min(100.0)
        } else {
            100.0
        };

        Self {
            tier,
            count,
            limit,
            remaining: (limit - count).max(0),
            usage_percent,
            upgrade_suggested: usage_percent >= UPGRADE_THRESHOLD_PERCENT,
            next_tier: tier.next(),
        }
    }
}

/// Allowed iff the account is below its tier limit.
#[must_use]
pub fn can_upload(tier: Tier, count: i64) -> bool {
    count < tier.content_limit()
}

/// Gates uploads on the cached count and is the only writer of that count.
///
/// The check is advisory: concurrent uploads may both pass when one slot is
/// left. The recompute that follows every upload restores the true count,
/// and the next check blocks.
pub struct QuotaEnforcer {
    store: Arc<dyn Store>,
}

impl QuotaEnforcer {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub fn ensure_can_upload(&self, account: &Account) -> Result<()> {
        if can_upload(account.tier, account.content_count) {
            return Ok(());
        }

        tracing::info!(
            "Upload blocked for account {}: {} of {} on {}",
            account.id,
            account.content_count,
            account.tier.content_limit(),
            account.tier
        );
        Err(Error::QuotaExceeded {
            tier: account.tier,
            count: account.content_count,
            limit: account.tier.content_limit(),
        })
    }

    pub fn ensure_feature(&self, tier: Tier, feature: Feature) -> Result<()> {
        if tier.allows(feature) {
            Ok(())
        } else {
            Err(Error::Forbidden)
        }
    }

    /// Rewrites the account's cached count from its media rows.
    pub fn recompute(&self, account_id: &str) -> Result<i64> {
        let count = self.store.recompute_content_count(account_id)?;
        tracing::debug!("Content count for account {} is now {}", account_id, count);
        Ok(count)
    }

    pub fn status(&self, account_id: &str) -> Result<QuotaStatus> {
        let account = self.store.get_account(account_id)?.ok_or(Error::NotFound)?;
        Ok(QuotaStatus::new(account.tier, account.content_count))
    }

    /// Recomputes every account. Returns (account id, count) pairs.
    pub fn recompute_all(&self) -> Result<Vec<(String, i64)>> {
        let accounts = self.store.list_accounts()?;
        let mut counts = Vec::with_capacity(accounts.len());

        for account in accounts {
            let count = self.recompute(&account.id)?;
            counts.push((account.id, count));
        }

        Ok(counts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::SqliteStore;
    use crate::types::{Media, MediaType, Template};
    use chrono::Utc;
    use tempfile::TempDir;

    fn setup() -> (TempDir, Arc<dyn Store>, QuotaEnforcer) {
        let temp = TempDir::new().unwrap();
        let store = SqliteStore::new(temp.path().join("test.db")).unwrap();
        store.initialize().unwrap();
        let store: Arc<dyn Store> = Arc::new(store);

        let now = Utc::now();
        store
            .create_account(&Account {
                id: "acct-1".to_string(),
                name: "Acme".to_string(),
                email: "acme@example.com".to_string(),
                password_hash: "hash".to_string(),
                domain: Some("acme.taleweave.site".to_string()),
                tier: Tier::Free,
                content_count: 0,
                created_at: now,
                updated_at: now,
            })
            .unwrap();

        let quota = QuotaEnforcer::new(store.clone());
        (temp, store, quota)
    }

    fn add_media(store: &Arc<dyn Store>, n: usize) {
        for i in 0..n {
            store
                .create_media(&Media {
                    id: format!("m-{i}"),
                    account_id: "acct-1".to_string(),
                    media_type: MediaType::Image,
                    url: format!("https://cdn.example/{i}.jpg"),
                    thumbnail_url: None,
                    title: None,
                    created_at: Utc::now(),
                })
                .unwrap();
        }
    }

    #[test]
    fn test_can_upload_boundary() {
        let limit = Tier::Free.content_limit();
        assert!(can_upload(Tier::Free, limit - 1));
        assert!(!can_upload(Tier::Free, limit));
        assert!(!can_upload(Tier::Free, limit + 3));
    }

    #[test]
    fn test_ensure_can_upload_reports_details() {
        let (_temp, store, quota) = setup();
        add_media(&store, 20);
        quota.recompute("acct-1").unwrap();

        let account = store.get_account("acct-1").unwrap().unwrap();
        match quota.ensure_can_upload(&account) {
            Err(Error::QuotaExceeded { tier, count, limit }) => {
                assert_eq!(tier, Tier::Free);
                assert_eq!(count, 20);
                assert_eq!(limit, 20);
            }
            other => panic!("expected quota error, got {other:?}"),
        }
    }

    #[test]
    fn test_recompute_corrects_drift() {
        let (_temp, store, quota) = setup();
        add_media(&store, 3);

        // Nothing has recomputed yet, so the cached value is stale.
        assert_eq!(store.get_account("acct-1").unwrap().unwrap().content_count, 0);
        assert_eq!(quota.recompute("acct-1").unwrap(), 3);
        assert_eq!(store.get_account("acct-1").unwrap().unwrap().content_count, 3);
    }

    #[test]
    fn test_status() {
        let (_temp, store, quota) = setup();
        add_media(&store, 16);
        quota.recompute("acct-1").unwrap();

        let status = quota.status("acct-1").unwrap();
        assert_eq!(status.count, 16);
        assert_eq!(status.limit, 20);
        assert_eq!(status.remaining, 4);
        assert!((status.usage_percent - 80.0).abs() < f64::EPSILON);
        assert!(status.upgrade_suggested);
        assert_eq!(status.next_tier, Some(Tier::Basic));
    }

    #[test]
    fn test_status_clamps_overshoot() {
        let status = QuotaStatus::new(Tier::Free, 25);
        assert_eq!(status.remaining, 0);
        assert!((status.usage_percent - 100.0).abs() < f64::EPSILON);

        let top = QuotaStatus::new(Tier::Premium, 0);
        assert!(!top.upgrade_suggested);
        assert_eq!(top.next_tier, None);
    }

    #[test]
    fn test_feature_gate() {
        let (_temp, _store, quota) = setup();
        assert!(quota.ensure_feature(Tier::Free, Feature::Template(Template::Timeline)).is_ok());
        assert!(matches!(
            quota.ensure_feature(Tier::Free, Feature::CoverPhoto),
            Err(Error::Forbidden)
        ));
        assert!(quota.ensure_feature(Tier::Pro, Feature::CoverPhoto).is_ok());
    }

    #[test]
    fn test_recompute_all() {
        let (_temp, store, quota) = setup();
        add_media(&store, 2);

        let counts = quota.recompute_all().unwrap();
        assert_eq!(counts, vec![("acct-1".to_string(), 2)]);
    }
}
