use std::sync::Arc;

use chrono::{Duration, Utc};
use uuid::Uuid;

use crate::auth::{SESSION_TOKEN_TTL_DAYS, TokenGenerator, hash_password, verify_password};
use crate::error::{Error, Result};
use crate::ident::IdentifierAllocator;
use crate::store::Store;
use crate::types::{Account, Tier, Token};

/// Attempts at allocating a domain when a concurrent signup claims the same one.
const MAX_DOMAIN_RETRIES: u32 = 5;

const MAX_TOKEN_RETRIES: u32 = 3;

#[derive(Debug, Clone, Default)]
pub struct NewAccount {
    pub name: String,
    pub email: String,
    pub password: String,
    pub preferred_domain: Option<String>,
}

/// A freshly issued API token. `raw` is only available here.
pub struct Session {
    pub raw: String,
    pub token: Token,
    pub account: Account,
}

pub struct AccountService {
    store: Arc<dyn Store>,
    allocator: Arc<IdentifierAllocator>,
    tokens: TokenGenerator,
}

fn required(value: &str, field: &str) -> Result<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(Error::Validation(format!("{field} is required")));
    }
    Ok(value.to_string())
}

fn email_local_part(email: &str) -> &str {
    email.split('@').next().unwrap_or(email)
}

impl AccountService {
    pub fn new(store: Arc<dyn Store>, allocator: Arc<IdentifierAllocator>) -> Self {
        Self {
            store,
            allocator,
            tokens: TokenGenerator::new(),
        }
    }

    /// Creates an account and allocates its public domain.
    ///
    /// The domain probe can race with another signup. When the insert hits
    /// the unique constraint the domain is allocated again, up to
    /// [`MAX_DOMAIN_RETRIES`] times.
    pub fn register(&self, req: NewAccount) -> Result<Account> {
        let name = required(&req.name, "name")?;
        let email = required(&req.email, "email")?.to_lowercase();
        if req.password.is_empty() {
            return Err(Error::Validation("password is required".to_string()));
        }
        if !email.contains('@') {
            return Err(Error::Validation("email is invalid".to_string()));
        }

        if self.store.get_account_by_email(&email)?.is_some() {
            return Err(Error::AlreadyExists);
        }

        let domain_text = req
            .preferred_domain
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(name.as_str())
            .to_string();

        let password_hash = hash_password(&req.password)?;

        for attempt in 1..=MAX_DOMAIN_RETRIES {
            let domain = self.allocator.allocate_domain(&domain_text)?;
            let now = Utc::now();
            let account = Account {
                id: Uuid::new_v4().to_string(),
                name: name.clone(),
                email: email.clone(),
                password_hash: password_hash.clone(),
                domain: Some(domain),
                tier: Tier::Free,
                content_count: 0,
                created_at: now,
                updated_at: now,
            };

            match self.store.create_account(&account) {
                Ok(()) => {
                    tracing::info!(
                        "Registered account {} with domain {}",
                        account.id,
                        account.domain.as_deref().unwrap_or_default()
                    );
                    return Ok(account);
                }
                Err(Error::AlreadyExists) => {
                    if self.store.get_account_by_email(&email)?.is_some() {
                        return Err(Error::AlreadyExists);
                    }
                    tracing::warn!(
                        "Domain claimed concurrently, retrying allocation (attempt {}/{})",
                        attempt,
                        MAX_DOMAIN_RETRIES
                    );
                }
                Err(e) => return Err(e),
            }
        }

        Err(Error::AlreadyExists)
    }

    /// Gives an account without a domain one derived from its name, or
    /// from its email when the name is blank. Returns the account's domain.
    ///
    /// `account` may be stale. The stored row decides: once a domain is set
    /// it is never replaced.
    pub fn ensure_domain(&self, account: &Account) -> Result<String> {
        if let Some(domain) = &account.domain {
            return Ok(domain.clone());
        }
        if let Some(domain) = self.stored_domain(&account.id)? {
            return Ok(domain);
        }

        let text = if account.name.trim().is_empty() {
            email_local_part(&account.email)
        } else {
            account.name.as_str()
        };

        for _ in 0..MAX_DOMAIN_RETRIES {
            let domain = self.allocator.allocate_domain(text)?;
            match self.store.claim_account_domain(&account.id, &domain) {
                Ok(true) => {
                    tracing::info!("Assigned domain {} to account {}", domain, account.id);
                    return Ok(domain);
                }
                // Another request assigned one first.
                Ok(false) => return self.stored_domain(&account.id)?.ok_or(Error::NotFound),
                Err(Error::AlreadyExists) => {
                    tracing::warn!("Domain {} claimed concurrently, retrying allocation", domain);
                }
                Err(e) => return Err(e),
            }
        }

        Err(Error::AlreadyExists)
    }

    fn stored_domain(&self, account_id: &str) -> Result<Option<String>> {
        let account = self.store.get_account(account_id)?.ok_or(Error::NotFound)?;
        Ok(account.domain)
    }

    /// Checks credentials and issues a session token.
    pub fn login(&self, email: &str, password: &str) -> Result<Session> {
        let email = email.trim().to_lowercase();
        let account = self
            .store
            .get_account_by_email(&email)?
            .ok_or(Error::Unauthorized)?;

        if !verify_password(password, &account.password_hash)? {
            return Err(Error::Unauthorized);
        }

        let (raw, token) = self.issue_token(&account.id)?;
        Ok(Session {
            raw,
            token,
            account,
        })
    }

    fn issue_token(&self, account_id: &str) -> Result<(String, Token)> {
        let ttl = Some(Duration::days(SESSION_TOKEN_TTL_DAYS));

        for _ in 0..MAX_TOKEN_RETRIES {
            let (raw, token) = self.tokens.issue(account_id, ttl)?;
            match self.store.create_token(&token) {
                Ok(()) => return Ok((raw, token)),
                Err(Error::TokenLookupCollision) => continue,
                Err(e) => return Err(e),
            }
        }

        Err(Error::TokenLookupCollision)
    }

    pub fn set_tier(&self, email: &str, tier: Tier) -> Result<Account> {
        let account = self
            .store
            .get_account_by_email(&email.trim().to_lowercase())?
            .ok_or(Error::NotFound)?;
        self.store.set_account_tier(&account.id, tier)?;
        self.store.get_account(&account.id)?.ok_or(Error::NotFound)
    }
}
