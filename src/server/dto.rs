use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::Account;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    /// Free text the public domain is derived from.
    #[serde(default)]
    pub domain: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub token: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    pub account: Account,
}

#[derive(Debug, Deserialize)]
pub struct DomainCheckRequest {
    pub domain: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct SiteQuery {
    #[serde(default)]
    pub story: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LinkMediaRequest {
    pub media_ids: Vec<String>,
    pub story_id: String,
    #[serde(default)]
    pub chapter_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ReorderReferenceRequest {
    pub order: i64,
}

#[derive(Debug, Serialize)]
pub struct RecomputeResponse {
    pub content_count: i64,
}
