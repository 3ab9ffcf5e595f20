use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{Connection, OptionalExtension, Row, params};
use uuid::Uuid;

use super::Store;
use super::schema::SCHEMA;
use crate::error::{Error, Result};
use crate::types::*;

const ACCOUNT_COLUMNS: &str =
    "id, name, email, password_hash, domain, tier, content_count, created_at, updated_at";

const TOKEN_COLUMNS: &str =
    "id, token_hash, token_lookup, account_id, created_at, expires_at, last_used_at";

const STORY_COLUMNS: &str = "s.id, s.account_id, s.title, s.subtitle, s.description, s.slug, \
     s.domain, s.template, s.is_public, s.cover_photo, s.created_at, s.updated_at";

const STORY_COUNT_COLUMNS: &str = "(SELECT COUNT(*) FROM chapters c WHERE c.story_id = s.id), \
     (SELECT COUNT(*) FROM media_references r WHERE r.story_id = s.id)";

const CHAPTER_COLUMNS: &str =
    "id, story_id, title, content, date, sort_order, created_at, updated_at";

const MEDIA_COLUMNS: &str =
    "m.id, m.account_id, m.media_type, m.url, m.thumbnail_url, m.title, m.created_at";

const REFERENCE_COLUMNS: &str =
    "r.id, r.media_id, r.story_id, r.chapter_id, r.sort_order, r.created_at";

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let conn = Connection::open(db_path)?;

        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.pragma_update(None, "journal_mode", "WAL")?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Returns a guard to the underlying database connection.
    /// This allows consuming applications to execute custom SQL.
    pub fn connection(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn()
    }
}

fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| {
            // Handle SQLite's default datetime format: "YYYY-MM-DD HH:MM:SS"
            chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            tracing::error!("Invalid datetime in database: '{}' - {}", s, e);
            Utc::now()
        })
}

// Fixed width so that text ordering matches time ordering.
fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn account_from_row(row: &Row<'_>) -> rusqlite::Result<Account> {
    Ok(Account {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        password_hash: row.get(3)?,
        domain: row.get(4)?,
        tier: Tier::parse_or_free(&row.get::<_, String>(5)?),
        content_count: row.get(6)?,
        created_at: parse_datetime(&row.get::<_, String>(7)?),
        updated_at: parse_datetime(&row.get::<_, String>(8)?),
    })
}

fn token_from_row(row: &Row<'_>) -> rusqlite::Result<Token> {
    Ok(Token {
        id: row.get(0)?,
        token_hash: row.get(1)?,
        token_lookup: row.get(2)?,
        account_id: row.get(3)?,
        created_at: parse_datetime(&row.get::<_, String>(4)?),
        expires_at: row.get::<_, Option<String>>(5)?.map(|s| parse_datetime(&s)),
        last_used_at: row.get::<_, Option<String>>(6)?.map(|s| parse_datetime(&s)),
    })
}

fn story_from_row(row: &Row<'_>) -> rusqlite::Result<Story> {
    let template: String = row.get(7)?;
    Ok(Story {
        id: row.get(0)?,
        account_id: row.get(1)?,
        title: row.get(2)?,
        subtitle: row.get(3)?,
        description: row.get(4)?,
        slug: row.get(5)?,
        domain: row.get(6)?,
        template: Template::parse(&template).unwrap_or_default(),
        is_public: row.get(8)?,
        cover_photo: row.get(9)?,
        created_at: parse_datetime(&row.get::<_, String>(10)?),
        updated_at: parse_datetime(&row.get::<_, String>(11)?),
    })
}

fn story_summary_from_row(row: &Row<'_>) -> rusqlite::Result<StorySummary> {
    Ok(StorySummary {
        story: story_from_row(row)?,
        chapter_count: row.get(12)?,
        media_count: row.get(13)?,
    })
}

fn chapter_from_row(row: &Row<'_>) -> rusqlite::Result<Chapter> {
    Ok(Chapter {
        id: row.get(0)?,
        story_id: row.get(1)?,
        title: row.get(2)?,
        content: row.get(3)?,
        date: row.get::<_, Option<String>>(4)?.map(|s| parse_datetime(&s)),
        order: row.get(5)?,
        created_at: parse_datetime(&row.get::<_, String>(6)?),
        updated_at: parse_datetime(&row.get::<_, String>(7)?),
    })
}

fn media_from_row(row: &Row<'_>, base: usize) -> rusqlite::Result<Media> {
    let media_type: String = row.get(base + 2)?;
    let media_type = MediaType::parse(&media_type).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            base + 2,
            rusqlite::types::Type::Text,
            format!("unknown media type '{media_type}'").into(),
        )
    })?;

    Ok(Media {
        id: row.get(base)?,
        account_id: row.get(base + 1)?,
        media_type,
        url: row.get(base + 3)?,
        thumbnail_url: row.get(base + 4)?,
        title: row.get(base + 5)?,
        created_at: parse_datetime(&row.get::<_, String>(base + 6)?),
    })
}

fn reference_from_row(row: &Row<'_>) -> rusqlite::Result<MediaReference> {
    Ok(MediaReference {
        id: row.get(0)?,
        media_id: row.get(1)?,
        story_id: row.get(2)?,
        placement: Placement::from_chapter(row.get(3)?),
        order: row.get(4)?,
        created_at: parse_datetime(&row.get::<_, String>(5)?),
    })
}

impl Store for SqliteStore {
    fn initialize(&self) -> Result<()> {
        self.conn().execute_batch(SCHEMA)?;
        Ok(())
    }

    // Account operations

    fn create_account(&self, account: &Account) -> Result<()> {
        self.conn().execute(
            "INSERT INTO accounts (id, name, email, password_hash, domain, tier, content_count, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                account.id,
                account.name,
                account.email,
                account.password_hash,
                account.domain,
                account.tier.as_str(),
                account.content_count,
                format_datetime(&account.created_at),
                format_datetime(&account.updated_at),
            ],
        )?;
        Ok(())
    }

    fn get_account(&self, id: &str) -> Result<Option<Account>> {
        self.conn()
            .query_row(
                &format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id = ?1"),
                params![id],
                account_from_row,
            )
            .optional()
            .map_err(Error::from)
    }

    fn get_account_by_email(&self, email: &str) -> Result<Option<Account>> {
        self.conn()
            .query_row(
                &format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE email = ?1"),
                params![email],
                account_from_row,
            )
            .optional()
            .map_err(Error::from)
    }

    fn get_account_by_domain(&self, domain: &str) -> Result<Option<Account>> {
        self.conn()
            .query_row(
                &format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE domain = ?1"),
                params![domain],
                account_from_row,
            )
            .optional()
            .map_err(Error::from)
    }

    fn list_accounts(&self) -> Result<Vec<Account>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts ORDER BY created_at"
        ))?;

        let rows = stmt.query_map([], account_from_row)?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn domain_exists(&self, domain: &str) -> Result<bool> {
        self.conn()
            .query_row(
                "SELECT EXISTS(SELECT 1 FROM accounts WHERE domain = ?1)",
                params![domain],
                |row| row.get(0),
            )
            .map_err(Error::from)
    }

    fn claim_account_domain(&self, id: &str, domain: &str) -> Result<bool> {
        let rows = self.conn().execute(
            "UPDATE accounts SET domain = ?1, updated_at = ?2 WHERE id = ?3 AND domain IS NULL",
            params![domain, format_datetime(&Utc::now()), id],
        )?;
        Ok(rows > 0)
    }

    fn set_account_tier(&self, id: &str, tier: Tier) -> Result<()> {
        let rows = self.conn().execute(
            "UPDATE accounts SET tier = ?1, updated_at = ?2 WHERE id = ?3",
            params![tier.as_str(), format_datetime(&Utc::now()), id],
        )?;

        if rows == 0 {
            return Err(Error::NotFound);
        }
        Ok(())
    }

    fn recompute_content_count(&self, account_id: &str) -> Result<i64> {
        self.conn()
            .query_row(
                "UPDATE accounts
                 SET content_count = (SELECT COUNT(*) FROM media WHERE account_id = ?1),
                     updated_at = ?2
                 WHERE id = ?1
                 RETURNING content_count",
                params![account_id, format_datetime(&Utc::now())],
                |row| row.get(0),
            )
            .optional()?
            .ok_or(Error::NotFound)
    }

    // Token operations

    fn create_token(&self, token: &Token) -> Result<()> {
        let result = self.conn().execute(
            "INSERT INTO tokens (id, token_hash, token_lookup, account_id, created_at, expires_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                token.id,
                token.token_hash,
                token.token_lookup,
                token.account_id,
                format_datetime(&token.created_at),
                token.expires_at.as_ref().map(format_datetime),
            ],
        );

        match result.map_err(Error::from) {
            Ok(_) => Ok(()),
            Err(Error::AlreadyExists) => Err(Error::TokenLookupCollision),
            Err(e) => Err(e),
        }
    }

    fn get_token_by_lookup(&self, lookup: &str) -> Result<Option<Token>> {
        self.conn()
            .query_row(
                &format!("SELECT {TOKEN_COLUMNS} FROM tokens WHERE token_lookup = ?1"),
                params![lookup],
                token_from_row,
            )
            .optional()
            .map_err(Error::from)
    }

    fn update_token_last_used(&self, id: &str) -> Result<()> {
        self.conn().execute(
            "UPDATE tokens SET last_used_at = ?1 WHERE id = ?2",
            params![format_datetime(&Utc::now()), id],
        )?;
        Ok(())
    }

    // Story operations

    fn slug_exists(&self, slug: &str) -> Result<bool> {
        self.conn()
            .query_row(
                "SELECT EXISTS(SELECT 1 FROM stories WHERE slug = ?1)",
                params![slug],
                |row| row.get(0),
            )
            .map_err(Error::from)
    }

    fn create_story(&self, story: &Story, settings: &StorySettings) -> Result<()> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;

        tx.execute(
            "INSERT INTO stories (id, account_id, title, subtitle, description, slug, domain,
                                  template, is_public, cover_photo, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            params![
                story.id,
                story.account_id,
                story.title,
                story.subtitle,
                story.description,
                story.slug,
                story.domain,
                story.template.as_str(),
                story.is_public,
                story.cover_photo,
                format_datetime(&story.created_at),
                format_datetime(&story.updated_at),
            ],
        )?;

        tx.execute(
            "INSERT INTO story_settings (story_id, primary_color, font_family, cover_image,
                                         logo_image, enable_comments, enable_download)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                settings.story_id,
                settings.primary_color,
                settings.font_family,
                settings.cover_image,
                settings.logo_image,
                settings.enable_comments,
                settings.enable_download,
            ],
        )?;

        tx.commit()?;
        Ok(())
    }

    fn get_story(&self, id: &str) -> Result<Option<Story>> {
        self.conn()
            .query_row(
                &format!("SELECT {STORY_COLUMNS} FROM stories s WHERE s.id = ?1"),
                params![id],
                story_from_row,
            )
            .optional()
            .map_err(Error::from)
    }

    fn get_public_story(&self, domain: &str, slug: &str) -> Result<Option<Story>> {
        // Match the owning account as well as the slug.
        self.conn()
            .query_row(
                &format!(
                    "SELECT {STORY_COLUMNS} FROM stories s
                     JOIN accounts a ON a.id = s.account_id
                     WHERE s.slug = ?1 AND a.domain = ?2 AND s.is_public = 1"
                ),
                params![slug, domain],
                story_from_row,
            )
            .optional()
            .map_err(Error::from)
    }

    fn list_stories(&self, account_id: &str) -> Result<Vec<StorySummary>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {STORY_COLUMNS}, {STORY_COUNT_COLUMNS} FROM stories s
             WHERE s.account_id = ?1
             ORDER BY s.updated_at DESC"
        ))?;

        let rows = stmt.query_map(params![account_id], story_summary_from_row)?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn list_public_stories(&self, account_id: &str) -> Result<Vec<StorySummary>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {STORY_COLUMNS}, {STORY_COUNT_COLUMNS} FROM stories s
             WHERE s.account_id = ?1 AND s.is_public = 1
             ORDER BY s.updated_at DESC"
        ))?;

        let rows = stmt.query_map(params![account_id], story_summary_from_row)?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn update_story(&self, story: &Story) -> Result<()> {
        let rows = self.conn().execute(
            "UPDATE stories SET title = ?1, subtitle = ?2, description = ?3, template = ?4,
                                is_public = ?5, cover_photo = ?6, updated_at = ?7
             WHERE id = ?8",
            params![
                story.title,
                story.subtitle,
                story.description,
                story.template.as_str(),
                story.is_public,
                story.cover_photo,
                format_datetime(&story.updated_at),
                story.id,
            ],
        )?;

        if rows == 0 {
            return Err(Error::NotFound);
        }
        Ok(())
    }

    fn delete_story(&self, id: &str) -> Result<bool> {
        let rows = self
            .conn()
            .execute("DELETE FROM stories WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }

    fn get_story_settings(&self, story_id: &str) -> Result<Option<StorySettings>> {
        self.conn()
            .query_row(
                "SELECT story_id, primary_color, font_family, cover_image, logo_image,
                        enable_comments, enable_download
                 FROM story_settings WHERE story_id = ?1",
                params![story_id],
                |row| {
                    Ok(StorySettings {
                        story_id: row.get(0)?,
                        primary_color: row.get(1)?,
                        font_family: row.get(2)?,
                        cover_image: row.get(3)?,
                        logo_image: row.get(4)?,
                        enable_comments: row.get(5)?,
                        enable_download: row.get(6)?,
                    })
                },
            )
            .optional()
            .map_err(Error::from)
    }

    fn update_story_settings(&self, settings: &StorySettings) -> Result<()> {
        self.conn().execute(
            "INSERT INTO story_settings (story_id, primary_color, font_family, cover_image,
                                         logo_image, enable_comments, enable_download)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT(story_id) DO UPDATE SET
                primary_color = excluded.primary_color,
                font_family = excluded.font_family,
                cover_image = excluded.cover_image,
                logo_image = excluded.logo_image,
                enable_comments = excluded.enable_comments,
                enable_download = excluded.enable_download",
            params![
                settings.story_id,
                settings.primary_color,
                settings.font_family,
                settings.cover_image,
                settings.logo_image,
                settings.enable_comments,
                settings.enable_download,
            ],
        )?;
        Ok(())
    }

    // Chapter operations

    fn create_chapter(&self, chapter: &Chapter) -> Result<()> {
        self.conn().execute(
            "INSERT INTO chapters (id, story_id, title, content, date, sort_order, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                chapter.id,
                chapter.story_id,
                chapter.title,
                chapter.content,
                chapter.date.as_ref().map(format_datetime),
                chapter.order,
                format_datetime(&chapter.created_at),
                format_datetime(&chapter.updated_at),
            ],
        )?;
        Ok(())
    }

    fn get_chapter(&self, id: &str) -> Result<Option<Chapter>> {
        self.conn()
            .query_row(
                &format!("SELECT {CHAPTER_COLUMNS} FROM chapters WHERE id = ?1"),
                params![id],
                chapter_from_row,
            )
            .optional()
            .map_err(Error::from)
    }

    fn list_chapters(&self, story_id: &str) -> Result<Vec<Chapter>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {CHAPTER_COLUMNS} FROM chapters
             WHERE story_id = ?1
             ORDER BY sort_order, created_at"
        ))?;

        let rows = stmt.query_map(params![story_id], chapter_from_row)?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn update_chapter(&self, chapter: &Chapter) -> Result<()> {
        let rows = self.conn().execute(
            "UPDATE chapters SET title = ?1, content = ?2, date = ?3, sort_order = ?4, updated_at = ?5
             WHERE id = ?6",
            params![
                chapter.title,
                chapter.content,
                chapter.date.as_ref().map(format_datetime),
                chapter.order,
                format_datetime(&chapter.updated_at),
                chapter.id,
            ],
        )?;

        if rows == 0 {
            return Err(Error::NotFound);
        }
        Ok(())
    }

    fn delete_chapter(&self, id: &str) -> Result<bool> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;

        tx.execute(
            "DELETE FROM media_references WHERE chapter_id = ?1",
            params![id],
        )?;
        let rows = tx.execute("DELETE FROM chapters WHERE id = ?1", params![id])?;

        tx.commit()?;
        Ok(rows > 0)
    }

    // Media operations

    fn create_media(&self, media: &Media) -> Result<()> {
        self.conn().execute(
            "INSERT INTO media (id, account_id, media_type, url, thumbnail_url, title, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                media.id,
                media.account_id,
                media.media_type.as_str(),
                media.url,
                media.thumbnail_url,
                media.title,
                format_datetime(&media.created_at),
            ],
        )?;
        Ok(())
    }

    fn get_media(&self, id: &str) -> Result<Option<Media>> {
        self.conn()
            .query_row(
                &format!("SELECT {MEDIA_COLUMNS} FROM media m WHERE m.id = ?1"),
                params![id],
                |row| media_from_row(row, 0),
            )
            .optional()
            .map_err(Error::from)
    }

    fn list_account_media(&self, account_id: &str) -> Result<Vec<Media>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {MEDIA_COLUMNS} FROM media m
             WHERE m.account_id = ?1
             ORDER BY m.created_at DESC"
        ))?;

        let rows = stmt.query_map(params![account_id], |row| media_from_row(row, 0))?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn count_media_with_url(&self, account_id: &str, url: &str) -> Result<i64> {
        self.conn()
            .query_row(
                "SELECT COUNT(*) FROM media WHERE account_id = ?1 AND url = ?2",
                params![account_id, url],
                |row| row.get(0),
            )
            .map_err(Error::from)
    }

    fn delete_media_cascade(&self, id: &str) -> Result<bool> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;

        tx.execute(
            "DELETE FROM media_references WHERE media_id = ?1",
            params![id],
        )?;
        let rows = tx.execute("DELETE FROM media WHERE id = ?1", params![id])?;

        tx.commit()?;
        Ok(rows > 0)
    }

    // Media reference operations

    fn link_media(
        &self,
        account_id: &str,
        story_id: &str,
        placement: &Placement,
        media_ids: &[String],
        now: DateTime<Utc>,
    ) -> Result<Vec<MediaReference>> {
        let mut unique_ids: Vec<&String> = Vec::with_capacity(media_ids.len());
        for id in media_ids {
            if !unique_ids.contains(&id) {
                unique_ids.push(id);
            }
        }

        let mut conn = self.conn();
        let tx = conn.transaction()?;

        // Dropping the transaction on early return rolls it back.
        for media_id in &unique_ids {
            let owned: bool = tx.query_row(
                "SELECT EXISTS(SELECT 1 FROM media WHERE id = ?1 AND account_id = ?2)",
                params![media_id, account_id],
                |row| row.get(0),
            )?;
            if !owned {
                return Err(Error::NotFound);
            }
        }

        let chapter_id = placement.chapter_id();
        let mut created = Vec::new();

        for media_id in unique_ids {
            let exists: bool = tx.query_row(
                "SELECT EXISTS(SELECT 1 FROM media_references
                 WHERE media_id = ?1 AND story_id = ?2 AND IFNULL(chapter_id, '') = IFNULL(?3, ''))",
                params![media_id, story_id, chapter_id],
                |row| row.get(0),
            )?;
            if exists {
                continue;
            }

            let reference = MediaReference {
                id: Uuid::new_v4().to_string(),
                media_id: media_id.clone(),
                story_id: story_id.to_string(),
                placement: placement.clone(),
                order: 0,
                created_at: now,
            };

            tx.execute(
                "INSERT INTO media_references (id, media_id, story_id, chapter_id, sort_order, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    reference.id,
                    reference.media_id,
                    reference.story_id,
                    chapter_id,
                    reference.order,
                    format_datetime(&reference.created_at),
                ],
            )?;

            created.push(reference);
        }

        tx.commit()?;
        Ok(created)
    }

    fn get_media_reference(&self, id: &str) -> Result<Option<MediaReference>> {
        self.conn()
            .query_row(
                &format!("SELECT {REFERENCE_COLUMNS} FROM media_references r WHERE r.id = ?1"),
                params![id],
                reference_from_row,
            )
            .optional()
            .map_err(Error::from)
    }

    fn update_media_reference_order(&self, id: &str, order: i64) -> Result<()> {
        let rows = self.conn().execute(
            "UPDATE media_references SET sort_order = ?1 WHERE id = ?2",
            params![order, id],
        )?;

        if rows == 0 {
            return Err(Error::NotFound);
        }
        Ok(())
    }

    fn delete_media_reference(&self, id: &str) -> Result<bool> {
        let rows = self
            .conn()
            .execute("DELETE FROM media_references WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }

    fn list_story_references(&self, story_id: &str) -> Result<Vec<ReferenceWithMedia>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {REFERENCE_COLUMNS}, {MEDIA_COLUMNS}
             FROM media_references r
             JOIN media m ON m.id = r.media_id
             WHERE r.story_id = ?1
             ORDER BY r.sort_order, r.created_at"
        ))?;

        let rows = stmt.query_map(params![story_id], |row| {
            Ok(ReferenceWithMedia {
                reference: reference_from_row(row)?,
                media: media_from_row(row, 6)?,
            })
        })?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn close(&self) -> Result<()> {
        Ok(())
    }
}
