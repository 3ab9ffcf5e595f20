pub const SCHEMA: &str = r#"
-- Accounts are tenants; each owns a public domain, stories, and media
CREATE TABLE IF NOT EXISTS accounts (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    email TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,
    domain TEXT UNIQUE,              -- NULL until first assigned
    tier TEXT NOT NULL DEFAULT 'free',

    -- Denormalized; always recomputed from COUNT(media), never incremented
    content_count INTEGER NOT NULL DEFAULT 0,

    created_at TEXT DEFAULT (datetime('now')),
    updated_at TEXT DEFAULT (datetime('now'))
);

-- Tokens are API credentials bound to an account
CREATE TABLE IF NOT EXISTS tokens (
    id TEXT PRIMARY KEY,
    token_hash TEXT NOT NULL,          -- argon2id hash with embedded salt
    token_lookup TEXT NOT NULL,        -- 8 chars for fast lookup
    account_id TEXT NOT NULL REFERENCES accounts(id) ON DELETE CASCADE,
    created_at TEXT DEFAULT (datetime('now')),
    expires_at TEXT,                   -- NULL = never
    last_used_at TEXT
);

-- Stories
CREATE TABLE IF NOT EXISTS stories (
    id TEXT PRIMARY KEY,
    account_id TEXT NOT NULL REFERENCES accounts(id) ON DELETE CASCADE,
    title TEXT NOT NULL,
    subtitle TEXT,
    description TEXT,
    slug TEXT NOT NULL UNIQUE,
    domain TEXT NOT NULL,
    template TEXT NOT NULL DEFAULT 'timeline',
    is_public INTEGER NOT NULL DEFAULT 0,
    cover_photo TEXT,                  -- plain URL, intentionally not a foreign key
    created_at TEXT DEFAULT (datetime('now')),
    updated_at TEXT DEFAULT (datetime('now'))
);

-- Presentation options, 1:1 with stories
CREATE TABLE IF NOT EXISTS story_settings (
    story_id TEXT PRIMARY KEY REFERENCES stories(id) ON DELETE CASCADE,
    primary_color TEXT NOT NULL,
    font_family TEXT NOT NULL,
    cover_image TEXT,
    logo_image TEXT,
    enable_comments INTEGER NOT NULL DEFAULT 0,
    enable_download INTEGER NOT NULL DEFAULT 0
);

-- Chapters, ordered by sort_order then creation
CREATE TABLE IF NOT EXISTS chapters (
    id TEXT PRIMARY KEY,
    story_id TEXT NOT NULL REFERENCES stories(id) ON DELETE CASCADE,
    title TEXT NOT NULL,
    content TEXT,
    date TEXT,
    sort_order INTEGER NOT NULL DEFAULT 0,
    created_at TEXT DEFAULT (datetime('now')),
    updated_at TEXT DEFAULT (datetime('now'))
);

-- Uploaded assets, owned by accounts and independent of any placement
CREATE TABLE IF NOT EXISTS media (
    id TEXT PRIMARY KEY,
    account_id TEXT NOT NULL REFERENCES accounts(id) ON DELETE CASCADE,
    media_type TEXT NOT NULL,          -- 'image' | 'video'
    url TEXT NOT NULL,
    thumbnail_url TEXT,
    title TEXT,
    created_at TEXT DEFAULT (datetime('now'))
);

-- Placements of media inside a story or one of its chapters.
-- story_id is always the containing story; chapter_id is set for chapter placements.
CREATE TABLE IF NOT EXISTS media_references (
    id TEXT PRIMARY KEY,
    media_id TEXT NOT NULL REFERENCES media(id) ON DELETE CASCADE,
    story_id TEXT NOT NULL REFERENCES stories(id) ON DELETE CASCADE,
    chapter_id TEXT REFERENCES chapters(id) ON DELETE CASCADE,
    sort_order INTEGER NOT NULL DEFAULT 0,
    created_at TEXT DEFAULT (datetime('now'))
);

-- Create indexes
CREATE UNIQUE INDEX IF NOT EXISTS idx_tokens_lookup ON tokens(token_lookup);
CREATE INDEX IF NOT EXISTS idx_tokens_account ON tokens(account_id);
CREATE INDEX IF NOT EXISTS idx_stories_account ON stories(account_id);
CREATE INDEX IF NOT EXISTS idx_chapters_story ON chapters(story_id);
CREATE INDEX IF NOT EXISTS idx_media_account ON media(account_id);
CREATE INDEX IF NOT EXISTS idx_media_url ON media(account_id, url);
CREATE UNIQUE INDEX IF NOT EXISTS idx_media_references_placement
    ON media_references(media_id, story_id, IFNULL(chapter_id, ''));
CREATE INDEX IF NOT EXISTS idx_media_references_story ON media_references(story_id);
CREATE INDEX IF NOT EXISTS idx_media_references_chapter ON media_references(chapter_id);
"#;
