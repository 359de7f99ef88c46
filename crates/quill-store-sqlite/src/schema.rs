//! SQL schemas for the Quill SQLite backends.
//!
//! Each is executed once at connection startup. Future migrations will be
//! gated on `PRAGMA user_version`.

/// Content tables; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const STORE_SCHEMA: &str = "
PRAGMA journal_mode = WAL;

-- Rows are written once and never updated; enrichment happens on read.
CREATE TABLE IF NOT EXISTS posts (
    post_id             TEXT PRIMARY KEY,
    title               TEXT NOT NULL,
    content             TEXT NOT NULL,
    post_type           TEXT NOT NULL DEFAULT 'text',  -- 'text' | 'image' | 'video'
    media_data          TEXT NOT NULL DEFAULT '{}',    -- JSON MediaData
    subject_id          TEXT,
    cached_username     TEXT,
    author_json         TEXT,                          -- JSON AuthorInfo snapshot or NULL
    author_display_name TEXT,
    author_avatar_key   TEXT,
    created_at          TEXT NOT NULL                  -- ISO 8601 UTC, millisecond precision
);

-- Partitioned by post_id; no foreign key, comments are independent writes.
CREATE TABLE IF NOT EXISTS comments (
    post_id             TEXT NOT NULL,
    comment_id          TEXT NOT NULL,
    text                TEXT NOT NULL,
    subject_id          TEXT,
    cached_username     TEXT,
    author_json         TEXT,
    author_display_name TEXT,
    author_avatar_key   TEXT,
    created_at          TEXT NOT NULL,
    PRIMARY KEY (post_id, comment_id)
);

CREATE INDEX IF NOT EXISTS posts_created_idx    ON posts(created_at);
CREATE INDEX IF NOT EXISTS comments_created_idx ON comments(post_id, created_at);

PRAGMA user_version = 1;
";

/// Identity directory tables.
pub const DIRECTORY_SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS users (
    username    TEXT PRIMARY KEY,
    subject_id  TEXT NOT NULL UNIQUE,
    created_at  TEXT NOT NULL
);

-- Attribute names are stored verbatim, including any 'custom:' prefix.
CREATE TABLE IF NOT EXISTS user_attributes (
    username  TEXT NOT NULL REFERENCES users(username),
    name      TEXT NOT NULL,
    value     TEXT NOT NULL,
    PRIMARY KEY (username, name)
);

PRAGMA user_version = 1;
";
